use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use roster::{
    config::ConfigLoader,
    db,
    repositories::{ParticipantRepository, QueueEntryRepository},
};
use std::sync::Arc;

/// Maintenance commands for the roster database
#[derive(Debug, Parser)]
#[command(name = "roster-admin", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Print the MOR priority list, oldest first
    ListQueue,
    /// Delete every participant (the MOR list is kept)
    ClearSession {
        /// Confirm the irreversible delete
        #[arg(long)]
        yes: bool,
    },
    /// Delete every MOR priority entry
    ClearQueue {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load().context("loading configuration")?;
    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    match cli.command {
        Command::Migrate => {
            db::run_migrations(&db).await?;
            println!("Migrations applied");
        }
        Command::ListQueue => {
            let entries = QueueEntryRepository::new(Arc::new(db))
                .list()
                .await
                .context("listing queue entries")?;

            if entries.is_empty() {
                println!("MOR list is empty");
            }
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.id,
                    entry.created_at.to_rfc3339(),
                    entry.player_name,
                    entry.notification_ref.as_deref().unwrap_or("-")
                );
            }
        }
        Command::ClearSession { yes } => {
            if !yes {
                bail!("refusing to delete participants without --yes");
            }
            let deleted = ParticipantRepository::new(Arc::new(db))
                .delete_all()
                .await
                .context("deleting participants")?;
            println!("Deleted {} participants; MOR list kept", deleted);
        }
        Command::ClearQueue { yes } => {
            if !yes {
                bail!("refusing to clear the MOR list without --yes");
            }
            let deleted = QueueEntryRepository::new(Arc::new(db))
                .delete_all()
                .await
                .context("deleting queue entries")?;
            println!("Deleted {} MOR entries", deleted);
        }
    }

    Ok(())
}
