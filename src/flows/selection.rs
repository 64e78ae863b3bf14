//! # Selection Flow
//!
//! The participant state machine:
//!
//! | From     | Event  | To       | Queue side effect                           |
//! |----------|--------|----------|---------------------------------------------|
//! | pending  | select | selected | drop a leftover entry, announce removal     |
//! | queued   | select | selected | consume the entry, announce removal         |
//! | pending  | defer  | queued   | create an entry, announce it                |
//! | selected | deselect | pending | none                                       |
//!
//! Persistence is authoritative. Status and queue writes of one transition
//! commit together; the webhook is called only after the commit and its
//! outcome never rolls anything back.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RosterError;
use crate::models::participant::Model as ParticipantModel;
use crate::models::queue_entry::Model as QueueEntryModel;
use crate::models::{ParticipantStatus, Role};
use crate::notifier::{Delivery, NotificationKind, WebhookNotifier};
use crate::repositories::{ParticipantRepository, QueueEntryRepository, participant, queue_entry};

/// Result of one applied transition
#[derive(Debug, Clone)]
pub struct Transition {
    pub participant: ParticipantModel,
    /// Queue entry created by a defer
    pub created_entry: Option<QueueEntryModel>,
    /// Queue entry consumed by a select
    pub removed_entry: Option<QueueEntryModel>,
    /// `None` when the transition does not notify
    pub notification: Option<Delivery>,
}

/// Organizer dashboard snapshot
#[derive(Debug, Clone, Default)]
pub struct Board {
    pub total: usize,
    pub by_role: BTreeMap<Role, Vec<ParticipantModel>>,
    pub selected: Vec<ParticipantModel>,
    pub queued: Vec<ParticipantModel>,
    pub queue: Vec<QueueEntryModel>,
    /// Queue entries whose participant is not registered in this session
    pub carried_over: usize,
}

/// Partitions participants by role. Each group is sorted by power rating,
/// highest first; equal ratings keep their input order.
pub fn group_by_role(
    participants: &[ParticipantModel],
) -> BTreeMap<Role, Vec<ParticipantModel>> {
    let mut groups: BTreeMap<Role, Vec<ParticipantModel>> = BTreeMap::new();
    for participant in participants {
        groups
            .entry(participant.role)
            .or_default()
            .push(participant.clone());
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| b.ip.cmp(&a.ip));
    }
    groups
}

/// Uniformly picks one strictly pending participant, or `None` when every
/// candidate is already selected or queued.
pub fn draw_pending<'a, R: Rng + ?Sized>(
    candidates: &'a [ParticipantModel],
    rng: &mut R,
) -> Option<&'a ParticipantModel> {
    let pending: Vec<&ParticipantModel> = candidates
        .iter()
        .filter(|p| p.status == ParticipantStatus::Pending)
        .collect();

    if pending.is_empty() {
        return None;
    }
    Some(pending[rng.gen_range(0..pending.len())])
}

#[derive(Debug, Clone)]
pub struct SelectionService {
    db: Arc<DatabaseConnection>,
    participants: ParticipantRepository,
    queue: QueueEntryRepository,
    notifier: Arc<WebhookNotifier>,
}

impl SelectionService {
    pub fn new(db: Arc<DatabaseConnection>, notifier: Arc<WebhookNotifier>) -> Self {
        Self {
            participants: ParticipantRepository::new(Arc::clone(&db)),
            queue: QueueEntryRepository::new(Arc::clone(&db)),
            db,
            notifier,
        }
    }

    pub async fn board(&self) -> Result<Board, RosterError> {
        let participants = self.participants.list_all().await?;
        let queue = self.queue.list().await?;

        let registered: HashSet<Uuid> = participants.iter().map(|p| p.id).collect();
        let carried_over = queue
            .iter()
            .filter(|entry| !registered.contains(&entry.participant_id))
            .count();

        let with_status = |status: ParticipantStatus| {
            participants
                .iter()
                .filter(|p| p.status == status)
                .cloned()
                .collect::<Vec<_>>()
        };

        Ok(Board {
            total: participants.len(),
            by_role: group_by_role(&participants),
            selected: with_status(ParticipantStatus::Selected),
            queued: with_status(ParticipantStatus::Queued),
            queue,
            carried_over,
        })
    }

    /// Looks up one participant of the current session.
    pub async fn participant(&self, id: Uuid) -> Result<ParticipantModel, RosterError> {
        self.participants
            .find_by_id(id)
            .await?
            .ok_or_else(|| RosterError::NotFound(format!("participant {id}")))
    }

    /// pending|queued → selected, consuming any queue entry the participant holds.
    pub async fn select(&self, id: Uuid) -> Result<Transition, RosterError> {
        let current = self.participant(id).await?;
        if current.status == ParticipantStatus::Selected {
            return Err(RosterError::AlreadySelected {
                player_name: current.player_name,
            });
        }

        let txn = self.db.begin().await?;
        let removed_entry = queue_entry::delete_by_participant_in(&txn, id).await?;
        let participant =
            participant::set_status_in(&txn, current, ParticipantStatus::Selected).await?;
        txn.commit().await?;

        info!(
            participant_id = %id,
            consumed_priority = removed_entry.is_some(),
            "Participant selected"
        );

        let notification = match &removed_entry {
            Some(entry) => Some(
                self.notifier
                    .notify(NotificationKind::Removed, &entry.player_name)
                    .await,
            ),
            None => None,
        };

        Ok(Transition {
            participant,
            created_entry: None,
            removed_entry,
            notification,
        })
    }

    /// pending → queued, granting MOR priority for the next session.
    pub async fn defer_to_queue(&self, id: Uuid) -> Result<Transition, RosterError> {
        let current = self.participant(id).await?;
        if current.status != ParticipantStatus::Pending {
            return Err(RosterError::InvalidTransition {
                action: "defer",
                from: current.status,
            });
        }

        let txn = self.db.begin().await?;
        let created_entry = match queue_entry::find_by_participant_in(&txn, id).await? {
            Some(_) => None,
            None => Some(queue_entry::create_in(&txn, id, &current.player_name).await?),
        };
        let participant =
            participant::set_status_in(&txn, current, ParticipantStatus::Queued).await?;
        txn.commit().await?;

        info!(participant_id = %id, "Participant deferred to MOR queue");

        let delivery = self
            .notifier
            .notify(NotificationKind::Queued, &participant.player_name)
            .await;

        let created_entry = match (created_entry, delivery.reference()) {
            (Some(mut entry), Some(reference)) => {
                match self
                    .queue
                    .set_notification_ref(entry.id, Some(reference.to_string()))
                    .await
                {
                    Ok(()) => entry.notification_ref = Some(reference.to_string()),
                    Err(err) => warn!(
                        queue_entry_id = %entry.id,
                        error = %err,
                        "Could not record notification reference"
                    ),
                }
                Some(entry)
            }
            (entry, _) => entry,
        };

        Ok(Transition {
            participant,
            created_entry,
            removed_entry: None,
            notification: Some(delivery),
        })
    }

    /// selected → pending.
    pub async fn deselect(&self, id: Uuid) -> Result<Transition, RosterError> {
        let current = self.participant(id).await?;
        if current.status != ParticipantStatus::Selected {
            return Err(RosterError::InvalidTransition {
                action: "deselect",
                from: current.status,
            });
        }

        let participant = self
            .participants
            .update_status(id, ParticipantStatus::Pending)
            .await?;
        info!(participant_id = %id, "Participant deselected");

        Ok(Transition {
            participant,
            created_entry: None,
            removed_entry: None,
            notification: None,
        })
    }

    /// Administrative removal of one queue entry. The participant's status is
    /// left as it is.
    pub async fn remove_from_queue(
        &self,
        entry_id: Uuid,
    ) -> Result<(QueueEntryModel, Delivery), RosterError> {
        let entry = self.queue.delete_by_id(entry_id).await?;
        info!(queue_entry_id = %entry_id, "Removed MOR queue entry");

        let delivery = self
            .notifier
            .notify(NotificationKind::Removed, &entry.player_name)
            .await;
        Ok((entry, delivery))
    }

    /// Selects one random pending participant of the wildcard role.
    pub async fn draw_wildcard(&self) -> Result<Transition, RosterError> {
        self.draw_wildcard_with(&mut StdRng::from_entropy()).await
    }

    pub async fn draw_wildcard_with<R: Rng + Send>(
        &self,
        rng: &mut R,
    ) -> Result<Transition, RosterError> {
        let role = Role::WILDCARD;
        let candidates = self.participants.list_by_role(role).await?;
        let drawn = draw_pending(&candidates, rng)
            .map(|p| p.id)
            .ok_or(RosterError::NothingAvailable { role })?;

        info!(participant_id = %drawn, role = %role, "Wildcard drawn");
        self.select(drawn).await
    }

    /// Starts a new session by deleting every participant. Queue entries stay.
    pub async fn clear_session(&self) -> Result<u64, RosterError> {
        let deleted = self.participants.delete_all().await?;
        info!(deleted, "Cleared session participants");
        Ok(deleted)
    }
}
