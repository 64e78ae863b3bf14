//! Integration tests for the selection state machine against SQLite and a
//! mocked chat webhook.

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use roster::error::RosterError;
use roster::flows::SelectionService;
use roster::models::{ParticipantStatus, Role};
use roster::notifier::Delivery;
use roster::repositories::{ParticipantRepository, QueueEntryRepository, queue_entry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{insert_participant, setup_test_db_arc, store_webhook, test_notifier};

struct Fixture {
    db: Arc<sea_orm::DatabaseConnection>,
    selection: SelectionService,
    participants: ParticipantRepository,
    queue: QueueEntryRepository,
}

async fn fixture() -> Result<Fixture> {
    let db = setup_test_db_arc().await?;
    Ok(Fixture {
        selection: SelectionService::new(Arc::clone(&db), test_notifier(Arc::clone(&db))),
        participants: ParticipantRepository::new(Arc::clone(&db)),
        queue: QueueEntryRepository::new(Arc::clone(&db)),
        db,
    })
}

#[tokio::test]
async fn defer_then_select_consumes_priority() -> Result<()> {
    let f = fixture().await?;
    let aria = insert_participant(&f.db, "Aria", Role::Healer, 1500).await?;
    assert_eq!(aria.status, ParticipantStatus::Pending);

    let deferred = f.selection.defer_to_queue(aria.id).await?;
    assert_eq!(deferred.participant.status, ParticipantStatus::Queued);
    let entry = deferred.created_entry.expect("queue entry created");
    assert_eq!(entry.player_name, "Aria");
    assert_eq!(entry.participant_id, aria.id);
    assert_eq!(f.queue.count().await?, 1);

    let selected = f.selection.select(aria.id).await?;
    assert_eq!(selected.participant.status, ParticipantStatus::Selected);
    assert_eq!(selected.removed_entry.map(|e| e.id), Some(entry.id));
    assert_eq!(f.queue.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn selecting_queued_participant_leaves_other_entries() -> Result<()> {
    let f = fixture().await?;
    let a = insert_participant(&f.db, "A", Role::Scout, 1000).await?;
    let b = insert_participant(&f.db, "B", Role::Scout, 1100).await?;
    f.selection.defer_to_queue(a.id).await?;
    f.selection.defer_to_queue(b.id).await?;

    f.selection.select(a.id).await?;

    let remaining = f.queue.list().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].participant_id, b.id);
    Ok(())
}

#[tokio::test]
async fn selecting_without_entry_leaves_queue_unchanged() -> Result<()> {
    let f = fixture().await?;
    let queued = insert_participant(&f.db, "Queued", Role::Oculto, 900).await?;
    let plain = insert_participant(&f.db, "Plain", Role::Oculto, 950).await?;
    f.selection.defer_to_queue(queued.id).await?;
    let before = f.queue.list().await?;

    let transition = f.selection.select(plain.id).await?;

    assert!(transition.removed_entry.is_none());
    assert!(transition.notification.is_none());
    assert_eq!(f.queue.list().await?, before);
    Ok(())
}

#[tokio::test]
async fn reselecting_is_rejected_without_changes() -> Result<()> {
    let f = fixture().await?;
    let p = insert_participant(&f.db, "Twice", Role::Silence, 1200).await?;
    f.selection.select(p.id).await?;

    let err = f.selection.select(p.id).await.unwrap_err();

    assert!(matches!(err, RosterError::AlreadySelected { ref player_name } if player_name == "Twice"));
    let stored = f.participants.find_by_id(p.id).await?.unwrap();
    assert_eq!(stored.status, ParticipantStatus::Selected);
    assert_eq!(f.queue.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn deselect_returns_to_pending_only_from_selected() -> Result<()> {
    let f = fixture().await?;
    let p = insert_participant(&f.db, "Back", Role::DpsFire, 1300).await?;

    let err = f.selection.deselect(p.id).await.unwrap_err();
    assert!(matches!(err, RosterError::InvalidTransition { action: "deselect", .. }));

    f.selection.select(p.id).await?;
    let transition = f.selection.deselect(p.id).await?;
    assert_eq!(transition.participant.status, ParticipantStatus::Pending);
    assert_eq!(f.queue.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn defer_requires_pending() -> Result<()> {
    let f = fixture().await?;
    let p = insert_participant(&f.db, "Picked", Role::DpsXbow, 1300).await?;
    f.selection.select(p.id).await?;

    let err = f.selection.defer_to_queue(p.id).await.unwrap_err();

    assert!(matches!(
        err,
        RosterError::InvalidTransition {
            action: "defer",
            from: ParticipantStatus::Selected
        }
    ));
    assert_eq!(f.queue.count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn unknown_participant_is_not_found() -> Result<()> {
    let f = fixture().await?;
    let err = f.selection.select(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, RosterError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn wildcard_draws_exhaust_pending_pool() -> Result<()> {
    let f = fixture().await?;
    for i in 0..3 {
        insert_participant(&f.db, &format!("Troll{i}"), Role::Roletroll, 1000 + i).await?;
    }
    let queued = insert_participant(&f.db, "QueuedTroll", Role::Roletroll, 2000).await?;
    f.selection.defer_to_queue(queued.id).await?;
    insert_participant(&f.db, "NotATroll", Role::Healer, 3000).await?;

    let mut rng = StdRng::seed_from_u64(11);
    let mut drawn = Vec::new();
    loop {
        match f.selection.draw_wildcard_with(&mut rng).await {
            Ok(transition) => {
                assert_eq!(transition.participant.role, Role::Roletroll);
                assert_eq!(transition.participant.status, ParticipantStatus::Selected);
                drawn.push(transition.participant.id);
            }
            Err(RosterError::NothingAvailable { role }) => {
                assert_eq!(role, Role::Roletroll);
                break;
            }
            Err(other) => return Err(other.into()),
        }
        assert!(drawn.len() <= 3, "drew more than the pending pool");
    }

    assert_eq!(drawn.len(), 3);
    assert!(!drawn.contains(&queued.id));
    Ok(())
}

#[tokio::test]
async fn clear_session_keeps_queue_entries() -> Result<()> {
    let f = fixture().await?;
    let a = insert_participant(&f.db, "A", Role::OffTank, 1).await?;
    insert_participant(&f.db, "B", Role::Elevado, 2).await?;
    f.selection.defer_to_queue(a.id).await?;
    let before = f.queue.list().await?;

    let deleted = f.selection.clear_session().await?;

    assert_eq!(deleted, 2);
    assert!(f.participants.list_all().await?.is_empty());
    assert_eq!(f.queue.list().await?, before);

    let board = f.selection.board().await?;
    assert_eq!(board.total, 0);
    assert!(board.by_role.is_empty());
    assert_eq!(board.queue.len(), 1);
    assert_eq!(board.carried_over, 1);
    Ok(())
}

#[tokio::test]
async fn board_groups_and_sorts_by_rating() -> Result<()> {
    let f = fixture().await?;
    for ip in [1200, 1800, 1500] {
        insert_participant(&f.db, &format!("H{ip}"), Role::Healer, ip).await?;
    }
    let scout = insert_participant(&f.db, "S", Role::Scout, 10).await?;
    f.selection.select(scout.id).await?;

    let board = f.selection.board().await?;

    let healers: Vec<i64> = board.by_role[&Role::Healer].iter().map(|p| p.ip).collect();
    assert_eq!(healers, vec![1800, 1500, 1200]);
    assert_eq!(board.total, 4);
    assert_eq!(board.selected.len(), 1);
    assert!(board.queued.is_empty());
    Ok(())
}

#[tokio::test]
async fn queued_notification_records_reference() -> Result<()> {
    let f = fixture().await?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/1/token"))
        .and(body_partial_json(json!({
            "content": "🔁 Aria received MOR priority",
            "username": "DG Avalon Roster"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    store_webhook(&f.db, &format!("{}/api/webhooks/1/token", server.uri())).await?;
    let aria = insert_participant(&f.db, "Aria", Role::Healer, 1500).await?;

    let transition = f.selection.defer_to_queue(aria.id).await?;

    let delivery = transition.notification.expect("queued transition notifies");
    let reference = delivery.reference().expect("delivered reference").to_string();
    assert!(reference.starts_with("mor_"));
    let stored = f.queue.find_by_participant(aria.id).await?.unwrap();
    assert_eq!(stored.notification_ref.as_deref(), Some(reference.as_str()));
    Ok(())
}

#[tokio::test]
async fn failed_notification_keeps_state_change() -> Result<()> {
    let f = fixture().await?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    store_webhook(&f.db, &format!("{}/api/webhooks/1/token", server.uri())).await?;
    let p = insert_participant(&f.db, "Unlucky", Role::DpsFrost, 1400).await?;

    let transition = f.selection.defer_to_queue(p.id).await?;

    assert!(matches!(transition.notification, Some(Delivery::Failed { .. })));
    let entry = f.queue.find_by_participant(p.id).await?.unwrap();
    assert!(entry.notification_ref.is_none());
    let stored = f.participants.find_by_id(p.id).await?.unwrap();
    assert_eq!(stored.status, ParticipantStatus::Queued);
    Ok(())
}

#[tokio::test]
async fn missing_webhook_skips_notification() -> Result<()> {
    let f = fixture().await?;
    let p = insert_participant(&f.db, "Quiet", Role::Scout, 1).await?;

    let transition = f.selection.defer_to_queue(p.id).await?;

    assert_eq!(transition.notification, Some(Delivery::NotConfigured));
    assert_eq!(transition.participant.status, ParticipantStatus::Queued);
    Ok(())
}

#[tokio::test]
async fn administrative_removal_announces_and_keeps_status() -> Result<()> {
    let f = fixture().await?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "content": "🗑️ **Aria** was removed from the MOR list"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let aria = insert_participant(&f.db, "Aria", Role::Healer, 1500).await?;
    let entry = f
        .selection
        .defer_to_queue(aria.id)
        .await?
        .created_entry
        .unwrap();
    store_webhook(&f.db, &format!("{}/api/webhooks/1/token", server.uri())).await?;

    let (removed, delivery) = f.selection.remove_from_queue(entry.id).await?;

    assert_eq!(removed.id, entry.id);
    assert!(delivery.is_delivered());
    assert_eq!(f.queue.count().await?, 0);
    let stored = f.participants.find_by_id(aria.id).await?.unwrap();
    assert_eq!(stored.status, ParticipantStatus::Queued);

    let err = f.selection.remove_from_queue(entry.id).await.unwrap_err();
    assert!(matches!(err, RosterError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn selecting_pending_participant_drops_leftover_entry() -> Result<()> {
    let f = fixture().await?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "content": "🗑️ **Mira** was removed from the MOR list"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    store_webhook(&f.db, &format!("{}/api/webhooks/1/token", server.uri())).await?;
    let mira = insert_participant(&f.db, "Mira", Role::Silence, 1600).await?;
    let other = insert_participant(&f.db, "Other", Role::Silence, 1000).await?;
    let leftover = queue_entry::create_in(f.db.as_ref(), mira.id, "Mira").await?;
    queue_entry::create_in(f.db.as_ref(), other.id, "Other").await?;
    assert_eq!(f.participants.find_by_id(mira.id).await?.unwrap().status, ParticipantStatus::Pending);

    let transition = f.selection.select(mira.id).await?;

    assert_eq!(transition.participant.status, ParticipantStatus::Selected);
    assert_eq!(transition.removed_entry.map(|e| e.id), Some(leftover.id));
    assert!(matches!(transition.notification, Some(Delivery::Delivered { reference: None })));
    assert_eq!(f.queue.count().await?, 1);
    assert!(f.queue.find_by_participant(mira.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn webhook_timeout_is_not_delivered_and_keeps_state() -> Result<()> {
    let f = fixture().await?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
        .mount(&server)
        .await;
    store_webhook(&f.db, &format!("{}/api/webhooks/1/token", server.uri())).await?;
    let p = insert_participant(&f.db, "Slow", Role::Scout, 700).await?;

    let transition = f.selection.defer_to_queue(p.id).await?;

    assert_eq!(
        transition.notification,
        Some(Delivery::Failed {
            reason: "webhook timed out".to_string()
        })
    );
    let stored = f.participants.find_by_id(p.id).await?.unwrap();
    assert_eq!(stored.status, ParticipantStatus::Queued);
    let entry = f.queue.find_by_participant(p.id).await?.unwrap();
    assert!(entry.notification_ref.is_none());
    Ok(())
}

#[tokio::test]
async fn unreachable_webhook_reason_hides_token() -> Result<()> {
    let f = fixture().await?;
    store_webhook(&f.db, "http://127.0.0.1:1/api/webhooks/123/SUPERSECRETTOKEN").await?;
    let p = insert_participant(&f.db, "Hidden", Role::Oculto, 800).await?;

    let transition = f.selection.defer_to_queue(p.id).await?;

    match transition.notification {
        Some(Delivery::Failed { reason }) => {
            assert!(!reason.contains("SUPERSECRETTOKEN"), "reason leaked token: {reason}");
            assert!(!reason.contains("/api/webhooks/123"), "reason leaked path: {reason}");
        }
        other => panic!("expected failed delivery, got {other:?}"),
    }
    assert_eq!(transition.participant.status, ParticipantStatus::Queued);
    Ok(())
}
