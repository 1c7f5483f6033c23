//! Work order lifecycle and priority inference.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use workdesk::clock::Clock;
use workdesk::error::Error;
use workdesk::manager::WorkOrderManager;
use workdesk::model::{CloseReason, NewWorkOrder, Priority, Stage, User};
use workdesk::store::{SqliteStore, UserDirectory, WorkOrderLedger};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 10, 0, 0, 0).unwrap()
}

fn seed_user(store: &SqliteStore, name: &str) -> i64 {
    store
        .insert_user(&User {
            id: 0,
            username: name.into(),
            email: None,
            password_hash: vec![0; 32],
            password_salt: vec![0; 32],
            created_at: fixed_now(),
        })
        .expect("seed user")
}

fn fixture() -> (Arc<SqliteStore>, WorkOrderManager, i64) {
    let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
    let user_id = seed_user(&store, "lana");
    let manager = WorkOrderManager::new(store.clone(), Clock::fixed(fixed_now()));
    (store, manager, user_id)
}

// ---------------------------------------------------------------------------
// Priority inference
// ---------------------------------------------------------------------------

#[test]
fn suggest_priority_buckets() {
    let (_, manager, _) = fixture();
    let due = |y, mo, d, h| Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap();

    // Overdue
    assert_eq!(manager.suggest_priority(due(2025, 10, 9, 23)), Priority::High);
    // Under 24h
    assert_eq!(manager.suggest_priority(due(2025, 10, 10, 12)), Priority::High);
    // Exactly 24h is already Medium
    assert_eq!(manager.suggest_priority(due(2025, 10, 11, 0)), Priority::Medium);
    // Exactly 72h is already Low
    assert_eq!(manager.suggest_priority(due(2025, 10, 13, 0)), Priority::Low);
    // Far out
    assert_eq!(manager.suggest_priority(due(2025, 10, 15, 0)), Priority::Low);
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn add_rejects_blank_summary() {
    let (_, manager, user_id) = fixture();
    let result = manager.add(NewWorkOrder::new(user_id, "   ", fixed_now()));
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn add_defaults_and_inferred_priority() {
    let (store, manager, user_id) = fixture();

    let id = manager
        .add(
            NewWorkOrder::new(user_id, "  replace filter  ", fixed_now() + Duration::hours(2))
                .details("   "),
        )
        .unwrap();

    let order = store.get_order(id).unwrap().expect("stored order");
    assert_eq!(order.summary, "replace filter");
    assert_eq!(order.details, None); // blank details dropped
    assert_eq!(order.priority, Priority::High); // due in 2h
    assert_eq!(order.stage, Stage::Open);
    assert!(!order.closed);
    assert_eq!(order.closed_at, None);
    assert_eq!(order.closed_reason, None);
    assert_eq!(order.created_at, fixed_now());
    assert_eq!(order.updated_at, fixed_now());
}

#[test]
fn add_honors_explicit_priority() {
    let (store, manager, user_id) = fixture();
    let id = manager
        .add(
            NewWorkOrder::new(user_id, "stock shelves", fixed_now() + Duration::hours(1))
                .priority(Priority::Low),
        )
        .unwrap();
    assert_eq!(store.get_order(id).unwrap().unwrap().priority, Priority::Low);
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_open_orders_by_due_and_excludes_closed() {
    let (_, manager, user_id) = fixture();
    let add = |summary: &str, hours: i64| {
        manager
            .add(NewWorkOrder::new(
                user_id,
                summary,
                fixed_now() + Duration::hours(hours),
            ))
            .unwrap()
    };

    add("later", 48);
    let soon = add("soon", 2);
    let closed = add("done already", 1);
    manager.close(closed, user_id, CloseReason::Resolved).unwrap();

    let open = manager.list_open(user_id).unwrap();
    assert_eq!(open.len(), 2);
    assert_eq!(open[0].id, soon);
    assert_eq!(open[0].summary, "soon");
    assert_eq!(open[1].summary, "later");
    assert!(open.iter().all(|o| !o.closed));
}

// ---------------------------------------------------------------------------
// Stage transitions
// ---------------------------------------------------------------------------

#[test]
fn change_stage_unknown_record() {
    let (_, manager, user_id) = fixture();
    assert!(matches!(
        manager.change_stage(999, user_id, Stage::InProgress),
        Err(Error::NotFound(999))
    ));
}

#[test]
fn change_stage_requires_ownership() {
    let (store, manager, user_id) = fixture();
    let other = seed_user(&store, "sterling");
    let id = manager
        .add(NewWorkOrder::new(user_id, "fix lift", fixed_now() + Duration::hours(4)))
        .unwrap();

    assert!(matches!(
        manager.change_stage(id, other, Stage::InProgress),
        Err(Error::NotOwner)
    ));
}

#[test]
fn ownership_is_checked_before_closed_state() {
    let (store, manager, user_id) = fixture();
    let other = seed_user(&store, "sterling");
    let id = manager
        .add(NewWorkOrder::new(user_id, "fix lift", fixed_now() + Duration::hours(4)))
        .unwrap();
    manager.close(id, user_id, CloseReason::Resolved).unwrap();

    // Both conditions hold; the non-owner must see NotOwner, not the
    // lifecycle error.
    assert!(matches!(
        manager.change_stage(id, other, Stage::InProgress),
        Err(Error::NotOwner)
    ));
    assert!(matches!(
        manager.close(id, other, CloseReason::Resolved),
        Err(Error::NotOwner)
    ));
}

#[test]
fn closed_records_reject_stage_moves() {
    let (_, manager, user_id) = fixture();
    let id = manager
        .add(NewWorkOrder::new(user_id, "fix lift", fixed_now() + Duration::hours(4)))
        .unwrap();
    manager.close(id, user_id, CloseReason::Resolved).unwrap();

    assert!(matches!(
        manager.change_stage(id, user_id, Stage::InProgress),
        Err(Error::InvalidTransition {
            from: Stage::Closed,
            to: Stage::InProgress,
        })
    ));
}

#[test]
fn stage_moves_update_closed_flags_consistently() {
    let (store, manager, user_id) = fixture();
    let id = manager
        .add(NewWorkOrder::new(user_id, "fix lift", fixed_now() + Duration::hours(4)))
        .unwrap();

    manager.change_stage(id, user_id, Stage::AwaitingParts).unwrap();
    let order = store.get_order(id).unwrap().unwrap();
    assert_eq!(order.stage, Stage::AwaitingParts);
    assert!(!order.closed);

    manager.change_stage(id, user_id, Stage::Closed).unwrap();
    let order = store.get_order(id).unwrap().unwrap();
    assert!(order.closed);
    assert_eq!(order.closed_at, Some(fixed_now()));
}

#[test]
fn closed_at_is_set_exactly_once() {
    let (store, manager, user_id) = fixture();
    let id = manager
        .add(NewWorkOrder::new(user_id, "fix lift", fixed_now() + Duration::hours(4)))
        .unwrap();
    manager.change_stage(id, user_id, Stage::Closed).unwrap();

    // Re-confirm Closed later; closed_at must not move, updated_at must.
    let later = fixed_now() + Duration::hours(1);
    let later_manager = WorkOrderManager::new(store.clone(), Clock::fixed(later));
    later_manager.change_stage(id, user_id, Stage::Closed).unwrap();

    let order = store.get_order(id).unwrap().unwrap();
    assert_eq!(order.closed_at, Some(fixed_now()));
    assert_eq!(order.updated_at, later);
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

#[test]
fn close_records_reason_and_timestamps() {
    let (store, manager, user_id) = fixture();
    let id = manager
        .add(NewWorkOrder::new(user_id, "fix lift", fixed_now() + Duration::hours(4)))
        .unwrap();

    manager.close(id, user_id, CloseReason::Cancelled).unwrap();

    let order = store.get_order(id).unwrap().unwrap();
    assert_eq!(order.stage, Stage::Closed);
    assert!(order.closed);
    assert_eq!(order.closed_at, Some(fixed_now()));
    assert_eq!(order.closed_reason, Some(CloseReason::Cancelled));
}

#[test]
fn closing_twice_is_an_error() {
    let (_, manager, user_id) = fixture();
    let id = manager
        .add(NewWorkOrder::new(user_id, "fix lift", fixed_now() + Duration::hours(4)))
        .unwrap();

    manager.close(id, user_id, CloseReason::Resolved).unwrap();
    assert!(matches!(
        manager.close(id, user_id, CloseReason::Resolved),
        Err(Error::AlreadyClosed)
    ));
}
