//! Registration and login behavior.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use workdesk::clock::Clock;
use workdesk::error::Error;
use workdesk::registry::{LoginOutcome, UserRegistry};
use workdesk::store::SqliteStore;

fn test_registry() -> UserRegistry {
    let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));
    let clock = Clock::fixed(Utc.with_ymd_and_hms(2025, 10, 10, 0, 0, 0).unwrap());
    UserRegistry::new(store, clock)
}

#[test]
fn register_then_login() {
    let registry = test_registry();

    let id = registry
        .register("Lana", Some("lana@example.com"), "s3cret")
        .unwrap();
    assert!(id > 0);

    // Login normalizes the same way registration did.
    match registry.login("  LANA  ", "s3cret").unwrap() {
        LoginOutcome::Granted(user) => {
            assert_eq!(user.id, id);
            assert_eq!(user.username, "lana");
            assert_eq!(user.email.as_deref(), Some("lana@example.com"));
        }
        LoginOutcome::Denied => panic!("expected login to succeed"),
    }
}

#[test]
fn duplicate_username_differing_only_in_case() {
    let registry = test_registry();
    registry.register("Lana", None, "pw").unwrap();
    assert!(matches!(
        registry.register("LANA", None, "other"),
        Err(Error::AlreadyExists)
    ));
}

#[test]
fn blank_username_or_password_rejected() {
    let registry = test_registry();
    assert!(matches!(
        registry.register("   ", None, "pw"),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        registry.register("lana", None, "   "),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn login_failures_are_indistinguishable() {
    let registry = test_registry();
    registry.register("lana", None, "pw").unwrap();

    // Unknown user, wrong password, and blank input all look the same.
    assert!(matches!(
        registry.login("nobody", "pw").unwrap(),
        LoginOutcome::Denied
    ));
    assert!(matches!(
        registry.login("lana", "wrong").unwrap(),
        LoginOutcome::Denied
    ));
    assert!(matches!(
        registry.login("", "pw").unwrap(),
        LoginOutcome::Denied
    ));
    assert!(matches!(
        registry.login("lana", "").unwrap(),
        LoginOutcome::Denied
    ));
}
