//! Storage and delivery ports.
//!
//! The core talks to the outside world through these capability traits.
//! [`SqliteStore`] implements both storage ports durably (or in memory for
//! tests); tests substitute their own doubles where a real backend would
//! get in the way.

pub mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{User, WorkOrder};

/// Persistence for user identity records.
pub trait UserDirectory: Send + Sync {
    /// Look up a user by normalized username.
    fn find_by_username(&self, normalized: &str) -> Result<Option<User>>;

    /// Does a user with this normalized username exist?
    fn username_exists(&self, normalized: &str) -> Result<bool>;

    /// Insert a new user, returning the generated id. `user.id` is ignored.
    ///
    /// Fails with `AlreadyExists` on a duplicate username; the uniqueness
    /// check and the write are atomic at this boundary.
    fn insert_user(&self, user: &User) -> Result<i64>;
}

/// Persistence for work orders and the notification log.
pub trait WorkOrderLedger: Send + Sync {
    /// Insert a new record, returning the generated id. `order.id` is
    /// ignored.
    fn insert_order(&self, order: &WorkOrder) -> Result<i64>;

    fn get_order(&self, id: i64) -> Result<Option<WorkOrder>>;

    /// Open records for a creator, ascending by due time.
    fn list_open(&self, creator_user_id: i64) -> Result<Vec<WorkOrder>>;

    /// Persist the changed fields of an existing record. A single record
    /// update is a single atomic write.
    fn update_order(&self, order: &WorkOrder) -> Result<()>;

    /// Open records owned by `user_id`, due within `[now, until]`, with no
    /// notification log entry for `window_tag`. This query is the
    /// idempotency boundary for dispatch.
    fn list_due_soon_unnotified(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
        window_tag: &str,
    ) -> Result<Vec<WorkOrder>>;

    /// Append an entry to the notification log. The log is append-only;
    /// a duplicate (work order, window tag) pair is a constraint error.
    fn append_notification_log(
        &self,
        work_order_id: i64,
        window_tag: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Outbound email delivery.
pub trait NotificationGateway: Send + Sync {
    /// Send one message. Any failure is retryable-later, never fatal to
    /// the caller's batch.
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> Result<()>;
}
