//! Work order lifecycle, priority inference, and due-notification dispatch.
//!
//! All state transitions go through here. The manager holds no state of
//! its own between calls; durable state lives behind the ledger port.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::{CloseReason, NewWorkOrder, Priority, Stage, WorkOrder};
use crate::store::{NotificationGateway, WorkOrderLedger};

pub struct WorkOrderManager {
    ledger: Arc<dyn WorkOrderLedger>,
    mailer: Option<Arc<dyn NotificationGateway>>,
    clock: Clock,
}

impl WorkOrderManager {
    pub fn new(ledger: Arc<dyn WorkOrderLedger>, clock: Clock) -> Self {
        Self {
            ledger,
            mailer: None,
            clock,
        }
    }

    /// Attach an email gateway. Without one, [`Self::send_due_notifications`]
    /// fails with `NotConfigured`.
    pub fn with_mailer(mut self, mailer: Arc<dyn NotificationGateway>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Infer a priority from how soon the record is due.
    ///
    /// Overdue or due within 24h is High, within 72h is Medium, further
    /// out is Low. Buckets are half-open on the upper side: exactly 24h
    /// is Medium and exactly 72h is Low.
    pub fn suggest_priority(&self, due_at: DateTime<Utc>) -> Priority {
        let delta = due_at - self.clock.now_utc();
        if delta < Duration::zero() {
            return Priority::High;
        }
        if delta < Duration::hours(24) {
            Priority::High
        } else if delta < Duration::hours(72) {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Create a work order, returning the generated id. New records start
    /// Open with the priority inferred from the due time unless one was
    /// given explicitly.
    pub fn add(&self, new: NewWorkOrder) -> Result<i64> {
        let summary = new.summary.trim();
        if summary.is_empty() {
            return Err(Error::InvalidInput("summary required".into()));
        }

        let now = self.clock.now_utc();
        let order = WorkOrder {
            id: 0, // assigned by storage
            creator_user_id: new.creator_user_id,
            summary: summary.to_string(),
            details: new
                .details
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
            due_at: new.due_at,
            priority: new
                .priority
                .unwrap_or_else(|| self.suggest_priority(new.due_at)),
            stage: Stage::Open,
            closed: false,
            closed_at: None,
            closed_reason: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.ledger.insert_order(&order)?;
        info!(order_id = id, creator = new.creator_user_id, "created work order");
        Ok(id)
    }

    /// Open records for a creator, soonest due first. Read-only.
    pub fn list_open(&self, creator_user_id: i64) -> Result<Vec<WorkOrder>> {
        self.ledger.list_open(creator_user_id)
    }

    /// Move a record to a new stage.
    ///
    /// Check order matters: missing record, then ownership, then the
    /// closed-state rule. The first failing check decides the error.
    /// A closed record rejects everything except a re-confirmation of
    /// Closed, which persists but leaves `closed_at` untouched.
    pub fn change_stage(&self, id: i64, actor_user_id: i64, new_stage: Stage) -> Result<()> {
        let existing = self.ledger.get_order(id)?.ok_or(Error::NotFound(id))?;
        if existing.creator_user_id != actor_user_id {
            return Err(Error::NotOwner);
        }
        if existing.closed && new_stage != Stage::Closed {
            return Err(Error::InvalidTransition {
                from: existing.stage,
                to: new_stage,
            });
        }

        let now = self.clock.now_utc();
        let closed = new_stage == Stage::Closed || existing.closed;
        let closed_at = if new_stage == Stage::Closed && existing.closed_at.is_none() {
            Some(now)
        } else {
            existing.closed_at
        };

        let updated = WorkOrder {
            stage: new_stage,
            closed,
            closed_at,
            updated_at: now,
            ..existing
        };
        self.ledger.update_order(&updated)
    }

    /// Close a record with a reason. Closing twice is an error, not a
    /// no-op.
    pub fn close(&self, id: i64, actor_user_id: i64, reason: CloseReason) -> Result<()> {
        let existing = self.ledger.get_order(id)?.ok_or(Error::NotFound(id))?;
        if existing.creator_user_id != actor_user_id {
            return Err(Error::NotOwner);
        }
        if existing.closed {
            return Err(Error::AlreadyClosed);
        }

        let now = self.clock.now_utc();
        let updated = WorkOrder {
            stage: Stage::Closed,
            closed: true,
            closed_at: Some(now),
            closed_reason: Some(reason),
            updated_at: now,
            ..existing
        };
        self.ledger.update_order(&updated)
    }

    /// Send due-soon reminders for records due within `window`, at most
    /// once per record per window. Returns how many were delivered.
    ///
    /// The ledger query excludes records already logged for this window,
    /// so repeated calls are idempotent. A delivery failure skips the log
    /// append for that record (it stays eligible for a later call) and
    /// never blocks the rest of the batch.
    pub fn send_due_notifications(
        &self,
        user_id: i64,
        recipient: &str,
        window: Duration,
    ) -> Result<usize> {
        if recipient.trim().is_empty() {
            return Err(Error::InvalidInput("recipient email required".into()));
        }
        let mailer = self
            .mailer
            .as_ref()
            .ok_or(Error::NotConfigured("notification gateway"))?;

        let now = self.clock.now_utc();
        let until = now + window;
        let window_tag = format!("{}h", window.num_hours());

        let due = self
            .ledger
            .list_due_soon_unnotified(user_id, now, until, &window_tag)?;
        let mut count = 0;

        for order in due {
            let due_fmt = order.due_at.format("%Y-%m-%d %H:%M");
            let subject = format!("Due soon: {} ({due_fmt})", order.summary);
            let html = format!(
                "<h3>Work order due soon</h3>\
                 <p><strong>{}</strong></p>\
                 <p>Priority: {}</p>\
                 <p>Due (UTC): {due_fmt}</p>",
                html_escape(&order.summary),
                order.priority,
            );

            if let Err(e) = mailer.send_email(recipient, &subject, &html, None) {
                warn!(order_id = order.id, error = %e, "due reminder failed, left unlogged for retry");
                continue;
            }

            // The log write follows the send: a crash in between means a
            // duplicate reminder later, never a silently dropped one.
            self.ledger
                .append_notification_log(order.id, &window_tag, now)?;
            count += 1;
        }

        info!(user_id, window_tag = %window_tag, count, "due reminders dispatched");
        Ok(count)
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
