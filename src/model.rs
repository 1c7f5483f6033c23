//! Core data model.
//!
//! A work order is a trackable task: it has an owner, a due time, a
//! priority, and a lifecycle stage. Closed is terminal: once a record
//! closes, the only permitted stage write is a re-confirmation of Closed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An identity record. Credentials are stored as an opaque hash + salt pair.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Storage-assigned id. Immutable after creation.
    pub id: i64,

    /// Normalized (trimmed, lowercased) username. Unique at the storage
    /// boundary.
    pub username: String,

    pub email: Option<String>,

    // Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: Vec<u8>,
    #[serde(skip_serializing)]
    pub password_salt: Vec<u8>,

    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Work Order
// ---------------------------------------------------------------------------

/// A unit of trackable work.
#[derive(Debug, Clone, Serialize)]
pub struct WorkOrder {
    /// Storage-assigned id.
    pub id: i64,

    /// Owner. Only the creator may mutate the record.
    pub creator_user_id: i64,

    /// Non-empty, trimmed.
    pub summary: String,

    pub details: Option<String>,

    pub due_at: DateTime<Utc>,

    pub priority: Priority,

    /// Current lifecycle stage.
    pub stage: Stage,

    /// True iff `stage == Closed`.
    pub closed: bool,

    /// Set exactly once, on the first transition into Closed. Never cleared.
    pub closed_at: Option<DateTime<Utc>>,

    pub closed_reason: Option<CloseReason>,

    pub created_at: DateTime<Utc>,

    /// Advances on every mutation.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(Error::InvalidInput(format!("unknown priority: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Lifecycle stage of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Newly created, nothing started yet.
    Open,
    /// Being worked on.
    InProgress,
    /// Blocked waiting on parts or materials.
    AwaitingParts,
    /// Done. Terminal.
    Closed,
}

impl Stage {
    /// Is this a terminal stage? Non-terminal stages move freely among
    /// themselves and into Closed; Closed has no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Closed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Open => "open",
            Stage::InProgress => "in_progress",
            Stage::AwaitingParts => "awaiting_parts",
            Stage::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "open" => Ok(Stage::Open),
            "in_progress" => Ok(Stage::InProgress),
            "awaiting_parts" => Ok(Stage::AwaitingParts),
            "closed" => Ok(Stage::Closed),
            _ => Err(Error::InvalidInput(format!("unknown stage: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Close Reason
// ---------------------------------------------------------------------------

/// Why a work order was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Resolved,
    Duplicate,
    Cancelled,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CloseReason::Resolved => "resolved",
            CloseReason::Duplicate => "duplicate",
            CloseReason::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CloseReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "resolved" => Ok(CloseReason::Resolved),
            "duplicate" => Ok(CloseReason::Duplicate),
            "cancelled" => Ok(CloseReason::Cancelled),
            _ => Err(Error::InvalidInput(format!("unknown close reason: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Notification Log
// ---------------------------------------------------------------------------

/// Append-only fact: this work order was reminded for this window.
/// Never mutated or deleted.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationLogEntry {
    pub work_order_id: i64,
    /// Deduplication key for the look-ahead interval, e.g. "24h".
    pub window_tag: String,
    pub sent_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for creating new work orders. The manager's public API for
/// submitting work.
pub struct NewWorkOrder {
    pub(crate) creator_user_id: i64,
    pub(crate) summary: String,
    pub(crate) details: Option<String>,
    pub(crate) due_at: DateTime<Utc>,
    pub(crate) priority: Option<Priority>,
}

impl NewWorkOrder {
    pub fn new(creator_user_id: i64, summary: impl Into<String>, due_at: DateTime<Utc>) -> Self {
        Self {
            creator_user_id,
            summary: summary.into(),
            details: None,
            due_at,
            priority: None,
        }
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Explicit priority. When omitted, the manager infers one from the
    /// due time.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}
