//! Error types for workdesk.

use thiserror::Error;

use crate::model::Stage;

#[derive(Debug, Error)]
pub enum Error {
    /// Blank or malformed argument, rejected before any I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("username already exists")]
    AlreadyExists,

    #[error("work order not found: {0}")]
    NotFound(i64),

    /// Deliberately cause-free: non-owners learn nothing further about the
    /// record.
    #[error("not the owner of this work order")]
    NotOwner,

    #[error("invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("work order is already closed")]
    AlreadyClosed,

    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// Notification delivery failure. Retryable on a later dispatch call.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
