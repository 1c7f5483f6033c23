//! Injectable time source.
//!
//! Every time-sensitive component takes a [`Clock`]. Production wires
//! [`Clock::system`]; tests pin time with [`Clock::fixed`] so priority
//! buckets and notification windows are deterministic.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// A source of "now", always UTC. Cheap to clone and share.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>);

impl Clock {
    /// Real wall-clock time.
    pub fn system() -> Self {
        Self(Arc::new(Utc::now))
    }

    /// A clock frozen at `at`.
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self(Arc::new(move || at))
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock")
    }
}
