//! User registration and authentication.

use std::sync::Arc;

use tracing::info;

use crate::auth::PasswordDigest;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::User;
use crate::store::UserDirectory;

/// Registers and authenticates users. Stateless between calls.
pub struct UserRegistry {
    dir: Arc<dyn UserDirectory>,
    clock: Clock,
}

/// Outcome of a login attempt.
///
/// `Denied` deliberately carries no cause: blank input, an unknown
/// username, and a wrong password are indistinguishable to the caller.
#[derive(Debug)]
pub enum LoginOutcome {
    Granted(User),
    Denied,
}

impl UserRegistry {
    pub fn new(dir: Arc<dyn UserDirectory>, clock: Clock) -> Self {
        Self { dir, clock }
    }

    /// Create a user, returning the generated id.
    pub fn register(&self, username: &str, email: Option<&str>, password: &str) -> Result<i64> {
        if username.trim().is_empty() {
            return Err(Error::InvalidInput("username required".into()));
        }
        if password.trim().is_empty() {
            return Err(Error::InvalidInput("password required".into()));
        }

        let normalized = normalize_username(username);
        if self.dir.username_exists(&normalized)? {
            return Err(Error::AlreadyExists);
        }

        let (hash, salt) = PasswordDigest::derive(password)?;
        let user = User {
            id: 0, // assigned by storage
            username: normalized.clone(),
            email: email
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from),
            password_hash: hash,
            password_salt: salt,
            created_at: self.clock.now_utc(),
        };

        // The unique constraint at the storage boundary closes the race
        // between the existence check above and this insert.
        let id = self.dir.insert_user(&user)?;
        info!(user_id = id, username = %normalized, "registered user");
        Ok(id)
    }

    /// Authenticate a user.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        if username.trim().is_empty() || password.is_empty() {
            return Ok(LoginOutcome::Denied);
        }

        let normalized = normalize_username(username);
        let Some(user) = self.dir.find_by_username(&normalized)? else {
            return Ok(LoginOutcome::Denied);
        };

        if PasswordDigest::verify(password, &user.password_hash, &user.password_salt)? {
            Ok(LoginOutcome::Granted(user))
        } else {
            Ok(LoginOutcome::Denied)
        }
    }
}

/// Trim + lowercase. Registration and login must agree on this.
pub fn normalize_username(s: &str) -> String {
    s.trim().to_lowercase()
}
