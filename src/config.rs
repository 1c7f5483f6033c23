//! Typed configuration from environment variables.
//!
//! Loaded once at startup. The Resend key is optional; without it the
//! notify command reports the gateway as not configured. The key is
//! wrapped in `secrecy::SecretString` to keep it out of logs.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct Config {
    /// SQLite database path.
    pub db_path: PathBuf,
    pub resend_api_key: Option<SecretString>,
    pub resend_from: String,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let db_path = match std::env::var("WORKDESK_DB") {
            Ok(p) => PathBuf::from(p),
            Err(_) => default_db_path()?,
        };

        Ok(Self {
            db_path,
            resend_api_key: std::env::var("RESEND_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            resend_from: std::env::var("RESEND_FROM")
                .unwrap_or_else(|_| "onboarding@resend.dev".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn default_db_path() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .ok_or_else(|| Error::Config("no local data directory; set WORKDESK_DB".into()))?
        .join("workdesk");
    std::fs::create_dir_all(&dir)
        .map_err(|e| Error::Config(format!("create {}: {e}", dir.display())))?;
    Ok(dir.join("workdesk.db"))
}
