//! SQLite storage.
//!
//! Single durable implementation of both storage ports. WAL mode for
//! concurrent readers. Timestamps are stored as RFC3339 UTC text, which
//! round-trips sub-second precision and compares lexicographically in
//! time order. The notification log carries a unique
//! (work_order_id, window_tag) constraint so a racing duplicate send
//! loses at the write.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use super::{UserDirectory, WorkOrderLedger};
use crate::error::{Error, Result};
use crate::model::{NotificationLogEntry, User, WorkOrder};

const SELECT_ORDER: &str = "SELECT id, creator_user_id, summary, details, due_at, priority, stage, \
     closed, closed_at, closed_reason, created_at, updated_at FROM work_orders";

/// Storage backend. Owns the SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn init(&self) -> Result<()> {
        let conn = self.conn();

        // WAL mode for concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT,
                password_hash   BLOB NOT NULL,
                password_salt   BLOB NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS work_orders (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                creator_user_id INTEGER NOT NULL REFERENCES users(id),
                summary         TEXT NOT NULL,
                details         TEXT,
                due_at          TEXT NOT NULL,
                priority        TEXT NOT NULL,
                stage           TEXT NOT NULL DEFAULT 'open',
                closed          INTEGER NOT NULL DEFAULT 0,
                closed_at       TEXT,
                closed_reason   TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_orders_open
                ON work_orders(creator_user_id, due_at) WHERE closed = 0;

            CREATE TABLE IF NOT EXISTS notification_log (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                work_order_id   INTEGER NOT NULL REFERENCES work_orders(id),
                window_tag      TEXT NOT NULL,
                sent_at         TEXT NOT NULL,
                UNIQUE(work_order_id, window_tag)
            );
            ",
        )?;

        Ok(())
    }

    /// Log entries for a work order, oldest first. Read-only view used by
    /// diagnostics and tests; the core never mutates the log.
    pub fn notification_log(&self, work_order_id: i64) -> Result<Vec<NotificationLogEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT work_order_id, window_tag, sent_at FROM notification_log
             WHERE work_order_id = ?1 ORDER BY id ASC",
        )?;

        let entries = stmt
            .query_map(params![work_order_id], |row| {
                let sent_at: String = row.get(2)?;
                Ok(NotificationLogEntry {
                    work_order_id: row.get(0)?,
                    window_tag: row.get(1)?,
                    sent_at: parse_ts(2, &sent_at)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }
}

impl UserDirectory for SqliteStore {
    fn find_by_username(&self, normalized: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let user = conn
            .query_row(
                "SELECT id, username, email, password_hash, password_salt, created_at
                 FROM users WHERE username = ?1",
                params![normalized],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn username_exists(&self, normalized: &str) -> Result<bool> {
        let conn = self.conn();
        let one: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM users WHERE username = ?1",
                params![normalized],
                |row| row.get(0),
            )
            .optional()?;
        Ok(one.is_some())
    }

    fn insert_user(&self, user: &User) -> Result<i64> {
        let conn = self.conn();
        match conn.execute(
            "INSERT INTO users (username, email, password_hash, password_salt, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.username,
                user.email,
                user.password_hash,
                user.password_salt,
                user.created_at.to_rfc3339(),
            ],
        ) {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }
}

impl WorkOrderLedger for SqliteStore {
    fn insert_order(&self, order: &WorkOrder) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO work_orders (
                creator_user_id, summary, details, due_at, priority, stage,
                closed, closed_at, closed_reason, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                order.creator_user_id,
                order.summary,
                order.details,
                order.due_at.to_rfc3339(),
                order.priority.to_string(),
                order.stage.to_string(),
                order.closed,
                order.closed_at.map(|t| t.to_rfc3339()),
                order.closed_reason.map(|r| r.to_string()),
                order.created_at.to_rfc3339(),
                order.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_order(&self, id: i64) -> Result<Option<WorkOrder>> {
        let conn = self.conn();
        let order = conn
            .query_row(
                &format!("{SELECT_ORDER} WHERE id = ?1"),
                params![id],
                row_to_order,
            )
            .optional()?;
        Ok(order)
    }

    fn list_open(&self, creator_user_id: i64) -> Result<Vec<WorkOrder>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{SELECT_ORDER} WHERE creator_user_id = ?1 AND closed = 0 ORDER BY due_at ASC"
        ))?;

        let orders = stmt
            .query_map(params![creator_user_id], row_to_order)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(orders)
    }

    fn update_order(&self, order: &WorkOrder) -> Result<()> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE work_orders SET
                summary = ?1, details = ?2, due_at = ?3, priority = ?4,
                stage = ?5, closed = ?6, closed_at = ?7, closed_reason = ?8,
                updated_at = ?9
             WHERE id = ?10",
            params![
                order.summary,
                order.details,
                order.due_at.to_rfc3339(),
                order.priority.to_string(),
                order.stage.to_string(),
                order.closed,
                order.closed_at.map(|t| t.to_rfc3339()),
                order.closed_reason.map(|r| r.to_string()),
                order.updated_at.to_rfc3339(),
                order.id,
            ],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(order.id));
        }
        Ok(())
    }

    fn list_due_soon_unnotified(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
        window_tag: &str,
    ) -> Result<Vec<WorkOrder>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT w.id, w.creator_user_id, w.summary, w.details, w.due_at, w.priority,
                    w.stage, w.closed, w.closed_at, w.closed_reason, w.created_at, w.updated_at
             FROM work_orders w
             WHERE w.creator_user_id = ?1 AND w.closed = 0
               AND w.due_at >= ?2 AND w.due_at <= ?3
               AND NOT EXISTS (
                   SELECT 1 FROM notification_log n
                   WHERE n.work_order_id = w.id AND n.window_tag = ?4
               )
             ORDER BY w.due_at ASC",
        )?;

        let orders = stmt
            .query_map(
                params![user_id, now.to_rfc3339(), until.to_rfc3339(), window_tag],
                row_to_order,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(orders)
    }

    fn append_notification_log(
        &self,
        work_order_id: i64,
        window_tag: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO notification_log (work_order_id, window_tag, sent_at)
             VALUES (?1, ?2, ?3)",
            params![work_order_id, window_tag, sent_at.to_rfc3339()],
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row parsing helpers
// ---------------------------------------------------------------------------

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        password_salt: row.get(4)?,
        created_at: parse_ts(5, &created_at)?,
    })
}

fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkOrder> {
    let due_at: String = row.get(4)?;
    let priority: String = row.get(5)?;
    let stage: String = row.get(6)?;
    let closed_at: Option<String> = row.get(8)?;
    let closed_reason: Option<String> = row.get(9)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;

    Ok(WorkOrder {
        id: row.get(0)?,
        creator_user_id: row.get(1)?,
        summary: row.get(2)?,
        details: row.get(3)?,
        due_at: parse_ts(4, &due_at)?,
        priority: parse_col(5, &priority)?,
        stage: parse_col(6, &stage)?,
        closed: row.get(7)?,
        closed_at: closed_at.map(|s| parse_ts(8, &s)).transpose()?,
        closed_reason: closed_reason.map(|s| parse_col(9, &s)).transpose()?,
        created_at: parse_ts(10, &created_at)?,
        updated_at: parse_ts(11, &updated_at)?,
    })
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    s.parse().map_err(|e: chrono::ParseError| conversion_err(idx, e))
}

fn parse_col<T>(idx: usize, s: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.parse().map_err(|e: T::Err| conversion_err(idx, e))
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}
