use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use super::ResultsStore;
use crate::error::StoreError;
use crate::results::Snapshot;

/// Row key of the single published snapshot.
const SLOT: &str = "data";

/// SQLite-backed store (single connection with mutex). Survives restarts.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection mutex poisoned".into()))
    }
}

#[async_trait]
impl ResultsStore for SqliteStore {
    async fn get(&self) -> Result<Snapshot, StoreError> {
        let payload: Option<String> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT payload FROM snapshot WHERE slot = ?1",
                params![SLOT],
                |row| row.get(0),
            )
            .optional()?
        };
        debug!("SqliteStore: get (published={})", payload.is_some());
        match payload {
            Some(json) => Snapshot::from_json(json.as_bytes()),
            None => Ok(Snapshot::empty()),
        }
    }

    async fn put(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let payload = snapshot.to_json()?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO snapshot (slot, payload, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET
                payload=excluded.payload,
                updated_at=excluded.updated_at",
            params![SLOT, payload, Utc::now()],
        )?;
        info!(
            "SqliteStore: snapshot replaced ({} results)",
            snapshot.resultados.len()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS snapshot (
    slot        TEXT    PRIMARY KEY,
    payload     TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);
"#;
