//! SQLite store for registered peers.
//!
//! Every mutation runs in a transaction on a mutex-guarded connection, so a
//! reader never observes a half-written record and concurrent registrations
//! of one username serialize into one success and one conflict.

use crate::migration::run_migrations;
use chrono::Utc;
use peerlink_types::error::{PeerLinkError, PeerLinkResult};
use peerlink_types::PeerRecord;
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Peer store backed by SQLite.
#[derive(Clone)]
pub struct PeerStore {
    conn: Arc<Mutex<Connection>>,
}

impl PeerStore {
    /// Open (or create) a file-backed store and bring its schema up to date.
    pub fn open(path: &Path) -> PeerLinkResult<Self> {
        let conn = Connection::open(path).map_err(storage)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(storage)?;
        Self::from_connection(conn)
    }

    /// Create a store that lives only as long as this process.
    pub fn open_in_memory() -> PeerLinkResult<Self> {
        Self::from_connection(Connection::open_in_memory().map_err(storage)?)
    }

    fn from_connection(conn: Connection) -> PeerLinkResult<Self> {
        run_migrations(&conn).map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> PeerLinkResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PeerLinkError::Internal(e.to_string()))
    }

    /// Insert a new record. Fails with `Conflict` if the username is taken;
    /// the existing record is left untouched.
    pub fn insert(&self, record: &PeerRecord) -> PeerLinkResult<PeerRecord> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(storage)?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM peers WHERE username = ?1",
                rusqlite::params![record.username],
                |_| Ok(()),
            )
            .optional()
            .map_err(storage)?
            .is_some();
        if exists {
            return Err(PeerLinkError::Conflict(record.username.clone()));
        }

        tx.execute(
            "INSERT INTO peers (username, host, port, registered_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                record.username,
                record.host,
                record.port,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                PeerLinkError::Conflict(record.username.clone())
            }
            other => storage(other),
        })?;
        tx.commit().map_err(storage)?;
        Ok(record.clone())
    }

    /// All records in insertion order.
    pub fn list(&self) -> PeerLinkResult<Vec<PeerRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT username, host, port FROM peers ORDER BY id")
            .map_err(storage)?;
        let rows = stmt
            .query_map([], peer_from_row)
            .map_err(storage)?;

        let mut peers = Vec::new();
        for row in rows {
            peers.push(row.map_err(storage)?);
        }
        Ok(peers)
    }

    /// Look up one record.
    pub fn get(&self, username: &str) -> PeerLinkResult<Option<PeerRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT username, host, port FROM peers WHERE username = ?1",
            rusqlite::params![username],
            peer_from_row,
        )
        .optional()
        .map_err(storage)
    }

    /// Remove a record, returning it. `NotFound` if absent.
    pub fn remove(&self, username: &str) -> PeerLinkResult<PeerRecord> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(storage)?;
        let existing = tx
            .query_row(
                "SELECT username, host, port FROM peers WHERE username = ?1",
                rusqlite::params![username],
                peer_from_row,
            )
            .optional()
            .map_err(storage)?
            .ok_or_else(|| PeerLinkError::NotFound(username.to_string()))?;

        tx.execute(
            "DELETE FROM peers WHERE username = ?1",
            rusqlite::params![username],
        )
        .map_err(storage)?;
        tx.commit().map_err(storage)?;
        Ok(existing)
    }

    /// Number of registered peers.
    pub fn count(&self) -> PeerLinkResult<usize> {
        let conn = self.lock()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM peers", [], |row| row.get(0))
            .map_err(storage)?;
        Ok(n as usize)
    }
}

fn peer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PeerRecord> {
    Ok(PeerRecord {
        username: row.get(0)?,
        host: row.get(1)?,
        port: row.get(2)?,
    })
}

fn storage(e: rusqlite::Error) -> PeerLinkError {
    PeerLinkError::Storage(e.to_string())
}
