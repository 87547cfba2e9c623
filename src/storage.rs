/// Key-value persistence substrate.
///
/// A flat namespace of string keys, each holding one JSON text value. Every
/// key carries a revision counter that increases on each write (removals
/// included) so callers can detect that someone else wrote in between their
/// read and their write.

use crate::error::{AppError, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A set of writes applied all-or-nothing by [`KeyValueStore::commit`].
///
/// Expected revisions turn the batch into a compare-and-swap: if any listed
/// key has moved on since it was read, nothing is written.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    writes: Vec<(String, Option<String>)>,
    expected: Vec<(String, u64)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.writes.push((key.into(), Some(value.into())));
        self
    }

    pub fn remove(&mut self, key: impl Into<String>) -> &mut Self {
        self.writes.push((key.into(), None));
        self
    }

    pub fn expect_revision(&mut self, key: impl Into<String>, revision: u64) -> &mut Self {
        let key = key.into();
        // First expectation for a key wins; later reads in the same batch see our own state.
        if !self.expected.iter().any(|(k, _)| *k == key) {
            self.expected.push((key, revision));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[(String, Option<String>)] {
        &self.writes
    }

    pub fn expectations(&self) -> &[(String, u64)] {
        &self.expected
    }
}

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Current value of `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Number of writes ever applied to `key`; 0 if never written.
    fn revision(&self, key: &str) -> Result<u64>;

    /// Keys currently holding a value, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    /// Apply a batch atomically.
    fn commit(&self, batch: WriteBatch) -> Result<()>;

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.set(key, value);
        self.commit(batch)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut batch = WriteBatch::new();
        batch.remove(key);
        self.commit(batch)
    }
}

/// SQLite-backed store. Several `LocalStore`s (or processes) may share one
/// database file; commits are serialized by an IMMEDIATE transaction.
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open (or create) a store at the given database path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::initialize(&conn)?;
        Self::enable_wal(&conn);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing). Stays in the default
    /// journal mode since WAL needs a file.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        conn.busy_timeout(Duration::from_secs(5))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT,
                revision INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Switch a file database to WAL. On failure the default journal mode is
    /// kept and a warning logged.
    fn enable_wal(conn: &Connection) {
        match conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0)) {
            Ok(mode) if mode.eq_ignore_ascii_case("wal") => {}
            Ok(mode) => log::warn!("WAL unavailable, database stays in {} journal mode", mode),
            Err(e) => log::warn!("Failed to enable WAL journal mode: {}", e),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::StorageError("Failed to lock database".to_string()))
    }
}

fn current_revision(conn: &Connection, key: &str) -> Result<u64> {
    let revision = conn
        .query_row("SELECT revision FROM kv WHERE key = ?1", params![key], |row| {
            row.get::<_, i64>(0)
        })
        .optional()?;
    Ok(revision.map(|r| r as u64).unwrap_or(0))
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(value.flatten())
    }

    fn revision(&self, key: &str) -> Result<u64> {
        let conn = self.lock()?;
        current_revision(&conn, key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM kv WHERE value IS NOT NULL ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for (key, expected) in batch.expectations() {
            let current = current_revision(&tx, key)?;
            if current != *expected {
                log::warn!(
                    "Rejecting commit: '{}' is at revision {}, expected {}",
                    key,
                    current,
                    expected
                );
                return Err(AppError::Conflict(key.clone()));
            }
        }

        let updated_at = Utc::now().to_rfc3339();
        for (key, value) in batch.writes() {
            tx.execute(
                "INSERT INTO kv (key, value, revision, updated_at) VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    revision = kv.revision + 1,
                    updated_at = excluded.updated_at",
                params![key, value, updated_at],
            )?;
        }

        tx.commit()?;
        log::debug!("Committed {} write(s)", batch.writes().len());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryEntry {
    value: Option<String>,
    revision: u64,
}

/// Process-local store with the same semantics as [`LocalStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, MemoryEntry>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::StorageError("Failed to lock memory store".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).and_then(|e| e.value.clone()))
    }

    fn revision(&self, key: &str) -> Result<u64> {
        Ok(self.lock()?.get(key).map(|e| e.revision).unwrap_or(0))
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(_, e)| e.value.is_some())
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut entries = self.lock()?;

        for (key, expected) in batch.expectations() {
            let current = entries.get(key).map(|e| e.revision).unwrap_or(0);
            if current != *expected {
                return Err(AppError::Conflict(key.clone()));
            }
        }

        for (key, value) in batch.writes() {
            let entry = entries.entry(key.clone()).or_default();
            entry.value = value.clone();
            entry.revision += 1;
        }
        Ok(())
    }
}
