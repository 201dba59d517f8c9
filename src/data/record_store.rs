//! Bounded, append-only keyed record store over the durable medium.
//!
//! Records are JSON payloads keyed by lexicographically sortable ids (see
//! `util::ids::record_key`), so the maximum key is always the most recent
//! record. After every write the store prunes oldest-first down to its
//! retention bound. When the backing medium is unavailable (the database
//! failed to open, or a statement fails at runtime) every operation
//! degrades to a no-op: writes report `persisted: false`, reads return
//! nothing, and nothing panics. The engine keeps running in memory only.
//!
//! One writer per store instance; there is no cross-process coordination.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use super::database::Database;

/// Result of a write attempt against the durable medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Whether the record actually reached durable storage
    pub persisted: bool,
}

/// Generic bounded record store over a named logical table
pub struct DurableRecordStore<T> {
    table: &'static str,
    conn: Option<Arc<Mutex<Connection>>>,
    max_entries: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for DurableRecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            conn: self.conn.clone(),
            max_entries: self.max_entries,
            _record: PhantomData,
        }
    }
}

impl<T> DurableRecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a store to a logical table. Passing `None` for the database
    /// yields a degraded store whose operations are all no-ops.
    pub fn new(db: Option<&Database>, table: &'static str, max_entries: usize) -> Self {
        if db.is_none() {
            warn!(table, "Durable medium unavailable; store degraded to no-op");
        }
        Self {
            table,
            conn: db.map(Database::connection),
            max_entries,
            _record: PhantomData,
        }
    }

    /// Whether the backing medium was available at construction time
    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    /// The retention bound applied after every write
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Append a record under the given key, then prune oldest-first down to
    /// the retention bound.
    pub fn write(&self, key: &str, record: &T) -> WriteReceipt {
        let Some(conn) = &self.conn else {
            return WriteReceipt { persisted: false };
        };

        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(table = self.table, error = %err, "Failed to serialize record");
                return WriteReceipt { persisted: false };
            }
        };

        let result = {
            let conn = conn.lock();
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {} (key, payload) VALUES (?1, ?2)",
                    self.table
                ),
                params![key, payload],
            )
        };

        match result {
            Ok(_) => {
                self.prune(self.max_entries);
                WriteReceipt { persisted: true }
            }
            Err(err) => {
                warn!(table = self.table, key, error = %err, "Failed to write record");
                WriteReceipt { persisted: false }
            }
        }
    }

    /// The record with the maximum key, or `None` when the store is empty
    /// or unavailable.
    pub fn read_latest(&self) -> Option<T> {
        let conn = self.conn.as_ref()?;
        let payload: Option<String> = {
            let conn = conn.lock();
            conn.query_row(
                &format!(
                    "SELECT payload FROM {} ORDER BY key DESC LIMIT 1",
                    self.table
                ),
                [],
                |row| row.get(0),
            )
            .map(Some)
            .unwrap_or_else(|err| {
                if !matches!(err, rusqlite::Error::QueryReturnedNoRows) {
                    warn!(table = self.table, error = %err, "Failed to read latest record");
                }
                None
            })
        };

        payload.and_then(|payload| self.decode(&payload))
    }

    /// All records in key order, oldest first.
    pub fn read_all(&self) -> Vec<T> {
        let Some(conn) = &self.conn else {
            return Vec::new();
        };

        let payloads: Vec<String> = {
            let conn = conn.lock();
            let mut stmt = match conn
                .prepare(&format!("SELECT payload FROM {} ORDER BY key", self.table))
            {
                Ok(stmt) => stmt,
                Err(err) => {
                    warn!(table = self.table, error = %err, "Failed to read records");
                    return Vec::new();
                }
            };
            let result = match stmt.query_map([], |row| row.get(0)) {
                Ok(rows) => rows.filter_map(|r| r.ok()).collect(),
                Err(err) => {
                    warn!(table = self.table, error = %err, "Failed to read records");
                    Vec::new()
                }
            };
            result
        };

        payloads
            .iter()
            .filter_map(|payload| self.decode(payload))
            .collect()
    }

    /// Delete the oldest entries until at most `max_entries` remain.
    /// Returns the number of deleted records.
    pub fn prune(&self, max_entries: usize) -> usize {
        let Some(conn) = &self.conn else {
            return 0;
        };

        let conn = conn.lock();
        let count: i64 = match conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        ) {
            Ok(count) => count,
            Err(err) => {
                warn!(table = self.table, error = %err, "Failed to count records");
                return 0;
            }
        };

        let excess = (count as usize).saturating_sub(max_entries);
        if excess == 0 {
            return 0;
        }

        match conn.execute(
            &format!(
                "DELETE FROM {table} WHERE key IN
                 (SELECT key FROM {table} ORDER BY key LIMIT ?1)",
                table = self.table
            ),
            params![excess as i64],
        ) {
            Ok(deleted) => deleted,
            Err(err) => {
                warn!(table = self.table, error = %err, "Failed to prune records");
                0
            }
        }
    }

    /// Number of stored records (0 when unavailable).
    pub fn count(&self) -> usize {
        let Some(conn) = &self.conn else {
            return 0;
        };

        let conn = conn.lock();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as usize)
        .unwrap_or_else(|err| {
            warn!(table = self.table, error = %err, "Failed to count records");
            0
        })
    }

    fn decode(&self, payload: &str) -> Option<T> {
        match serde_json::from_str(payload) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(table = self.table, error = %err, "Failed to deserialize record");
                None
            }
        }
    }
}
