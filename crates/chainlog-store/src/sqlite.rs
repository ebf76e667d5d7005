//! SQLite-backed implementation of `ChainStore`.
//!
//! One table, `audit_logs`, keyed by the chain id, with a secondary index on
//! `timestamp` for range queries.  The fenced append runs in a
//! `BEGIN IMMEDIATE` transaction: the write lock is taken before the tail is
//! read, so the check, the id assignment and the insert commit together or
//! not at all.  Ids are assigned as `tail id + 1` inside that transaction,
//! never reserved ahead of time.
//!
//! Chain ids start at 1; the schema rejects anything lower, and a row that
//! slipped in under an older schema fails to load instead of wrapping into
//! a huge unsigned id.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{
    params, params_from_iter, types::Value, Connection, OpenFlags, OptionalExtension,
    TransactionBehavior,
};
use tracing::{debug, info};

use chainlog_contracts::{
    ChainError, ChainResult, Entry, EntryFilter, NewEntry, GENESIS_HASH,
};
use chainlog_core::{hash::CHAIN_FORMAT_VERSION, ChainStore};

const SCHEMA_SQL: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = FULL;
    CREATE TABLE IF NOT EXISTS audit_logs (
        id        INTEGER PRIMARY KEY CHECK (id >= 1),
        timestamp TEXT NOT NULL,
        action    TEXT NOT NULL,
        prev_hash TEXT NOT NULL,
        hash      TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs (timestamp);
";

const SELECT_COLUMNS: &str = "SELECT id, timestamp, action, prev_hash, hash FROM audit_logs";

/// Default time a writer waits for another connection's write lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A durable chain store in a single SQLite file.
///
/// Several processes may open the same file; the immediate transaction in
/// `append_entry` keeps their appends from forking the chain.
pub struct SqliteChainStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteChainStore {
    /// Open or create the store at `path`.
    ///
    /// `busy_timeout` bounds how long an append waits for a write lock held
    /// by another connection before failing with a storage error.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> ChainResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ChainError::Storage {
            reason: format!("failed to open '{}': {}", path.display(), e),
        })?;
        conn.busy_timeout(busy_timeout).map_err(ChainError::storage)?;
        Self::initialize(&conn)?;

        info!(path = %path.display(), "chain store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// A private in-memory database, mainly for tests.
    pub fn in_memory() -> ChainResult<Self> {
        let conn = Connection::open_in_memory().map_err(ChainError::storage)?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// The database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the schema and stamp the file with `CHAIN_FORMAT_VERSION`.
    ///
    /// An unstamped file (`user_version` 0) is adopted; a file stamped with
    /// another digest layout is refused.
    fn initialize(conn: &Connection) -> ChainResult<()> {
        conn.execute_batch(SCHEMA_SQL).map_err(ChainError::storage)?;

        let version: u32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(ChainError::storage)?;
        match version {
            0 => conn
                .pragma_update(None, "user_version", CHAIN_FORMAT_VERSION)
                .map_err(ChainError::storage),
            v if v == CHAIN_FORMAT_VERSION => Ok(()),
            v => Err(ChainError::Storage {
                reason: format!(
                    "chain format version {v} is not supported (expected {CHAIN_FORMAT_VERSION})"
                ),
            }),
        }
    }

    fn lock(&self) -> ChainResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ChainError::Storage {
            reason: format!("connection lock poisoned: {}", e),
        })
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
        Ok(Entry {
            id: from_sql_id(row.get(0)?)?,
            timestamp: row.get(1)?,
            action: row.get(2)?,
            prev_hash: row.get(3)?,
            hash: row.get(4)?,
        })
    }
}

/// SQLite integers are signed; open-ended ranges use `u64::MAX`.
fn to_sql_id(id: u64) -> i64 {
    i64::try_from(id).unwrap_or(i64::MAX)
}

fn from_sql_id(raw: i64) -> rusqlite::Result<u64> {
    u64::try_from(raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(0, raw))
}

fn tip_of(conn: &Connection) -> rusqlite::Result<Option<(u64, String)>> {
    conn.query_row(
        "SELECT id, hash FROM audit_logs ORDER BY id DESC LIMIT 1",
        [],
        |row| Ok((from_sql_id(row.get(0)?)?, row.get(1)?)),
    )
    .optional()
}

impl ChainStore for SqliteChainStore {
    fn tip(&self) -> ChainResult<Option<(u64, String)>> {
        let conn = self.lock()?;
        tip_of(&conn).map_err(ChainError::storage)
    }

    fn append_entry(&self, entry: NewEntry, expected_prev_hash: &str) -> ChainResult<Entry> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(ChainError::storage)?;

        let (tail_id, actual) = tip_of(&tx)
            .map_err(ChainError::storage)?
            .unwrap_or_else(|| (0, GENESIS_HASH.to_string()));

        if actual != expected_prev_hash {
            // Dropping `tx` rolls back; nothing was written.
            return Err(ChainError::Conflict {
                expected: expected_prev_hash.to_string(),
                actual,
            });
        }

        let entry = entry.into_entry(tail_id + 1, expected_prev_hash);
        tx.execute(
            "INSERT INTO audit_logs (id, timestamp, action, prev_hash, hash)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                to_sql_id(entry.id),
                entry.timestamp,
                entry.action,
                entry.prev_hash,
                entry.hash,
            ],
        )
        .map_err(ChainError::storage)?;
        tx.commit().map_err(ChainError::storage)?;

        debug!(id = entry.id, "entry committed");
        Ok(entry)
    }

    fn read_page(&self, from_id: u64, to_id: u64, limit: usize) -> ChainResult<Vec<Entry>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "{SELECT_COLUMNS} WHERE id >= ?1 AND id <= ?2 ORDER BY id ASC LIMIT ?3"
            ))
            .map_err(ChainError::storage)?;

        let entries = stmt
            .query_map(
                params![
                    to_sql_id(from_id),
                    to_sql_id(to_id),
                    i64::try_from(limit).unwrap_or(i64::MAX)
                ],
                Self::row_to_entry,
            )
            .map_err(ChainError::storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(ChainError::storage)?;

        Ok(entries)
    }

    fn query(&self, filter: &EntryFilter) -> ChainResult<Vec<Entry>> {
        let mut sql = format!("{SELECT_COLUMNS} WHERE id >= 1");
        let mut values: Vec<Value> = Vec::new();

        if let Some(since) = &filter.since {
            values.push(Value::Text(since.clone()));
            sql.push_str(&format!(" AND timestamp >= ?{}", values.len()));
        }
        if let Some(until) = &filter.until {
            values.push(Value::Text(until.clone()));
            sql.push_str(&format!(" AND timestamp <= ?{}", values.len()));
        }
        if let Some(needle) = &filter.contains {
            // SQLite's lower() folds ASCII only; fold the needle the same way.
            values.push(Value::Text(needle.to_ascii_lowercase()));
            sql.push_str(&format!(" AND instr(lower(action), ?{}) > 0", values.len()));
        }
        if let Some(needle) = &filter.kind {
            values.push(Value::Text(needle.to_ascii_lowercase()));
            sql.push_str(&format!(
                " AND instr(lower(CASE WHEN instr(action, ':') > 0 \
                   THEN substr(action, 1, instr(action, ':') - 1) ELSE action END), ?{}) > 0",
                values.len()
            ));
        }
        sql.push_str(" ORDER BY id ASC");
        if let Some(limit) = filter.limit {
            values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(ChainError::storage)?;
        let entries = stmt
            .query_map(params_from_iter(values), Self::row_to_entry)
            .map_err(ChainError::storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(ChainError::storage)?;

        Ok(entries)
    }

    fn len(&self) -> ChainResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM audit_logs", [], |row| row.get(0))
            .map_err(ChainError::storage)?;
        Ok(count as u64)
    }

    fn count_through(&self, to_id: u64) -> ChainResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM audit_logs WHERE id <= ?1",
                params![to_sql_id(to_id)],
                |row| row.get(0),
            )
            .map_err(ChainError::storage)?;
        Ok(count as u64)
    }
}
