//! # chainlog-store
//!
//! Append-only storage backends for the chainlog hash chain.
//!
//! ## Overview
//!
//! Both stores implement [`ChainStore`](chainlog_core::ChainStore): tail
//! lookup, a fenced append that refuses to extend a tail the caller did not
//! hash against, paged range reads, and a read-only filter query.  Neither
//! offers any way to update or delete an entry.
//!
//! - [`InMemoryChainStore`]: volatile reference implementation
//! - [`SqliteChainStore`]: durable single-file store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chainlog_store::{SqliteChainStore, sqlite::DEFAULT_BUSY_TIMEOUT};
//!
//! let store = SqliteChainStore::open("audit.db", DEFAULT_BUSY_TIMEOUT)?;
//! println!("{} entries, tail {}", store.len()?, store.last_hash()?);
//! ```

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryChainStore;
pub use sqlite::SqliteChainStore;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chainlog_contracts::{ChainError, Entry, EntryFilter, NewEntry, GENESIS_HASH};
    use chainlog_core::{digest, hash::CHAIN_FORMAT_VERSION, Appender, ChainStore};

    use super::{sqlite::DEFAULT_BUSY_TIMEOUT, InMemoryChainStore, SqliteChainStore};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn stores() -> Vec<(&'static str, Arc<dyn ChainStore>)> {
        vec![
            ("memory", Arc::new(InMemoryChainStore::new())),
            ("sqlite", Arc::new(SqliteChainStore::in_memory().unwrap())),
        ]
    }

    fn new_entry(prev: &str, ts: &str, action: &str) -> NewEntry {
        NewEntry {
            timestamp: ts.to_string(),
            action: action.to_string(),
            hash: digest(prev, ts, action),
        }
    }

    /// Append `n` linked entries directly against the store.
    fn fill(store: &dyn ChainStore, n: u64) -> Vec<Entry> {
        (0..n)
            .map(|i| {
                let prev = store.last_hash().unwrap();
                let ts = format!("2025-08-09T12:00:{:02}.000000Z", i % 60);
                store
                    .append_entry(new_entry(&prev, &ts, &format!("action {i}")), &prev)
                    .unwrap()
            })
            .collect()
    }

    fn assert_unbroken(entries: &[Entry]) {
        let mut prev = GENESIS_HASH.to_string();
        for (idx, e) in entries.iter().enumerate() {
            assert_eq!(e.id, idx as u64 + 1);
            assert_eq!(e.prev_hash, prev);
            assert_eq!(e.hash, digest(&e.prev_hash, &e.timestamp, &e.action));
            prev = e.hash.clone();
        }
    }

    // ── Shared behaviour ──────────────────────────────────────────────────────

    #[test]
    fn empty_store_reports_genesis_tail() {
        for (name, store) in stores() {
            assert_eq!(store.last_hash().unwrap(), GENESIS_HASH, "{name}");
            assert!(store.tip().unwrap().is_none(), "{name}");
            assert!(store.is_empty().unwrap(), "{name}");
            assert_eq!(store.read_all().count(), 0, "{name}");
        }
    }

    #[test]
    fn ids_are_assigned_gapless_from_one() {
        for (name, store) in stores() {
            let entries = fill(store.as_ref(), 5);
            let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![1, 2, 3, 4, 5], "{name}");
            assert_eq!(store.tip().unwrap(), Some((5, entries[4].hash.clone())), "{name}");
        }
    }

    #[test]
    fn stale_prev_hash_is_rejected_without_mutation() {
        for (name, store) in stores() {
            fill(store.as_ref(), 2);
            let before: Vec<Entry> = store.read_all().map(Result::unwrap).collect();

            let err = store
                .append_entry(new_entry(GENESIS_HASH, "t", "late"), GENESIS_HASH)
                .unwrap_err();

            match err {
                ChainError::Conflict { expected, actual } => {
                    assert_eq!(expected, GENESIS_HASH, "{name}");
                    assert_eq!(actual, before[1].hash, "{name}");
                }
                other => panic!("{name}: expected Conflict, got {other:?}"),
            }
            let after: Vec<Entry> = store.read_all().map(Result::unwrap).collect();
            assert_eq!(before, after, "{name}");
        }
    }

    #[test]
    fn read_range_is_bounded_and_ordered() {
        for (name, store) in stores() {
            fill(store.as_ref(), 10);

            let ids: Vec<u64> = store
                .read_range(3, 7)
                .map(|e| e.unwrap().id)
                .collect();
            assert_eq!(ids, vec![3, 4, 5, 6, 7], "{name}");

            assert_eq!(store.read_range(11, 20).count(), 0, "{name}");
        }
    }

    #[test]
    fn read_range_walks_many_pages() {
        for (name, store) in stores() {
            fill(store.as_ref(), 23);

            let entries: Vec<Entry> = store
                .read_all()
                .with_page_size(4)
                .map(Result::unwrap)
                .collect();
            assert_eq!(entries.len(), 23, "{name}");
            assert_unbroken(&entries);
        }
    }

    #[test]
    fn read_range_resumes_after_cursor() {
        for (name, store) in stores() {
            fill(store.as_ref(), 6);

            let mut range = store.read_all().with_page_size(2);
            let first: Vec<u64> = range.by_ref().take(3).map(|e| e.unwrap().id).collect();
            assert_eq!(first, vec![1, 2, 3], "{name}");
            assert_eq!(range.cursor(), 4, "{name}");

            range.resume_after(1);
            let rest: Vec<u64> = range.map(|e| e.unwrap().id).collect();
            assert_eq!(rest, vec![2, 3, 4, 5, 6], "{name}");
        }
    }

    #[test]
    fn query_filters_by_time_and_text() {
        for (name, store) in stores() {
            let appender = Appender::new(Arc::clone(&store));
            appender.append("File created: C:/Users/a/Downloads/x.zip").unwrap();
            appender.append("App focus: notepad.exe").unwrap();
            appender.append("File deleted: C:/Users/a/downloads/y.zip").unwrap();

            let hits = store
                .query(&EntryFilter::default().contains("DOWNLOADS"))
                .unwrap();
            let ids: Vec<u64> = hits.iter().map(|e| e.id).collect();
            assert_eq!(ids, vec![1, 3], "{name}");

            let limited = store
                .query(&EntryFilter::default().contains("file").limit(1))
                .unwrap();
            assert_eq!(limited.len(), 1, "{name}");
            assert_eq!(limited[0].id, 1, "{name}");

            let all = store.query(&EntryFilter::default()).unwrap();
            let future = store
                .query(&EntryFilter::default().since("9999-01-01T00:00:00"))
                .unwrap();
            assert_eq!(all.len(), 3, "{name}");
            assert!(future.is_empty(), "{name}");

            let window = store
                .query(
                    &EntryFilter::default()
                        .since(all[1].timestamp.clone())
                        .until(all[1].timestamp.clone()),
                )
                .unwrap();
            assert!(window.iter().any(|e| e.id == 2), "{name}");

            let created: Vec<u64> = store
                .query(&EntryFilter::default().kind("file CREATED"))
                .unwrap()
                .iter()
                .map(|e| e.id)
                .collect();
            assert_eq!(created, vec![1], "{name}");

            let focus_in_downloads = store
                .query(&EntryFilter::default().kind("focus").contains("downloads"))
                .unwrap();
            assert!(focus_in_downloads.is_empty(), "{name}");
        }
    }

    #[test]
    fn query_text_match_agrees_on_non_ascii_actions() {
        for (name, store) in stores() {
            let appender = Appender::new(Arc::clone(&store));
            appender.append("File created: C:/Users/RENÉ/CAFÉ.txt").unwrap();
            appender.append("File created: C:/Users/rené/café.txt").unwrap();

            let upper: Vec<u64> = store
                .query(&EntryFilter::default().contains("CAFÉ"))
                .unwrap()
                .iter()
                .map(|e| e.id)
                .collect();
            assert_eq!(upper, vec![1], "{name}");

            let ascii: Vec<u64> = store
                .query(&EntryFilter::default().contains("users/REN"))
                .unwrap()
                .iter()
                .map(|e| e.id)
                .collect();
            assert_eq!(ascii, vec![1, 2], "{name}");
        }
    }

    #[test]
    fn concurrent_appenders_share_one_chain() {
        for (name, store) in stores() {
            let appender = Arc::new(Appender::new(Arc::clone(&store)));
            let handles: Vec<_> = (0..6)
                .map(|t| {
                    let appender = Arc::clone(&appender);
                    thread::spawn(move || {
                        for i in 0..20 {
                            appender.append(&format!("t{t} #{i}")).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let entries: Vec<Entry> = store.read_all().map(Result::unwrap).collect();
            assert_eq!(entries.len(), 120, "{name}");
            assert_unbroken(&entries);
        }
    }

    // ── InMemoryChainStore ────────────────────────────────────────────────────

    #[test]
    fn memory_export_and_restore_round_trip() {
        let store = InMemoryChainStore::new();
        fill(&store, 3);

        let restored = InMemoryChainStore::from_entries(store.export().unwrap());
        assert_eq!(restored.len().unwrap(), 3);
        assert_eq!(restored.last_hash().unwrap(), store.last_hash().unwrap());
    }

    #[test]
    fn memory_clones_share_the_chain() {
        let store = InMemoryChainStore::new();
        let clone = store.clone();
        fill(&store, 2);
        assert_eq!(clone.len().unwrap(), 2);
    }

    // ── SqliteChainStore ──────────────────────────────────────────────────────

    #[test]
    fn sqlite_chain_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");

        let tail = {
            let store = SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
            fill(&store, 4);
            store.last_hash().unwrap()
        };

        let store = SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(store.len().unwrap(), 4);
        assert_eq!(store.last_hash().unwrap(), tail);

        let entries: Vec<Entry> = (&store as &dyn ChainStore)
            .read_all()
            .map(Result::unwrap)
            .collect();
        assert_unbroken(&entries);
    }

    /// Two connections to the same file, each with its own appender: the
    /// immediate transaction fences them and conflicts are retried.
    #[test]
    fn sqlite_separate_connections_do_not_fork() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");
        drop(SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap());

        let handles: Vec<_> = (0..2)
            .map(|t| {
                let path = path.clone();
                thread::spawn(move || {
                    let store: Arc<dyn ChainStore> =
                        Arc::new(SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap());
                    let appender = Appender::new(store).with_max_retries(1_000);
                    for i in 0..15 {
                        appender.append(&format!("conn {t} #{i}")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let store: Arc<dyn ChainStore> =
            Arc::new(SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap());
        let entries: Vec<Entry> = store.read_all().map(Result::unwrap).collect();
        assert_eq!(entries.len(), 30);
        assert_unbroken(&entries);
    }

    #[test]
    fn sqlite_schema_rejects_ids_below_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");
        let store = SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        fill(&store, 1);

        let raw = rusqlite::Connection::open(&path).unwrap();
        let inserted = raw.execute(
            "INSERT INTO audit_logs (id, timestamp, action, prev_hash, hash)
             VALUES (0, 't', 'forged', '', '')",
            [],
        );
        assert!(inserted.is_err());
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.count_through(u64::MAX).unwrap(), 1);
    }

    #[test]
    fn sqlite_negative_id_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");

        let raw = rusqlite::Connection::open(&path).unwrap();
        raw.execute_batch(
            "CREATE TABLE audit_logs (
                 id INTEGER PRIMARY KEY, timestamp TEXT NOT NULL, action TEXT NOT NULL,
                 prev_hash TEXT NOT NULL, hash TEXT NOT NULL
             );
             INSERT INTO audit_logs VALUES (-7, 't', 'forged', '', '');",
        )
        .unwrap();

        let store = SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        assert!(matches!(store.tip(), Err(ChainError::Storage { .. })));
        assert_eq!(store.count_through(0).unwrap(), 1);
    }

    #[test]
    fn sqlite_file_is_stamped_with_the_format_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");
        drop(SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap());

        let raw = rusqlite::Connection::open(&path).unwrap();
        let version: u32 = raw
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, CHAIN_FORMAT_VERSION);

        raw.pragma_update(None, "user_version", CHAIN_FORMAT_VERSION + 1)
            .unwrap();
        drop(raw);

        let err = SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).err().unwrap();
        assert!(err.to_string().contains("chain format version"), "got {err}");
    }

    #[test]
    fn sqlite_open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("logs.db");

        let err = SqliteChainStore::open(&path, DEFAULT_BUSY_TIMEOUT).err().unwrap();
        assert!(matches!(err, ChainError::Storage { .. }), "got {err:?}");
    }
}
