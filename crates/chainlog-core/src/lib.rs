//! # chainlog-core
//!
//! The hash chain itself: the digest, the storage seam, and the appender.
//!
//! This crate provides:
//! - `digest`: SHA-256 over `prev_hash || timestamp || action`
//! - the `ChainStore` trait and its lazy `EntryRange` reader
//! - the `Appender`, which serializes writers so the chain cannot fork
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chainlog_core::Appender;
//! use chainlog_store::SqliteChainStore;
//!
//! let store = Arc::new(SqliteChainStore::open("audit.db", Default::default())?);
//! let appender = Appender::new(store);
//! let entry = appender.append("App focus: notepad.exe")?;
//! ```

pub mod appender;
pub mod hash;
pub mod traits;

pub use appender::Appender;
pub use hash::digest;
pub use traits::{ChainStore, EntryRange};
