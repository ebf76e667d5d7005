//! # chainlog-verify
//!
//! Tamper detection for the chainlog hash chain.
//!
//! This crate provides [`engine::ChainVerifier`], which streams a
//! [`ChainStore`](chainlog_core::ChainStore) page by page, recomputes every
//! digest, and reports the first entry whose id, link or hash is wrong.
//! [`engine::verify_chain`] does the same for an exported slice of entries.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use chainlog_verify::ChainVerifier;
//!
//! let report = ChainVerifier::new(store).verify()?;
//! if !report.is_ok() {
//!     eprintln!("{}", report.message());
//! }
//! ```

pub mod engine;

pub use engine::{verify_chain, ChainVerifier};

// ── Tests ─────────────────────────────────────────────────────────────────────
