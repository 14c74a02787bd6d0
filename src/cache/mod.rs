//! # Cache Module
//!
//! Process-local response cache used for cache-aside reads.
//!
//! ## Design Decisions
//!
//! - **Explicit instance**: a [`CacheStore`] is constructed and handed to the
//!   client; there is no process-wide singleton.
//! - **Opaque payloads**: entries hold raw response text, decoded by the caller.
//! - **Lazy expiry**: expired entries read as absent and are purged on access.
//! - **Glob invalidation**: writes drop every listing key with one pattern.
//!
//! Concurrent misses for the same key may each fetch from the remote service;
//! there is no per-key build lock.

pub mod key;
pub mod pattern;
pub mod store;

pub use pattern::glob_matches;
pub use store::{CacheEntry, CacheStats, CacheStore};
