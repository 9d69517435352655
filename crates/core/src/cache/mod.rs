//! File-backed cache of fetched responses.
//!
//! This module provides a persistent URL → `Response` map stored as a single
//! pretty-printed JSON document. It supports:
//!
//! - Exact-string URL keys (no normalization)
//! - Load-once at startup, falling back to an empty map on any failure
//! - Full rewrite of the file after every new entry
//! - Serialized writers behind a mutex, so concurrent puts never lose updates

pub mod file;
pub mod store;

pub use crate::Error;

pub use file::{CacheMap, load_entries, save_entries};
pub use store::ResponseCache;

/// Default cache file, relative to the working directory.
pub const DEFAULT_CACHE_FILE: &str = "cache.json";
