//! In-memory response caching.
//!
//! `LruCache` keeps a bounded number of responses keyed by request and
//! evicts the least recently accessed one when full. A session client and
//! the places client each own one; a new session starts with an empty cache.

pub mod lru;

pub use lru::{CachedEntry, LruCache, DEFAULT_CAPACITY, MAX_CAPACITY};
