//! Offline cache for emergency data.
//!
//! This module provides a small durable key/value store that:
//! - Keeps the last fetched snapshot per key, stamped with its capture time
//! - Never surfaces its own failures to callers (best-effort writes, misses on read errors)
//! - Serves the snapshot when a live fetch fails (offline mode)
//! - Formats snapshot age for display

mod age;
mod error;
mod layer;
mod storage;
mod traits;

pub use age::format_age;
pub use layer::EmergencyCache;
pub use traits::CacheSource;
