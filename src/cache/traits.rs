//! Core types for the caching system.

/// A cached payload together with the time it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry<T> {
  /// The cached payload
  pub payload: T,
  /// When the payload was stored, in milliseconds since the Unix epoch
  pub captured_at: i64,
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache), in epoch milliseconds
  pub cached_at: Option<i64>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(entry: CachedEntry<T>) -> Self {
    Self {
      data: entry.payload,
      source: CacheSource::Offline,
      cached_at: Some(entry.captured_at),
    }
  }

  pub fn is_cached(&self) -> bool {
    self.source == CacheSource::Offline
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Network fetch failed, serving the last cached snapshot
  Offline,
}
