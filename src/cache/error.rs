//! Error taxonomy for the offline cache.
//!
//! These errors never cross the public `put`/`get`/`delete` surface of
//! [`EmergencyCache`](super::EmergencyCache); they are logged and swallowed there.
//! Absence of a key is not an error and is reported as `None`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
  /// The host has no durable local storage (no data directory, unwritable path).
  #[error("cache store unavailable: {0}")]
  StoreUnavailable(String),

  /// A read, write or delete was rejected by the underlying store.
  #[error("cache transaction failed: {0}")]
  TransactionFailure(String),

  #[error("cache payload serialization failed: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("cache key must not be empty")]
  InvalidKey,
}

impl From<rusqlite::Error> for CacheError {
  fn from(e: rusqlite::Error) -> Self {
    CacheError::TransactionFailure(e.to_string())
  }
}

impl From<tokio::task::JoinError> for CacheError {
  fn from(e: tokio::task::JoinError) -> Self {
    CacheError::TransactionFailure(format!("store task failed: {}", e))
  }
}
