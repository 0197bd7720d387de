//! Cache layer: best-effort offline persistence plus network-first fetching.

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::error::CacheError;
use super::storage::{CacheStorage, NoopStorage, SqliteStorage};
use super::traits::{CacheResult, CachedEntry};
use crate::config::CacheConfig;

type SharedStorage = Arc<dyn CacheStorage>;
type Opener = Box<dyn Fn() -> BoxFuture<'static, Result<SharedStorage, CacheError>> + Send + Sync>;

/// Offline cache for emergency data.
///
/// The backing store is opened lazily on first use and reused by every caller
/// holding this cache. A failed open is not remembered, so the next call tries
/// again.
///
/// `put`, `get` and `delete` never fail from the caller's point of view:
/// problems are logged and reported as "nothing happened" / "absent", so the
/// cache can never break the live data path.
pub struct EmergencyCache {
  opener: Opener,
  store: OnceCell<SharedStorage>,
}

impl EmergencyCache {
  /// Create a cache whose store is produced by `opener` on first use.
  pub fn with_opener<F, Fut>(opener: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SharedStorage, CacheError>> + Send + 'static,
  {
    Self {
      opener: Box::new(move || opener().boxed()),
      store: OnceCell::new(),
    }
  }

  /// SQLite store at an explicit path.
  pub fn at_path(path: PathBuf) -> Self {
    Self::with_opener(move || {
      let path = path.clone();
      async move {
        let store = tokio::task::spawn_blocking(move || SqliteStorage::open(&path)).await??;
        Ok::<SharedStorage, CacheError>(Arc::new(store))
      }
    })
  }

  /// SQLite store in the user's data directory.
  pub fn at_default_location() -> Self {
    Self::with_opener(|| async {
      let path = SqliteStorage::default_path()?;
      let store = tokio::task::spawn_blocking(move || SqliteStorage::open(&path)).await??;
      Ok::<SharedStorage, CacheError>(Arc::new(store))
    })
  }

  /// Private in-memory store, mostly useful for tests.
  #[allow(dead_code)]
  pub fn in_memory() -> Self {
    Self::with_opener(|| async {
      let store = SqliteStorage::open_in_memory()?;
      Ok::<SharedStorage, CacheError>(Arc::new(store))
    })
  }

  /// A cache that stores nothing.
  pub fn disabled() -> Self {
    Self::with_opener(|| async { Ok::<SharedStorage, CacheError>(Arc::new(NoopStorage)) })
  }

  pub fn from_config(config: &CacheConfig) -> Self {
    if !config.enabled {
      return Self::disabled();
    }
    match &config.path {
      Some(path) => Self::at_path(path.clone()),
      None => Self::at_default_location(),
    }
  }

  async fn store(&self) -> Result<SharedStorage, CacheError> {
    let store = self.store.get_or_try_init(|| (self.opener)()).await?;
    Ok(Arc::clone(store))
  }

  /// Store `payload` under `key`, stamped with the current time.
  pub async fn put<T: Serialize + ?Sized>(&self, key: &str, payload: &T) {
    match self.try_put(key, payload).await {
      Ok(()) => debug!(key, "Cached payload"),
      Err(e) => warn!(key, error = %e, "Failed to write offline cache"),
    }
  }

  /// Look up `key`. Read failures are indistinguishable from a miss.
  pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CachedEntry<T>> {
    match self.try_get(key).await {
      Ok(entry) => entry,
      Err(e) => {
        warn!(key, error = %e, "Failed to read offline cache");
        None
      }
    }
  }

  /// Remove `key` if present.
  pub async fn delete(&self, key: &str) {
    if let Err(e) = self.try_delete(key).await {
      warn!(key, error = %e, "Failed to delete from offline cache");
    }
  }

  async fn try_put<T: Serialize + ?Sized>(&self, key: &str, payload: &T) -> Result<(), CacheError> {
    ensure_key(key)?;
    let bytes = serde_json::to_vec(payload)?;
    let store = self.store().await?;
    let key = key.to_string();
    let captured_at = Utc::now().timestamp_millis();

    tokio::task::spawn_blocking(move || store.put(&key, &bytes, captured_at)).await?
  }

  async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedEntry<T>>, CacheError> {
    ensure_key(key)?;
    let store = self.store().await?;
    let owned_key = key.to_string();

    let stored = tokio::task::spawn_blocking(move || store.get(&owned_key)).await??;

    match stored {
      Some(entry) => Ok(Some(CachedEntry {
        payload: serde_json::from_slice(&entry.payload)?,
        captured_at: entry.captured_at,
      })),
      None => Ok(None),
    }
  }

  async fn try_delete(&self, key: &str) -> Result<(), CacheError> {
    ensure_key(key)?;
    let store = self.store().await?;
    let key = key.to_string();

    tokio::task::spawn_blocking(move || store.delete(&key)).await?
  }

  /// Fetch with a network-first strategy.
  ///
  /// 1. Run the fetcher
  /// 2. On success, cache the result and return it
  /// 3. On failure, return the cached snapshot (offline mode)
  /// 4. With no snapshot, return the fetcher's own error
  #[allow(dead_code)]
  pub async fn fetch_with_fallback<T, E, F, Fut>(
    &self,
    key: &str,
    fetcher: F,
  ) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    E: std::fmt::Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    self
      .fetch_with_fallback_when(key, fetcher, |_| true, |_| true)
      .await
  }

  /// Like [`fetch_with_fallback`](Self::fetch_with_fallback), but only caches
  /// fetched data that passes `should_cache`, and only serves the snapshot for
  /// errors that pass `can_fall_back`. Other errors are returned as-is.
  pub async fn fetch_with_fallback_when<T, E, F, Fut, P, R>(
    &self,
    key: &str,
    fetcher: F,
    should_cache: P,
    can_fall_back: R,
  ) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    E: std::fmt::Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnOnce(&T) -> bool,
    R: FnOnce(&E) -> bool,
  {
    match fetcher().await {
      Ok(data) => {
        if should_cache(&data) {
          self.put(key, &data).await;
        }
        Ok(CacheResult::from_network(data))
      }
      Err(err) if !can_fall_back(&err) => Err(err),
      Err(err) => match self.get::<T>(key).await {
        Some(entry) => {
          debug!(key, error = %err, "Fetch failed, serving cached snapshot");
          Ok(CacheResult::offline(entry))
        }
        None => Err(err),
      },
    }
  }
}

fn ensure_key(key: &str) -> Result<(), CacheError> {
  if key.is_empty() {
    Err(CacheError::InvalidKey)
  } else {
    Ok(())
  }
}
