//! Cache storage trait and SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::error::CacheError;

/// Logical name of the offline store. Used as the database file stem.
pub const STORE_NAME: &str = "policyvault-offline";

/// Schema version recorded in SQLite's `user_version` pragma.
pub const STORE_VERSION: i64 = 1;

/// A raw entry as persisted by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
  /// Serialized payload (JSON)
  pub payload: Vec<u8>,
  /// Milliseconds since the Unix epoch at write time
  pub captured_at: i64,
}

/// Trait for cache storage backends.
///
/// Each call is one self-contained transaction against the store.
pub trait CacheStorage: Send + Sync {
  /// Insert or replace the entry for `key`.
  fn put(&self, key: &str, payload: &[u8], captured_at: i64) -> Result<(), CacheError>;

  /// Look up the entry for `key`.
  fn get(&self, key: &str) -> Result<Option<StoredEntry>, CacheError>;

  /// Remove the entry for `key`. Removing an absent key is not an error.
  fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn put(&self, _key: &str, _payload: &[u8], _captured_at: i64) -> Result<(), CacheError> {
    Ok(()) // Discard
  }

  fn get(&self, _key: &str) -> Result<Option<StoredEntry>, CacheError> {
    Ok(None) // Always miss
  }

  fn delete(&self, _key: &str) -> Result<(), CacheError> {
    Ok(())
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the store at `path`, provisioning the schema if needed.
  pub fn open(path: &Path) -> Result<Self, CacheError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        CacheError::StoreUnavailable(format!(
          "failed to create cache directory {}: {}",
          parent.display(),
          e
        ))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      CacheError::StoreUnavailable(format!(
        "failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    // A file that is not a usable database counts as no storage at all
    Self::from_connection(conn).map_err(|e| {
      CacheError::StoreUnavailable(format!("cache database at {} is unusable: {}", path.display(), e))
    })
  }

  /// Open a private in-memory store. Contents vanish when dropped.
  #[allow(dead_code)]
  pub fn open_in_memory() -> Result<Self, CacheError> {
    let conn = Connection::open_in_memory()
      .map_err(|e| CacheError::StoreUnavailable(format!("in-memory store: {}", e)))?;
    Self::from_connection(conn)
  }

  fn from_connection(mut conn: Connection) -> Result<Self, CacheError> {
    provision(&mut conn)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  ///
  /// Fails with `StoreUnavailable` when the host has no data directory.
  pub fn default_path() -> Result<PathBuf, CacheError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| CacheError::StoreUnavailable("could not determine data directory".into()))?;

    Ok(
      data_dir
        .join("policyvault")
        .join(format!("{}.db", STORE_NAME)),
    )
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
    self
      .conn
      .lock()
      .map_err(|e| CacheError::TransactionFailure(format!("lock poisoned: {}", e)))
  }
}

/// Schema for the single emergency data collection.
const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS emergency_data (
    key TEXT PRIMARY KEY NOT NULL,
    payload BLOB NOT NULL,
    captured_at INTEGER NOT NULL
);
"#;

/// Provision the schema when the stored version is older than `STORE_VERSION`.
fn provision(conn: &mut Connection) -> Result<(), CacheError> {
  let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
  if version >= STORE_VERSION {
    return Ok(());
  }

  let tx = conn.transaction()?;
  tx.execute_batch(STORE_SCHEMA)?;
  tx.pragma_update(None, "user_version", STORE_VERSION)?;
  tx.commit()?;

  Ok(())
}

impl CacheStorage for SqliteStorage {
  fn put(&self, key: &str, payload: &[u8], captured_at: i64) -> Result<(), CacheError> {
    let mut conn = self.lock()?;

    // Rolled back on drop if commit is never reached
    let tx = conn.transaction()?;
    tx.execute(
      "INSERT OR REPLACE INTO emergency_data (key, payload, captured_at) VALUES (?1, ?2, ?3)",
      params![key, payload, captured_at],
    )?;
    tx.commit()?;

    Ok(())
  }

  fn get(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
    let conn = self.lock()?;

    let entry = conn
      .query_row(
        "SELECT payload, captured_at FROM emergency_data WHERE key = ?1",
        params![key],
        |row| {
          Ok(StoredEntry {
            payload: row.get(0)?,
            captured_at: row.get(1)?,
          })
        },
      )
      .optional()?;

    Ok(entry)
  }

  fn delete(&self, key: &str) -> Result<(), CacheError> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM emergency_data WHERE key = ?1", params![key])?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn schema_version(store: &SqliteStorage) -> i64 {
    let conn = store.lock().unwrap();
    conn
      .pragma_query_value(None, "user_version", |row| row.get(0))
      .unwrap()
  }

  #[test]
  fn test_put_get_delete() {
    let store = SqliteStorage::open_in_memory().unwrap();

    store.put("ice_card_ABC", b"{\"a\":1}", 1_000).unwrap();
    let entry = store.get("ice_card_ABC").unwrap().unwrap();
    assert_eq!(entry.payload, b"{\"a\":1}".to_vec());
    assert_eq!(entry.captured_at, 1_000);

    store.delete("ice_card_ABC").unwrap();
    assert!(store.get("ice_card_ABC").unwrap().is_none());
  }

  #[test]
  fn test_put_replaces_payload_and_timestamp() {
    let store = SqliteStorage::open_in_memory().unwrap();

    store.put("k", b"1", 1_000).unwrap();
    store.put("k", b"2", 2_000).unwrap();

    let entry = store.get("k").unwrap().unwrap();
    assert_eq!(entry.payload, b"2".to_vec());
    assert_eq!(entry.captured_at, 2_000);
  }

  #[test]
  fn test_delete_missing_key_is_noop() {
    let store = SqliteStorage::open_in_memory().unwrap();
    assert!(store.delete("never-written").is_ok());
  }

  #[test]
  fn test_schema_provisioned_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    let store = SqliteStorage::open(&path).unwrap();
    assert_eq!(schema_version(&store), STORE_VERSION);
    store.put("k", b"kept", 5).unwrap();
    drop(store);

    // Reopening at the same version must not touch existing data
    let store = SqliteStorage::open(&path).unwrap();
    assert_eq!(schema_version(&store), STORE_VERSION);
    assert_eq!(store.get("k").unwrap().unwrap().payload, b"kept".to_vec());
  }

  #[test]
  fn test_open_fails_without_durable_location() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let result = SqliteStorage::open(&blocker.join("store.db"));
    assert!(matches!(result, Err(CacheError::StoreUnavailable(_))));
  }

  #[test]
  fn test_open_rejects_non_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    std::fs::write(&path, "this is a plain text file and not a database\n".repeat(64)).unwrap();

    let result = SqliteStorage::open(&path);
    assert!(matches!(result, Err(CacheError::StoreUnavailable(_))));
  }

  #[test]
  fn test_noop_storage_discards() {
    let store = NoopStorage;
    store.put("k", b"v", 1).unwrap();
    assert!(store.get("k").unwrap().is_none());
  }
}
