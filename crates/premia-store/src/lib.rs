//! DuckDB-backed durable cache tier for premia.
//!
//! Stores opaque string payloads keyed by cache key, each stamped with an
//! expiry instant (unix seconds). Expired rows are treated as absent on
//! lookup and can be purged in bulk. The store is synchronous; async glue
//! lives in `premia-core`.

pub mod duckdb;
pub mod migrations;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::ToSql;
use thiserror::Error;
use time::OffsetDateTime;

pub use duckdb::{ConnectionManager, PooledConnection};

/// Errors that can occur during durable-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration for the durable cache database.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for premia data.
    pub premia_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let premia_home = resolve_premia_home();
        let db_path = premia_home.join("cache").join("store.duckdb");
        Self {
            premia_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// Durable key→(payload, expiry) store.
#[derive(Clone)]
pub struct DurableStore {
    manager: ConnectionManager,
}

impl DurableStore {
    /// Open a store with default configuration.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(StoreConfig::default())
    }

    /// Open a store at the configured path, creating parent directories and
    /// applying schema migrations.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = ConnectionManager::new(config.db_path.clone(), config.max_pool_size);
        let store = Self { manager };
        store.initialize()?;
        Ok(store)
    }

    /// Apply schema migrations. Idempotent.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Look up a payload by key. Rows whose expiry has passed are absent.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let connection = self.manager.acquire()?;
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let params: [&dyn ToSql; 2] = [&key, &now];
        let mut statement = connection
            .prepare("SELECT payload FROM cache_entries WHERE key = ? AND expires_at > ?")?;
        let mut rows = statement.query(params.as_slice())?;

        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a payload with the given expiry instant.
    pub fn put(
        &self,
        key: &str,
        payload: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let connection = self.manager.acquire()?;
        let expires_unix = expires_at.unix_timestamp();

        let params: [&dyn ToSql; 3] = [&key, &payload, &expires_unix];
        connection.execute(
            "INSERT OR REPLACE INTO cache_entries (key, payload, expires_at, updated_at) \
             VALUES (?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;

        Ok(())
    }

    /// Delete all expired rows. Returns the number of rows removed.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let connection = self.manager.acquire()?;
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let params: [&dyn ToSql; 1] = [&now];
        let removed = connection.execute(
            "DELETE FROM cache_entries WHERE expires_at <= ?",
            params.as_slice(),
        )?;

        Ok(removed)
    }

    /// Number of rows currently in the table, expired rows included.
    pub fn len(&self) -> Result<usize, StoreError> {
        let connection = self.manager.acquire()?;
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Resolve the premia home directory from environment or default.
fn resolve_premia_home() -> PathBuf {
    if let Some(path) = env::var_os("PREMIA_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".premia");
    }

    PathBuf::from(".premia")
}
