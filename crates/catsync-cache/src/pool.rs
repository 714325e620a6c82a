//! SQLite pool setup
//!
//! A file database runs in WAL mode so `/info` readers never wait on a
//! section transaction. The in-memory variant keeps exactly one connection
//! alive for the pool's lifetime, because each SQLite connection owns its
//! own in-memory database.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

const SCHEMA: &str = include_str!("migrations/20250114_initial.sql");
const FILE_POOL_SIZE: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Catalog database handle shared by the store and the HTTP read model
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if needed) the catalog database at `db_path`
    ///
    /// Missing parent directories are created and the schema is applied.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::Open(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = Self::open(options, SqlitePoolOptions::new().max_connections(FILE_POOL_SIZE))
            .await
            .map_err(|e| CacheError::Open(format!("{}: {e}", db_path.display())))?;

        let this = Self { pool };
        this.apply_schema().await?;
        tracing::info!(path = %db_path.display(), "Catalog database ready");
        Ok(this)
    }

    /// Private in-memory database, used by tests
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::Open(e.to_string()))?;
        let pool_options = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        let pool = Self::open(options, pool_options)
            .await
            .map_err(|e| CacheError::Open(format!("in-memory database: {e}")))?;

        let this = Self { pool };
        this.apply_schema().await?;
        Ok(this)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Settings every catalog connection shares, whatever the backing file
    async fn open(
        options: SqliteConnectOptions,
        pool_options: SqlitePoolOptions,
    ) -> Result<SqlitePool, sqlx::Error> {
        let options = options.foreign_keys(true).busy_timeout(BUSY_TIMEOUT);
        pool_options.connect_with(options).await
    }

    /// Creates every table and index that does not exist yet
    async fn apply_schema(&self) -> Result<(), CacheError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Schema(e.to_string()))?;
        tracing::debug!("Catalog schema applied");
        Ok(())
    }
}
