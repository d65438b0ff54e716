//! Database module for persistent storage.
//!
//! Provides async SQLite database access using SQLx for:
//! - Room members and their roles
//! - Aliases (human-readable names for member identities)
//! - Room-wide settings such as the privacy mode

mod aliases;
pub mod members;
mod room_config;

pub use aliases::{Alias, AliasRepository};
pub use members::{Member, MemberRepository, Role};
pub use room_config::RoomConfigRepository;

use crate::identity::Identity;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::{Connection, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("not found")]
    NotFound,
    #[error("identity already added: {0}")]
    AlreadyAdded(Identity),
    #[error("alias already taken: {0}")]
    AliasTaken(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl DbError {
    /// True if this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    /// Keeps a `:memory:` database alive while pool connections are recycled.
    _memory_anchor: Option<Arc<Mutex<SqliteConnection>>>,
}

impl Database {
    /// Connection acquire timeout - prevents connection storms from blocking indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Create a new database connection, running migrations if needed.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        if path == ":memory:" {
            return Self::open_memory(Self::memory_pool_options()).await;
        }

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .idle_timeout(Some(Self::IDLE_TIMEOUT))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        info!(path = %path, "Database connected");
        Self::prepare(pool, None).await
    }

    /// Pool settings for an in-memory database: one connection, never reaped.
    fn memory_pool_options() -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .idle_timeout(None)
            .max_lifetime(None)
            .test_before_acquire(true)
    }

    /// Open a private shared-cache in-memory database.
    ///
    /// A named in-memory database lives only as long as some connection to
    /// it is open, so a dedicated connection is held for the lifetime of the
    /// handle in addition to the pool.
    async fn open_memory(pool_options: SqlitePoolOptions) -> Result<Self, DbError> {
        // `file::memory:` is shared process-wide and collides across parallel tests,
        // so each call gets its own named shared-cache database.
        let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
        let memdb_uri = format!(
            "file:roomd-memdb-{}-{}?mode=memory&cache=shared",
            std::process::id(),
            id
        );

        let options = SqliteConnectOptions::new()
            .filename(&memdb_uri)
            .shared_cache(true)
            .create_if_missing(true);

        let anchor = SqliteConnection::connect_with(&options).await?;
        let pool = pool_options.connect_with(options).await?;

        info!(path = ":memory:", "Database connected");
        Self::prepare(pool, Some(Arc::new(Mutex::new(anchor)))).await
    }

    /// Apply migrations and pragmas, then verify integrity.
    async fn prepare(
        pool: SqlitePool,
        memory_anchor: Option<Arc<Mutex<SqliteConnection>>>,
    ) -> Result<Self, DbError> {
        Self::run_migrations(&pool).await?;

        // WAL lets gate lookups proceed while an admin write is in progress
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON").execute(&pool).await?;

        let integrity_result: String = sqlx::query_scalar("PRAGMA integrity_check")
            .fetch_one(&pool)
            .await?;

        if integrity_result != "ok" {
            tracing::error!(
                integrity_check = %integrity_result,
                "Database integrity check FAILED - corruption detected!"
            );
            return Err(DbError::Corrupt(format!(
                "integrity check failed: {integrity_result}"
            )));
        }

        info!("Database integrity check passed");

        Ok(Self {
            pool,
            _memory_anchor: memory_anchor,
        })
    }

    /// Get reference to the underlying connection pool.
    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(DbError::Migration)?;

        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get member repository.
    pub fn members(&self) -> MemberRepository<'_> {
        MemberRepository::new(&self.pool)
    }

    /// Get alias repository.
    pub fn aliases(&self) -> AliasRepository<'_> {
        AliasRepository::new(&self.pool)
    }

    /// Get room configuration repository.
    pub fn room_config(&self) -> RoomConfigRepository<'_> {
        RoomConfigRepository::new(&self.pool)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err)
    }
}

/// True if the error is a UNIQUE constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Parse an identity column, reporting bad rows as corruption.
fn identity_column(text: &str) -> Result<Identity, DbError> {
    text.parse()
        .map_err(|e| DbError::Corrupt(format!("identity column {text:?}: {e}")))
}
