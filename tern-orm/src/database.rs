//! # Database Module
//!
//! This module owns the connection to the embedded SQLite engine. It resolves the
//! data directory, opens the database file in write-ahead-log mode and hands out
//! the shared handle every store and collection operation runs on.

// ============================================================================
// External Crate Imports
// ============================================================================

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use std::{
    path::PathBuf,
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{migration::Migrator, query::Query, schema::Column, Collection, Entity, Result};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "TERN_DATA_DIR";

/// Resolves the directory database files live in.
///
/// The `TERN_DATA_DIR` environment variable wins; otherwise a `tern` folder in
/// the platform's per-user data directory, falling back to the system temp
/// directory on platforms without one.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir().unwrap_or_else(std::env::temp_dir).join("tern")
}

// ============================================================================
// Database Struct
// ============================================================================

/// An entity type the database has bootstrapped a table for.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub table: &'static str,
    pub columns: Vec<Column>,
}

/// The main entry point for Tern ORM.
///
/// `Database` wraps a SQLite connection pool together with the list of
/// registered entity types. Cloning is cheap; every clone shares the same pool
/// and registry, so one handle can be passed around the whole application.
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
    pub(crate) registry: Arc<RwLock<Vec<Registration>>>,
}

impl Database {
    /// Creates a new DatabaseBuilder for configuring the connection.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Opens (creating if needed) the database file `name` in [`data_dir`].
    pub async fn open(name: &str) -> Result<Self> {
        DatabaseBuilder::new().open(name).await
    }

    /// Connects using a SQLite connection string such as `sqlite://app.db` or
    /// `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<Self> {
        DatabaseBuilder::new().connect(url).await
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self { pool, registry: Arc::new(RwLock::new(Vec::new())) }
    }

    /// Starts a raw statement.
    pub fn query(&self, sql: impl Into<String>) -> Query<'_> {
        Query::new(&self.pool, sql)
    }

    /// Returns a new Migrator for registering entity types at startup.
    pub fn migrator(&self) -> Migrator<'_> {
        Migrator::new(self)
    }

    /// Registers `E` and returns its typed collection.
    pub async fn manage<E: Entity>(&self) -> Result<Collection<E>> {
        Collection::manage(self).await
    }

    /// Snapshot of every registration made so far, in call order. Registering
    /// the same type twice lists it twice.
    pub fn registered(&self) -> Vec<Registration> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn record_registration(&self, registration: Registration) {
        self.registry.write().unwrap_or_else(PoisonError::into_inner).push(registration);
    }

    /// The underlying pool, for statements the mapping layer does not cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// ============================================================================
// DatabaseBuilder Struct
// ============================================================================

/// Connection settings for [`Database`].
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    max_connections: u32,
    data_dir: Option<PathBuf>,
    busy_timeout: Duration,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self { max_connections: 5, data_dir: None, busy_timeout: Duration::from_secs(5) }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Overrides the directory [`DatabaseBuilder::open`] places files in.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// How long a writer waits on a locked database before failing.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Opens the database file `name` inside the data directory, creating the
    /// directory and the file when missing. The file runs in WAL mode, which
    /// lets readers proceed while a single writer holds the lock.
    pub async fn open(self, name: &str) -> Result<Database> {
        let dir = self.data_dir.clone().unwrap_or_else(data_dir);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(name);
        log::info!("opening database {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.busy_timeout);
        self.connect_with(options).await
    }

    /// Connects using an explicit SQLite connection string.
    pub async fn connect(self, url: &str) -> Result<Database> {
        let options = SqliteConnectOptions::from_str(url)?.busy_timeout(self.busy_timeout);
        self.connect_with(options).await
    }

    async fn connect_with(self, options: SqliteConnectOptions) -> Result<Database> {
        let pool = SqlitePoolOptions::new().max_connections(self.max_connections).connect_with(options).await?;
        Ok(Database::from_pool(pool))
    }
}
