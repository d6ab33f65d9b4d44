//! SQLite persistence layer for the Secret Angel organizer.
//!
//! This crate provides async database operations for participants, gift
//! groups, memberships and giver/receiver assignments using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{participant, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:angel.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Register a participant
//!     participant::upsert_participant(db.pool(), "Alice", "socks").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod assignment;
pub mod error;
pub mod models;
pub mod participant;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    AngelGroup, Assignment, AssignmentDetail, GroupMembership, Participant, RosterEntry,
};
pub use participant::UpsertOutcome;
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// An open transaction against the store.
pub type Tx = Transaction<'static, Sqlite>;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// let db = database::Database::connect("sqlite:data/angel.db?mode=rwc").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// In-memory databases (`sqlite::memory:`) are per connection, so tests
    /// should use a pool size of 1.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a transaction. Dropping it without commit rolls back.
    pub async fn begin(&self) -> Result<Tx> {
        Ok(self.pool.begin().await?)
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// In-memory database with migrations applied, for tests across the workspace.
pub async fn in_memory() -> Result<Database> {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    db.migrate().await?;
    Ok(db)
}
