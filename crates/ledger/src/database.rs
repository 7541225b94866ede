//! Database operations and connection management

use anyhow::{Context, Result};
use config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::time::Duration;

/// Database connection manager
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let filename = config.url.strip_prefix("sqlite:").unwrap_or(&config.url);
        let filename = filename.strip_prefix("//").unwrap_or(filename);

        if let Some(parent) = std::path::Path::new(filename).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(filename)
                    .create_if_missing(true)
                    .journal_mode(if config.wal_mode {
                        SqliteJournalMode::Wal
                    } else {
                        SqliteJournalMode::Delete
                    }),
            )
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Create a migrated in-memory database.
    ///
    /// Limited to one long-lived connection, since every SQLite connection
    /// to `:memory:` opens its own empty database.
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to create in-memory database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workers (
                worker_id INTEGER PRIMARY KEY,
                base_percentage REAL NOT NULL,
                owner_1_share REAL NOT NULL,
                owner_2_share REAL NOT NULL,
                use_quota_logic INTEGER NOT NULL DEFAULT 0,
                daily_quota REAL NOT NULL DEFAULT 13.0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create workers table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                worker_id INTEGER NOT NULL,
                withdraw_amount REAL NOT NULL,
                fee_amount REAL NOT NULL,
                owner_1_received REAL NOT NULL,
                owner_2_received REAL NOT NULL,
                status TEXT NOT NULL,
                screenshot_reference TEXT NOT NULL,
                owner_1_withdrawn INTEGER NOT NULL DEFAULT 0,
                owner_2_withdrawn INTEGER NOT NULL DEFAULT 0,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create transactions table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_transactions_worker ON transactions (worker_id, id)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create transactions index")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                admin_id INTEGER PRIMARY KEY
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create admins table")?;

        Ok(())
    }

    /// Perform a health check on the database
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the database pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
