//! SQLite-backed persistent store.
//!
//! Split into focused submodules:
//! - `chats` — the per-chat configuration registry (enable, mode, prompt, image chance)
//! - `admins` — admin whitelist lookup
//! - `image_prompts` — fallback prompt pool for image generation
//! - `log` — raw inbound message log and its ordered range query

pub(crate) mod admins;
pub(crate) mod chats;
pub(crate) mod image_prompts;
pub(crate) mod log;

use banter_core::{config::StoreConfig, error::BanterError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Persistent store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database and run migrations.
    ///
    /// A `db_path` of `:memory:` opens an in-process database on a
    /// single-connection pool — each SQLite memory connection is its own
    /// database, so pooling more would split the data.
    pub async fn new(config: &StoreConfig) -> Result<Self, BanterError> {
        let (url, max_connections) = if config.db_path == ":memory:" {
            ("sqlite::memory:".to_string(), 1)
        } else {
            if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        BanterError::Store(format!("failed to create data dir: {e}"))
                    })?;
                }
            }
            (format!("sqlite:{}", config.db_path), 4)
        };

        let opts = SqliteConnectOptions::from_str(&url)
            .map_err(|e| BanterError::Store(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await
            .map_err(|e| BanterError::Store(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("store initialized at {}", config.db_path);

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), BanterError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| BanterError::Store(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_init", include_str!("../../migrations/001_init.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        BanterError::Store(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| BanterError::Store(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    BanterError::Store(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}
