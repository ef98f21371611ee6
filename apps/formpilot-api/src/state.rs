//! Application state for the draft store API

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub struct AppState {
    pub db: SqlitePool,
}

impl AppState {
    pub async fn new() -> Result<Self> {
        let db_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:formpilot.db?mode=rwc".to_string());

        tracing::info!("Connecting to database: {}", db_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { db: pool })
    }

    /// Fresh in-memory database. One connection: `sqlite::memory:` is
    /// per-connection, a pool of them would see different databases.
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::run_migrations(&pool).await?;
        Ok(Self { db: pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS drafts (
                id TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                pdf_data BLOB,
                fields_json TEXT NOT NULL,
                country TEXT NOT NULL,
                visa_type TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'draft',
                completion INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS draft_versions (
                id TEXT PRIMARY KEY,
                draft_id TEXT NOT NULL,
                fields_json TEXT NOT NULL,
                completion INTEGER NOT NULL,
                saved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Version history is read most-recent-first per draft.
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_versions_draft
            ON draft_versions(draft_id, saved_at DESC)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}
