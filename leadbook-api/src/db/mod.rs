//! SQLite database setup
//!
//! The schema is created idempotently on every start, so a fresh path
//! yields a working database with no separate migration step.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database at `db_path` and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await
        .context("Failed to open database")?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database with the schema applied
pub async fn init_memory_database() -> Result<SqlitePool> {
    // One connection: every pooled connection would otherwise get its own
    // private in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Create tables if they do not exist
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_record_table(pool, "leads", "new").await?;
    create_record_table(pool, "clients", "active").await?;
    create_history_table(pool).await?;
    Ok(())
}

async fn create_record_table(pool: &SqlitePool, table: &str, default_status: &str) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            website TEXT NOT NULL DEFAULT '',
            email TEXT,
            category TEXT,
            clase TEXT NOT NULL DEFAULT 'C' CHECK (clase IN ('A', 'B', 'C')),
            agent TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT '{default_status}',
            tags TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#
    );
    sqlx::query(&sql).execute(pool).await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at)"
    ))
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            type TEXT NOT NULL,
            comment TEXT NOT NULL DEFAULT '',
            agent TEXT NOT NULL,
            lead_id INTEGER REFERENCES leads(id) ON DELETE SET NULL,
            client_id INTEGER REFERENCES clients(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_created_at ON history(created_at)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_history_client ON history(client_id)")
        .execute(pool)
        .await?;
    Ok(())
}
