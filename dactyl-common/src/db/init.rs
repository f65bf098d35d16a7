//! Database initialization
//!
//! Creates the database on first run and applies the schema idempotently,
//! so every start of a service is safe against an existing file.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Reference fingerprint types seeded on initialization: (id, name, short_name)
///
/// Short names carry no digits: archive file names embed the quality as the
/// first digit run.
pub const DEFAULT_FINGERPRINT_TYPES: [(i64, &str, &str); 10] = [
    (1, "Right thumb", "RT"),
    (2, "Right index", "RI"),
    (3, "Right middle", "RM"),
    (4, "Right ring", "RR"),
    (5, "Right little", "RL"),
    (6, "Left thumb", "LT"),
    (7, "Left index", "LI"),
    (8, "Left middle", "LM"),
    (9, "Left ring", "LR"),
    (10, "Left little", "LL"),
];

/// Open (creating if needed) the database at `db_path` and apply the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Single connection, never recycled: every connection to `:memory:` is a
/// separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and seed reference data (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_persons_table(pool).await?;
    create_fingerprint_types_table(pool).await?;
    create_fingerprint_qualities_table(pool).await?;
    seed_fingerprint_types(pool).await?;
    Ok(())
}

async fn create_persons_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            guid TEXT PRIMARY KEY,
            identity_card TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_fingerprint_types_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fingerprint_types (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            short_name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_fingerprint_qualities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fingerprint_qualities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            person_guid TEXT NOT NULL REFERENCES persons(guid) ON DELETE CASCADE,
            fingerprint_type_id INTEGER NOT NULL REFERENCES fingerprint_types(id),
            quality INTEGER NOT NULL,
            attempts INTEGER NOT NULL DEFAULT 1 CHECK (attempts >= 1),
            path TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (person_guid, fingerprint_type_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_fingerprint_qualities_person ON fingerprint_qualities(person_guid)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_fingerprint_types(pool: &SqlitePool) -> Result<()> {
    for (id, name, short_name) in DEFAULT_FINGERPRINT_TYPES {
        sqlx::query(
            "INSERT OR IGNORE INTO fingerprint_types (id, name, short_name) VALUES (?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(short_name)
        .execute(pool)
        .await?;
    }

    Ok(())
}
