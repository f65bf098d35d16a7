//! Fingerprint type lookups (read-only reference data)

use dactyl_common::db::FingerprintType;
use dactyl_common::Result;
use sqlx::{Row, SqlitePool};

fn from_row(row: &sqlx::sqlite::SqliteRow) -> FingerprintType {
    FingerprintType {
        id: row.get("id"),
        name: row.get("name"),
        short_name: row.get("short_name"),
    }
}

/// Load fingerprint type by id
pub async fn find_fingerprint_type(pool: &SqlitePool, id: i64) -> Result<Option<FingerprintType>> {
    let row = sqlx::query("SELECT id, name, short_name FROM fingerprint_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(from_row))
}

/// All fingerprint types ordered by id
pub async fn list_fingerprint_types(pool: &SqlitePool) -> Result<Vec<FingerprintType>> {
    let rows = sqlx::query("SELECT id, name, short_name FROM fingerprint_types ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(from_row).collect())
}
