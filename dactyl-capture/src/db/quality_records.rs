//! Quality record store
//!
//! One row per (person, fingerprint type). Rows are created on the first
//! submission and updated in place after that; this module never deletes.

use chrono::{DateTime, Utc};
use dactyl_common::db::{FingerprintType, QualityRecord};
use dactyl_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_guid, parse_timestamp};

/// A quality record joined with its fingerprint type
#[derive(Debug, Clone, PartialEq)]
pub struct RecordWithType {
    pub record: QualityRecord,
    pub fingerprint_type: FingerprintType,
}

const RECORD_COLUMNS: &str = "q.id AS id, q.person_guid AS person_guid, \
     q.fingerprint_type_id AS fingerprint_type_id, q.quality AS quality, q.attempts AS attempts, \
     q.path AS path, q.created_at AS created_at, q.updated_at AS updated_at";

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<QualityRecord> {
    let person_guid: String = row.get("person_guid");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(QualityRecord {
        id: row.get("id"),
        person_guid: parse_guid(&person_guid)?,
        fingerprint_type_id: row.get("fingerprint_type_id"),
        quality: row.get("quality"),
        attempts: row.get("attempts"),
        path: row.get("path"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Load the record for one finger of one person
pub async fn find_by_person_and_type(
    pool: &SqlitePool,
    person_guid: Uuid,
    fingerprint_type_id: i64,
) -> Result<Option<QualityRecord>> {
    let sql = format!(
        "SELECT {} FROM fingerprint_qualities q WHERE q.person_guid = ? AND q.fingerprint_type_id = ?",
        RECORD_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(person_guid.to_string())
        .bind(fingerprint_type_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(record_from_row(&row)?)),
        None => Ok(None),
    }
}

/// One scan applied to the record of its (person, fingerprint type)
#[derive(Debug, Clone, PartialEq)]
pub struct QualityUpdate {
    pub person_guid: Uuid,
    pub fingerprint_type_id: i64,
    pub quality: i64,
    /// Archive path the scan was written to, if it was written at all
    pub written_path: Option<String>,
    pub at: DateTime<Utc>,
}

/// Apply a scan to its record in one statement, keyed by (person, fingerprint type)
///
/// The first scan creates the record with one attempt. Later scans add one
/// attempt and raise `quality` to the maximum seen; `updated_at` moves only
/// on an improvement, and `path` only on an improvement that was written.
/// The merge runs inside SQLite against the stored row, never against a
/// copy read earlier: concurrent scans of one finger all count.
///
/// Returns the record as stored after the update.
pub async fn save(pool: &SqlitePool, update: &QualityUpdate) -> Result<QualityRecord> {
    let at = update.at.to_rfc3339();
    let row = sqlx::query(
        r#"
        INSERT INTO fingerprint_qualities (
            person_guid, fingerprint_type_id, quality, attempts, path, created_at, updated_at
        ) VALUES (?, ?, ?, 1, ?, ?, ?)
        ON CONFLICT(person_guid, fingerprint_type_id) DO UPDATE SET
            attempts = fingerprint_qualities.attempts + 1,
            path = CASE
                WHEN excluded.quality > fingerprint_qualities.quality AND ? THEN excluded.path
                ELSE fingerprint_qualities.path
            END,
            updated_at = CASE
                WHEN excluded.quality > fingerprint_qualities.quality THEN excluded.updated_at
                ELSE fingerprint_qualities.updated_at
            END,
            quality = MAX(fingerprint_qualities.quality, excluded.quality)
        RETURNING id, person_guid, fingerprint_type_id, quality, attempts, path, created_at, updated_at
        "#,
    )
    .bind(update.person_guid.to_string())
    .bind(update.fingerprint_type_id)
    .bind(update.quality)
    .bind(update.written_path.as_deref().unwrap_or_default())
    .bind(&at)
    .bind(&at)
    .bind(update.written_path.is_some())
    .fetch_one(pool)
    .await?;

    record_from_row(&row)
}

/// Move a record off `from_path`, if it still points there
///
/// Attempts and quality are left alone. Returns whether the record moved.
pub async fn repoint_path(
    pool: &SqlitePool,
    person_guid: Uuid,
    fingerprint_type_id: i64,
    from_path: &str,
    to_path: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE fingerprint_qualities SET path = ?
        WHERE person_guid = ? AND fingerprint_type_id = ? AND path = ?
        "#,
    )
    .bind(to_path)
    .bind(person_guid.to_string())
    .bind(fingerprint_type_id)
    .bind(from_path)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Every record of a person with its fingerprint type, ordered by type id
pub async fn list_for_person(pool: &SqlitePool, person_guid: Uuid) -> Result<Vec<RecordWithType>> {
    let sql = format!(
        r#"
        SELECT {}, t.name AS type_name, t.short_name AS type_short_name
        FROM fingerprint_qualities q
        JOIN fingerprint_types t ON t.id = q.fingerprint_type_id
        WHERE q.person_guid = ?
        ORDER BY q.fingerprint_type_id
        "#,
        RECORD_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(person_guid.to_string())
        .fetch_all(pool)
        .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let record = record_from_row(&row)?;
        let fingerprint_type = FingerprintType {
            id: record.fingerprint_type_id,
            name: row.get("type_name"),
            short_name: row.get("type_short_name"),
        };
        records.push(RecordWithType {
            record,
            fingerprint_type,
        });
    }

    Ok(records)
}
