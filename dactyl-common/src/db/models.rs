//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered person (fingerprint owner)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub guid: Uuid,
    pub identity_card: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Anatomical fingerprint type (reference data)
///
/// `short_name` is the stem of every archive file name for this finger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintType {
    pub id: i64,
    pub name: String,
    pub short_name: String,
}

/// Best-known quality of one finger of one person
///
/// Unique per (`person_guid`, `fingerprint_type_id`). Created on the first
/// submission and updated in place afterwards, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRecord {
    pub id: i64,
    pub person_guid: Uuid,
    pub fingerprint_type_id: i64,
    /// Highest quality seen among retained files
    pub quality: i64,
    /// Submissions received for this key (monotonic, >= 1)
    pub attempts: i64,
    /// Archive path of the currently retained file
    pub path: String,
    pub created_at: DateTime<Utc>,
    /// Last quality improvement
    pub updated_at: DateTime<Utc>,
}
