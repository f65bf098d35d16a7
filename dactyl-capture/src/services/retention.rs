//! Retention decision engine
//!
//! Decides, for one incoming scan, what happens in the archive and how the
//! quality record changes. Pure functions only: the caller supplies the
//! existing record and (when needed) the directory listing, and performs
//! the returned remote operations itself.
//!
//! # Policy
//! - No record yet: write `{short}.wsq`, start the record at one attempt.
//! - Record with at most [`EVICTION_THRESHOLD`] attempts: write
//!   `{short}_{quality}.wsq`. Superseded files stay in the archive.
//! - Record with more attempts: the finger's variants are bounded. The
//!   lowest-quality variant is replaced only by a strictly better quality
//!   that no variant already carries; otherwise nothing is written.
//!
//! Every scan counts as an attempt, whether or not it was written.

use chrono::{DateTime, Utc};
use dactyl_common::db::QualityRecord;
use uuid::Uuid;

use crate::archive::RemoteEntry;
use crate::db::quality_records::QualityUpdate;

/// Archive directory holding every person's fingerprint directory
pub const ARCHIVE_BASE_DIR: &str = "Person/Fingerprints";

/// Extension of stored scans (WSQ-compressed images)
pub const FILE_EXTENSION: &str = "wsq";

/// Attempts after which eviction replaces plain accumulation
pub const EVICTION_THRESHOLD: i64 = 3;

/// Archive directory of one person
pub fn person_directory(person_guid: Uuid) -> String {
    format!("{}/{}", ARCHIVE_BASE_DIR, person_guid)
}

/// Path of the first file stored for a finger
pub fn initial_path(dir: &str, short_name: &str) -> String {
    format!("{}/{}.{}", dir, short_name, FILE_EXTENSION)
}

/// Path of a quality-suffixed variant
pub fn variant_path(dir: &str, short_name: &str, quality: i64) -> String {
    format!("{}/{}_{}.{}", dir, short_name, quality, FILE_EXTENSION)
}

/// A quality-scored file seen in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVariant {
    pub name: String,
    pub quality: i64,
}

/// What to do with one scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetentionDecision {
    /// First scan of this finger
    AcceptNew { path: String },
    /// Below the eviction threshold; store alongside earlier files
    AcceptImproved { path: String },
    /// Replace the worst variant
    AcceptWithEviction { evict: String, path: String },
    /// Count the attempt, leave the archive untouched
    RecordOnly,
}

impl RetentionDecision {
    /// Archive path this decision writes, if any
    pub fn written_path(&self) -> Option<&str> {
        match self {
            RetentionDecision::AcceptNew { path }
            | RetentionDecision::AcceptImproved { path }
            | RetentionDecision::AcceptWithEviction { path, .. } => Some(path),
            RetentionDecision::RecordOnly => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RetentionDecision::AcceptNew { .. } => "accept-new",
            RetentionDecision::AcceptImproved { .. } => "accept-improved",
            RetentionDecision::AcceptWithEviction { .. } => "accept-with-eviction",
            RetentionDecision::RecordOnly => "record-only",
        }
    }
}

/// Whether [`decide`] needs the directory listing for this record
pub fn requires_listing(existing: Option<&QualityRecord>) -> bool {
    existing.is_some_and(|record| record.attempts > EVICTION_THRESHOLD)
}

/// Value of the first run of ASCII digits in `name`
pub fn parse_variant_quality(name: &str) -> Option<i64> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits: String = name[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// True if `file_name` is a file of the finger `short_name`
///
/// The stem must be the short name itself or start with `{short}_`, so a
/// short name that is a substring of another finger's never matches it.
fn belongs_to(short_name: &str, file_name: &str) -> bool {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    stem == short_name
        || stem
            .strip_prefix(short_name)
            .is_some_and(|rest| rest.starts_with('_'))
}

/// Variants of one finger with a parsable quality, in listing order
pub fn variants_for(short_name: &str, listing: &[RemoteEntry]) -> Vec<RemoteVariant> {
    listing
        .iter()
        .filter(|entry| belongs_to(short_name, &entry.name))
        .filter_map(|entry| {
            parse_variant_quality(&entry.name).map(|quality| RemoteVariant {
                name: entry.name.clone(),
                quality,
            })
        })
        .collect()
}

/// Decide the archive action for a scan of `new_quality`
///
/// `listing` is only consulted when [`requires_listing`] is true; pass an
/// empty slice otherwise.
pub fn decide(
    dir: &str,
    short_name: &str,
    existing: Option<&QualityRecord>,
    new_quality: i64,
    listing: &[RemoteEntry],
) -> RetentionDecision {
    let Some(record) = existing else {
        return RetentionDecision::AcceptNew {
            path: initial_path(dir, short_name),
        };
    };

    if record.attempts <= EVICTION_THRESHOLD {
        return RetentionDecision::AcceptImproved {
            path: variant_path(dir, short_name, new_quality),
        };
    }

    let variants = variants_for(short_name, listing);

    // Ties with a stored quality never evict
    if variants.iter().any(|v| v.quality == new_quality) {
        return RetentionDecision::RecordOnly;
    }

    match variants.iter().min_by_key(|v| v.quality) {
        Some(worst) if worst.quality < new_quality => RetentionDecision::AcceptWithEviction {
            evict: format!("{}/{}", dir, worst.name),
            path: variant_path(dir, short_name, new_quality),
        },
        _ => RetentionDecision::RecordOnly,
    }
}

/// Best file of a finger still in the archive once `evicted` is gone
///
/// Prefers the highest-quality variant and falls back to the unsuffixed
/// first file.
pub fn surviving_path(
    dir: &str,
    short_name: &str,
    listing: &[RemoteEntry],
    evicted: &str,
) -> Option<String> {
    let remaining: Vec<RemoteEntry> = listing
        .iter()
        .filter(|entry| format!("{}/{}", dir, entry.name) != evicted)
        .cloned()
        .collect();

    if let Some(best) = variants_for(short_name, &remaining)
        .into_iter()
        .max_by_key(|v| v.quality)
    {
        return Some(format!("{}/{}", dir, best.name));
    }

    remaining
        .iter()
        .find(|entry| belongs_to(short_name, &entry.name))
        .map(|entry| format!("{}/{}", dir, entry.name))
}

/// The record change a scan and its decision amount to
///
/// The store merges it into the current record: one more attempt, the best
/// quality, and the written path when that quality improved.
pub fn record_update(
    person_guid: Uuid,
    fingerprint_type_id: i64,
    new_quality: i64,
    decision: &RetentionDecision,
    now: DateTime<Utc>,
) -> QualityUpdate {
    QualityUpdate {
        person_guid,
        fingerprint_type_id,
        quality: new_quality,
        written_path: decision.written_path().map(str::to_string),
        at: now,
    }
}
