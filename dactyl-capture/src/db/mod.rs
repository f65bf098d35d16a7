//! Database access for dactyl-capture
//!
//! Schema and pool creation live in `dactyl_common::db`; this module holds
//! the queries the capture services run.

pub mod fingerprint_types;
pub mod persons;
pub mod quality_records;

use chrono::{DateTime, Utc};
use dactyl_common::{Error, Result};
use uuid::Uuid;

pub(crate) fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid guid '{}': {}", value, e)))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp '{}': {}", value, e)))
}
