//! Fingerprint capture services
//!
//! [`FingerprintService`] is split across files by flow:
//! - `submission`: batch capture and archival
//! - `comparison`: comparison retrieval and registered-finger listing
//!
//! `retention` holds the pure decision engine both rely on.

use dactyl_common::config::Language;
use dactyl_common::db::Person;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::archive::ArchiveClient;
use crate::db::persons::{self, PersonKey};
use crate::error::{ApiError, ApiResult};

mod comparison;
pub mod messages;
pub mod retention;
mod submission;

/// Fingerprint capture service
///
/// Each call opens its own archive session; calls for different persons
/// can run concurrently.
#[derive(Clone)]
pub struct FingerprintService {
    db: SqlitePool,
    archive: Arc<dyn ArchiveClient>,
    language: Language,
}

impl FingerprintService {
    pub fn new(db: SqlitePool, archive: Arc<dyn ArchiveClient>, language: Language) -> Self {
        Self {
            db,
            archive,
            language,
        }
    }

    async fn require_person(&self, key: &PersonKey) -> ApiResult<Person> {
        persons::find_person(&self.db, key)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Person not found: {}", key)))
    }
}
