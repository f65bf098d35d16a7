//! Comparison retrieval and registered-finger listing
//!
//! Retrieval is all-or-nothing: a partial comparison set is useless to the
//! examiner, so the first failed download fails the call.

use tracing::info;

use super::FingerprintService;
use crate::archive::{ArchiveResult, ArchiveSession};
use crate::db::persons::PersonKey;
use crate::db::quality_records::{self, RecordWithType};
use crate::error::{ApiError, ApiResult};
use crate::models::{encode_image, ComparisonEntry, RegisteredFingerprint};

/// Strip a record down to what listing callers see
pub fn to_registered(entry: &RecordWithType) -> RegisteredFingerprint {
    RegisteredFingerprint {
        type_id: entry.fingerprint_type.id,
        name: entry.fingerprint_type.name.clone(),
    }
}

async fn download_all(
    session: &mut ArchiveSession,
    records: Vec<RecordWithType>,
) -> ArchiveResult<Vec<ComparisonEntry>> {
    let mut entries = Vec::with_capacity(records.len());
    for RecordWithType {
        record,
        fingerprint_type,
    } in records
    {
        let bytes = session.download(&record.path).await?;
        entries.push(ComparisonEntry {
            id: record.id,
            quality: record.quality,
            fingerprint_type,
            image: encode_image(&bytes),
        });
    }
    Ok(entries)
}

impl FingerprintService {
    /// Fingers registered for a person, ordered by fingerprint type
    pub async fn list_registered(&self, key: &PersonKey) -> ApiResult<Vec<RegisteredFingerprint>> {
        let person = self.require_person(key).await?;
        let records = quality_records::list_for_person(&self.db, person.guid).await?;
        Ok(records.iter().map(to_registered).collect())
    }

    /// Download every retained fingerprint of a person
    pub async fn retrieve_for_comparison(&self, key: &PersonKey) -> ApiResult<Vec<ComparisonEntry>> {
        let person = self.require_person(key).await?;

        let records = quality_records::list_for_person(&self.db, person.guid).await?;
        if records.is_empty() {
            return Err(ApiError::NotFound(format!(
                "No fingerprints registered for person {}",
                person.guid
            )));
        }

        let mut session = ArchiveSession::open(self.archive.as_ref()).await?;
        let result = download_all(&mut session, records).await;
        session.close().await;

        let entries = result?;
        info!(person_id = %person.guid, count = entries.len(), "Comparison set retrieved");
        Ok(entries)
    }
}
