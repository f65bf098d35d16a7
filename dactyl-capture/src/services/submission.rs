//! Batch submission
//!
//! One archive session per batch, scans processed strictly in order on that
//! session. A failing scan lands in the error list; the batch goes on.

use chrono::Utc;
use dactyl_common::db::{FingerprintType, Person};
use thiserror::Error;
use tracing::{error, info, warn};

use super::messages::registration_summary;
use super::retention::{self, RetentionDecision};
use super::FingerprintService;
use crate::archive::{ArchiveError, ArchiveSession, RemoteEntry};
use crate::db::persons::{self, PersonKey};
use crate::db::{fingerprint_types, quality_records};
use crate::error::{ApiError, ApiResult};
use crate::models::{BatchReport, ScanSubmission, SubmissionResponse};

/// Why a single scan was not registered
#[derive(Debug, Error)]
enum ScanError {
    #[error("unknown fingerprint type {0}")]
    UnknownType(i64),

    #[error("negative quality {0}")]
    NegativeQuality(i64),

    #[error("invalid image payload: {0}")]
    InvalidImage(#[from] base64::DecodeError),

    #[error("store error: {0}")]
    Store(#[from] dactyl_common::Error),

    #[error("archive transfer failed: {0}")]
    Transfer(#[from] ArchiveError),
}

/// A failed scan with the name it is reported under
struct ScanFailure {
    label: String,
    error: ScanError,
}

impl ScanFailure {
    fn new(label: impl Into<String>, error: impl Into<ScanError>) -> Self {
        Self {
            label: label.into(),
            error: error.into(),
        }
    }
}

fn unknown_type_label(fingerprint_type_id: i64) -> String {
    format!("type #{}", fingerprint_type_id)
}

impl FingerprintService {
    /// Register a batch of scans for one person
    ///
    /// Fails as a whole only if the person does not exist or the archive
    /// cannot be reached; everything else is reported per scan.
    pub async fn submit(
        &self,
        key: &PersonKey,
        scans: &[ScanSubmission],
    ) -> ApiResult<SubmissionResponse> {
        let (person, session) = tokio::join!(
            persons::find_person(&self.db, key),
            ArchiveSession::open(self.archive.as_ref()),
        );

        let person = match person {
            Ok(Some(person)) => Ok(person),
            Ok(None) => Err(ApiError::NotFound(format!("Person not found: {}", key))),
            Err(e) => Err(ApiError::from(e)),
        };

        let (person, mut session) = match (person, session) {
            (Ok(person), Ok(session)) => (person, session),
            (Err(e), Ok(session)) => {
                session.close().await;
                return Err(e);
            }
            (Err(e), Err(_)) => return Err(e),
            (Ok(_), Err(e)) => return Err(e.into()),
        };

        info!(person_id = %person.guid, scans = scans.len(), "Processing fingerprint batch");

        let mut report = BatchReport::default();
        for scan in scans {
            match self.process_scan(&mut session, &person, scan).await {
                Ok(name) => report.success.push(name),
                Err(failure) => {
                    warn!(
                        person_id = %person.guid,
                        fingerprint_type = %failure.label,
                        "Scan not registered: {}",
                        failure.error
                    );
                    report.error.push(failure.label);
                }
            }
        }

        session.close().await;

        info!(
            person_id = %person.guid,
            succeeded = report.success.len(),
            failed = report.error.len(),
            "Fingerprint batch finished"
        );

        Ok(SubmissionResponse {
            message: registration_summary(self.language, &report.success),
            results: report,
        })
    }

    /// Run one scan through lookup, decision, archive and store
    ///
    /// The archive is written before the record, so a record never points at
    /// a file whose upload failed.
    async fn process_scan(
        &self,
        session: &mut ArchiveSession,
        person: &Person,
        scan: &ScanSubmission,
    ) -> Result<String, ScanFailure> {
        let fingerprint_type =
            fingerprint_types::find_fingerprint_type(&self.db, scan.fingerprint_type_id)
                .await
                .map_err(|e| ScanFailure::new(unknown_type_label(scan.fingerprint_type_id), e))?
                .ok_or_else(|| {
                    ScanFailure::new(
                        unknown_type_label(scan.fingerprint_type_id),
                        ScanError::UnknownType(scan.fingerprint_type_id),
                    )
                })?;

        self.register_scan(session, person, &fingerprint_type, scan)
            .await
            .map_err(|e| ScanFailure::new(fingerprint_type.name.clone(), e))?;

        Ok(fingerprint_type.name)
    }

    async fn register_scan(
        &self,
        session: &mut ArchiveSession,
        person: &Person,
        fingerprint_type: &FingerprintType,
        scan: &ScanSubmission,
    ) -> Result<(), ScanError> {
        if scan.quality < 0 {
            return Err(ScanError::NegativeQuality(scan.quality));
        }
        let image = scan.decode_image()?;

        let existing =
            quality_records::find_by_person_and_type(&self.db, person.guid, fingerprint_type.id)
                .await?;

        let dir = retention::person_directory(person.guid);
        let listing = if retention::requires_listing(existing.as_ref()) {
            session.list_files(&dir).await?
        } else {
            Vec::new()
        };

        let decision = retention::decide(
            &dir,
            &fingerprint_type.short_name,
            existing.as_ref(),
            scan.quality,
            &listing,
        );

        match &decision {
            RetentionDecision::AcceptNew { path } | RetentionDecision::AcceptImproved { path } => {
                session.upload(&image, &dir, path).await?;
            }
            RetentionDecision::AcceptWithEviction { evict, path } => {
                session.remove(evict).await?;
                if let Err(e) = session.upload(&image, &dir, path).await {
                    self.recover_from_lost_variant(person, fingerprint_type, &dir, &listing, evict)
                        .await;
                    return Err(e.into());
                }
            }
            RetentionDecision::RecordOnly => {}
        }

        let update = retention::record_update(
            person.guid,
            fingerprint_type.id,
            scan.quality,
            &decision,
            Utc::now(),
        );
        let saved = quality_records::save(&self.db, &update).await?;

        info!(
            person_id = %person.guid,
            fingerprint_type = %fingerprint_type.short_name,
            decision = decision.label(),
            quality = scan.quality,
            best_quality = saved.quality,
            attempts = saved.attempts,
            "Scan registered"
        );

        Ok(())
    }

    /// The evicted variant is gone but its replacement never arrived
    ///
    /// A record still pointing at the evicted file is moved to the best
    /// surviving file of the finger.
    async fn recover_from_lost_variant(
        &self,
        person: &Person,
        fingerprint_type: &FingerprintType,
        dir: &str,
        listing: &[RemoteEntry],
        evicted: &str,
    ) {
        let fallback =
            retention::surviving_path(dir, &fingerprint_type.short_name, listing, evicted);
        error!(
            person_id = %person.guid,
            fingerprint_type = %fingerprint_type.short_name,
            evicted,
            fallback = fallback.as_deref().unwrap_or("none"),
            "Variant evicted but its replacement was not uploaded"
        );

        let Some(fallback) = fallback else {
            return;
        };
        match quality_records::repoint_path(
            &self.db,
            person.guid,
            fingerprint_type.id,
            evicted,
            &fallback,
        )
        .await
        {
            Ok(true) => warn!(
                person_id = %person.guid,
                fingerprint_type = %fingerprint_type.short_name,
                path = %fallback,
                "Record moved off evicted variant"
            ),
            Ok(false) => {}
            Err(e) => error!(
                person_id = %person.guid,
                fingerprint_type = %fingerprint_type.short_name,
                "Could not move record off evicted variant: {}",
                e
            ),
        }
    }
}
