//! Request/response models of the fingerprint boundary
//!
//! Images cross the boundary as base64 text and are raw bytes inside.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dactyl_common::db::FingerprintType;
use serde::{Deserialize, Serialize};

/// One scan of a submitted batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSubmission {
    pub fingerprint_type_id: i64,
    /// Caller-declared quality score
    pub quality: i64,
    /// Base64-encoded scan payload
    pub image: String,
}

impl ScanSubmission {
    pub fn decode_image(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.image.trim())
    }
}

/// POST /persons/:key/fingerprints body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub fingerprints: Vec<ScanSubmission>,
}

/// Per-batch outcome, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub success: Vec<String>,
    pub error: Vec<String>,
}

/// POST /persons/:key/fingerprints response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub message: String,
    pub results: BatchReport,
}

/// Registered finger summary (timestamps and paths stripped)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredFingerprint {
    pub type_id: i64,
    pub name: String,
}

/// One stored fingerprint retrieved for side-by-side comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub id: i64,
    pub quality: i64,
    pub fingerprint_type: FingerprintType,
    /// Base64-encoded file contents
    pub image: String,
}

pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
