//! Shared test fixtures: in-memory database, in-memory archive, one person

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dactyl_capture::archive::MemoryArchive;
use dactyl_capture::db::persons::{create_person, NewPerson, PersonKey};
use dactyl_capture::db::quality_records;
use dactyl_capture::models::ScanSubmission;
use dactyl_capture::services::retention::person_directory;
use dactyl_capture::services::FingerprintService;
use dactyl_common::config::Language;
use dactyl_common::db::{init_database, init_memory_database, Person, QualityRecord};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

pub const RIGHT_THUMB: i64 = 1;
pub const RIGHT_INDEX: i64 = 2;
pub const RIGHT_MIDDLE: i64 = 3;

pub struct TestEnv {
    pub db: SqlitePool,
    pub archive: MemoryArchive,
    pub service: FingerprintService,
    pub person: Person,
}

impl TestEnv {
    pub fn key(&self) -> PersonKey {
        PersonKey::Id(self.person.guid)
    }

    pub fn dir(&self) -> String {
        person_directory(self.person.guid)
    }

    pub fn path(&self, file_name: &str) -> String {
        format!("{}/{}", self.dir(), file_name)
    }

    pub fn files(&self) -> Vec<String> {
        self.archive.file_names(&self.dir())
    }

    pub async fn record(&self, type_id: i64) -> Option<QualityRecord> {
        quality_records::find_by_person_and_type(&self.db, self.person.guid, type_id)
            .await
            .expect("record lookup")
    }
}

pub async fn setup() -> TestEnv {
    let db = init_memory_database().await.expect("memory database");
    setup_with_pool(db).await
}

/// Same fixtures over a database file, for tests that need several connections
pub async fn setup_with_database_file(path: &Path) -> TestEnv {
    let db = init_database(path).await.expect("file database");
    setup_with_pool(db).await
}

async fn setup_with_pool(db: SqlitePool) -> TestEnv {
    let archive = MemoryArchive::new();
    let service = FingerprintService::new(db.clone(), Arc::new(archive.clone()), Language::En);
    let person = create_person(
        &db,
        NewPerson {
            identity_card: "1712345678".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
        },
    )
    .await
    .expect("person");

    TestEnv {
        db,
        archive,
        service,
        person,
    }
}

pub fn scan(fingerprint_type_id: i64, quality: i64, payload: &[u8]) -> ScanSubmission {
    ScanSubmission {
        fingerprint_type_id,
        quality,
        image: STANDARD.encode(payload),
    }
}
