//! In-process archive
//!
//! Backs the `memory` archive backend and the test suites. Counts
//! connections and can be told to fail individual operations on individual
//! paths.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{validate_path, ArchiveClient, ArchiveConnection, ArchiveError, ArchiveResult, RemoteEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Operation {
    Upload,
    Download,
    Remove,
}

#[derive(Debug, Default)]
struct Shared {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    failures: Mutex<HashSet<(Operation, String)>>,
    fail_connect: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

/// In-memory archive client; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    shared: Arc<Shared>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a file directly, bypassing connections
    pub fn insert(&self, full_path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        lock(&self.shared.files).insert(full_path.into(), bytes.into());
    }

    pub fn contains(&self, full_path: &str) -> bool {
        lock(&self.shared.files).contains_key(full_path)
    }

    pub fn read(&self, full_path: &str) -> Option<Vec<u8>> {
        lock(&self.shared.files).get(full_path).cloned()
    }

    /// Sorted file names directly inside `dir`
    pub fn file_names(&self, dir: &str) -> Vec<String> {
        list_dir(&lock(&self.shared.files), dir)
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.shared.disconnects.load(Ordering::SeqCst)
    }

    pub fn fail_connect(&self, fail: bool) {
        self.shared.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upload(&self, full_path: impl Into<String>) {
        self.fail(Operation::Upload, full_path.into());
    }

    pub fn fail_download(&self, full_path: impl Into<String>) {
        self.fail(Operation::Download, full_path.into());
    }

    pub fn fail_remove(&self, full_path: impl Into<String>) {
        self.fail(Operation::Remove, full_path.into());
    }

    fn fail(&self, op: Operation, full_path: String) {
        lock(&self.shared.failures).insert((op, full_path));
    }
}

fn list_dir(files: &BTreeMap<String, Vec<u8>>, dir: &str) -> Vec<RemoteEntry> {
    let prefix = format!("{}/", dir.trim_end_matches('/'));
    files
        .keys()
        .filter_map(|key| key.strip_prefix(&prefix))
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
        .map(RemoteEntry::new)
        .collect()
}

#[async_trait]
impl ArchiveClient for MemoryArchive {
    async fn connect(&self) -> ArchiveResult<Box<dyn ArchiveConnection>> {
        if self.shared.fail_connect.load(Ordering::SeqCst) {
            return Err(ArchiveError::Injected("connect".to_string()));
        }
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            shared: Arc::clone(&self.shared),
            open: true,
        }))
    }
}

struct MemoryConnection {
    shared: Arc<Shared>,
    open: bool,
}

impl MemoryConnection {
    fn check(&self, op: Option<Operation>, path: &str) -> ArchiveResult<()> {
        if !self.open {
            return Err(ArchiveError::NotConnected);
        }
        validate_path(path)?;
        if let Some(op) = op {
            if lock(&self.shared.failures).contains(&(op, path.to_string())) {
                return Err(ArchiveError::Injected(path.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ArchiveConnection for MemoryConnection {
    async fn list_files(&mut self, dir: &str) -> ArchiveResult<Vec<RemoteEntry>> {
        self.check(None, dir)?;
        Ok(list_dir(&lock(&self.shared.files), dir))
    }

    async fn upload(&mut self, bytes: &[u8], dir: &str, full_path: &str) -> ArchiveResult<()> {
        self.check(None, dir)?;
        self.check(Some(Operation::Upload), full_path)?;
        lock(&self.shared.files).insert(full_path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn download(&mut self, full_path: &str) -> ArchiveResult<Vec<u8>> {
        self.check(Some(Operation::Download), full_path)?;
        lock(&self.shared.files)
            .get(full_path)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(full_path.to_string()))
    }

    async fn remove(&mut self, full_path: &str) -> ArchiveResult<()> {
        self.check(Some(Operation::Remove), full_path)?;
        lock(&self.shared.files)
            .remove(full_path)
            .map(|_| ())
            .ok_or_else(|| ArchiveError::NotFound(full_path.to_string()))
    }

    async fn disconnect(&mut self) -> ArchiveResult<()> {
        if !self.open {
            return Err(ArchiveError::NotConnected);
        }
        self.open = false;
        self.shared.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
