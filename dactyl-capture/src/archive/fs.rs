//! Archive backed by a directory tree
//!
//! The archive root is a local directory or a mounted share. Remote paths
//! map one-to-one onto paths below the root.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{validate_path, ArchiveClient, ArchiveConnection, ArchiveError, ArchiveResult, RemoteEntry};

/// File-system archive client
#[derive(Debug, Clone)]
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArchiveClient for FsArchive {
    async fn connect(&self) -> ArchiveResult<Box<dyn ArchiveConnection>> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(Box::new(FsConnection {
            root: self.root.clone(),
            open: true,
        }))
    }
}

struct FsConnection {
    root: PathBuf,
    open: bool,
}

impl FsConnection {
    fn resolve(&self, path: &str) -> ArchiveResult<PathBuf> {
        if !self.open {
            return Err(ArchiveError::NotConnected);
        }
        validate_path(path)?;
        Ok(self.root.join(path))
    }
}

fn not_found_as(path: &str, err: std::io::Error) -> ArchiveError {
    if err.kind() == ErrorKind::NotFound {
        ArchiveError::NotFound(path.to_string())
    } else {
        ArchiveError::Io(err)
    }
}

#[async_trait]
impl ArchiveConnection for FsConnection {
    async fn list_files(&mut self, dir: &str) -> ArchiveResult<Vec<RemoteEntry>> {
        let local_dir = self.resolve(dir)?;

        let mut read_dir = match tokio::fs::read_dir(&local_dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                entries.push(RemoteEntry::new(entry.file_name().to_string_lossy()));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(entries)
    }

    async fn upload(&mut self, bytes: &[u8], dir: &str, full_path: &str) -> ArchiveResult<()> {
        let local_dir = self.resolve(dir)?;
        let local_path = self.resolve(full_path)?;

        tokio::fs::create_dir_all(&local_dir).await?;
        tokio::fs::write(&local_path, bytes).await?;
        Ok(())
    }

    async fn download(&mut self, full_path: &str) -> ArchiveResult<Vec<u8>> {
        let local_path = self.resolve(full_path)?;
        tokio::fs::read(&local_path)
            .await
            .map_err(|e| not_found_as(full_path, e))
    }

    async fn remove(&mut self, full_path: &str) -> ArchiveResult<()> {
        let local_path = self.resolve(full_path)?;
        tokio::fs::remove_file(&local_path)
            .await
            .map_err(|e| not_found_as(full_path, e))
    }

    async fn disconnect(&mut self) -> ArchiveResult<()> {
        if !self.open {
            return Err(ArchiveError::NotConnected);
        }
        self.open = false;
        Ok(())
    }
}
