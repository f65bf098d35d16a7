//! Remote fingerprint archive
//!
//! The archive is a directory-scoped file store reached through a
//! connection. Connections are not reentrant: one caller drives one
//! connection, one operation at a time. [`ArchiveSession`] is the only way
//! the services touch a connection; it guarantees the disconnect runs on
//! every exit path.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub mod fs;
pub mod memory;

pub use fs::FsArchive;
pub use memory::MemoryArchive;

/// Archive transport errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive connection is not open")]
    NotConnected,

    #[error("Archive file not found: {0}")]
    NotFound(String),

    #[error("Invalid archive path: {0}")]
    InvalidPath(String),

    #[error("Archive IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure configured on a [`MemoryArchive`]
    #[error("Injected archive failure: {0}")]
    Injected(String),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEntry {
    pub name: String,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Factory for archive connections
#[async_trait]
pub trait ArchiveClient: Send + Sync {
    /// Open a new connection
    async fn connect(&self) -> ArchiveResult<Box<dyn ArchiveConnection>>;
}

/// An open connection to the archive
///
/// Paths are `/`-separated and relative to the archive root.
#[async_trait]
pub trait ArchiveConnection: Send {
    /// Files (not directories) directly inside `dir`; empty if `dir` is missing
    async fn list_files(&mut self, dir: &str) -> ArchiveResult<Vec<RemoteEntry>>;

    /// Store `bytes` at `full_path`, creating `dir` if needed
    async fn upload(&mut self, bytes: &[u8], dir: &str, full_path: &str) -> ArchiveResult<()>;

    async fn download(&mut self, full_path: &str) -> ArchiveResult<Vec<u8>>;

    async fn remove(&mut self, full_path: &str) -> ArchiveResult<()>;

    async fn disconnect(&mut self) -> ArchiveResult<()>;
}

/// Scoped archive connection
///
/// Open with [`ArchiveSession::open`], release with [`ArchiveSession::close`].
/// A session dropped without `close` (early return, panic, cancelled future)
/// disconnects on the current tokio runtime in the background.
pub struct ArchiveSession {
    conn: Option<Box<dyn ArchiveConnection>>,
}

impl ArchiveSession {
    pub async fn open(client: &dyn ArchiveClient) -> ArchiveResult<Self> {
        let conn = client.connect().await?;
        debug!("Archive connection opened");
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> ArchiveResult<&mut (dyn ArchiveConnection + 'static)> {
        self.conn.as_deref_mut().ok_or(ArchiveError::NotConnected)
    }

    pub async fn list_files(&mut self, dir: &str) -> ArchiveResult<Vec<RemoteEntry>> {
        self.conn()?.list_files(dir).await
    }

    pub async fn upload(&mut self, bytes: &[u8], dir: &str, full_path: &str) -> ArchiveResult<()> {
        self.conn()?.upload(bytes, dir, full_path).await
    }

    pub async fn download(&mut self, full_path: &str) -> ArchiveResult<Vec<u8>> {
        self.conn()?.download(full_path).await
    }

    pub async fn remove(&mut self, full_path: &str) -> ArchiveResult<()> {
        self.conn()?.remove(full_path).await
    }

    /// Disconnect. Failures are logged, not returned: the session is over
    /// either way and callers already hold their real outcome.
    pub async fn close(mut self) {
        if let Some(mut conn) = self.conn.take() {
            match conn.disconnect().await {
                Ok(()) => debug!("Archive connection closed"),
                Err(e) => warn!("Archive disconnect failed: {}", e),
            }
        }
    }
}

impl Drop for ArchiveSession {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        warn!("Archive session dropped without close, disconnecting in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = conn.disconnect().await {
                        warn!("Background archive disconnect failed: {}", e);
                    }
                });
            }
            Err(_) => warn!("No tokio runtime, archive connection abandoned"),
        }
    }
}

/// Reject absolute paths and parent-directory escapes
pub(crate) fn validate_path(path: &str) -> ArchiveResult<()> {
    if path.is_empty() || path.starts_with('/') || path.split('/').any(|part| part == "..") {
        return Err(ArchiveError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_disconnects_exactly_once() {
        let archive = MemoryArchive::new();

        let session = ArchiveSession::open(&archive).await.unwrap();
        assert_eq!(archive.connects(), 1);
        assert_eq!(archive.disconnects(), 0);

        session.close().await;
        assert_eq!(archive.disconnects(), 1);
    }

    #[tokio::test]
    async fn test_drop_without_close_still_disconnects() {
        let archive = MemoryArchive::new();

        {
            let _session = ArchiveSession::open(&archive).await.unwrap();
        }
        // The background disconnect needs a turn of the runtime
        for _ in 0..10 {
            if archive.disconnects() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(archive.disconnects(), 1);
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("Person/Fingerprints/x/RT.wsq").is_ok());
        assert!(validate_path("/etc/passwd").is_err());
        assert!(validate_path("Person/../../secret").is_err());
        assert!(validate_path("").is_err());
    }
}
