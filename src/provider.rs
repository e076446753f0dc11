//! Pluggable filesystem backend
//!
//! The walker never touches the filesystem directly; everything goes through
//! [`FsProvider`]. The default backend is [`TokioFs`]. Tests substitute an
//! in-memory implementation, see [`crate::memfs::MemFs`].

use std::future::Future;
use std::io;
use std::path::Path;

use tokio::io::AsyncRead;

/// Minimal metadata the walker needs about one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Size in bytes. Zero for directories.
    pub len: u64,
}

/// Asynchronous filesystem operations required by the walker.
///
/// Futures must be `Send` because I/O runs on spawned tasks while the session
/// loop keeps dispatching completions.
pub trait FsProvider: Send + Sync + 'static {
    /// Byte stream handed to the consumer in `Stream` events.
    type Stream: AsyncRead + Send + Unpin + 'static;

    /// Fetch metadata without following symlinks.
    fn stat(&self, path: &Path) -> impl Future<Output = io::Result<FileMeta>> + Send;

    /// List the child names of a directory.
    fn read_dir(&self, path: &Path) -> impl Future<Output = io::Result<Vec<String>>> + Send;

    /// Open a readable byte stream for a file.
    fn open_read_stream(&self, path: &Path) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Real-filesystem backend built on `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

impl FsProvider for TokioFs {
    type Stream = tokio::fs::File;

    async fn stat(&self, path: &Path) -> io::Result<FileMeta> {
        let meta = tokio::fs::symlink_metadata(path).await?;
        Ok(FileMeta {
            is_dir: meta.is_dir(),
            len: meta.len(),
        })
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut reader = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn open_read_stream(&self, path: &Path) -> io::Result<Self::Stream> {
        tokio::fs::File::open(path).await
    }
}
