//! Content blob storage
//!
//! Metadata and content are stored separately: the tree engine owns the
//! relational rows, a [`BlobDriver`] owns the bytes of regular files, keyed
//! by file id. Only the capability contract here is normative; the local
//! filesystem driver is the reference implementation.

mod filesystem;
mod reaper;

pub use filesystem::FileSystemDriver;
pub use reaper::{BlobReaper, ReapReport};

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, ReadBuf};
use uuid::Uuid;

/// Errors produced by blob drivers.
#[derive(Error, Debug)]
pub enum BlobError {
    /// No bytes are stored under the file id
    #[error("no content stored for file {0}")]
    NotFound(Uuid),

    /// The content stream exceeded the configured maximum file size
    #[error("content exceeds the maximum file size")]
    TooLarge,

    /// Underlying storage I/O failure
    #[error("content i/o error: {0}")]
    Io(#[from] io::Error),
}

/// A scoped content reader. The underlying resource is released when the
/// reader is dropped, on every exit path.
pub struct BlobReader {
    inner: Pin<Box<dyn AsyncRead + Send>>,
}

impl std::fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobReader").finish_non_exhaustive()
    }
}

impl BlobReader {
    pub fn new(inner: impl AsyncRead + Send + 'static) -> Self {
        Self { inner: Box::pin(inner) }
    }
}

impl AsyncRead for BlobReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

/// Capability contract for content byte storage.
#[async_trait]
pub trait BlobDriver: Send + Sync {
    /// Opens the stored bytes of a regular file for streaming.
    async fn read_regular_content(&self, id: Uuid) -> Result<BlobReader, BlobError>;

    /// Consumes `content` in chunks of at most `chunk_size` bytes and
    /// installs it atomically under `id`: a concurrent reader observes
    /// either the previous bytes or the new bytes, never a truncated file.
    ///
    /// Fails with [`BlobError::TooLarge`] once the stream exceeds
    /// `max_file_size`, leaving no partial artifact behind. Returns the
    /// number of bytes written.
    async fn write_regular_content(
        &self,
        content: &mut (dyn AsyncRead + Send + Unpin),
        id: Uuid,
        chunk_size: usize,
        max_file_size: u64,
    ) -> Result<u64, BlobError>;

    /// Removes the stored bytes of a regular file.
    async fn remove_regular_content(&self, id: Uuid) -> Result<(), BlobError>;
}
