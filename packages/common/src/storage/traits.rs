use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::id::BlobId;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Blob storage keyed by store-assigned opaque identifiers.
///
/// The store assigns a fresh [`BlobId`] on every write; identical content
/// stored twice yields two independent blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return the assigned identifier.
    async fn put(&self, data: &[u8]) -> Result<BlobId, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(reader).await
    }

    /// Store data from an async reader and return the assigned identifier.
    async fn put_stream(&self, reader: BoxReader) -> Result<BlobId, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, id: &BlobId) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(id).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a blob as a streaming async reader.
    async fn get_stream(&self, id: &BlobId) -> Result<BoxReader, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, id: &BlobId) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, id: &BlobId) -> Result<bool, StorageError>;

    /// Get the size of a blob in bytes.
    async fn size(&self, id: &BlobId) -> Result<u64, StorageError>;
}
