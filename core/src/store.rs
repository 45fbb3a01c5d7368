//! Object store writer capability.

use bytes::Bytes;

/// Errors raised while writing to object storage.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to upload object {bucket}/{key}: {source}")]
    Put {
        bucket: String,
        key: String,
        #[source]
        source: crate::BoxError,
    },
}

/// Uploads byte payloads to a bucket and key.
///
/// The engine issues exactly one `put` per transferred file.
#[async_trait::async_trait]
pub trait ObjectStoreWriter: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), Error>;
}
