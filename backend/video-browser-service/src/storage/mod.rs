/// Object storage access
///
/// `ObjectStore` is the seam between request handlers and the remote
/// bucket. `GcsObjectStore` talks to the Cloud Storage JSON API.
pub mod auth;
pub mod gcs;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::BucketObject;

pub use auth::{ServiceAccountKey, TokenProvider, TokenSource};
pub use gcs::GcsObjectStore;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while talking to object storage
#[derive(Debug, Error)]
pub enum StorageError {
    /// Credentials file missing or malformed
    #[error("credentials error: {0}")]
    Credentials(String),

    /// Access token could not be obtained
    #[error("authentication error: {0}")]
    Auth(String),

    /// Transport-level failure
    #[error("http error: {0}")]
    Http(String),

    /// Object or bucket does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-success response from the storage API
    #[error("storage API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StorageError::Decode(err.to_string())
        } else {
            StorageError::Http(err.to_string())
        }
    }
}

/// Read-only access to bucket contents
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object in `bucket`
    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<BucketObject>>;

    /// Fetch metadata for exactly one object
    async fn get_object(&self, bucket: &str, name: &str) -> StorageResult<BucketObject>;
}
