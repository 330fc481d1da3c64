use serde::{Deserialize, Serialize};

/// Object metadata returned by a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub name: String,
    pub mime: Option<String>,
    pub size: Option<u64>,
}

/// Signed upload slot issued by the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUpload {
    pub path: String,
    pub token: String,
}

/// Storage abstraction over the hosted bucket holding uploaded packet files.
pub trait ObjectStore: Send + Sync {
    fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError>;
    fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, StorageError>;
    fn create_signed_upload(&self, path: &str) -> Result<SignedUpload, StorageError>;
}

/// Error enumeration for object store failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Backend(String),
}
