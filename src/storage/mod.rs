//! Bot file storage.
//!
//! [`BlobStore`] is the seam between publishing and the storage backend.
//! Azure Blob Storage is used in deployments; [`LocalBlobStore`] writes to
//! disk for development.

pub mod azure;
pub mod connection_string;
pub mod local;
pub mod publisher;

pub use azure::AzureBlobStore;
pub use connection_string::{StorageAccount, StorageCredential};
pub use local::LocalBlobStore;
pub use publisher::{BundleLocation, BundlePublisher, BOT_FILE_NAME};

use crate::config::AppConfig;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Error type for blob storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    #[error("Blob already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Storage error: {0}")]
    Backend(String),
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Publish(e.to_string())
    }
}

/// Write-once object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `content` at `path` and return a URI for it.
    ///
    /// Fails with [`StorageError::AlreadyExists`] rather than replacing an
    /// existing object. An object is only reachable once fully written.
    async fn put_new(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Select the storage backend from configuration.
pub fn store_from_config(http: Client, config: &AppConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    if let Some(path) = &config.storage.local_path {
        info!("Storing bot files below {}", path);
        return Ok(Arc::new(LocalBlobStore::new(path)));
    }

    let store = AzureBlobStore::from_connection_string(
        http,
        &config.storage_connection_string,
        config.storage.container.clone(),
    )?;
    info!("Storing bot files in blob container {}", config.storage.container);
    Ok(Arc::new(store))
}
