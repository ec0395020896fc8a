use crate::error::{AppError, AppResult};
use crate::storage::BlobStore;
use gameatron_types::BotFile;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// File name of every published bot file
pub const BOT_FILE_NAME: &str = "GameATron4000.Development.bot";

/// Where a bot file was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLocation {
    /// Storage key: `{environment}/{id}/GameATron4000.Development.bot`
    pub path: String,
    /// URI the bot file can be fetched from
    pub uri: String,
}

/// Storage key for a bot file.
pub fn bundle_path(environment: &str, id: Uuid) -> String {
    format!("{}/{}/{}", environment, id, BOT_FILE_NAME)
}

/// Serialises bot files and writes each one to a fresh storage key.
#[derive(Clone)]
pub struct BundlePublisher {
    store: Arc<dyn BlobStore>,
}

impl std::fmt::Debug for BundlePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundlePublisher").finish_non_exhaustive()
    }
}

impl BundlePublisher {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub async fn publish(&self, bot_file: &BotFile, environment: &str) -> AppResult<BundleLocation> {
        let content = serde_json::to_vec_pretty(bot_file)
            .map_err(|e| AppError::internal(format!("Failed to serialize bot file: {}", e)))?;
        let path = bundle_path(environment, Uuid::new_v4());

        let uri = self
            .store
            .put_new(&path, content, "application/json")
            .await
            .map_err(|e| {
                error!("Failed to publish {}: {}", path, e);
                AppError::from(e)
            })?;

        info!("Published bot file to {}", uri);
        Ok(BundleLocation { path, uri })
    }
}
