//! The process-wide HTTP client.
//!
//! Built once at startup and cloned into every component; clones share the
//! same connection pool.

use crate::config::ControlPlaneConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use std::time::Duration;

/// Build the shared HTTP client.
pub fn build_client(config: &ControlPlaneConfig) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("gameatron-botfile/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))
}
