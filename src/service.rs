use crate::config::AppConfig;
use crate::error::AppResult;
use crate::provision::{BotProvisioner, ProvisioningParams, ProvisioningRequest};
use crate::storage::{store_from_config, BundleLocation, BundlePublisher};
use reqwest::Client;
use tracing::{info, warn};

/// Validates a trigger, provisions the bot and publishes its bot file.
///
/// Holds no per-request state; one instance serves concurrent requests.
#[derive(Debug)]
pub struct BotFileService {
    environments: Vec<String>,
    provisioner: BotProvisioner,
    publisher: BundlePublisher,
}

impl BotFileService {
    pub fn new(environments: Vec<String>, provisioner: BotProvisioner, publisher: BundlePublisher) -> Self {
        Self {
            environments,
            provisioner,
            publisher,
        }
    }

    /// Wire the service from configuration around one shared HTTP client.
    pub fn from_config(http: Client, config: &AppConfig) -> AppResult<Self> {
        let store = store_from_config(http.clone(), config)?;
        Ok(Self::new(
            config.environments.clone(),
            BotProvisioner::new(http, config),
            BundlePublisher::new(store),
        ))
    }

    pub fn validate(&self, params: &ProvisioningParams) -> AppResult<ProvisioningRequest> {
        ProvisioningRequest::validate(params, &self.environments).inspect_err(|e| {
            warn!("Rejected provisioning request: {}", e);
        })
    }

    /// Full run for one trigger. Nothing is published unless every
    /// provisioning stage succeeded.
    pub async fn handle(&self, params: &ProvisioningParams) -> AppResult<BundleLocation> {
        let request = self.validate(params)?;
        let bot_file = self.provisioner.provision(&request).await?;
        let location = self.publisher.publish(&bot_file, &request.environment).await?;
        info!(
            "Bot file for {}/{} available at {}",
            request.environment, request.instance, location.uri
        );
        Ok(location)
    }
}
