use crate::arm::{direct_line_secret, BotServiceView, CredentialProvider, ResourceClient};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::provision::request::{BotIdentity, ProvisioningRequest};
use gameatron_types::{BotFile, BotFileParts};
use reqwest::Client;
use tracing::{debug, error, info};
use zeroize::Zeroize;

/// Progress of a single provisioning run.
///
/// Stages advance strictly in order; the first failure ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    TokenAcquired,
    ResourceRead,
    ResourceMutated,
    ResourceWritten,
    SecretRetrieved,
    Assembled,
}

/// Identifiers and credentials the provisioner needs from configuration.
#[derive(Clone)]
pub struct ProvisionerSettings {
    pub tenant_id: String,
    pub subscription_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub app_password: String,
}

impl ProvisionerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tenant_id: config.tenant_id.clone(),
            subscription_id: config.subscription_id.clone(),
            client_id: config.arm_client_id.clone(),
            client_secret: config.arm_client_secret.clone(),
            app_password: config.app_password.clone(),
        }
    }
}

impl Drop for ProvisionerSettings {
    fn drop(&mut self) {
        self.client_secret.zeroize();
        self.app_password.zeroize();
    }
}

impl std::fmt::Debug for ProvisionerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionerSettings")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Points a pre-registered bot at a new endpoint and assembles its bot file.
#[derive(Debug)]
pub struct BotProvisioner {
    credentials: CredentialProvider,
    resources: ResourceClient,
    settings: ProvisionerSettings,
}

impl BotProvisioner {
    pub fn new(http: Client, config: &AppConfig) -> Self {
        Self::with_parts(
            CredentialProvider::new(http.clone(), &config.control_plane),
            ResourceClient::new(http, &config.control_plane),
            ProvisionerSettings::from_config(config),
        )
    }

    pub fn with_parts(
        credentials: CredentialProvider,
        resources: ResourceClient,
        settings: ProvisionerSettings,
    ) -> Self {
        Self {
            credentials,
            resources,
            settings,
        }
    }

    /// Run token → read → update → channel secret → assemble.
    ///
    /// The update is applied before the channel secret is read and is not
    /// rolled back if a later stage fails.
    pub async fn provision(&self, request: &ProvisioningRequest) -> AppResult<BotFile> {
        let identity = BotIdentity::for_request(request);
        info!("Provisioning bot {} in {}", identity.bot_name, identity.resource_group);

        let mut stage = Stage::Start;
        let result = self.run(request, &identity, &mut stage).await;
        match &result {
            Ok(_) => debug!("Provisioning {} reached {:?}", identity.bot_name, stage),
            Err(e) => error!("Provisioning {} failed after {:?}: {}", identity.bot_name, stage, e),
        }
        result
    }

    /// Advances `stage` after each step that succeeds.
    async fn run(
        &self,
        request: &ProvisioningRequest,
        identity: &BotIdentity,
        stage: &mut Stage,
    ) -> AppResult<BotFile> {
        let settings = &self.settings;
        let bot_path = identity.bot_service_path();

        let token = self
            .credentials
            .acquire_token(&settings.tenant_id, &settings.client_id, &settings.client_secret)
            .await?;
        *stage = Stage::TokenAcquired;
        debug!("Token acquired for {}", identity.bot_name);

        let mut bot_service = self
            .resources
            .get_resource(&token, &settings.subscription_id, &identity.resource_group, &bot_path)
            .await?;
        let view = BotServiceView::from_document(&bot_service)?;
        *stage = Stage::ResourceRead;
        debug!(
            "Read {} (app id {}, endpoint {:?})",
            identity.bot_name, view.msa_app_id, view.endpoint
        );

        bot_service.set_endpoint(&request.endpoint)?;
        *stage = Stage::ResourceMutated;

        self.resources
            .update_resource(
                &token,
                &settings.subscription_id,
                &identity.resource_group,
                &bot_path,
                &bot_service,
            )
            .await?;
        *stage = Stage::ResourceWritten;
        info!("Endpoint of {} set to {}", identity.bot_name, request.endpoint);

        let channel = self
            .resources
            .get_resource(
                &token,
                &settings.subscription_id,
                &identity.resource_group,
                &identity.direct_line_keys_path(),
            )
            .await?;
        let secret = direct_line_secret(&channel)?;
        *stage = Stage::SecretRetrieved;
        debug!("Direct Line secret retrieved for {}", identity.bot_name);

        let bot_file = BotFile::development(BotFileParts {
            endpoint: &request.endpoint,
            app_id: &view.msa_app_id,
            app_password: &settings.app_password,
            direct_line_secret: &secret,
            bot_name: &identity.bot_name,
            tenant_id: &settings.tenant_id,
            subscription_id: &settings.subscription_id,
            resource_group: &identity.resource_group,
        });
        *stage = Stage::Assembled;
        info!("Bot file assembled for {}", identity.bot_name);
        Ok(bot_file)
    }
}
