use anyhow::{bail, Context, Result};
use clap::Args;
use gameatron_botfile::config::{join_url, AppConfig};
use gameatron_botfile::provision::ProvisioningParams;
use gameatron_botfile::{http, BotFileService};
use tracing::{debug, info};

/// Which bot to point where.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Environment name (must be allow-listed by the service)
    #[arg(long)]
    pub env: String,
    /// Instance number or name within the environment
    #[arg(long)]
    pub instance: String,
    /// Messaging endpoint the bot should call
    #[arg(long)]
    pub endpoint: String,
}

impl Target {
    fn params(&self) -> ProvisioningParams {
        ProvisioningParams {
            env: Some(self.env.clone()),
            instance: Some(self.instance.clone()),
            endpoint: Some(self.endpoint.clone()),
        }
    }
}

/// Call the trigger of a running service and return the bot file URI.
pub async fn request(service_url: &str, target: &Target) -> Result<String> {
    let url = join_url(service_url, "api/HttpTrigger");
    debug!("Requesting bot file from {}", url);
    let response = reqwest::Client::new()
        .get(&url)
        .query(&[
            ("env", target.env.as_str()),
            ("instance", target.instance.as_str()),
            ("endpoint", target.endpoint.as_str()),
        ])
        .send()
        .await
        .with_context(|| format!("calling {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("service returned {}: {}", status, body);
    }

    let uri: String = response
        .json()
        .await
        .context("service response is not a JSON string")?;
    Ok(uri)
}

/// Run validation, provisioning and publishing without the HTTP layer.
pub async fn provision(target: &Target) -> Result<String> {
    let config = AppConfig::load().context("loading configuration")?;
    info!("Provisioning {}/{} in-process", target.env, target.instance);
    let client = http::build_client(&config.control_plane)?;
    let service = BotFileService::from_config(client, &config)?;
    let location = service.handle(&target.params()).await?;
    Ok(location.uri)
}

/// Print a redacted view of the effective configuration.
pub fn check_config() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    println!("{:#?}", config);
    Ok(())
}
