//! Inbound provisioning parameters and the bot identity derived from them.

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use url::Url;

/// Raw trigger parameters as received over HTTP (`env`, `instance`, `endpoint`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvisioningParams {
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// A validated provisioning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub environment: String,
    pub instance: String,
    /// Messaging endpoint, kept exactly as supplied
    pub endpoint: String,
}

impl ProvisioningRequest {
    /// Validate raw parameters against the environment allow-list.
    pub fn validate(params: &ProvisioningParams, allowed_environments: &[String]) -> AppResult<Self> {
        let environment = params.env.as_deref().unwrap_or_default();
        if !is_allowed_environment(allowed_environments, environment) {
            return Err(AppError::validation(format!(
                "environment '{}' is not allowed",
                environment
            )));
        }

        let instance = params.instance.as_deref().unwrap_or_default();
        if instance.trim().is_empty() {
            return Err(AppError::validation("instance is required"));
        }
        if !instance
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(AppError::validation(format!(
                "instance '{}' contains unsupported characters",
                instance
            )));
        }

        let endpoint = params.endpoint.as_deref().unwrap_or_default();
        if endpoint.trim().is_empty() {
            return Err(AppError::validation("endpoint is required"));
        }
        match Url::parse(endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(AppError::validation(format!(
                    "endpoint '{}' is not an http(s) URL",
                    endpoint
                )))
            }
        }

        Ok(Self {
            environment: environment.to_string(),
            instance: instance.to_string(),
            endpoint: endpoint.to_string(),
        })
    }
}

/// Whether `environment` is on the allow-list. Exact, case-sensitive match.
pub fn is_allowed_environment(allowed_environments: &[String], environment: &str) -> bool {
    allowed_environments.iter().any(|e| e == environment)
}

/// Names of the pre-registered bot resources for an environment instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub resource_group: String,
    pub bot_name: String,
}

impl BotIdentity {
    pub fn new(environment: &str, instance: &str) -> Self {
        Self {
            resource_group: format!("GameATron4000Environment-{}", environment),
            bot_name: format!("GameATron4000-{}-{}", environment, instance),
        }
    }

    pub fn for_request(request: &ProvisioningRequest) -> Self {
        Self::new(&request.environment, &request.instance)
    }

    /// Provider path of the bot service resource
    pub fn bot_service_path(&self) -> String {
        format!("Microsoft.BotService/botServices/{}", self.bot_name)
    }

    /// Provider path listing the Direct Line channel with its keys
    pub fn direct_line_keys_path(&self) -> String {
        format!(
            "{}/channels/DirectLineChannel/listChannelWithKeys",
            self.bot_service_path()
        )
    }
}
