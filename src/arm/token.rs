//! Client-credentials token exchange against the Azure AD v1 authority.

use crate::config::{join_url, ControlPlaneConfig};
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};
use zeroize::Zeroize;

/// Bearer token for the control plane.
///
/// Fetched fresh for every provisioning run and wiped on drop.
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Drop for AccessToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Exchanges client credentials for control-plane access tokens.
#[derive(Clone)]
pub struct CredentialProvider {
    http: Client,
    authority_host: String,
    resource: String,
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("authority_host", &self.authority_host)
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

impl CredentialProvider {
    pub fn new(http: Client, config: &ControlPlaneConfig) -> Self {
        Self {
            http,
            authority_host: config.authority_host.trim_end_matches('/').to_string(),
            resource: config.resource.clone(),
        }
    }

    fn token_url(&self, tenant_id: &str) -> String {
        join_url(&self.authority_host, &format!("{}/oauth2/token", tenant_id))
    }

    /// Perform a single `client_credentials` exchange.
    pub async fn acquire_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> AppResult<AccessToken> {
        let url = self.token_url(tenant_id);
        debug!("Requesting control plane token from {}", url);

        let form = [
            ("resource", self.resource.as_str()),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!("Token request failed: {}", e);
                AppError::Auth(format!("token request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token endpoint returned {}: {}", status, body);
            return Err(AppError::Auth(format!("token endpoint returned {}", status)));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            error!("Failed to parse token response: {}", e);
            AppError::Auth(format!("unparsable token response: {}", e))
        })?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
            _ => Err(AppError::Auth(
                "token response has no access_token".to_string(),
            )),
        }
    }
}
