//! Generic read and update calls against Azure Resource Manager.

use crate::arm::document::ResourceDocument;
use crate::arm::token::AccessToken;
use crate::config::{join_url, ControlPlaneConfig};
use crate::error::{AppError, AppResult};
use reqwest::header::{AUTHORIZATION, ETAG, IF_MATCH};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Reads and patches resources below
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{path}`.
#[derive(Clone)]
pub struct ResourceClient {
    http: Client,
    management_host: String,
    api_version: String,
    conditional_update: bool,
}

impl std::fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("management_host", &self.management_host)
            .field("api_version", &self.api_version)
            .field("conditional_update", &self.conditional_update)
            .finish_non_exhaustive()
    }
}

impl ResourceClient {
    pub fn new(http: Client, config: &ControlPlaneConfig) -> Self {
        Self {
            http,
            management_host: config.management_host.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            conditional_update: config.conditional_update,
        }
    }

    /// Absolute URL of a resource, with the pinned `api-version`.
    pub fn resource_url(&self, subscription_id: &str, resource_group: &str, resource_path: &str) -> String {
        let path = format!(
            "subscriptions/{}/resourceGroups/{}/providers/{}?api-version={}",
            subscription_id,
            resource_group,
            resource_path.trim_start_matches('/'),
            self.api_version
        );
        join_url(&self.management_host, &path)
    }

    /// GET a resource and keep its full JSON body.
    pub async fn get_resource(
        &self,
        token: &AccessToken,
        subscription_id: &str,
        resource_group: &str,
        resource_path: &str,
    ) -> AppResult<ResourceDocument> {
        let url = self.resource_url(subscription_id, resource_group, resource_path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, token.bearer())
            .send()
            .await
            .map_err(|e| {
                error!("Resource read request failed: {}", e);
                AppError::ResourceRead(format!("{}: {}", resource_path, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Resource read of {} returned {}: {}", resource_path, status, body);
            return Err(AppError::ResourceRead(format!(
                "{} returned {}",
                resource_path, status
            )));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body: Value = response.json().await.map_err(|e| {
            error!("Failed to parse resource {}: {}", resource_path, e);
            AppError::ResourceRead(format!("{}: unparsable body: {}", resource_path, e))
        })?;

        Ok(ResourceDocument::new(body).with_etag_header(etag))
    }

    /// PATCH a resource with its complete document.
    ///
    /// With conditional updates enabled and an entity tag known, the write
    /// only succeeds if the resource is unchanged since it was read.
    pub async fn update_resource(
        &self,
        token: &AccessToken,
        subscription_id: &str,
        resource_group: &str,
        resource_path: &str,
        document: &ResourceDocument,
    ) -> AppResult<()> {
        let url = self.resource_url(subscription_id, resource_group, resource_path);
        debug!("PATCH {}", url);

        let mut request = self
            .http
            .patch(&url)
            .header(AUTHORIZATION, token.bearer())
            .json(document.as_value());

        match (self.conditional_update, document.etag()) {
            (true, Some(etag)) => request = request.header(IF_MATCH, etag),
            (true, None) => warn!(
                "No entity tag for {}; updating unconditionally",
                resource_path
            ),
            (false, _) => {}
        }

        let response = request.send().await.map_err(|e| {
            error!("Resource write request failed: {}", e);
            AppError::ResourceWrite(format!("{}: {}", resource_path, e))
        })?;

        let status = response.status();
        if status == StatusCode::PRECONDITION_FAILED {
            warn!("Resource {} changed since it was read", resource_path);
            return Err(AppError::Conflict(resource_path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Resource write of {} returned {}: {}", resource_path, status, body);
            return Err(AppError::ResourceWrite(format!(
                "{} returned {}",
                resource_path, status
            )));
        }

        Ok(())
    }
}
