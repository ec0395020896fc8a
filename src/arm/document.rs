//! Resource documents and the typed views read from them.
//!
//! A [`ResourceDocument`] keeps the complete JSON representation of a
//! resource so it can be written back whole. Only the fields the
//! provisioning flow consumes get typed views; a view fails with
//! [`AppError::MalformedResponse`] when its field is missing.

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value;

/// Full JSON representation of a control-plane resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDocument {
    value: Value,
    etag: Option<String>,
}

impl ResourceDocument {
    /// Wrap a resource body; the entity tag is taken from its `etag` field.
    pub fn new(value: Value) -> Self {
        let etag = value
            .get("etag")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self { value, etag }
    }

    /// Prefer the `ETag` response header over the body field when present.
    pub fn with_etag_header(mut self, header: Option<String>) -> Self {
        if header.is_some() {
            self.etag = header;
        }
        self
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Set `properties.endpoint`, leaving every other field untouched.
    pub fn set_endpoint(&mut self, endpoint: &str) -> AppResult<()> {
        let properties = self
            .value
            .get_mut("properties")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| AppError::malformed("bot service has no properties object"))?;
        properties.insert("endpoint".to_string(), Value::String(endpoint.to_string()));
        Ok(())
    }
}

#[derive(Deserialize)]
struct BotServiceShape {
    properties: BotServiceProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BotServiceProperties {
    #[serde(default)]
    msa_app_id: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
}

/// Fields consumed from a `Microsoft.BotService/botServices` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotServiceView {
    pub msa_app_id: String,
    pub endpoint: Option<String>,
}

impl BotServiceView {
    pub fn from_document(document: &ResourceDocument) -> AppResult<Self> {
        let shape = BotServiceShape::deserialize(document.as_value())
            .map_err(|e| AppError::malformed(format!("bot service resource: {}", e)))?;

        let msa_app_id = shape
            .properties
            .msa_app_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::malformed("bot service has no properties.msaAppId"))?;

        Ok(Self {
            msa_app_id,
            endpoint: shape.properties.endpoint,
        })
    }
}

#[derive(Deserialize)]
struct ChannelShape {
    properties: ChannelOuterProperties,
}

#[derive(Deserialize)]
struct ChannelOuterProperties {
    properties: ChannelInnerProperties,
}

#[derive(Deserialize)]
struct ChannelInnerProperties {
    #[serde(default)]
    sites: Vec<ChannelSite>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSite {
    #[serde(default)]
    key: Option<String>,
}

/// Secret of the first Direct Line site from a `listChannelWithKeys` response.
pub fn direct_line_secret(document: &ResourceDocument) -> AppResult<String> {
    let shape = ChannelShape::deserialize(document.as_value())
        .map_err(|e| AppError::malformed(format!("channel resource: {}", e)))?;

    let site = shape
        .properties
        .properties
        .sites
        .into_iter()
        .next()
        .ok_or_else(|| AppError::malformed("channel has no sites"))?;

    site.key
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AppError::malformed("first channel site has no key"))
}
