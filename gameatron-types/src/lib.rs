//! Bot file definitions for GameATron 4000.
//!
//! A bot file (`.bot`, format version 2.0) lists the services a bot runtime
//! connects to: its messaging endpoint, the Direct Line channel and the
//! Azure Bot Service registration. Downstream tooling reads these files
//! directly, so field names, nesting and entry order are fixed.

use serde::{Deserialize, Serialize};

/// Bot file format version written by this crate.
pub const BOT_FILE_VERSION: &str = "2.0";

/// Display name used for the bot and its endpoint entry.
pub const BOT_DISPLAY_NAME: &str = "GameATron4000";

/// Root of a `.bot` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotFile {
    pub name: String,
    pub description: String,
    pub services: Vec<BotService>,
    /// Integrity field; always empty because secrets are stored in clear.
    pub padlock: String,
    pub version: String,
}

/// A typed entry of [`BotFile::services`], discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BotService {
    #[serde(rename = "endpoint")]
    Endpoint(EndpointService),
    #[serde(rename = "generic")]
    Generic(GenericService),
    #[serde(rename = "abs")]
    Abs(AbsService),
}

/// Messaging endpoint of the bot plus its application credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointService {
    pub name: String,
    pub endpoint: String,
    pub app_id: String,
    pub app_password: String,
    pub id: String,
}

/// Generic service; used for the Direct Line channel secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericService {
    pub name: String,
    pub url: String,
    pub configuration: GenericConfiguration,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericConfiguration {
    pub secret: String,
}

/// Azure Bot Service registration binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsService {
    pub name: String,
    pub service_name: String,
    pub tenant_id: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub app_id: String,
    pub id: String,
}

/// Inputs for [`BotFile::development`].
#[derive(Debug, Clone)]
pub struct BotFileParts<'a> {
    pub endpoint: &'a str,
    pub app_id: &'a str,
    pub app_password: &'a str,
    pub direct_line_secret: &'a str,
    pub bot_name: &'a str,
    pub tenant_id: &'a str,
    pub subscription_id: &'a str,
    pub resource_group: &'a str,
}

impl BotFile {
    /// Build the development bot file: endpoint (`id` 1), Direct Line
    /// (`id` 2) and bot registration (`id` 3), in that order.
    pub fn development(parts: BotFileParts<'_>) -> Self {
        Self {
            name: BOT_DISPLAY_NAME.to_string(),
            description: String::new(),
            services: vec![
                BotService::Endpoint(EndpointService {
                    name: BOT_DISPLAY_NAME.to_string(),
                    endpoint: parts.endpoint.to_string(),
                    app_id: parts.app_id.to_string(),
                    app_password: parts.app_password.to_string(),
                    id: "1".to_string(),
                }),
                BotService::Generic(GenericService {
                    name: "DirectLine".to_string(),
                    url: "nourl".to_string(),
                    configuration: GenericConfiguration {
                        secret: parts.direct_line_secret.to_string(),
                    },
                    id: "2".to_string(),
                }),
                BotService::Abs(AbsService {
                    name: "bot".to_string(),
                    service_name: parts.bot_name.to_string(),
                    tenant_id: parts.tenant_id.to_string(),
                    subscription_id: parts.subscription_id.to_string(),
                    resource_group: parts.resource_group.to_string(),
                    app_id: parts.app_id.to_string(),
                    id: "3".to_string(),
                }),
            ],
            padlock: String::new(),
            version: BOT_FILE_VERSION.to_string(),
        }
    }

    /// The messaging endpoint entry, if present.
    pub fn endpoint_service(&self) -> Option<&EndpointService> {
        self.services.iter().find_map(|s| match s {
            BotService::Endpoint(e) => Some(e),
            _ => None,
        })
    }

    /// The Direct Line channel entry, if present.
    pub fn direct_line_service(&self) -> Option<&GenericService> {
        self.services.iter().find_map(|s| match s {
            BotService::Generic(g) => Some(g),
            _ => None,
        })
    }

    /// The bot registration entry, if present.
    pub fn abs_service(&self) -> Option<&AbsService> {
        self.services.iter().find_map(|s| match s {
            BotService::Abs(a) => Some(a),
            _ => None,
        })
    }
}
