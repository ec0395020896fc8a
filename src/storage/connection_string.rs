//! Azure Storage connection strings.
//!
//! Supported forms:
//! - `DefaultEndpointsProtocol=https;AccountName=..;AccountKey=..;EndpointSuffix=..`
//! - any of the above with an explicit `BlobEndpoint=..`
//! - `BlobEndpoint=..;SharedAccessSignature=..`
//! - `UseDevelopmentStorage=true` (local emulator)
//!
//! Endpoints derived from `AccountName` always use https; give an explicit
//! `BlobEndpoint` for plain http.

use crate::storage::StorageError;
use azure_storage::ConnectionString;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqsign::AzureStorageConfig;
use url::Url;
use zeroize::Zeroize;

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// How requests to the storage account are authorised.
pub enum StorageCredential {
    /// Account name and base64 account key
    SharedKey { account: String, key: String },
    /// Shared access signature query string, without the leading `?`
    Sas(String),
}

impl StorageCredential {
    /// Request signer settings for this credential.
    pub fn signer_config(&self) -> AzureStorageConfig {
        match self {
            Self::SharedKey { account, key } => AzureStorageConfig {
                account_name: Some(account.clone()),
                account_key: Some(key.clone()),
                ..Default::default()
            },
            Self::Sas(token) => AzureStorageConfig {
                sas_token: Some(token.clone()),
                ..Default::default()
            },
        }
    }
}

impl Drop for StorageCredential {
    fn drop(&mut self) {
        match self {
            Self::SharedKey { key, .. } => key.zeroize(),
            Self::Sas(token) => token.zeroize(),
        }
    }
}

impl std::fmt::Debug for StorageCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SharedKey { account, .. } => f
                .debug_struct("SharedKey")
                .field("account", account)
                .finish_non_exhaustive(),
            Self::Sas(_) => f.write_str("Sas(<redacted>)"),
        }
    }
}

/// Parsed storage account settings.
#[derive(Debug)]
pub struct StorageAccount {
    pub blob_endpoint: Url,
    pub credential: StorageCredential,
}

impl StorageAccount {
    pub fn parse(connection_string: &str) -> Result<Self, StorageError> {
        let parsed = ConnectionString::new(connection_string)
            .map_err(|e| StorageError::InvalidConnectionString(e.to_string()))?;

        if parsed.use_development_storage == Some(true) {
            return Ok(Self {
                blob_endpoint: parse_endpoint(DEV_BLOB_ENDPOINT)?,
                credential: shared_key(DEV_ACCOUNT_NAME, DEV_ACCOUNT_KEY)?,
            });
        }

        let blob_endpoint = match (parsed.blob_endpoint, parsed.account_name) {
            (Some(endpoint), _) => parse_endpoint(endpoint)?,
            (None, Some(account)) => parse_endpoint(&format!(
                "https://{}.blob.{}",
                account,
                parsed.endpoint_suffix.unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
            ))?,
            (None, None) => {
                return Err(StorageError::InvalidConnectionString(
                    "neither BlobEndpoint nor AccountName is set".to_string(),
                ))
            }
        };

        let credential = match (parsed.account_name, parsed.account_key, parsed.sas) {
            (Some(account), Some(key), _) => shared_key(account, key)?,
            (_, _, Some(sas)) => StorageCredential::Sas(sas.trim_start_matches('?').to_string()),
            (None, Some(_), None) => {
                return Err(StorageError::InvalidConnectionString(
                    "AccountKey requires AccountName".to_string(),
                ))
            }
            _ => {
                return Err(StorageError::InvalidConnectionString(
                    "no AccountKey or SharedAccessSignature".to_string(),
                ))
            }
        };

        Ok(Self {
            blob_endpoint,
            credential,
        })
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, StorageError> {
    Url::parse(endpoint)
        .map_err(|e| StorageError::InvalidConnectionString(format!("bad blob endpoint: {}", e)))
}

fn shared_key(account: &str, key: &str) -> Result<StorageCredential, StorageError> {
    // The signer decodes the key per request; reject a bad key at startup instead.
    BASE64
        .decode(key)
        .map_err(|e| StorageError::InvalidConnectionString(format!("AccountKey is not base64: {}", e)))?;
    Ok(StorageCredential::SharedKey {
        account: account.to_string(),
        key: key.to_string(),
    })
}
