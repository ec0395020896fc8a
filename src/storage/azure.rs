//! Azure Blob Storage backend.
//!
//! Each bot file is uploaded as a block blob with a single `Put Blob`
//! request, so readers see either the complete blob or nothing.

use crate::storage::connection_string::StorageAccount;
use crate::storage::{BlobStore, StorageError};
use async_trait::async_trait;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, IF_NONE_MATCH};
use reqsign::{AzureStorageCredential, AzureStorageLoader, AzureStorageSigner};
use reqwest::{Client, StatusCode};
use tracing::{debug, error};
use url::Url;

const STORAGE_API_VERSION: &str = "2019-12-12";

/// Writes bot files into one container of an Azure storage account.
pub struct AzureBlobStore {
    http: Client,
    account: StorageAccount,
    container: String,
    loader: AzureStorageLoader,
    signer: AzureStorageSigner,
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("account", &self.account)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl AzureBlobStore {
    pub fn new(http: Client, account: StorageAccount, container: impl Into<String>) -> Self {
        let loader = AzureStorageLoader::new(account.credential.signer_config());
        Self {
            http,
            account,
            container: container.into(),
            loader,
            signer: AzureStorageSigner::new(),
        }
    }

    pub fn from_connection_string(
        http: Client,
        connection_string: &str,
        container: impl Into<String>,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(http, StorageAccount::parse(connection_string)?, container))
    }

    /// Public URL of a blob; never carries the SAS token.
    pub fn blob_url(&self, path: &str) -> Result<Url, StorageError> {
        let mut url = self.account.blob_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidPath(format!("endpoint cannot hold {}", path)))?
            .pop_if_empty()
            .push(&self.container)
            .extend(path.split('/'));
        Ok(url)
    }

    async fn credential(&self) -> Result<AzureStorageCredential, StorageError> {
        self.loader
            .load()
            .await
            .map_err(|e| StorageError::Backend(format!("loading storage credential: {}", e)))?
            .ok_or_else(|| StorageError::Backend("no storage credential configured".to_string()))
    }

    /// Build and sign a `Put Blob` that refuses to replace an existing blob.
    async fn signed_put(
        &self,
        url: &Url,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<reqwest::Request, StorageError> {
        let mut request = http::Request::put(url.as_str())
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content.len())
            .header(IF_NONE_MATCH, "*")
            .body(content)
            .map_err(|e| StorageError::Backend(format!("building blob request: {}", e)))?;

        let credential = self.credential().await?;
        self.signer
            .sign(&mut request, &credential)
            .map_err(|e| StorageError::Backend(format!("signing blob request: {}", e)))?;

        reqwest::Request::try_from(request)
            .map_err(|e| StorageError::Backend(e.to_string()))
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn put_new(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let blob_url = self.blob_url(path)?;
        let request = self.signed_put(&blob_url, content, content_type).await?;

        debug!("PUT blob {}", blob_url);
        let response = self.http.execute(request).await.map_err(|e| {
            error!("Blob upload request failed: {}", e);
            StorageError::Backend(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Blob upload of {} returned {}: {}", path, status, body);
            return Err(StorageError::Backend(format!("blob service returned {}", status)));
        }

        Ok(blob_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_router;
    use axum::{
        body::Bytes,
        extract::{Path, RawQuery},
        http::HeaderMap,
        routing::put,
        Router,
    };
    use std::sync::{Arc, Mutex};

    fn store(connection_string: &str) -> AzureBlobStore {
        AzureBlobStore::from_connection_string(Client::new(), connection_string, "botfiles").unwrap()
    }

    #[test]
    fn test_blob_url() {
        let s = store("AccountName=gameatron;AccountKey=c2VjcmV0");
        assert_eq!(
            s.blob_url("dev/abc/GameATron4000.Development.bot").unwrap().as_str(),
            "https://gameatron.blob.core.windows.net/botfiles/dev/abc/GameATron4000.Development.bot"
        );

        let dev = store("UseDevelopmentStorage=true");
        assert_eq!(
            dev.blob_url("dev/x.bot").unwrap().as_str(),
            "http://127.0.0.1:10000/devstoreaccount1/botfiles/dev/x.bot"
        );
    }

    #[tokio::test]
    async fn test_signed_put_headers() {
        let s = store("AccountName=acct;AccountKey=c2VjcmV0");
        let url = s.blob_url("dev/id/f.bot").unwrap();
        let request = s
            .signed_put(&url, b"{}".to_vec(), "application/json")
            .await
            .unwrap();

        let headers = request.headers();
        assert_eq!(headers["if-none-match"], "*");
        assert_eq!(headers["x-ms-blob-type"], "BlockBlob");
        assert_eq!(headers["x-ms-version"], STORAGE_API_VERSION);
        assert_eq!(headers["content-length"], "2");
        assert!(headers.contains_key("x-ms-date"));
        assert!(headers["authorization"]
            .to_str()
            .unwrap()
            .starts_with("SharedKey acct:"));
    }

    #[derive(Default, Clone)]
    struct Seen {
        puts: Arc<Mutex<Vec<(String, Option<String>, HeaderMap, Vec<u8>)>>>,
    }

    fn blob_router(seen: Seen, status: axum::http::StatusCode) -> Router {
        Router::new().route(
            "/acct/{*path}",
            put(
                move |Path(path): Path<String>,
                      RawQuery(query): RawQuery,
                      headers: HeaderMap,
                      body: Bytes| {
                    let seen = seen.clone();
                    async move {
                        seen.puts.lock().unwrap().push((path, query, headers, body.to_vec()));
                        status
                    }
                },
            ),
        )
    }

    #[tokio::test]
    async fn test_put_new_with_shared_key() {
        let seen = Seen::default();
        let base = spawn_router(blob_router(seen.clone(), axum::http::StatusCode::CREATED)).await;
        let s = store(&format!("BlobEndpoint={}/acct;AccountName=acct;AccountKey=c2VjcmV0", base));

        let uri = s
            .put_new("dev/id/f.bot", b"{}".to_vec(), "application/json")
            .await
            .unwrap();
        assert_eq!(uri, format!("{}/acct/botfiles/dev/id/f.bot", base));

        let puts = seen.puts.lock().unwrap();
        let (path, _, headers, body) = &puts[0];
        assert_eq!(path, "botfiles/dev/id/f.bot");
        assert_eq!(body, b"{}");
        assert_eq!(headers["x-ms-blob-type"], "BlockBlob");
        assert_eq!(headers["if-none-match"], "*");
        assert!(headers["authorization"]
            .to_str()
            .unwrap()
            .starts_with("SharedKey acct:"));
    }

    #[tokio::test]
    async fn test_put_new_with_sas_hides_token_in_uri() {
        let seen = Seen::default();
        let base = spawn_router(blob_router(seen.clone(), axum::http::StatusCode::CREATED)).await;
        let s = store(&format!("BlobEndpoint={}/acct;SharedAccessSignature=sv=1&sig=abc", base));

        let uri = s
            .put_new("dev/id/f.bot", b"{}".to_vec(), "application/json")
            .await
            .unwrap();
        assert!(!uri.contains("sig="));

        let puts = seen.puts.lock().unwrap();
        let (_, query, headers, _) = &puts[0];
        assert!(query.as_deref().unwrap_or_default().contains("sig=abc"));
        assert!(!headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_put_new_existing_blob() {
        let base = spawn_router(blob_router(Seen::default(), axum::http::StatusCode::CONFLICT)).await;
        let s = store(&format!("BlobEndpoint={}/acct;AccountName=acct;AccountKey=c2VjcmV0", base));

        let err = s
            .put_new("dev/id/f.bot", b"{}".to_vec(), "application/json")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_put_new_backend_failure() {
        let base = spawn_router(blob_router(
            Seen::default(),
            axum::http::StatusCode::FORBIDDEN,
        ))
        .await;
        let s = store(&format!("BlobEndpoint={}/acct;AccountName=acct;AccountKey=c2VjcmV0", base));

        let err = s
            .put_new("dev/id/f.bot", b"{}".to_vec(), "application/json")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
