//! In-process stand-in for the Azure control plane and blob endpoint.
//!
//! Every request is recorded so tests can assert on call order and on
//! calls that must never happen.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, post, put},
    Json, Router,
};
use gameatron_botfile::config::{AppConfig, ControlPlaneConfig, ServerConfig, StorageConfig};
use gameatron_botfile::BotFileService;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const ETAG: &str = "\"etag-1\"";

/// Knobs for the mock's responses.
#[derive(Clone)]
pub struct Behavior {
    pub token_status: StatusCode,
    pub patch_status: StatusCode,
    pub blob_status: StatusCode,
    pub channel_status: StatusCode,
    /// `None` leaves `properties.msaAppId` out of the bot resource
    pub app_id: Option<String>,
    pub sites: Value,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            token_status: StatusCode::OK,
            patch_status: StatusCode::OK,
            blob_status: StatusCode::CREATED,
            channel_status: StatusCode::OK,
            app_id: Some("app-123".to_string()),
            sites: json!([{ "siteName": "Default Site", "key": "sek-abc", "key2": "sek-xyz" }]),
        }
    }
}

#[derive(Default)]
pub struct MockState {
    pub behavior: Behavior,
    pub calls: Mutex<Vec<String>>,
    pub patches: Mutex<Vec<(Option<String>, Value)>>,
    pub blobs: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockState {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct MockAzure {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockAzure {
    pub async fn start(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            ..MockState::default()
        });

        let router = Router::new()
            .route("/{tenant}/oauth2/token", post(token))
            .route("/subscriptions/{*rest}", any(resource))
            .route("/blob/{*path}", put(blob))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            environments: vec!["dev".to_string(), "test".to_string()],
            storage_connection_string: format!(
                "BlobEndpoint={}/blob;AccountName=acct;AccountKey=c2VjcmV0",
                self.base_url
            ),
            arm_client_id: "client-id".to_string(),
            arm_client_secret: "client-secret".to_string(),
            tenant_id: "tenant-1".to_string(),
            subscription_id: "sub-1".to_string(),
            app_password: "app-password".to_string(),
            server: ServerConfig::default(),
            control_plane: ControlPlaneConfig {
                authority_host: self.base_url.clone(),
                management_host: self.base_url.clone(),
                ..ControlPlaneConfig::default()
            },
            storage: StorageConfig::default(),
        }
    }

    pub fn service(&self) -> BotFileService {
        BotFileService::from_config(reqwest::Client::new(), &self.config()).unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn blobs(&self) -> Vec<(String, Vec<u8>)> {
        self.state.blobs.lock().unwrap().clone()
    }

    pub fn patches(&self) -> Vec<(Option<String>, Value)> {
        self.state.patches.lock().unwrap().clone()
    }
}

async fn token(State(state): State<Arc<MockState>>, Path(tenant): Path<String>) -> Response {
    state.record(format!("POST token {}", tenant));
    if !state.behavior.token_status.is_success() {
        return state.behavior.token_status.into_response();
    }
    Json(json!({ "token_type": "Bearer", "expires_in": "3599", "access_token": "mock-token" }))
        .into_response()
}

async fn resource(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer mock-token") {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let path = uri.path().to_string();
    let bot_name = path
        .split("/botServices/")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default()
        .to_string();

    if path.ends_with("/channels/DirectLineChannel/listChannelWithKeys") {
        state.record(format!("GET channel {}", bot_name));
        if !state.behavior.channel_status.is_success() {
            return state.behavior.channel_status.into_response();
        }
        return Json(json!({
            "name": format!("{}/DirectLineChannel", bot_name),
            "properties": {
                "channelName": "DirectLineChannel",
                "properties": { "sites": state.behavior.sites }
            }
        }))
        .into_response();
    }

    match method {
        Method::GET => {
            state.record(format!("GET bot {}", bot_name));
            let mut properties = json!({
                "displayName": bot_name,
                "endpoint": "https://previous.test/api/messages",
                "developerAppInsightKey": "insights"
            });
            if let Some(app_id) = &state.behavior.app_id {
                properties["msaAppId"] = json!(app_id);
            }
            (
                [("etag", ETAG)],
                Json(json!({
                    "id": path,
                    "name": bot_name,
                    "etag": ETAG,
                    "kind": "bot",
                    "properties": properties
                })),
            )
                .into_response()
        }
        Method::PATCH => {
            state.record(format!("PATCH bot {}", bot_name));
            let if_match = headers
                .get("if-match")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let document: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            state.patches.lock().unwrap().push((if_match, document));
            state.behavior.patch_status.into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn blob(State(state): State<Arc<MockState>>, Path(path): Path<String>, body: Bytes) -> StatusCode {
    state.record("PUT blob".to_string());
    if state.behavior.blob_status.is_success() {
        state.blobs.lock().unwrap().push((path, body.to_vec()));
    }
    state.behavior.blob_status
}
