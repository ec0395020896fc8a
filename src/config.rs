use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// HTTP listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    7071
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Azure Resource Manager (control plane) endpoints
#[derive(Debug, Deserialize, Clone)]
pub struct ControlPlaneConfig {
    /// Token authority, without the tenant segment
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
    /// Resource management API host
    #[serde(default = "default_management_host")]
    pub management_host: String,
    /// Audience requested in the client-credentials exchange
    #[serde(default = "default_resource")]
    pub resource: String,
    /// Pinned `api-version` for every resource call
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Send `If-Match` with the entity tag read before the update
    #[serde(default = "default_conditional_update")]
    pub conditional_update: bool,
}

fn default_authority_host() -> String {
    "https://login.windows.net".to_string()
}

fn default_management_host() -> String {
    "https://management.azure.com".to_string()
}

fn default_resource() -> String {
    "https://management.core.windows.net/".to_string()
}

fn default_api_version() -> String {
    "2018-07-12".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_conditional_update() -> bool {
    true
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            authority_host: default_authority_host(),
            management_host: default_management_host(),
            resource: default_resource(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            conditional_update: default_conditional_update(),
        }
    }
}

/// Bot file storage settings
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Blob container receiving bot files
    #[serde(default = "default_container")]
    pub container: String,
    /// Write bot files below this directory instead of blob storage
    #[serde(default)]
    pub local_path: Option<String>,
}

fn default_container() -> String {
    "botfiles".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
            local_path: None,
        }
    }
}

/// Root application configuration
#[derive(Deserialize, Clone)]
pub struct AppConfig {
    /// Environments a bot file may be requested for
    pub environments: Vec<String>,
    #[serde(default)]
    pub storage_connection_string: String,
    pub arm_client_id: String,
    pub arm_client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,
    /// Bot application password, copied verbatim into every bot file
    pub app_password: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub control_plane: ControlPlaneConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("environments", &self.environments)
            .field("storage_connection_string", &"<redacted>")
            .field("arm_client_id", &self.arm_client_id)
            .field("arm_client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .field("app_password", &"<redacted>")
            .field("server", &self.server)
            .field("control_plane", &self.control_plane)
            .field("storage", &self.storage)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g. GAMEATRON_ARM_CLIENT_ID, GAMEATRON_SERVER__PORT,
            // GAMEATRON_ENVIRONMENTS=dev;test
            .add_source(
                Environment::with_prefix("GAMEATRON")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(";")
                    .with_list_parse_key("environments")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Initialize the global config singleton
    pub fn init() -> Result<&'static Self, ConfigError> {
        let config = Self::load()?;
        Ok(CONFIG.get_or_init(|| config))
    }

    /// Drop blank allow-list entries left by stray separators.
    pub fn normalize(&mut self) {
        self.environments = self
            .environments
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environments.is_empty() {
            return Err(ConfigError::Message(
                "environments allow-list is empty".to_string(),
            ));
        }

        let required = [
            ("arm_client_id", &self.arm_client_id),
            ("arm_client_secret", &self.arm_client_secret),
            ("tenant_id", &self.tenant_id),
            ("subscription_id", &self.subscription_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{} is not set", name)));
            }
        }

        if self.storage.local_path.is_none() && self.storage_connection_string.trim().is_empty() {
            return Err(ConfigError::Message(
                "storage_connection_string is not set and storage.local_path is absent".to_string(),
            ));
        }

        Ok(())
    }
}

/// Join a host and a path with exactly one slash between them
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
