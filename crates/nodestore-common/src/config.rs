//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config.toml > defaults

use serde::Deserialize;
use std::time::Duration;

/// Error raised while building or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("{0} is required")]
    Missing(&'static str),
}

/// Load the application configuration.
///
/// `file` names the optional config file (without extension), normally `config`.
pub fn load(file: &str) -> Result<AppConfig, ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    build(file, environment())
}

/// Environment variables (NODESTORE_STORAGE__BUCKET, NODESTORE_POLICY__CREDENTIALS, etc.)
///
/// Values stay strings: secrets such as `007` must not be coerced to numbers.
/// Numeric keys are converted on deserialization.
fn environment() -> config::Environment {
    config::Environment::with_prefix("NODESTORE")
        .prefix_separator("_")
        .separator("__")
}

fn build(file: &str, env: config::Environment) -> Result<AppConfig, ConfigError> {
    let cfg = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("server.auth_domain", "storage.sagecontinuum.org")?
        .set_default("storage.endpoint", "")?
        .set_default("storage.bucket", "")?
        .set_default("storage.access_key", "")?
        .set_default("storage.secret_key", "")?
        .set_default("storage.region", "us-west-2")?
        .set_default("storage.root_folder", "")?
        .set_default("storage.download_mode", "proxy")?
        .set_default("storage.presign_ttl_secs", 60)?
        .set_default("storage.timeout_secs", 30)?
        .set_default("policy.credentials", "")?
        .set_default("policy.restricted_task_substrings", "")?
        .set_default("policy.node_table_url", "https://api.sagecontinuum.org/production")?
        .set_default("policy.refresh_interval_secs", 60)?
        .set_default("policy.retry_interval_secs", 10)?
        .set_default("policy.fetch_timeout_secs", 10)?
        // Optional config file
        .add_source(config::File::with_name(file).required(false))
        .add_source(env)
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub policy: PolicyConfig,
}

impl AppConfig {
    /// Reject configurations the gateway cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("storage.endpoint"));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::Missing("storage.bucket"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Domain advertised in the `WWW-Authenticate` challenge.
    pub auth_domain: String,
}

/// How a GET request hands the object bytes to the client.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Stream the object body through the gateway.
    #[default]
    Proxy,
    /// Redirect to a short-lived presigned URL.
    Redirect,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// S3 endpoint URL (e.g., http://localhost:9000 for MinIO).
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Key prefix prepended to every object key.
    pub root_folder: String,
    pub download_mode: DownloadMode,
    pub presign_ttl_secs: u64,
    /// Per-operation timeout for object store calls.
    pub timeout_secs: u64,
}

impl StorageConfig {
    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PolicyConfig {
    /// Static credentials, `user:pass[,user:pass...]`.
    pub credentials: String,
    /// Legacy single credential; appended to `credentials` when both are set.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Comma separated task ID substrings that are never public.
    pub restricted_task_substrings: String,
    /// URL of the production node table.
    pub node_table_url: String,
    pub refresh_interval_secs: u64,
    pub retry_interval_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl PolicyConfig {
    pub fn restricted_task_substrings(&self) -> Vec<String> {
        self.restricted_task_substrings
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
