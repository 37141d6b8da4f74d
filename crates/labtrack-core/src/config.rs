//! Configuration management for Labtrack services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`LABTRACK_` prefix, `__` between nested keys,
//!    e.g. `LABTRACK_STORE__ENDPOINT`)
//! 2. Config file (`labtrack.toml`, optional)
//! 3. Defaults

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::LabtrackError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabtrackConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub split: SplitConfig,
}

impl LabtrackConfig {
    /// Load configuration from `{file_prefix}.toml` (if present) and the environment.
    pub fn load(file_prefix: &str) -> Result<Self, LabtrackError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("LABTRACK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded = Self {
            store: section(&cfg, "store")?,
            server: section(&cfg, "server")?,
            split: section(&cfg, "split")?,
        };

        tracing::debug!(
            file_prefix,
            endpoint = %loaded.store.endpoint,
            backend = ?loaded.store.backend,
            "Configuration loaded"
        );
        Ok(loaded)
    }
}

/// Read a section, falling back to defaults only when it is absent.
fn section<T: DeserializeOwned + Default>(
    cfg: &config::Config,
    key: &str,
) -> Result<T, LabtrackError> {
    match cfg.get::<T>(key) {
        Ok(v) => Ok(v),
        Err(config::ConfigError::NotFound(_)) => Ok(T::default()),
        Err(e) => Err(LabtrackError::Config(format!("[{key}]: {e}"))),
    }
}

/// Which store the entity repository runs on.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Neo4j,
    /// Process-local adjacency maps. Nothing survives a restart.
    Memory,
}

/// Connection settings for the graph store.
///
/// Passed explicitly to the repository at construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Connection target, e.g. `bolt://127.0.0.1:7687`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Auth material for the store.
    #[serde(default)]
    pub credentials: Credentials,

    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            credentials: Credentials::default(),
            backend: StoreBackend::default(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

/// User and password for the store. The password never appears in `Debug` output.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            user: default_user(),
            password: default_password(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Limits applied to split requests.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitConfig {
    /// Largest accepted `target_count`.
    #[serde(default = "default_max_target_count")]
    pub max_target_count: u32,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_target_count: default_max_target_count(),
        }
    }
}

fn default_endpoint() -> String {
    "bolt://127.0.0.1:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_target_count() -> u32 {
    1000
}
