use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::util::SecretString;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Settings for the public plugin directory that `extract` and `bulk` page through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_directory_url")]
    pub base_url: String,

    /// Records requested per page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Upper bound on the offset `bulk` will request (default: 12500)
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Pause between page requests in milliseconds (default: 500)
    #[serde(default = "default_directory_delay_ms")]
    pub delay_ms: u64,

    /// Pause between pages during `bulk`, which also waits on an import
    /// per page (default: 1000)
    #[serde(default = "default_bulk_delay_ms")]
    pub bulk_delay_ms: u64,

    #[serde(default = "default_directory_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Referer/Origin sent with every request. The directory rejects
    /// requests that do not look like they came from its own site.
    #[serde(default = "default_site")]
    pub site: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_url(),
            page_size: default_page_size(),
            max_records: default_max_records(),
            delay_ms: default_directory_delay_ms(),
            bulk_delay_ms: default_bulk_delay_ms(),
            timeout_secs: default_directory_timeout(),
            user_agent: default_user_agent(),
            site: default_site(),
        }
    }
}

impl DirectoryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn bulk_delay(&self) -> Duration {
        Duration::from_millis(self.bulk_delay_ms)
    }
}

/// Settings for the admin import/export API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_local_url")]
    pub local_url: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Token used when neither the CLI nor the environment provides one
    #[serde(default = "default_token")]
    pub default_token: String,

    /// Records per import request (default: 500)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pause between import requests in milliseconds (default: 500)
    #[serde(default = "default_admin_delay_ms")]
    pub delay_ms: u64,

    /// Pause between chunks during `sync` in milliseconds (default: 200)
    #[serde(default = "default_sync_delay_ms")]
    pub sync_delay_ms: u64,

    #[serde(default = "default_admin_timeout")]
    pub timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            local_url: default_local_url(),
            token_env: default_token_env(),
            default_token: default_token(),
            chunk_size: default_chunk_size(),
            delay_ms: default_admin_delay_ms(),
            sync_delay_ms: default_sync_delay_ms(),
            timeout_secs: default_admin_timeout(),
        }
    }
}

impl AdminConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn sync_delay(&self) -> Duration {
        Duration::from_millis(self.sync_delay_ms)
    }

    /// Resolve the admin token: explicit value, then the configured
    /// environment variable, then the built-in default.
    pub fn resolve_token(&self, explicit: Option<String>) -> SecretString {
        if let Some(token) = explicit.filter(|t| !t.is_empty()) {
            debug!("Using admin token from command line");
            return token.into();
        }
        match env::var(&self.token_env) {
            Ok(token) if !token.is_empty() => {
                debug!("Using admin token from ${}", self.token_env);
                token.into()
            }
            _ => {
                debug!("Using default admin token");
                self.default_token.clone().into()
            }
        }
    }
}

fn default_directory_url() -> String {
    "https://claude-plugins.dev/api/plugins".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_max_records() -> usize {
    12500
}

fn default_directory_delay_ms() -> u64 {
    500
}

fn default_bulk_delay_ms() -> u64 {
    1000
}

fn default_directory_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_site() -> String {
    "https://claude-plugins.dev".to_string()
}

fn default_local_url() -> String {
    "http://localhost:8787".to_string()
}

fn default_token_env() -> String {
    "RALPHY_ADMIN_TOKEN".to_string()
}

fn default_token() -> String {
    "ralphy-default-admin-token".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_admin_delay_ms() -> u64 {
    500
}

fn default_sync_delay_ms() -> u64 {
    200
}

fn default_admin_timeout() -> u64 {
    120
}

impl Config {
    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        // An explicit path must exist and parse
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path)
                .with_context(|| format!("failed to load config from {}", config_path));
        }

        if let Ok(config) = Self::load_from_path("skillsync.toml") {
            debug!("Loaded config from ./skillsync.toml");
            return Ok(config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("skillsync").join("config.toml");
            if let Ok(config) = Self::load_from_path(&config_path) {
                debug!("Loaded config from {:?}", config_path);
                return Ok(config);
            }
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
