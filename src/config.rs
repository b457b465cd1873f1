use crate::access::is_token_safe;
use crate::store::StorageBackend;
use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure that can be loaded from CLI, config file, or environment
///
/// Example configuration file content
/// # Video Relay Configuration
///
/// # Server configuration
/// listen_on_port = 32145
/// bind_address = "0.0.0.0"
/// public_base_url = "https://videos.example.com"  # Optional
///
/// # Secrets (or SECRET_TOKEN / ADMIN_TOKEN in the environment)
/// secret_token = "change-me"
/// admin_token = "change-me-too"
///
/// # Storage configuration
/// storage_backend = "file"  # Options: "memory" or "file"
/// store_path = "./videos.json"
///
/// # Relay configuration
/// max_streams = 64                  # 0 = unbounded
/// origin_connect_timeout_secs = 10
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[serde(default)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, default_value_t = 32145)]
    #[serde(default = "default_port")]
    pub listen_on_port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Secret guarding link generation and playback
    #[arg(long, env = "SECRET_TOKEN", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub secret_token: Option<String>,

    /// Secret guarding the admin panel
    #[arg(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,

    /// Configuration file path (overrides all other arguments)
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Storage backend: memory or file
    #[arg(short, long, default_value = "file")]
    #[serde(default = "default_storage_backend")]
    pub storage_backend: String,

    /// JSON file holding the links (file backend only)
    #[arg(long, default_value = "videos.json")]
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Maximum number of concurrently relayed streams (0 = unbounded)
    #[arg(short, long, default_value_t = 64)]
    #[serde(default = "default_max_streams")]
    pub max_streams: usize,

    /// Timeout for connecting to the origin, in seconds
    #[arg(long, default_value_t = 10)]
    #[serde(default = "default_connect_timeout")]
    pub origin_connect_timeout_secs: u64,

    /// Base URL used in generated playback links (defaults to the request Host)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_on_port: default_port(),
            bind_address: default_bind_address(),
            secret_token: None,
            admin_token: None,
            config: None,
            storage_backend: default_storage_backend(),
            store_path: default_store_path(),
            max_streams: default_max_streams(),
            origin_connect_timeout_secs: default_connect_timeout(),
            public_base_url: None,
        }
    }
}

impl Config {
    /// Load configuration from CLI args, optionally merging with a config file
    pub fn load() -> Result<Self> {
        // First parse CLI args
        let mut config = Config::parse();

        // If a config file is specified, load it and merge
        if let Some(config_path) = &config.config {
            let file_config = Self::from_file(Path::new(config_path))?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge with file config, CLI args take precedence
    fn merge_with_file(mut self, file_config: Config) -> Self {
        // If CLI value is default, use file value
        if self.listen_on_port == default_port() {
            self.listen_on_port = file_config.listen_on_port;
        }
        if self.bind_address == default_bind_address() {
            self.bind_address = file_config.bind_address;
        }
        if self.storage_backend == default_storage_backend() {
            self.storage_backend = file_config.storage_backend;
        }
        if self.store_path == default_store_path() {
            self.store_path = file_config.store_path;
        }
        if self.max_streams == default_max_streams() {
            self.max_streams = file_config.max_streams;
        }
        if self.origin_connect_timeout_secs == default_connect_timeout() {
            self.origin_connect_timeout_secs = file_config.origin_connect_timeout_secs;
        }

        // For Option fields, CLI (and environment) takes precedence if Some
        if self.secret_token.is_none() {
            self.secret_token = file_config.secret_token;
        }
        if self.admin_token.is_none() {
            self.admin_token = file_config.admin_token;
        }
        if self.public_base_url.is_none() {
            self.public_base_url = file_config.public_base_url;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Secrets have no fallback value
        if self.secret_token.as_deref().is_none_or(str::is_empty) {
            return Err(anyhow::anyhow!(
                "Secret token is required (--secret-token or SECRET_TOKEN)"
            ));
        }
        if self.admin_token.as_deref().is_none_or(str::is_empty) {
            return Err(anyhow::anyhow!(
                "Admin token is required (--admin-token or ADMIN_TOKEN)"
            ));
        }
        // Secrets are sent back as cookie, header and query values
        for (name, secret) in [
            ("Secret token", &self.secret_token),
            ("Admin token", &self.admin_token),
        ] {
            if !secret.as_deref().is_some_and(is_token_safe) {
                return Err(anyhow::anyhow!(
                    "{name} may only contain printable ASCII without spaces, quotes, commas, semicolons or backslashes"
                ));
            }
        }

        match self.storage_backend.as_str() {
            "memory" => {}
            "file" => {
                if self.store_path.is_empty() {
                    return Err(anyhow::anyhow!(
                        "Store path is required when backend is 'file'"
                    ));
                }
            }
            backend => {
                return Err(anyhow::anyhow!(
                    "Unsupported storage backend: {}. Use 'memory' or 'file'",
                    backend
                ));
            }
        }

        if let Some(base) = &self.public_base_url
            && !base.starts_with("http://")
            && !base.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "Public base URL must start with http:// or https://"
            ));
        }

        Ok(())
    }

    pub fn to_storage_backend(&self) -> StorageBackend {
        match self.storage_backend.as_str() {
            "memory" => StorageBackend::Memory,
            _ => StorageBackend::File {
                path: PathBuf::from(&self.store_path),
            },
        }
    }

    pub fn origin_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.origin_connect_timeout_secs)
    }
}

// Default value functions
fn default_port() -> u16 {
    32145
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_storage_backend() -> String {
    "file".to_string()
}

fn default_store_path() -> String {
    "videos.json".to_string()
}

fn default_max_streams() -> usize {
    64
}

fn default_connect_timeout() -> u64 {
    10
}
