//! TOML configuration.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below. Command-line `--host`/`--port` override `[server]`.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [viewer]
//! default_page_size = 10
//! preview_chars = 200
//! embedding_preview_dims = 8
//!
//! [db]
//! max_connections = 4
//! acquire_timeout_secs = 10
//! ```

use anyhow::{Context, Result};
use chroma_viewer_core::models::PreviewOptions;
use chroma_viewer_core::pagination::{PageSize, ALLOWED_PAGE_SIZES};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub db: DbConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewerConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    #[serde(default = "default_embedding_preview_dims")]
    pub embedding_preview_dims: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            preview_chars: default_preview_chars(),
            embedding_preview_dims: default_embedding_preview_dims(),
        }
    }
}

fn default_page_size() -> u32 {
    PageSize::default().get()
}
fn default_preview_chars() -> usize {
    200
}
fn default_embedding_preview_dims() -> usize {
    8
}

impl ViewerConfig {
    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            text_chars: self.preview_chars,
            embedding_values: self.embedding_preview_dims,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

fn default_max_connections() -> u32 {
    4
}
fn default_acquire_timeout_secs() -> u64 {
    10
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !ALLOWED_PAGE_SIZES.contains(&config.viewer.default_page_size) {
        anyhow::bail!(
            "viewer.default_page_size must be one of {:?} (got {})",
            ALLOWED_PAGE_SIZES,
            config.viewer.default_page_size
        );
    }

    if config.viewer.preview_chars == 0 {
        anyhow::bail!("viewer.preview_chars must be > 0");
    }

    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }

    if config.server.host.trim().is_empty() {
        anyhow::bail!("server.host must not be empty");
    }

    Ok(())
}
