//! Server configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address of the framed TCP front end.
    pub tcp_address: String,

    /// Address of the HTTP / WebSocket front end.
    pub http_address: String,

    /// Directory served at `/` by the HTTP front end, if any.
    pub static_dir: Option<PathBuf>,

    /// Requests that may queue up in front of the registry task.
    pub channel_capacity: usize,

    /// Largest accepted TCP frame, in bytes.
    pub max_frame_len: usize,

    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tcp_address: "0.0.0.0:8080".to_string(),
            http_address: "0.0.0.0:3000".to_string(),
            static_dir: None,
            channel_capacity: 1024,
            max_frame_len: 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("invalid configuration")?;
        config.check()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn check(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            anyhow::bail!("channel_capacity must be at least 1");
        }
        if self.max_frame_len == 0 {
            anyhow::bail!("max_frame_len must be at least 1");
        }
        Ok(())
    }
}
