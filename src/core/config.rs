//! Panel configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file) is valid. Command-line flags override file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

pub const DEFAULT_SOCKET: &str = "tinytosh-host.sock";

/// Which host implementation the panel talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostMode {
    /// Host process reached over a local socket
    #[default]
    Ipc,
    /// In-process simulated host
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub mode: HostMode,
    #[serde(default = "default_socket")]
    pub socket: String,
    /// Upper bound for a single host call in milliseconds
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Port/connection status cadence in milliseconds
    #[serde(default = "default_ports_interval_ms")]
    pub ports_interval_ms: u64,
    /// System stats cadence in milliseconds
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

fn default_socket() -> String {
    DEFAULT_SOCKET.to_string()
}

fn default_io_timeout_ms() -> u64 {
    1500
}

fn default_ports_interval_ms() -> u64 {
    2000
}

fn default_stats_interval_ms() -> u64 {
    1000
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            mode: HostMode::default(),
            socket: default_socket(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            ports_interval_ms: default_ports_interval_ms(),
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

impl PollingConfig {
    pub fn ports_interval(&self) -> Duration {
        Duration::from_millis(self.ports_interval_ms.max(1))
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms.max(1))
    }
}

impl HostConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms.max(1))
    }
}

impl PanelConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse panel configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
