//! Configuration file loading.
//!
//! The config is a TOML document with two array-of-tables lists,
//! `[[obs_connections]]` and `[[blackmagic_connections]]`. Either list may
//! be missing or empty; a panel with zero configured devices is valid.
//! Failing to read or parse the file is the one fatal startup error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default obs-websocket port.
pub const DEFAULT_OBS_PORT: u16 = 4455;

/// Default port of the BlackMagic HTTP control API.
pub const DEFAULT_BLACKMAGIC_PORT: u16 = 80;

/// Static identity of one configured device. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Display name shown in the panel.
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    /// Port override; kind-specific default applies when absent.
    #[serde(default)]
    pub port: Option<u16>,
    /// obs-websocket password, when the instance requires auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Port to use when this entry describes an OBS instance.
    pub fn obs_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_OBS_PORT)
    }

    /// Port to use when this entry describes a BlackMagic device.
    pub fn blackmagic_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_BLACKMAGIC_PORT)
    }
}

/// Parsed configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub obs_connections: Vec<ConnectionConfig>,
    #[serde(default)]
    pub blackmagic_connections: Vec<ConnectionConfig>,
}

impl Config {
    /// Load and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Total number of configured connections of both kinds.
    pub fn total_connections(&self) -> usize {
        self.obs_connections.len() + self.blackmagic_connections.len()
    }
}
