// Server configuration loaded from YAML

use crate::models::SeedTodo;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "TODOSTORE_CONFIG";
pub const DEFAULT_BIND: &str = "127.0.0.1:4000";

/// Effective server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP and WebSocket server listens on
    pub bind: String,
    /// Todos inserted into the store at startup
    pub seed: Vec<SeedTodo>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            seed: vec![
                SeedTodo::new("Finish T2", false),
                SeedTodo::new("Beat US women soccer team", true),
            ],
        }
    }
}

impl Config {
    /// Load from `path`, else from the default location if a file exists there,
    /// else fall back to built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match resolve_path(path) {
            Some(path) => Self::from_file(&path),
            None => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "Loading config");
        let content = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content).wrap_err_with(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}

/// `<config dir>/todostore/config.yaml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("todostore").join("config.yaml"))
}

fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_path().filter(|p| p.exists()),
    }
}
