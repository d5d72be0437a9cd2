// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for msearch
//!
//! Loads configuration from .msearchrc.toml in current directory or ~/.config/msearch/config.toml

use serde::Deserialize;
use std::path::Path;

/// Module used when the command line does not name one
pub const DEFAULT_MODULE: &str = "files";

/// Directories skipped by every module unless configured otherwise
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[".git", ".svn"];

/// Configuration loaded from .msearchrc.toml or ~/.config/msearch/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Module selected when no module name is given
    pub default_module: Option<String>,
    /// Directory names never descended into
    pub ignored_dirs: Option<Vec<String>>,
    /// Force colored output on or off
    pub color: Option<bool>,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .msearchrc.toml in current directory
    /// 2. ~/.config/msearch/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(Path::new(".msearchrc.toml")) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("msearch").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!("loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn default_module(&self) -> &str {
        self.default_module.as_deref().unwrap_or(DEFAULT_MODULE)
    }

    pub fn ignored_dirs(&self) -> Vec<String> {
        match &self.ignored_dirs {
            Some(dirs) => dirs.clone(),
            None => DEFAULT_IGNORED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}
