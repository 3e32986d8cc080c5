//! Global defaults loaded from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for corpusline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub workers: WorkersConfig,
    pub debug: DebugDefaults,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Used when neither the CLI nor run.toml names a worker count
    pub default: Option<usize>,
    /// Upper bound applied to every resolved worker count
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            default: None,
            max: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DebugDefaults {
    pub sample_size: usize,
}

impl Default for DebugDefaults {
    fn default() -> Self {
        Self { sample_size: 100 }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./corpusline.toml (current directory)
    /// 2. ~/.config/corpusline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("corpusline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "corpusline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        if config.workers.max == 0 {
            anyhow::bail!("workers.max must be at least 1 in {}", path.display());
        }

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
