//! `sd_config` - Configuration parsing and validation for Shop Desk
//!
//! This crate provides:
//! - TOML configuration parsing
//! - Default value handling
//! - Environment variable overrides
//! - Path expansion (`~/` to home directory)
//! - Auto-discovery from standard config paths

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShopConfig {
    /// Global settings
    pub global: GlobalConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Path to the `DuckDB` database file
    pub db_path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: "info".to_string(),
        }
    }
}

/// Default database path, relative to the working directory.
fn default_db_path() -> PathBuf {
    PathBuf::from("shopdesk.duckdb")
}

/// Expand tilde in path to home directory
#[must_use]
pub fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if let Some(stripped) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if path_str == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    path.to_path_buf()
}

impl GlobalConfig {
    /// Expand all paths in `GlobalConfig`
    pub fn expand_paths(&mut self) {
        self.db_path = expand_path(&self.db_path);
    }
}

impl ShopConfig {
    /// Standard config file paths, in order of precedence
    #[must_use]
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            // 1. Current directory (project-local)
            PathBuf::from("shopdesk.toml"),
        ];

        // 2. User config directory (~/.config/shopdesk/shopdesk.toml)
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("shopdesk").join("shopdesk.toml"));
        }

        // 3. System config
        paths.push(PathBuf::from("/etc/shopdesk/shopdesk.toml"));

        paths
    }

    /// Discover and load configuration from standard paths.
    ///
    /// Returns defaults if no config file is found.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if a discovered config file cannot be loaded.
    pub fn discover() -> Result<Self, ConfigError> {
        for path in Self::config_paths() {
            if path.exists() {
                info!(path = %path.display(), "Loading config from");
                return Self::load(&path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Discover config and apply environment variable overrides.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if config discovery or validation fails.
    pub fn discover_with_env() -> Result<Self, ConfigError> {
        let mut config = Self::discover()?;
        config.apply_env_overrides();
        config.expand_all_paths();
        Ok(config)
    }

    /// Load configuration from a specific TOML file.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: ShopConfig = toml::from_str(&content)?;
        config.expand_all_paths();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or validated.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Expand all paths in configuration (resolve `~/` to home directory)
    pub fn expand_all_paths(&mut self) {
        self.global.expand_paths();
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SHOPDESK_DB_PATH") {
            self.global.db_path = expand_path(&PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("SHOPDESK_LOG_LEVEL") {
            self.global.log_level = val;
        }
    }

    /// Validate configuration.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when validation rules are violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.global.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.global.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.global.db_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "db_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
