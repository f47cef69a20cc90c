//! Core TOML config loading: read from path or platform default.

use crate::schema::CanopyConfig;
use crate::validation;
use canopy_common::ConfigError;
use std::path::Path;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Parse config from TOML text and validate it.
pub fn load_from_str(content: &str) -> Result<CanopyConfig, ConfigError> {
    let config: CanopyConfig = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from a specific TOML file path.
///
/// Missing fields take their serde defaults. Unlike parse errors, a config
/// that fails validation is rejected: a bad relay URL or surface name would
/// only surface later as silently dropped messages.
pub fn load_from_path(path: &Path) -> Result<CanopyConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config = load_from_str(&content).inspect_err(|e| {
        warn!(path = %path.display(), error = %e, "rejected config");
    })?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from `$CANOPY_CONFIG` or the platform default path.
///
/// On macOS: `~/Library/Application Support/canopy/config.toml`
/// On Linux: `~/.config/canopy/config.toml`
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<CanopyConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(CanopyConfig::default())
        }
        Err(e) => Err(e),
    }
}
