//! Canopy configuration system.
//!
//! Provides TOML-based configuration for surfaces, hosts, and the relay
//! server. All config sections use defaults so partial configs work out of
//! the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use canopy_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    BridgeConfig, CanopyConfig, LogLevel, LoggingConfig, RelayConfig, RelayServerConfig,
    SchedulerKind, SurfaceConfig, CONFIG_SCHEMA_VERSION,
};
pub use toml_loader::{load_from_path, load_from_str};

use canopy_common::ConfigError;

/// Convenience function to load config from the default path.
pub fn load_config() -> Result<CanopyConfig, ConfigError> {
    toml_loader::load_default()
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &CanopyConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
