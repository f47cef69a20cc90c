//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all and
//! collects errors into a single `ConfigError`.

mod helpers;
mod relay;
mod surface;


use crate::schema::CanopyConfig;
use canopy_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &CanopyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    surface::validate_surface(&mut errors, config);
    relay::validate_relay(&mut errors, config);
    relay::validate_relay_server(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
