//! Configuration schema types for Canopy.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with defaults that run a single primary
//! surface with host-mediated messaging.

mod bridge;
mod relay;
mod surface;
mod system;

pub use bridge::*;
pub use relay::*;
pub use surface::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration shared by surfaces, hosts, and the relay server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanopyConfig {
    pub surface: SurfaceConfig,
    pub bridge: BridgeConfig,
    pub relay: RelayConfig,
    pub relay_server: RelayServerConfig,
    pub logging: LoggingConfig,
}
