use serde::{Deserialize, Serialize};

/// Client-side relay settings used by every surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Whether surfaces should try the relay before host-mediated routing.
    pub enabled: bool,
    /// WebSocket URL of the relay server.
    pub url: String,
    /// Session shared by all surfaces of one application instance.
    pub session: String,
    /// Connect + register handshake timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "ws://127.0.0.1:7878".into(),
            session: "default".into(),
            connect_timeout_ms: 2000,
        }
    }
}

/// Settings for the `canopy-relay` server binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds a new connection has to send its `register` frame.
    pub hello_timeout_secs: u64,
    /// Outbound queue depth per connected surface.
    pub channel_capacity: usize,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7878,
            hello_timeout_secs: 10,
            channel_capacity: 256,
        }
    }
}

impl RelayServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
