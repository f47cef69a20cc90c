//! canopy-relay: WebSocket relay routing messages between the surfaces of
//! one host application.
//!
//! Each connection registers a surface name within a session, then sends
//! broker envelopes (`postToParent`, `postToChild`, `broadcast`). The relay
//! delivers them to the addressed surfaces of the same session as pushed
//! `"message"` events, and announces surfaces joining and leaving.

mod connection;
pub mod protocol;
pub mod session;

use std::time::Duration;

use canopy_config::RelayServerConfig;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::connection::handle_connection;
pub use crate::session::SessionStore;

/// Per-connection limits.
#[derive(Debug, Clone, Copy)]
pub struct RelaySettings {
    /// How long a new connection has to send its register frame.
    pub hello_timeout: Duration,
    /// Buffered deliveries per surface.
    pub channel_capacity: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self::from(&RelayServerConfig::default())
    }
}

impl From<&RelayServerConfig> for RelaySettings {
    fn from(config: &RelayServerConfig) -> Self {
        Self {
            hello_timeout: Duration::from_secs(config.hello_timeout_secs),
            channel_capacity: config.channel_capacity.max(1),
        }
    }
}

/// Accept connections on `listener` forever.
pub async fn serve(listener: TcpListener, store: SessionStore, settings: RelaySettings) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let store = store.clone();
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, store, settings).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}
