//! Client side of the shared relay.
//!
//! [`RelayConnection::connect`] registers the surface with the relay and
//! spawns a forwarding task. Outbound broker envelopes go through the
//! returned connection; inbound frames (pushed `"message"` events and peer
//! notifications) arrive on the returned receiver and are fed to
//! `BridgeSession::receive` by the embedder.

use std::time::Duration;

use canopy_common::{BridgeError, BrokerEnvelope, BrokerKind, RelayResponse, SessionId};
use canopy_config::RelayConfig;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::broker::RelayLink;
use crate::identity::SurfaceIdentity;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle to a registered relay connection. Dropping every clone closes
/// the socket.
#[derive(Debug, Clone)]
pub struct RelayConnection {
    outbound: mpsc::UnboundedSender<String>,
    session: SessionId,
}

impl RelayConnection {
    /// Connect, register `identity` under `session` and start forwarding.
    pub async fn connect(
        url: &str,
        session: SessionId,
        identity: &SurfaceIdentity,
        timeout: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<String>), BridgeError> {
        info!(url, session = %session, surface = %identity, "connecting to relay");

        let (ws, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| BridgeError::Relay(format!("connect to {url} timed out")))?
            .map_err(|e| BridgeError::Relay(format!("connect failed: {e}")))?;
        let (mut sink, mut stream) = ws.split();

        let hello = BrokerEnvelope::new(
            BrokerKind::Register,
            identity.name(),
            serde_json::json!({ "session": session.as_str() }),
        );
        sink.send(Message::Text(serde_json::to_string(&hello)?.into()))
            .await
            .map_err(|e| BridgeError::Relay(format!("register failed: {e}")))?;

        match read_relay_response(&mut stream, timeout).await {
            Some(RelayResponse::Registered { session, name }) => {
                info!(session = %session, surface = %name, "registered with relay");
            }
            Some(RelayResponse::Error { message }) => return Err(BridgeError::Relay(message)),
            None => {
                return Err(BridgeError::Relay(
                    "no registration response from relay".into(),
                ))
            }
        }

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        tokio::spawn(forward(sink, stream, outbound_rx, inbound_tx));

        Ok((Self { outbound, session }, inbound))
    }

    /// Connect using the `[relay]` config section. `Ok(None)` when the relay
    /// is disabled.
    pub async fn from_config(
        config: &RelayConfig,
        identity: &SurfaceIdentity,
    ) -> Result<Option<(Self, mpsc::UnboundedReceiver<String>)>, BridgeError> {
        if !config.enabled {
            debug!("relay disabled in config");
            return Ok(None);
        }
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let session = SessionId::from(config.session.as_str());
        Self::connect(&config.url, session, identity, timeout)
            .await
            .map(Some)
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }
}

impl RelayLink for RelayConnection {
    fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    fn send(&self, frame: String) -> Result<(), BridgeError> {
        self.outbound
            .send(frame)
            .map_err(|_| BridgeError::RelayClosed)
    }
}

/// Pump frames both ways until either side goes away.
async fn forward(
    mut sink: SplitSink<Socket, Message>,
    mut stream: SplitStream<Socket>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<String>,
) {
    let reason = loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        break "send failed".to_string();
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break "closed locally".to_string();
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(control) = serde_json::from_str::<RelayResponse>(&text) {
                        match control {
                            RelayResponse::Error { message } => {
                                warn!(error = %message, "relay reported an error");
                            }
                            RelayResponse::Registered { .. } => {
                                debug!("duplicate registration ack ignored");
                            }
                        }
                        continue;
                    }
                    if inbound.send(text.to_string()).is_err() {
                        let _ = sink.close().await;
                        break "receiver dropped".to_string();
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => break "relay closed connection".to_string(),
                Some(Err(e)) => break format!("ws error: {e}"),
                _ => {}
            },
        }
    };
    info!(reason = %reason, "relay connection ended");
}

/// Read one text frame within `timeout` and parse it as a control response.
async fn read_relay_response(
    stream: &mut SplitStream<Socket>,
    timeout: Duration,
) -> Option<RelayResponse> {
    match tokio::time::timeout(timeout, stream.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => serde_json::from_str(&text).ok(),
        _ => None,
    }
}
