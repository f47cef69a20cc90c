//! Per-connection handler: register, then route broker envelopes.

use std::net::SocketAddr;
use std::time::Duration;

use canopy_common::{
    new_id, BrokerEnvelope, BrokerKind, RelayResponse, Route, SURFACE_ATTACHED_EVENT,
    SURFACE_DETACHED_EVENT,
};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::protocol::{error_frame, parse_hello, peer_event, response_frame, Hello};
use crate::session::SessionStore;
use crate::RelaySettings;

type Socket = WebSocketStream<TcpStream>;

/// Handle a single WebSocket connection.
pub async fn handle_connection(
    ws: Socket,
    addr: SocketAddr,
    store: SessionStore,
    settings: RelaySettings,
) {
    let (mut sink, mut stream) = ws.split();

    // 1. The first frame registers the surface.
    let Hello { session, name } = match read_hello(&mut stream, addr, settings.hello_timeout).await
    {
        Ok(hello) => hello,
        Err(Some(message)) => {
            let _ = sink.send(Message::Text(error_frame(message).into())).await;
            return;
        }
        Err(None) => return,
    };

    // 2. Create our receive channel and register.
    let conn_id = new_id();
    let (tx, mut rx) = mpsc::channel::<String>(settings.channel_capacity);
    let replaced = store.register(&session, &name, &conn_id, tx).await;

    tracing::info!(
        peer = %addr,
        session = %session,
        surface = %name,
        replaced,
        "Surface registered"
    );

    // 3. Acknowledge.
    let ack = response_frame(&RelayResponse::Registered {
        session: session.clone(),
        name: name.clone(),
    });
    if sink.send(Message::Text(ack.into())).await.is_err() {
        store.unregister(&session, &name, &conn_id).await;
        return;
    }

    // 4. Tell the rest of the session.
    notify_peers(&store, &session, &name, SURFACE_ATTACHED_EVENT).await;

    // 5. Forwarding loop.
    loop {
        tokio::select! {
            // Deliveries for this surface → its WebSocket
            msg = rx.recv() => match msg {
                Some(msg) => {
                    if sink.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                // Our sender left the store: a newer connection took the name.
                None => {
                    tracing::debug!(session = %session, surface = %name, "Connection superseded");
                    let _ = sink.close().await;
                    break;
                }
            },

            // Envelopes from this surface → route to peers
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(message) = route_frame(&store, &session, &name, &text).await {
                            tracing::debug!(surface = %name, error = %message, "Frame rejected");
                            if sink.send(Message::Text(error_frame(message).into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // 6. Cleanup. A superseded connection must not remove its replacement.
    tracing::info!(peer = %addr, session = %session, surface = %name, "Surface disconnected");
    if store.unregister(&session, &name, &conn_id).await {
        notify_peers(&store, &session, &name, SURFACE_DETACHED_EVENT).await;
    }
}

/// Route one envelope from `name` to its recipients as a `"message"` event.
async fn route_frame(
    store: &SessionStore,
    session: &str,
    name: &str,
    text: &str,
) -> Result<(), String> {
    let mut envelope: BrokerEnvelope =
        serde_json::from_str(text).map_err(|e| format!("invalid broker envelope: {e}"))?;
    if envelope.kind == BrokerKind::Register {
        return Err("already registered".into());
    }
    // The registered name is authoritative.
    envelope.from = name.to_string();

    let targets = store.targets(session, &envelope.route()).await;
    if targets.is_empty() {
        tracing::debug!(
            session,
            surface = name,
            kind = envelope.kind.as_str(),
            "No recipient for envelope"
        );
        return Ok(());
    }

    let frame = envelope
        .to_message_event()
        .to_json()
        .map_err(|e| e.to_string())?;
    deliver(&targets, &frame, session);
    Ok(())
}

/// Queue `frame` for every target without waiting. A recipient whose queue
/// is full misses the frame; the sender's loop never stalls on it.
fn deliver(targets: &[mpsc::Sender<String>], frame: &str, session: &str) -> usize {
    let mut delivered = 0;
    for target in targets {
        match target.try_send(frame.to_string()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(session, "Recipient queue full, frame dropped");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(session, "Recipient channel closed");
            }
        }
    }
    delivered
}

async fn notify_peers(store: &SessionStore, session: &str, name: &str, event: &str) {
    let route = Route::AllExcept(name.to_string());
    let frame = peer_event(event, name);
    deliver(&store.targets(session, &route).await, &frame, session);
}

/// Read and parse the first frame. `Err(Some(_))` carries a message worth
/// sending back before closing.
async fn read_hello(
    stream: &mut SplitStream<Socket>,
    addr: SocketAddr,
    timeout: Duration,
) -> Result<Hello, Option<String>> {
    let frame = tokio::time::timeout(timeout, stream.next()).await;

    match frame {
        Ok(Some(Ok(Message::Text(text)))) => parse_hello(&text).map_err(|e| {
            tracing::warn!(peer = %addr, error = %e, "Invalid register frame");
            Some(e)
        }),
        Ok(Some(Ok(_))) => {
            tracing::warn!(peer = %addr, "Expected text register frame");
            Err(Some("expected a text register frame".into()))
        }
        Ok(Some(Err(e))) => {
            tracing::warn!(peer = %addr, error = %e, "WS error during register");
            Err(None)
        }
        Ok(None) => {
            tracing::debug!(peer = %addr, "Connection closed before register");
            Err(None)
        }
        Err(_) => {
            tracing::warn!(peer = %addr, timeout_secs = timeout.as_secs(), "Register timeout");
            Err(Some("register timeout".into()))
        }
    }
}
