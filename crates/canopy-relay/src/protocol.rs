//! Relay-level framing. The first frame registers the surface; after that
//! every frame is a broker envelope from that surface.

use canopy_common::{BrokerEnvelope, BrokerKind, Envelope, RelayResponse, DEFAULT_SESSION};
use serde_json::json;

/// Parsed registration frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hello {
    pub session: String,
    pub name: String,
}

/// Parse the first frame of a connection. It must be a `register` envelope
/// whose `from` names the surface; the session defaults to `"default"`.
pub fn parse_hello(text: &str) -> Result<Hello, String> {
    let envelope: BrokerEnvelope =
        serde_json::from_str(text).map_err(|e| format!("invalid register frame: {e}"))?;
    if envelope.kind != BrokerKind::Register {
        return Err(format!(
            "expected register, got {}",
            envelope.kind.as_str()
        ));
    }
    let name = envelope.from.trim();
    if name.is_empty() {
        return Err("register frame has no surface name".into());
    }
    let session = envelope
        .payload
        .get("session")
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION);

    Ok(Hello {
        session: session.to_string(),
        name: name.to_string(),
    })
}

pub fn response_frame(response: &RelayResponse) -> String {
    // A RelayResponse holds only strings; serialization cannot fail.
    serde_json::to_string(response).unwrap_or_default()
}

pub fn error_frame(message: impl Into<String>) -> String {
    response_frame(&RelayResponse::Error {
        message: message.into(),
    })
}

/// Pushed event telling peers that `name` joined or left.
pub fn peer_event(event: &str, name: &str) -> String {
    Envelope::event(event, json!({ "name": name }))
        .to_json()
        .unwrap_or_default()
}
