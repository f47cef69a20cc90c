//! Wire protocol shared by surfaces, the host, and the relay.
//!
//! Every frame is a JSON object discriminated by its `type` field:
//! - **call**: `{ id, type: "call", namespace, method, args }`. `id` is `null`
//!   for fire-and-forget sends.
//! - **reply**: `{ id, type: "reply", result? | error? }`, used when the host
//!   has no direct reply channel and pairs replies by correlation id.
//! - **event**: `{ id: null, type: "event", event, data }`, pushed by the host.
//!
//! Inter-surface messages travel as [`BrokerEnvelope`]s and are delivered to
//! recipients as `"message"` events carrying `{ from, payload }`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::BridgeError;

/// Reserved logical name of the primary surface.
pub const MAIN_SURFACE: &str = "main";

/// Namespace/method pair that carries the effective chrome state.
pub const CHROME_NAMESPACE: &str = "chrome";
pub const CHROME_SYNC_METHOD: &str = "setState";

/// Namespace for host-mediated broker traffic. The method is the broker kind.
pub const BROKER_NAMESPACE: &str = "broker";

/// Event type under which inter-surface messages are delivered.
pub const MESSAGE_EVENT: &str = "message";
pub const SURFACE_ATTACHED_EVENT: &str = "surfaceAttached";
pub const SURFACE_DETACHED_EVENT: &str = "surfaceDetached";

/// Keeps an explicit `null` distinct from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// One frame of the surface <-> host protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    Call {
        id: Option<String>,
        namespace: String,
        method: String,
        #[serde(default)]
        args: Value,
    },
    Reply {
        id: String,
        #[serde(
            default,
            deserialize_with = "present",
            skip_serializing_if = "Option::is_none"
        )]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Event {
        #[serde(default)]
        id: Option<String>,
        event: String,
        #[serde(default)]
        data: Value,
    },
}

impl Envelope {
    pub fn call(
        id: Option<String>,
        namespace: impl Into<String>,
        method: impl Into<String>,
        args: Value,
    ) -> Self {
        Self::Call {
            id,
            namespace: namespace.into(),
            method: method.into(),
            args,
        }
    }

    pub fn event(event: impl Into<String>, data: Value) -> Self {
        Self::Event {
            id: None,
            event: event.into(),
            data,
        }
    }

    pub fn reply(id: impl Into<String>, outcome: Result<Value, String>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(message) => (None, Some(message)),
        };
        Self::Reply {
            id: id.into(),
            result,
            error,
        }
    }

    /// Parse a raw frame. Anything that is not one of the three frame kinds
    /// is a [`BridgeError::MalformedMessage`].
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(raw).map_err(|e| BridgeError::MalformedMessage(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Reply delivered through a host's direct reply channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok(value: Value) -> Self {
        Self {
            result: Some(value),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }

    /// An `error` field wins over `result`; a reply with neither is malformed
    /// and surfaces as a generic remote error.
    pub fn into_result(self) -> Result<Value, BridgeError> {
        match (self.result, self.error) {
            (_, Some(message)) => Err(BridgeError::Remote(message)),
            (Some(value), None) => Ok(value),
            (None, None) => Err(BridgeError::Remote("malformed reply from host".into())),
        }
    }
}

/// Kind of an inter-surface broker envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrokerKind {
    PostToParent,
    PostToChild,
    Broadcast,
    Register,
}

impl BrokerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerKind::PostToParent => "postToParent",
            BrokerKind::PostToChild => "postToChild",
            BrokerKind::Broadcast => "broadcast",
            BrokerKind::Register => "register",
        }
    }

    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "postToParent" => Some(BrokerKind::PostToParent),
            "postToChild" => Some(BrokerKind::PostToChild),
            "broadcast" => Some(BrokerKind::Broadcast),
            "register" => Some(BrokerKind::Register),
            _ => None,
        }
    }
}

/// Where a broker envelope should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Surface(String),
    AllExcept(String),
    Nowhere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerEnvelope {
    #[serde(rename = "type")]
    pub kind: BrokerKind,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl BrokerEnvelope {
    pub fn new(kind: BrokerKind, from: impl Into<String>, payload: Value) -> Self {
        Self {
            kind,
            from: from.into(),
            to: None,
            payload,
        }
    }

    pub fn to_child(from: impl Into<String>, to: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: BrokerKind::PostToChild,
            from: from.into(),
            to: Some(to.into()),
            payload,
        }
    }

    /// Resolve the logical destination. The primary surface has no parent and
    /// a surface never messages itself.
    pub fn route(&self) -> Route {
        match self.kind {
            BrokerKind::PostToParent if self.from == MAIN_SURFACE => Route::Nowhere,
            BrokerKind::PostToParent => Route::Surface(MAIN_SURFACE.to_string()),
            BrokerKind::PostToChild => match &self.to {
                Some(to) if !to.is_empty() && *to != self.from => Route::Surface(to.clone()),
                _ => Route::Nowhere,
            },
            BrokerKind::Broadcast => Route::AllExcept(self.from.clone()),
            BrokerKind::Register => Route::Nowhere,
        }
    }

    /// The pushed event a recipient receives for this envelope.
    pub fn to_message_event(&self) -> Envelope {
        Envelope::event(
            MESSAGE_EVENT,
            serde_json::json!({ "from": self.from, "payload": self.payload }),
        )
    }
}

/// Data of a `"message"` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDelivery {
    pub from: String,
    #[serde(default)]
    pub payload: Value,
}

/// Control frames the relay sends outside the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayResponse {
    Registered { session: String, name: String },
    Error { message: String },
}
