pub mod errors;
pub mod id;
pub mod protocol;

pub use errors::{BridgeError, CanopyError, ConfigError, HostError};
pub use id::{new_id, SessionId, DEFAULT_SESSION};
pub use protocol::{
    BrokerEnvelope, BrokerKind, Envelope, MessageDelivery, RelayResponse, Reply, Route,
    BROKER_NAMESPACE, CHROME_NAMESPACE, CHROME_SYNC_METHOD, MAIN_SURFACE, MESSAGE_EVENT,
    SURFACE_ATTACHED_EVENT, SURFACE_DETACHED_EVENT,
};

pub type Result<T> = std::result::Result<T, CanopyError>;
