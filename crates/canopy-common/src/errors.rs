use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Errors surfaced by the surface-side bridge.
///
/// Only `Remote` and `Cancelled` ever reach application code through a call
/// future; the rest are logged and dropped on fire-and-forget paths.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("no host attached")]
    TransportUnavailable,

    #[error("remote error: {0}")]
    Remote(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("unknown method: {namespace}.{method}")]
    UnknownMethod { namespace: String, method: String },

    #[error("call cancelled before a reply arrived")]
    Cancelled,

    #[error("relay connection closed")]
    RelayClosed,

    #[error("relay error: {0}")]
    Relay(String),

    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised on the host side while routing surface traffic.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("surface not found: {0}")]
    SurfaceNotFound(String),

    #[error("surface delivery failed: {0}")]
    Delivery(String),

    #[error("reconciler error: {0}")]
    Reconciler(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CanopyError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("relay.url must not be empty".into());
        assert_eq!(
            err.to_string(),
            "config validation error: relay.url must not be empty"
        );
    }

    #[test]
    fn bridge_error_display() {
        let err = BridgeError::Remote("denied".into());
        assert_eq!(err.to_string(), "remote error: denied");

        let err = BridgeError::UnknownMethod {
            namespace: "fs".into(),
            method: "read".into(),
        };
        assert_eq!(err.to_string(), "unknown method: fs.read");

        assert_eq!(
            BridgeError::TransportUnavailable.to_string(),
            "no host attached"
        );
        assert_eq!(BridgeError::RelayClosed.to_string(), "relay connection closed");
    }

    #[test]
    fn host_error_display() {
        let err = HostError::SurfaceNotFound("settings".into());
        assert_eq!(err.to_string(), "surface not found: settings");
    }

    #[test]
    fn canopy_error_from_bridge() {
        let err: CanopyError = BridgeError::Cancelled.into();
        assert!(matches!(err, CanopyError::Bridge(_)));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn canopy_error_from_config() {
        let err: CanopyError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, CanopyError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn canopy_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: CanopyError = io_err.into();
        assert!(matches!(err, CanopyError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn bridge_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: BridgeError = serde_err.into();
        assert!(matches!(err, BridgeError::Encode(_)));
    }
}
