use crate::schema::CanopyConfig;

use super::helpers::{validate_not_blank, validate_range};

/// Validate relay client settings. The URL only matters when enabled.
pub(crate) fn validate_relay(errors: &mut Vec<String>, config: &CanopyConfig) {
    let relay = &config.relay;
    if relay.enabled {
        validate_not_blank(errors, "relay.url", &relay.url);
        if !relay.url.starts_with("ws://") && !relay.url.starts_with("wss://") {
            errors.push(format!(
                "relay.url = {:?} must use the ws:// or wss:// scheme",
                relay.url
            ));
        }
    }
    validate_range(
        errors,
        "relay.connect_timeout_ms",
        relay.connect_timeout_ms,
        50,
        60_000,
    );
}

pub(crate) fn validate_relay_server(errors: &mut Vec<String>, config: &CanopyConfig) {
    let server = &config.relay_server;
    validate_not_blank(errors, "relay_server.host", &server.host);
    validate_range(
        errors,
        "relay_server.hello_timeout_secs",
        server.hello_timeout_secs,
        1,
        300,
    );
    validate_range(
        errors,
        "relay_server.channel_capacity",
        server.channel_capacity as u64,
        1,
        65_536,
    );
}
