//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Canopy Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[surface]
# Set by the host for child surfaces; the primary surface is "main".
# name = "settings"

[bridge]
# scheduler = "microtask"      # microtask, local_task
# pending_call_warning = 256   # 0 disables

[relay]
# enabled = false
# url = "ws://127.0.0.1:7878"
# session = "default"
# connect_timeout_ms = 2000    # 50-60000

[relay_server]
# host = "127.0.0.1"
# port = 7878
# hello_timeout_secs = 10      # 1-300
# channel_capacity = 256       # 1-65536

[logging]
# level = "info"               # trace, debug, info, warn, error
# directives = ["canopy_bridge=debug"]
"##
    .to_string()
}
