//! canopy-relay: WebSocket relay for multi-surface messaging.

use std::path::PathBuf;

use canopy_config::{CanopyConfig, RelayServerConfig};
use clap::Parser;
use tokio::net::TcpListener;

use canopy_relay::{serve, RelaySettings, SessionStore};

#[derive(Parser)]
#[command(name = "canopy-relay", about = "WebSocket relay for canopy surfaces")]
struct Args {
    /// Port to listen on (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides the config file).
    #[arg(long)]
    host: Option<String>,

    /// Config file to read instead of the default location.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level for the relay, e.g. `debug`. `RUST_LOG` takes precedence.
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> CanopyConfig {
    let loaded = match &args.config {
        Some(path) => canopy_config::load_from_path(path),
        None => canopy_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("canopy-relay: {e}; using defaults");
        CanopyConfig::default()
    })
}

fn server_config(args: &Args, config: &CanopyConfig) -> RelayServerConfig {
    let mut server = config.relay_server.clone();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(host) = &args.host {
        server.host = host.clone();
    }
    server
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = load_config(&args);

    let default_filter = match &args.log_level {
        Some(level) => format!("canopy_relay={level}"),
        None => config.logging.filter_for("canopy_relay"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let server = server_config(&args, &config);
    let addr = server.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    tracing::info!("canopy-relay listening on {}", addr);
    serve(listener, SessionStore::new(), RelaySettings::from(&server)).await;
}
