//! scribe-gateway: WebSocket shell in front of the guest editor bridge.
//!
//! Accepts one connection per guest frame, captures the `Origin` header at
//! the upgrade, and runs a full bridge session against it. The gateway adds
//! no protocol semantics of its own; it exists so the bridge runs end to
//! end outside a browser.

mod connection;
mod host;
mod protocol;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};

use crate::connection::handle_connection;

#[derive(Parser)]
#[command(name = "scribe-gateway", about = "WebSocket gateway for the guest editor bridge")]
struct Args {
    /// Config file path; defaults to the platform config location.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Override the configured listen port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => scribe_config::load_from_path(path),
        None => scribe_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("scribe-gateway: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "scribe_gateway={0},scribe_bridge={0}",
                    config.logging.filter
                ))
            }),
        )
        .init();

    let port = args.port.unwrap_or(config.gateway.port);
    let addr = format!("{}:{}", config.gateway.bind, port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind TCP listener");

    tracing::info!(
        guest = %config.guest.admin_url,
        "scribe-gateway listening on {}", addr
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let config = config.clone();
                tokio::spawn(async move {
                    let mut origin: Option<String> = None;
                    let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                        origin = req
                            .headers()
                            .get("origin")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        Ok(resp)
                    };
                    let accepted = accept_hdr_async(stream, callback).await;
                    match accepted {
                        Ok(ws) => handle_connection(ws, addr, origin, config).await,
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
