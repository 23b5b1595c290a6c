#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use multiplayer_coordinator::config::{self, validate_config, Config};
use multiplayer_coordinator::logging;
use multiplayer_coordinator::server::{maintenance, CoordinatorServer};
use multiplayer_coordinator::websocket;

/// N64 multiplayer coordinator -- session registry, host-authoritative input
/// relay, chat, and WebRTC signalling for browser emulator online play.
#[derive(Parser, Debug)]
#[command(name = "multiplayer-coordinator")]
#[command(about = "Coordinator service for browser N64 emulator online play")]
#[command(version)]
struct Cli {
    /// Load configuration from this file instead of the default search path.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::loader::load_from_path(path)?,
        None => config::load(),
    };

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let validation_result = validate_config(&cfg);
    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!("  Port: {}", cfg.port);
                println!("  Max sessions: {}", cfg.server.max_sessions);
                println!("  CORS origins: {}", cfg.security.cors_origins);
                return Ok(());
            }
            Err(err) => {
                eprintln!("Configuration validation failed:\n{err}");
                std::process::exit(1);
            }
        }
    }
    validation_result?;

    logging::init_with_config(&cfg.logging);

    let port = cfg.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server = CoordinatorServer::new(Arc::new(cfg.clone()));

    tracing::info!(%addr, "starting multiplayer coordinator");

    let sweep_server = server.clone();
    tokio::spawn(async move {
        maintenance::run(sweep_server).await;
    });

    let app = websocket::create_router(&cfg.security.cors_origins).with_state(server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
