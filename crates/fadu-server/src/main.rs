//! Fadu server binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: port 8080, 5-card hands, 120 second reconnect grace
//! fadu-server --bind 0.0.0.0:8080
//!
//! # Shorter grace period, larger hands
//! fadu-server --grace-secs 30 --hand-size 7
//! ```

use std::time::Duration;

use clap::Parser;
use fadu_core::GameConfig;
use fadu_server::{DriverConfig, Server, ServerRuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Fadu card game server
#[derive(Parser, Debug)]
#[command(name = "fadu-server")]
#[command(about = "Authoritative session server for the Fadu card game")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Maximum concurrent connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Maximum live rooms
    #[arg(long, default_value = "1000")]
    max_rooms: usize,

    /// Cards dealt to each player per round
    #[arg(long, default_value_t = fadu_core::config::DEFAULT_HAND_SIZE)]
    hand_size: usize,

    /// Seconds a disconnected player has to return before the game is forfeited
    #[arg(long, default_value_t = fadu_core::config::DEFAULT_GRACE_PERIOD.as_secs())]
    grace_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Fadu server starting");
    tracing::info!("Binding to {}", args.bind);

    let game = GameConfig {
        hand_size: args.hand_size,
        grace_period: Duration::from_secs(args.grace_secs),
        ..GameConfig::default()
    };

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        driver: DriverConfig {
            game,
            max_connections: args.max_connections,
            max_rooms: args.max_rooms,
        },
        ..Default::default()
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
