//! Cluehunt Gateway Server
//!
//! Realtime gateway for the treasure-hunt platform: room chat over
//! WebSockets plus the hint release sweep.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cluehunt_gateway::auth::TokenManager;
use cluehunt_gateway::hints::{HintScheduler, SystemClock};
use cluehunt_gateway::persist::MessageWriter;
use cluehunt_gateway::registry::GroupRegistry;
use cluehunt_gateway::server::{self, AppState};
use cluehunt_gateway::storage::HuntDatabase;

#[derive(Parser, Debug)]
#[command(name = "cluehunt-gateway")]
#[command(
    version,
    about = "Cluehunt realtime gateway - room chat fan-out and hint release"
)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Secret used to validate player bearer tokens.
    #[arg(
        long,
        env = "CLUEHUNT_JWT_SECRET",
        default_value = "dev-secret-change-me"
    )]
    jwt_secret: String,

    /// Bearer token TTL in seconds.
    #[arg(long, default_value_t = 3600)]
    token_ttl: i64,

    /// Per-connection broadcast queue capacity in frames.
    #[arg(long, default_value_t = 64)]
    send_queue: usize,

    /// Chat persistence queue capacity in messages.
    #[arg(long, default_value_t = 256)]
    write_queue: usize,

    /// Interval between hint release sweeps in seconds.
    #[arg(long, default_value_t = 30)]
    hint_sweep_interval: u64,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "cluehunt_gateway=info".into()),
    );
    if args.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting cluehunt-gateway"
    );

    let db = match &args.db_path {
        Some(path) => {
            info!(path = %path.display(), "Opening gateway database");
            HuntDatabase::open(path).await?
        }
        None => {
            let default_path = default_db_path()?;
            info!(path = %default_path.display(), "Opening gateway database (default path)");
            HuntDatabase::open(&default_path).await?
        }
    };

    let tokens = Arc::new(TokenManager::new(
        args.jwt_secret.as_bytes(),
        args.token_ttl,
    ));
    let registry = Arc::new(GroupRegistry::new(args.send_queue));
    let writer = MessageWriter::spawn(db.clone(), args.write_queue);
    let scheduler = HintScheduler::new(db.clone(), Arc::new(SystemClock));

    // Spawn background task that releases due hints on a fixed cadence
    let sweep_scheduler = scheduler.clone();
    let sweep_interval = Duration::from_secs(args.hint_sweep_interval.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            match sweep_scheduler.sweep().await {
                Ok(released) if released > 0 => {
                    info!(released, "Hint sweep released due hints");
                }
                Err(e) => {
                    warn!(error = %e, "Hint sweep failed");
                }
                _ => {}
            }
        }
    });

    let app = server::router(AppState {
        db,
        registry,
        writer,
        tokens,
    });

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!(addr = %args.addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received shutdown signal");
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".cluehunt").join("gateway.db"))
}
