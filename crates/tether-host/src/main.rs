//! Tether Host - serves a remote object graph over loopback HTTP.
//!
//! Normally spawned by the client's process supervisor, which picks the port
//! and waits for it to become reachable.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tether_host::sandbox::LaunchSettings;
use tether_host::{server, HostContext, HostError, TargetRegistry};
use tether_spec::SpecRegistry;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tether Host - dispatches spec-declared commands against live remote objects.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Path to the class/member specification
    #[arg(short, long, env = "TETHER_SPEC")]
    spec: PathBuf,

    /// Root object kind the supervisor expects this host to serve
    #[arg(short, long, default_value = "chromium")]
    target: String,

    /// Launch browsers with a visible window
    #[arg(long)]
    visible: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let filter = if args.debug {
        "debug,tether_host=trace"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Tether Host v{}", env!("CARGO_PKG_VERSION"));

    let spec = SpecRegistry::load(&args.spec)
        .map_err(HostError::from)
        .with_context(|| format!("Failed to load specification {}", args.spec.display()))?;

    let targets = TargetRegistry::sandbox(LaunchSettings {
        headless: !args.visible,
    });
    if !targets.supports(&args.target) {
        return Err(HostError::UnknownTarget(args.target).into());
    }

    let context = Arc::new(HostContext::new(Arc::new(spec), targets));

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| HostError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, shutting down");
            ctrl_c.cancel();
        }
    });

    info!("Serving target {} (visible: {})", args.target, args.visible);

    server::serve(listener, context, shutdown)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
