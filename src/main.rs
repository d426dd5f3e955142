//! crapdns binary: CLI parsing, signal wiring, and the unified shutdown
//! path that guarantees resolver-file cleanup on every exit.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use crapdns::server::LISTEN_ADDR;
use crapdns::{CrapDnsError, DomainSet, QueryResponder, ResolverRegistry, Result, util};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "crapdns", version, about = "Answers A queries for configured domains with 127.0.0.1")]
struct Cli {
    /// A comma-separated list of domains to answer for (disables the
    /// config file).
    #[arg(short, long)]
    domains: Option<String>,

    /// Configuration file, one domain per line.
    #[arg(short, long, default_value = "crapdns.conf")]
    config: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

#[tokio::main]
async fn run(cli: Cli) -> Result<()> {
    if !util::is_supported_platform() {
        return Err(CrapDnsError::UnsupportedPlatform);
    }

    // Config errors exit here, before any filesystem mutation.
    let domains = Arc::new(DomainSet::resolve(cli.domains.as_deref(), &cli.config)?);

    let registry = ResolverRegistry::new();
    match registry.cleanup_orphaned() {
        Ok(0) => {}
        Ok(n) => info!(count = n, "removed stale resolver files from a previous run"),
        Err(e) => warn!(error = %e, "stale resolver file sweep failed"),
    }

    // From here on resolver files may exist on disk, so every exit —
    // signal, bind failure, or a partial provisioning failure — funnels
    // through the cleanup below.
    let result = match registry.provision(domains.iter()) {
        Ok(()) => serve(Arc::clone(&domains)).await,
        Err(e) => Err(e),
    };

    info!("cleaning up");
    match registry.cleanup() {
        Ok(outcome) => {
            info!(removed = outcome.removed, skipped = outcome.skipped, "cleanup finished");
        }
        Err(e) => {
            error!(error = %e, "cleanup failed");
            if result.is_ok() {
                return Err(e);
            }
        }
    }
    result
}

/// Runs the responder as a concurrent task and blocks until SIGINT,
/// SIGTERM, or a fatal responder error.
async fn serve(domains: Arc<DomainSet>) -> Result<()> {
    let (err_tx, mut err_rx) = mpsc::channel::<CrapDnsError>(1);
    let responder = QueryResponder::new(domains);
    tokio::spawn(async move {
        if let Err(e) = responder.run(LISTEN_ADDR).await {
            let _ = err_tx.send(e).await;
        }
    });

    info!("starting crapdns, listening on {LISTEN_ADDR}");

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("signal (SIGINT) received, exiting");
            Ok(())
        }
        _ = sigterm.recv() => {
            info!("signal (SIGTERM) received, exiting");
            Ok(())
        }
        Some(e) = err_rx.recv() => {
            error!("failed to set up the server: {e}");
            if matches!(e, CrapDnsError::Bind { .. }) {
                error!("this command should be run as sudo");
            }
            Err(e)
        }
    }
}
