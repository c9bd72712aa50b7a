//! # Stored Defaults Runtime
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`, written to stderr)
//! 2. Load configuration from the environment
//! 3. Build the container (defaults domain, coder stack, coordinator)
//! 4. Run one command, or watch until Ctrl-C

use anyhow::{Context, Result};
use sd_runtime::{commands, Command, Container, RuntimeConfig};
use std::io::Write;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = RuntimeConfig::from_env().context("loading configuration")?;
    let container = Container::new(config)?;

    if command == Command::Watch {
        info!("Watching for changes; press Ctrl-C to stop");
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Could not listen for Ctrl-C");
            }
        };
        return commands::watch(&container, shutdown, |line| {
            writeln!(std::io::stdout(), "{line}")?;
            Ok(())
        })
        .await;
    }

    let mut stdout = std::io::stdout().lock();
    for line in command.execute(&container)? {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}
