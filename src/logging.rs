//! Logging setup shared by the binaries, the library itself only emits
//! `tracing` events.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs a compact stderr subscriber, DEBUG when `verbose` and INFO otherwise
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to initialize logging")
}
