//! rust-builder CLI
//!
//! Entry point for the rust-builder command-line application.

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use rust_builder::cli::output::display_error;
use rust_builder::cli::Cli;
use rust_builder::config::defaults;

/// Default log level from verbosity flags and the debug toggle
fn default_level(cli: &Cli) -> Level {
    let debug_toggle = std::env::var(defaults::DEBUG_ENV_VAR).is_ok_and(|v| !v.is_empty());
    if cli.quiet {
        Level::ERROR
    } else if cli.verbose >= 2 || debug_toggle {
        Level::DEBUG
    } else if cli.verbose == 1 {
        Level::INFO
    } else {
        Level::WARN
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level(&cli).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
