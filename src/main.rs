use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG wins, then --verbose, then the configured level
    let env_filter = EnvFilter::try_from_default_env().ok();
    let level_fixed = env_filter.is_some() || cli.verbose;
    let initial = env_filter
        .unwrap_or_else(|| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    let (filter, filter_handle) = reload::Layer::new(initial);

    // Log to stderr to keep stdout clean for table output. Installed before
    // config loading so unreadable config files are reported.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli::load_config(&cli);

    if !level_fixed {
        if let Some(level) = config.logging.level.as_deref() {
            match EnvFilter::try_new(level) {
                Ok(f) => {
                    if let Err(e) = filter_handle.reload(f) {
                        tracing::warn!(error = %e, "Failed to apply configured log level");
                    }
                }
                Err(e) => tracing::warn!(level, error = %e, "Invalid log level in config"),
            }
        }
    }

    cli::run_with(cli, config)
}
