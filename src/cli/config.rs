//! Configuration loading and index opening for CLI commands
//!
//! CLI flags override config file values; settings are validated before
//! the database is touched.

use std::path::PathBuf;

use anyhow::{Context, Result};

use imgtag::config::{Config, Settings};
use imgtag::TagIndex;

use super::Cli;

fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config files from the working directory and apply `--db` / `--root`
pub(crate) fn load_config(cli: &Cli) -> Config {
    Config::load(&working_dir()).with_overrides(cli.db.clone(), cli.root.clone())
}

/// Validate config into settings without touching the database
pub(crate) fn resolve_settings(config: &Config) -> Result<Settings> {
    config
        .settings(&working_dir())
        .context("Invalid configuration")
}

/// Open the index, creating the database and tables on first use
pub(crate) fn open_index(settings: &Settings) -> Result<TagIndex> {
    tracing::debug!(
        db = %settings.db_path.display(),
        root = %settings.root_dir.display(),
        "Opening index"
    );
    TagIndex::open(settings)
        .with_context(|| format!("Failed to open index at {}", settings.db_path.display()))
}
