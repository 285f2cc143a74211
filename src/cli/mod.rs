//! CLI implementation for imgtag

mod commands;
mod config;
mod display;

pub(crate) use config::{load_config, open_index};

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use imgtag::config::Config;

use commands::{
    cmd_cleanup, cmd_delete, cmd_list_tags, cmd_query, cmd_reset, cmd_resolve, cmd_tag,
    cmd_tags, cmd_untag,
};
use config::resolve_settings;

#[derive(Parser)]
#[command(name = "imgtag")]
#[command(about = "Tag images and query them by tag")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database file (overrides [database] filename)
    #[arg(long, global = true, env = "IMGTAG_DB")]
    db: Option<PathBuf>,

    /// Image root directory (overrides [filesystem] root_dir)
    #[arg(long, global = true, env = "IMGTAG_ROOT")]
    root: Option<PathBuf>,

    /// Show debug info
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up the database and recreate empty tables
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Reserved for pruning orphaned rows (currently does nothing)
    Cleanup,
    /// List all tags with their file counts
    ListTags,
    /// Add tags to a file
    Tag {
        /// File name (base name, not a path)
        file: String,
        /// Tags to add; spaces become underscores
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove tags from a file
    Untag {
        /// File name (base name, not a path)
        file: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Show the tags on a file
    Tags {
        /// File name (base name, not a path)
        file: String,
    },
    /// Find files by tag; prefix a tag with '-' to exclude it
    Query {
        /// Search terms, e.g. `cat outdoor -blurry`
        #[arg(required = true, allow_hyphen_values = true)]
        terms: Vec<String>,
        /// Randomize result order
        #[arg(long)]
        shuffle: bool,
        /// Print resolved paths instead of names
        #[arg(long)]
        paths: bool,
    },
    /// Resolve file names to paths under the image root
    Resolve {
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Remove a file and its tags from the index
    Delete {
        file: String,
    },
}

/// Run CLI with pre-parsed arguments and loaded config
///
/// Settings are validated for every command before the database is opened.
pub fn run_with(cli: Cli, config: Config) -> Result<()> {
    let settings = resolve_settings(&config)?;
    let open = || open_index(&settings);
    match cli.command {
        Commands::Reset { yes } => cmd_reset(&settings, yes),
        Commands::Cleanup => cmd_cleanup(&open()?),
        Commands::ListTags => cmd_list_tags(&open()?),
        Commands::Tag { file, tags } => cmd_tag(&open()?, &settings, &file, &tags),
        Commands::Untag { file, tags } => cmd_untag(&open()?, &file, &tags),
        Commands::Tags { file } => cmd_tags(&open()?, &file),
        Commands::Query {
            terms,
            shuffle,
            paths,
        } => cmd_query(&open()?, &terms, shuffle, paths),
        Commands::Resolve { files } => cmd_resolve(&open()?, &files),
        Commands::Delete { file } => cmd_delete(&open()?, &file),
    }
}
