//! Database maintenance commands: reset, cleanup, list-tags

use std::io::{BufRead, Write};

use anyhow::{Context as _, Result};

use imgtag::config::Settings;
use imgtag::TagIndex;

use crate::cli::display::format_tag_table;
use crate::cli::open_index;

const RESET_BANNER: &str = "\
!!! WARNING !!!
This will delete every file, tag and tag assignment in the database.
A copy of the current database is kept next to it with a .back suffix.";

/// Whether a confirmation answer means yes (only a bare `y`)
fn is_confirmed(answer: &str) -> bool {
    answer.trim() == "y"
}

/// Prompt on stderr and read one line of stdin
fn confirm(prompt: &str) -> Result<bool> {
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{RESET_BANNER}")?;
    write!(stderr, "{prompt} ")?;
    stderr.flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(is_confirmed(&answer))
}

/// Back up the database and recreate empty tables
///
/// The database is only opened once the reset is confirmed.
pub(crate) fn cmd_reset(settings: &Settings, yes: bool) -> Result<()> {
    let _span = tracing::info_span!("cmd_reset").entered();

    if !yes && !confirm("Are you sure? [y/n]")? {
        println!("Aborting");
        return Ok(());
    }

    let index = open_index(settings)?;
    let backup = index.reset().context("Failed to reset database")?;
    tracing::info!(backup = %backup.display(), "Database reset");
    Ok(())
}

/// Reserved for pruning orphaned rows
pub(crate) fn cmd_cleanup(_index: &TagIndex) -> Result<()> {
    tracing::debug!("Cleanup has nothing to do");
    Ok(())
}

/// Print every tag with its file count
pub(crate) fn cmd_list_tags(index: &TagIndex) -> Result<()> {
    let _span = tracing::info_span!("cmd_list_tags").entered();
    let tags = index.list_all_tags().context("Failed to list tags")?;
    print!("{}", format_tag_table(&tags));
    Ok(())
}
