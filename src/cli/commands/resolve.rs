//! Path resolution and file removal commands

use anyhow::{Context as _, Result};

use imgtag::TagIndex;

use crate::cli::display::format_resolved;

/// Resolve file names to paths, repairing or pruning as needed
pub(crate) fn cmd_resolve(index: &TagIndex, files: &[String]) -> Result<()> {
    let _span = tracing::info_span!("cmd_resolve", count = files.len()).entered();
    let resolved = index.resolve_paths(files).context("Failed to resolve paths")?;
    for (name, path) in files.iter().zip(resolved) {
        println!("{}", format_resolved(name, path.as_deref()));
    }
    Ok(())
}

/// Remove a file and all of its tag assignments
pub(crate) fn cmd_delete(index: &TagIndex, file: &str) -> Result<()> {
    let deleted = index
        .delete_file(file)
        .with_context(|| format!("Failed to delete {file}"))?;
    if deleted == 0 {
        tracing::warn!(file, "File is not in the index");
    }
    Ok(())
}
