//! Tag assignment commands

use anyhow::{Context as _, Result};

use imgtag::config::Settings;
use imgtag::TagIndex;

use crate::cli::display::format_file_tags;

/// Add each tag to a file
pub(crate) fn cmd_tag(
    index: &TagIndex,
    settings: &Settings,
    file: &str,
    tags: &[String],
) -> Result<()> {
    let _span = tracing::info_span!("cmd_tag", file, count = tags.len()).entered();

    if !settings.is_image_file(std::path::Path::new(file)) {
        tracing::warn!(
            file,
            extensions = ?settings.image_extensions,
            "File does not have an image extension"
        );
    }

    let mut added = 0usize;
    for tag in tags {
        if index
            .add_tag(file, tag)
            .with_context(|| format!("Failed to tag {file} with '{tag}'"))?
        {
            added += 1;
        }
    }
    tracing::debug!(added, "Tagging complete");
    Ok(())
}

/// Remove each tag from a file; tags it does not carry are ignored
pub(crate) fn cmd_untag(index: &TagIndex, file: &str, tags: &[String]) -> Result<()> {
    let _span = tracing::info_span!("cmd_untag", file, count = tags.len()).entered();
    for tag in tags {
        index
            .remove_tag(file, tag)
            .with_context(|| format!("Failed to remove '{tag}' from {file}"))?;
    }
    Ok(())
}

/// Print a file's tags with their file counts
pub(crate) fn cmd_tags(index: &TagIndex, file: &str) -> Result<()> {
    let tags = index
        .tags_for_file(file)
        .with_context(|| format!("Failed to read tags for {file}"))?;
    print!("{}", format_file_tags(&tags));
    Ok(())
}
