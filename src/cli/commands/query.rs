//! Query command: find files by tag

use anyhow::{Context as _, Result};

use imgtag::{shuffled, TagIndex, TagQuery};

use crate::cli::display::format_resolved;

/// Run a tag query and print matching file names (or resolved paths)
pub(crate) fn cmd_query(index: &TagIndex, terms: &[String], shuffle: bool, paths: bool) -> Result<()> {
    let text = terms.join(" ");
    let _span = tracing::info_span!("cmd_query", query = %text).entered();

    let q = TagQuery::parse(&text);
    if q.include.is_empty() {
        anyhow::bail!("Query needs at least one tag without a '-' prefix");
    }

    let mut files = index
        .files_for_tags(&q.include, &q.exclude)
        .context("Failed to run tag query")?;
    if shuffle {
        files = shuffled(&files);
    }

    if paths {
        let resolved = index.resolve_paths(&files).context("Failed to resolve paths")?;
        for (name, path) in files.iter().zip(resolved) {
            // Pruned files drop out of the result
            if let Some(path) = path {
                println!("{}", format_resolved(name, Some(path.as_path())));
            }
        }
    } else {
        for name in &files {
            println!("{name}");
        }
    }
    Ok(())
}
