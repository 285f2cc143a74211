//! Output formatting for CLI results

use std::path::Path;

use imgtag::TagCount;

const TAG_COLUMN_WIDTH: usize = 20;

/// Header plus one `name  count` row per tag, name padded to 20 columns
pub(crate) fn format_tag_table(tags: &[TagCount]) -> String {
    let mut out = format!("{:<width$} # Files\n", "Tag", width = TAG_COLUMN_WIDTH);
    for tag in tags {
        out.push_str(&format!(
            "{:<width$} {}\n",
            tag.name,
            tag.file_count,
            width = TAG_COLUMN_WIDTH
        ));
    }
    out
}

/// Tags on a single file, `name (count)` per line
pub(crate) fn format_file_tags(tags: &[TagCount]) -> String {
    tags.iter()
        .map(|t| format!("{} ({})\n", t.name, t.file_count))
        .collect()
}

/// A resolved path, or a marker for a file that was pruned
pub(crate) fn format_resolved(name: &str, path: Option<&Path>) -> String {
    match path {
        Some(p) => format!("{name}\t{}", p.display()),
        None => format!("{name}\t(not found, removed)"),
    }
}
