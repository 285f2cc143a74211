//! Local filesystem implementation of `FileSource`

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::FileSource;

/// Searches the local filesystem with a recursive directory walk
///
/// Directory symlinks are not followed, so a link cycle cannot stall a
/// scan. A symlink to a file matches like the file itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSource;

impl LocalFileSource {
    pub fn new() -> Self {
        Self
    }
}

impl FileSource for LocalFileSource {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn find_first(&self, root: &Path, file_name: &str) -> Option<PathBuf> {
        let _span = tracing::debug_span!("find_first", root = %root.display(), file_name).entered();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry during scan");
                    continue;
                }
            };
            if entry.file_name() != file_name {
                continue;
            }
            // A link to a file counts; links to directories are never descended
            let is_file = entry.file_type().is_file()
                || (entry.file_type().is_symlink() && entry.path().is_file());
            if is_file {
                tracing::debug!(file_name, path = %entry.path().display(), "Found file");
                return Some(entry.into_path());
            }
        }
        None
    }
}
