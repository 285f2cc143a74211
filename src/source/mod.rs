//! Filesystem collaborator used by path resolution
//!
//! The `FileSource` trait covers the two things resolution needs from the
//! filesystem: existence checks and a first-match search by file name.
//! Tests substitute an in-memory implementation to observe scans.

mod filesystem;

pub use filesystem::LocalFileSource;

use std::path::{Path, PathBuf};

/// A searchable tree of files
pub trait FileSource: Send + Sync {
    /// Whether `path` currently names an existing entry
    fn exists(&self, path: &Path) -> bool;

    /// Path of the first file named `file_name` found under `root`
    ///
    /// Order is whatever the traversal produces; callers must not assume
    /// which of several same-named files wins.
    fn find_first(&self, root: &Path, file_name: &str) -> Option<PathBuf>;
}
