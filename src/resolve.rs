//! Path resolution with scan-and-repair fallback
//!
//! A file's stored path is only a hint. Resolution trusts a hint (cached or
//! stored) only after checking it exists; otherwise it scans the configured
//! root for the first file with a matching name, saves what it finds, and
//! prunes the file from the index when the scan comes up empty.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::cache::{CacheOp, CachedValue};
use crate::index::{IndexError, TagIndex};
use crate::source::FileSource;

/// Root directory plus the filesystem used to search it
pub struct PathResolver {
    root: PathBuf,
    source: Box<dyn FileSource>,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>, source: Box<dyn FileSource>) -> Self {
        Self {
            root: root.into(),
            source,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a hint can be trusted as-is
    pub fn is_valid(&self, path: &Path) -> bool {
        !path.as_os_str().is_empty() && self.source.exists(path)
    }

    /// Full scan of the root for `filename`, first match wins
    pub fn scan(&self, filename: &str) -> Option<PathBuf> {
        self.source.find_first(&self.root, filename)
    }
}

impl TagIndex {
    /// Turn a file name into an existing path
    ///
    /// Returns `None` when the file is nowhere under the root; the file and
    /// its tag associations have then been removed from the index. Only
    /// store failures are errors.
    pub fn resolve_path(&self, filename: &str) -> Result<Option<PathBuf>, IndexError> {
        let _span = tracing::debug_span!("resolve_path", file = filename).entered();

        if let Some(CachedValue::Path(path)) = self.cache.get(CacheOp::FilePath, filename) {
            if self.resolver.is_valid(&path) {
                return Ok(Some(path));
            }
            tracing::debug!(file = filename, path = %path.display(), "Cached path is stale");
            self.cache.invalidate(CacheOp::FilePath, filename);
        }

        let file = self.store.get_or_create_file(filename)?;
        if let Some(hint) = file.path.filter(|p| !p.is_empty()).map(PathBuf::from) {
            if self.resolver.is_valid(&hint) {
                self.cache
                    .put_default(CacheOp::FilePath, filename, CachedValue::Path(hint.clone()));
                return Ok(Some(hint));
            }
            tracing::debug!(file = filename, hint = %hint.display(), "Stored path is stale");
        }

        self.scan_and_repair(filename)
    }

    /// Resolve many names on the rayon pool
    ///
    /// The output is aligned with `filenames`; a name that could not be found
    /// (and was pruned) yields `None` in its slot.
    pub fn resolve_paths<S>(&self, filenames: &[S]) -> Result<Vec<Option<PathBuf>>, IndexError>
    where
        S: AsRef<str> + Sync,
    {
        let _span = tracing::info_span!("resolve_paths", count = filenames.len()).entered();
        filenames
            .par_iter()
            .map(|name| self.resolve_path(name.as_ref()))
            .collect()
    }

    fn scan_and_repair(&self, filename: &str) -> Result<Option<PathBuf>, IndexError> {
        match self.resolver.scan(filename) {
            Some(path) => {
                self.set_file_path(filename, &path)?;
                self.cache
                    .put_default(CacheOp::FilePath, filename, CachedValue::Path(path.clone()));
                Ok(Some(path))
            }
            None => {
                tracing::info!(
                    file = filename,
                    root = %self.resolver.root().display(),
                    "File not found - removing from database"
                );
                self.delete_file(filename)?;
                Ok(None)
            }
        }
    }
}
