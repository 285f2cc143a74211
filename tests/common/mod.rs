//! Common test fixtures and helpers
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::{TestIndex, TestStore};
//! ```
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use imgtag::{FileSource, LocalFileSource, LookupCache, PathResolver, Store, TagIndex};
use tempfile::TempDir;

/// Test store with automatic cleanup
///
/// Wraps a `Store` with its backing `TempDir`, ensuring the directory
/// lives as long as the store is in use.
pub struct TestStore {
    pub store: Store,
    /// Temp directory (kept alive to prevent cleanup)
    pub dir: TempDir,
}

impl TestStore {
    /// Create an initialized test store in a temporary directory
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("imgtag.db");
        let store = Store::open(&db_path).expect("Failed to open store");
        store.init().expect("Failed to init store");
        Self { store, dir }
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// In-memory file tree that counts full scans
///
/// Clones share state, so a test can keep a handle while the index owns
/// the boxed source.
#[derive(Clone, Default)]
pub struct FakeSource {
    files: Arc<Mutex<HashSet<PathBuf>>>,
    scans: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn add(&self, path: impl Into<PathBuf>) {
        self.files.lock().unwrap().insert(path.into());
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files.lock().unwrap().remove(path.as_ref());
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl FileSource for FakeSource {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains(path)
    }

    fn find_first(&self, root: &Path, file_name: &str) -> Option<PathBuf> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let files = self.files.lock().unwrap();
        let mut matches: Vec<&PathBuf> = files
            .iter()
            .filter(|p| p.starts_with(root) && p.file_name().is_some_and(|n| n == file_name))
            .collect();
        matches.sort();
        matches.first().map(|p| (*p).clone())
    }
}

/// Tag index over a temp database, with either a fake or a real file tree
pub struct TestIndex {
    pub index: TagIndex,
    /// Temp directory holding the database (and the real root, if any)
    pub dir: TempDir,
}

impl TestIndex {
    /// Index whose root is `/pics` inside a [`FakeSource`]
    pub fn with_fake(source: FakeSource) -> Self {
        let TestStore { store, dir } = TestStore::new();
        let resolver = PathResolver::new("/pics", Box::new(source));
        let index = TagIndex::new(store, LookupCache::default(), resolver);
        Self { index, dir }
    }

    /// Index rooted at `<tempdir>/root` on the real filesystem
    pub fn on_disk() -> Self {
        let TestStore { store, dir } = TestStore::new();
        let root = dir.path().join("root");
        std::fs::create_dir_all(&root).expect("Failed to create root dir");
        let resolver = PathResolver::new(&root, Box::new(LocalFileSource::new()));
        let index = TagIndex::new(store, LookupCache::default(), resolver);
        Self { index, dir }
    }

    pub fn root(&self) -> PathBuf {
        self.index.root().to_path_buf()
    }

    /// Write an empty file at `rel` under the root, creating parent dirs
    pub fn touch(&self, rel: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, b"").expect("Failed to write file");
        path
    }
}

impl std::ops::Deref for TestIndex {
    type Target = TagIndex;

    fn deref(&self) -> &Self::Target {
        &self.index
    }
}

/// Owned tag list from string literals
pub fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
