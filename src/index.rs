//! Tag index facade: store, lookup cache and path resolver wired together
//!
//! `TagIndex` is the surface the CLI (or any UI) talks to. Every mutation
//! goes through the store and invalidates the affected cache entries both
//! before the write and again after it commits. That narrows, but does not
//! close, the window for a racing reader: one that read pre-commit data can
//! still put it back after the second invalidation, and the entry then lives
//! until its TTL expires.

use std::path::Path;

use thiserror::Error;

use crate::cache::{CacheOp, CachedValue, LookupCache};
use crate::config::Settings;
use crate::query::{self, normalize_tag, TagQuery};
use crate::resolve::PathResolver;
use crate::source::LocalFileSource;
use crate::store::{Store, StoreError, TagCount};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("At least one include tag is required")]
    NoIncludeTags,
    #[error("Tag name is empty")]
    EmptyTagName,
}

/// The tag-indexed file query engine
///
/// # Example
///
/// ```no_run
/// use imgtag::config::Config;
/// use imgtag::TagIndex;
///
/// let settings = Config::load(std::path::Path::new(".")).settings(std::path::Path::new("."))?;
/// let index = TagIndex::open(&settings)?;
/// index.add_tag("cat.jpg", "Animal")?;
/// let files = index.files_for_tags(&["animal".to_string()], &[])?;
/// let paths = index.resolve_paths(&files)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct TagIndex {
    pub(crate) store: Store,
    pub(crate) cache: LookupCache,
    pub(crate) resolver: PathResolver,
}

impl TagIndex {
    pub fn new(store: Store, cache: LookupCache, resolver: PathResolver) -> Self {
        Self {
            store,
            cache,
            resolver,
        }
    }

    /// Open the database from settings, creating tables if needed
    pub fn open(settings: &Settings) -> Result<Self, IndexError> {
        let store = Store::open(&settings.db_path)?;
        store.init()?;
        let cache = LookupCache::new(settings.cache_ttl);
        let resolver = PathResolver::new(&settings.root_dir, Box::new(LocalFileSource::new()));
        Ok(Self::new(store, cache, resolver))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    fn invalidate_for_tagging(&self, filename: &str, tagname: &str) {
        self.cache.invalidate(CacheOp::FileTags, filename);
        self.cache.invalidate(CacheOp::TagFileCount, tagname);
    }

    /// Tag a file; the tag is normalized first
    ///
    /// Returns `true` if the association is new, `false` if it was already present.
    pub fn add_tag(&self, filename: &str, tag: &str) -> Result<bool, IndexError> {
        let tagname = normalize_tag(tag).ok_or(IndexError::EmptyTagName)?;
        self.invalidate_for_tagging(filename, &tagname);
        let created = self.store.add_association(filename, &tagname)?;
        self.invalidate_for_tagging(filename, &tagname);
        if created {
            tracing::info!(file = filename, tag = %tagname, "Added tag");
        } else {
            tracing::info!(file = filename, tag = %tagname, "File already has tag; nothing to do");
        }
        Ok(created)
    }

    /// Remove a tag from a file; returns association rows deleted (0 if absent)
    ///
    /// Cached tag lists of *other* files keep their old count for this tag
    /// until they expire.
    pub fn remove_tag(&self, filename: &str, tag: &str) -> Result<u64, IndexError> {
        let Some(tagname) = normalize_tag(tag) else {
            return Ok(0);
        };
        self.invalidate_for_tagging(filename, &tagname);
        let removed = self.store.remove_association(filename, &tagname)?;
        self.invalidate_for_tagging(filename, &tagname);
        tracing::info!(
            file = filename,
            tag = %tagname,
            rows = removed,
            "Removed tag"
        );
        Ok(removed)
    }

    /// Tags on a file with per-tag file counts, ordered by tag name (cached)
    pub fn tags_for_file(&self, filename: &str) -> Result<Vec<TagCount>, IndexError> {
        if let Some(CachedValue::Tags(tags)) = self.cache.get(CacheOp::FileTags, filename) {
            return Ok(tags);
        }
        let tags = self.store.list_tags_for_file(filename)?;
        self.cache
            .put_default(CacheOp::FileTags, filename, CachedValue::Tags(tags.clone()));
        Ok(tags)
    }

    /// Number of files carrying a tag (cached); 0 for unknown or empty names
    pub fn count_files_with_tag(&self, tag: &str) -> Result<i64, IndexError> {
        let Some(tagname) = normalize_tag(tag) else {
            return Ok(0);
        };
        if let Some(CachedValue::Count(n)) = self.cache.get(CacheOp::TagFileCount, &tagname) {
            return Ok(n);
        }
        let count = self.store.count_files_for_tag(&tagname)?;
        self.cache
            .put_default(CacheOp::TagFileCount, &tagname, CachedValue::Count(count));
        Ok(count)
    }

    /// Files carrying every `include` tag and none of the `exclude` tags, sorted
    ///
    /// Operands are normalized like [`TagIndex::add_tag`]; empty ones are
    /// dropped. Per-tag file sets are read from the store on every call.
    pub fn files_for_tags(
        &self,
        include: &[String],
        exclude: &[String],
    ) -> Result<Vec<String>, IndexError> {
        let include: Vec<String> = include.iter().filter_map(|t| normalize_tag(t)).collect();
        let exclude: Vec<String> = exclude.iter().filter_map(|t| normalize_tag(t)).collect();
        let _span = tracing::info_span!(
            "files_for_tags",
            include = include.len(),
            exclude = exclude.len()
        )
        .entered();
        if include.is_empty() {
            return Err(IndexError::NoIncludeTags);
        }
        let included = include
            .iter()
            .map(|t| self.store.list_files_for_tag(t))
            .collect::<Result<Vec<_>, _>>()?;
        let excluded = exclude
            .iter()
            .map(|t| self.store.list_files_for_tag(t))
            .collect::<Result<Vec<_>, _>>()?;
        let files = query::combine(included, excluded);
        tracing::debug!(results = files.len(), "Tag query complete");
        Ok(files)
    }

    /// Parse search text (`"cat -blurry"`) and run it
    pub fn search(&self, text: &str) -> Result<Vec<String>, IndexError> {
        let q = TagQuery::parse(text);
        self.files_for_tags(&q.include, &q.exclude)
    }

    /// Every tag with its file count, ordered by name
    pub fn list_all_tags(&self) -> Result<Vec<TagCount>, IndexError> {
        Ok(self.store.list_tags()?)
    }

    /// Tag names by descending file count, ties by name
    ///
    /// A read-only snapshot for completion lists; call again to refresh.
    pub fn tag_popularity(&self) -> Result<Vec<String>, IndexError> {
        let mut tags = self.store.list_tags()?;
        tags.sort_by(|a, b| b.file_count.cmp(&a.file_count).then_with(|| a.name.cmp(&b.name)));
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    /// Delete a file and its associations; returns file rows deleted
    ///
    /// The file's resolved-path entry is left in the cache; it fails
    /// validation or expires on its own.
    pub fn delete_file(&self, filename: &str) -> Result<u64, IndexError> {
        self.cache.invalidate(CacheOp::FileTags, filename);
        let deleted = self.store.delete_file(filename)?;
        self.cache.invalidate(CacheOp::FileTags, filename);
        tracing::debug!(file = filename, rows = deleted, "Deleted file");
        Ok(deleted)
    }

    /// Record a new path hint for a file
    pub fn set_file_path(&self, filename: &str, path: &Path) -> Result<(), IndexError> {
        self.cache.invalidate(CacheOp::FilePath, filename);
        self.store
            .set_file_path(filename, &path.to_string_lossy())?;
        self.cache.invalidate(CacheOp::FilePath, filename);
        tracing::debug!(file = filename, path = %path.display(), "Saved file path");
        Ok(())
    }

    /// Back up the database to `<db>.back`, recreate empty tables and drop all cached lookups
    pub fn reset(&self) -> Result<std::path::PathBuf, IndexError> {
        let mut backup = self.store.path().as_os_str().to_owned();
        backup.push(".back");
        let backup = std::path::PathBuf::from(backup);
        self.store.reset(&backup)?;
        self.cache.clear();
        Ok(backup)
    }
}
