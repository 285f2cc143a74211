//! Tag set algebra and search-text parsing
//!
//! Pure functions over file-name sets. [`crate::TagIndex::files_for_tags`]
//! feeds them per-tag file sets fetched from the store.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;

/// Normalize a user-entered tag: trim, lowercase, spaces to underscores
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase().replace(' ', "_"))
}

/// Include/exclude operands of a tag query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagQuery {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl TagQuery {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self { include, exclude }
    }

    /// Parse search text such as `"cat outdoor -blurry"`
    ///
    /// Tokens are whitespace separated; a leading `-` marks an exclusion.
    /// A lone `-` is ignored.
    pub fn parse(text: &str) -> Self {
        let mut query = TagQuery::default();
        for token in text.split_whitespace() {
            match token.strip_prefix('-') {
                Some(rest) => {
                    if let Some(tag) = normalize_tag(rest) {
                        query.exclude.push(tag);
                    }
                }
                None => {
                    if let Some(tag) = normalize_tag(token) {
                        query.include.push(tag);
                    }
                }
            }
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Intersect all `include` sets, then remove anything in an `exclude` set
///
/// Returns sorted, deduplicated names. An empty `include` yields an empty
/// result; callers that treat that as an input error check it first.
pub fn combine<I, E>(include: I, exclude: E) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
    E: IntoIterator<Item = Vec<String>>,
{
    let mut include = include.into_iter();
    let Some(first) = include.next() else {
        return Vec::new();
    };
    let mut results: BTreeSet<String> = first.into_iter().collect();
    for files in include {
        if results.is_empty() {
            break;
        }
        let other: BTreeSet<String> = files.into_iter().collect();
        results.retain(|f| other.contains(f));
    }
    for files in exclude {
        for file in files {
            results.remove(&file);
        }
    }
    results.into_iter().collect()
}

/// A randomly ordered copy of `files`, for display
pub fn shuffled(files: &[String]) -> Vec<String> {
    let mut copy = files.to_vec();
    copy.shuffle(&mut rand::rng());
    copy
}
