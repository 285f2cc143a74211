//! Store helper types and error definitions

use thiserror::Error;

/// Schema version for the index database
///
/// Store::open() compares this against the stored version. Older databases
/// are reported as a mismatch (there are no migrations); newer ones are refused.
///
/// History:
/// - v1: files, tags, file_tags (cascade on file delete), metadata
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("Schema version mismatch in {0}: database is v{1}, imgtag expects v{2}. Move the database aside to start a new one.")]
    SchemaMismatch(String, i32, i32),
    #[error("Database created by newer imgtag version (schema v{0}). Please upgrade imgtag.")]
    SchemaNewer(i32),
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
}

impl StoreError {
    /// Map a unique-constraint failure to `IntegrityViolation`, pass anything else through
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::IntegrityViolation(db.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// A row from the `files` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    /// Base name, unique across the index
    pub name: String,
    /// Last known location; may be stale
    pub path: Option<String>,
}

/// A row from the `tags` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
}

/// A tag name with the number of files carrying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub name: String,
    pub file_count: i64,
}

impl TagCount {
    pub fn new(name: impl Into<String>, file_count: i64) -> Self {
        Self {
            name: name.into(),
            file_count,
        }
    }
}

/// Split a schema script into executable statements
///
/// Whole-line `--` comments are dropped before splitting on `;`, so comment
/// text never ends up inside a statement.
pub(crate) fn schema_statements(schema: &str) -> Vec<String> {
    let code: String = schema
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .map(|line| format!("{line}\n"))
        .collect();
    code.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_strip_comments() {
        let sql = "-- header\n\nCREATE TABLE x (id INTEGER);\n-- trailing\n";
        assert_eq!(schema_statements(sql), vec!["CREATE TABLE x (id INTEGER)"]);
    }

    #[test]
    fn test_schema_statements_semicolon_in_comment() {
        let sql = "-- split on ';' here\nCREATE TABLE a (id INTEGER);\nCREATE TABLE b (id INTEGER);";
        assert_eq!(
            schema_statements(sql),
            vec!["CREATE TABLE a (id INTEGER)", "CREATE TABLE b (id INTEGER)"]
        );
    }

    #[test]
    fn test_schema_statements_comment_only_is_empty() {
        assert!(schema_statements("-- nothing here\n  \n").is_empty());
    }

    #[test]
    fn test_bundled_schema_statements() {
        let stmts = schema_statements(include_str!("../schema.sql"));
        assert_eq!(stmts.len(), 5);
        for stmt in &stmts {
            assert!(stmt.starts_with("CREATE "), "unexpected statement: {stmt}");
            assert!(!stmt.contains("--"));
        }
    }

    #[test]
    fn test_schema_mismatch_message_names_versions() {
        let err = StoreError::SchemaMismatch("index.db".into(), 0, 1);
        let msg = err.to_string();
        assert!(msg.contains("v0"));
        assert!(msg.contains("v1"));
        assert!(msg.contains("Move the database aside"));
        assert!(!msg.contains("imgtag reset"));
    }
}
