//! SQLite storage for files, tags and their associations (sqlx async with sync wrappers)
//!
//! Provides sync methods that internally use a tokio runtime to execute async sqlx
//! operations, so UI threads and rayon workers can share one `Store`.
//!
//! ## Module Structure
//!
//! - `helpers` - Error type, row types, schema version
//! - `files` - File rows and path hints
//! - `tags` - Tags, associations and aggregate queries

mod files;
mod tags;

pub(crate) mod helpers;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tokio::runtime::Runtime;

/// A row from the files table.
pub use helpers::FileRecord;

/// A row from the tags table.
pub use helpers::TagRecord;

/// Tag name paired with its file count.
pub use helpers::TagCount;

/// Store operation errors.
pub use helpers::StoreError;

/// Current database schema version.
pub use helpers::CURRENT_SCHEMA_VERSION;

use helpers::schema_statements;

/// Thread-safe SQLite store for the tag index
///
/// Uses sqlx connection pooling for concurrent reads and WAL mode
/// for crash safety. Writes are serialized through `write_lock` so
/// no two mutations race on the same file, tag or association row.
///
/// # Example
///
/// ```no_run
/// use imgtag::Store;
/// use std::path::Path;
///
/// let store = Store::open(Path::new("imgtag.db"))?;
/// store.init()?;
/// store.add_association("cat.jpg", "animal")?;
/// for tag in store.list_tags()? {
///     println!("{} {}", tag.name, tag.file_count);
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Store {
    pub(crate) pool: SqlitePool,
    pub(crate) rt: Runtime,
    path: PathBuf,
    write_lock: Mutex<()>,
    /// Whether close() has already been called (skip WAL checkpoint in Drop)
    closed: AtomicBool,
}

impl Store {
    /// Open (or create) an index database with connection pooling
    ///
    /// Does not create tables; call [`Store::init`] for that. Opening a
    /// database with an incompatible schema version fails here.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let _span = tracing::info_span!("store_open", path = %path.display()).entered();
        let rt = Runtime::new().map_err(|e| StoreError::Runtime(e.to_string()))?;

        // Use SqliteConnectOptions::filename() to avoid URL parsing issues with
        // special characters in paths (spaces, #, ?, %, unicode).
        let connect_opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        let pool = rt.block_on(async {
            SqlitePoolOptions::new()
                .max_connections(4)
                .idle_timeout(std::time::Duration::from_secs(300))
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        sqlx::query("PRAGMA temp_store = MEMORY")
                            .execute(&mut *conn)
                            .await?;
                        Ok(())
                    })
                })
                .connect_with(connect_opts)
                .await
        })?;

        let store = Self {
            pool,
            rt,
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        };

        tracing::info!(path = %path.display(), "Database connected");

        store.check_schema_version()?;
        store.check_version();

        Ok(store)
    }

    /// Create tables and metadata if they do not exist yet
    ///
    /// Wraps all DDL and metadata inserts in a single transaction so a
    /// crash mid-init cannot leave a partial schema. Safe to call on every start.
    pub fn init(&self) -> Result<(), StoreError> {
        let _guard = self.write_guard();
        self.rt.block_on(async {
            let mut tx = self.pool.begin().await?;

            for stmt in schema_statements(include_str!("../schema.sql")) {
                sqlx::query(&stmt).execute(&mut *tx).await?;
            }

            let now = chrono::Utc::now().to_rfc3339();
            sqlx::query("INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', ?1)")
                .bind(CURRENT_SCHEMA_VERSION.to_string())
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT OR IGNORE INTO metadata (key, value) VALUES ('created_at', ?1)")
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES ('imgtag_version', ?1)")
                .bind(env!("CARGO_PKG_VERSION"))
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;

            tracing::debug!(schema_version = CURRENT_SCHEMA_VERSION, "Schema initialized");
            Ok(())
        })
    }

    /// Drop and recreate all tables, copying the database file to `backup` first
    ///
    /// The copy is taken after a WAL checkpoint so it contains every committed row.
    pub fn reset(&self, backup: &Path) -> Result<(), StoreError> {
        let _span = tracing::info_span!("store_reset", backup = %backup.display()).entered();
        {
            let _guard = self.write_guard();
            self.rt.block_on(async {
                sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
                    .execute(&self.pool)
                    .await?;
                Ok::<_, StoreError>(())
            })?;

            std::fs::copy(&self.path, backup)?;
            tracing::info!(backup = %backup.display(), "Backed up database");

            self.rt.block_on(async {
                let mut tx = self.pool.begin().await?;
                // Association table first, it references the other two
                for table in ["file_tags", "files", "tags", "metadata"] {
                    sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
                        .execute(&mut *tx)
                        .await?;
                }
                tx.commit().await?;
                Ok::<_, StoreError>(())
            })?;
            tracing::debug!("Dropped all tables");
        }

        self.init()?;
        tracing::debug!("Created all tables");
        Ok(())
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the single-writer lock
    ///
    /// The guarded unit is `()`, so a poisoned lock carries no broken state.
    pub(crate) fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn check_schema_version(&self) -> Result<(), StoreError> {
        let path_str = self.path.display().to_string();
        self.rt.block_on(async {
            let row: Option<(String,)> =
                match sqlx::query_as("SELECT value FROM metadata WHERE key = 'schema_version'")
                    .fetch_optional(&self.pool)
                    .await
                {
                    Ok(r) => r,
                    Err(sqlx::Error::Database(e)) if e.message().contains("no such table") => {
                        // New database, no tables yet
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                };

            let version: i32 = row
                .and_then(|(s,)| {
                    s.parse()
                        .map_err(|e| {
                            tracing::warn!(
                                stored_value = %s,
                                error = %e,
                                "Failed to parse schema_version from metadata, defaulting to 0"
                            );
                        })
                        .ok()
                })
                .unwrap_or(0);

            if version > CURRENT_SCHEMA_VERSION {
                return Err(StoreError::SchemaNewer(version));
            }
            if version < CURRENT_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch(
                    path_str,
                    version,
                    CURRENT_SCHEMA_VERSION,
                ));
            }
            Ok(())
        })
    }

    /// Log if the database was created by a different imgtag version (informational only)
    fn check_version(&self) {
        if let Err(e) = self.rt.block_on(async {
            let row: Option<(String,)> =
                match sqlx::query_as("SELECT value FROM metadata WHERE key = 'imgtag_version'")
                    .fetch_optional(&self.pool)
                    .await
                {
                    Ok(row) => row,
                    Err(e) => {
                        tracing::debug!(error = %e, "Failed to read imgtag_version from metadata");
                        return Ok::<_, StoreError>(());
                    }
                };

            let stored_version = row.map(|(s,)| s).unwrap_or_default();
            let current_version = env!("CARGO_PKG_VERSION");

            if !stored_version.is_empty() && stored_version != current_version {
                tracing::info!(
                    "Database written by imgtag v{}, running v{}",
                    stored_version,
                    current_version
                );
            }
            Ok::<_, StoreError>(())
        }) {
            tracing::debug!(error = %e, "check_version failed");
        }
    }

    /// Gracefully close the store, performing WAL checkpoint.
    ///
    /// Safe to skip (pool will close connections on drop), but recommended
    /// before copying the database file.
    pub fn close(self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        self.rt.block_on(async {
            sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
                .execute(&self.pool)
                .await?;
            tracing::debug!("WAL checkpoint completed");
            self.pool.close().await;
            Ok(())
        })
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        // Best-effort WAL checkpoint. catch_unwind guards against block_on
        // panicking when dropped inside an async context.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            if let Err(e) = self.rt.block_on(async {
                sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
                    .execute(&self.pool)
                    .await
            }) {
                tracing::warn!(error = %e, "WAL checkpoint on drop failed (non-fatal)");
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set_schema_version(store: &Store, version: &str) {
        store
            .rt
            .block_on(async {
                sqlx::query("UPDATE metadata SET value = ?1 WHERE key = 'schema_version'")
                    .bind(version)
                    .execute(&store.pool)
                    .await
            })
            .unwrap();
    }

    #[test]
    fn test_open_fresh_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh.db");
        let store = Store::open(&path).unwrap();
        assert!(path.exists());
        store.init().unwrap();
        assert_eq!(store.path(), path);

        // Every table from schema.sql is usable
        assert!(store.add_association("a.jpg", "cat").unwrap());
        assert_eq!(store.list_tags().unwrap(), vec![TagCount::new("cat", 1)]);
        store.init().unwrap();
        assert_eq!(store.count_files().unwrap(), 1);
    }

    #[test]
    fn test_newer_schema_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("newer.db");
        let store = Store::open(&path).unwrap();
        store.init().unwrap();
        set_schema_version(&store, "99");
        store.close().unwrap();

        assert!(matches!(Store::open(&path), Err(StoreError::SchemaNewer(99))));
    }

    #[test]
    fn test_older_schema_is_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("older.db");
        let store = Store::open(&path).unwrap();
        store.init().unwrap();
        set_schema_version(&store, "0");
        store.close().unwrap();

        match Store::open(&path) {
            Err(StoreError::SchemaMismatch(_, found, expected)) => {
                assert_eq!(found, 0);
                assert_eq!(expected, CURRENT_SCHEMA_VERSION);
            }
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("older schema should not open"),
        }
    }

    #[test]
    fn test_reset_keeps_schema_version() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("r.db")).unwrap();
        store.init().unwrap();
        store.reset(&dir.path().join("r.db.back")).unwrap();
        drop(store);
        assert!(Store::open(&dir.path().join("r.db")).is_ok());
    }
}
