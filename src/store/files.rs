//! File rows and their cached path hints

use sqlx::{Sqlite, Transaction};

use super::helpers::{FileRecord, StoreError};
use super::Store;

type FileRow = (i64, String, Option<String>);

impl From<FileRow> for FileRecord {
    fn from((id, name, path): FileRow) -> Self {
        FileRecord { id, name, path }
    }
}

/// Insert-if-absent then read back, inside the caller's transaction
pub(super) async fn upsert_file(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<(FileRecord, bool), StoreError> {
    let inserted = sqlx::query("INSERT INTO files (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::from_write)?
        .rows_affected();

    let row: FileRow = sqlx::query_as("SELECT id, name, path FROM files WHERE name = ?1")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

    Ok((row.into(), inserted > 0))
}

impl Store {
    /// Return the file row for `name`, creating it (with no path) if absent
    pub fn get_or_create_file(&self, name: &str) -> Result<FileRecord, StoreError> {
        let result = self.get_or_create_file_once(name);
        match result {
            Err(StoreError::IntegrityViolation(msg)) => {
                tracing::debug!(file = name, error = %msg, "get_or_create_file conflict, retrying");
                self.get_or_create_file_once(name)
            }
            other => other,
        }
    }

    fn get_or_create_file_once(&self, name: &str) -> Result<FileRecord, StoreError> {
        let _guard = self.write_guard();
        self.rt.block_on(async {
            let mut tx = self.pool.begin().await?;
            let (file, created) = upsert_file(&mut tx, name).await?;
            tx.commit().await?;
            if created {
                tracing::debug!(file = name, "Created file row");
            }
            Ok(file)
        })
    }

    /// Look up a file row without creating it
    pub fn file(&self, name: &str) -> Result<Option<FileRecord>, StoreError> {
        self.rt.block_on(async {
            let row: Option<FileRow> =
                sqlx::query_as("SELECT id, name, path FROM files WHERE name = ?1")
                    .bind(name)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row.map(FileRecord::from))
        })
    }

    /// Upsert the cached path hint for a file
    ///
    /// Store-level only: callers holding a lookup cache must also invalidate
    /// the file's resolved-path entry (`TagIndex::set_file_path` does both).
    pub fn set_file_path(&self, name: &str, path: &str) -> Result<(), StoreError> {
        let _guard = self.write_guard();
        self.rt.block_on(async {
            let mut tx = self.pool.begin().await?;
            let (file, _) = upsert_file(&mut tx, name).await?;
            sqlx::query("UPDATE files SET path = ?1 WHERE id = ?2")
                .bind(path)
                .bind(file.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(())
        })
    }

    /// Delete a file and, through the foreign key cascade, all its associations
    ///
    /// Returns the number of file rows deleted (0 when the name is unknown).
    pub fn delete_file(&self, name: &str) -> Result<u64, StoreError> {
        let _guard = self.write_guard();
        self.rt.block_on(async {
            let result = sqlx::query("DELETE FROM files WHERE name = ?1")
                .bind(name)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        })
    }

    /// Number of file rows in the index
    pub fn count_files(&self) -> Result<i64, StoreError> {
        self.rt.block_on(async {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
                .fetch_one(&self.pool)
                .await?;
            Ok(count)
        })
    }
}
