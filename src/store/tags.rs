//! Tags, file-tag associations and aggregate counts

use sqlx::{Sqlite, Transaction};

use super::files::upsert_file;
use super::helpers::{StoreError, TagCount, TagRecord};
use super::Store;

async fn upsert_tag(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<(TagRecord, bool), StoreError> {
    let inserted = sqlx::query("INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .execute(&mut **tx)
        .await
        .map_err(StoreError::from_write)?
        .rows_affected();

    let (id, name): (i64, String) = sqlx::query_as("SELECT id, name FROM tags WHERE name = ?1")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

    Ok((TagRecord { id, name }, inserted > 0))
}

impl Store {
    /// Return the tag row for `name`, creating it if absent
    pub fn get_or_create_tag(&self, name: &str) -> Result<TagRecord, StoreError> {
        match self.get_or_create_tag_once(name) {
            Err(StoreError::IntegrityViolation(msg)) => {
                tracing::debug!(tag = name, error = %msg, "get_or_create_tag conflict, retrying");
                self.get_or_create_tag_once(name)
            }
            other => other,
        }
    }

    fn get_or_create_tag_once(&self, name: &str) -> Result<TagRecord, StoreError> {
        let _guard = self.write_guard();
        self.rt.block_on(async {
            let mut tx = self.pool.begin().await?;
            let (tag, _) = upsert_tag(&mut tx, name).await?;
            tx.commit().await?;
            Ok(tag)
        })
    }

    /// Link a file to a tag, creating either side as needed
    ///
    /// Returns `true` when a new association was created, `false` when the
    /// file already carried the tag.
    pub fn add_association(&self, filename: &str, tagname: &str) -> Result<bool, StoreError> {
        match self.add_association_once(filename, tagname) {
            Err(StoreError::IntegrityViolation(msg)) => {
                tracing::debug!(
                    file = filename,
                    tag = tagname,
                    error = %msg,
                    "add_association conflict, retrying"
                );
                self.add_association_once(filename, tagname)
            }
            other => other,
        }
    }

    fn add_association_once(&self, filename: &str, tagname: &str) -> Result<bool, StoreError> {
        let _guard = self.write_guard();
        self.rt.block_on(async {
            let mut tx = self.pool.begin().await?;
            let (file, _) = upsert_file(&mut tx, filename).await?;
            let (tag, _) = upsert_tag(&mut tx, tagname).await?;
            let inserted = sqlx::query(
                "INSERT INTO file_tags (file_id, tag_id) VALUES (?1, ?2)
                 ON CONFLICT(file_id, tag_id) DO NOTHING",
            )
            .bind(file.id)
            .bind(tag.id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_write)?
            .rows_affected();
            tx.commit().await?;
            Ok(inserted > 0)
        })
    }

    /// Unlink a file from a tag
    ///
    /// Returns the number of association rows deleted; 0 when the file, the
    /// tag or the link does not exist.
    pub fn remove_association(&self, filename: &str, tagname: &str) -> Result<u64, StoreError> {
        let _guard = self.write_guard();
        self.rt.block_on(async {
            let result = sqlx::query(
                "DELETE FROM file_tags
                 WHERE file_id = (SELECT id FROM files WHERE name = ?1)
                   AND tag_id = (SELECT id FROM tags WHERE name = ?2)",
            )
            .bind(filename)
            .bind(tagname)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected())
        })
    }

    /// Every tag with its file count, ordered by name
    ///
    /// Tags no file references any more are still listed, with a count of 0.
    pub fn list_tags(&self) -> Result<Vec<TagCount>, StoreError> {
        self.rt.block_on(async {
            let rows: Vec<(String, i64)> = sqlx::query_as(
                "SELECT t.name, COUNT(ft.id) AS file_count
                 FROM tags t
                 LEFT OUTER JOIN file_tags ft ON ft.tag_id = t.id
                 GROUP BY t.id, t.name
                 ORDER BY t.name ASC",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows
                .into_iter()
                .map(|(name, count)| TagCount::new(name, count))
                .collect())
        })
    }

    /// Names of files carrying `tagname`, sorted; empty for an unknown tag
    pub fn list_files_for_tag(&self, tagname: &str) -> Result<Vec<String>, StoreError> {
        self.rt.block_on(async {
            let rows: Vec<(String,)> = sqlx::query_as(
                "SELECT f.name
                 FROM files f
                 JOIN file_tags ft ON ft.file_id = f.id
                 JOIN tags t ON t.id = ft.tag_id
                 WHERE t.name = ?1
                 ORDER BY f.name ASC",
            )
            .bind(tagname)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(|(name,)| name).collect())
        })
    }

    /// Tags on a file ordered by name, each with its overall file count
    ///
    /// One aggregate query per tag; callers are expected to cache the result.
    pub fn list_tags_for_file(&self, filename: &str) -> Result<Vec<TagCount>, StoreError> {
        let names: Vec<String> = self.rt.block_on(async {
            let rows: Vec<(String,)> = sqlx::query_as(
                "SELECT t.name
                 FROM tags t
                 JOIN file_tags ft ON ft.tag_id = t.id
                 JOIN files f ON f.id = ft.file_id
                 WHERE f.name = ?1
                 ORDER BY t.name ASC",
            )
            .bind(filename)
            .fetch_all(&self.pool)
            .await?;
            Ok::<_, StoreError>(rows.into_iter().map(|(name,)| name).collect())
        })?;
        tracing::debug!(file = filename, count = names.len(), "Got tags for file");

        names
            .into_iter()
            .map(|name| {
                let count = self.count_files_for_tag(&name)?;
                Ok(TagCount::new(name, count))
            })
            .collect()
    }

    /// Number of files carrying `tagname`; 0 for an unknown tag
    pub fn count_files_for_tag(&self, tagname: &str) -> Result<i64, StoreError> {
        self.rt.block_on(async {
            let (count,): (i64,) = sqlx::query_as(
                "SELECT COUNT(ft.id)
                 FROM file_tags ft
                 JOIN tags t ON t.id = ft.tag_id
                 WHERE t.name = ?1",
            )
            .bind(tagname)
            .fetch_one(&self.pool)
            .await?;
            Ok(count)
        })
    }
}
