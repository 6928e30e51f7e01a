//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use kbase_core::{Error, NewTag, Result, Tag, TagId, TagLevel, TagRepository};

/// Columns selected for a tag row.
pub(crate) const TAG_COLUMNS: &str = "tag_id, tag, level";

/// Build a Tag from a row with [`TAG_COLUMNS`].
///
/// A level outside {1, 2} means the row bypassed the schema check and is
/// reported as invalid input.
pub(crate) fn map_row_to_tag(row: &PgRow) -> Result<Tag> {
    let level: i32 = row.get("level");
    Ok(Tag {
        id: TagId(row.get("tag_id")),
        label: row.get("tag"),
        level: TagLevel::try_from(level)?,
    })
}

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query(&format!("SELECT {} FROM tag ORDER BY tag_id", TAG_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(map_row_to_tag).collect()
    }

    async fn list_by_level(&self, level: TagLevel) -> Result<Vec<Tag>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tag WHERE level = $1 ORDER BY tag_id",
            TAG_COLUMNS
        ))
        .bind(level.as_i32())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(map_row_to_tag).collect()
    }

    async fn fetch(&self, id: TagId) -> Result<Tag> {
        let row = sqlx::query(&format!("SELECT {} FROM tag WHERE tag_id = $1", TAG_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::TagNotFound(id))?;

        map_row_to_tag(&row)
    }

    async fn insert(&self, tag: NewTag) -> Result<Tag> {
        let row = sqlx::query(&format!(
            "INSERT INTO tag (tag, level) VALUES ($1, $2) RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(tag.label())
        .bind(tag.level().as_i32())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        map_row_to_tag(&row)
    }

    async fn update(&self, id: TagId, tag: NewTag) -> Result<Tag> {
        let row = sqlx::query(&format!(
            "UPDATE tag SET tag = $2, level = $3 WHERE tag_id = $1 RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(id.0)
        .bind(tag.label())
        .bind(tag.level().as_i32())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::TagNotFound(id))?;

        map_row_to_tag(&row)
    }

    async fn delete(&self, id: TagId) -> Result<()> {
        // taglink rows go with the tag (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM tag WHERE tag_id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TagNotFound(id));
        }
        Ok(())
    }
}
