//! Item/tag link repository implementation.
//!
//! Inserting a pair that already exists is ignored (`ON CONFLICT DO
//! NOTHING`), so link inserts can be repeated after a partial failure.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::trace;

use kbase_core::{Error, ItemId, Result, Tag, TagId, TagLinkRepository};

use crate::tags::map_row_to_tag;

/// PostgreSQL implementation of TagLinkRepository.
#[derive(Clone)]
pub struct PgTagLinkRepository {
    pool: Pool<Postgres>,
}

impl PgTagLinkRepository {
    /// Create a new PgTagLinkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagLinkRepository for PgTagLinkRepository {
    async fn get_for_item(&self, item_id: ItemId, limit: usize) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.tag_id, t.tag, t.level
            FROM taglink l
            JOIN tag t ON t.tag_id = l.tag_id
            WHERE l.item_id = $1
            ORDER BY l.seq
            LIMIT $2
            "#,
        )
        .bind(item_id.0)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(map_row_to_tag).collect()
    }

    async fn insert_for_item(&self, item_id: ItemId, tag_ids: &[TagId]) -> Result<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }
        let raw_ids: Vec<i64> = tag_ids.iter().map(|id| id.0).collect();

        // Single statement; identity values follow the ordinality so that
        // link order matches the request.
        let result = sqlx::query(
            r#"
            INSERT INTO taglink (item_id, tag_id)
            SELECT $1, t.tag_id
            FROM UNNEST($2::bigint[]) WITH ORDINALITY AS t(tag_id, ord)
            ORDER BY t.ord
            ON CONFLICT (item_id, tag_id) DO NOTHING
            "#,
        )
        .bind(item_id.0)
        .bind(&raw_ids)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        trace!(
            subsystem = "db",
            component = "tag_links",
            item_id = %item_id,
            rows_affected = result.rows_affected(),
            "Inserted tag links"
        );
        Ok(())
    }

    async fn delete_for_item(&self, item_id: ItemId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM taglink WHERE item_id = $1")
            .bind(item_id.0)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
