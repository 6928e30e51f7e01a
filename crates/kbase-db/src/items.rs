//! Item repository implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use kbase_core::{Error, Item, ItemId, ItemRepository, ItemSummary, NewItem, Result};

/// PostgreSQL implementation of ItemRepository.
#[derive(Clone)]
pub struct PgItemRepository {
    pool: Pool<Postgres>,
}

impl PgItemRepository {
    /// Create a new PgItemRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_item(row: PgRow) -> Item {
    Item {
        id: ItemId(row.get("item_id")),
        title: row.get("title"),
        text: row.get("text"),
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn list(&self) -> Result<Vec<ItemSummary>> {
        let rows = sqlx::query("SELECT item_id, title FROM item ORDER BY item_id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let items = rows
            .into_iter()
            .map(|row| ItemSummary {
                id: ItemId(row.get("item_id")),
                title: row.get("title"),
            })
            .collect();
        Ok(items)
    }

    async fn fetch(&self, id: ItemId) -> Result<Item> {
        sqlx::query("SELECT item_id, title, text FROM item WHERE item_id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .map(map_row_to_item)
            .ok_or(Error::ItemNotFound(id))
    }

    async fn insert(&self, item: NewItem) -> Result<Item> {
        let row = sqlx::query(
            "INSERT INTO item (title, text) VALUES ($1, $2) RETURNING item_id, title, text",
        )
        .bind(item.title())
        .bind(item.text())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_row_to_item(row))
    }

    async fn update(&self, id: ItemId, item: NewItem) -> Result<Item> {
        sqlx::query(
            "UPDATE item SET title = $2, text = $3 WHERE item_id = $1
             RETURNING item_id, title, text",
        )
        .bind(id.0)
        .bind(item.title())
        .bind(item.text())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .map(map_row_to_item)
        .ok_or(Error::ItemNotFound(id))
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        let result = sqlx::query("DELETE FROM item WHERE item_id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ItemNotFound(id));
        }
        Ok(())
    }
}
