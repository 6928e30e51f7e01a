//! # kbase-db
//!
//! PostgreSQL database layer for kbase.
//!
//! This crate provides:
//! - Environment configuration and the connection pool
//! - Repository implementations for items, tags and tag links
//! - Schema migrations (`migrations` feature)
//!
//! [`Database`] implements every repository trait itself, so an
//! `Arc<Database>` can be handed straight to the editor components.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kbase_db::{Database, DbConfig, TagId, TagLinkSynchronizer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(Database::from_config(&DbConfig::from_env()?).await?);
//!     let sync = TagLinkSynchronizer::new(db);
//!
//!     let item = sync
//!         .create_item_with_tags("Networking Basics", "OSI model", &[TagId(1)])
//!         .await?;
//!     println!("Created item {}", item.id);
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod items;
pub mod tag_links;
pub mod tags;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use async_trait::async_trait;

// Re-export core types
pub use kbase_core::*;

pub use config::{ConfigError, DbConfig};
pub use items::PgItemRepository;
pub use tag_links::PgTagLinkRepository;
pub use tags::PgTagRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Item repository.
    pub items: PgItemRepository,
    /// Taxonomy tag repository.
    pub tags: PgTagRepository,
    /// Item/tag link repository.
    pub tag_links: PgTagLinkRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            items: PgItemRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            tag_links: PgTagLinkRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to `url` with default pool settings.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::from_config(&DbConfig::new(url)).await
    }

    /// Connect using a loaded [`DbConfig`].
    pub async fn from_config(config: &DbConfig) -> Result<Self> {
        Ok(Self::new(config.connect().await?))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[async_trait]
impl ItemRepository for Database {
    async fn list(&self) -> Result<Vec<ItemSummary>> {
        ItemRepository::list(&self.items).await
    }

    async fn fetch(&self, id: ItemId) -> Result<Item> {
        ItemRepository::fetch(&self.items, id).await
    }

    async fn insert(&self, item: NewItem) -> Result<Item> {
        ItemRepository::insert(&self.items, item).await
    }

    async fn update(&self, id: ItemId, item: NewItem) -> Result<Item> {
        ItemRepository::update(&self.items, id, item).await
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        ItemRepository::delete(&self.items, id).await
    }
}

#[async_trait]
impl TagRepository for Database {
    async fn list(&self) -> Result<Vec<Tag>> {
        TagRepository::list(&self.tags).await
    }

    async fn list_by_level(&self, level: TagLevel) -> Result<Vec<Tag>> {
        self.tags.list_by_level(level).await
    }

    async fn fetch(&self, id: TagId) -> Result<Tag> {
        TagRepository::fetch(&self.tags, id).await
    }

    async fn insert(&self, tag: NewTag) -> Result<Tag> {
        TagRepository::insert(&self.tags, tag).await
    }

    async fn update(&self, id: TagId, tag: NewTag) -> Result<Tag> {
        TagRepository::update(&self.tags, id, tag).await
    }

    async fn delete(&self, id: TagId) -> Result<()> {
        TagRepository::delete(&self.tags, id).await
    }
}

#[async_trait]
impl TagLinkRepository for Database {
    async fn get_for_item(&self, item_id: ItemId, limit: usize) -> Result<Vec<Tag>> {
        self.tag_links.get_for_item(item_id, limit).await
    }

    async fn insert_for_item(&self, item_id: ItemId, tag_ids: &[TagId]) -> Result<()> {
        self.tag_links.insert_for_item(item_id, tag_ids).await
    }

    async fn delete_for_item(&self, item_id: ItemId) -> Result<u64> {
        self.tag_links.delete_for_item(item_id).await
    }
}
