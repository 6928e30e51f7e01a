//! Core traits for kbase abstractions.
//!
//! These traits define the store contract that concrete implementations
//! (PostgreSQL in `kbase-db`, in-memory in [`crate::memory`]) must satisfy.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// ITEM REPOSITORY TRAITS
// =============================================================================

/// Repository for item CRUD operations.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// List all items, ordered by id.
    async fn list(&self) -> Result<Vec<ItemSummary>>;

    /// Fetch a full item by ID. Fails with `ItemNotFound` if absent.
    async fn fetch(&self, id: ItemId) -> Result<Item>;

    /// Insert a new item and return it with its generated id.
    async fn insert(&self, item: NewItem) -> Result<Item>;

    /// Replace title and text. Fails with `ItemNotFound` if absent.
    async fn update(&self, id: ItemId, item: NewItem) -> Result<Item>;

    /// Delete the item row. Fails with `ItemNotFound` if absent.
    ///
    /// Callers must remove the item's tag links first.
    async fn delete(&self, id: ItemId) -> Result<()>;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Repository for taxonomy tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// List all tags, ordered by id.
    async fn list(&self) -> Result<Vec<Tag>>;

    /// List tags of one level, ordered by id.
    async fn list_by_level(&self, level: TagLevel) -> Result<Vec<Tag>>;

    /// Fetch a tag by ID. Fails with `TagNotFound` if absent.
    async fn fetch(&self, id: TagId) -> Result<Tag>;

    /// Insert a new tag.
    async fn insert(&self, tag: NewTag) -> Result<Tag>;

    /// Replace label and level. Fails with `TagNotFound` if absent.
    async fn update(&self, id: TagId, tag: NewTag) -> Result<Tag>;

    /// Delete a tag; links referencing it are removed with it.
    async fn delete(&self, id: TagId) -> Result<()>;
}

// =============================================================================
// TAG LINK REPOSITORY TRAITS
// =============================================================================

/// Repository for item/tag association rows.
#[async_trait]
pub trait TagLinkRepository: Send + Sync {
    /// Tags linked to an item, in link order, truncated to `limit`.
    async fn get_for_item(&self, item_id: ItemId, limit: usize) -> Result<Vec<Tag>>;

    /// Insert one link per id. Pairs that already exist are ignored.
    async fn insert_for_item(&self, item_id: ItemId, tag_ids: &[TagId]) -> Result<()>;

    /// Delete every link of an item, returning how many were removed.
    ///
    /// Succeeds when the item has no links (or does not exist).
    async fn delete_for_item(&self, item_id: ItemId) -> Result<u64>;
}

/// Everything the editor needs from a store.
pub trait Repository: ItemRepository + TagRepository + TagLinkRepository {}

impl<T> Repository for T where T: ItemRepository + TagRepository + TagLinkRepository {}
