//! Tag-link synchronization for items.
//!
//! [`TagLinkSynchronizer`] keeps an item's link rows consistent with the
//! tag set chosen in the editor, and sequences item create/update/delete
//! with their link side effects.
//!
//! ## Ordering
//!
//! Each operation is a strict sequence of awaited store calls:
//!
//! | Operation | Steps |
//! |-----------|-------|
//! | create | insert item → insert links |
//! | replace tags | delete links → insert links |
//! | update | update item → delete links → insert links |
//! | delete | delete links → delete item |
//!
//! ## Partial completion
//!
//! The store offers no multi-statement atomicity here. A failure after the
//! first step leaves the item with zero (or stale) links and returns the
//! store error unchanged. Every operation is safe to repeat: deleting
//! missing links succeeds and re-inserting an existing pair is ignored.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Item, ItemDetail, ItemId, NewItem, TagId, MAX_TAG_SLOTS};
use crate::traits::{ItemRepository, TagLinkRepository};

/// Remove repeated ids, keeping the first occurrence of each.
pub fn distinct_tag_ids(tag_ids: &[TagId]) -> Vec<TagId> {
    let mut seen = HashSet::with_capacity(tag_ids.len());
    tag_ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Applies item writes together with their tag-link side effects.
pub struct TagLinkSynchronizer<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: ?Sized> Clone for TagLinkSynchronizer<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R> TagLinkSynchronizer<R>
where
    R: ItemRepository + TagLinkRepository + ?Sized,
{
    /// Create a synchronizer over a shared repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Load an item with the tags shown for it (at most [`MAX_TAG_SLOTS`]).
    pub async fn item_detail(&self, item_id: ItemId) -> Result<ItemDetail> {
        let item = ItemRepository::fetch(&*self.repo, item_id).await?;
        let tags = self.repo.get_for_item(item_id, MAX_TAG_SLOTS).await?;
        Ok(ItemDetail { item, tags })
    }

    /// Insert an item, then link it to each distinct desired tag.
    ///
    /// Title and text are validated before any store call. If linking fails
    /// the item stays persisted without links.
    pub async fn create_item_with_tags(
        &self,
        title: &str,
        text: &str,
        desired: &[TagId],
    ) -> Result<Item> {
        let new_item = NewItem::new(title, text)?;
        let start = Instant::now();

        let item = ItemRepository::insert(&*self.repo, new_item).await?;
        debug!(
            subsystem = "core",
            component = "tag_sync",
            op = "create_item",
            item_id = %item.id,
            "Item row inserted"
        );

        let tag_ids = distinct_tag_ids(desired);
        if !tag_ids.is_empty() {
            if let Err(e) = self.repo.insert_for_item(item.id, &tag_ids).await {
                warn!(
                    subsystem = "core",
                    component = "tag_sync",
                    op = "create_item",
                    item_id = %item.id,
                    tag_count = tag_ids.len(),
                    error = %e,
                    "Item created but tag links failed; item has no tags"
                );
                return Err(e);
            }
        }

        info!(
            subsystem = "core",
            component = "tag_sync",
            op = "create_item",
            item_id = %item.id,
            tag_count = tag_ids.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Item created"
        );
        Ok(item)
    }

    /// Make the item's links equal the distinct desired ids.
    ///
    /// Deletes all links, then inserts the new set. If the insert fails the
    /// item is left with zero links.
    pub async fn replace_item_tags(&self, item_id: ItemId, desired: &[TagId]) -> Result<()> {
        let start = Instant::now();
        let removed = self.repo.delete_for_item(item_id).await?;
        debug!(
            subsystem = "core",
            component = "tag_sync",
            op = "replace_tags",
            item_id = %item_id,
            rows_affected = removed,
            "Existing tag links deleted"
        );

        let tag_ids = distinct_tag_ids(desired);
        if !tag_ids.is_empty() {
            if let Err(e) = self.repo.insert_for_item(item_id, &tag_ids).await {
                warn!(
                    subsystem = "core",
                    component = "tag_sync",
                    op = "replace_tags",
                    item_id = %item_id,
                    tag_count = tag_ids.len(),
                    error = %e,
                    "Tag links deleted but re-insert failed; item has no tags"
                );
                return Err(e);
            }
        }

        debug!(
            subsystem = "core",
            component = "tag_sync",
            op = "replace_tags",
            item_id = %item_id,
            tag_count = tag_ids.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tag links replaced"
        );
        Ok(())
    }

    /// Update title and text, then replace the item's links.
    ///
    /// A failure in the link step leaves the new title/text in place.
    pub async fn update_item(
        &self,
        item_id: ItemId,
        title: &str,
        text: &str,
        desired: &[TagId],
    ) -> Result<Item> {
        let new_item = NewItem::new(title, text)?;
        let start = Instant::now();

        let item = ItemRepository::update(&*self.repo, item_id, new_item).await?;
        self.replace_item_tags(item_id, desired).await?;

        info!(
            subsystem = "core",
            component = "tag_sync",
            op = "update_item",
            item_id = %item_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Item updated"
        );
        Ok(item)
    }

    /// Delete an item's links, then the item.
    ///
    /// Links never outlive their item. If the item step fails the item
    /// remains with no tags; calling again finishes the job.
    pub async fn delete_item(&self, item_id: ItemId) -> Result<()> {
        let start = Instant::now();
        let removed = self.repo.delete_for_item(item_id).await?;
        debug!(
            subsystem = "core",
            component = "tag_sync",
            op = "delete_item",
            item_id = %item_id,
            rows_affected = removed,
            "Tag links deleted"
        );

        ItemRepository::delete(&*self.repo, item_id).await?;

        info!(
            subsystem = "core",
            component = "tag_sync",
            op = "delete_item",
            item_id = %item_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Item deleted"
        );
        Ok(())
    }
}
