//! In-memory repository for tests and offline presentation layers.
//!
//! Implements every repository trait over a locked in-process state with
//! the same referential rules as the PostgreSQL schema:
//!
//! - a link must reference an existing item and tag
//! - an item cannot be deleted while links still reference it
//! - deleting a tag removes its links
//! - inserting an existing (item, tag) pair is ignored
//!
//! Failures can be injected per operation to exercise partial-completion
//! paths, and every call is recorded.
//!
//! ## Usage
//!
//! ```rust
//! use kbase_core::memory::{InMemoryRepository, StoreOp};
//!
//! let repo = InMemoryRepository::new();
//! repo.fail_next(StoreOp::InsertLinks);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::{ItemRepository, TagLinkRepository, TagRepository};

/// Store operation, used for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListItems,
    FetchItem,
    InsertItem,
    UpdateItem,
    DeleteItem,
    ListTags,
    ListTagsByLevel,
    FetchTag,
    InsertTag,
    UpdateTag,
    DeleteTag,
    GetLinks,
    InsertLinks,
    DeleteLinks,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_item_id: i64,
    next_tag_id: i64,
    items: BTreeMap<ItemId, Item>,
    tags: BTreeMap<TagId, Tag>,
    /// Links in insertion order.
    links: Vec<TagLink>,
    pending_failures: HashSet<StoreOp>,
    calls: Vec<StoreOp>,
}

/// Repository backed by process memory.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with a store error.
    pub fn fail_next(&self, op: StoreOp) {
        if let Ok(mut state) = self.state.lock() {
            state.pending_failures.insert(op);
        }
    }

    /// Operations called so far, in order.
    pub fn calls(&self) -> Vec<StoreOp> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.calls.clear();
        }
    }

    /// All link rows for an item, in insertion order.
    pub fn links_for(&self, item_id: ItemId) -> Vec<TagId> {
        self.state
            .lock()
            .map(|s| {
                s.links
                    .iter()
                    .filter(|l| l.item_id == item_id)
                    .map(|l| l.tag_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of link rows.
    pub fn link_count(&self) -> usize {
        self.state.lock().map(|s| s.links.len()).unwrap_or(0)
    }

    /// Lock the state, record the call and apply any injected failure.
    fn begin(&self, op: StoreOp) -> Result<MutexGuard<'_, MemoryState>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Store("in-memory store lock poisoned".to_string()))?;
        state.calls.push(op);
        if state.pending_failures.remove(&op) {
            return Err(Error::Store(format!("injected failure in {:?}", op)));
        }
        Ok(state)
    }
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn list(&self) -> Result<Vec<ItemSummary>> {
        let state = self.begin(StoreOp::ListItems)?;
        Ok(state
            .items
            .values()
            .map(|item| ItemSummary {
                id: item.id,
                title: item.title.clone(),
            })
            .collect())
    }

    async fn fetch(&self, id: ItemId) -> Result<Item> {
        let state = self.begin(StoreOp::FetchItem)?;
        state.items.get(&id).cloned().ok_or(Error::ItemNotFound(id))
    }

    async fn insert(&self, item: NewItem) -> Result<Item> {
        let mut state = self.begin(StoreOp::InsertItem)?;
        state.next_item_id += 1;
        let created = Item {
            id: ItemId(state.next_item_id),
            title: item.title().to_string(),
            text: item.text().to_string(),
        };
        state.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: ItemId, item: NewItem) -> Result<Item> {
        let mut state = self.begin(StoreOp::UpdateItem)?;
        let existing = state.items.get_mut(&id).ok_or(Error::ItemNotFound(id))?;
        existing.title = item.title().to_string();
        existing.text = item.text().to_string();
        Ok(existing.clone())
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        let mut state = self.begin(StoreOp::DeleteItem)?;
        if !state.items.contains_key(&id) {
            return Err(Error::ItemNotFound(id));
        }
        if state.links.iter().any(|l| l.item_id == id) {
            return Err(Error::Store(format!(
                "item {} is still referenced by tag links",
                id
            )));
        }
        state.items.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl TagRepository for InMemoryRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let state = self.begin(StoreOp::ListTags)?;
        Ok(state.tags.values().cloned().collect())
    }

    async fn list_by_level(&self, level: TagLevel) -> Result<Vec<Tag>> {
        let state = self.begin(StoreOp::ListTagsByLevel)?;
        Ok(state
            .tags
            .values()
            .filter(|t| t.level == level)
            .cloned()
            .collect())
    }

    async fn fetch(&self, id: TagId) -> Result<Tag> {
        let state = self.begin(StoreOp::FetchTag)?;
        state.tags.get(&id).cloned().ok_or(Error::TagNotFound(id))
    }

    async fn insert(&self, tag: NewTag) -> Result<Tag> {
        let mut state = self.begin(StoreOp::InsertTag)?;
        state.next_tag_id += 1;
        let created = Tag {
            id: TagId(state.next_tag_id),
            label: tag.label().to_string(),
            level: tag.level(),
        };
        state.tags.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: TagId, tag: NewTag) -> Result<Tag> {
        let mut state = self.begin(StoreOp::UpdateTag)?;
        let existing = state.tags.get_mut(&id).ok_or(Error::TagNotFound(id))?;
        existing.label = tag.label().to_string();
        existing.level = tag.level();
        Ok(existing.clone())
    }

    async fn delete(&self, id: TagId) -> Result<()> {
        let mut state = self.begin(StoreOp::DeleteTag)?;
        if state.tags.remove(&id).is_none() {
            return Err(Error::TagNotFound(id));
        }
        state.links.retain(|l| l.tag_id != id);
        Ok(())
    }
}

#[async_trait]
impl TagLinkRepository for InMemoryRepository {
    async fn get_for_item(&self, item_id: ItemId, limit: usize) -> Result<Vec<Tag>> {
        let state = self.begin(StoreOp::GetLinks)?;
        Ok(state
            .links
            .iter()
            .filter(|l| l.item_id == item_id)
            .filter_map(|l| state.tags.get(&l.tag_id).cloned())
            .take(limit)
            .collect())
    }

    async fn insert_for_item(&self, item_id: ItemId, tag_ids: &[TagId]) -> Result<()> {
        let mut state = self.begin(StoreOp::InsertLinks)?;
        if !state.items.contains_key(&item_id) {
            return Err(Error::ItemNotFound(item_id));
        }
        if let Some(missing) = tag_ids.iter().find(|id| !state.tags.contains_key(*id)) {
            return Err(Error::TagNotFound(*missing));
        }
        for &tag_id in tag_ids {
            let link = TagLink { item_id, tag_id };
            if !state.links.contains(&link) {
                state.links.push(link);
            }
        }
        Ok(())
    }

    async fn delete_for_item(&self, item_id: ItemId) -> Result<u64> {
        let mut state = self.begin(StoreOp::DeleteLinks)?;
        let before = state.links.len();
        state.links.retain(|l| l.item_id != item_id);
        Ok((before - state.links.len()) as u64)
    }
}
