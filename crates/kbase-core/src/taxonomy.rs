//! Tag taxonomy management.
//!
//! Label and level are validated here, before anything is submitted to the
//! store. Deleting a tag also removes every link to it.

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::models::{NewTag, Tag, TagId, TagLevel};
use crate::traits::TagRepository;

/// Tag lists for the cascading selector, split by level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelOptions {
    /// Offered in slot 0.
    pub level1: Vec<Tag>,
    /// Offered in slots 1–4.
    pub level2: Vec<Tag>,
}

/// Create, edit and delete taxonomy tags.
pub struct TaxonomyEditor<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: ?Sized> Clone for TaxonomyEditor<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R> TaxonomyEditor<R>
where
    R: TagRepository + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// All tags, ordered by id.
    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        TagRepository::list(&*self.repo).await
    }

    /// Tags of one level, ordered by id.
    pub async fn tags_by_level(&self, level: TagLevel) -> Result<Vec<Tag>> {
        self.repo.list_by_level(level).await
    }

    /// Both level lists, fetched one after the other.
    pub async fn level_options(&self) -> Result<LevelOptions> {
        let level1 = self.repo.list_by_level(TagLevel::Category).await?;
        let level2 = self.repo.list_by_level(TagLevel::Refinement).await?;
        Ok(LevelOptions { level1, level2 })
    }

    /// Validate and insert a tag.
    pub async fn add_tag(&self, label: &str, level: i32) -> Result<Tag> {
        let new_tag = NewTag::new(label, level)?;
        let tag = TagRepository::insert(&*self.repo, new_tag).await?;
        info!(
            subsystem = "core",
            component = "taxonomy",
            op = "add_tag",
            tag_id = %tag.id,
            level = tag.level.as_i32(),
            "Tag added"
        );
        Ok(tag)
    }

    /// Validate and replace a tag's label and level.
    pub async fn update_tag(&self, id: TagId, label: &str, level: i32) -> Result<Tag> {
        let new_tag = NewTag::new(label, level)?;
        let tag = TagRepository::update(&*self.repo, id, new_tag).await?;
        info!(
            subsystem = "core",
            component = "taxonomy",
            op = "update_tag",
            tag_id = %tag.id,
            level = tag.level.as_i32(),
            "Tag updated"
        );
        Ok(tag)
    }

    /// Delete a tag and, with it, every link to it.
    pub async fn delete_tag(&self, id: TagId) -> Result<()> {
        TagRepository::delete(&*self.repo, id).await?;
        info!(
            subsystem = "core",
            component = "taxonomy",
            op = "delete_tag",
            tag_id = %id,
            "Tag deleted"
        );
        Ok(())
    }
}
