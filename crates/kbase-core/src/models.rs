//! Core data models for kbase.
//!
//! These types are shared across all kbase crates and represent
//! the core domain entities.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of tags attached through the editor, and the number of
/// tags shown for an item.
pub const MAX_TAG_SLOTS: usize = 5;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Store-assigned item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

/// Store-assigned tag identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TAG TYPES
// =============================================================================

/// Taxonomy tier of a tag.
///
/// Level-1 tags are broad categories, level-2 tags refine them. Stored as
/// the integer 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TagLevel {
    /// Level 1: broad category.
    Category,
    /// Level 2: refinement.
    Refinement,
}

impl TagLevel {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Category => 1,
            Self::Refinement => 2,
        }
    }
}

impl TryFrom<i32> for TagLevel {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        match level {
            1 => Ok(Self::Category),
            2 => Ok(Self::Refinement),
            other => Err(Error::InvalidInput(format!(
                "Tag level must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

impl From<TagLevel> for i32 {
    fn from(level: TagLevel) -> Self {
        level.as_i32()
    }
}

impl std::fmt::Display for TagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

/// A taxonomy tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub label: String,
    pub level: TagLevel,
}

/// Validated input for creating or editing a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTag {
    label: String,
    level: TagLevel,
}

impl NewTag {
    /// Trim and validate a label and raw level.
    ///
    /// Fails with `InvalidInput` for a blank label or a level outside {1, 2}.
    pub fn new(label: &str, level: i32) -> Result<Self> {
        Ok(Self {
            label: require_text("Tag label", label)?,
            level: TagLevel::try_from(level)?,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn level(&self) -> TagLevel {
        self.level
    }
}

// =============================================================================
// ITEM TYPES
// =============================================================================

/// A knowledge-base entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub text: String,
}

/// Row of the item listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub title: String,
}

/// Item together with the tags shown for it (at most [`MAX_TAG_SLOTS`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub item: Item,
    pub tags: Vec<Tag>,
}

impl ItemDetail {
    /// Tag ids in link order, as fed to the tag selector.
    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

/// Validated title and text for inserting or updating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewItem {
    title: String,
    text: String,
}

impl NewItem {
    /// Trim and validate title and text; both must be non-blank.
    pub fn new(title: &str, text: &str) -> Result<Self> {
        Ok(Self {
            title: require_text("Title", title)?,
            text: require_text("Text", text)?,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Association between one item and one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagLink {
    pub item_id: ItemId,
    pub tag_id: TagId,
}

/// Trim `value`, rejecting it when nothing remains.
fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_level_from_i32() {
        assert_eq!(TagLevel::try_from(1).unwrap(), TagLevel::Category);
        assert_eq!(TagLevel::try_from(2).unwrap(), TagLevel::Refinement);
    }

    #[test]
    fn test_tag_level_out_of_range() {
        for raw in [0, 3, -1, 100] {
            let err = TagLevel::try_from(raw).unwrap_err();
            assert!(err.is_validation(), "level {} should be rejected", raw);
        }
    }

    #[test]
    fn test_tag_level_serializes_as_integer() {
        let tag = Tag {
            id: TagId(3),
            label: "Routers".to_string(),
            level: TagLevel::Refinement,
        };
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["level"], 2);
        assert_eq!(json["id"], 3);
    }

    #[test]
    fn test_tag_level_rejects_bad_json() {
        let result = serde_json::from_str::<Tag>(r#"{"id":1,"label":"x","level":9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_item_trims() {
        let item = NewItem::new("  Networking Basics ", "\tbody\n").unwrap();
        assert_eq!(item.title(), "Networking Basics");
        assert_eq!(item.text(), "body");
    }

    #[test]
    fn test_new_item_rejects_blank_fields() {
        assert!(NewItem::new("", "body").unwrap_err().is_validation());
        assert!(NewItem::new("title", "   ").unwrap_err().is_validation());
    }

    #[test]
    fn test_new_tag_validation() {
        let tag = NewTag::new(" Tech ", 1).unwrap();
        assert_eq!(tag.label(), "Tech");
        assert_eq!(tag.level(), TagLevel::Category);

        assert!(NewTag::new("Tech", 3).unwrap_err().is_validation());
        assert!(NewTag::new("  ", 1).unwrap_err().is_validation());
    }

    #[test]
    fn test_item_detail_tag_ids_keep_order() {
        let detail = ItemDetail {
            item: Item {
                id: ItemId(1),
                title: "t".to_string(),
                text: "x".to_string(),
            },
            tags: vec![
                Tag {
                    id: TagId(9),
                    label: "a".to_string(),
                    level: TagLevel::Category,
                },
                Tag {
                    id: TagId(4),
                    label: "b".to_string(),
                    level: TagLevel::Refinement,
                },
            ],
        };
        assert_eq!(detail.tag_ids(), vec![TagId(9), TagId(4)]);
    }
}
