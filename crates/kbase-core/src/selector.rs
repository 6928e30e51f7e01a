//! Cascading multi-slot tag selector.
//!
//! Models "pick up to five tags" as a fixed arena of slots with a moving
//! visibility boundary:
//!
//! - slot 0 offers level-1 (category) tags, slots 1–4 offer level-2 tags
//! - filling the last visible slot reveals the next one
//! - clearing a slot hides and clears every slot after it
//!
//! Invariant: `1 <= visible_count <= MAX_TAG_SLOTS`, and every slot at or
//! beyond `visible_count` is empty.

use serde::Serialize;
use tracing::trace;

use crate::error::{Error, Result};
use crate::models::{Tag, TagId, TagLevel, MAX_TAG_SLOTS};

/// Index of the last slot.
const LAST_SLOT: usize = MAX_TAG_SLOTS - 1;

/// Slot state for one add/edit session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadingTagSelector {
    slots: [Option<TagId>; MAX_TAG_SLOTS],
    visible_count: usize,
}

impl Default for CascadingTagSelector {
    fn default() -> Self {
        Self::init_empty()
    }
}

impl CascadingTagSelector {
    /// Fresh selector for an add flow: one visible, empty slot.
    pub fn init_empty() -> Self {
        Self {
            slots: [None; MAX_TAG_SLOTS],
            visible_count: 1,
        }
    }

    /// Selector pre-filled from an item's existing tags.
    ///
    /// Takes the first five ids in order and offers one extra empty slot
    /// unless all five are filled.
    pub fn init_from(existing: &[TagId]) -> Self {
        let mut selector = Self::init_empty();
        let filled = existing.len().min(MAX_TAG_SLOTS);
        for (slot, id) in selector.slots.iter_mut().zip(existing.iter().take(filled)) {
            *slot = Some(*id);
        }
        selector.visible_count = (filled + 1).min(MAX_TAG_SLOTS);
        selector
    }

    /// Number of slots currently offered.
    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// All five slots, including hidden (always empty) ones.
    pub fn slots(&self) -> &[Option<TagId>; MAX_TAG_SLOTS] {
        &self.slots
    }

    /// The slots currently offered to the user.
    pub fn visible_slots(&self) -> &[Option<TagId>] {
        &self.slots[..self.visible_count]
    }

    /// Value of one slot.
    pub fn slot(&self, index: usize) -> Result<Option<TagId>> {
        check_index(index)?;
        Ok(self.slots[index])
    }

    /// Record a user change to a visible slot and apply the cascade.
    ///
    /// Writing to a hidden slot is rejected, since hidden slots must stay
    /// empty.
    pub fn set_slot(&mut self, index: usize, value: Option<TagId>) -> Result<()> {
        check_index(index)?;
        if index >= self.visible_count {
            return Err(Error::Precondition(format!(
                "slot {} is hidden (visible_count = {})",
                index, self.visible_count
            )));
        }
        self.slots[index] = value;
        self.on_slot_changed(index)
    }

    /// Apply the cascade after `slots[index]` changed.
    ///
    /// Clearing any slot but the last truncates everything after it.
    /// Filling the last visible slot reveals one more, up to the cap.
    pub fn on_slot_changed(&mut self, index: usize) -> Result<()> {
        check_index(index)?;

        if self.slots[index].is_none() && index < LAST_SLOT {
            for slot in &mut self.slots[index + 1..] {
                *slot = None;
            }
            self.visible_count = index + 1;
        } else if self.slots[index].is_some()
            && self.visible_count < MAX_TAG_SLOTS
            && index == self.visible_count - 1
        {
            self.visible_count += 1;
        }

        trace!(
            subsystem = "core",
            component = "selector",
            slot = index,
            visible_count = self.visible_count,
            "Slot changed"
        );
        Ok(())
    }

    /// Chosen tag ids in slot order. Duplicates are kept.
    pub fn selected_tag_ids(&self) -> Vec<TagId> {
        self.visible_slots().iter().flatten().copied().collect()
    }

    /// Taxonomy level a slot accepts.
    pub fn required_level(index: usize) -> Result<TagLevel> {
        check_index(index)?;
        Ok(if index == 0 {
            TagLevel::Category
        } else {
            TagLevel::Refinement
        })
    }

    /// Options offered for a slot: `level1` for slot 0, `level2` otherwise.
    pub fn allowed_tags_for<'a>(
        index: usize,
        level1: &'a [Tag],
        level2: &'a [Tag],
    ) -> Result<&'a [Tag]> {
        Ok(match Self::required_level(index)? {
            TagLevel::Category => level1,
            TagLevel::Refinement => level2,
        })
    }
}

fn check_index(index: usize) -> Result<()> {
    if index >= MAX_TAG_SLOTS {
        return Err(Error::Precondition(format!(
            "slot index {} out of range (max {})",
            index, LAST_SLOT
        )));
    }
    Ok(())
}
