//! Per-item edit session state machine.
//!
//! ```text
//! Viewing ──begin_edit──▶ Editing ──save──▶ Saving ──ok──▶ Viewing
//!    ▲                      │  ▲                 │
//!    └──────cancel──────────┘  └─────failure─────┘
//! ```
//!
//! An add flow starts in `Editing` with no item. `Saving` is not re-entrant:
//! save or delete requests while it is set are rejected. A successful delete
//! ends in `Closed`.
//!
//! The session owns its [`CascadingTagSelector`]; the selector is created on
//! entering `Editing` and dropped on cancel or successful save.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ItemDetail, ItemId};
use crate::selector::CascadingTagSelector;
use crate::sync::TagLinkSynchronizer;
use crate::traits::{ItemRepository, TagLinkRepository};

/// Where an edit session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Viewing,
    Editing,
    Saving,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Viewing => write!(f, "viewing"),
            Self::Editing => write!(f, "editing"),
            Self::Saving => write!(f, "saving"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Unsaved title and text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemDraft {
    pub title: String,
    pub text: String,
}

/// Edit or add session for a single item.
pub struct EditSession<R: ?Sized> {
    sync: TagLinkSynchronizer<R>,
    state: SessionState,
    detail: Option<ItemDetail>,
    draft: ItemDraft,
    selector: Option<CascadingTagSelector>,
}

impl<R> EditSession<R>
where
    R: ItemRepository + TagLinkRepository + ?Sized,
{
    /// Load an existing item for viewing.
    pub async fn open(sync: TagLinkSynchronizer<R>, item_id: ItemId) -> Result<Self> {
        let detail = sync.item_detail(item_id).await?;
        Ok(Self {
            sync,
            state: SessionState::Viewing,
            detail: Some(detail),
            draft: ItemDraft::default(),
            selector: None,
        })
    }

    /// Start an add flow: empty draft, one empty tag slot.
    pub fn new_item(sync: TagLinkSynchronizer<R>) -> Self {
        Self {
            sync,
            state: SessionState::Editing,
            detail: None,
            draft: ItemDraft::default(),
            selector: Some(CascadingTagSelector::init_empty()),
        }
    }

    /// Current state of the session.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The persisted item, if any.
    pub fn detail(&self) -> Option<&ItemDetail> {
        self.detail.as_ref()
    }

    /// Id of the persisted item; `None` in an unsaved add flow.
    pub fn item_id(&self) -> Option<ItemId> {
        self.detail.as_ref().map(|d| d.item.id)
    }

    /// Unsaved title and text.
    pub fn draft(&self) -> &ItemDraft {
        &self.draft
    }

    /// Mutable draft; only while editing.
    pub fn draft_mut(&mut self) -> Result<&mut ItemDraft> {
        self.expect_state(SessionState::Editing, "edit the draft")?;
        Ok(&mut self.draft)
    }

    /// Tag selector, present only while editing.
    pub fn selector(&self) -> Option<&CascadingTagSelector> {
        self.selector.as_ref()
    }

    /// Mutable tag selector; only while editing.
    pub fn selector_mut(&mut self) -> Result<&mut CascadingTagSelector> {
        self.expect_state(SessionState::Editing, "change tags")?;
        self.selector
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no tag selector in this session".to_string()))
    }

    /// Enter editing with the draft and selector filled from the item.
    pub fn begin_edit(&mut self) -> Result<()> {
        self.expect_state(SessionState::Viewing, "begin editing")?;
        let detail = self
            .detail
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no item loaded".to_string()))?;
        self.draft = ItemDraft {
            title: detail.item.title.clone(),
            text: detail.item.text.clone(),
        };
        self.selector = Some(CascadingTagSelector::init_from(&detail.tag_ids()));
        self.transition(SessionState::Editing);
        Ok(())
    }

    /// Discard the draft.
    ///
    /// Editing an existing item returns to viewing; an add flow starts over
    /// with an empty draft.
    pub fn cancel(&mut self) -> Result<()> {
        self.expect_state(SessionState::Editing, "cancel")?;
        self.draft = ItemDraft::default();
        if self.detail.is_some() {
            self.selector = None;
            self.transition(SessionState::Viewing);
        } else {
            self.selector = Some(CascadingTagSelector::init_empty());
        }
        Ok(())
    }

    /// Persist the draft and selected tags.
    ///
    /// On failure the session returns to `Editing` with the draft intact,
    /// also when the returned future is dropped before it completes.
    /// On success it moves to `Viewing` and reloads the item; a failed
    /// reload is returned as an error but the write stays committed.
    pub async fn save(&mut self) -> Result<ItemId> {
        if self.state == SessionState::Saving {
            return Err(Error::InvalidState(
                "a save is already in progress".to_string(),
            ));
        }
        self.expect_state(SessionState::Editing, "save")?;

        let tag_ids = self
            .selector
            .as_ref()
            .map(CascadingTagSelector::selected_tag_ids)
            .unwrap_or_default();
        let existing = self.item_id();

        let written = {
            let _in_flight = InFlight::enter(&mut self.state, SessionState::Editing);
            match existing {
                Some(id) => {
                    self.sync
                        .update_item(id, &self.draft.title, &self.draft.text, &tag_ids)
                        .await
                }
                None => {
                    self.sync
                        .create_item_with_tags(&self.draft.title, &self.draft.text, &tag_ids)
                        .await
                }
            }
        };
        let item = written?;

        let id = item.id;
        self.detail = Some(ItemDetail {
            item,
            tags: Vec::new(),
        });
        self.draft = ItemDraft::default();
        self.selector = None;
        self.transition(SessionState::Viewing);

        self.refresh().await?;
        Ok(id)
    }

    /// Reload the item and its tags while viewing.
    pub async fn refresh(&mut self) -> Result<()> {
        self.expect_state(SessionState::Viewing, "refresh")?;
        let id = self
            .item_id()
            .ok_or_else(|| Error::InvalidState("no item loaded".to_string()))?;
        self.detail = Some(self.sync.item_detail(id).await?);
        Ok(())
    }

    /// Delete the item and its links, closing the session.
    ///
    /// On failure, or if the future is dropped mid-delete, the session
    /// returns to the state it was in.
    pub async fn delete(&mut self) -> Result<()> {
        let previous = self.state;
        if !matches!(previous, SessionState::Viewing | SessionState::Editing) {
            return Err(Error::InvalidState(format!(
                "cannot delete while {}",
                previous
            )));
        }
        let id = self
            .item_id()
            .ok_or_else(|| Error::InvalidState("item has not been saved".to_string()))?;

        {
            let _in_flight = InFlight::enter(&mut self.state, previous);
            self.sync.delete_item(id).await?;
        }

        self.detail = None;
        self.selector = None;
        self.draft = ItemDraft::default();
        self.transition(SessionState::Closed);
        Ok(())
    }

    fn expect_state(&self, expected: SessionState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(Error::InvalidState(format!(
                "cannot {} while {}",
                action, self.state
            )));
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            subsystem = "core",
            component = "session",
            from = %self.state,
            to = %next,
            "Session state change"
        );
        self.state = next;
    }
}

/// Holds a session in `Saving` for the length of one store sequence.
///
/// Dropping it puts the session back in `restore`, whether the sequence
/// finished, failed or was abandoned at an await point.
struct InFlight<'a> {
    state: &'a mut SessionState,
    restore: SessionState,
}

impl<'a> InFlight<'a> {
    fn enter(state: &'a mut SessionState, restore: SessionState) -> Self {
        debug!(
            subsystem = "core",
            component = "session",
            from = %state,
            to = %SessionState::Saving,
            "Session state change"
        );
        *state = SessionState::Saving;
        Self { state, restore }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        debug!(
            subsystem = "core",
            component = "session",
            from = %self.state,
            to = %self.restore,
            "Session state change"
        );
        *self.state = self.restore;
    }
}
