//! # kbase-core
//!
//! Core types, traits, and abstractions for the kbase knowledge-base editor.
//!
//! This crate provides:
//! - Item, tag and tag-link models with input validation
//! - Repository traits implemented by `kbase-db` and [`memory`]
//! - [`CascadingTagSelector`], the five-slot tag picker state machine
//! - [`TagLinkSynchronizer`], which keeps an item's tag links in step with
//!   item create/update/delete
//! - [`EditSession`] and [`TaxonomyEditor`] for presentation layers

pub mod error;
pub mod logging;
pub mod memory;
pub mod models;
pub mod selector;
pub mod session;
pub mod sync;
pub mod taxonomy;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use memory::{InMemoryRepository, StoreOp};
pub use models::*;
pub use selector::CascadingTagSelector;
pub use session::{EditSession, ItemDraft, SessionState};
pub use sync::{distinct_tag_ids, TagLinkSynchronizer};
pub use taxonomy::{LevelOptions, TaxonomyEditor};
pub use traits::*;
