//! Structured logging schema for kbase.
//!
//! Events are emitted with `tracing` macros using the field names below, so
//! log aggregation can query by the same names in every subsystem.
//!
//! ## Fields
//!
//! | Field | Meaning | Emitted by |
//! |-------|---------|------------|
//! | `subsystem` | `"core"` or `"db"` | everything |
//! | `component` | `tag_sync`, `selector`, `session`, `taxonomy`, `tag_links`, `config`, `migrate` | everything |
//! | `op` | logical operation (`create_item`, `replace_tags`, `delete_item`, `connect`, ...) | sync, taxonomy, config, migrate |
//! | `item_id` | item being written | sync, tag links |
//! | `tag_id`, `level` | tag being written | taxonomy |
//! | `tag_count` | distinct tag ids requested | sync |
//! | `rows_affected` | rows touched by a link statement | sync, tag links |
//! | `slot`, `visible_count` | selector slot and how many are shown | selector |
//! | `from`, `to` | session state change | session |
//! | `max_connections`, `min_connections`, `pool_size` | pool bounds and size | config |
//! | `duration_ms` | wall-clock duration of a completed operation | sync, config, migrate |
//! | `error` | failure message | sync |
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Multi-step operation failed part way; item left with stale or empty links |
//! | INFO  | Lifecycle events (connect, migrations), completed item and tag writes |
//! | DEBUG | Individual store steps, session transitions, configuration |
//! | TRACE | Selector slot changes, link row counts |
