//! # kvtable
//!
//! Tables with auto-incrementing primary keys on top of a flat key-value store:
//! - Idempotent, per-name table handles from an explicit registry
//! - Create/read/update/delete, count and truncate
//! - Ordered, paginated retrieval ("slots") by pkey or by a custom comparator
//! - A persistent, crash-recovering log store, or a volatile in-memory one
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TableRegistry                            │
//! │               (one Table per name, shared)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Table<T>                               │
//! │     key encoding · pkey counter · CRUD · scan/sort/slice     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  get / set / remove / keys
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ MemoryStore │          │  LogStore   │
//!   │  (RwLock)   │          │ (log+index) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use kvtable::{MemoryStore, OrderBy, OrderedRetrieval, TableRegistry};
//!
//! let registry = TableRegistry::new(Arc::new(MemoryStore::new()));
//! let todos = registry.table::<String>("todos")?;
//!
//! let pkey = todos.create(&"buy milk".to_string())?;
//! assert_eq!(pkey, 0);
//! assert_eq!(todos.read(pkey)?, Some("buy milk".to_string()));
//!
//! let page = todos.slot(0, 10, &OrderBy::Descending)?;
//! assert_eq!(page.len(), 1);
//! # Ok::<(), kvtable::TableError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod table;
pub mod registry;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TableError};
pub use config::{Config, SyncStrategy};
pub use store::{KeyValueStore, LogStore, MemoryStore};
pub use table::{OrderBy, OrderedRetrieval, PrimaryKey, Record, Table};
pub use registry::TableRegistry;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvtable
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
