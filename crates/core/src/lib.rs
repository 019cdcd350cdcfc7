//! Snapshot model and storage ports for snapkeep
//!
//! This crate provides:
//! - Snapshot identities (four-level `YYYY/MM/DD/serial` paths)
//! - Inventory tokenization of store listings
//! - Settings loading and validation
//! - The `SnapshotStore` port (filesystem, in-memory and dry-run)

pub mod config;
pub mod error;
pub mod fs_store;
pub mod identity;
pub mod inventory;
pub mod memory;
pub mod store;

// Re-exports
pub use config::{ActionKind, Backend, FilterRule, RetentionSettings, Settings, SourceSpec};
pub use error::{Error, Result};
pub use fs_store::FsStore;
pub use identity::SnapshotIdentity;
pub use inventory::{load_inventory, newest_first, tokenize};
pub use memory::MemoryStore;
pub use store::{DryRunStore, SnapshotStore};
