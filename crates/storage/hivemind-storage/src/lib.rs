//! HiveMind Storage - namespaced key/value persistence
//!
//! Every component of the coordination core persists through the
//! [`KeyValueStore`] trait. Values are arbitrary JSON documents addressed by
//! `namespace + key`; there is no schema beyond that and concurrent writes to
//! the same key are last-writer-wins.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryStore`] for tests and ephemeral runs
//! - [`FileStore`] which keeps one JSON document per namespace on disk

#![warn(missing_docs)]

pub mod backends;
pub mod error;
pub mod factory;
pub mod traits;

pub use backends::{file::FileStore, memory::MemoryStore};
pub use error::{StorageError, StorageResult};
pub use factory::StorageConfig;
pub use traits::{KeyValueStore, KeyValueStoreExt};

/// Well-known namespaces, one per component
pub mod namespaces {
    /// Agent records and in-flight assignments
    pub const AGENTS: &str = "agents";
    /// Decisions, consensus records and the selected algorithm
    pub const CONSENSUS: &str = "consensus";
    /// Objectives and strategies owned by the hive
    pub const HIVE_MIND: &str = "hive-mind";
    /// Monitoring snapshots
    pub const METRICS: &str = "metrics";
    /// Network snapshots
    pub const TOPOLOGY: &str = "topology";
    /// Miscellaneous system state
    pub const SYSTEM: &str = "system";
}
