//! # HiveMind Topology
//!
//! Builds and maintains the communication graph between agents. Four shapes
//! are supported, each with its own construction rule and metric profile:
//!
//! ```text
//!   mesh            hierarchical          ring           star
//!  A───B           C₀──────C₁          A──B            B   C
//!  │╲ ╱│          ╱│╲      ╱│╲         │  │             ╲ ╱
//!  │ ╳ │         w w w    w w w        D──C          D──H──E
//!  │╱ ╲│
//!  D───C
//! ```
//!
//! The [`TopologyManager`] owns the active shape and the current [`Network`],
//! rebuilding connections whenever agents join or leave.

pub mod error;
pub mod manager;
pub mod shapes;
pub mod types;

pub use error::{TopologyError, TopologyResult};
pub use manager::TopologyManager;
pub use shapes::{
    shape_for, HierarchicalTopology, MeshTopology, RingTopology, StarTopology, TopologyShape,
};
pub use types::*;

/// Agents per coordinator slot in the hierarchical layout (one coordinator
/// followed by three workers)
pub const HIERARCHY_GROUP_SIZE: usize = 4;

/// Maximum concurrent flows a star hub can serve
pub const STAR_HUB_CAPACITY: f64 = 10.0;
