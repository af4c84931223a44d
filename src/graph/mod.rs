//! Graph data: node ids, ingest records, and id-based link resolution.

mod link;
mod node;
mod topology;

pub use link::{LinkSpec, ResolvedLink};
pub use node::{NodeId, NodeSpec, PinFlags, Point};
pub use topology::Topology;

use std::collections::HashMap;

/// Snapshot of node positions keyed by id.
pub type Positions = HashMap<NodeId, Point>;
