//! Spatial structures.
//!
//! - `quadtree`: Barnes–Hut arena rebuilt every tick for many-body and collision forces
//! - `rtree`: R*-tree over a positions snapshot for hit testing

pub mod quadtree;
mod rtree;

pub use quadtree::{Bounds, Quad, Quadtree, VisitStack};
pub use rtree::PositionIndex;
