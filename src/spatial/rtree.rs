//! R-tree based hit testing over a positions snapshot, using the rstar crate.
//!
//! Kernels never hand out references into their own storage, so renderers
//! that need "which node is under the cursor" build this index from
//! `positions()` output and query it until the next frame.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::graph::{NodeId, Positions};

/// A point in the spatial index with associated node ID.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NodePoint {
    id: NodeId,
    x: f64,
    y: f64,
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Read-only spatial index over one positions snapshot.
pub struct PositionIndex {
    tree: RTree<NodePoint>,
}

impl Default for PositionIndex {
    fn default() -> Self {
        Self { tree: RTree::new() }
    }
}

impl PositionIndex {
    /// Bulk-load an index from a positions snapshot. Non-finite positions are skipped.
    pub fn from_positions(positions: &Positions) -> Self {
        let points: Vec<_> = positions
            .iter()
            .filter(|(_, p)| p.is_finite())
            .map(|(&id, p)| NodePoint { id, x: p.x, y: p.y })
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Find the nearest node to a point.
    pub fn nearest(&self, x: f64, y: f64) -> Option<NodeId> {
        self.tree.nearest_neighbor(&[x, y]).map(|point| point.id)
    }

    /// Find the nearest node within a maximum distance.
    pub fn nearest_within(&self, x: f64, y: f64, max_distance: f64) -> Option<NodeId> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|point| point.distance_2(&[x, y]) <= max_distance_sq)
            .map(|point| point.id)
    }

    /// Find all nodes within a rectangle.
    pub fn in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<NodeId> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|point| point.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Point;

    fn snapshot(points: &[(u32, f64, f64)]) -> Positions {
        points
            .iter()
            .map(|&(id, x, y)| (NodeId(id), Point::new(x, y)))
            .collect()
    }

    #[test]
    fn test_nearest() {
        let index = PositionIndex::from_positions(&snapshot(&[
            (0, 0.0, 0.0),
            (1, 10.0, 10.0),
            (2, 5.0, 5.0),
        ]));

        assert_eq!(index.nearest(0.0, 0.0), Some(NodeId(0)));
        assert_eq!(index.nearest(6.0, 6.0), Some(NodeId(2)));
        assert_eq!(index.nearest(11.0, 11.0), Some(NodeId(1)));
    }

    #[test]
    fn test_nearest_within() {
        let index = PositionIndex::from_positions(&snapshot(&[(0, 0.0, 0.0), (1, 10.0, 10.0)]));

        assert_eq!(index.nearest_within(0.0, 0.0, 5.0), Some(NodeId(0)));
        assert_eq!(index.nearest_within(5.0, 5.0, 1.0), None);
        // Both nodes are ~7.07 from (5, 5).
        assert!(index.nearest_within(5.0, 5.0, 8.0).is_some());
    }

    #[test]
    fn test_in_rect() {
        let index = PositionIndex::from_positions(&snapshot(&[
            (0, 0.0, 0.0),
            (1, 5.0, 5.0),
            (2, 10.0, 10.0),
        ]));

        let in_rect = index.in_rect(-1.0, -1.0, 6.0, 6.0);
        assert_eq!(in_rect.len(), 2);
        assert!(in_rect.contains(&NodeId(0)));
        assert!(in_rect.contains(&NodeId(1)));
    }

    #[test]
    fn test_skips_non_finite() {
        let index = PositionIndex::from_positions(&snapshot(&[(0, f64::NAN, 0.0), (1, 1.0, 1.0)]));
        assert_eq!(index.in_rect(-10.0, -10.0, 10.0, 10.0), [NodeId(1)]);
        assert_eq!(index.nearest(0.0, 0.0), Some(NodeId(1)));
    }

    #[test]
    fn test_empty() {
        let index = PositionIndex::from_positions(&Positions::new());
        assert_eq!(index.nearest(0.0, 0.0), None);
        assert!(PositionIndex::default().in_rect(-1.0, -1.0, 1.0, 1.0).is_empty());
    }
}
