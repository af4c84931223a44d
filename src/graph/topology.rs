//! Id-based link resolution.
//!
//! The Topology stores the node set in a petgraph StableGraph whose node
//! weights are stable `NodeId`s, plus a lookup table from id to graph index.
//! Every link endpoint goes through that table before any positional array
//! access. A link naming an id outside the node set is a configuration error;
//! there is no fallback to treating the raw id as an array position.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::{Directed, Direction};
use std::collections::HashMap;

use super::link::{LinkSpec, ResolvedLink};
use super::node::NodeId;
use crate::error::{self, ConfigurationError};

/// Node set and link structure of one kernel.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Node weights are ids, edge weights are the link's position in the
    /// most recent `resolve` call.
    graph: StableGraph<NodeId, usize, Directed>,

    /// Map from stable NodeId to petgraph NodeIndex
    index: HashMap<NodeId, NodeIndex>,
}

impl Topology {
    /// Build a topology over `ids`; slot `i` is the i-th id.
    pub fn from_ids<I>(ids: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let ids = ids.into_iter();
        let (capacity, _) = ids.size_hint();
        let mut graph = StableGraph::with_capacity(capacity, 0);
        let mut index = HashMap::with_capacity(capacity);

        for id in ids {
            let node = graph.add_node(id);
            if index.insert(id, node).is_some() {
                return Err(ConfigurationError::DuplicateNode(id));
            }
        }

        Ok(Self { graph, index })
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links resolved by the last `resolve` call.
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Slot of a node id, if present.
    #[inline]
    pub fn slot(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).map(|index| index.index())
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Resolve id-based links to slot-based links.
    ///
    /// All links are checked before the stored edges are replaced, so an
    /// error leaves the previous link structure in place.
    pub fn resolve(&mut self, links: &[LinkSpec]) -> Result<Vec<ResolvedLink>, ConfigurationError> {
        let mut endpoints = Vec::with_capacity(links.len());
        for (ordinal, link) in links.iter().enumerate() {
            let source = self.endpoint(ordinal, link.source)?;
            let target = self.endpoint(ordinal, link.target)?;
            if let Some(distance) = link.distance {
                error::non_negative("link.distance", distance)?;
            }
            if let Some(strength) = link.strength {
                error::finite("link.strength", strength)?;
            }
            endpoints.push((source, target));
        }

        self.graph.clear_edges();
        for (ordinal, &(source, target)) in endpoints.iter().enumerate() {
            self.graph.add_edge(source, target, ordinal);
        }

        let degrees: Vec<usize> = self
            .graph
            .node_indices()
            .map(|node| self.degree_of(node))
            .collect();

        let resolved = links
            .iter()
            .zip(&endpoints)
            .map(|(link, &(source, target))| {
                let (s, t) = (source.index(), target.index());
                let (ds, dt) = (degrees[s] as f64, degrees[t] as f64);
                ResolvedLink {
                    source: s,
                    target: t,
                    bias: ds / (ds + dt),
                    degree_strength: 1.0 / ds.min(dt),
                    distance: link.distance,
                    strength: link.strength,
                }
            })
            .collect();

        Ok(resolved)
    }

    fn endpoint(&self, link: usize, id: NodeId) -> Result<NodeIndex, ConfigurationError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(ConfigurationError::MissingLinkEndpoint { link, id })
    }

    fn degree_of(&self, node: NodeIndex) -> usize {
        self.graph.edges_directed(node, Direction::Outgoing).count()
            + self.graph.edges_directed(node, Direction::Incoming).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId).collect()
    }

    #[test]
    fn test_slots_follow_insertion_order() {
        let topology = Topology::from_ids(ids(&[40, 10, 30])).unwrap();
        assert_eq!(topology.slot(NodeId(40)), Some(0));
        assert_eq!(topology.slot(NodeId(10)), Some(1));
        assert_eq!(topology.slot(NodeId(30)), Some(2));
        assert_eq!(topology.slot(NodeId(0)), None);
        assert_eq!(topology.node_count(), 3);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Topology::from_ids(ids(&[1, 2, 1])).unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateNode(NodeId(1)));
    }

    #[test]
    fn test_resolve_by_id_not_position() {
        // Ids 0 and 1 would be valid array positions, but they are not in the set.
        let mut topology = Topology::from_ids(ids(&[5, 7, 9])).unwrap();
        let links = [LinkSpec::new(9, 5), LinkSpec::new(7, 9)];

        let resolved = topology.resolve(&links).unwrap();
        assert_eq!((resolved[0].source, resolved[0].target), (2, 0));
        assert_eq!((resolved[1].source, resolved[1].target), (1, 2));

        let err = topology.resolve(&[LinkSpec::new(0, 1)]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingLinkEndpoint {
                link: 0,
                id: NodeId(0)
            }
        );
        // Failed resolution keeps the previous links.
        assert_eq!(topology.link_count(), 2);
    }

    #[test]
    fn test_degree_bias_and_strength() {
        // Star: 0 is linked to 1, 2, 3.
        let mut topology = Topology::from_ids(ids(&[0, 1, 2, 3])).unwrap();
        let links = [LinkSpec::new(0, 1), LinkSpec::new(0, 2), LinkSpec::new(0, 3)];
        let resolved = topology.resolve(&links).unwrap();

        // deg(0) = 3, each leaf has degree 1.
        for link in &resolved {
            assert_eq!(link.degree_strength, 1.0);
            assert!((link.bias - 0.75).abs() < 1e-12);
        }
    }

    #[test]
    fn test_self_loop_counts_twice() {
        let mut topology = Topology::from_ids(ids(&[1])).unwrap();
        let resolved = topology.resolve(&[LinkSpec::new(1, 1)]).unwrap();
        assert_eq!(resolved[0].bias, 0.5);
        assert_eq!(resolved[0].degree_strength, 0.5);
    }

    #[test]
    fn test_invalid_link_override_rejected() {
        let mut topology = Topology::from_ids(ids(&[1, 2])).unwrap();
        let err = topology
            .resolve(&[LinkSpec::new(1, 2).with_distance(-5.0)])
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidParameter { .. }));
    }
}
