//! Link type and related structures.
//!
//! Links are springs between two nodes. Each link has:
//! - Source and target node IDs (never array positions)
//! - Optional rest distance and strength overriding the link force's defaults

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// A link as supplied to `setLinks`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpec {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

impl LinkSpec {
    /// A link using the link force's default distance and strength.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            distance: None,
            strength: None,
        }
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// True when both endpoints satisfy `present`.
    pub fn connects(&self, mut present: impl FnMut(NodeId) -> bool) -> bool {
        present(self.source) && present(self.target)
    }
}

/// A link whose endpoints have been resolved to kernel slots.
///
/// Only produced by [`Topology::resolve`](super::Topology::resolve); slots are
/// valid for the node set the topology was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLink {
    pub source: usize,
    pub target: usize,
    /// Share of the correction applied to the target: `deg(s) / (deg(s) + deg(t))`.
    pub bias: f64,
    /// Degree-normalized strength `1 / min(deg(s), deg(t))`.
    pub degree_strength: f64,
    pub distance: Option<f64>,
    pub strength: Option<f64>,
}

impl ResolvedLink {
    /// Rest distance, falling back to the force default.
    #[inline]
    pub fn distance_or(&self, default: f64) -> f64 {
        self.distance.unwrap_or(default)
    }

    /// Spring strength: per-link override, then the force's fixed strength,
    /// then the degree-normalized default.
    #[inline]
    pub fn strength_or(&self, fixed: Option<f64>) -> f64 {
        self.strength.or(fixed).unwrap_or(self.degree_strength)
    }
}
