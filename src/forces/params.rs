//! Per-kind force parameters.
//!
//! Defaults match the reference force-layout algorithm so that configurations
//! ported from it behave identically.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{self, ConfigurationError};
use crate::graph::NodeId;

/// Force kinds in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ForceKind {
    ManyBody,
    Link,
    Collide,
    X,
    Y,
    Center,
}

impl ForceKind {
    pub fn name(self) -> &'static str {
        match self {
            ForceKind::ManyBody => "manyBody",
            ForceKind::Link => "link",
            ForceKind::Collide => "collide",
            ForceKind::X => "x",
            ForceKind::Y => "y",
            ForceKind::Center => "center",
        }
    }
}

/// Many-body (charge) force. Negative strength repels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManyBodyParams {
    pub strength: f64,
    /// Barnes–Hut approximation threshold.
    pub theta: f64,
    /// Distance floor applied before the inverse-square falloff.
    pub distance_min: f64,
    /// Interactions beyond this distance are ignored; None means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_max: Option<f64>,
}

impl Default for ManyBodyParams {
    fn default() -> Self {
        Self {
            strength: -30.0,
            theta: 0.9,
            distance_min: 1.0,
            distance_max: None,
        }
    }
}

impl ManyBodyParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        error::finite("manyBody.strength", self.strength)?;
        error::non_negative("manyBody.theta", self.theta)?;
        error::non_negative("manyBody.distanceMin", self.distance_min)?;
        if let Some(max) = self.distance_max {
            error::non_negative("manyBody.distanceMax", max)?;
        }
        Ok(())
    }
}

/// Spring force along links.
///
/// Strength is degree-normalized by default: `1 / min(deg(source), deg(target))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkParams {
    /// Rest distance for links without their own.
    pub distance: f64,
    /// Fixed strength for links without their own; None uses
    /// `1 / min(degree(source), degree(target))`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    /// Sub-steps per tick.
    pub iterations: u32,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            distance: 30.0,
            strength: None,
            iterations: 1,
        }
    }
}

impl LinkParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        error::non_negative("link.distance", self.distance)?;
        if let Some(strength) = self.strength {
            error::finite("link.strength", strength)?;
        }
        Ok(())
    }
}

/// Circle-circle collision separation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollideParams {
    /// Radius for nodes without their own.
    pub radius: f64,
    /// Fraction of the overlap resolved per iteration.
    pub strength: f64,
    pub iterations: u32,
}

impl Default for CollideParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            strength: 0.7,
            iterations: 1,
        }
    }
}

impl CollideParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        error::non_negative("collide.radius", self.radius)?;
        error::unit_interval("collide.strength", self.strength)?;
        Ok(())
    }
}

/// Single-axis pull toward a target coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AxisParams {
    /// Target for nodes without an entry in `targets`.
    pub target: f64,
    pub strength: f64,
    /// Per-node targets, e.g. one column per cluster.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub targets: HashMap<NodeId, f64>,
}

impl Default for AxisParams {
    fn default() -> Self {
        Self {
            target: 0.0,
            strength: 0.1,
            targets: HashMap::new(),
        }
    }
}

impl AxisParams {
    pub fn new(target: f64, strength: f64) -> Self {
        Self {
            target,
            strength,
            targets: HashMap::new(),
        }
    }

    /// Target coordinate for one node.
    #[inline]
    pub fn target_for(&self, id: NodeId) -> f64 {
        self.targets.get(&id).copied().unwrap_or(self.target)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        error::finite("axis.target", self.target)?;
        error::finite("axis.strength", self.strength)?;
        for &target in self.targets.values() {
            error::finite("axis.targets", target)?;
        }
        Ok(())
    }
}

/// Per-node pull of the centroid toward a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CenterParams {
    pub x: f64,
    pub y: f64,
    pub strength: f64,
}

impl Default for CenterParams {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            strength: 1.0,
        }
    }
}

impl CenterParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        error::finite("center.x", self.x)?;
        error::finite("center.y", self.y)?;
        error::finite("center.strength", self.strength)?;
        Ok(())
    }
}

/// Configuration of one force, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ForceParams {
    ManyBody(ManyBodyParams),
    Link(LinkParams),
    Collide(CollideParams),
    X(AxisParams),
    Y(AxisParams),
    Center(CenterParams),
}

impl ForceParams {
    pub fn kind(&self) -> ForceKind {
        match self {
            ForceParams::ManyBody(_) => ForceKind::ManyBody,
            ForceParams::Link(_) => ForceKind::Link,
            ForceParams::Collide(_) => ForceKind::Collide,
            ForceParams::X(_) => ForceKind::X,
            ForceParams::Y(_) => ForceKind::Y,
            ForceParams::Center(_) => ForceKind::Center,
        }
    }

    /// Default parameters for a kind.
    pub fn default_for(kind: ForceKind) -> Self {
        match kind {
            ForceKind::ManyBody => ForceParams::ManyBody(ManyBodyParams::default()),
            ForceKind::Link => ForceParams::Link(LinkParams::default()),
            ForceKind::Collide => ForceParams::Collide(CollideParams::default()),
            ForceKind::X => ForceParams::X(AxisParams::default()),
            ForceKind::Y => ForceParams::Y(AxisParams::default()),
            ForceKind::Center => ForceParams::Center(CenterParams::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            ForceParams::ManyBody(p) => p.validate(),
            ForceParams::Link(p) => p.validate(),
            ForceParams::Collide(p) => p.validate(),
            ForceParams::X(p) | ForceParams::Y(p) => p.validate(),
            ForceParams::Center(p) => p.validate(),
        }
    }
}
