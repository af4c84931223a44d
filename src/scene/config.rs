//! Scene definitions: which rule places each node, and the forces active
//! while the scene is live.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{self, ConfigurationError};
use crate::forces::ForceSet;
use crate::graph::{NodeId, Point};

/// How a node's position is determined while a scene is live.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum NodeRule {
    /// Held at a fixed point.
    Fixed(Point),
    /// Driven by the simulation kernel.
    Simulated,
    /// Supplied by the host through `set_external_positions`.
    External,
}

/// A named mapping from node id to [`NodeRule`].
///
/// Nodes without a rule are not part of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    pub name: String,
    #[serde(default)]
    pub rules: HashMap<NodeId, NodeRule>,
    #[serde(default = "ForceSet::standard")]
    pub forces: ForceSet,
}

impl SceneConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: HashMap::new(),
            forces: ForceSet::standard(),
        }
    }

    pub fn with_rule(mut self, id: impl Into<NodeId>, rule: NodeRule) -> Self {
        self.rules.insert(id.into(), rule);
        self
    }

    pub fn with_forces(mut self, forces: ForceSet) -> Self {
        self.forces = forces;
        self
    }

    /// Ids under the `Simulated` rule, sorted so kernel slot order is stable.
    pub fn simulated(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .rules
            .iter()
            .filter(|(_, rule)| matches!(rule, NodeRule::Simulated))
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for rule in self.rules.values() {
            if let NodeRule::Fixed(p) = rule {
                error::finite("rule.x", p.x)?;
                error::finite("rule.y", p.y)?;
            }
        }
        self.forces.validate()
    }
}
