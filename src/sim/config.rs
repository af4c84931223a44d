//! Simulation configuration.

use serde::{Deserialize, Serialize};

use super::alpha::AlphaSchedule;
use crate::error::{self, ConfigurationError};
use crate::forces::ForceSet;

/// Friction applied to velocities every tick.
pub const DEFAULT_VELOCITY_DECAY: f64 = 0.4;

/// Everything a kernel needs besides nodes and links.
///
/// Changes made through the adapter take effect on the next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    pub alpha: AlphaSchedule,
    pub velocity_decay: f64,
    /// Seed for the jiggle random source.
    pub seed: u32,
    pub forces: ForceSet,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha: AlphaSchedule::default(),
            velocity_decay: DEFAULT_VELOCITY_DECAY,
            seed: 1,
            forces: ForceSet::standard(),
        }
    }
}

impl SimulationConfig {
    /// A configuration with the given forces and default schedule.
    pub fn with_forces(forces: ForceSet) -> Self {
        Self {
            forces,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.alpha.validate()?;
        error::unit_interval("velocityDecay", self.velocity_decay)?;
        self.forces.validate()
    }
}
