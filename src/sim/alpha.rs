//! Alpha cooling schedule.
//!
//! Alpha is the simulation temperature. Every tick moves it toward `target`
//! by `(target - alpha) * decay`; the layout counts as converged once alpha
//! drops below `min`.

use serde::{Deserialize, Serialize};

use crate::error::{self, ConfigurationError};

/// Alpha decay that reaches `min = 0.001` from 1 in 300 ticks.
pub const DEFAULT_ALPHA_DECAY: f64 = 0.022_762_779_044_189_33;

/// Parameters of the cooling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlphaSchedule {
    pub initial: f64,
    pub min: f64,
    pub decay: f64,
    pub target: f64,
}

impl Default for AlphaSchedule {
    fn default() -> Self {
        Self {
            initial: 1.0,
            min: 0.001,
            decay: DEFAULT_ALPHA_DECAY,
            target: 0.0,
        }
    }
}

impl AlphaSchedule {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        error::non_negative("alpha.initial", self.initial)?;
        error::non_negative("alpha.min", self.min)?;
        error::unit_interval("alpha.decay", self.decay)?;
        error::non_negative("alpha.target", self.target)?;
        Ok(())
    }
}

/// Current alpha plus the schedule driving it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cooling {
    alpha: f64,
    schedule: AlphaSchedule,
}

impl Cooling {
    pub fn new(schedule: AlphaSchedule) -> Self {
        Self {
            alpha: schedule.initial,
            schedule,
        }
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn schedule(&self) -> &AlphaSchedule {
        &self.schedule
    }

    /// Replace the schedule, keeping the current alpha.
    pub fn set_schedule(&mut self, schedule: AlphaSchedule) {
        self.schedule = schedule;
    }

    /// Advance one tick and return the new alpha.
    #[inline]
    pub fn step(&mut self) -> f64 {
        self.alpha += (self.schedule.target - self.alpha) * self.schedule.decay;
        self.alpha
    }

    #[inline]
    pub fn is_converged(&self) -> bool {
        self.alpha < self.schedule.min
    }

    /// Set alpha directly, e.g. to restart convergence after new nodes arrive.
    pub fn reheat(&mut self, alpha: f64) -> Result<(), ConfigurationError> {
        self.alpha = error::non_negative("alpha", alpha)?;
        Ok(())
    }
}

impl Default for Cooling {
    fn default() -> Self {
        Self::new(AlphaSchedule::default())
    }
}
