//! Integration, cooling, and deterministic seeding.

mod alpha;
mod config;
mod integrator;
mod placement;
mod random;

pub use alpha::{AlphaSchedule, Cooling, DEFAULT_ALPHA_DECAY};
pub use config::{DEFAULT_VELOCITY_DECAY, SimulationConfig};
pub use integrator::integrate;
pub use placement::phyllotaxis;
pub use random::Lcg;
