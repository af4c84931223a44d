//! Simulation kernels behind one adapter interface.
//!
//! - `ReferenceKernel`: array-of-structs storage, written for clarity
//! - `PerformantKernel`: structure-of-arrays storage with reused buffers and
//!   an interleaved position buffer for zero-copy egress
//! - `PendingEngine`: an adapter whose kernel is still being initialized
//!
//! Orchestration code talks to `dyn EngineAdapter` and never needs to know
//! which kernel is behind it. The kernel is chosen at construction time via
//! [`EngineBuilder`].

mod builder;
mod pending;
mod performant;
mod reference;
mod simulation;

pub use builder::{EngineBuilder, FallbackPolicy};
pub use pending::PendingEngine;
pub use performant::PerformantKernel;
pub use reference::{ReferenceKernel, SimNode};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigurationError, Result};
use crate::forces::{ForceParams, ForceSet};
use crate::graph::{LinkSpec, NodeId, NodeSpec, Positions};
use crate::sim::AlphaSchedule;

/// Which kernel implementation backs an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KernelKind {
    Reference,
    Performant,
}

impl KernelKind {
    pub fn name(self) -> &'static str {
        match self {
            KernelKind::Reference => "reference",
            KernelKind::Performant => "performant",
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reference" => Ok(KernelKind::Reference),
            "performant" => Ok(KernelKind::Performant),
            other => Err(ConfigurationError::UnknownKernel(other.to_string())),
        }
    }
}

/// Emitted after every simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickEvent {
    /// Steps taken since the kernel was created.
    pub tick: u64,
    pub alpha: f64,
}

/// Observer called with every [`TickEvent`].
pub type TickObserver = Box<dyn FnMut(&TickEvent)>;

/// Summary of one `tick(n)` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub ticks: u32,
    pub alpha: f64,
    pub converged: bool,
}

/// Borrowed view of a kernel's interleaved position buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionBuffer<'a> {
    /// Node id of each slot.
    pub ids: &'a [NodeId],
    /// `[x0, y0, x1, y1, ...]` in slot order.
    pub xy: &'a [f64],
}

/// The narrow interface shared by every kernel.
///
/// Configuration calls validate their input first and leave the kernel
/// untouched on error. Changes take effect on the next tick.
pub trait EngineAdapter {
    fn kind(&self) -> KernelKind;

    /// Replace the node set and return how many existing links were dropped
    /// because an endpoint disappeared.
    ///
    /// Nodes already present keep their state for any omitted field; new
    /// nodes without a position go on the phyllotaxis spiral.
    fn set_nodes(&mut self, nodes: &[NodeSpec]) -> Result<usize>;

    /// Replace the link set. Endpoints are resolved by id.
    fn set_links(&mut self, links: &[LinkSpec]) -> Result<()>;

    /// Replace the parameters of a registered force.
    fn configure_force(&mut self, name: &str, params: ForceParams) -> Result<()>;

    fn enable_force(&mut self, name: &str, enabled: bool) -> Result<()>;

    /// Add a named force.
    fn register_force(&mut self, name: &str, params: ForceParams, enabled: bool) -> Result<()>;

    /// Replace the whole force set.
    fn set_forces(&mut self, forces: ForceSet) -> Result<()>;

    fn set_alpha_schedule(&mut self, schedule: AlphaSchedule) -> Result<()>;

    fn alpha_schedule(&self) -> Result<AlphaSchedule>;

    fn set_velocity_decay(&mut self, decay: f64) -> Result<()>;

    /// Advance exactly `n` steps.
    fn tick(&mut self, n: u32) -> Result<TickReport>;

    /// Snapshot of current positions.
    fn positions(&self) -> Result<Positions>;

    /// Snapshot of current velocities.
    fn velocities(&self) -> Result<Positions>;

    /// Pin a node on both axes. The node moves to the pin immediately.
    fn pin(&mut self, id: NodeId, x: f64, y: f64) -> Result<()>;

    fn unpin(&mut self, id: NodeId) -> Result<()>;

    /// Set alpha, e.g. to restart convergence after the graph changed.
    fn reheat(&mut self, alpha: f64) -> Result<()>;

    fn alpha(&self) -> Result<f64>;

    fn is_converged(&self) -> Result<bool>;

    fn node_count(&self) -> Result<usize>;

    fn link_count(&self) -> Result<usize>;

    fn set_tick_observer(&mut self, observer: Option<TickObserver>) -> Result<()>;

    /// Zero-copy positions, for kernels that keep an egress buffer. Valid
    /// until the next mutating call.
    fn position_buffer(&self) -> Result<Option<PositionBuffer<'_>>> {
        Ok(None)
    }

    /// Release kernel-owned buffers. Further calls return
    /// [`LayoutError::Disposed`](crate::error::LayoutError::Disposed) where
    /// the kernel holds resources; disposing twice is harmless.
    fn dispose(&mut self);
}
