//! Reference kernel: one struct per node, no buffer reuse.

use super::simulation::Simulation;
use super::{EngineAdapter, KernelKind, TickObserver, TickReport};
use crate::error::{self, Result};
use crate::forces::{Bodies, ForceParams, ForceScratch, ForceSet};
use crate::graph::{LinkSpec, NodeId, NodeSpec, Positions};
use crate::sim::{AlphaSchedule, SimulationConfig};

/// Full simulation state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    pub radius: Option<f64>,
}

impl Bodies for [SimNode] {
    #[inline]
    fn len(&self) -> usize {
        <[SimNode]>::len(self)
    }

    #[inline]
    fn position(&self, i: usize) -> (f64, f64) {
        (self[i].x, self[i].y)
    }

    #[inline]
    fn velocity(&self, i: usize) -> (f64, f64) {
        (self[i].vx, self[i].vy)
    }

    #[inline]
    fn set_position(&mut self, i: usize, x: f64, y: f64) {
        self[i].x = x;
        self[i].y = y;
    }

    #[inline]
    fn set_velocity(&mut self, i: usize, vx: f64, vy: f64) {
        self[i].vx = vx;
        self[i].vy = vy;
    }

    #[inline]
    fn pin(&self, i: usize) -> (Option<f64>, Option<f64>) {
        (self[i].fx, self[i].fy)
    }
}

/// Straightforward kernel that favors clarity over throughput.
///
/// `dispose` is a no-op; the kernel owns nothing beyond ordinary heap data.
#[derive(Debug)]
pub struct ReferenceKernel {
    sim: Simulation,
    nodes: Vec<SimNode>,
}

impl ReferenceKernel {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Ok(Self {
            sim: Simulation::new(config)?,
            nodes: Vec::new(),
        })
    }

    /// Current node states in slot order.
    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }
}

impl EngineAdapter for ReferenceKernel {
    fn kind(&self) -> KernelKind {
        KernelKind::Reference
    }

    fn set_nodes(&mut self, nodes: &[NodeSpec]) -> Result<usize> {
        let plan = self.sim.plan_nodes(nodes, |slot| self.nodes[slot])?;
        let pruned = plan.pruned;
        self.nodes = self.sim.commit_nodes(plan);
        Ok(pruned)
    }

    fn set_links(&mut self, links: &[LinkSpec]) -> Result<()> {
        Ok(self.sim.set_links(links)?)
    }

    fn configure_force(&mut self, name: &str, params: ForceParams) -> Result<()> {
        Ok(self.sim.configure_force(name, params)?)
    }

    fn enable_force(&mut self, name: &str, enabled: bool) -> Result<()> {
        Ok(self.sim.enable_force(name, enabled)?)
    }

    fn register_force(&mut self, name: &str, params: ForceParams, enabled: bool) -> Result<()> {
        Ok(self.sim.register_force(name, params, enabled)?)
    }

    fn set_forces(&mut self, forces: ForceSet) -> Result<()> {
        Ok(self.sim.set_forces(forces)?)
    }

    fn set_alpha_schedule(&mut self, schedule: AlphaSchedule) -> Result<()> {
        Ok(self.sim.set_alpha_schedule(schedule)?)
    }

    fn alpha_schedule(&self) -> Result<AlphaSchedule> {
        Ok(self.sim.alpha_schedule())
    }

    fn set_velocity_decay(&mut self, decay: f64) -> Result<()> {
        Ok(self.sim.set_velocity_decay(decay)?)
    }

    fn tick(&mut self, n: u32) -> Result<TickReport> {
        let mut scratch = ForceScratch::default();
        for _ in 0..n {
            let alpha = self.sim.step(self.nodes.as_mut_slice(), &mut scratch);
            self.sim.notify(alpha);
        }
        Ok(self.sim.report(self.nodes.as_slice(), n))
    }

    fn positions(&self) -> Result<Positions> {
        Ok(self.sim.snapshot(self.nodes.as_slice(), false))
    }

    fn velocities(&self) -> Result<Positions> {
        Ok(self.sim.snapshot(self.nodes.as_slice(), true))
    }

    fn pin(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        let slot = self.sim.slot(id)?;
        let (x, y) = (error::finite("pin.x", x)?, error::finite("pin.y", y)?);
        let node = &mut self.nodes[slot];
        node.fx = Some(x);
        node.fy = Some(y);
        node.x = x;
        node.y = y;
        node.vx = 0.0;
        node.vy = 0.0;
        Ok(())
    }

    fn unpin(&mut self, id: NodeId) -> Result<()> {
        let slot = self.sim.slot(id)?;
        let node = &mut self.nodes[slot];
        node.fx = None;
        node.fy = None;
        Ok(())
    }

    fn reheat(&mut self, alpha: f64) -> Result<()> {
        Ok(self.sim.reheat(alpha)?)
    }

    fn alpha(&self) -> Result<f64> {
        Ok(self.sim.alpha())
    }

    fn is_converged(&self) -> Result<bool> {
        Ok(self.sim.is_converged())
    }

    fn node_count(&self) -> Result<usize> {
        Ok(self.sim.node_count())
    }

    fn link_count(&self) -> Result<usize> {
        Ok(self.sim.link_count())
    }

    fn set_tick_observer(&mut self, observer: Option<TickObserver>) -> Result<()> {
        self.sim.set_observer(observer);
        Ok(())
    }

    fn dispose(&mut self) {}
}
