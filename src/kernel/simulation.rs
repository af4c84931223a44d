//! State and step logic shared by both kernels.
//!
//! `Simulation` owns everything except per-node storage: the id topology,
//! resolved links, forces, cooling, random source, and tick observer. The
//! reference kernel supplies storage through [`Bodies`] and calls
//! [`Simulation::step`]. The performant kernel calls [`Simulation::begin_step`]
//! and runs its own loops over the borrowed inputs.

use std::fmt;

use super::reference::SimNode;
use super::{TickEvent, TickObserver, TickReport};
use crate::error::{self, ConfigurationError};
use crate::forces::{self, Bodies, ForceContext, ForceParams, ForceScratch, ForceSet};
use crate::graph::{LinkSpec, NodeId, NodeSpec, Point, Positions, ResolvedLink, Topology};
use crate::sim::{self, AlphaSchedule, Cooling, Lcg, SimulationConfig};

/// A validated `set_nodes` call, ready to commit.
pub(crate) struct NodePlan {
    topology: Topology,
    pub(crate) nodes: Vec<SimNode>,
    link_specs: Vec<LinkSpec>,
    links: Vec<ResolvedLink>,
    pub(crate) pruned: usize,
}

/// Inputs of one step, borrowed from the simulation.
pub(crate) struct Step<'a> {
    pub ctx: ForceContext<'a>,
    /// Changes whenever `ctx.links` is replaced.
    pub link_version: u64,
    pub forces: &'a ForceSet,
    pub rng: &'a mut Lcg,
    pub velocity_decay: f64,
}

pub(crate) struct Simulation {
    topology: Topology,
    /// Node id per slot.
    ids: Vec<NodeId>,
    radii: Vec<Option<f64>>,
    /// Links as supplied, kept so they can be re-resolved when nodes change.
    link_specs: Vec<LinkSpec>,
    links: Vec<ResolvedLink>,
    /// Bumped whenever `links` is replaced.
    link_version: u64,
    forces: ForceSet,
    cooling: Cooling,
    velocity_decay: f64,
    rng: Lcg,
    ticks: u64,
    observer: Option<TickObserver>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            topology: Topology::default(),
            ids: Vec::new(),
            radii: Vec::new(),
            link_specs: Vec::new(),
            links: Vec::new(),
            link_version: 0,
            forces: config.forces,
            cooling: Cooling::new(config.alpha),
            velocity_decay: config.velocity_decay,
            rng: Lcg::new(config.seed),
            ticks: 0,
            observer: None,
        })
    }

    // =========================================================================
    // Nodes and links
    // =========================================================================

    /// Validate a new node set and compute each node's starting state.
    ///
    /// `previous` returns the current state of an existing slot.
    pub fn plan_nodes<F>(&self, nodes: &[NodeSpec], previous: F) -> Result<NodePlan, ConfigurationError>
    where
        F: Fn(usize) -> SimNode,
    {
        for spec in nodes {
            validate_spec(spec)?;
        }
        let topology = Topology::from_ids(nodes.iter().map(|spec| spec.id))?;

        let states = nodes
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let base = match self.topology.slot(spec.id) {
                    Some(slot) => previous(slot),
                    None => {
                        let Point { x, y } = sim::phyllotaxis(i);
                        SimNode {
                            id: spec.id,
                            x,
                            y,
                            ..SimNode::default()
                        }
                    }
                };
                let mut node = SimNode {
                    id: spec.id,
                    x: spec.x.unwrap_or(base.x),
                    y: spec.y.unwrap_or(base.y),
                    vx: spec.vx.unwrap_or(base.vx),
                    vy: spec.vy.unwrap_or(base.vy),
                    fx: spec.fx.or(base.fx),
                    fy: spec.fy.or(base.fy),
                    radius: spec.radius.or(base.radius),
                };
                if let Some(fx) = node.fx {
                    node.x = fx;
                }
                if let Some(fy) = node.fy {
                    node.y = fy;
                }
                node
            })
            .collect();

        let link_specs: Vec<LinkSpec> = self
            .link_specs
            .iter()
            .filter(|link| link.connects(|id| topology.contains(id)))
            .copied()
            .collect();
        let pruned = self.link_specs.len() - link_specs.len();

        let mut topology = topology;
        let links = topology.resolve(&link_specs)?;

        Ok(NodePlan {
            topology,
            nodes: states,
            link_specs,
            links,
            pruned,
        })
    }

    /// Install a planned node set; returns the node states for storage.
    pub fn commit_nodes(&mut self, plan: NodePlan) -> Vec<SimNode> {
        let NodePlan {
            topology,
            nodes,
            link_specs,
            links,
            pruned,
        } = plan;

        self.ids = nodes.iter().map(|node| node.id).collect();
        self.radii = nodes.iter().map(|node| node.radius).collect();
        self.topology = topology;
        self.link_specs = link_specs;
        self.links = links;
        self.link_version += 1;

        log::debug!(
            "nodes set: {} nodes, {} links, {} pruned",
            self.ids.len(),
            self.links.len(),
            pruned
        );
        if pruned > 0 {
            log::debug!("pruned {pruned} links whose endpoints left the node set");
        }
        nodes
    }

    pub fn set_links(&mut self, links: &[LinkSpec]) -> Result<(), ConfigurationError> {
        self.links = self.topology.resolve(links)?;
        self.link_specs = links.to_vec();
        self.link_version += 1;
        log::debug!("links resolved: {}", self.links.len());
        Ok(())
    }

    /// Slot of a node, or `UnknownNode`.
    pub fn slot(&self, id: NodeId) -> Result<usize, ConfigurationError> {
        self.topology
            .slot(id)
            .ok_or(ConfigurationError::UnknownNode(id))
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn node_count(&self) -> usize {
        self.topology.node_count()
    }

    pub fn link_count(&self) -> usize {
        self.topology.link_count()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn configure_force(&mut self, name: &str, params: ForceParams) -> Result<(), ConfigurationError> {
        self.forces.configure(name, params)
    }

    pub fn enable_force(&mut self, name: &str, enabled: bool) -> Result<(), ConfigurationError> {
        self.forces.set_enabled(name, enabled)
    }

    pub fn register_force(
        &mut self,
        name: &str,
        params: ForceParams,
        enabled: bool,
    ) -> Result<(), ConfigurationError> {
        self.forces.register(name, params, enabled)
    }

    pub fn set_forces(&mut self, forces: ForceSet) -> Result<(), ConfigurationError> {
        forces.validate()?;
        self.forces = forces;
        Ok(())
    }

    pub fn set_alpha_schedule(&mut self, schedule: AlphaSchedule) -> Result<(), ConfigurationError> {
        schedule.validate()?;
        self.cooling.set_schedule(schedule);
        Ok(())
    }

    pub fn alpha_schedule(&self) -> AlphaSchedule {
        *self.cooling.schedule()
    }

    pub fn set_velocity_decay(&mut self, decay: f64) -> Result<(), ConfigurationError> {
        self.velocity_decay = error::unit_interval("velocityDecay", decay)?;
        Ok(())
    }

    pub fn reheat(&mut self, alpha: f64) -> Result<(), ConfigurationError> {
        self.cooling.reheat(alpha)
    }

    pub fn alpha(&self) -> f64 {
        self.cooling.alpha()
    }

    pub fn is_converged(&self) -> bool {
        self.cooling.is_converged()
    }

    pub fn set_observer(&mut self, observer: Option<TickObserver>) {
        self.observer = observer;
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Cool and count one step, then lend out what its forces need.
    pub fn begin_step(&mut self) -> Step<'_> {
        let alpha = self.cooling.step();
        self.ticks += 1;
        Step {
            ctx: ForceContext {
                alpha,
                ids: &self.ids,
                links: &self.links,
                radii: &self.radii,
            },
            link_version: self.link_version,
            forces: &self.forces,
            rng: &mut self.rng,
            velocity_decay: self.velocity_decay,
        }
    }

    /// One simulation step: cool, apply forces in order, integrate.
    pub fn step<B>(&mut self, bodies: &mut B, scratch: &mut ForceScratch) -> f64
    where
        B: Bodies + ?Sized,
    {
        let step = self.begin_step();
        forces::apply_all(bodies, step.forces, &step.ctx, scratch, step.rng);
        sim::integrate(bodies, step.velocity_decay);
        step.ctx.alpha
    }

    /// Tell the observer a step finished.
    pub fn notify(&mut self, alpha: f64) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&TickEvent {
                tick: self.ticks,
                alpha,
            });
        }
    }

    /// Summarize a `tick(n)` call, warning once if positions went non-finite.
    pub fn report<B>(&self, bodies: &B, ticks: u32) -> TickReport
    where
        B: Bodies + ?Sized,
    {
        let degenerate = (0..bodies.len()).filter(|&i| {
            let (x, y) = bodies.position(i);
            !(x.is_finite() && y.is_finite())
        });
        let count = degenerate.count();
        if count > 0 {
            log::warn!("{count} nodes have non-finite positions after tick {}", self.ticks);
        }
        TickReport {
            ticks,
            alpha: self.alpha(),
            converged: self.is_converged(),
        }
    }

    /// Positions (or velocities) keyed by id.
    pub fn snapshot<B>(&self, bodies: &B, velocities: bool) -> Positions
    where
        B: Bodies + ?Sized,
    {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                let (x, y) = if velocities {
                    bodies.velocity(i)
                } else {
                    bodies.position(i)
                };
                (id, Point::new(x, y))
            })
            .collect()
    }

    /// Drop per-graph state and the observer.
    pub fn clear(&mut self) {
        self.topology = Topology::default();
        self.ids = Vec::new();
        self.radii = Vec::new();
        self.link_specs = Vec::new();
        self.links = Vec::new();
        self.link_version += 1;
        self.observer = None;
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("nodes", &self.ids.len())
            .field("links", &self.links.len())
            .field("forces", &self.forces)
            .field("cooling", &self.cooling)
            .field("velocity_decay", &self.velocity_decay)
            .field("ticks", &self.ticks)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

fn validate_spec(spec: &NodeSpec) -> Result<(), ConfigurationError> {
    for (parameter, value) in [
        ("node.x", spec.x),
        ("node.y", spec.y),
        ("node.vx", spec.vx),
        ("node.vy", spec.vy),
        ("node.fx", spec.fx),
        ("node.fy", spec.fy),
    ] {
        if let Some(value) = value {
            error::finite(parameter, value)?;
        }
    }
    if let Some(radius) = spec.radius {
        error::non_negative("node.radius", radius)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Simulation {
        Simulation::new(SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_new_nodes_on_spiral() {
        let sim = sim();
        let plan = sim
            .plan_nodes(&[NodeSpec::new(10), NodeSpec::at(20, 1.0, 2.0)], |_| {
                SimNode::default()
            })
            .unwrap();
        let first = sim::phyllotaxis(0);
        assert_eq!((plan.nodes[0].x, plan.nodes[0].y), (first.x, first.y));
        assert_eq!((plan.nodes[1].x, plan.nodes[1].y), (1.0, 2.0));
    }

    #[test]
    fn test_existing_nodes_keep_state() {
        let mut sim = sim();
        let plan = sim
            .plan_nodes(&[NodeSpec::at(1, 5.0, 6.0)], |_| SimNode::default())
            .unwrap();
        let mut nodes = sim.commit_nodes(plan);
        nodes[0].vx = 2.0;

        let plan = sim
            .plan_nodes(&[NodeSpec::new(2), NodeSpec::new(1)], |slot| nodes[slot])
            .unwrap();
        let kept = plan.nodes[1];
        assert_eq!((kept.x, kept.y, kept.vx), (5.0, 6.0, 2.0));
    }

    #[test]
    fn test_pin_overrides_position() {
        let sim = sim();
        let plan = sim
            .plan_nodes(&[NodeSpec::at(1, 5.0, 6.0).pinned(-1.0, -2.0)], |_| {
                SimNode::default()
            })
            .unwrap();
        assert_eq!((plan.nodes[0].x, plan.nodes[0].y), (-1.0, -2.0));
    }

    #[test]
    fn test_invalid_node_rejected() {
        let sim = sim();
        let spec = NodeSpec {
            x: Some(f64::NAN),
            ..NodeSpec::new(1)
        };
        assert!(sim.plan_nodes(&[spec], |_| SimNode::default()).is_err());
        let duplicate = [NodeSpec::new(1), NodeSpec::new(1)];
        assert_eq!(
            sim.plan_nodes(&duplicate, |_| SimNode::default()).err(),
            Some(ConfigurationError::DuplicateNode(NodeId(1)))
        );
    }

    #[test]
    fn test_shrinking_node_set_prunes_links() {
        let mut sim = sim();
        let specs: Vec<NodeSpec> = (0..4).map(NodeSpec::new).collect();
        let plan = sim.plan_nodes(&specs, |_| SimNode::default()).unwrap();
        sim.commit_nodes(plan);
        sim.set_links(&[LinkSpec::new(0, 1), LinkSpec::new(1, 2), LinkSpec::new(2, 3)])
            .unwrap();

        let plan = sim
            .plan_nodes(&[NodeSpec::new(3), NodeSpec::new(2), NodeSpec::new(1)], |_| {
                SimNode::default()
            })
            .unwrap();
        assert_eq!(plan.pruned, 1);
        sim.commit_nodes(plan);
        assert_eq!(sim.link_count(), 2);
        // Slots follow the new order, not the old ids.
        assert_eq!(sim.slot(NodeId(3)), Ok(0));
        assert_eq!(sim.slot(NodeId(0)), Err(ConfigurationError::UnknownNode(NodeId(0))));
    }
}
