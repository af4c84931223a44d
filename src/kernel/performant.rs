//! Performant kernel.
//!
//! Node state lives in structure-of-arrays `f64` buffers with pins packed
//! into one flag byte per node. Many-body, link and integration run as
//! direct loops over those slices; links are flattened into columns that are
//! rebuilt only when the link set or link parameters change. The remaining
//! forces go through the shared force library. The quadtree arena and force
//! scratch are kept across ticks, and positions are mirrored into an
//! interleaved `[x0, y0, x1, y1, ...]` buffer at the end of every `tick` call
//! so a host can read them without a per-frame copy.
//!
//! Buffers are reserved with `try_reserve`; an allocation failure is reported
//! as `KernelUnavailable` instead of aborting. The kernel must be disposed
//! before it is dropped.

use std::collections::TryReserveError;

use super::reference::SimNode;
use super::simulation::{Simulation, Step};
use super::{EngineAdapter, KernelKind, PositionBuffer, TickObserver, TickReport};
use crate::error::{self, LayoutError, Result};
use crate::forces::{self, Bodies, ForceParams, ForceScratch, ForceSet, LinkParams, ManyBodyParams};
use crate::graph::{LinkSpec, NodeId, NodeSpec, PinFlags, Positions, ResolvedLink};
use crate::sim::{AlphaSchedule, Lcg, SimulationConfig};

/// SoA node buffers.
#[derive(Debug, Default)]
struct NodeBuffers {
    /// X positions (SoA layout)
    pos_x: Vec<f64>,
    /// Y positions (SoA layout)
    pos_y: Vec<f64>,
    /// X velocities (SoA layout)
    vel_x: Vec<f64>,
    /// Y velocities (SoA layout)
    vel_y: Vec<f64>,
    /// Pin coordinates; only meaningful where the matching flag is set.
    pin_x: Vec<f64>,
    pin_y: Vec<f64>,
    pins: Vec<PinFlags>,
    radius: Vec<Option<f64>>,
}

impl NodeBuffers {
    /// Make room for `n` nodes without aborting on failure.
    fn try_reserve(&mut self, n: usize) -> std::result::Result<(), TryReserveError> {
        for buffer in [
            &mut self.pos_x,
            &mut self.pos_y,
            &mut self.vel_x,
            &mut self.vel_y,
            &mut self.pin_x,
            &mut self.pin_y,
        ] {
            buffer.try_reserve(n.saturating_sub(buffer.len()))?;
        }
        self.radius.try_reserve(n.saturating_sub(self.radius.len()))?;
        self.pins.try_reserve(n.saturating_sub(self.pins.len()))?;
        Ok(())
    }

    fn fill(&mut self, nodes: &[SimNode]) {
        self.clear();
        for node in nodes {
            self.pos_x.push(node.x);
            self.pos_y.push(node.y);
            self.vel_x.push(node.vx);
            self.vel_y.push(node.vy);
            self.pin_x.push(node.fx.unwrap_or(0.0));
            self.pin_y.push(node.fy.unwrap_or(0.0));
            self.pins.push(PinFlags::from_pins(node.fx, node.fy));
            self.radius.push(node.radius);
        }
    }

    fn clear(&mut self) {
        self.pos_x.clear();
        self.pos_y.clear();
        self.vel_x.clear();
        self.vel_y.clear();
        self.pin_x.clear();
        self.pin_y.clear();
        self.pins.clear();
        self.radius.clear();
    }

    fn node(&self, id: NodeId, i: usize) -> SimNode {
        let (fx, fy) = self.pin(i);
        SimNode {
            id,
            x: self.pos_x[i],
            y: self.pos_y[i],
            vx: self.vel_x[i],
            vy: self.vel_y[i],
            fx,
            fy,
            radius: self.radius[i],
        }
    }

    /// Barnes–Hut repulsion with one uniform charge per node.
    fn many_body(
        &mut self,
        params: &ManyBodyParams,
        alpha: f64,
        scratch: &mut ForceScratch,
        rng: &mut Lcg,
    ) {
        let n = self.len();
        if n == 0 {
            return;
        }

        let ForceScratch {
            tree,
            stack,
            values,
        } = scratch;
        values.clear();
        values.resize(n, params.strength);
        tree.rebuild(self.pos_x.iter().copied().zip(self.pos_y.iter().copied()));
        tree.accumulate_charge(values);
        let tree = &*tree;

        let strength = params.strength;
        let theta2 = params.theta * params.theta;
        let dmin2 = params.distance_min * params.distance_min;
        let dmax2 = params.distance_max.map_or(f64::INFINITY, |d| d * d);
        let (pos_x, pos_y) = (&self.pos_x, &self.pos_y);

        for i in 0..n {
            let (xi, yi) = (pos_x[i], pos_y[i]);
            let mut vx = self.vel_x[i];
            let mut vy = self.vel_y[i];

            tree.visit(stack, |quad, bounds| {
                if quad.value == 0.0 || quad.value.is_nan() {
                    return true;
                }
                let mut x = quad.cx - xi;
                let mut y = quad.cy - yi;
                let mut l = x * x + y * y;
                let w = bounds.width();

                if w * w / theta2 < l {
                    if l < dmax2 {
                        separate(&mut x, &mut y, &mut l, dmin2, rng);
                        vx += x * quad.value * alpha / l;
                        vy += y * quad.value * alpha / l;
                    }
                    return true;
                }

                let Some(head) = quad.head() else {
                    return false;
                };
                if l >= dmax2 {
                    return false;
                }
                if head != i || tree.has_next(head) {
                    separate(&mut x, &mut y, &mut l, dmin2, rng);
                }
                let w = strength * alpha / l;
                for body in tree.chain(head) {
                    if body != i {
                        vx += x * w;
                        vy += y * w;
                    }
                }
                false
            });

            self.vel_x[i] = vx;
            self.vel_y[i] = vy;
        }
    }

    /// Springs over predicted positions, `iterations` passes.
    fn link(&mut self, links: &LinkColumns, iterations: u32, alpha: f64, rng: &mut Lcg) {
        for _ in 0..iterations {
            for k in 0..links.len() {
                let s = links.source[k] as usize;
                let t = links.target[k] as usize;

                let mut x = self.pos_x[t] + self.vel_x[t] - self.pos_x[s] - self.vel_x[s];
                if x == 0.0 || x.is_nan() {
                    x = rng.jiggle();
                }
                let mut y = self.pos_y[t] + self.vel_y[t] - self.pos_y[s] - self.vel_y[s];
                if y == 0.0 || y.is_nan() {
                    y = rng.jiggle();
                }

                let l = (x * x + y * y).sqrt();
                let l = (l - links.distance[k]) / l * alpha * links.strength[k];
                x *= l;
                y *= l;

                let b = links.bias[k];
                self.vel_x[t] -= x * b;
                self.vel_y[t] -= y * b;
                self.vel_x[s] += x * (1.0 - b);
                self.vel_y[s] += y * (1.0 - b);
            }
        }
    }

    /// Velocity decay then position update; pinned axes snap to their pin.
    fn integrate(&mut self, velocity_decay: f64) {
        let keep = 1.0 - velocity_decay;
        for i in 0..self.len() {
            let flags = self.pins[i];
            if !flags.any() {
                self.vel_x[i] *= keep;
                self.vel_y[i] *= keep;
                self.pos_x[i] += self.vel_x[i];
                self.pos_y[i] += self.vel_y[i];
                continue;
            }
            if flags.is_x() {
                self.pos_x[i] = self.pin_x[i];
                self.vel_x[i] = 0.0;
            } else {
                self.vel_x[i] *= keep;
                self.pos_x[i] += self.vel_x[i];
            }
            if flags.is_y() {
                self.pos_y[i] = self.pin_y[i];
                self.vel_y[i] = 0.0;
            } else {
                self.vel_y[i] *= keep;
                self.pos_y[i] += self.vel_y[i];
            }
        }
    }
}

/// Break exact coincidence with a jiggle, then floor `l` by `distance_min`.
#[inline]
fn separate(x: &mut f64, y: &mut f64, l: &mut f64, dmin2: f64, rng: &mut Lcg) {
    if *x == 0.0 {
        *x = rng.jiggle();
        *l += *x * *x;
    }
    if *y == 0.0 {
        *y = rng.jiggle();
        *l += *y * *y;
    }
    if *l < dmin2 {
        *l = (dmin2 * *l).sqrt();
    }
}

/// Links flattened into columns with distance and strength already resolved
/// against one set of link parameters.
#[derive(Debug, Default)]
struct LinkColumns {
    source: Vec<u32>,
    target: Vec<u32>,
    bias: Vec<f64>,
    distance: Vec<f64>,
    strength: Vec<f64>,
    /// Link version and parameters the columns were built from.
    key: Option<(u64, LinkParams)>,
}

impl LinkColumns {
    fn len(&self) -> usize {
        self.source.len()
    }

    /// Rebuild unless already built for `version` and `params`.
    fn refresh(&mut self, links: &[ResolvedLink], params: &LinkParams, version: u64) {
        let key = Some((version, *params));
        if self.key == key {
            return;
        }
        self.source.clear();
        self.target.clear();
        self.bias.clear();
        self.distance.clear();
        self.strength.clear();
        for link in links {
            self.source.push(link.source as u32);
            self.target.push(link.target as u32);
            self.bias.push(link.bias);
            self.distance.push(link.distance_or(params.distance));
            self.strength.push(link.strength_or(params.strength));
        }
        self.key = key;
    }
}

impl Bodies for NodeBuffers {
    #[inline]
    fn len(&self) -> usize {
        self.pos_x.len()
    }

    #[inline]
    fn position(&self, i: usize) -> (f64, f64) {
        (self.pos_x[i], self.pos_y[i])
    }

    #[inline]
    fn velocity(&self, i: usize) -> (f64, f64) {
        (self.vel_x[i], self.vel_y[i])
    }

    #[inline]
    fn set_position(&mut self, i: usize, x: f64, y: f64) {
        self.pos_x[i] = x;
        self.pos_y[i] = y;
    }

    #[inline]
    fn set_velocity(&mut self, i: usize, vx: f64, vy: f64) {
        self.vel_x[i] = vx;
        self.vel_y[i] = vy;
    }

    #[inline]
    fn add_velocity(&mut self, i: usize, dvx: f64, dvy: f64) {
        self.vel_x[i] += dvx;
        self.vel_y[i] += dvy;
    }

    #[inline]
    fn pin(&self, i: usize) -> (Option<f64>, Option<f64>) {
        let flags = self.pins[i];
        (
            flags.is_x().then(|| self.pin_x[i]),
            flags.is_y().then(|| self.pin_y[i]),
        )
    }
}

/// Reserve node and egress buffers for `n` nodes.
fn reserve(buffers: &mut NodeBuffers, egress: &mut Vec<f64>, n: usize) -> Result<()> {
    let unavailable = |reason: String| LayoutError::KernelUnavailable {
        kernel: KernelKind::Performant.name(),
        reason,
    };
    buffers
        .try_reserve(n)
        .map_err(|err| unavailable(format!("cannot allocate buffers for {n} nodes: {err}")))?;
    let interleaved = n
        .checked_mul(2)
        .ok_or_else(|| unavailable(format!("position buffer for {n} nodes overflows")))?;
    egress
        .try_reserve(interleaved.saturating_sub(egress.len()))
        .map_err(|err| unavailable(format!("cannot allocate position buffer: {err}")))?;
    Ok(())
}

/// Throughput-oriented kernel with explicit buffer ownership.
#[derive(Debug)]
pub struct PerformantKernel {
    sim: Simulation,
    buffers: NodeBuffers,
    links: LinkColumns,
    scratch: ForceScratch,
    /// Interleaved positions, synchronized after every mutation.
    egress: Vec<f64>,
    disposed: bool,
}

impl PerformantKernel {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_capacity(config, 0)
    }

    /// Create a kernel with buffers reserved for `capacity` nodes.
    pub fn with_capacity(config: SimulationConfig, capacity: usize) -> Result<Self> {
        let sim = Simulation::new(config)?;
        let mut buffers = NodeBuffers::default();
        let mut egress = Vec::new();
        reserve(&mut buffers, &mut egress, capacity)?;
        Ok(Self {
            sim,
            buffers,
            links: LinkColumns::default(),
            scratch: ForceScratch::with_capacity(capacity),
            egress,
            disposed: false,
        })
    }

    /// Interleaved `[x0, y0, x1, y1, ...]` positions in slot order.
    ///
    /// Valid until the next mutating call.
    pub fn positions_buffer(&self) -> Result<&[f64]> {
        self.live()?;
        Ok(&self.egress)
    }

    /// Node id for each slot of [`positions_buffer`](Self::positions_buffer).
    pub fn slot_ids(&self) -> Result<&[NodeId]> {
        self.live()?;
        Ok(self.sim.ids())
    }

    fn live(&self) -> Result<()> {
        if self.disposed {
            Err(LayoutError::Disposed)
        } else {
            Ok(())
        }
    }

    /// One step: cool, run enabled forces in order, integrate.
    fn step(&mut self) -> f64 {
        let Self {
            sim,
            buffers,
            links,
            scratch,
            ..
        } = self;
        let Step {
            ctx,
            link_version,
            forces: force_set,
            rng,
            velocity_decay,
        } = sim.begin_step();

        for force in force_set.enabled() {
            match &force.params {
                ForceParams::ManyBody(p) => buffers.many_body(p, ctx.alpha, scratch, rng),
                ForceParams::Link(p) => {
                    links.refresh(ctx.links, p, link_version);
                    buffers.link(links, p.iterations, ctx.alpha, rng);
                }
                params => forces::apply_one(buffers, params, &ctx, scratch, rng),
            }
        }
        buffers.integrate(velocity_decay);
        ctx.alpha
    }

    fn sync_egress(&mut self) {
        let n = self.buffers.len();
        self.egress.resize(n * 2, 0.0);
        for (i, pair) in self.egress.chunks_exact_mut(2).enumerate() {
            pair[0] = self.buffers.pos_x[i];
            pair[1] = self.buffers.pos_y[i];
        }
    }
}

impl EngineAdapter for PerformantKernel {
    fn kind(&self) -> KernelKind {
        KernelKind::Performant
    }

    fn set_nodes(&mut self, nodes: &[NodeSpec]) -> Result<usize> {
        self.live()?;
        let ids = self.sim.ids();
        let buffers = &self.buffers;
        let plan = self
            .sim
            .plan_nodes(nodes, |slot| buffers.node(ids[slot], slot))?;
        reserve(&mut self.buffers, &mut self.egress, nodes.len())?;

        let pruned = plan.pruned;
        let states = self.sim.commit_nodes(plan);
        self.buffers.fill(&states);
        self.sync_egress();
        Ok(pruned)
    }

    fn set_links(&mut self, links: &[LinkSpec]) -> Result<()> {
        self.live()?;
        Ok(self.sim.set_links(links)?)
    }

    fn configure_force(&mut self, name: &str, params: ForceParams) -> Result<()> {
        self.live()?;
        Ok(self.sim.configure_force(name, params)?)
    }

    fn enable_force(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.live()?;
        Ok(self.sim.enable_force(name, enabled)?)
    }

    fn register_force(&mut self, name: &str, params: ForceParams, enabled: bool) -> Result<()> {
        self.live()?;
        Ok(self.sim.register_force(name, params, enabled)?)
    }

    fn set_forces(&mut self, forces: ForceSet) -> Result<()> {
        self.live()?;
        Ok(self.sim.set_forces(forces)?)
    }

    fn set_alpha_schedule(&mut self, schedule: AlphaSchedule) -> Result<()> {
        self.live()?;
        Ok(self.sim.set_alpha_schedule(schedule)?)
    }

    fn alpha_schedule(&self) -> Result<AlphaSchedule> {
        self.live()?;
        Ok(self.sim.alpha_schedule())
    }

    fn set_velocity_decay(&mut self, decay: f64) -> Result<()> {
        self.live()?;
        Ok(self.sim.set_velocity_decay(decay)?)
    }

    fn tick(&mut self, n: u32) -> Result<TickReport> {
        self.live()?;
        for _ in 0..n {
            let alpha = self.step();
            self.sim.notify(alpha);
        }
        self.sync_egress();
        Ok(self.sim.report(&self.buffers, n))
    }

    fn positions(&self) -> Result<Positions> {
        self.live()?;
        Ok(self.sim.snapshot(&self.buffers, false))
    }

    fn velocities(&self) -> Result<Positions> {
        self.live()?;
        Ok(self.sim.snapshot(&self.buffers, true))
    }

    fn pin(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        self.live()?;
        let i = self.sim.slot(id)?;
        let (x, y) = (error::finite("pin.x", x)?, error::finite("pin.y", y)?);
        let buffers = &mut self.buffers;
        buffers.pin_x[i] = x;
        buffers.pin_y[i] = y;
        buffers.pins[i] = PinFlags::from_pins(Some(x), Some(y));
        buffers.set_position(i, x, y);
        buffers.set_velocity(i, 0.0, 0.0);
        self.sync_egress();
        Ok(())
    }

    fn unpin(&mut self, id: NodeId) -> Result<()> {
        self.live()?;
        let i = self.sim.slot(id)?;
        self.buffers.pins[i] = PinFlags::new();
        Ok(())
    }

    fn reheat(&mut self, alpha: f64) -> Result<()> {
        self.live()?;
        Ok(self.sim.reheat(alpha)?)
    }

    fn alpha(&self) -> Result<f64> {
        self.live()?;
        Ok(self.sim.alpha())
    }

    fn is_converged(&self) -> Result<bool> {
        self.live()?;
        Ok(self.sim.is_converged())
    }

    fn node_count(&self) -> Result<usize> {
        self.live()?;
        Ok(self.sim.node_count())
    }

    fn link_count(&self) -> Result<usize> {
        self.live()?;
        Ok(self.sim.link_count())
    }

    fn set_tick_observer(&mut self, observer: Option<TickObserver>) -> Result<()> {
        self.live()?;
        self.sim.set_observer(observer);
        Ok(())
    }

    fn position_buffer(&self) -> Result<Option<PositionBuffer<'_>>> {
        Ok(Some(PositionBuffer {
            ids: self.slot_ids()?,
            xy: self.positions_buffer()?,
        }))
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.buffers = NodeBuffers::default();
        self.links = LinkColumns::default();
        self.scratch = ForceScratch::default();
        self.egress = Vec::new();
        self.sim.clear();
        self.disposed = true;
        log::debug!("performant kernel disposed");
    }
}

impl Drop for PerformantKernel {
    fn drop(&mut self) {
        if !self.disposed {
            log::warn!(
                "performant kernel with {} nodes dropped without dispose()",
                self.buffers.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::ForceContext;
    use crate::forces::testing::TestBodies;
    use crate::graph::{Point, Topology};

    fn kernel() -> PerformantKernel {
        PerformantKernel::new(SimulationConfig::default()).unwrap()
    }

    /// Spiral of moving nodes with every seventeenth x-pinned in place.
    fn scattered(n: usize) -> Vec<SimNode> {
        (0..n)
            .map(|i| {
                let p = crate::sim::phyllotaxis(i);
                SimNode {
                    id: NodeId(i as u32),
                    x: p.x,
                    y: p.y,
                    vx: (i % 5) as f64 - 2.0,
                    vy: (i % 3) as f64 - 1.0,
                    fx: (i % 17 == 0).then_some(p.x),
                    fy: None,
                    radius: None,
                }
            })
            .collect()
    }

    fn mirror(nodes: &[SimNode]) -> TestBodies {
        let points: Vec<(f64, f64)> = nodes.iter().map(|node| (node.x, node.y)).collect();
        let mut bodies = TestBodies::from_positions(&points);
        bodies.vx = nodes.iter().map(|node| node.vx).collect();
        bodies.vy = nodes.iter().map(|node| node.vy).collect();
        bodies.pins = nodes.iter().map(|node| (node.fx, node.fy)).collect();
        bodies
    }

    fn assert_same_state(buffers: &NodeBuffers, bodies: &TestBodies) {
        assert_eq!(buffers.pos_x, bodies.x);
        assert_eq!(buffers.pos_y, bodies.y);
        assert_eq!(buffers.vel_x, bodies.vx);
        assert_eq!(buffers.vel_y, bodies.vy);
    }

    #[test]
    fn test_slice_loops_match_force_library() {
        let nodes = scattered(300);
        let mut buffers = NodeBuffers::default();
        buffers.fill(&nodes);
        let mut bodies = mirror(&nodes);

        let ids: Vec<NodeId> = nodes.iter().map(|node| node.id).collect();
        let mut topology = Topology::from_ids(ids.iter().copied()).unwrap();
        let specs: Vec<LinkSpec> = (1..300u32).map(|i| LinkSpec::new(i, (i - 1) / 3)).collect();
        let resolved = topology.resolve(&specs).unwrap();
        let radii = vec![None; nodes.len()];
        let ctx = ForceContext {
            alpha: 0.7,
            ids: &ids,
            links: &resolved,
            radii: &radii,
        };
        let (mut slice_rng, mut library_rng) = (Lcg::default(), Lcg::default());
        let (mut slice_scratch, mut library_scratch) = (ForceScratch::default(), ForceScratch::default());

        let many_body = ManyBodyParams::default();
        buffers.many_body(&many_body, ctx.alpha, &mut slice_scratch, &mut slice_rng);
        forces::apply_one(
            &mut bodies,
            &ForceParams::ManyBody(many_body),
            &ctx,
            &mut library_scratch,
            &mut library_rng,
        );
        assert_same_state(&buffers, &bodies);

        let link = LinkParams {
            iterations: 2,
            ..LinkParams::default()
        };
        let mut columns = LinkColumns::default();
        columns.refresh(&resolved, &link, 1);
        buffers.link(&columns, link.iterations, ctx.alpha, &mut slice_rng);
        forces::apply_one(
            &mut bodies,
            &ForceParams::Link(link),
            &ctx,
            &mut library_scratch,
            &mut library_rng,
        );
        assert_same_state(&buffers, &bodies);

        buffers.integrate(0.4);
        crate::sim::integrate(&mut bodies, 0.4);
        assert_same_state(&buffers, &bodies);
        assert_eq!(buffers.pos_x[17], nodes[17].x);
        assert_eq!(buffers.vel_x[17], 0.0);
    }

    #[test]
    fn test_link_columns_follow_version_and_params() {
        let mut topology = Topology::from_ids([NodeId(0), NodeId(1)]).unwrap();
        let resolved = topology
            .resolve(&[LinkSpec::new(0, 1).with_strength(0.25)])
            .unwrap();
        let mut columns = LinkColumns::default();

        columns.refresh(&resolved, &LinkParams::default(), 1);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns.distance, [30.0]);
        assert_eq!(columns.strength, [0.25]);

        let longer = LinkParams {
            distance: 80.0,
            ..LinkParams::default()
        };
        columns.refresh(&resolved, &longer, 1);
        assert_eq!(columns.distance, [80.0]);

        columns.refresh(&[], &longer, 2);
        assert_eq!(columns.len(), 0);
    }

    #[test]
    fn test_egress_synced_once_per_tick_call() {
        let mut kernel = kernel();
        kernel
            .set_nodes(&[NodeSpec::at(1, 0.0, 0.0), NodeSpec::at(2, 40.0, 0.0)])
            .unwrap();
        kernel.set_links(&[LinkSpec::new(1, 2)]).unwrap();
        let before = kernel.positions_buffer().unwrap().to_vec();

        kernel.tick(3).unwrap();
        let positions = kernel.positions().unwrap();
        let buffer = kernel.positions_buffer().unwrap();
        assert_ne!(buffer, before.as_slice());
        assert_eq!(buffer[2], positions[&NodeId(2)].x);
        kernel.dispose();
    }

    #[test]
    fn test_egress_buffer_tracks_positions() {
        let mut kernel = kernel();
        kernel
            .set_nodes(&[NodeSpec::at(4, 1.0, 2.0), NodeSpec::at(9, 3.0, 4.0)])
            .unwrap();
        assert_eq!(kernel.positions_buffer().unwrap(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(kernel.slot_ids().unwrap(), [NodeId(4), NodeId(9)]);

        kernel.tick(5).unwrap();
        let positions = kernel.positions().unwrap();
        let buffer = kernel.positions_buffer().unwrap();
        assert_eq!(buffer[0], positions[&NodeId(4)].x);
        assert_eq!(buffer[3], positions[&NodeId(9)].y);

        let view = kernel.position_buffer().unwrap().unwrap();
        assert_eq!(view.xy, buffer);
        assert_eq!(view.ids.len() * 2, view.xy.len());
        kernel.dispose();
    }

    #[test]
    fn test_disposed_kernel_rejects_calls() {
        let mut kernel = kernel();
        kernel.set_nodes(&[NodeSpec::new(1)]).unwrap();
        kernel.dispose();
        kernel.dispose();

        assert_eq!(kernel.tick(1).unwrap_err(), LayoutError::Disposed);
        assert_eq!(kernel.positions().unwrap_err(), LayoutError::Disposed);
        assert_eq!(kernel.set_nodes(&[]).unwrap_err(), LayoutError::Disposed);
        assert!(kernel.positions_buffer().is_err());
    }

    #[test]
    fn test_unallocatable_capacity_is_unavailable() {
        let err = PerformantKernel::with_capacity(SimulationConfig::default(), usize::MAX / 2)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            LayoutError::KernelUnavailable {
                kernel: "performant",
                ..
            }
        ));
    }

    #[test]
    fn test_partial_pin_survives_set_nodes() {
        let mut kernel = kernel();
        kernel
            .set_nodes(&[NodeSpec {
                fx: Some(10.0),
                ..NodeSpec::at(1, 0.0, 0.0)
            }])
            .unwrap();
        kernel.tick(20).unwrap();
        assert_eq!(kernel.positions().unwrap()[&NodeId(1)].x, 10.0);

        kernel.set_nodes(&[NodeSpec::new(1), NodeSpec::new(2)]).unwrap();
        kernel.tick(20).unwrap();
        assert_eq!(kernel.positions().unwrap()[&NodeId(1)].x, 10.0);

        kernel.pin(NodeId(2), -5.0, 5.0).unwrap();
        assert_eq!(kernel.positions().unwrap()[&NodeId(2)], Point::new(-5.0, 5.0));
        kernel.dispose();
    }
}
