//! Force library.
//!
//! Each force reads current positions and velocities and adds its
//! contribution to velocities. Forces never own node storage; they operate
//! on anything implementing [`Bodies`]. The reference kernel runs every force
//! from here; the performant kernel replaces the hot ones with its own
//! slice loops and falls back to [`apply_one`] for the rest.
//!
//! Enabled forces run in kind order: many-body, link, collide, x, y, center.

mod center;
mod collide;
mod link;
mod many_body;
mod params;
mod position;
mod set;

pub use params::{
    AxisParams, CenterParams, CollideParams, ForceKind, ForceParams, LinkParams, ManyBodyParams,
};
pub use set::{ForceSet, NamedForce};

use crate::graph::{NodeId, ResolvedLink};
use crate::sim::Lcg;
use crate::spatial::{Quadtree, VisitStack};

/// Mutable view of node state, indexed by kernel slot.
pub trait Bodies {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn position(&self, i: usize) -> (f64, f64);

    fn velocity(&self, i: usize) -> (f64, f64);

    fn set_position(&mut self, i: usize, x: f64, y: f64);

    fn set_velocity(&mut self, i: usize, vx: f64, vy: f64);

    /// Per-axis pin, if any.
    fn pin(&self, i: usize) -> (Option<f64>, Option<f64>);

    #[inline]
    fn add_velocity(&mut self, i: usize, dvx: f64, dvy: f64) {
        let (vx, vy) = self.velocity(i);
        self.set_velocity(i, vx + dvx, vy + dvy);
    }
}

/// Read-only inputs of one tick.
#[derive(Debug, Clone, Copy)]
pub struct ForceContext<'a> {
    pub alpha: f64,
    /// Node id per slot.
    pub ids: &'a [NodeId],
    pub links: &'a [ResolvedLink],
    /// Per-node collision radius override per slot.
    pub radii: &'a [Option<f64>],
}

/// Buffers reused across ticks by the tree-based forces.
#[derive(Debug, Clone, Default)]
pub struct ForceScratch {
    pub(crate) tree: Quadtree,
    pub(crate) stack: VisitStack,
    /// Per-body strengths or radii fed to the tree aggregation.
    pub(crate) values: Vec<f64>,
}

impl ForceScratch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: Quadtree::with_capacity(capacity),
            stack: VisitStack::with_capacity(64),
            values: Vec::with_capacity(capacity),
        }
    }
}

/// Apply every enabled force in `forces`, in order.
pub fn apply_all<B>(
    bodies: &mut B,
    forces: &ForceSet,
    ctx: &ForceContext<'_>,
    scratch: &mut ForceScratch,
    rng: &mut Lcg,
) where
    B: Bodies + ?Sized,
{
    for force in forces.enabled() {
        apply_one(bodies, &force.params, ctx, scratch, rng);
    }
}

/// Apply a single force.
pub fn apply_one<B>(
    bodies: &mut B,
    params: &ForceParams,
    ctx: &ForceContext<'_>,
    scratch: &mut ForceScratch,
    rng: &mut Lcg,
) where
    B: Bodies + ?Sized,
{
    match params {
        ForceParams::ManyBody(p) => many_body::apply(bodies, p, ctx.alpha, scratch, rng),
        ForceParams::Link(p) => link::apply(bodies, p, ctx.links, ctx.alpha, rng),
        ForceParams::Collide(p) => collide::apply(bodies, p, ctx.radii, scratch, rng),
        ForceParams::X(p) => position::apply_x(bodies, p, ctx.ids, ctx.alpha),
        ForceParams::Y(p) => position::apply_y(bodies, p, ctx.ids, ctx.alpha),
        ForceParams::Center(p) => center::apply(bodies, p),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Bodies;

    /// Minimal array-of-structs storage for force tests.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct TestBodies {
        pub x: Vec<f64>,
        pub y: Vec<f64>,
        pub vx: Vec<f64>,
        pub vy: Vec<f64>,
        pub pins: Vec<(Option<f64>, Option<f64>)>,
    }

    impl TestBodies {
        pub fn from_positions(points: &[(f64, f64)]) -> Self {
            let n = points.len();
            Self {
                x: points.iter().map(|p| p.0).collect(),
                y: points.iter().map(|p| p.1).collect(),
                vx: vec![0.0; n],
                vy: vec![0.0; n],
                pins: vec![(None, None); n],
            }
        }

        pub fn distance(&self, a: usize, b: usize) -> f64 {
            (self.x[a] - self.x[b]).hypot(self.y[a] - self.y[b])
        }
    }

    impl Bodies for TestBodies {
        fn len(&self) -> usize {
            self.x.len()
        }

        fn position(&self, i: usize) -> (f64, f64) {
            (self.x[i], self.y[i])
        }

        fn velocity(&self, i: usize) -> (f64, f64) {
            (self.vx[i], self.vy[i])
        }

        fn set_position(&mut self, i: usize, x: f64, y: f64) {
            self.x[i] = x;
            self.y[i] = y;
        }

        fn set_velocity(&mut self, i: usize, vx: f64, vy: f64) {
            self.vx[i] = vx;
            self.vy[i] = vy;
        }

        fn pin(&self, i: usize) -> (Option<f64>, Option<f64>) {
            self.pins[i]
        }
    }
}
