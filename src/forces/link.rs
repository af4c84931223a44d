//! Spring force along resolved links.

use super::Bodies;
use super::params::LinkParams;
use crate::graph::ResolvedLink;
use crate::sim::Lcg;

/// Pull each link toward its rest distance.
///
/// Distances are measured between predicted positions `p + v`. The
/// correction is split by `bias` so that the endpoint with fewer links moves
/// more.
pub(crate) fn apply<B>(
    bodies: &mut B,
    params: &LinkParams,
    links: &[ResolvedLink],
    alpha: f64,
    rng: &mut Lcg,
) where
    B: Bodies + ?Sized,
{
    for _ in 0..params.iterations {
        for link in links {
            let (sx, sy) = bodies.position(link.source);
            let (svx, svy) = bodies.velocity(link.source);
            let (tx, ty) = bodies.position(link.target);
            let (tvx, tvy) = bodies.velocity(link.target);

            let mut x = tx + tvx - sx - svx;
            if x == 0.0 || x.is_nan() {
                x = rng.jiggle();
            }
            let mut y = ty + tvy - sy - svy;
            if y == 0.0 || y.is_nan() {
                y = rng.jiggle();
            }

            let l = (x * x + y * y).sqrt();
            let l = (l - link.distance_or(params.distance)) / l
                * alpha
                * link.strength_or(params.strength);
            x *= l;
            y *= l;

            let b = link.bias;
            bodies.add_velocity(link.target, -x * b, -y * b);
            bodies.add_velocity(link.source, x * (1.0 - b), y * (1.0 - b));
        }
    }
}
