//! Circle-circle collision separation.
//!
//! Positions are predicted one step ahead (`p + v`) and indexed in the
//! quadtree, annotated with the largest radius per subtree. Quads that
//! cannot overlap the query circle are pruned. Each overlapping pair is
//! resolved once, from the lower slot, and the displacement is split by
//! squared radius so the larger circle moves less.

use super::params::CollideParams;
use super::{Bodies, ForceScratch};
use crate::sim::Lcg;

pub(crate) fn apply<B>(
    bodies: &mut B,
    params: &CollideParams,
    radii: &[Option<f64>],
    scratch: &mut ForceScratch,
    rng: &mut Lcg,
) where
    B: Bodies + ?Sized,
{
    let n = bodies.len();
    if n == 0 {
        return;
    }

    let ForceScratch {
        tree,
        stack,
        values,
    } = scratch;

    values.clear();
    values.extend((0..n).map(|i| {
        radii
            .get(i)
            .copied()
            .flatten()
            .unwrap_or(params.radius)
    }));
    let strength = params.strength;

    for _ in 0..params.iterations {
        tree.rebuild((0..n).map(|i| {
            let (x, y) = bodies.position(i);
            let (vx, vy) = bodies.velocity(i);
            (x + vx, y + vy)
        }));
        tree.accumulate_radius(values);
        let tree = &*tree;

        for i in 0..n {
            let ri = values[i];
            let ri2 = ri * ri;
            let (x, y) = bodies.position(i);
            let (vx, vy) = bodies.velocity(i);
            let (xi, yi) = (x + vx, y + vy);

            tree.visit(stack, |quad, b| {
                let rj = quad.radius;
                let r = ri + rj;

                let Some(j) = quad.head() else {
                    return b.x0 > xi + r || b.x1 < xi - r || b.y0 > yi + r || b.y1 < yi - r;
                };
                if j <= i {
                    return false;
                }

                let (xj, yj) = bodies.position(j);
                let (vxj, vyj) = bodies.velocity(j);
                let mut x = xi - xj - vxj;
                let mut y = yi - yj - vyj;
                let mut l = x * x + y * y;
                if l >= r * r {
                    return false;
                }

                if x == 0.0 {
                    x = rng.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = rng.jiggle();
                    l += y * y;
                }
                let d = l.sqrt();
                let l = (r - d) / d * strength;
                x *= l;
                y *= l;

                let rj2 = rj * rj;
                let w = rj2 / (ri2 + rj2);
                bodies.add_velocity(i, x * w, y * w);
                bodies.add_velocity(j, -x * (1.0 - w), -y * (1.0 - w));
                false
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::testing::TestBodies;

    fn run(bodies: &mut TestBodies, params: &CollideParams, radii: &[Option<f64>]) {
        apply(
            bodies,
            params,
            radii,
            &mut ForceScratch::default(),
            &mut Lcg::default(),
        );
    }

    #[test]
    fn test_overlapping_pair_separates() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (1.0, 0.0)]);
        let params = CollideParams {
            radius: 5.0,
            strength: 1.0,
            iterations: 1,
        };
        run(&mut bodies, &params, &[None, None]);
        // Overlap of 9, split evenly between equal radii.
        assert!((bodies.vx[0] + 4.5).abs() < 1e-6, "{}", bodies.vx[0]);
        assert!((bodies.vx[1] - 4.5).abs() < 1e-6, "{}", bodies.vx[1]);
    }

    #[test]
    fn test_distant_pair_untouched() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (50.0, 0.0)]);
        run(&mut bodies, &CollideParams::default(), &[None, None]);
        assert_eq!(bodies.vx, [0.0, 0.0]);
    }

    #[test]
    fn test_larger_radius_moves_less() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (4.0, 0.0)]);
        run(
            &mut bodies,
            &CollideParams::default(),
            &[Some(1.0), Some(5.0)],
        );
        assert!(bodies.vx[0] < 0.0 && bodies.vx[1] > 0.0);
        assert!(bodies.vx[0].abs() > bodies.vx[1].abs());
    }

    #[test]
    fn test_iterations_resolve_overlap() {
        let points: Vec<(f64, f64)> = (0..20).map(|i| (i as f64 * 0.5, 0.0)).collect();
        let mut bodies = TestBodies::from_positions(&points);
        let params = CollideParams {
            radius: 2.0,
            strength: 1.0,
            iterations: 4,
        };
        let radii = vec![None; points.len()];
        for _ in 0..100 {
            run(&mut bodies, &params, &radii);
            for i in 0..bodies.x.len() {
                bodies.x[i] += bodies.vx[i];
                bodies.y[i] += bodies.vy[i];
                bodies.vx[i] = 0.0;
                bodies.vy[i] = 0.0;
            }
        }
        for i in 0..points.len() {
            for j in i + 1..points.len() {
                assert!(bodies.distance(i, j) > 3.0, "{i} {j} {}", bodies.distance(i, j));
            }
        }
    }
}
