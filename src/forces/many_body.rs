//! Many-body force via Barnes–Hut approximation.
//!
//! The quadtree is rebuilt from current positions and annotated with subtree
//! charge and charge-weighted centroid. Each node then walks the tree from
//! the root: a quad whose width is small relative to its distance
//! (`w² / θ² < l²`) acts as one pseudo-body at its centroid, otherwise the
//! walk descends. Leaves sum their coincident chain, skipping the node
//! itself, so a node never repels itself.

use super::params::ManyBodyParams;
use super::{Bodies, ForceScratch};
use crate::sim::Lcg;

pub(crate) fn apply<B>(
    bodies: &mut B,
    params: &ManyBodyParams,
    alpha: f64,
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
    values.resize(n, params.strength);
    tree.rebuild((0..n).map(|i| bodies.position(i)));
    tree.accumulate_charge(values);
    let tree = &*tree;

    let theta2 = params.theta * params.theta;
    let dmin2 = params.distance_min * params.distance_min;
    let dmax2 = params.distance_max.map_or(f64::INFINITY, |d| d * d);

    for i in 0..n {
        let (xi, yi) = bodies.position(i);
        let (mut vx, mut vy) = bodies.velocity(i);

        tree.visit(stack, |quad, bounds| {
            if quad.value == 0.0 || quad.value.is_nan() {
                return true;
            }

            let mut x = quad.cx - xi;
            let mut y = quad.cy - yi;
            let w = bounds.width();
            let mut l = x * x + y * y;

            // Far enough away: treat the whole quad as one body.
            if w * w / theta2 < l {
                if l < dmax2 {
                    if x == 0.0 {
                        x = rng.jiggle();
                        l += x * x;
                    }
                    if y == 0.0 {
                        y = rng.jiggle();
                        l += y * y;
                    }
                    if l < dmin2 {
                        l = (dmin2 * l).sqrt();
                    }
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
                if x == 0.0 {
                    x = rng.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = rng.jiggle();
                    l += y * y;
                }
                if l < dmin2 {
                    l = (dmin2 * l).sqrt();
                }
            }

            for body in tree.chain(head) {
                if body != i {
                    let w = values[body] * alpha / l;
                    vx += x * w;
                    vy += y * w;
                }
            }
            false
        });

        bodies.set_velocity(i, vx, vy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::testing::TestBodies;

    fn run(bodies: &mut TestBodies, params: &ManyBodyParams, alpha: f64) {
        apply(
            bodies,
            params,
            alpha,
            &mut ForceScratch::default(),
            &mut Lcg::default(),
        );
    }

    #[test]
    fn test_two_bodies_repel() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (10.0, 0.0)]);
        run(&mut bodies, &ManyBodyParams::default(), 1.0);

        // -30 * 10 / 100 on each side.
        assert!((bodies.vx[0] + 3.0).abs() < 1e-6, "{}", bodies.vx[0]);
        assert!((bodies.vx[1] - 3.0).abs() < 1e-6, "{}", bodies.vx[1]);
        assert!(bodies.vy[0].abs() < 1e-6);
    }

    #[test]
    fn test_positive_strength_attracts() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (10.0, 0.0)]);
        let params = ManyBodyParams {
            strength: 30.0,
            ..ManyBodyParams::default()
        };
        run(&mut bodies, &params, 0.5);
        assert!(bodies.vx[0] > 0.0);
        assert!(bodies.vx[1] < 0.0);
    }

    #[test]
    fn test_single_body_feels_nothing() {
        let mut bodies = TestBodies::from_positions(&[(3.0, 4.0)]);
        run(&mut bodies, &ManyBodyParams::default(), 1.0);
        assert_eq!((bodies.vx[0], bodies.vy[0]), (0.0, 0.0));
    }

    #[test]
    fn test_coincident_bodies_stay_finite() {
        let mut bodies = TestBodies::from_positions(&[(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        run(&mut bodies, &ManyBodyParams::default(), 1.0);
        for i in 0..3 {
            assert!(bodies.vx[i].is_finite());
            assert!(bodies.vy[i].is_finite());
        }
        let moved = (0..3).any(|i| bodies.vx[i] != 0.0 || bodies.vy[i] != 0.0);
        assert!(moved);
    }

    #[test]
    fn test_approximation_close_to_exact() {
        let points: Vec<(f64, f64)> = (0..300)
            .map(|i| {
                let p = crate::sim::phyllotaxis(i);
                (p.x, p.y)
            })
            .collect();

        let mut exact = TestBodies::from_positions(&points);
        run(
            &mut exact,
            &ManyBodyParams {
                theta: 0.0,
                ..ManyBodyParams::default()
            },
            1.0,
        );
        let mut approx = TestBodies::from_positions(&points);
        run(&mut approx, &ManyBodyParams::default(), 1.0);

        let scale = exact.vx.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        for i in 0..points.len() {
            assert!((exact.vx[i] - approx.vx[i]).abs() < 0.1 * scale);
            assert!((exact.vy[i] - approx.vy[i]).abs() < 0.1 * scale);
        }
    }

    #[test]
    fn test_distance_max_cuts_off() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (100.0, 0.0)]);
        let params = ManyBodyParams {
            distance_max: Some(50.0),
            ..ManyBodyParams::default()
        };
        run(&mut bodies, &params, 1.0);
        assert_eq!(bodies.vx, [0.0, 0.0]);
    }

    #[test]
    fn test_distance_min_floors_force() {
        let mut near = TestBodies::from_positions(&[(0.0, 0.0), (0.1, 0.0)]);
        let params = ManyBodyParams {
            theta: 0.0,
            distance_min: 10.0,
            ..ManyBodyParams::default()
        };
        run(&mut near, &params, 1.0);
        // l = sqrt(100 * 0.01) = 1, so vx = 0.1 * -30 / 1.
        assert!((near.vx[1] - 3.0).abs() < 1e-6, "{}", near.vx[1]);
    }
}
