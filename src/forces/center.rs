//! Centering force.

use super::Bodies;
use super::params::CenterParams;

/// Pull the centroid toward `(params.x, params.y)` through per-node velocity.
///
/// The centroid offset `d = (target - centroid) · strength` is shared out in
/// proportion to each node's distance from the target, so outliers are pulled
/// harder than nodes already near it. Weights average to one, so the summed
/// pull still moves the centroid by `d`. When every node sits on the target
/// the pull is uniform. Alpha is not applied.
pub(crate) fn apply<B>(bodies: &mut B, params: &CenterParams)
where
    B: Bodies + ?Sized,
{
    let n = bodies.len();
    if n == 0 {
        return;
    }

    let (mut sx, mut sy, mut spread) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let (x, y) = bodies.position(i);
        sx += x;
        sy += y;
        spread += (x - params.x).hypot(y - params.y);
    }
    let dx = (params.x - sx / n as f64) * params.strength;
    let dy = (params.y - sy / n as f64) * params.strength;
    let mean = spread / n as f64;

    for i in 0..n {
        let w = if mean > 0.0 && mean.is_finite() {
            let (x, y) = bodies.position(i);
            (x - params.x).hypot(y - params.y) / mean
        } else {
            1.0
        };
        bodies.add_velocity(i, dx * w, dy * w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::testing::TestBodies;

    fn total(values: &[f64]) -> f64 {
        values.iter().sum()
    }

    #[test]
    fn test_full_strength_recenters() {
        let mut bodies = TestBodies::from_positions(&[(10.0, 10.0), (20.0, 30.0)]);
        apply(&mut bodies, &CenterParams::default());

        // Centroid (15, 20); the summed pull moves it exactly onto the origin.
        assert!((total(&bodies.vx) / 2.0 + 15.0).abs() < 1e-9);
        assert!((total(&bodies.vy) / 2.0 + 20.0).abs() < 1e-9);
        // Positions are left to the integrator.
        assert_eq!(bodies.x, [10.0, 20.0]);
    }

    #[test]
    fn test_pull_is_per_node() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (1.0, 0.0), (1000.0, 0.0)]);
        let params = CenterParams {
            strength: 0.1,
            ..CenterParams::default()
        };
        apply(&mut bodies, &params);

        // The node on the target feels nothing; the outlier takes most of the pull.
        assert_eq!(bodies.vx[0], 0.0);
        assert!(bodies.vx[2] < bodies.vx[1]);
        assert!(bodies.vx[2] < 0.0);
        assert_ne!(bodies.vx[1], bodies.vx[2]);
        let shift = (0.0 - 1001.0 / 3.0) * 0.1;
        assert!((total(&bodies.vx) / 3.0 - shift).abs() < 1e-9);
    }

    #[test]
    fn test_partial_strength_and_target() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (2.0, 0.0)]);
        let params = CenterParams {
            x: 11.0,
            y: 0.0,
            strength: 0.5,
        };
        apply(&mut bodies, &params);

        // Centroid 1 is pulled halfway to 11; node 0 is farther and pulled harder.
        assert!((total(&bodies.vx) / 2.0 - 5.0).abs() < 1e-9);
        assert!(bodies.vx[0] > bodies.vx[1]);
        assert!(bodies.vx[1] > 0.0);
        assert_eq!(bodies.vy, [0.0, 0.0]);
    }

    #[test]
    fn test_on_target_is_uniform() {
        let mut bodies = TestBodies::from_positions(&[(3.0, 4.0), (3.0, 4.0)]);
        let params = CenterParams {
            x: 3.0,
            y: 4.0,
            strength: 1.0,
        };
        apply(&mut bodies, &params);
        assert_eq!(bodies.vx, [0.0, 0.0]);
        assert_eq!(bodies.vy, [0.0, 0.0]);
    }

    #[test]
    fn test_empty_is_noop() {
        let mut bodies = TestBodies::default();
        apply(&mut bodies, &CenterParams::default());
        assert!(bodies.x.is_empty());
    }
}
