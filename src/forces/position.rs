//! Single-axis positioning forces.

use super::Bodies;
use super::params::AxisParams;
use crate::graph::NodeId;

/// Pull each node's x toward its target: `vx += (target - x) * strength * alpha`.
pub(crate) fn apply_x<B>(bodies: &mut B, params: &AxisParams, ids: &[NodeId], alpha: f64)
where
    B: Bodies + ?Sized,
{
    let k = params.strength * alpha;
    for i in 0..bodies.len() {
        let target = target(params, ids, i);
        let (x, _) = bodies.position(i);
        bodies.add_velocity(i, (target - x) * k, 0.0);
    }
}

/// Same as [`apply_x`] on the y axis.
pub(crate) fn apply_y<B>(bodies: &mut B, params: &AxisParams, ids: &[NodeId], alpha: f64)
where
    B: Bodies + ?Sized,
{
    let k = params.strength * alpha;
    for i in 0..bodies.len() {
        let target = target(params, ids, i);
        let (_, y) = bodies.position(i);
        bodies.add_velocity(i, 0.0, (target - y) * k);
    }
}

#[inline]
fn target(params: &AxisParams, ids: &[NodeId], i: usize) -> f64 {
    if params.targets.is_empty() {
        return params.target;
    }
    ids.get(i)
        .map_or(params.target, |&id| params.target_for(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::testing::TestBodies;

    #[test]
    fn test_x_only_touches_x() {
        let mut bodies = TestBodies::from_positions(&[(10.0, 10.0), (-10.0, 5.0)]);
        let ids = [NodeId(0), NodeId(1)];
        apply_x(&mut bodies, &AxisParams::default(), &ids, 1.0);
        assert!((bodies.vx[0] + 1.0).abs() < 1e-12);
        assert!((bodies.vx[1] - 1.0).abs() < 1e-12);
        assert_eq!(bodies.vy, [0.0, 0.0]);
    }

    #[test]
    fn test_per_node_targets() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0), (0.0, 0.0)]);
        let ids = [NodeId(7), NodeId(8)];
        let mut params = AxisParams::new(0.0, 0.5);
        params.targets.insert(NodeId(8), 100.0);
        apply_y(&mut bodies, &params, &ids, 0.5);
        assert_eq!(bodies.vy, [0.0, 25.0]);
        assert_eq!(bodies.vx, [0.0, 0.0]);
    }
}
