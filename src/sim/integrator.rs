//! Velocity decay and position integration.

use crate::forces::Bodies;

/// Advance every body one step after forces have updated velocities.
///
/// A pinned axis snaps to its pin with zero velocity; a free axis applies
/// `v *= 1 - velocity_decay` and then `p += v`.
pub fn integrate<B>(bodies: &mut B, velocity_decay: f64)
where
    B: Bodies + ?Sized,
{
    let keep = 1.0 - velocity_decay;
    for i in 0..bodies.len() {
        let (x, y) = bodies.position(i);
        let (vx, vy) = bodies.velocity(i);
        let (fx, fy) = bodies.pin(i);

        let (x, vx) = match fx {
            Some(fx) => (fx, 0.0),
            None => {
                let vx = vx * keep;
                (x + vx, vx)
            }
        };
        let (y, vy) = match fy {
            Some(fy) => (fy, 0.0),
            None => {
                let vy = vy * keep;
                (y + vy, vy)
            }
        };

        bodies.set_velocity(i, vx, vy);
        bodies.set_position(i, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::testing::TestBodies;

    #[test]
    fn test_free_body_decays_then_moves() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0)]);
        bodies.set_velocity(0, 10.0, -5.0);
        integrate(&mut bodies, 0.4);
        assert_eq!(bodies.velocity(0), (6.0, -3.0));
        assert_eq!(bodies.position(0), (6.0, -3.0));
    }

    #[test]
    fn test_pinned_axes_hold() {
        let mut bodies = TestBodies::from_positions(&[(1.0, 1.0), (2.0, 2.0)]);
        bodies.pins[0] = (Some(5.0), Some(7.0));
        bodies.pins[1] = (Some(-1.0), None);
        bodies.set_velocity(0, 3.0, 3.0);
        bodies.set_velocity(1, 3.0, 3.0);

        for _ in 0..10 {
            integrate(&mut bodies, 0.4);
        }
        assert_eq!(bodies.position(0), (5.0, 7.0));
        assert_eq!(bodies.velocity(0), (0.0, 0.0));
        // x pinned, y free.
        assert_eq!(bodies.position(1).0, -1.0);
        assert!(bodies.position(1).1 > 2.0);
    }

    #[test]
    fn test_zero_decay_keeps_velocity() {
        let mut bodies = TestBodies::from_positions(&[(0.0, 0.0)]);
        bodies.set_velocity(0, 1.0, 0.0);
        integrate(&mut bodies, 0.0);
        integrate(&mut bodies, 0.0);
        assert_eq!(bodies.position(0), (2.0, 0.0));
    }
}
