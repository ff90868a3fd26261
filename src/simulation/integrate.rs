use nalgebra::zero;

use crate::{
    concurrency::par_iter_mut2,
    floating_type_mod::FT,
    parameters::{CollisionParams, SphParams},
    V3,
};

/// Semi-implicit Euler step with the box boundary response folded in:
/// acceleration from the accumulated forces, velocity update, boundary
/// correction on the updated velocity, then the position update with the
/// corrected velocity.
///
/// Reads only the source buffers and writes only the destination buffers,
/// so it can run as a single parallel pass.
pub fn integrate_and_collide(
    position_src: &[V3],
    velocity_src: &[V3],
    density: &[FT],
    pressure_force: &[V3],
    viscosity_force: &[V3],
    position_dst: &mut [V3],
    velocity_dst: &mut [V3],
    dt: FT,
    params: &SphParams,
    collision: &CollisionParams,
) {
    let gravity = params.gravity_vector();

    par_iter_mut2(position_dst, velocity_dst, |i, p_position, p_velocity| {
        let x = position_src[i];
        let rho = density[i];

        // A particle with no kernel support has no well-defined force
        // density; it coasts for this step instead of dividing by zero.
        let acceleration: V3 = if rho > 0. {
            (pressure_force[i] + viscosity_force[i]) / rho + gravity
        } else {
            zero()
        };

        let mut v = velocity_src[i] + acceleration * dt;
        apply_boundary_response(x, &mut v, dt, collision);

        *p_position = x + v * dt;
        *p_velocity = v;
    });
}

/// Soft penalty response against the six box walls, applied per axis to the
/// post-force velocity. A penetrating particle gets its outward velocity
/// component reflected with damping, an inward spring impulse proportional
/// to the penetration depth, and tangential friction. Positions are never
/// clamped; the spring pushes the particle back over the following steps.
fn apply_boundary_response(position: V3, velocity: &mut V3, dt: FT, collision: &CollisionParams) {
    let damping = FT::max(1. - collision.kd * dt, 0.);
    let friction = FT::max(1. - collision.friction * dt, 0.);

    for d in 0..3 {
        let limit = collision.half_extents[d] - collision.particle_radius;

        let depth = if position[d] < -limit {
            -limit - position[d]
        } else if position[d] > limit {
            position[d] - limit
        } else {
            continue;
        };

        // outward normal sign of the violated wall
        let normal = if position[d] < 0. { -1. } else { 1. };

        if velocity[d] * normal > 0. {
            velocity[d] = -velocity[d] * damping;
        }
        velocity[d] -= normal * collision.ks * depth * dt;

        for t in 0..3 {
            if t != d {
                velocity[t] *= friction;
            }
        }
    }
}
