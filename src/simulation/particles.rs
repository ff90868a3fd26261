use crate::{floating_type_mod::FT, parameters::SimulationConfig, vec3f, vec4f, V3, V4};
use nalgebra::zero;
use rand::Rng;

/// Owns all per-particle state. Position, velocity and color are double
/// buffered: `generation` selects which physical buffer is the source for
/// the current frame, the other one is the destination. The derived fields
/// (density, pressure, forces) are recomputed from scratch every frame and
/// are not double buffered.
///
/// Contract: within a frame, the source half is only read and the
/// destination half is only written; flipping `generation` (via [`swap`])
/// is the only hand-off point. Nothing here enforces stage ordering - the
/// scheduler is responsible for rebuilding the spatial index before any
/// neighborhood stage runs.
///
/// [`swap`]: ParticleStore::swap
pub struct ParticleStore {
    pub position: [Vec<V3>; 2],
    pub velocity: [Vec<V3>; 2],
    pub color: [Vec<V4>; 2],

    pub density: Vec<FT>,
    pub pressure: Vec<FT>,
    pub pressure_force: Vec<V3>,
    pub viscosity_force: Vec<V3>,

    generation: usize,
}

/// Splits a double buffer into its (source, destination) halves for the
/// given generation.
pub fn double_buffer_pair<T>(buffers: &mut [Vec<T>; 2], generation: usize) -> (&[T], &mut [T]) {
    let (first, second) = buffers.split_at_mut(1);
    if generation == 0 {
        (&first[0], &mut second[0])
    } else {
        (&second[0], &mut first[0])
    }
}

impl ParticleStore {
    /// Creates the initial particle state: a regular lattice spanning the
    /// box, a small uniform random velocity jitter (avoids the degenerate
    /// perfectly-symmetric neighbor configuration of an exact lattice) and
    /// random cosmetic colors.
    pub fn from_lattice(config: &SimulationConfig) -> ParticleStore {
        let n = config.particle_count();
        let mut position = Vec::with_capacity(n);
        let mut velocity = Vec::with_capacity(n);
        let mut color = Vec::with_capacity(n);

        let mut rng = rand::thread_rng();
        let jitter = config.velocity_jitter;

        // A degenerate single-particle axis places the particle at the box
        // center on that axis.
        let axis_pos = |index: usize, count: usize, extent: FT| -> FT {
            if count > 1 {
                (index as FT / (count - 1) as FT) * extent - extent * 0.5
            } else {
                0.
            }
        };

        for i in 0..config.x_count {
            for j in 0..config.y_count {
                for k in 0..config.z_count {
                    position.push(vec3f(
                        axis_pos(i, config.x_count, config.box_width),
                        axis_pos(j, config.y_count, config.box_height),
                        axis_pos(k, config.z_count, config.box_depth),
                    ));

                    let v = if jitter > 0. {
                        vec3f(
                            rng.gen_range(-jitter..jitter),
                            rng.gen_range(-jitter..jitter),
                            rng.gen_range(-jitter..jitter),
                        )
                    } else {
                        zero()
                    };
                    velocity.push(v);

                    color.push(vec4f(
                        rng.gen::<FT>() * 0.5 + 0.2,
                        rng.gen::<FT>() * 0.5 + 0.2,
                        rng.gen::<FT>() * 0.5 + 0.2,
                        1.,
                    ));
                }
            }
        }

        ParticleStore {
            position: [position.clone(), position],
            velocity: [velocity.clone(), velocity],
            color: [color.clone(), color],
            density: vec![0.; n],
            pressure: vec![0.; n],
            pressure_force: vec![zero(); n],
            viscosity_force: vec![zero(); n],
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.position[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Flips which physical buffer is source vs destination. Called by the
    /// scheduler after each writing stage (reorder, integrate).
    pub fn swap(&mut self) {
        self.generation = 1 - self.generation;
    }

    pub fn position_src(&self) -> &[V3] {
        &self.position[self.generation]
    }

    pub fn velocity_src(&self) -> &[V3] {
        &self.velocity[self.generation]
    }

    pub fn color_src(&self) -> &[V4] {
        &self.color[self.generation]
    }
}
