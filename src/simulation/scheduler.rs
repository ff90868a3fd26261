use tracing::{debug, info};

use crate::{
    concurrency::par_iter_mut1,
    floating_type_mod::FT,
    grid::UniformGrid,
    integrate::integrate_and_collide,
    parameters::{CollisionParams, ConfigError, SimulationConfig, SphParams},
    particles::{double_buffer_pair, ParticleStore},
    spatial_index::{reorder_particles, SpatialIndex},
    stages::{compute_densities, compute_pressures, compute_pressure_forces, compute_viscosity_forces},
    V3, V4,
};

/// Owns the full per-frame pipeline and its state. One `step` runs, in
/// order: spatial index rebuild, particle reorder (plus buffer flip),
/// density, pressure, pressure force, viscosity force, and the combined
/// integrate/collide pass (plus the second buffer flip).
///
/// Every stage reads the output of the stages before it within the same
/// frame; the reorder means all neighborhood stages work on cell-sorted
/// arrays and index particles by sorted slot.
pub struct FluidSimulation {
    grid: UniformGrid,
    params: SphParams,
    collision: CollisionParams,
    particles: ParticleStore,
    index: SpatialIndex,
    frame: usize,
    time: f64,
}

impl FluidSimulation {
    pub fn new(config: &SimulationConfig) -> Result<FluidSimulation, ConfigError> {
        config.validate()?;

        let h = config.smoothing_radius();
        let grid = UniformGrid::new(config.box_width, config.box_height, config.box_depth, h);
        let particles = ParticleStore::from_lattice(config);
        let index = SpatialIndex::new(grid.num_cells, particles.len());

        info!(
            particles = particles.len(),
            cells = grid.num_cells,
            smoothing_radius = h as f64,
            "simulation initialized"
        );

        Ok(FluidSimulation {
            grid,
            params: config.sph_params(),
            collision: config.collision_params(),
            particles,
            index,
            frame: 0,
            time: 0.,
        })
    }

    /// Advances the simulation by one frame of length `dt`.
    pub fn step(&mut self, dt: FT) {
        let generation = self.particles.generation();
        self.index
            .build(&self.grid, &self.particles.position[generation]);

        {
            let (pos_src, pos_dst) = double_buffer_pair(&mut self.particles.position, generation);
            let (vel_src, vel_dst) = double_buffer_pair(&mut self.particles.velocity, generation);
            let (col_src, col_dst) = double_buffer_pair(&mut self.particles.color, generation);
            reorder_particles(&self.index, pos_src, vel_src, col_src, pos_dst, vel_dst, col_dst);
        }
        self.particles.swap();
        let generation = self.particles.generation();

        compute_densities(
            &self.grid,
            &self.index,
            &self.particles.position[generation],
            &mut self.particles.density,
            &self.params,
        );
        compute_pressures(&self.particles.density, &mut self.particles.pressure, &self.params);
        compute_pressure_forces(
            &self.grid,
            &self.index,
            &self.particles.position[generation],
            &self.particles.density,
            &self.particles.pressure,
            &mut self.particles.pressure_force,
            &self.params,
        );
        compute_viscosity_forces(
            &self.grid,
            &self.index,
            &self.particles.position[generation],
            &self.particles.velocity[generation],
            &self.particles.density,
            &mut self.particles.viscosity_force,
            &self.params,
        );

        {
            let (pos_src, pos_dst) = double_buffer_pair(&mut self.particles.position, generation);
            let (vel_src, vel_dst) = double_buffer_pair(&mut self.particles.velocity, generation);
            integrate_and_collide(
                pos_src,
                vel_src,
                &self.particles.density,
                &self.particles.pressure_force,
                &self.particles.viscosity_force,
                pos_dst,
                vel_dst,
                dt,
                &self.params,
                &self.collision,
            );

            // colors only move during the reorder; carry them across the
            // second flip unchanged
            let (col_src, col_dst) = double_buffer_pair(&mut self.particles.color, generation);
            par_iter_mut1(col_dst, |i, color| {
                *color = col_src[i];
            });
        }
        self.particles.swap();

        self.frame += 1;
        self.time += dt as f64;
        debug!(frame = self.frame, "frame complete");
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Simulated time, the sum of all step lengths so far.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn grid(&self) -> &UniformGrid {
        &self.grid
    }

    pub fn params(&self) -> &SphParams {
        &self.params
    }

    pub fn positions(&self) -> &[V3] {
        self.particles.position_src()
    }

    pub fn velocities(&self) -> &[V3] {
        self.particles.velocity_src()
    }

    pub fn colors(&self) -> &[V4] {
        self.particles.color_src()
    }

    pub fn densities(&self) -> &[FT] {
        &self.particles.density
    }

    /// Total kinetic energy `sum 0.5 m v^2`, accumulated in f64 so large
    /// particle counts do not lose the small per-particle contributions.
    pub fn kinetic_energy(&self) -> f64 {
        self.velocities()
            .iter()
            .map(|v| 0.5 * self.params.particle_mass as f64 * v.norm_squared() as f64)
            .sum()
    }

    pub fn mean_density(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.;
        }
        let sum: f64 = self.densities().iter().map(|rho| *rho as f64).sum();
        sum / self.particles.len() as f64
    }

    pub fn center_of_mass(&self) -> V3 {
        let mut com: V3 = nalgebra::zero();
        for p in self.positions() {
            com += *p;
        }
        com / self.particles.len() as FT
    }
}
