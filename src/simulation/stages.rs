use nalgebra::zero;

use crate::{
    concurrency::par_iter_mut1,
    floating_type_mod::FT,
    grid::UniformGrid,
    parameters::SphParams,
    spatial_index::{for_each_neighbor_candidate, SpatialIndex},
    sph_kernels::{poly6, spiky_gradient, viscosity_laplacian},
    V3,
};

/// Densities below this are floored before any `1/rho` division in the
/// force stages. An isolated particle still sees its own poly6 self term,
/// so in practice this only guards pathological parameter choices against
/// force blow-up.
pub const DENSITY_FLOOR: FT = 1e-8;

/// Distance below which a neighbor pair is treated as coincident and
/// skipped by the gradient-based stages (the spiky gradient direction is
/// undefined at r = 0).
const COINCIDENT_EPS: FT = 1e-12;

/// `rho_i = sum_j m * W_poly6(|x_i - x_j|, h)` over the 3x3x3 cell
/// neighborhood. The self term (j == i) is included.
pub fn compute_densities(
    grid: &UniformGrid,
    index: &SpatialIndex,
    position: &[V3],
    density: &mut [FT],
    params: &SphParams,
) {
    par_iter_mut1(density, |i, p_density| {
        let xi = position[i];
        let mut rho: FT = 0.;
        for_each_neighbor_candidate(grid, index, xi, |j| {
            let r2 = (xi - position[j]).norm_squared();
            if r2 < params.h2 {
                rho += params.particle_mass * poly6(r2, params);
            }
        });
        *p_density = rho;
    });
}

/// Equation of state: `p_i = k * max(rho_i - rho_0, 0)`. The clamp to
/// non-negative pressure suppresses the clumping instability that attractive
/// pressure forces from under-dense regions would otherwise cause.
pub fn compute_pressures(density: &[FT], pressure: &mut [FT], params: &SphParams) {
    par_iter_mut1(pressure, |i, p_pressure| {
        *p_pressure = params.pressure_stiffness * FT::max(density[i] - params.rest_density, 0.);
    });
}

/// Pressure-gradient force:
/// `F_i = -sum_{j != i} m * (p_i + p_j)/(2 rho_j) * grad W_spiky(x_i - x_j)`.
/// The self pair is skipped; the gradient is undefined at r = 0 and the
/// self force must vanish by symmetry.
pub fn compute_pressure_forces(
    grid: &UniformGrid,
    index: &SpatialIndex,
    position: &[V3],
    density: &[FT],
    pressure: &[FT],
    pressure_force: &mut [V3],
    params: &SphParams,
) {
    par_iter_mut1(pressure_force, |i, p_force| {
        let xi = position[i];
        let pi = pressure[i];
        let mut force: V3 = zero();
        for_each_neighbor_candidate(grid, index, xi, |j| {
            if j == i {
                return;
            }
            let diff = xi - position[j];
            let r2 = diff.norm_squared();
            if r2 >= params.h2 || r2 < COINCIDENT_EPS {
                return;
            }
            let r = r2.sqrt();
            let rho_j = FT::max(density[j], DENSITY_FLOOR);
            force -= params.particle_mass * (pi + pressure[j]) / (2. * rho_j)
                * spiky_gradient(diff, r, params);
        });
        *p_force = force;
    });
}

/// Viscosity force:
/// `F_i = sum_{j != i} mu * m * (v_j - v_i)/rho_j * lap W_visc(|x_i - x_j|)`.
pub fn compute_viscosity_forces(
    grid: &UniformGrid,
    index: &SpatialIndex,
    position: &[V3],
    velocity: &[V3],
    density: &[FT],
    viscosity_force: &mut [V3],
    params: &SphParams,
) {
    par_iter_mut1(viscosity_force, |i, p_force| {
        let xi = position[i];
        let vi = velocity[i];
        let mut force: V3 = zero();
        for_each_neighbor_candidate(grid, index, xi, |j| {
            if j == i {
                return;
            }
            let diff = xi - position[j];
            let r2 = diff.norm_squared();
            if r2 >= params.h2 {
                return;
            }
            let r = r2.sqrt();
            let rho_j = FT::max(density[j], DENSITY_FLOOR);
            force += params.viscosity * params.particle_mass * (velocity[j] - vi) / rho_j
                * viscosity_laplacian(r, params);
        });
        *p_force = force;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sph_kernels::poly6, vec3f, SpatialIndex, UniformGrid};

    struct Fixture {
        grid: UniformGrid,
        index: SpatialIndex,
        position: Vec<V3>,
        params: SphParams,
    }

    /// Builds a ready-to-query index over the given positions. Positions
    /// are assumed to already be in sorted order for simplicity (tests use
    /// few particles in one or two cells).
    fn fixture(position: Vec<V3>, h: FT) -> Fixture {
        let grid = UniformGrid::new(4., 4., 4., h);
        let mut index = SpatialIndex::new(grid.num_cells, position.len());
        index.build(&grid, &position);
        let params = SphParams::new(h, 2., 1000., 50., 10., 0.);
        Fixture {
            grid,
            index,
            position,
            params,
        }
    }

    #[test]
    fn isolated_particle_density_is_the_self_term() {
        let f = fixture(vec![vec3f(0., 0., 0.)], 0.5);
        let mut density = vec![0.];
        compute_densities(&f.grid, &f.index, &f.position, &mut density, &f.params);
        assert_eq!(density[0], f.params.particle_mass * poly6(0., &f.params));
        assert!(density[0] > 0.);
    }

    #[test]
    fn density_includes_neighbors_within_support() {
        let h = 0.5;
        let f = fixture(vec![vec3f(0., 0., 0.), vec3f(0.25, 0., 0.)], h);
        let mut density = vec![0.; 2];
        compute_densities(&f.grid, &f.index, &f.position, &mut density, &f.params);

        let expected =
            f.params.particle_mass * (poly6(0., &f.params) + poly6(0.25 * 0.25, &f.params));
        crate::assert_ft_approx_eq(density[0], expected, expected * 1e-5, || {
            format!("pair density")
        });
        crate::assert_ft_approx_eq(density[0], density[1], expected * 1e-5, || {
            format!("symmetric pair")
        });
    }

    #[test]
    fn density_ignores_particles_outside_support() {
        let h = 0.5;
        let f = fixture(vec![vec3f(0., 0., 0.), vec3f(1.9, 0., 0.)], h);
        let mut density = vec![0.; 2];
        compute_densities(&f.grid, &f.index, &f.position, &mut density, &f.params);
        assert_eq!(density[0], f.params.particle_mass * poly6(0., &f.params));
    }

    #[test]
    fn pressure_is_clamped_to_non_negative() {
        let params = SphParams::new(1., 1., 1000., 50., 0., 0.);
        let density = vec![0., 500., 1000., 1500.];
        let mut pressure = vec![0.; 4];
        compute_pressures(&density, &mut pressure, &params);

        assert_eq!(pressure[0], 0.);
        assert_eq!(pressure[1], 0.);
        assert_eq!(pressure[2], 0.);
        assert_eq!(pressure[3], 50. * 500.);
        assert!(pressure.iter().all(|p| *p >= 0.));
    }

    #[test]
    fn single_particle_has_zero_forces() {
        let f = fixture(vec![vec3f(0., 0., 0.)], 0.5);
        let mut density = vec![0.];
        compute_densities(&f.grid, &f.index, &f.position, &mut density, &f.params);
        let mut pressure = vec![0.];
        compute_pressures(&density, &mut pressure, &f.params);

        let mut pressure_force = vec![vec3f(9., 9., 9.)];
        compute_pressure_forces(
            &f.grid,
            &f.index,
            &f.position,
            &density,
            &pressure,
            &mut pressure_force,
            &f.params,
        );
        assert_eq!(pressure_force[0], vec3f(0., 0., 0.));

        let velocity = vec![vec3f(1., 2., 3.)];
        let mut viscosity_force = vec![vec3f(9., 9., 9.)];
        compute_viscosity_forces(
            &f.grid,
            &f.index,
            &f.position,
            &velocity,
            &density,
            &mut viscosity_force,
            &f.params,
        );
        assert_eq!(viscosity_force[0], vec3f(0., 0., 0.));
    }

    /// Newton's third law for a pair inside the support radius: the spiky
    /// gradient is antisymmetric in the pair difference, and with symmetric
    /// densities the force magnitudes match exactly.
    #[test]
    fn pressure_forces_of_a_pair_are_equal_and_opposite() {
        let h = 0.5;
        let f = fixture(vec![vec3f(-0.1, 0., 0.), vec3f(0.1, 0., 0.)], h);

        let mut density = vec![0.; 2];
        compute_densities(&f.grid, &f.index, &f.position, &mut density, &f.params);

        // force the EOS into the positive-pressure regime
        let params = SphParams::new(h, 2., 0.5 * density[0], 50., 10., 0.);
        let mut pressure = vec![0.; 2];
        compute_pressures(&density, &mut pressure, &params);
        assert!(pressure[0] > 0.);

        let mut force = vec![nalgebra::zero(); 2];
        compute_pressure_forces(
            &f.grid,
            &f.index,
            &f.position,
            &density,
            &pressure,
            &mut force,
            &params,
        );

        let magnitude = force[0].norm();
        assert!(magnitude > 0.);
        for d in 0..3 {
            crate::assert_ft_approx_eq(force[0][d], -force[1][d], magnitude * 1e-4, || {
                format!("pair force axis {}", d)
            });
        }
        // the pair repels: forces point away from each other
        assert!(force[0][0] < 0.);
        assert!(force[1][0] > 0.);
    }

    #[test]
    fn viscosity_drags_towards_neighbor_velocity() {
        let h = 0.5;
        let f = fixture(vec![vec3f(-0.1, 0., 0.), vec3f(0.1, 0., 0.)], h);
        let mut density = vec![0.; 2];
        compute_densities(&f.grid, &f.index, &f.position, &mut density, &f.params);

        let velocity = vec![vec3f(0., 0., 0.), vec3f(1., 0., 0.)];
        let mut force = vec![nalgebra::zero(); 2];
        compute_viscosity_forces(
            &f.grid,
            &f.index,
            &f.position,
            &velocity,
            &density,
            &mut force,
            &f.params,
        );

        // the slow particle is dragged forward, the fast one back
        assert!(force[0][0] > 0.);
        assert!(force[1][0] < 0.);
    }

    #[test]
    fn coincident_pair_produces_finite_forces() {
        let h = 0.5;
        let f = fixture(vec![vec3f(0., 0., 0.), vec3f(0., 0., 0.)], h);
        let mut density = vec![0.; 2];
        compute_densities(&f.grid, &f.index, &f.position, &mut density, &f.params);

        let pressure = vec![100., 100.];
        let mut force = vec![nalgebra::zero(); 2];
        compute_pressure_forces(
            &f.grid,
            &f.index,
            &f.position,
            &density,
            &pressure,
            &mut force,
            &f.params,
        );
        for f in &force {
            assert!(f.norm().is_finite());
        }
    }
}
