use crate::{floating_type_mod::FT, vec3f, V3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Construction-time configuration problems. All of these are rejected
/// eagerly by [`crate::FluidSimulation::new`], before any frame runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("lattice dimensions must be positive, got {0}x{1}x{2}")]
    EmptyLattice(usize, usize, usize),

    #[error("box extents must be positive and finite, got {0}x{1}x{2}")]
    DegenerateBox(FT, FT, FT),

    #[error("smoothing radius must be positive and finite, got {0}")]
    InvalidSmoothingRadius(FT),

    #[error("{name} must be positive, got {value}")]
    NonPositiveParameter { name: &'static str, value: FT },

    #[error("{name} must not be negative, got {value}")]
    NegativeParameter { name: &'static str, value: FT },
}

/// SPH material constants, immutable per run. The kernel normalization
/// powers of `h` are derived once so the per-neighbor inner loops never
/// recompute them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SphParams {
    pub h: FT,
    pub h2: FT,
    pub h6: FT,
    pub h9: FT,
    pub particle_mass: FT,
    pub rest_density: FT,
    pub pressure_stiffness: FT,
    pub viscosity: FT,
    pub gravity: FT,
}

impl SphParams {
    pub fn new(
        h: FT,
        particle_mass: FT,
        rest_density: FT,
        pressure_stiffness: FT,
        viscosity: FT,
        gravity: FT,
    ) -> SphParams {
        let h2 = h * h;
        let h6 = h2 * h2 * h2;
        SphParams {
            h,
            h2,
            h6,
            h9: h6 * h2 * h,
            particle_mass,
            rest_density,
            pressure_stiffness,
            viscosity,
            gravity,
        }
    }

    pub fn gravity_vector(&self) -> V3 {
        vec3f(0., self.gravity, 0.)
    }
}

/// Box boundary response constants: soft penalty spring (`ks`), normal
/// damping (`kd`) and tangential friction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionParams {
    pub half_extents: V3,
    pub particle_radius: FT,
    pub ks: FT,
    pub kd: FT,
    pub friction: FT,
}

/// Full run configuration. Loaded from a YAML scenario file by the CLI
/// runner; tests construct it directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub x_count: usize,
    pub y_count: usize,
    pub z_count: usize,

    pub box_width: FT,
    pub box_height: FT,
    pub box_depth: FT,

    /// Kernel support radius. When absent it is derived as 1.5x the lattice
    /// spacing along x, which matches the reference scene.
    #[serde(default)]
    pub h: Option<FT>,

    pub rest_density: FT,
    pub pressure_stiffness: FT,
    pub viscosity: FT,
    pub particle_mass: FT,
    pub gravity: FT,

    pub particle_radius: FT,
    pub ks: FT,
    pub kd: FT,
    pub friction: FT,

    /// Half-width of the uniform random velocity jitter applied to the
    /// initial lattice (breaks the perfect symmetry of the grid layout).
    pub velocity_jitter: FT,
}

impl Default for SimulationConfig {
    fn default() -> SimulationConfig {
        SimulationConfig {
            x_count: 30,
            y_count: 30,
            z_count: 30,
            box_width: 35.,
            box_height: 25.,
            box_depth: 55.,
            h: None,
            rest_density: 15000.,
            pressure_stiffness: 200.,
            viscosity: 100.,
            particle_mass: 1.,
            gravity: -9.8,
            particle_radius: 0.01,
            ks: 20.,
            kd: 1.,
            friction: 0.1,
            velocity_jitter: 0.05,
        }
    }
}

impl SimulationConfig {
    pub fn particle_count(&self) -> usize {
        self.x_count * self.y_count * self.z_count
    }

    /// Lattice spacing along x. A degenerate single-particle axis falls back
    /// to the full box extent so the derived `h` stays finite.
    pub fn lattice_spacing(&self) -> FT {
        if self.x_count > 1 {
            self.box_width / (self.x_count - 1) as FT
        } else {
            self.box_width
        }
    }

    pub fn smoothing_radius(&self) -> FT {
        self.h.unwrap_or(self.lattice_spacing() * 1.5)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: FT) -> Result<(), ConfigError> {
            if !(value > 0.) || !value.is_finite() {
                return Err(ConfigError::NonPositiveParameter { name, value });
            }
            Ok(())
        }
        fn non_negative(name: &'static str, value: FT) -> Result<(), ConfigError> {
            if !(value >= 0.) || !value.is_finite() {
                return Err(ConfigError::NegativeParameter { name, value });
            }
            Ok(())
        }

        if self.x_count == 0 || self.y_count == 0 || self.z_count == 0 {
            return Err(ConfigError::EmptyLattice(self.x_count, self.y_count, self.z_count));
        }
        if !(self.box_width > 0. && self.box_height > 0. && self.box_depth > 0.)
            || !(self.box_width.is_finite() && self.box_height.is_finite() && self.box_depth.is_finite())
        {
            return Err(ConfigError::DegenerateBox(self.box_width, self.box_height, self.box_depth));
        }

        let h = self.smoothing_radius();
        if !(h > 0.) || !h.is_finite() {
            return Err(ConfigError::InvalidSmoothingRadius(h));
        }

        positive("particle_mass", self.particle_mass)?;
        positive("rest_density", self.rest_density)?;
        non_negative("pressure_stiffness", self.pressure_stiffness)?;
        non_negative("viscosity", self.viscosity)?;
        non_negative("particle_radius", self.particle_radius)?;
        non_negative("ks", self.ks)?;
        non_negative("kd", self.kd)?;
        non_negative("friction", self.friction)?;
        non_negative("velocity_jitter", self.velocity_jitter)?;

        Ok(())
    }

    pub fn sph_params(&self) -> SphParams {
        SphParams::new(
            self.smoothing_radius(),
            self.particle_mass,
            self.rest_density,
            self.pressure_stiffness,
            self.viscosity,
            self.gravity,
        )
    }

    pub fn collision_params(&self) -> CollisionParams {
        CollisionParams {
            half_extents: vec3f(self.box_width * 0.5, self.box_height * 0.5, self.box_depth * 0.5),
            particle_radius: self.particle_radius,
            ks: self.ks,
            kd: self.kd,
            friction: self.friction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.particle_count(), 27000);

        // h derives from the x lattice spacing
        let spacing = 35. / 29.;
        crate::assert_ft_approx_eq(config.smoothing_radius(), spacing * 1.5, 1e-5, || {
            format!("derived smoothing radius")
        });
    }

    #[test]
    fn rejects_empty_lattice() {
        let config = SimulationConfig {
            y_count: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyLattice(_, 0, _))));
    }

    #[test]
    fn rejects_degenerate_box() {
        let config = SimulationConfig {
            box_depth: 0.,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::DegenerateBox(..))));
    }

    #[test]
    fn rejects_bad_smoothing_radius() {
        let config = SimulationConfig {
            h: Some(-1.),
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSmoothingRadius(_))));

        let config = SimulationConfig {
            h: Some(FT::NAN),
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSmoothingRadius(_))));
    }

    #[test]
    fn rejects_non_positive_material_constants() {
        let config = SimulationConfig {
            particle_mass: 0.,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SimulationConfig {
            viscosity: -1.,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn derived_kernel_powers() {
        let params = SphParams::new(2., 1., 1000., 200., 100., 0.);
        assert_eq!(params.h2, 4.);
        assert_eq!(params.h6, 64.);
        assert_eq!(params.h9, 512.);
    }
}
