pub mod concurrency;
pub mod grid;
pub mod integrate;
pub mod parameters;
pub mod particles;
pub mod scheduler;
pub mod spatial_index;
pub mod sph_kernels;
pub mod stages;

pub type IT = i32;

#[cfg(feature = "double-precision")]
pub mod floating_type_mod {
    pub type FT = f64;
    pub use std::f64::consts::PI;
}

#[cfg(not(feature = "double-precision"))]
pub mod floating_type_mod {
    pub type FT = f32;
    pub use std::f32::consts::PI;
}

use floating_type_mod::FT;
use num_traits::Float;
use std::fmt::Display;

use nalgebra::SVector;

pub type V<T, const D: usize> = SVector<T, D>;

pub type V3 = V<FT, 3>;
pub type V4 = V<FT, 4>;
pub type V3I = V<IT, 3>;

pub fn vec3f(x: FT, y: FT, z: FT) -> V3 {
    [x, y, z].into()
}

pub fn vec3i(x: IT, y: IT, z: IT) -> V3I {
    [x, y, z].into()
}

pub fn vec4f(x: FT, y: FT, z: FT, w: FT) -> V4 {
    [x, y, z, w].into()
}

pub use grid::UniformGrid;
pub use parameters::{CollisionParams, ConfigError, SimulationConfig, SphParams};
pub use particles::ParticleStore;
pub use scheduler::FluidSimulation;
pub use spatial_index::SpatialIndex;

pub fn is_ft_approx_eq<T: Float>(a: T, b: T, tolerance: T) -> bool {
    (a - b).abs() <= tolerance
}

pub fn assert_ft_approx_eq<T: Float + Display>(a: T, b: T, tolerance: T, s: impl FnOnce() -> String) {
    if !is_ft_approx_eq(a, b, tolerance) {
        panic!(
            "{} value not equal with a tolerance of {}:\n\ta={}\n\tb={}\n",
            s(),
            tolerance,
            a,
            b
        );
    }
}
