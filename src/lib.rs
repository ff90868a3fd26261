/*!
Core of a uniform-grid SPH fluid simulator.

The crate owns the per-frame simulation pipeline: spatial binning via a
parallel counting sort, SPH field evaluation (density, pressure, pressure
force, viscosity force) and symplectic-Euler integration with a penalty-based
box boundary. Rendering, camera handling and window plumbing are left to the
embedding application, which only needs the read-only position/color
snapshots exposed by `FluidSimulation`.
*/

mod simulation;

pub use simulation::*;
