use crate::{
    floating_type_mod::{FT, PI},
    parameters::SphParams,
    V3,
};

/// Poly6 density kernel, evaluated on the squared distance:
/// `W(r, h) = 315/(64 pi h^9) * (h^2 - r^2)^3` for `r < h`, else 0.
#[inline(always)]
pub fn poly6(r2: FT, params: &SphParams) -> FT {
    if r2 >= params.h2 {
        return 0.;
    }
    let v = params.h2 - r2;
    315. / (64. * PI * params.h9) * v * v * v
}

/// Spiky kernel value `W(r, h) = 15/(pi h^6) * (h - r)^3`. Only the gradient
/// is used by the pressure stage; the value exists for the finite-difference
/// consistency test below.
#[inline(always)]
pub fn spiky(r: FT, params: &SphParams) -> FT {
    if r >= params.h {
        return 0.;
    }
    let v = params.h - r;
    15. / (PI * params.h6) * v * v * v
}

/// Gradient of the spiky kernel:
/// `grad W = -45/(pi h^6) * (h - r)^2 * r_hat`.
///
/// `diff = x_i - x_j`, `r = |diff|`. Caller guarantees `0 < r < h`; the
/// gradient is undefined at `r == 0` (pressure stages skip that pair).
#[inline(always)]
pub fn spiky_gradient(diff: V3, r: FT, params: &SphParams) -> V3 {
    let v = params.h - r;
    -45. / (PI * params.h6) * v * v * (diff / r)
}

/// Laplacian of the viscosity kernel:
/// `lap W = 45/(pi h^6) * (h - r)` for `r < h`, else 0.
#[inline(always)]
pub fn viscosity_laplacian(r: FT, params: &SphParams) -> FT {
    if r >= params.h {
        return 0.;
    }
    45. / (PI * params.h6) * (params.h - r)
}
