//! One-dimensional cubic Hermite shape functions and the per-node derivative
//! layout of Hermite bases.
//!
//! On `[0, 1]` the four functions interpolate the value and the slope at
//! `t = 0` and `t = 1`. Higher-dimensional Hermite bases are products of these
//! factors, one per parametric axis.

/// Value function of node `at_one` (false: `t = 0`, true: `t = 1`) or its
/// slope function when `slope` is set.
#[inline]
pub fn shape(at_one: bool, slope: bool, t: f64) -> f64 {
    match (at_one, slope) {
        (false, false) => (1.0 - t) * (1.0 - t) * (1.0 + 2.0 * t),
        (false, true) => t * (1.0 - t) * (1.0 - t),
        (true, false) => t * t * (3.0 - 2.0 * t),
        (true, true) => t * t * (t - 1.0),
    }
}

/// First derivative of [`shape`].
#[inline]
pub fn dshape(at_one: bool, slope: bool, t: f64) -> f64 {
    match (at_one, slope) {
        (false, false) => 6.0 * t * (t - 1.0),
        (false, true) => (1.0 - t) * (1.0 - 3.0 * t),
        (true, false) => 6.0 * t * (1.0 - t),
        (true, true) => t * (3.0 * t - 2.0),
    }
}

/// Derivative components carried by each node, as axis bitmasks
/// (bit `k` set: differentiated along axis `k`). Entry 0 is the value.
pub const MASKS_1D: [u8; 2] = [0b000, 0b001];
/// `[v, dx, dy, dxy]`
pub const MASKS_2D: [u8; 4] = [0b000, 0b001, 0b010, 0b011];
/// `[v, dx, dy, dz, dxdy, dydz, dxdz, dxdydz]`
pub const MASKS_3D: [u8; 8] = [0b000, 0b001, 0b010, 0b100, 0b011, 0b110, 0b101, 0b111];
/// `[v, dx, dy, dz]`, the prism carries no mixed derivatives.
pub const MASKS_PRISM: [u8; 4] = [0b000, 0b001, 0b010, 0b100];

/// Product of the scale factors of the axes a component differentiates.
#[inline]
pub fn mask_scale(mask: u8, scale: &[f64]) -> f64 {
    scale
        .iter()
        .enumerate()
        .filter(|(k, _)| mask & (1 << k) != 0)
        .map(|(_, s)| s)
        .product()
}
