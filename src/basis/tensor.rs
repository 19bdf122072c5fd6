//! Shape functions of the tensor-product families (curve, quad, hex).
//!
//! Every function here is driven by the unit element tables: vertex `i`
//! contributes the 1D factor `t` or `1 - t` along each axis depending on
//! whether its unit coordinate is 1 or 0, and edge nodes sit on the midpoint of
//! the unit edge they are listed for.
//!
//! Derivative weights are laid out axis by axis:
//! `[d/dx of every weight, d/dy of every weight, ...]`.

use super::hermite;
use super::unit_element::UnitElement;

#[inline]
fn at_one(unit: &UnitElement, vertex: usize, axis: usize) -> bool {
    unit.vertices[vertex][axis] > 0.5
}

#[inline]
fn lin(one: bool, t: f64) -> f64 {
    if one { t } else { 1.0 - t }
}

#[inline]
fn dlin(one: bool) -> f64 {
    if one { 1.0 } else { -1.0 }
}

/// Axis along which the two end vertices of a unit edge differ.
#[inline]
fn free_axis(unit: &UnitElement, edge: [usize; 2]) -> usize {
    let [p, q] = edge;
    (0..unit.domain_dimension)
        .find(|&k| at_one(unit, p, k) != at_one(unit, q, k))
        .unwrap_or(0)
}

pub fn linear(unit: &UnitElement, x: &[f64], w: &mut Vec<f64>) {
    let d = unit.domain_dimension;
    for i in 0..unit.vertices.len() {
        w.push((0..d).map(|k| lin(at_one(unit, i, k), x[k])).product());
    }
}

pub fn linear_derivatives(unit: &UnitElement, x: &[f64], w: &mut [f64]) {
    let d = unit.domain_dimension;
    let n = unit.vertices.len();
    for i in 0..n {
        for j in 0..d {
            w[j * n + i] = (0..d)
                .map(|k| {
                    let one = at_one(unit, i, k);
                    if k == j { dlin(one) } else { lin(one, x[k]) }
                })
                .product();
        }
    }
}

/// Serendipity quadratic: corner nodes, then one node per unit edge.
///
/// With `a_k` the linear factor of a corner along axis `k`, the corner function
/// is `prod(a) * (2 * sum(a) - (2d - 1))`; an edge node is
/// `4 t (1 - t)` along its free axis times the linear factors of the others.
pub fn quadratic(unit: &UnitElement, x: &[f64], w: &mut Vec<f64>) {
    let d = unit.domain_dimension;
    let shift = (2 * d - 1) as f64;
    for i in 0..unit.vertices.len() {
        let (mut prod, mut sum) = (1.0, 0.0);
        for k in 0..d {
            let a = lin(at_one(unit, i, k), x[k]);
            prod *= a;
            sum += a;
        }
        w.push(prod * (2.0 * sum - shift));
    }
    for &edge in unit.edges {
        let free = free_axis(unit, edge);
        let t = x[free];
        let mut v = 4.0 * t * (1.0 - t);
        for k in (0..d).filter(|&k| k != free) {
            v *= lin(at_one(unit, edge[0], k), x[k]);
        }
        w.push(v);
    }
}

pub fn quadratic_derivatives(unit: &UnitElement, x: &[f64], w: &mut [f64]) {
    let d = unit.domain_dimension;
    let nv = unit.vertices.len();
    let n = nv + unit.edges.len();
    let shift = (2 * d - 1) as f64;
    for i in 0..nv {
        let a: Vec<f64> = (0..d).map(|k| lin(at_one(unit, i, k), x[k])).collect();
        let prod: f64 = a.iter().product();
        let sum: f64 = a.iter().sum();
        for j in 0..d {
            let others: f64 = (0..d).filter(|&k| k != j).map(|k| a[k]).product();
            w[j * n + i] = dlin(at_one(unit, i, j)) * (others * (2.0 * sum - shift) + 2.0 * prod);
        }
    }
    for (e, &edge) in unit.edges.iter().enumerate() {
        let free = free_axis(unit, edge);
        let t = x[free];
        for j in 0..d {
            let mut v = if j == free {
                4.0 * (1.0 - 2.0 * t)
            } else {
                4.0 * t * (1.0 - t) * dlin(at_one(unit, edge[0], j))
            };
            for k in (0..d).filter(|&k| k != free && k != j) {
                v *= lin(at_one(unit, edge[0], k), x[k]);
            }
            w[j * n + nv + e] = v;
        }
    }
}

/// Derivative masks of the Hermite tensor basis in dimension `d`.
pub fn masks(d: usize) -> &'static [u8] {
    match d {
        1 => &hermite::MASKS_1D,
        2 => &hermite::MASKS_2D,
        _ => &hermite::MASKS_3D,
    }
}

/// Cubic Hermite: per vertex, one weight per mask in [`masks`].
pub fn cubic(unit: &UnitElement, x: &[f64], w: &mut Vec<f64>) {
    let d = unit.domain_dimension;
    for i in 0..unit.vertices.len() {
        for &m in masks(d) {
            w.push(
                (0..d)
                    .map(|k| hermite::shape(at_one(unit, i, k), m & (1 << k) != 0, x[k]))
                    .product(),
            );
        }
    }
}

pub fn cubic_derivatives(unit: &UnitElement, x: &[f64], w: &mut [f64]) {
    let d = unit.domain_dimension;
    let ms = masks(d);
    let n = unit.vertices.len() * ms.len();
    for i in 0..unit.vertices.len() {
        for (q, &m) in ms.iter().enumerate() {
            for j in 0..d {
                w[j * n + i * ms.len() + q] = (0..d)
                    .map(|k| {
                        let (one, slope) = (at_one(unit, i, k), m & (1 << k) != 0);
                        if k == j {
                            hermite::dshape(one, slope, x[k])
                        } else {
                            hermite::shape(one, slope, x[k])
                        }
                    })
                    .product();
            }
        }
    }
}
