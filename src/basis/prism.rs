//! Shape functions of the prism (wedge): triangle functions in `(x, y)`
//! times 1D functions in `z`. Vertex `v` sits on triangle corner `v % 3` at
//! level `z = (v >= 3) as f64`.

use super::hermite;
use super::simplex;
use super::unit_element::UnitElement;

#[inline]
fn tri_bary(x: &[f64], t: usize) -> f64 {
    match t {
        0 => 1.0 - x[0] - x[1],
        1 => x[0],
        _ => x[1],
    }
}

/// `(d/dx, d/dy)` of the triangle barycentric coordinate `t`.
#[inline]
fn tri_dbary(t: usize) -> [f64; 2] {
    match t {
        0 => [-1.0, -1.0],
        1 => [1.0, 0.0],
        _ => [0.0, 1.0],
    }
}

#[inline]
fn level(z: f64, top: bool) -> f64 {
    if top { z } else { 1.0 - z }
}

pub fn linear(unit: &UnitElement, x: &[f64], w: &mut Vec<f64>) {
    for v in 0..unit.vertices.len() {
        w.push(tri_bary(x, v % 3) * level(x[2], v >= 3));
    }
}

pub fn linear_derivatives(unit: &UnitElement, x: &[f64], w: &mut [f64]) {
    let n = unit.vertices.len();
    for v in 0..n {
        let (t, top) = (v % 3, v >= 3);
        let [gx, gy] = tri_dbary(t);
        let lz = level(x[2], top);
        w[v] = gx * lz;
        w[n + v] = gy * lz;
        w[2 * n + v] = tri_bary(x, t) * if top { 1.0 } else { -1.0 };
    }
}

/// Six corners, then one node per unit edge: triangle edges on either level
/// and the three vertical edges.
pub fn quadratic(unit: &UnitElement, x: &[f64], w: &mut Vec<f64>) {
    let z = x[2];
    for v in 0..unit.vertices.len() {
        let l = tri_bary(x, v % 3);
        w.push(if v >= 3 {
            l * z * (2.0 * l + 2.0 * z - 3.0)
        } else {
            l * (1.0 - z) * (2.0 * l - 1.0 - 2.0 * z)
        });
    }
    for &[a, b] in unit.edges {
        let (ta, tb) = (a % 3, b % 3);
        w.push(if ta == tb {
            4.0 * tri_bary(x, ta) * z * (1.0 - z)
        } else {
            4.0 * tri_bary(x, ta) * tri_bary(x, tb) * level(z, a >= 3)
        });
    }
}

pub fn quadratic_derivatives(unit: &UnitElement, x: &[f64], w: &mut [f64]) {
    let z = x[2];
    let nv = unit.vertices.len();
    let n = nv + unit.edges.len();
    for v in 0..nv {
        let t = v % 3;
        let l = tri_bary(x, t);
        let g = tri_dbary(t);
        let (radial, dz) = if v >= 3 {
            (z * (4.0 * l + 2.0 * z - 3.0), l * (2.0 * l + 4.0 * z - 3.0))
        } else {
            ((1.0 - z) * (4.0 * l - 1.0 - 2.0 * z), l * (4.0 * z - 2.0 * l - 1.0))
        };
        w[v] = g[0] * radial;
        w[n + v] = g[1] * radial;
        w[2 * n + v] = dz;
    }
    for (e, &[a, b]) in unit.edges.iter().enumerate() {
        let i = nv + e;
        let (ta, tb) = (a % 3, b % 3);
        let (la, ga) = (tri_bary(x, ta), tri_dbary(ta));
        if ta == tb {
            let lz = 4.0 * z * (1.0 - z);
            w[i] = ga[0] * lz;
            w[n + i] = ga[1] * lz;
            w[2 * n + i] = 4.0 * la * (1.0 - 2.0 * z);
        } else {
            let (lb, gb) = (tri_bary(x, tb), tri_dbary(tb));
            let top = a >= 3;
            let lz = level(z, top);
            w[i] = 4.0 * (ga[0] * lb + la * gb[0]) * lz;
            w[n + i] = 4.0 * (ga[1] * lb + la * gb[1]) * lz;
            w[2 * n + i] = 4.0 * la * lb * if top { 1.0 } else { -1.0 };
        }
    }
}

/// Cubic Hermite prism: per vertex `[v, dx, dy, dz]`, built from the cubic
/// triangle (without its cross-derivative) and the 1D Hermite functions.
pub fn cubic(unit: &UnitElement, x: &[f64], w: &mut Vec<f64>) {
    let mut tri = Vec::with_capacity(12);
    simplex::tri_cubic(x, &mut tri);
    let z = x[2];
    for v in 0..unit.vertices.len() {
        let (t, top) = (v % 3, v >= 3);
        let hz = hermite::shape(top, false, z);
        let sz = hermite::shape(top, true, z);
        w.extend_from_slice(&[
            tri[4 * t] * hz,
            tri[4 * t + 1] * hz,
            tri[4 * t + 2] * hz,
            tri[4 * t] * sz,
        ]);
    }
}

pub fn cubic_derivatives(unit: &UnitElement, x: &[f64], w: &mut [f64]) {
    let mut tri = Vec::with_capacity(12);
    simplex::tri_cubic(x, &mut tri);
    let mut dtri = [0.0; 24];
    simplex::tri_cubic_derivatives(x, &mut dtri);
    let z = x[2];
    let per = hermite::MASKS_PRISM.len();
    let n = unit.vertices.len() * per;
    for v in 0..unit.vertices.len() {
        let (t, top) = (v % 3, v >= 3);
        let (hz, sz) = (hermite::shape(top, false, z), hermite::shape(top, true, z));
        let (dhz, dsz) = (hermite::dshape(top, false, z), hermite::dshape(top, true, z));
        // triangle component feeding each of the four node functions
        let comps = [4 * t, 4 * t + 1, 4 * t + 2, 4 * t];
        let zf = [hz, hz, hz, sz];
        let dzf = [dhz, dhz, dhz, dsz];
        for q in 0..per {
            let i = v * per + q;
            let c = comps[q];
            w[i] = dtri[c] * zf[q];
            w[n + i] = dtri[12 + c] * zf[q];
            w[2 * n + i] = tri[c] * dzf[q];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::element::ElementFamily;
    use approx::assert_abs_diff_eq;

    fn prism() -> &'static UnitElement {
        UnitElement::of(ElementFamily::Prism)
    }

    #[test]
    fn quadratic_is_nodal_on_corners_and_edge_midpoints() {
        let unit = prism();
        let mut nodes: Vec<[f64; 3]> = unit.vertices.to_vec();
        for &[a, b] in unit.edges {
            let (p, q) = (unit.vertices[a], unit.vertices[b]);
            nodes.push([0.5 * (p[0] + q[0]), 0.5 * (p[1] + q[1]), 0.5 * (p[2] + q[2])]);
        }
        for (k, p) in nodes.iter().enumerate() {
            let mut w = Vec::new();
            quadratic(unit, p, &mut w);
            assert_eq!(w.len(), 15);
            for (i, wi) in w.iter().enumerate() {
                let expect = if i == k { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(*wi, expect, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn cubic_weights_sum_to_one() {
        let mut w = Vec::new();
        cubic(prism(), &[0.2, 0.3, 0.6], &mut w);
        assert_eq!(w.len(), 24);
        let values: f64 = w.iter().step_by(4).sum();
        assert_abs_diff_eq!(values, 1.0, epsilon = 1e-13);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        type Eval = fn(&UnitElement, &[f64], &mut Vec<f64>);
        type Deriv = fn(&UnitElement, &[f64], &mut [f64]);
        let cases: [(Eval, Deriv); 3] = [
            (linear, linear_derivatives),
            (quadratic, quadratic_derivatives),
            (cubic, cubic_derivatives),
        ];
        let h = 1e-6;
        let x = [0.21, 0.33, 0.64];
        for (eval, deriv) in cases {
            let mut base = Vec::new();
            eval(prism(), &x, &mut base);
            let n = base.len();
            let mut dw = vec![0.0; 3 * n];
            deriv(prism(), &x, &mut dw);
            for j in 0..3 {
                let (mut xp, mut xm) = (x, x);
                xp[j] += h;
                xm[j] -= h;
                let (mut wp, mut wm) = (Vec::new(), Vec::new());
                eval(prism(), &xp, &mut wp);
                eval(prism(), &xm, &mut wm);
                for i in 0..n {
                    let fd = (wp[i] - wm[i]) / (2.0 * h);
                    assert_abs_diff_eq!(dw[j * n + i], fd, epsilon = 1e-7);
                }
            }
        }
    }
}
