//! Shape functions of the simplex families (triangle, tetrahedron), written in
//! barycentric coordinates `L0 = 1 - sum(x)`, `Li = x[i - 1]`.

use super::unit_element::UnitElement;

#[inline]
fn bary(d: usize, x: &[f64], i: usize) -> f64 {
    if i == 0 {
        1.0 - x[..d].iter().sum::<f64>()
    } else {
        x[i - 1]
    }
}

/// `d L_i / d x_j`
#[inline]
fn dbary(i: usize, j: usize) -> f64 {
    match i {
        0 => -1.0,
        _ if i == j + 1 => 1.0,
        _ => 0.0,
    }
}

pub fn linear(unit: &UnitElement, x: &[f64], w: &mut Vec<f64>) {
    let d = unit.domain_dimension;
    w.extend((0..=d).map(|i| bary(d, x, i)));
}

pub fn linear_derivatives(unit: &UnitElement, _x: &[f64], w: &mut [f64]) {
    let d = unit.domain_dimension;
    let n = d + 1;
    for j in 0..d {
        for i in 0..n {
            w[j * n + i] = dbary(i, j);
        }
    }
}

/// Vertex functions `L (2L - 1)`, then `4 La Lb` per unit edge.
pub fn quadratic(unit: &UnitElement, x: &[f64], w: &mut Vec<f64>) {
    let d = unit.domain_dimension;
    w.extend((0..=d).map(|i| {
        let l = bary(d, x, i);
        l * (2.0 * l - 1.0)
    }));
    w.extend(
        unit.edges
            .iter()
            .map(|&[a, b]| 4.0 * bary(d, x, a) * bary(d, x, b)),
    );
}

pub fn quadratic_derivatives(unit: &UnitElement, x: &[f64], w: &mut [f64]) {
    let d = unit.domain_dimension;
    let nv = d + 1;
    let n = nv + unit.edges.len();
    for j in 0..d {
        for i in 0..nv {
            w[j * n + i] = (4.0 * bary(d, x, i) - 1.0) * dbary(i, j);
        }
        for (e, &[a, b]) in unit.edges.iter().enumerate() {
            w[j * n + nv + e] =
                4.0 * (dbary(a, j) * bary(d, x, b) + bary(d, x, a) * dbary(b, j));
        }
    }
}

/// Cubic Hermite triangle: per vertex `[v, dx, dy, dxy]`, twelve functions.
pub fn tri_cubic(x: &[f64], w: &mut Vec<f64>) {
    let (x, y) = (x[0], x[1]);
    let x2 = x * x;
    let x3 = x2 * x;
    let y2 = y * y;
    let y3 = y2 * y;
    w.extend_from_slice(&[
        (x + y - 1.0) * (2.0 * x2 - 2.0 * x * y + 2.0 * y2 - x - y - 1.0),
        x * (1.0 - 2.0 * x + x2 - 3.0 * y2 + 2.0 * y3),
        y * (1.0 - 3.0 * x2 + 2.0 * x3 - 2.0 * y + y2),
        x * y * (1.0 - 2.0 * x + x2 - 2.0 * y + y2),
        3.0 * x2 - 2.0 * x3,
        x3 - x2,
        (3.0 * x2 - 2.0 * x3) * y,
        (x3 - x2) * y,
        3.0 * y2 - 2.0 * y3,
        x * (3.0 * y2 - 2.0 * y3),
        y3 - y2,
        x * (y3 - y2),
    ]);
}

/// `[d/dx of all twelve, d/dy of all twelve]`
pub fn tri_cubic_derivatives(x: &[f64], w: &mut [f64]) {
    let (x, y) = (x[0], x[1]);
    let x2 = x * x;
    let x3 = x2 * x;
    let y2 = y * y;
    let y3 = y2 * y;
    let dx = [
        6.0 * x * (x - 1.0),
        1.0 - 4.0 * x + 3.0 * x2 - 3.0 * y2 + 2.0 * y3,
        6.0 * x * y * (x - 1.0),
        y * (1.0 - 4.0 * x + 3.0 * x2 - 2.0 * y + y2),
        6.0 * x - 6.0 * x2,
        3.0 * x2 - 2.0 * x,
        (6.0 * x - 6.0 * x2) * y,
        (3.0 * x2 - 2.0 * x) * y,
        0.0,
        3.0 * y2 - 2.0 * y3,
        0.0,
        y3 - y2,
    ];
    let dy = [
        6.0 * y * (y - 1.0),
        6.0 * x * y * (y - 1.0),
        1.0 - 3.0 * x2 + 2.0 * x3 - 4.0 * y + 3.0 * y2,
        x * (1.0 - 2.0 * x + x2 - 4.0 * y + 3.0 * y2),
        0.0,
        0.0,
        3.0 * x2 - 2.0 * x3,
        x3 - x2,
        6.0 * y - 6.0 * y2,
        x * (6.0 * y - 6.0 * y2),
        3.0 * y2 - 2.0 * y,
        x * (3.0 * y2 - 2.0 * y),
    ];
    w[..12].copy_from_slice(&dx);
    w[12..24].copy_from_slice(&dy);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::element::ElementFamily;
    use approx::assert_abs_diff_eq;

    #[test]
    fn quadratic_tet_is_nodal() {
        let unit = UnitElement::of(ElementFamily::Tet);
        let mut nodes: Vec<[f64; 3]> = unit.vertices.to_vec();
        for &[a, b] in unit.edges {
            let (p, q) = (unit.vertices[a], unit.vertices[b]);
            nodes.push([0.5 * (p[0] + q[0]), 0.5 * (p[1] + q[1]), 0.5 * (p[2] + q[2])]);
        }
        for (k, p) in nodes.iter().enumerate() {
            let mut w = Vec::new();
            quadratic(unit, p, &mut w);
            for (i, wi) in w.iter().enumerate() {
                let expect = if i == k { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(*wi, expect, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn tri_cubic_interpolates_vertex_data() {
        let unit = UnitElement::of(ElementFamily::Triangle);
        for (v, p) in unit.vertices.iter().enumerate() {
            let mut w = Vec::new();
            tri_cubic(&p[..2], &mut w);
            for (i, wi) in w.iter().enumerate() {
                let expect = if i == 4 * v { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(*wi, expect, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn tri_cubic_derivatives_match_finite_differences() {
        let h = 1e-6;
        let x = [0.23, 0.41];
        let mut d = vec![0.0; 24];
        tri_cubic_derivatives(&x, &mut d);
        for j in 0..2 {
            let (mut xp, mut xm) = (x, x);
            xp[j] += h;
            xm[j] -= h;
            let (mut wp, mut wm) = (Vec::new(), Vec::new());
            tri_cubic(&xp, &mut wp);
            tri_cubic(&xm, &mut wm);
            for i in 0..12 {
                let fd = (wp[i] - wm[i]) / (2.0 * h);
                assert_abs_diff_eq!(d[j * 12 + i], fd, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn quadratic_derivatives_sum_to_zero() {
        let unit = UnitElement::of(ElementFamily::Triangle);
        let mut d = vec![0.0; 12];
        quadratic_derivatives(unit, &[0.2, 0.3], &mut d);
        assert_abs_diff_eq!(d[..6].iter().sum::<f64>(), 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(d[6..].iter().sum::<f64>(), 0.0, epsilon = 1e-14);
    }
}
