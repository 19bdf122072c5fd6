//! Element geometry: the map from parametric to physical coordinates and its
//! inverse.
//!
//! Geometry always uses the vertex (linear) interpolant of the element family,
//! whatever order the field basis carries. Vertices are passed in the unit
//! element order; physical points are always 3D, lower-dimensional elements
//! are embedded with unused components left at zero.

use crate::basis::{Basis, SamplingScheme, UnitElement};
use crate::config::LocateOptions;
use crate::mesh_error::MeshError;
use crate::topology::element::ElementFamily;

/// Physical position.
pub type Point = [f64; 3];

const EPS: f64 = 1e-12;

fn check_vertices(family: ElementFamily, vertices: &[Point]) -> Result<(), MeshError> {
    let expected = UnitElement::of(family).number_of_vertices();
    if vertices.len() != expected {
        return Err(MeshError::InvalidGeometry(format!(
            "vertex count mismatch: expected {expected}, got {}",
            vertices.len()
        )));
    }
    Ok(())
}

/// Physical position of parametric `coords`.
pub fn interpolate(
    family: ElementFamily,
    vertices: &[Point],
    coords: &[f64],
) -> Result<Point, MeshError> {
    check_vertices(family, vertices)?;
    let mut w = Vec::with_capacity(vertices.len());
    Basis::linear(family).weights(coords, &mut w)?;
    let mut out = [0.0; 3];
    for (wi, v) in w.iter().zip(vertices) {
        out[0] += wi * v[0];
        out[1] += wi * v[1];
        out[2] += wi * v[2];
    }
    Ok(out)
}

/// Jacobian of the element map at `coords`, as one physical column per
/// parametric axis.
pub fn jacobian(
    family: ElementFamily,
    vertices: &[Point],
    coords: &[f64],
) -> Result<Vec<Point>, MeshError> {
    check_vertices(family, vertices)?;
    let basis = Basis::linear(family);
    let n = vertices.len();
    let mut dw = Vec::with_capacity(n * basis.dimension());
    basis.derivative_weights(coords, &mut dw)?;
    let cols = (0..basis.dimension())
        .map(|j| {
            let mut col = [0.0; 3];
            for (i, v) in vertices.iter().enumerate() {
                let g = dw[j * n + i];
                col[0] += g * v[0];
                col[1] += g * v[1];
                col[2] += g * v[2];
            }
            col
        })
        .collect();
    Ok(cols)
}

/// Jacobian determinant: signed volume ratio for 3D elements, area ratio of a
/// surface element, length ratio of a curve. A point has determinant 0.
pub fn det_jacobian(
    family: ElementFamily,
    vertices: &[Point],
    coords: &[f64],
) -> Result<f64, MeshError> {
    let cols = jacobian(family, vertices, coords)?;
    Ok(match cols.as_slice() {
        [a] => norm(*a),
        [a, b] => norm(cross(*a, *b)),
        [a, b, c] => dot(*a, cross(*b, *c)),
        _ => 0.0,
    })
}

/// Left inverse of the Jacobian, one physical row per parametric axis.
///
/// For elements of lower dimension than the ambient space this is the
/// least-squares inverse `(J^T J)^{-1} J^T`.
pub fn inverse_jacobian(
    family: ElementFamily,
    vertices: &[Point],
    coords: &[f64],
) -> Result<Vec<Point>, MeshError> {
    let cols = jacobian(family, vertices, coords)?;
    let d = cols.len();
    let mut rows = vec![[0.0; 3]; d];
    for k in 0..3 {
        let mut e = [0.0; 3];
        e[k] = 1.0;
        let x = pull_back(&cols, &e)?;
        for (row, xi) in rows.iter_mut().zip(x) {
            row[k] = xi;
        }
    }
    Ok(rows)
}

/// Solve the normal equations `J^T J x = J^T v`.
fn pull_back(cols: &[Point], v: &Point) -> Result<Vec<f64>, MeshError> {
    let degenerate = || MeshError::InvalidGeometry("degenerate jacobian".into());
    match cols {
        [] => Ok(Vec::new()),
        [a] => {
            let denom = dot(*a, *a);
            if denom.abs() <= EPS {
                return Err(degenerate());
            }
            Ok(vec![dot(*a, *v) / denom])
        }
        [c0, c1] => {
            let a = dot(*c0, *c0);
            let b = dot(*c0, *c1);
            let c = dot(*c1, *c1);
            let det = a * c - b * b;
            if det.abs() <= EPS {
                return Err(degenerate());
            }
            let (r0, r1) = (dot(*c0, *v), dot(*c1, *v));
            let inv_det = 1.0 / det;
            Ok(vec![(c * r0 - b * r1) * inv_det, (a * r1 - b * r0) * inv_det])
        }
        _ => {
            let mut mat = [0.0; 9];
            for i in 0..3 {
                for j in 0..3 {
                    mat[i * 3 + j] = dot(cols[i], cols[j]);
                }
            }
            let rhs = [dot(cols[0], *v), dot(cols[1], *v), dot(cols[2], *v)];
            let inv = invert_3x3(mat)?;
            Ok((0..3)
                .map(|i| inv[i * 3] * rhs[0] + inv[i * 3 + 1] * rhs[1] + inv[i * 3 + 2] * rhs[2])
                .collect())
        }
    }
}

/// Parametric coordinates of physical point `target` by Newton iteration from
/// the element center.
///
/// Returns `None` when the Jacobian degenerates or the iteration does not
/// converge within `opts.max_iterations`.
pub fn get_coords(
    family: ElementFamily,
    vertices: &[Point],
    target: &Point,
    opts: &LocateOptions,
) -> Result<Option<Vec<f64>>, MeshError> {
    check_vertices(family, vertices)?;
    let unit = UnitElement::of(family);
    let d = unit.domain_dimension;
    let mut x = unit.center[..d].to_vec();
    if d == 0 {
        return Ok(Some(x));
    }
    for _ in 0..opts.max_iterations {
        let mapped = interpolate(family, vertices, &x)?;
        let cols = jacobian(family, vertices, &x)?;
        let Ok(step) = pull_back(&cols, &sub(mapped, *target)) else {
            return Ok(None);
        };
        for (xi, s) in x.iter_mut().zip(&step) {
            *xi -= s;
        }
        if step.iter().map(|s| s * s).sum::<f64>().sqrt() <= opts.tolerance {
            return Ok(Some(x));
        }
    }
    log::warn!(
        "get_coords: Newton did not converge for {family:?} after {} iterations",
        opts.max_iterations
    );
    Ok(None)
}

/// Parametric coordinates of `target` when it lies in the element: the
/// coordinates fall in the reference domain and map back onto `target`.
pub fn is_inside(
    family: ElementFamily,
    vertices: &[Point],
    target: &Point,
    opts: &LocateOptions,
) -> Result<Option<Vec<f64>>, MeshError> {
    let Some(coords) = get_coords(family, vertices, target, opts)? else {
        return Ok(None);
    };
    let unit = UnitElement::of(family);
    if !unit.contains(&coords, opts.inside_tolerance) {
        return Ok(None);
    }
    let back = interpolate(family, vertices, &coords)?;
    let scale = vertices
        .iter()
        .map(|v| norm(sub(*v, vertices[0])))
        .fold(1.0, f64::max);
    if norm(sub(back, *target)) > opts.inside_tolerance * scale {
        return Ok(None);
    }
    Ok(Some(coords))
}

/// Length, area or volume of the element, by order-2 Gaussian quadrature of
/// `|det J|`. Points measure 0.
pub fn measure(family: ElementFamily, vertices: &[Point]) -> Result<f64, MeshError> {
    let scheme = SamplingScheme::gaussian(family, 2)?;
    scheme
        .reference_points()
        .zip(&scheme.weights)
        .try_fold(0.0, |acc, (x, w)| {
            Ok(acc + w * det_jacobian(family, vertices, x)?.abs())
        })
}

/// Area of a planar polygon given in winding order.
pub fn polygon_area(points: &[Point]) -> f64 {
    let Some((&first, rest)) = points.split_first() else {
        return 0.0;
    };
    let mut area = [0.0; 3];
    for pair in rest.windows(2) {
        let c = cross(sub(pair[0], first), sub(pair[1], first));
        area = [area[0] + c[0], area[1] + c[1], area[2] + c[2]];
    }
    0.5 * norm(area)
}

/// Move parametric `coords` to the nearest point of the closed reference
/// domain.
pub fn project_to_domain(family: ElementFamily, coords: &mut [f64]) {
    let clamp = |x: &mut [f64]| x.iter_mut().for_each(|t| *t = t.clamp(0.0, 1.0));
    match family {
        ElementFamily::Point => {}
        ElementFamily::Curve | ElementFamily::Quad | ElementFamily::Hex => clamp(coords),
        ElementFamily::Triangle => project_simplex(&mut coords[..2]),
        ElementFamily::Tet => project_simplex(&mut coords[..3]),
        ElementFamily::Prism => {
            project_simplex(&mut coords[..2]);
            clamp(&mut coords[2..3]);
        }
    }
}

/// Euclidean projection onto `{ x >= 0, sum(x) <= 1 }`.
fn project_simplex(x: &mut [f64]) {
    if x.iter().map(|t| t.max(0.0)).sum::<f64>() <= 1.0 {
        x.iter_mut().for_each(|t| *t = t.max(0.0));
        return;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (i, s) in sorted.iter().enumerate() {
        cumulative += s;
        let t = (cumulative - 1.0) / (i + 1) as f64;
        if s - t > 0.0 {
            theta = t;
        }
    }
    x.iter_mut().for_each(|t| *t = (*t - theta).max(0.0));
}

/// Point of the element closest to `target`, as parametric coordinates and
/// physical position.
///
/// One projected Gauss-Newton step from the center, then projected gradient
/// descent on the squared distance until the parametric update drops below
/// `opts.tolerance`.
pub fn closest_point(
    family: ElementFamily,
    vertices: &[Point],
    target: &Point,
    opts: &LocateOptions,
) -> Result<(Vec<f64>, Point), MeshError> {
    check_vertices(family, vertices)?;
    let unit = UnitElement::of(family);
    let d = unit.domain_dimension;
    let mut x = unit.center[..d].to_vec();
    if d == 0 {
        return Ok((x, vertices[0]));
    }
    let mapped = interpolate(family, vertices, &x)?;
    let cols = jacobian(family, vertices, &x)?;
    if let Ok(step) = pull_back(&cols, &sub(mapped, *target)) {
        for (xi, s) in x.iter_mut().zip(&step) {
            *xi -= s;
        }
        project_to_domain(family, &mut x);
    }
    let mut prev = vec![0.0; d];
    for _ in 0..opts.max_iterations * 100 {
        let mapped = interpolate(family, vertices, &x)?;
        let cols = jacobian(family, vertices, &x)?;
        let r = sub(mapped, *target);
        let lipschitz: f64 = cols.iter().map(|c| dot(*c, *c)).sum();
        if lipschitz <= EPS {
            break;
        }
        prev.copy_from_slice(&x);
        for (xi, c) in x.iter_mut().zip(&cols) {
            *xi -= dot(*c, r) / lipschitz;
        }
        project_to_domain(family, &mut x);
        let moved: f64 = prev.iter().zip(&x).map(|(a, b)| (a - b) * (a - b)).sum();
        if moved.sqrt() <= opts.tolerance * 1e-3 {
            break;
        }
    }
    let point = interpolate(family, vertices, &x)?;
    Ok((x, point))
}

pub(crate) fn sub(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn dot(a: Point, b: Point) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: Point, b: Point) -> Point {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: Point) -> f64 {
    dot(a, a).sqrt()
}

pub(crate) fn distance2(a: &Point, b: &Point) -> f64 {
    let d = sub(*a, *b);
    dot(d, d)
}

fn invert_3x3(mat: [f64; 9]) -> Result<[f64; 9], MeshError> {
    let det = mat[0] * (mat[4] * mat[8] - mat[5] * mat[7])
        - mat[1] * (mat[3] * mat[8] - mat[5] * mat[6])
        + mat[2] * (mat[3] * mat[7] - mat[4] * mat[6]);
    if det.abs() <= EPS {
        return Err(MeshError::InvalidGeometry("degenerate jacobian".into()));
    }
    let inv_det = 1.0 / det;
    Ok([
        (mat[4] * mat[8] - mat[5] * mat[7]) * inv_det,
        (mat[2] * mat[7] - mat[1] * mat[8]) * inv_det,
        (mat[1] * mat[5] - mat[2] * mat[4]) * inv_det,
        (mat[5] * mat[6] - mat[3] * mat[8]) * inv_det,
        (mat[0] * mat[8] - mat[2] * mat[6]) * inv_det,
        (mat[2] * mat[3] - mat[0] * mat[5]) * inv_det,
        (mat[3] * mat[7] - mat[4] * mat[6]) * inv_det,
        (mat[1] * mat[6] - mat[0] * mat[7]) * inv_det,
        (mat[0] * mat[4] - mat[1] * mat[3]) * inv_det,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn stretched_hex() -> Vec<Point> {
        UnitElement::of(ElementFamily::Hex)
            .vertices
            .iter()
            .map(|v| [2.0 * v[0] + 1.0, 3.0 * v[1], 0.5 * v[2] - 1.0])
            .collect()
    }

    #[test]
    fn interpolate_and_invert_hex() {
        let hex = stretched_hex();
        let opts = LocateOptions::default();
        let p = interpolate(ElementFamily::Hex, &hex, &[0.25, 0.5, 0.75]).unwrap();
        for (a, b) in p.iter().zip([1.5, 1.5, -0.625]) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
        let x = get_coords(ElementFamily::Hex, &hex, &p, &opts)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(x[0], 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(x[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(x[2], 0.75, epsilon = 1e-9);
    }

    #[test]
    fn det_jacobian_per_dimension() {
        let hex = stretched_hex();
        let c = [0.5, 0.5, 0.5];
        assert_abs_diff_eq!(det_jacobian(ElementFamily::Hex, &hex, &c).unwrap(), 3.0, epsilon = 1e-12);
        let tri = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        assert_abs_diff_eq!(
            det_jacobian(ElementFamily::Triangle, &tri, &[0.2, 0.2]).unwrap(),
            4.0,
            epsilon = 1e-12
        );
        let seg = [[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]];
        assert_abs_diff_eq!(
            det_jacobian(ElementFamily::Curve, &seg, &[0.1]).unwrap(),
            5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn inverse_jacobian_of_embedded_triangle() {
        let tri = [[0.0, 0.0, 1.0], [2.0, 0.0, 1.0], [0.0, 4.0, 1.0]];
        let inv = inverse_jacobian(ElementFamily::Triangle, &tri, &[0.3, 0.3]).unwrap();
        assert_abs_diff_eq!(inv[0][0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(inv[1][1], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(inv[0][2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn collapsed_element_has_zero_determinant_and_no_coords() {
        let flat = [[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        let det = det_jacobian(ElementFamily::Tet, &flat, &[0.25, 0.25, 0.25]).unwrap();
        assert_eq!(det, 0.0);
        let found = get_coords(ElementFamily::Tet, &flat, &[0.5, 0.0, 0.0], &LocateOptions::default());
        assert_eq!(found, Ok(None));
        assert!(inverse_jacobian(ElementFamily::Tet, &flat, &[0.1, 0.1, 0.1]).is_err());
    }

    #[test]
    fn inside_checks_domain_and_plane() {
        let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let opts = LocateOptions::default();
        assert!(is_inside(ElementFamily::Triangle, &tri, &[0.2, 0.2, 0.0], &opts).unwrap().is_some());
        assert!(is_inside(ElementFamily::Triangle, &tri, &[0.8, 0.8, 0.0], &opts).unwrap().is_none());
        assert!(is_inside(ElementFamily::Triangle, &tri, &[0.2, 0.2, 0.5], &opts).unwrap().is_none());
    }

    #[test]
    fn wrong_vertex_count_is_an_error() {
        let seg = [[0.0; 3]];
        assert!(matches!(
            interpolate(ElementFamily::Curve, &seg, &[0.5]),
            Err(MeshError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn measure_and_polygon_area() {
        assert_abs_diff_eq!(measure(ElementFamily::Hex, &stretched_hex()).unwrap(), 3.0, epsilon = 1e-12);
        let tri = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        assert_abs_diff_eq!(measure(ElementFamily::Triangle, &tri).unwrap(), 2.0, epsilon = 1e-12);
        assert_eq!(measure(ElementFamily::Point, &[[1.0, 2.0, 3.0]]).unwrap(), 0.0);
        let square = [[0.0, 0.0, 1.0], [2.0, 0.0, 1.0], [2.0, 2.0, 1.0], [0.0, 2.0, 1.0]];
        assert_abs_diff_eq!(polygon_area(&square), 4.0, epsilon = 1e-12);
        assert_eq!(polygon_area(&[]), 0.0);
    }

    #[test]
    fn projection_onto_reference_domains() {
        let mut x = [1.5, -0.5, 0.3];
        project_to_domain(ElementFamily::Hex, &mut x);
        assert_eq!(x, [1.0, 0.0, 0.3]);
        let mut x = [1.0, 1.0];
        project_to_domain(ElementFamily::Triangle, &mut x);
        assert_abs_diff_eq!(x[0], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(x[1], 0.5, epsilon = 1e-15);
        let mut x = [2.0, -1.0, 0.0];
        project_to_domain(ElementFamily::Tet, &mut x);
        assert_eq!(x, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn closest_point_lands_on_the_boundary() {
        let opts = LocateOptions::default();
        let (x, p) =
            closest_point(ElementFamily::Hex, &stretched_hex(), &[5.0, 1.5, -0.75], &opts).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(x[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(p[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p[2], -0.75, epsilon = 1e-9);

        let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let (_, p) = closest_point(ElementFamily::Triangle, &tri, &[1.0, 1.0, 2.0], &opts).unwrap();
        assert_abs_diff_eq!(p[0], 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(p[1], 0.5, epsilon = 1e-7);
        assert_abs_diff_eq!(p[2], 0.0, epsilon = 1e-12);
    }
}
