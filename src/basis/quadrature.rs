//! Sampling schemes on the reference elements: Gaussian quadrature and
//! regular subdivision sampling.
//!
//! Weights are scaled so they sum to the measure of the reference domain
//! (`UnitElement::domain_size`), except for the point element where a single
//! unit weight is used.

use super::unit_element::UnitElement;
use crate::mesh_error::MeshError;
use crate::topology::element::ElementFamily;

/// How the points of a [`SamplingScheme`] were placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemeKind {
    /// Gauss points; integrates polynomials exactly up to the rule degree.
    Gaussian,
    /// One point per cell of a uniform `order`-fold subdivision, all cells of
    /// equal measure.
    Regular,
}

/// Sample points and weights on one reference element.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingScheme {
    pub family: ElementFamily,
    pub kind: SchemeKind,
    /// Gaussian: 1 to 3 points per axis. Regular: subdivisions per axis.
    pub order: usize,
    /// Sample points in reference coordinates; unused components are 0.
    pub points: Vec<[f64; 3]>,
    pub weights: Vec<f64>,
}

impl SamplingScheme {
    pub fn gaussian(family: ElementFamily, order: usize) -> Result<Self, MeshError> {
        if !(1..=3).contains(&order) {
            return Err(MeshError::InvalidGeometry(format!(
                "unsupported quadrature order {order} for {family:?}"
            )));
        }
        let (points, weights) = match family {
            ElementFamily::Point => (vec![[0.0; 3]], vec![1.0]),
            ElementFamily::Curve => tensor(1, order),
            ElementFamily::Quad => tensor(2, order),
            ElementFamily::Hex => tensor(3, order),
            ElementFamily::Triangle => triangle(order),
            ElementFamily::Tet => tet(order),
            ElementFamily::Prism => {
                let (tp, tw) = triangle(order);
                let (lp, lw) = gauss_legendre_1d(order);
                extrude(&tp, &tw, &lp, &lw)
            }
        };
        Ok(SamplingScheme {
            family,
            kind: SchemeKind::Gaussian,
            order,
            points,
            weights,
        })
    }

    /// Regular sampling: the reference element is cut into `order` slices per
    /// axis and each piece contributes its centroid with an equal weight.
    ///
    /// A tet is sampled like a cube lattice clipped to the simplex: one point
    /// in the corner cells, four or five in the interior cells.
    pub fn regular(family: ElementFamily, order: usize) -> Result<Self, MeshError> {
        if order == 0 {
            return Err(MeshError::InvalidGeometry(format!(
                "unsupported sampling order 0 for {family:?}"
            )));
        }
        let n = order as f64;
        let points = match family {
            ElementFamily::Point => vec![[0.0; 3]],
            ElementFamily::Curve => cell_centers(1, order),
            ElementFamily::Quad => cell_centers(2, order),
            ElementFamily::Hex => cell_centers(3, order),
            ElementFamily::Triangle => triangle_centroids(order),
            ElementFamily::Tet => tet_samples(order),
            ElementFamily::Prism => {
                let tri = triangle_centroids(order);
                let mut points = Vec::with_capacity(tri.len() * order);
                for k in 0..order {
                    let z = (k as f64 + 0.5) / n;
                    points.extend(tri.iter().map(|p| [p[0], p[1], z]));
                }
                points
            }
        };
        let total = match family {
            ElementFamily::Point => 1.0,
            f => UnitElement::of(f).domain_size,
        };
        let weights = vec![total / points.len() as f64; points.len()];
        Ok(SamplingScheme {
            family,
            kind: SchemeKind::Regular,
            order,
            points,
            weights,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reference dimension of the points.
    pub fn dimension(&self) -> usize {
        UnitElement::of(self.family).domain_dimension
    }

    /// Points truncated to the reference dimension.
    pub fn reference_points(&self) -> impl Iterator<Item = &[f64]> + '_ {
        let d = self.dimension();
        self.points.iter().map(move |p| &p[..d])
    }
}

fn extrude(tp: &[[f64; 3]], tw: &[f64], lp: &[f64], lw: &[f64]) -> (Vec<[f64; 3]>, Vec<f64>) {
    let mut points = Vec::with_capacity(tp.len() * lp.len());
    let mut weights = Vec::with_capacity(points.capacity());
    for (z, wz) in lp.iter().zip(lw) {
        for (p, wp) in tp.iter().zip(tw) {
            points.push([p[0], p[1], *z]);
            weights.push(wp * wz);
        }
    }
    (points, weights)
}

/// Centers of the `n^d` cells of a uniform grid on the unit cube.
fn cell_centers(d: usize, n: usize) -> Vec<[f64; 3]> {
    let count = n.pow(d as u32);
    (0..count)
        .map(|flat| {
            let mut p = [0.0; 3];
            let mut rest = flat;
            for pk in p.iter_mut().take(d) {
                *pk = ((rest % n) as f64 + 0.5) / n as f64;
                rest /= n;
            }
            p
        })
        .collect()
}

/// Centroids of the `n^2` congruent triangles of the uniform split.
fn triangle_centroids(n: usize) -> Vec<[f64; 3]> {
    let h = 1.0 / n as f64;
    let mut points = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n - i {
            let (x, y) = (i as f64, j as f64);
            points.push([(x + 1.0 / 3.0) * h, (y + 1.0 / 3.0) * h, 0.0]);
            if i + j + 2 <= n {
                points.push([(x + 2.0 / 3.0) * h, (y + 2.0 / 3.0) * h, 0.0]);
            }
        }
    }
    points
}

fn tet_samples(n: usize) -> Vec<[f64; 3]> {
    let h = 1.0 / n as f64;
    let at = |p: usize, q: usize, r: usize, a: f64, b: f64, c: f64| {
        [(p as f64 + a) * h, (q as f64 + b) * h, (r as f64 + c) * h]
    };
    let (q1, q2, t) = (0.25, 0.5, 1.0 / 3.0);
    let mut points = Vec::new();
    for p in 0..n {
        for q in 0..n {
            for r in 0..n {
                let sum = p + q + r;
                if sum + 1 == n {
                    points.push(at(p, q, r, q1, q1, q1));
                } else if sum + 2 <= n {
                    points.push(at(p, q, r, q2, q1, q1));
                    points.push(at(p, q, r, q1, q2, q1));
                    points.push(at(p, q, r, q1, q1, q2));
                    points.push(at(p, q, r, t, t, t));
                    if sum + 2 < n {
                        points.push(at(p, q, r, q2, q2, q2));
                    }
                }
            }
        }
    }
    points
}

/// Gauss-Legendre points and weights on `[0, 1]`.
pub fn gauss_legendre_1d(n: usize) -> (Vec<f64>, Vec<f64>) {
    match n {
        1 => (vec![0.5], vec![1.0]),
        2 => {
            let h = 0.5 / 3.0_f64.sqrt();
            (vec![0.5 - h, 0.5 + h], vec![0.5, 0.5])
        }
        _ => {
            let h = 0.5 * (3.0_f64 / 5.0).sqrt();
            (
                vec![0.5 - h, 0.5, 0.5 + h],
                vec![5.0 / 18.0, 8.0 / 18.0, 5.0 / 18.0],
            )
        }
    }
}

fn tensor(d: usize, n: usize) -> (Vec<[f64; 3]>, Vec<f64>) {
    let (xs, ws) = gauss_legendre_1d(n);
    let count = n.pow(d as u32);
    let mut points = Vec::with_capacity(count);
    let mut weights = Vec::with_capacity(count);
    for flat in 0..count {
        let mut p = [0.0; 3];
        let mut w = 1.0;
        let mut rest = flat;
        for pk in p.iter_mut().take(d) {
            let i = rest % n;
            rest /= n;
            *pk = xs[i];
            w *= ws[i];
        }
        points.push(p);
        weights.push(w);
    }
    (points, weights)
}

fn triangle(order: usize) -> (Vec<[f64; 3]>, Vec<f64>) {
    match order {
        1 => (vec![[1.0 / 3.0, 1.0 / 3.0, 0.0]], vec![0.5]),
        2 => (
            vec![
                [1.0 / 6.0, 1.0 / 6.0, 0.0],
                [2.0 / 3.0, 1.0 / 6.0, 0.0],
                [1.0 / 6.0, 2.0 / 3.0, 0.0],
            ],
            vec![1.0 / 6.0; 3],
        ),
        _ => {
            let (a, wa) = (0.445948490915965, 0.223381589678011 / 2.0);
            let (b, wb) = (0.091576213509771, 0.109951743655322 / 2.0);
            (
                vec![
                    [a, a, 0.0],
                    [1.0 - 2.0 * a, a, 0.0],
                    [a, 1.0 - 2.0 * a, 0.0],
                    [b, b, 0.0],
                    [1.0 - 2.0 * b, b, 0.0],
                    [b, 1.0 - 2.0 * b, 0.0],
                ],
                vec![wa, wa, wa, wb, wb, wb],
            )
        }
    }
}

fn tet(order: usize) -> (Vec<[f64; 3]>, Vec<f64>) {
    match order {
        1 => (vec![[0.25; 3]], vec![1.0 / 6.0]),
        2 => {
            let (a, b) = (0.5854101966249685, 0.1381966011250105);
            (
                vec![[b, b, b], [a, b, b], [b, a, b], [b, b, a]],
                vec![1.0 / 24.0; 4],
            )
        }
        _ => {
            let (s, h) = (1.0 / 6.0, 0.5);
            (
                vec![[0.25; 3], [s, s, s], [h, s, s], [s, h, s], [s, s, h]],
                vec![-2.0 / 15.0, 3.0 / 40.0, 3.0 / 40.0, 3.0 / 40.0, 3.0 / 40.0],
            )
        }
    }
}
