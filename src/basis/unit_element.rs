//! Unit element descriptors: the constant combinatorial template of each
//! element family.
//!
//! Reference domains and vertex ordering:
//! - Point: the origin.
//! - Curve: `[v0, v1]` with `x` in `[0, 1]`.
//! - Triangle: `[v0, v1, v2]` in the unit right triangle.
//! - Quad: `[v0..v3]` counter-clockwise in `[0, 1]^2`.
//! - Tet: `[v0..v3]` in the unit tetrahedron; face `i` is opposite vertex `i`.
//! - Hex: `[v0..v3]` on `z = 0` counter-clockwise, `[v4..v7]` above them.
//! - Prism: unit triangle `[v0, v1, v2]` on `z = 0`, `[v3, v4, v5]` on `z = 1`.
//!
//! Face nodes are wound so the right-hand normal points into the element.
//! Edge-interior nodes of quadratic bases follow the `edges` order.

use crate::topology::element::ElementFamily;

#[derive(Debug, PartialEq)]
pub struct UnitElement {
    pub family: ElementFamily,
    pub domain_dimension: usize,
    /// Measure of the reference domain (length, area or volume).
    pub domain_size: f64,
    pub vertices: &'static [[f64; 3]],
    pub edges: &'static [[usize; 2]],
    pub faces: &'static [&'static [usize]],
    pub center: [f64; 3],
    /// Nodes on the smallest face.
    pub vertices_of_face: usize,
}

impl UnitElement {
    pub fn of(family: ElementFamily) -> &'static UnitElement {
        match family {
            ElementFamily::Point => &POINT,
            ElementFamily::Curve => &CURVE,
            ElementFamily::Triangle => &TRIANGLE,
            ElementFamily::Quad => &QUAD,
            ElementFamily::Tet => &TET,
            ElementFamily::Hex => &HEX,
            ElementFamily::Prism => &PRISM,
        }
    }

    #[inline]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn faces_of_cell(&self) -> usize {
        self.faces.len()
    }

    /// Edges bounding a face with `vertices_of_face` nodes.
    #[inline]
    pub fn edges_of_face(&self) -> usize {
        match self.vertices_of_face {
            0 | 1 => 0,
            2 => 1,
            n => n,
        }
    }

    /// Whether parametric `coords` lie in the closed reference domain grown by
    /// `tol`.
    pub fn contains(&self, coords: &[f64], tol: f64) -> bool {
        let c = |k: usize| coords.get(k).copied().unwrap_or(0.0);
        let in_unit = |t: f64| t >= -tol && t <= 1.0 + tol;
        match self.family {
            ElementFamily::Point => true,
            ElementFamily::Curve => in_unit(c(0)),
            ElementFamily::Quad => in_unit(c(0)) && in_unit(c(1)),
            ElementFamily::Hex => in_unit(c(0)) && in_unit(c(1)) && in_unit(c(2)),
            ElementFamily::Triangle => c(0) >= -tol && c(1) >= -tol && c(0) + c(1) <= 1.0 + tol,
            ElementFamily::Tet => {
                c(0) >= -tol && c(1) >= -tol && c(2) >= -tol && c(0) + c(1) + c(2) <= 1.0 + tol
            }
            ElementFamily::Prism => {
                c(0) >= -tol && c(1) >= -tol && c(0) + c(1) <= 1.0 + tol && in_unit(c(2))
            }
        }
    }
}

const THIRD: f64 = 1.0 / 3.0;

static POINT: UnitElement = UnitElement {
    family: ElementFamily::Point,
    domain_dimension: 0,
    domain_size: 0.0,
    vertices: &[[0.0, 0.0, 0.0]],
    edges: &[],
    faces: &[],
    center: [0.0, 0.0, 0.0],
    vertices_of_face: 0,
};

static CURVE: UnitElement = UnitElement {
    family: ElementFamily::Curve,
    domain_dimension: 1,
    domain_size: 1.0,
    vertices: &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
    edges: &[[0, 1]],
    faces: &[],
    center: [0.5, 0.0, 0.0],
    vertices_of_face: 0,
};

static TRIANGLE: UnitElement = UnitElement {
    family: ElementFamily::Triangle,
    domain_dimension: 2,
    domain_size: 0.5,
    vertices: &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
    edges: &[[0, 1], [1, 2], [2, 0]],
    faces: &[&[0, 1, 2]],
    center: [THIRD, THIRD, 0.0],
    vertices_of_face: 3,
};

static QUAD: UnitElement = UnitElement {
    family: ElementFamily::Quad,
    domain_dimension: 2,
    domain_size: 1.0,
    vertices: &[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ],
    edges: &[[0, 1], [1, 2], [2, 3], [3, 0]],
    faces: &[&[0, 1, 2, 3]],
    center: [0.5, 0.5, 0.0],
    vertices_of_face: 4,
};

static TET: UnitElement = UnitElement {
    family: ElementFamily::Tet,
    domain_dimension: 3,
    domain_size: 1.0 / 6.0,
    vertices: &[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ],
    edges: &[[0, 1], [1, 2], [2, 0], [0, 3], [1, 3], [2, 3]],
    faces: &[&[1, 3, 2], &[0, 2, 3], &[0, 3, 1], &[0, 1, 2]],
    center: [0.25, 0.25, 0.25],
    vertices_of_face: 3,
};

static HEX: UnitElement = UnitElement {
    family: ElementFamily::Hex,
    domain_dimension: 3,
    domain_size: 1.0,
    vertices: &[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ],
    edges: &[
        [0, 1],
        [1, 2],
        [2, 3],
        [3, 0],
        [0, 4],
        [1, 5],
        [2, 6],
        [3, 7],
        [4, 5],
        [5, 6],
        [6, 7],
        [7, 4],
    ],
    faces: &[
        &[0, 1, 2, 3],
        &[7, 6, 5, 4],
        &[0, 4, 5, 1],
        &[2, 6, 7, 3],
        &[3, 7, 4, 0],
        &[1, 5, 6, 2],
    ],
    center: [0.5, 0.5, 0.5],
    vertices_of_face: 4,
};

static PRISM: UnitElement = UnitElement {
    family: ElementFamily::Prism,
    domain_dimension: 3,
    domain_size: 0.5,
    vertices: &[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [0.0, 1.0, 1.0],
    ],
    edges: &[
        [0, 1],
        [1, 2],
        [2, 0],
        [0, 3],
        [1, 4],
        [2, 5],
        [3, 4],
        [4, 5],
        [5, 3],
    ],
    faces: &[
        &[0, 1, 2],
        &[3, 5, 4],
        &[0, 3, 4, 1],
        &[1, 4, 5, 2],
        &[2, 5, 3, 0],
    ],
    center: [THIRD, THIRD, 0.5],
    vertices_of_face: 3,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_family() {
        let rows: Vec<_> = ElementFamily::ALL
            .iter()
            .map(|&f| {
                let u = UnitElement::of(f);
                (
                    u.number_of_vertices(),
                    u.number_of_edges(),
                    u.faces_of_cell(),
                    u.vertices_of_face,
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                (1, 0, 0, 0),
                (2, 1, 0, 0),
                (3, 3, 1, 3),
                (4, 4, 1, 4),
                (4, 6, 4, 3),
                (8, 12, 6, 4),
                (6, 9, 5, 3),
            ]
        );
    }

    #[test]
    fn domain_sizes() {
        assert_eq!(UnitElement::of(ElementFamily::Tet).domain_size, 1.0 / 6.0);
        assert_eq!(UnitElement::of(ElementFamily::Prism).domain_size, 0.5);
        assert_eq!(UnitElement::of(ElementFamily::Hex).domain_size, 1.0);
    }

    #[test]
    fn every_edge_is_on_some_face() {
        for f in [ElementFamily::Tet, ElementFamily::Hex, ElementFamily::Prism] {
            let u = UnitElement::of(f);
            for &[a, b] in u.edges {
                let on_face = u.faces.iter().any(|face| {
                    let n = face.len();
                    (0..n).any(|i| {
                        let (p, q) = (face[i], face[(i + 1) % n]);
                        (p, q) == (a, b) || (q, p) == (a, b)
                    })
                });
                assert!(on_face, "{f:?} edge {a}-{b}");
            }
        }
    }

    #[test]
    fn face_normals_point_inward() {
        for f in [ElementFamily::Tet, ElementFamily::Hex, ElementFamily::Prism] {
            let u = UnitElement::of(f);
            let c = u.center;
            for face in u.faces {
                let p: Vec<[f64; 3]> = face.iter().map(|&v| u.vertices[v]).collect();
                let a = [p[1][0] - p[0][0], p[1][1] - p[0][1], p[1][2] - p[0][2]];
                let b = [p[2][0] - p[0][0], p[2][1] - p[0][1], p[2][2] - p[0][2]];
                let n = [
                    a[1] * b[2] - a[2] * b[1],
                    a[2] * b[0] - a[0] * b[2],
                    a[0] * b[1] - a[1] * b[0],
                ];
                let out = [p[0][0] - c[0], p[0][1] - c[1], p[0][2] - c[2]];
                let dot = n[0] * out[0] + n[1] * out[1] + n[2] * out[2];
                assert!(dot < 0.0, "{f:?} face {face:?} winds outward");
            }
        }
    }

    #[test]
    fn contains_reference_domains() {
        let tri = UnitElement::of(ElementFamily::Triangle);
        assert!(tri.contains(&[0.2, 0.2], 0.0));
        assert!(!tri.contains(&[0.6, 0.6], 0.0));
        let prism = UnitElement::of(ElementFamily::Prism);
        assert!(prism.contains(&[0.5, 0.5, 1.0], 0.0));
        assert!(!prism.contains(&[0.5, 0.5, 1.1], 0.0));
        assert!(prism.contains(&[0.5, 0.5, 1.05], 0.1));
    }
}
