//! Structured box generators producing [`UnstructuredMesh`]es.
//!
//! Nodes are laid out x-fastest, then y, then z. Simplicial and prismatic
//! meshes split every box cell the same way, so the result is conforming.

use crate::basis::Basis;
use crate::config::MeshGenOptions;
use crate::geometry::{self, Point};
use crate::mesh::UnstructuredMesh;
use crate::mesh_error::MeshError;
use crate::topology::element::ElementFamily;
use crate::topology::index::NodeIndex;
use itertools::iproduct;

fn invalid_geometry(message: impl Into<String>) -> MeshError {
    MeshError::InvalidGeometry(message.into())
}

fn check_extent(cells: &[usize], min: &[f64], max: &[f64]) -> Result<(), MeshError> {
    if cells.contains(&0) {
        return Err(invalid_geometry(format!(
            "cell counts must be positive, got {cells:?}"
        )));
    }
    if min.iter().zip(max).any(|(lo, hi)| !(hi > lo)) {
        return Err(invalid_geometry(format!(
            "empty extent: min {min:?}, max {max:?}"
        )));
    }
    Ok(())
}

/// Node grid of `cells + 1` nodes per axis; unused axes stay at 0.
fn grid(cells: [usize; 3], min: Point, max: Point) -> Vec<Point> {
    let h = [0, 1, 2].map(|a| {
        if cells[a] == 0 {
            0.0
        } else {
            (max[a] - min[a]) / cells[a] as f64
        }
    });
    iproduct!(0..=cells[2], 0..=cells[1], 0..=cells[0])
        .map(|(k, j, i)| {
            [
                min[0] + h[0] * i as f64,
                min[1] + h[1] * j as f64,
                min[2] + h[2] * k as f64,
            ]
        })
        .collect()
}

fn build(
    family: ElementFamily,
    points: Vec<Point>,
    elems: Vec<NodeIndex>,
    options: MeshGenOptions,
) -> Result<UnstructuredMesh, MeshError> {
    let basis = Basis::new(family, options.basis_order)?;
    let mesh = UnstructuredMesh::from_parts(basis, points, elems)?.with_sync_options(options.sync);
    log::debug!(
        "meshgen: {family:?} mesh with {} nodes",
        mesh.points().len()
    );
    Ok(mesh)
}

/// Node indices of the 8 corners of box cell `(i, j, k)`, in unit hex order.
fn hex_corners(cells: [usize; 3], i: usize, j: usize, k: usize) -> [usize; 8] {
    let row = cells[0] + 1;
    let slab = row * (cells[1] + 1);
    let v0 = k * slab + j * row + i;
    let v3 = v0 + row;
    let v4 = v0 + slab;
    let v7 = v4 + row;
    [v0, v0 + 1, v3 + 1, v3, v4, v4 + 1, v7 + 1, v7]
}

fn to_nodes(ids: impl IntoIterator<Item = usize>) -> impl Iterator<Item = NodeIndex> {
    ids.into_iter().map(NodeIndex::from_usize)
}

/// `n` curve elements over `[min, max]` on the x axis.
pub fn line(
    n: usize,
    min: f64,
    max: f64,
    options: MeshGenOptions,
) -> Result<UnstructuredMesh, MeshError> {
    check_extent(&[n], &[min], &[max])?;
    let points = grid([n, 0, 0], [min, 0.0, 0.0], [max, 0.0, 0.0]);
    let elems = to_nodes((0..n).flat_map(|i| [i, i + 1])).collect();
    build(ElementFamily::Curve, points, elems, options)
}

/// `nx * ny` quads over the rectangle `[min, max]`.
pub fn rect_quad(
    nx: usize,
    ny: usize,
    min: [f64; 2],
    max: [f64; 2],
    options: MeshGenOptions,
) -> Result<UnstructuredMesh, MeshError> {
    check_extent(&[nx, ny], &min, &max)?;
    let cells = [nx, ny, 0];
    let points = grid(cells, [min[0], min[1], 0.0], [max[0], max[1], 0.0]);
    let elems = to_nodes(
        iproduct!(0..ny, 0..nx).flat_map(|(j, i)| {
            let c = hex_corners(cells, i, j, 0);
            [c[0], c[1], c[2], c[3]]
        }),
    )
    .collect();
    build(ElementFamily::Quad, points, elems, options)
}

/// `2 * nx * ny` triangles: every quad split along its `(0, 0)-(1, 1)`
/// diagonal.
pub fn rect_tri(
    nx: usize,
    ny: usize,
    min: [f64; 2],
    max: [f64; 2],
    options: MeshGenOptions,
) -> Result<UnstructuredMesh, MeshError> {
    check_extent(&[nx, ny], &min, &max)?;
    let cells = [nx, ny, 0];
    let points = grid(cells, [min[0], min[1], 0.0], [max[0], max[1], 0.0]);
    let elems = to_nodes(
        iproduct!(0..ny, 0..nx).flat_map(|(j, i)| {
            let [a, b, c, d, ..] = hex_corners(cells, i, j, 0);
            [a, b, c, a, c, d]
        }),
    )
    .collect();
    build(ElementFamily::Triangle, points, elems, options)
}

/// `nx * ny * nz` hexahedra over the box `[min, max]`.
pub fn box_hex(
    cells: [usize; 3],
    min: Point,
    max: Point,
    options: MeshGenOptions,
) -> Result<UnstructuredMesh, MeshError> {
    check_extent(&cells, &min, &max)?;
    let points = grid(cells, min, max);
    let elems = to_nodes(
        iproduct!(0..cells[2], 0..cells[1], 0..cells[0])
            .flat_map(|(k, j, i)| hex_corners(cells, i, j, k)),
    )
    .collect();
    build(ElementFamily::Hex, points, elems, options)
}

/// Six tetrahedra per box cell (Kuhn split along the main diagonal), each
/// positively oriented.
pub fn box_tet(
    cells: [usize; 3],
    min: Point,
    max: Point,
    options: MeshGenOptions,
) -> Result<UnstructuredMesh, MeshError> {
    check_extent(&cells, &min, &max)?;
    let points = grid(cells, min, max);
    // local hex vertex reached by the axis offsets
    let corner = |o: [usize; 3]| [[[0, 1], [3, 2]], [[4, 5], [7, 6]]][o[2]][o[1]][o[0]];
    let mut elems = Vec::with_capacity(cells.iter().product::<usize>() * 24);
    for (k, j, i) in iproduct!(0..cells[2], 0..cells[1], 0..cells[0]) {
        let c = hex_corners(cells, i, j, k);
        for [a, b, _] in [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
            let mut o1 = [0; 3];
            o1[a] = 1;
            let mut o2 = o1;
            o2[b] = 1;
            let mut tet = [c[0], c[corner(o1)], c[corner(o2)], c[6]];
            let verts = tet.map(|n| points[n]);
            if signed_volume(&verts) < 0.0 {
                tet.swap(1, 2);
            }
            elems.extend(to_nodes(tet));
        }
    }
    build(ElementFamily::Tet, points, elems, options)
}

/// Two prisms per box cell, the bottom quad split like [`rect_tri`].
pub fn box_prism(
    cells: [usize; 3],
    min: Point,
    max: Point,
    options: MeshGenOptions,
) -> Result<UnstructuredMesh, MeshError> {
    check_extent(&cells, &min, &max)?;
    let points = grid(cells, min, max);
    let elems = to_nodes(
        iproduct!(0..cells[2], 0..cells[1], 0..cells[0]).flat_map(|(k, j, i)| {
            let [a, b, c, d, e, f, g, h] = hex_corners(cells, i, j, k);
            [a, b, c, e, f, g, a, c, d, e, g, h]
        }),
    )
    .collect();
    build(ElementFamily::Prism, points, elems, options)
}

fn signed_volume(v: &[Point; 4]) -> f64 {
    let [a, b, c] = [1, 2, 3].map(|i| geometry::sub(v[i], v[0]));
    geometry::dot(a, geometry::cross(b, c)) / 6.0
}
