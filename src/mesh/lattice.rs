//! Axis-aligned structured hexahedral mesh with closed-form connectivity.
//!
//! Nodes, cells, edges and faces are numbered arithmetically, so there is
//! nothing to synchronize: every table is native and queries never touch a
//! lock.
//!
//! With `ni x nj x nk` nodes and `ci = ni - 1` (likewise `cj`, `ck`) cells
//! per axis:
//!
//! * node `(i, j, k)` is `i + ni * (j + nj * k)`, cell `(i, j, k)` is
//!   `i + ci * (j + cj * k)`;
//! * edges are the x-edges, then the y-edges, then the z-edges, each block
//!   laid out like the nodes with the running axis shortened by one;
//! * faces are the z-normal faces, then x-normal, then y-normal, with the
//!   same convention.

use crate::basis::{Basis, BasisOrder, ScaleFactorTable};
use crate::geometry::Point;
use crate::mesh::{ConcreteMesh, check_range};
use crate::mesh_error::MeshError;
use crate::topology::element::ElementFamily;
use crate::topology::index::{EdgeIndex, ElemIndex, EntityKind, FaceIndex, NodeIndex};
use crate::topology::sync::SyncFlags;
use crate::topology::tables::BoundingBox;
use itertools::iproduct;

#[derive(Clone, Debug, PartialEq)]
pub struct LatticeMesh {
    basis: Basis,
    min: Point,
    max: Point,
    /// Nodes per axis.
    dims: [usize; 3],
    scale_factors: Option<ScaleFactorTable>,
}

impl LatticeMesh {
    /// Trilinear lattice of `dims` nodes spanning `[min, max]`.
    pub fn new(dims: [usize; 3], min: Point, max: Point) -> Result<Self, MeshError> {
        Self::with_order(dims, min, max, BasisOrder::Linear)
    }

    /// For the scale-factor Hermite order every cell gets its spacing as
    /// scale factors.
    pub fn with_order(
        dims: [usize; 3],
        min: Point,
        max: Point,
        order: BasisOrder,
    ) -> Result<Self, MeshError> {
        if dims.iter().any(|&d| d < 2) {
            return Err(MeshError::InvalidGeometry(format!(
                "lattice needs at least 2 nodes per axis, got {dims:?}"
            )));
        }
        if (0..3).any(|a| !(max[a] > min[a])) {
            return Err(MeshError::InvalidGeometry(format!(
                "lattice box is empty: min {min:?}, max {max:?}"
            )));
        }
        let basis = Basis::new(ElementFamily::Hex, order)?;
        let mut mesh = LatticeMesh {
            basis,
            min,
            max,
            dims,
            scale_factors: None,
        };
        NodeIndex::try_from_usize(mesh.num_nodes())?;
        EdgeIndex::try_from_usize(mesh.edge_count())?;
        FaceIndex::try_from_usize(mesh.face_count())?;
        if order.uses_scale_factors() {
            let h = mesh.spacing();
            let values = std::iter::repeat_n(h, mesh.num_elems()).flatten().collect();
            mesh.scale_factors = Some(ScaleFactorTable::from_flat(3, values)?);
        }
        log::debug!(
            "LatticeMesh: {dims:?} nodes, {} cells, {order:?}",
            mesh.num_elems()
        );
        Ok(mesh)
    }

    pub fn node_dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn cell_dims(&self) -> [usize; 3] {
        self.dims.map(|d| d - 1)
    }

    pub fn spacing(&self) -> Point {
        let c = self.cell_dims();
        [0, 1, 2].map(|a| (self.max[a] - self.min[a]) / c[a] as f64)
    }

    fn node(&self, i: usize, j: usize, k: usize) -> NodeIndex {
        let [ni, nj, _] = self.dims;
        NodeIndex::from_usize(i + ni * (j + nj * k))
    }

    fn node_ijk(&self, n: usize) -> [usize; 3] {
        let [ni, nj, _] = self.dims;
        [n % ni, (n / ni) % nj, n / (ni * nj)]
    }

    fn cell(&self, i: usize, j: usize, k: usize) -> ElemIndex {
        let [ci, cj, _] = self.cell_dims();
        ElemIndex::from_usize(i + ci * (j + cj * k))
    }

    fn cell_ijk(&self, c: usize) -> [usize; 3] {
        let [ci, cj, _] = self.cell_dims();
        [c % ci, (c / ci) % cj, c / (ci * cj)]
    }

    /// Sizes of the x-, y- and z-edge blocks.
    fn edge_blocks(&self) -> [usize; 3] {
        let [ni, nj, nk] = self.dims;
        let [ci, cj, ck] = self.cell_dims();
        [ci * nj * nk, ni * cj * nk, ni * nj * ck]
    }

    /// Sizes of the z-, x- and y-normal face blocks.
    fn face_blocks(&self) -> [usize; 3] {
        let [ni, nj, nk] = self.dims;
        let [ci, cj, ck] = self.cell_dims();
        [ci * cj * nk, ni * cj * ck, ci * nj * ck]
    }

    fn edge_count(&self) -> usize {
        self.edge_blocks().iter().sum()
    }

    fn face_count(&self) -> usize {
        self.face_blocks().iter().sum()
    }

    fn ex(&self, i: usize, j: usize, k: usize) -> EdgeIndex {
        let [ci, ..] = self.cell_dims();
        EdgeIndex::from_usize(i + ci * (j + self.dims[1] * k))
    }

    fn ey(&self, i: usize, j: usize, k: usize) -> EdgeIndex {
        let [x, ..] = self.edge_blocks();
        let [_, cj, _] = self.cell_dims();
        EdgeIndex::from_usize(x + i + self.dims[0] * (j + cj * k))
    }

    fn ez(&self, i: usize, j: usize, k: usize) -> EdgeIndex {
        let [x, y, _] = self.edge_blocks();
        let [ni, nj, _] = self.dims;
        EdgeIndex::from_usize(x + y + i + ni * (j + nj * k))
    }

    fn fz(&self, i: usize, j: usize, k: usize) -> FaceIndex {
        let [ci, cj, _] = self.cell_dims();
        FaceIndex::from_usize(i + ci * (j + cj * k))
    }

    fn fx(&self, i: usize, j: usize, k: usize) -> FaceIndex {
        let [z, ..] = self.face_blocks();
        let [_, cj, _] = self.cell_dims();
        FaceIndex::from_usize(z + i + self.dims[0] * (j + cj * k))
    }

    fn fy(&self, i: usize, j: usize, k: usize) -> FaceIndex {
        let [z, x, _] = self.face_blocks();
        let [ci, ..] = self.cell_dims();
        FaceIndex::from_usize(z + x + i + ci * (j + self.dims[1] * k))
    }

    fn check_elem(&self, elem: ElemIndex) -> Result<[usize; 3], MeshError> {
        check_range(EntityKind::Elem, elem.idx(), self.num_elems())?;
        Ok(self.cell_ijk(elem.idx()))
    }

    /// Cell range covering `[lo, hi]` along axis `a`, clamped to the lattice.
    fn cell_span(&self, a: usize, lo: f64, hi: f64) -> std::ops::RangeInclusive<usize> {
        let h = self.spacing()[a];
        let last = self.cell_dims()[a] - 1;
        let clamp = |x: f64| (((x - self.min[a]) / h).floor().max(0.0) as usize).min(last);
        clamp(lo)..=clamp(hi)
    }
}

impl ConcreteMesh for LatticeMesh {
    fn basis(&self) -> Basis {
        self.basis
    }

    fn is_editable(&self) -> bool {
        false
    }

    fn num_nodes(&self) -> usize {
        self.dims.iter().product()
    }

    fn num_elems(&self) -> usize {
        self.cell_dims().iter().product()
    }

    fn num_edges(&self) -> Result<usize, MeshError> {
        Ok(self.edge_count())
    }

    fn num_faces(&self) -> Result<usize, MeshError> {
        Ok(self.face_count())
    }

    fn get_point(&self, node: NodeIndex) -> Result<Point, MeshError> {
        check_range(EntityKind::Node, node.idx(), self.num_nodes())?;
        let ijk = self.node_ijk(node.idx());
        let h = self.spacing();
        Ok([0, 1, 2].map(|a| self.min[a] + h[a] * ijk[a] as f64))
    }

    fn elem_nodes(&self, elem: ElemIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        out.clear();
        let [i, j, k] = self.check_elem(elem)?;
        for kk in [k, k + 1] {
            out.extend([
                self.node(i, j, kk),
                self.node(i + 1, j, kk),
                self.node(i + 1, j + 1, kk),
                self.node(i, j + 1, kk),
            ]);
        }
        Ok(())
    }

    fn node_elems(&self, node: NodeIndex, out: &mut Vec<ElemIndex>) -> Result<(), MeshError> {
        out.clear();
        check_range(EntityKind::Node, node.idx(), self.num_nodes())?;
        let [i, j, k] = self.node_ijk(node.idx());
        let c = self.cell_dims();
        let around = |n: usize, a: usize| (n.saturating_sub(1)..=n).filter(move |&x| x < c[a]);
        for (kk, jj, ii) in iproduct!(around(k, 2), around(j, 1), around(i, 0)) {
            out.push(self.cell(ii, jj, kk));
        }
        Ok(())
    }

    fn edge_nodes(&self, edge: EdgeIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        out.clear();
        check_range(EntityKind::Edge, edge.idx(), self.edge_count())?;
        let [ni, nj, _] = self.dims;
        let [ci, cj, _] = self.cell_dims();
        let [x, y, _] = self.edge_blocks();
        let e = edge.idx();
        let (a, b) = if e < x {
            let (i, j, k) = (e % ci, (e / ci) % nj, e / (ci * nj));
            (self.node(i, j, k), self.node(i + 1, j, k))
        } else if e < x + y {
            let r = e - x;
            let (i, j, k) = (r % ni, (r / ni) % cj, r / (ni * cj));
            (self.node(i, j, k), self.node(i, j + 1, k))
        } else {
            let r = e - x - y;
            let (i, j, k) = (r % ni, (r / ni) % nj, r / (ni * nj));
            (self.node(i, j, k), self.node(i, j, k + 1))
        };
        out.extend([a, b]);
        Ok(())
    }

    fn elem_edges(&self, elem: ElemIndex, out: &mut Vec<EdgeIndex>) -> Result<(), MeshError> {
        out.clear();
        let [i, j, k] = self.check_elem(elem)?;
        out.extend([
            self.ex(i, j, k),
            self.ey(i + 1, j, k),
            self.ex(i, j + 1, k),
            self.ey(i, j, k),
            self.ez(i, j, k),
            self.ez(i + 1, j, k),
            self.ez(i + 1, j + 1, k),
            self.ez(i, j + 1, k),
            self.ex(i, j, k + 1),
            self.ey(i + 1, j, k + 1),
            self.ex(i, j + 1, k + 1),
            self.ey(i, j, k + 1),
        ]);
        Ok(())
    }

    fn face_nodes(&self, face: FaceIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        out.clear();
        check_range(EntityKind::Face, face.idx(), self.face_count())?;
        let [ni, nj, _] = self.dims;
        let [ci, cj, _] = self.cell_dims();
        let [z, x, _] = self.face_blocks();
        let f = face.idx();
        if f < z {
            let (i, j, k) = (f % ci, (f / ci) % cj, f / (ci * cj));
            out.extend([
                self.node(i, j, k),
                self.node(i + 1, j, k),
                self.node(i + 1, j + 1, k),
                self.node(i, j + 1, k),
            ]);
        } else if f < z + x {
            let r = f - z;
            let (i, j, k) = (r % ni, (r / ni) % cj, r / (ni * cj));
            out.extend([
                self.node(i, j, k),
                self.node(i, j + 1, k),
                self.node(i, j + 1, k + 1),
                self.node(i, j, k + 1),
            ]);
        } else {
            let r = f - z - x;
            let (i, j, k) = (r % ci, (r / ci) % nj, r / (ci * nj));
            out.extend([
                self.node(i, j, k),
                self.node(i, j, k + 1),
                self.node(i + 1, j, k + 1),
                self.node(i + 1, j, k),
            ]);
        }
        Ok(())
    }

    fn elem_faces(&self, elem: ElemIndex, out: &mut Vec<FaceIndex>) -> Result<(), MeshError> {
        out.clear();
        let [i, j, k] = self.check_elem(elem)?;
        out.extend([
            self.fz(i, j, k),
            self.fz(i, j, k + 1),
            self.fy(i, j, k),
            self.fy(i, j + 1, k),
            self.fx(i, j, k),
            self.fx(i + 1, j, k),
        ]);
        Ok(())
    }

    fn elem_neighbors(
        &self,
        elem: ElemIndex,
        out: &mut Vec<Option<ElemIndex>>,
    ) -> Result<(), MeshError> {
        out.clear();
        let [i, j, k] = self.check_elem(elem)?;
        let [ci, cj, ck] = self.cell_dims();
        let up = |x: usize, n: usize| (x + 1 < n).then_some(x + 1);
        out.extend([
            k.checked_sub(1).map(|kk| self.cell(i, j, kk)),
            up(k, ck).map(|kk| self.cell(i, j, kk)),
            j.checked_sub(1).map(|jj| self.cell(i, jj, k)),
            up(j, cj).map(|jj| self.cell(i, jj, k)),
            i.checked_sub(1).map(|ii| self.cell(ii, j, k)),
            up(i, ci).map(|ii| self.cell(ii, j, k)),
        ]);
        Ok(())
    }

    fn synchronize(&self, flags: SyncFlags) -> bool {
        log::trace!("LatticeMesh::synchronize({flags:?}): closed form");
        true
    }

    fn unsynchronize(&self, _flags: SyncFlags) -> bool {
        true
    }

    fn clear_synchronization(&self) -> bool {
        true
    }

    fn synchronized(&self) -> SyncFlags {
        SyncFlags::ALL
    }

    fn bounding_box(&self) -> Result<BoundingBox, MeshError> {
        Ok(BoundingBox {
            min: self.min,
            max: self.max,
        })
    }

    fn scale_factors(&self) -> Option<&ScaleFactorTable> {
        self.scale_factors.as_ref()
    }

    fn locate_candidates(
        &self,
        p: &Point,
        tol: f64,
        out: &mut Vec<ElemIndex>,
    ) -> Result<(), MeshError> {
        out.clear();
        let bbox = self.bounding_box()?;
        if !bbox.contains(p, tol) {
            return Ok(());
        }
        let span = |a: usize| self.cell_span(a, p[a] - tol, p[a] + tol);
        for (k, j, i) in iproduct!(span(2), span(1), span(0)) {
            out.push(self.cell(i, j, k));
        }
        Ok(())
    }

    fn closest_node(&self, p: &Point) -> Result<Option<(NodeIndex, f64)>, MeshError> {
        let h = self.spacing();
        let ijk = [0, 1, 2].map(|a| {
            let x = ((p[a] - self.min[a]) / h[a]).round().max(0.0) as usize;
            x.min(self.dims[a] - 1)
        });
        let n = self.node(ijk[0], ijk[1], ijk[2]);
        let q = self.get_point(n)?;
        let d = (0..3).map(|a| (q[a] - p[a]).powi(2)).sum::<f64>().sqrt();
        Ok(Some((n, d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshQueries, UnstructuredMesh};
    use crate::topology::index::{DElemIndex, Entity};
    use itertools::Itertools;

    fn lattice() -> LatticeMesh {
        LatticeMesh::new([3, 4, 2], [0.0; 3], [2.0, 3.0, 1.0]).unwrap()
    }

    #[test]
    fn counts() {
        let m = lattice();
        assert_eq!(m.num_nodes(), 24);
        assert_eq!(m.num_elems(), 6);
        // x: 2*4*2, y: 3*3*2, z: 3*4*1
        assert_eq!(m.num_edges().unwrap(), 16 + 18 + 12);
        // z: 2*3*2, x: 3*3*1, y: 2*4*1
        assert_eq!(m.num_faces().unwrap(), 12 + 9 + 8);
        assert_eq!(m.synchronized(), SyncFlags::ALL);
    }

    #[test]
    fn rejects_degenerate_boxes() {
        assert!(LatticeMesh::new([1, 2, 2], [0.0; 3], [1.0; 3]).is_err());
        assert!(LatticeMesh::new([2, 2, 2], [0.0; 3], [1.0, 0.0, 1.0]).is_err());
    }

    #[test]
    fn element_edges_and_faces_follow_unit_order() {
        let m = lattice();
        let unit = m.basis().unit();
        let (mut nodes, mut edges, mut faces, mut tmp) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for e in 0..m.num_elems() {
            let e = ElemIndex::new(e as u32);
            m.elem_nodes(e, &mut nodes).unwrap();
            m.elem_edges(e, &mut edges).unwrap();
            for (x, [a, b]) in edges.iter().zip(unit.edges) {
                m.edge_nodes(*x, &mut tmp).unwrap();
                assert_eq!(
                    tmp.iter().sorted().collect_vec(),
                    [nodes[*a], nodes[*b]].iter().sorted().collect_vec()
                );
            }
            m.elem_faces(e, &mut faces).unwrap();
            for (f, local) in faces.iter().zip(unit.faces) {
                m.face_nodes(*f, &mut tmp).unwrap();
                let want = local.iter().map(|&v| nodes[v]).sorted().collect_vec();
                assert_eq!(tmp.iter().copied().sorted().collect_vec(), want);
            }
        }
    }

    #[test]
    fn matches_unstructured_rendition() {
        let m = lattice();
        let points = (0..m.num_nodes())
            .map(|n| m.get_point(NodeIndex::new(n as u32)).unwrap())
            .collect();
        let mut elems = Vec::new();
        let mut nodes = Vec::new();
        for e in 0..m.num_elems() {
            m.elem_nodes(ElemIndex::new(e as u32), &mut nodes).unwrap();
            elems.extend_from_slice(&nodes);
        }
        let u = UnstructuredMesh::from_parts(m.basis(), points, elems).unwrap();
        assert_eq!(u.num_edges().unwrap(), m.num_edges().unwrap());
        assert_eq!(u.num_faces().unwrap(), m.num_faces().unwrap());
        let (mut a, mut b) = (Vec::new(), Vec::new());
        for e in 0..m.num_elems() {
            let e = ElemIndex::new(e as u32);
            m.get_neighbors(e, &mut a).unwrap();
            u.get_neighbors(e, &mut b).unwrap();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
        for n in 0..m.num_nodes() {
            let n = NodeIndex::new(n as u32);
            m.node_elems(n, &mut a).unwrap();
            u.node_elems(n, &mut b).unwrap();
            a.sort();
            b.sort();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn neighbors_by_face_slot() {
        let m = lattice();
        let e = ElemIndex::new(0);
        let mut faces = Vec::new();
        m.elem_faces(e, &mut faces).unwrap();
        // +x neighbor is cell (1, 0, 0)
        assert_eq!(
            m.get_neighbor(e, DElemIndex::new(faces[5].get())).unwrap(),
            Some(ElemIndex::new(1))
        );
        assert_eq!(m.get_neighbor(e, DElemIndex::new(faces[0].get())).unwrap(), None);
        assert!(m.is_boundary(DElemIndex::new(faces[0].get())).unwrap());
    }

    #[test]
    fn locate_and_closest_node() {
        let m = lattice();
        let mut out = Vec::new();
        m.locate_candidates(&[1.5, 0.5, 0.5], 0.0, &mut out).unwrap();
        assert_eq!(out, vec![ElemIndex::new(1)]);
        m.locate_candidates(&[5.0, 0.5, 0.5], 1e-9, &mut out).unwrap();
        assert!(out.is_empty());
        let (n, d) = m.closest_node(&[0.9, 2.2, 0.1]).unwrap().unwrap();
        assert_eq!(m.get_point(n).unwrap(), [1.0, 2.0, 0.0]);
        assert!((d - (0.01f64 + 0.04 + 0.01).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn hermite_lattice_carries_spacing() {
        let m = LatticeMesh::with_order(
            [3, 3, 3],
            [0.0; 3],
            [1.0, 2.0, 4.0],
            BasisOrder::CubicScaleFactors,
        )
        .unwrap();
        let sf = m.scale_factors().unwrap();
        assert_eq!(sf.row(ElemIndex::new(7)).unwrap(), &[0.5, 1.0, 2.0]);
        let mut edges = Vec::new();
        m.get_edges(Entity::Node(NodeIndex::new(13)), &mut edges).unwrap();
        assert_eq!(edges.len(), 6);
    }
}
