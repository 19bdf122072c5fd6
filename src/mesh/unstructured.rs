//! Index-based unstructured mesh for every element family.
//!
//! Primary data is a node position array and a flat element-to-node array
//! (`number_of_vertices` entries per element). Everything else lives in a
//! [`SyncTables`] behind a lock and is built on demand.
//!
//! On a point cloud the elements are the nodes themselves: element `i` is
//! node `i` and is created together with it.

use crate::basis::{Basis, ScaleFactorTable};
use crate::config::SyncOptions;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::Point;
use crate::mesh::{ConcreteMesh, check_range, unsupported};
use crate::mesh_error::MeshError;
use crate::topology::cache::InvalidateCache;
use crate::topology::index::{EdgeIndex, ElemIndex, EntityKind, FaceIndex, NodeIndex};
use crate::topology::sync::{SyncFlags, SyncTables};
use crate::topology::tables::{
    BoundingBox, Connectivity, DElemSource, EdgeTable, ElemLocateTable, ElemNeighborTable,
    FaceTable, NodeLocateTable, NodeNeighborTable, validate_tables,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard};

#[derive(Debug)]
pub struct UnstructuredMesh {
    basis: Basis,
    points: Vec<Point>,
    elems: Vec<NodeIndex>,
    editable: bool,
    scale_factors: Option<ScaleFactorTable>,
    options: SyncOptions,
    tables: RwLock<SyncTables>,
}

impl UnstructuredMesh {
    /// Empty, editable mesh.
    pub fn new(basis: Basis) -> Self {
        UnstructuredMesh {
            basis,
            points: Vec::new(),
            elems: Vec::new(),
            editable: true,
            scale_factors: None,
            options: SyncOptions::default(),
            tables: RwLock::new(SyncTables::default()),
        }
    }

    /// Build from node positions and flat element connectivity.
    ///
    /// For a point cloud `elems` must be empty; elements are implied.
    pub fn from_parts(
        basis: Basis,
        points: Vec<Point>,
        elems: Vec<NodeIndex>,
    ) -> Result<Self, MeshError> {
        NodeIndex::try_from_usize(points.len())?;
        let nv = basis.unit().number_of_vertices();
        let elems = if basis.dimension() == 0 {
            if !elems.is_empty() {
                return Err(MeshError::InvalidGeometry(
                    "point cloud elements are implied by its nodes".into(),
                ));
            }
            (0..points.len()).map(NodeIndex::from_usize).collect()
        } else {
            if elems.len() % nv != 0 {
                return Err(MeshError::ElementArity {
                    elem: elems.len() / nv,
                    expected: nv,
                    found: elems.len() % nv,
                });
            }
            ElemIndex::try_from_usize(elems.len() / nv)?;
            if let Some(bad) = elems.iter().find(|n| n.idx() >= points.len()) {
                return Err(MeshError::IndexOutOfRange {
                    kind: EntityKind::Node,
                    index: bad.idx(),
                    len: points.len(),
                });
            }
            elems
        };
        let mesh = UnstructuredMesh {
            points,
            elems,
            ..UnstructuredMesh::new(basis)
        };
        mesh.debug_assert_invariants();
        Ok(mesh)
    }

    pub fn with_sync_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self.invalidate_cache();
        self
    }

    pub fn sync_options(&self) -> SyncOptions {
        self.options
    }

    /// Attach per-element scale factors; rows must match the parametric
    /// dimension.
    pub fn set_scale_factors(&mut self, table: ScaleFactorTable) -> Result<(), MeshError> {
        self.check_editable()?;
        if table.dimension() != self.basis.dimension() {
            return Err(MeshError::ScaleFactorArity {
                expected: self.basis.dimension(),
                found: table.dimension(),
            });
        }
        self.scale_factors = Some(table);
        self.invalidate_cache();
        Ok(())
    }

    /// Make the mesh read-only.
    pub fn freeze(&mut self) {
        self.editable = false;
    }

    fn check_editable(&self) -> Result<(), MeshError> {
        if self.editable {
            Ok(())
        } else {
            Err(MeshError::NotEditable)
        }
    }

    pub fn add_node(&mut self, p: Point) -> Result<NodeIndex, MeshError> {
        self.check_editable()?;
        let n = NodeIndex::try_from_usize(self.points.len())?;
        self.points.push(p);
        if self.basis.dimension() == 0 {
            self.elems.push(n);
        }
        self.invalidate_cache();
        Ok(n)
    }

    pub fn add_elem(&mut self, nodes: &[NodeIndex]) -> Result<ElemIndex, MeshError> {
        self.check_editable()?;
        let dim = self.basis.dimension();
        if dim == 0 {
            return Err(unsupported("add_elem", dim));
        }
        let nv = self.basis.unit().number_of_vertices();
        let e = ElemIndex::try_from_usize(self.num_elems())?;
        if nodes.len() != nv {
            return Err(MeshError::ElementArity {
                elem: e.idx(),
                expected: nv,
                found: nodes.len(),
            });
        }
        for n in nodes {
            check_range(EntityKind::Node, n.idx(), self.points.len())?;
        }
        self.elems.extend_from_slice(nodes);
        self.invalidate_cache();
        Ok(e)
    }

    pub fn set_point(&mut self, node: NodeIndex, p: Point) -> Result<(), MeshError> {
        self.check_editable()?;
        check_range(EntityKind::Node, node.idx(), self.points.len())?;
        self.points[node.idx()] = p;
        self.invalidate_cache();
        Ok(())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Element connectivity as raw node numbers.
    pub fn connectivity_raw(&self) -> &[u32] {
        bytemuck::cast_slice(&self.elems)
    }

    /// Copy of the derived tables currently held.
    pub fn tables_snapshot(&self) -> SyncTables {
        self.tables.read().clone()
    }

    fn connectivity(&self) -> Connectivity<'_> {
        Connectivity {
            unit: self.basis.unit(),
            num_nodes: self.points.len(),
            elems: &self.elems,
        }
    }

    /// Read access to the tables with `flag` present, synchronizing it first
    /// if needed.
    fn tables_with(
        &self,
        flag: SyncFlags,
        name: &'static str,
    ) -> Result<RwLockReadGuard<'_, SyncTables>, MeshError> {
        {
            let t = self.tables.read();
            if t.flags().contains(flag) {
                return Ok(t);
            }
        }
        if !self.synchronize(flag) {
            return Err(MeshError::NotSynchronized(name));
        }
        let t = self.tables.read();
        if t.flags().contains(flag) {
            Ok(t)
        } else {
            Err(MeshError::NotSynchronized(name))
        }
    }

    fn check_elem(&self, elem: ElemIndex) -> Result<(), MeshError> {
        check_range(EntityKind::Elem, elem.idx(), self.num_elems())
    }

    fn build(&self, tables: &mut SyncTables, missing: SyncFlags) -> bool {
        let conn = self.connectivity();
        let dim = self.basis.dimension();
        let mut ok = true;
        if missing.contains(SyncFlags::NODE_NEIGHBORS) {
            tables.node_neighbors = Some(NodeNeighborTable::build(&conn));
            log::debug!("synchronize: built NODE_NEIGHBORS for {} nodes", conn.num_nodes);
        }
        if missing.contains(SyncFlags::EDGES) {
            let t = EdgeTable::build(&conn);
            log::debug!("synchronize: built EDGES ({} edges)", t.len());
            tables.edges = Some(t);
        }
        if missing.contains(SyncFlags::FACES) {
            match FaceTable::build(&conn, self.options.non_manifold) {
                Ok(t) => {
                    log::debug!("synchronize: built FACES ({} faces)", t.len());
                    tables.faces = Some(t);
                }
                Err(e) => {
                    log::warn!("synchronize: FACES not built: {e}");
                    ok = false;
                }
            }
        }
        if missing.contains(SyncFlags::ELEM_NEIGHBORS) {
            let source = match dim {
                3 => tables.faces.as_ref().map(DElemSource::Faces),
                2 => tables.edges.as_ref().map(DElemSource::Edges),
                1 => tables.node_neighbors.as_ref().map(DElemSource::Nodes),
                _ => None,
            };
            match source.map(|s| ElemNeighborTable::build(&conn, s)) {
                Some(t) => {
                    log::debug!("synchronize: built ELEM_NEIGHBORS for {} elems", conn.num_elems());
                    tables.elem_neighbors = Some(t);
                }
                None => ok = false,
            }
        }
        if missing.contains(SyncFlags::BOUNDING_BOX) {
            tables.bounding_box = Some(BoundingBox::from_points(&self.points));
            log::debug!("synchronize: built BOUNDING_BOX");
        }
        if missing.contains(SyncFlags::NODE_LOCATE) {
            tables.node_locate = Some(NodeLocateTable::build(&self.points));
            log::debug!("synchronize: built NODE_LOCATE");
        }
        if missing.contains(SyncFlags::ELEM_LOCATE) {
            tables.elem_locate = Some(ElemLocateTable::build(&conn, &self.points));
            log::debug!("synchronize: built ELEM_LOCATE");
        }
        ok
    }
}

impl InvalidateCache for UnstructuredMesh {
    fn invalidate_cache(&mut self) {
        let tables = self.tables.get_mut();
        if !tables.flags().is_empty() {
            log::debug!("invalidate_cache: dropping {:?}", tables.flags());
        }
        tables.clear();
    }
}

impl DebugInvariants for UnstructuredMesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "UnstructuredMesh");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        let conn = self.connectivity();
        if let Some(bad) = self.elems.iter().find(|n| n.idx() >= self.points.len()) {
            return Err(MeshError::IndexOutOfRange {
                kind: EntityKind::Node,
                index: bad.idx(),
                len: self.points.len(),
            });
        }
        validate_tables(&conn, &self.tables.read())
    }
}

impl ConcreteMesh for UnstructuredMesh {
    fn basis(&self) -> Basis {
        self.basis
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn num_nodes(&self) -> usize {
        self.points.len()
    }

    fn num_elems(&self) -> usize {
        self.connectivity().num_elems()
    }

    fn num_edges(&self) -> Result<usize, MeshError> {
        match self.basis.dimension() {
            0 => Err(unsupported("num_edges", 0)),
            1 => Ok(self.num_elems()),
            _ => {
                let t = self.tables_with(SyncFlags::EDGES, "EDGES")?;
                Ok(t.edges.as_ref().map_or(0, EdgeTable::len))
            }
        }
    }

    fn num_faces(&self) -> Result<usize, MeshError> {
        match self.basis.dimension() {
            d @ (0 | 1) => Err(unsupported("num_faces", d)),
            2 => Ok(self.num_elems()),
            _ => {
                let t = self.tables_with(SyncFlags::FACES, "FACES")?;
                Ok(t.faces.as_ref().map_or(0, FaceTable::len))
            }
        }
    }

    fn get_point(&self, node: NodeIndex) -> Result<Point, MeshError> {
        check_range(EntityKind::Node, node.idx(), self.points.len())?;
        Ok(self.points[node.idx()])
    }

    fn elem_nodes(&self, elem: ElemIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        out.clear();
        self.check_elem(elem)?;
        out.extend_from_slice(self.connectivity().elem_nodes(elem.idx()));
        Ok(())
    }

    fn node_elems(&self, node: NodeIndex, out: &mut Vec<ElemIndex>) -> Result<(), MeshError> {
        out.clear();
        check_range(EntityKind::Node, node.idx(), self.points.len())?;
        let t = self.tables_with(SyncFlags::NODE_NEIGHBORS, "NODE_NEIGHBORS")?;
        if let Some(nn) = &t.node_neighbors {
            out.extend_from_slice(nn.elems(node));
        }
        Ok(())
    }

    fn edge_nodes(&self, edge: EdgeIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        out.clear();
        let dim = self.basis.dimension();
        if dim < 2 {
            return Err(unsupported("edge_nodes", dim));
        }
        let t = self.tables_with(SyncFlags::EDGES, "EDGES")?;
        let edges = t.edges.as_ref().ok_or(MeshError::NotSynchronized("EDGES"))?;
        check_range(EntityKind::Edge, edge.idx(), edges.len())?;
        out.extend_from_slice(&edges.nodes[edge.idx()]);
        Ok(())
    }

    fn elem_edges(&self, elem: ElemIndex, out: &mut Vec<EdgeIndex>) -> Result<(), MeshError> {
        out.clear();
        let dim = self.basis.dimension();
        if dim < 2 {
            return Err(unsupported("elem_edges", dim));
        }
        self.check_elem(elem)?;
        let t = self.tables_with(SyncFlags::EDGES, "EDGES")?;
        let edges = t.edges.as_ref().ok_or(MeshError::NotSynchronized("EDGES"))?;
        out.extend_from_slice(edges.elem_edges(elem.idx()));
        Ok(())
    }

    fn face_nodes(&self, face: FaceIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        out.clear();
        let dim = self.basis.dimension();
        if dim < 3 {
            return Err(unsupported("face_nodes", dim));
        }
        let t = self.tables_with(SyncFlags::FACES, "FACES")?;
        let faces = t.faces.as_ref().ok_or(MeshError::NotSynchronized("FACES"))?;
        check_range(EntityKind::Face, face.idx(), faces.len())?;
        out.extend_from_slice(faces.face_nodes(face));
        Ok(())
    }

    fn elem_faces(&self, elem: ElemIndex, out: &mut Vec<FaceIndex>) -> Result<(), MeshError> {
        out.clear();
        let dim = self.basis.dimension();
        if dim < 3 {
            return Err(unsupported("elem_faces", dim));
        }
        self.check_elem(elem)?;
        let t = self.tables_with(SyncFlags::FACES, "FACES")?;
        let faces = t.faces.as_ref().ok_or(MeshError::NotSynchronized("FACES"))?;
        out.extend_from_slice(faces.elem_faces(elem.idx()));
        Ok(())
    }

    fn elem_neighbors(
        &self,
        elem: ElemIndex,
        out: &mut Vec<Option<ElemIndex>>,
    ) -> Result<(), MeshError> {
        out.clear();
        let dim = self.basis.dimension();
        if dim == 0 {
            return Err(unsupported("elem_neighbors", dim));
        }
        self.check_elem(elem)?;
        let t = self.tables_with(SyncFlags::ELEM_NEIGHBORS, "ELEM_NEIGHBORS")?;
        let nb = t
            .elem_neighbors
            .as_ref()
            .ok_or(MeshError::NotSynchronized("ELEM_NEIGHBORS"))?;
        out.extend_from_slice(nb.neighbors(elem.idx()));
        Ok(())
    }

    fn synchronize(&self, flags: SyncFlags) -> bool {
        let dim = self.basis.dimension();
        let want = flags.expand(dim);
        let supported = SyncFlags::supported(dim);
        let rejected = want - supported;
        if !rejected.is_empty() {
            log::debug!("synchronize: {rejected:?} unsupported on a {dim}D mesh");
        }
        let todo = (want & supported) - SyncFlags::native(dim) - SyncFlags::DELEMS;

        let guard = self.tables.upgradable_read();
        let missing = todo - guard.flags();
        if missing.is_empty() {
            log::trace!("synchronize: {todo:?} already present");
            return rejected.is_empty();
        }
        let mut tables = RwLockUpgradableReadGuard::upgrade(guard);
        let ok = self.build(&mut tables, missing);
        crate::debug_invariants!(
            validate_tables(&self.connectivity(), &tables),
            "UnstructuredMesh::synchronize"
        );
        ok && rejected.is_empty()
    }

    fn unsynchronize(&self, flags: SyncFlags) -> bool {
        let dim = self.basis.dimension();
        let mut tables = self.tables.write();
        let before = tables.flags();
        tables.discard(flags, dim);
        let dropped = before - tables.flags();
        if !dropped.is_empty() {
            log::debug!("unsynchronize: dropped {dropped:?}");
        }
        true
    }

    fn clear_synchronization(&self) -> bool {
        let mut tables = self.tables.write();
        if !tables.flags().is_empty() {
            log::debug!("clear_synchronization: dropping {:?}", tables.flags());
        }
        tables.clear();
        true
    }

    fn synchronized(&self) -> SyncFlags {
        let dim = self.basis.dimension();
        (self.tables.read().flags() | SyncFlags::native(dim)).reported(dim)
    }

    fn bounding_box(&self) -> Result<BoundingBox, MeshError> {
        let t = self.tables_with(SyncFlags::BOUNDING_BOX, "BOUNDING_BOX")?;
        t.bounding_box.ok_or(MeshError::NotSynchronized("BOUNDING_BOX"))
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
        let t = self.tables_with(SyncFlags::ELEM_LOCATE, "ELEM_LOCATE")?;
        if let Some(locate) = &t.elem_locate {
            out.extend(locate.candidates(p, tol));
        }
        Ok(())
    }

    fn closest_node(&self, p: &Point) -> Result<Option<(NodeIndex, f64)>, MeshError> {
        let t = self.tables_with(SyncFlags::NODE_LOCATE, "NODE_LOCATE")?;
        Ok(t.node_locate
            .as_ref()
            .and_then(|l| l.closest(p, &self.points))
            .map(|(n, d2)| (n, d2.sqrt())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::BasisOrder;
    use crate::config::NonManifoldHandling;
    use crate::mesh::MeshQueries;
    use crate::topology::element::ElementFamily;
    use crate::topology::index::{DElemIndex, Entity};

    fn n(i: u32) -> NodeIndex {
        NodeIndex::new(i)
    }

    /// Two tets sharing the face (1, 2, 3).
    fn two_tets() -> UnstructuredMesh {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ];
        let elems = vec![n(0), n(1), n(2), n(3), n(4), n(2), n(1), n(3)];
        UnstructuredMesh::from_parts(Basis::linear(ElementFamily::Tet), points, elems).unwrap()
    }

    #[test]
    fn from_parts_rejects_bad_connectivity() {
        let b = Basis::linear(ElementFamily::Triangle);
        let pts = vec![[0.0; 3]; 3];
        assert!(matches!(
            UnstructuredMesh::from_parts(b, pts.clone(), vec![n(0), n(1)]),
            Err(MeshError::ElementArity { expected: 3, found: 2, .. })
        ));
        assert!(matches!(
            UnstructuredMesh::from_parts(b, pts, vec![n(0), n(1), n(7)]),
            Err(MeshError::IndexOutOfRange { index: 7, .. })
        ));
    }

    #[test]
    fn synchronize_builds_dependencies() {
        let m = two_tets();
        assert_eq!(m.synchronized(), SyncFlags::NONE);
        assert!(m.synchronize(SyncFlags::ELEM_NEIGHBORS));
        let s = m.synchronized();
        assert!(s.contains(SyncFlags::ELEM_NEIGHBORS | SyncFlags::FACES | SyncFlags::DELEMS));
        assert!(!s.contains(SyncFlags::EDGES));
    }

    #[test]
    fn neighbor_across_shared_face() {
        let m = two_tets();
        let mut faces = Vec::new();
        m.get_faces(Entity::Cell(crate::topology::index::CellIndex::new(0)), &mut faces)
            .unwrap();
        let shared = faces[0];
        let nb = m
            .get_neighbor(ElemIndex::new(0), DElemIndex::new(shared.get()))
            .unwrap();
        assert_eq!(nb, Some(ElemIndex::new(1)));
        assert!(!m.is_boundary(DElemIndex::new(shared.get())).unwrap());
        assert_eq!(
            m.get_neighbor(ElemIndex::new(0), DElemIndex::new(faces[1].get())).unwrap(),
            None
        );
    }

    #[test]
    fn accessors_synchronize_on_demand() {
        let m = two_tets();
        assert_eq!(m.num_faces().unwrap(), 7);
        assert_eq!(m.num_edges().unwrap(), 9);
        assert!(m.synchronized().contains(SyncFlags::FACES | SyncFlags::EDGES));
    }

    #[test]
    fn unsynchronize_cascades() {
        let m = two_tets();
        assert!(m.synchronize(SyncFlags::ELEM_NEIGHBORS | SyncFlags::ELEM_LOCATE));
        assert!(m.unsynchronize(SyncFlags::FACES | SyncFlags::BOUNDING_BOX));
        assert_eq!(m.synchronized(), SyncFlags::NONE);
    }

    #[test]
    fn unsupported_flags_still_build_the_rest() {
        let b = Basis::linear(ElementFamily::Curve);
        let m = UnstructuredMesh::from_parts(
            b,
            vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![n(0), n(1), n(1), n(2)],
        )
        .unwrap();
        assert!(!m.synchronize(SyncFlags::FACES | SyncFlags::ELEM_NEIGHBORS));
        let s = m.synchronized();
        assert!(s.contains(SyncFlags::ELEM_NEIGHBORS | SyncFlags::EDGES));
        assert!(!s.contains(SyncFlags::FACES));
        assert_eq!(
            m.get_neighbor(ElemIndex::new(0), DElemIndex::new(1)).unwrap(),
            Some(ElemIndex::new(1))
        );
    }

    #[test]
    fn non_manifold_error_fails_face_build() {
        let points = vec![[0.0; 3]; 6];
        let tri = [n(0), n(1), n(2)];
        let mut elems = Vec::new();
        for apex in 3..6 {
            elems.extend_from_slice(&tri);
            elems.push(n(apex));
        }
        let m = UnstructuredMesh::from_parts(Basis::linear(ElementFamily::Tet), points, elems)
            .unwrap()
            .with_sync_options(SyncOptions {
                non_manifold: NonManifoldHandling::Error,
            });
        assert!(!m.synchronize(SyncFlags::FACES));
        assert!(matches!(m.num_faces(), Err(MeshError::NotSynchronized("FACES"))));
    }

    #[test]
    fn mutation_invalidates_tables() {
        let mut m = two_tets();
        assert!(m.synchronize(SyncFlags::ALL));
        let n5 = m.add_node([2.0, 2.0, 2.0]).unwrap();
        assert_eq!(m.synchronized(), SyncFlags::NONE);
        m.add_elem(&[n(1), n(2), n(3), n5]).unwrap();
        assert_eq!(m.num_elems(), 3);
        m.freeze();
        assert_eq!(m.add_node([0.0; 3]), Err(MeshError::NotEditable));
    }

    #[test]
    fn frozen_mesh_rejects_scale_factors() {
        let b = Basis::new(ElementFamily::Quad, BasisOrder::CubicScaleFactors).unwrap();
        let mut m = UnstructuredMesh::new(b);
        m.set_scale_factors(ScaleFactorTable::new(2)).unwrap();
        m.freeze();
        assert_eq!(
            m.set_scale_factors(ScaleFactorTable::new(2)),
            Err(MeshError::NotEditable)
        );
    }

    #[test]
    fn scale_factor_edit_drops_tables() {
        let b = Basis::new(ElementFamily::Hex, BasisOrder::CubicScaleFactors).unwrap();
        let mut m = UnstructuredMesh::new(b);
        assert!(m.synchronize(SyncFlags::BOUNDING_BOX));
        assert!(!m.synchronized().is_empty());
        m.set_scale_factors(ScaleFactorTable::new(3)).unwrap();
        assert_eq!(m.synchronized(), SyncFlags::NONE);
    }

    #[test]
    fn point_cloud_elements_are_nodes() {
        let mut m = UnstructuredMesh::new(Basis::linear(ElementFamily::Point));
        m.add_node([0.0; 3]).unwrap();
        m.add_node([1.0, 0.0, 0.0]).unwrap();
        assert_eq!(m.num_elems(), 2);
        assert!(!m.synchronize(SyncFlags::EDGES));
        assert!(m.synchronize(SyncFlags::NODE_LOCATE));
        let (closest, d) = m.closest_node(&[0.9, 0.0, 0.0]).unwrap().unwrap();
        assert_eq!(closest, n(1));
        assert!((d - 0.1).abs() < 1e-12);
        assert!(m.num_edges().is_err());
    }

    #[test]
    fn scale_factor_rows_match_dimension() {
        let b = Basis::new(ElementFamily::Quad, BasisOrder::CubicScaleFactors).unwrap();
        let mut m = UnstructuredMesh::new(b);
        assert!(m.set_scale_factors(ScaleFactorTable::new(3)).is_err());
        assert!(m.set_scale_factors(ScaleFactorTable::new(2)).is_ok());
        assert!(m.scale_factors().is_some());
    }

    #[test]
    fn raw_connectivity_view() {
        let m = two_tets();
        assert_eq!(&m.connectivity_raw()[..4], &[0, 1, 2, 3]);
        assert!(m.validate_invariants().is_ok());
    }
}
