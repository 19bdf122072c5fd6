//! Concrete mesh storage and the contract the virtual mesh consumes.
//!
//! A concrete mesh answers a handful of primitive incidence questions
//! (element nodes, element edges and faces, node-to-element, neighbors
//! across each `DElem`). Every connectivity query of the virtual mesh is
//! derived from those primitives by [`MeshQueries`], so a new storage layout
//! only has to provide the primitives.
//!
//! Primitives that read a derived table synchronize it on demand; a query
//! never observes a missing table as an empty result.

pub mod lattice;
pub mod meshgen;
pub mod unstructured;

pub use lattice::LatticeMesh;
pub use unstructured::UnstructuredMesh;

use crate::basis::{Basis, BasisOrder, ScaleFactorTable};
use crate::geometry::Point;
use crate::mesh_error::MeshError;
use crate::topology::index::{
    CellIndex, DElemIndex, EdgeIndex, ElemIndex, Entity, EntityKind, FaceIndex, NodeIndex,
};
use crate::topology::sync::SyncFlags;
use crate::topology::tables::BoundingBox;

/// Primitive queries and synchronization of one concrete mesh.
pub trait ConcreteMesh: Send + Sync {
    fn basis(&self) -> Basis;

    fn basis_order(&self) -> BasisOrder {
        self.basis().order()
    }

    /// Topological dimension of the elements.
    fn dimensionality(&self) -> usize {
        self.basis().dimension()
    }

    fn is_editable(&self) -> bool;

    fn has_normals(&self) -> bool {
        false
    }

    fn num_nodes(&self) -> usize;
    fn num_elems(&self) -> usize;

    /// Unique edges. On a curve mesh these are the elements.
    fn num_edges(&self) -> Result<usize, MeshError>;

    /// Unique faces. On a surface mesh these are the elements.
    fn num_faces(&self) -> Result<usize, MeshError>;

    fn get_point(&self, node: NodeIndex) -> Result<Point, MeshError>;

    /// Vertex nodes of an element, in unit element order.
    fn elem_nodes(&self, elem: ElemIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError>;

    /// Elements incident to a node.
    fn node_elems(&self, node: NodeIndex, out: &mut Vec<ElemIndex>) -> Result<(), MeshError>;

    /// End nodes of an edge of a 2D or 3D mesh.
    fn edge_nodes(&self, edge: EdgeIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError>;

    /// Edges of an element of a 2D or 3D mesh, in unit edge order.
    fn elem_edges(&self, elem: ElemIndex, out: &mut Vec<EdgeIndex>) -> Result<(), MeshError>;

    /// Nodes of a face of a 3D mesh.
    fn face_nodes(&self, face: FaceIndex, out: &mut Vec<NodeIndex>) -> Result<(), MeshError>;

    /// Faces of an element of a 3D mesh, in unit face order.
    fn elem_faces(&self, elem: ElemIndex, out: &mut Vec<FaceIndex>) -> Result<(), MeshError>;

    /// Per `DElem` slot of `elem`, the element on the other side.
    fn elem_neighbors(
        &self,
        elem: ElemIndex,
        out: &mut Vec<Option<ElemIndex>>,
    ) -> Result<(), MeshError>;

    /// Build the tables named by `flags`. `false` when any of them cannot be
    /// built on this mesh; the supported ones are built regardless.
    fn synchronize(&self, flags: SyncFlags) -> bool;

    /// Discard the tables named by `flags` and those derived from them.
    fn unsynchronize(&self, flags: SyncFlags) -> bool;

    fn clear_synchronization(&self) -> bool;

    /// Flags whose tables are currently available.
    fn synchronized(&self) -> SyncFlags;

    fn bounding_box(&self) -> Result<BoundingBox, MeshError>;

    /// Per-element scale factors of a Hermite basis, if the mesh carries them.
    fn scale_factors(&self) -> Option<&ScaleFactorTable> {
        None
    }

    /// Elements that may contain `p` (a superset).
    fn locate_candidates(
        &self,
        p: &Point,
        tol: f64,
        out: &mut Vec<ElemIndex>,
    ) -> Result<(), MeshError>;

    /// Closest node to `p` and its distance.
    fn closest_node(&self, p: &Point) -> Result<Option<(NodeIndex, f64)>, MeshError>;
}

#[inline]
pub(crate) fn unsupported(query: &'static str, dimension: usize) -> MeshError {
    MeshError::Unsupported { query, dimension }
}

#[inline]
pub(crate) fn check_range(kind: EntityKind, index: usize, len: usize) -> Result<(), MeshError> {
    if index < len {
        Ok(())
    } else {
        Err(MeshError::IndexOutOfRange { kind, index, len })
    }
}

/// Run `fill` into a cleared buffer; leave it empty on error.
fn fill<T>(
    out: &mut Vec<T>,
    fill: impl FnOnce(&mut Vec<T>) -> Result<(), MeshError>,
) -> Result<(), MeshError> {
    out.clear();
    let res = fill(out);
    if res.is_err() {
        out.clear();
    }
    res
}

fn push_unique<T: PartialEq>(out: &mut Vec<T>, v: T) {
    if !out.contains(&v) {
        out.push(v);
    }
}

/// Connectivity queries derived from the [`ConcreteMesh`] primitives.
///
/// `of` may be any entity up to the mesh dimension; `Elem` and `DElem`
/// resolve to the dimension-typed kind of this mesh. On success `out` holds
/// exactly the relationship, on error it is empty.
pub trait MeshQueries: ConcreteMesh {
    fn get_nodes(&self, of: Entity, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        fill(out, |out| {
            let e = of.canonical(self.dimensionality())?;
            self.entity_nodes(e, out)
        })
    }

    fn get_edges(&self, of: Entity, out: &mut Vec<EdgeIndex>) -> Result<(), MeshError> {
        fill(out, |out| {
            let dim = self.dimensionality();
            if dim == 0 {
                return Err(unsupported("get_edges", dim));
            }
            match of.canonical(dim)? {
                Entity::Edge(x) => {
                    check_range(EntityKind::Edge, x.idx(), self.num_edges()?)?;
                    out.push(x);
                }
                Entity::Node(n) if dim == 1 => {
                    let mut elems = Vec::new();
                    self.node_elems(n, &mut elems)?;
                    out.extend(elems.iter().map(|e| EdgeIndex::new(e.get())));
                }
                Entity::Node(n) => {
                    let (mut elems, mut edges, mut nodes) = (Vec::new(), Vec::new(), Vec::new());
                    self.node_elems(n, &mut elems)?;
                    for &e in &elems {
                        self.elem_edges(e, &mut edges)?;
                        for &x in &edges {
                            self.edge_nodes(x, &mut nodes)?;
                            if nodes.contains(&n) {
                                push_unique(out, x);
                            }
                        }
                    }
                }
                Entity::Face(f) if dim == 2 => self.elem_edges(ElemIndex::new(f.get()), out)?,
                Entity::Face(f) => {
                    let mut fnodes = Vec::new();
                    self.face_nodes(f, &mut fnodes)?;
                    let mut cells = Vec::new();
                    self.elems_containing(&fnodes, &mut cells)?;
                    let Some(&cell) = cells.first() else {
                        return Ok(());
                    };
                    let (mut edges, mut enodes) = (Vec::new(), Vec::new());
                    self.elem_edges(cell, &mut edges)?;
                    for (i, &a) in fnodes.iter().enumerate() {
                        let b = fnodes[(i + 1) % fnodes.len()];
                        for &x in &edges {
                            self.edge_nodes(x, &mut enodes)?;
                            if enodes.contains(&a) && enodes.contains(&b) {
                                out.push(x);
                                break;
                            }
                        }
                    }
                }
                Entity::Cell(c) => self.elem_edges(ElemIndex::new(c.get()), out)?,
                _ => return Err(unsupported("get_edges", dim)),
            }
            Ok(())
        })
    }

    fn get_faces(&self, of: Entity, out: &mut Vec<FaceIndex>) -> Result<(), MeshError> {
        fill(out, |out| {
            let dim = self.dimensionality();
            if dim < 2 {
                return Err(unsupported("get_faces", dim));
            }
            match of.canonical(dim)? {
                Entity::Face(f) => {
                    check_range(EntityKind::Face, f.idx(), self.num_faces()?)?;
                    out.push(f);
                }
                Entity::Cell(c) => self.elem_faces(ElemIndex::new(c.get()), out)?,
                e if dim == 2 => {
                    let mut nodes = Vec::new();
                    self.entity_nodes(e, &mut nodes)?;
                    let mut elems = Vec::new();
                    self.elems_containing(&nodes, &mut elems)?;
                    out.extend(elems.iter().map(|e| FaceIndex::new(e.get())));
                }
                e => {
                    let (mut nodes, mut cells) = (Vec::new(), Vec::new());
                    self.entity_nodes(e, &mut nodes)?;
                    self.elems_containing(&nodes, &mut cells)?;
                    let (mut faces, mut fnodes) = (Vec::new(), Vec::new());
                    for &c in &cells {
                        self.elem_faces(c, &mut faces)?;
                        for &f in &faces {
                            self.face_nodes(f, &mut fnodes)?;
                            if nodes.iter().all(|n| fnodes.contains(n)) {
                                push_unique(out, f);
                            }
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn get_cells(&self, of: Entity, out: &mut Vec<CellIndex>) -> Result<(), MeshError> {
        let dim = self.dimensionality();
        if dim < 3 {
            out.clear();
            return Err(unsupported("get_cells", dim));
        }
        let mut elems = Vec::new();
        let res = self.get_elems(of, &mut elems);
        out.clear();
        out.extend(elems.iter().map(|e| CellIndex::new(e.get())));
        res
    }

    fn get_elems(&self, of: Entity, out: &mut Vec<ElemIndex>) -> Result<(), MeshError> {
        fill(out, |out| {
            let dim = self.dimensionality();
            let e = of.canonical(dim)?;
            if e.dimension() == Some(dim) {
                let elem = ElemIndex::new(e.idx() as u32);
                check_range(EntityKind::Elem, elem.idx(), self.num_elems())?;
                out.push(elem);
                return Ok(());
            }
            let mut nodes = Vec::new();
            self.entity_nodes(e, &mut nodes)?;
            self.elems_containing(&nodes, out)
        })
    }

    /// Boundary entities of `of`: faces in 3D, edges in 2D, nodes in 1D.
    fn get_delems(&self, of: Entity, out: &mut Vec<DElemIndex>) -> Result<(), MeshError> {
        let dim = self.dimensionality();
        let mut raw = Vec::new();
        let res = match dim {
            3 => {
                let mut v = Vec::new();
                let r = self.get_faces(of, &mut v);
                raw.extend(v.iter().map(|f| f.get()));
                r
            }
            2 => {
                let mut v = Vec::new();
                let r = self.get_edges(of, &mut v);
                raw.extend(v.iter().map(|x| x.get()));
                r
            }
            1 => {
                let mut v = Vec::new();
                let r = self.get_nodes(of, &mut v);
                raw.extend(v.iter().map(|n| n.get()));
                r
            }
            _ => Err(unsupported("get_delems", dim)),
        };
        out.clear();
        if res.is_ok() {
            out.extend(raw.into_iter().map(DElemIndex::new));
        }
        res
    }

    /// Element across `delem` from `elem`; `None` on the boundary.
    fn get_neighbor(
        &self,
        elem: ElemIndex,
        delem: DElemIndex,
    ) -> Result<Option<ElemIndex>, MeshError> {
        let mut delems = Vec::new();
        self.get_delems(Entity::Elem(elem), &mut delems)?;
        let slot = delems
            .iter()
            .position(|&d| d == delem)
            .ok_or(MeshError::NotIncident {
                elem: elem.idx(),
                delem: delem.idx(),
            })?;
        let mut nbrs = Vec::new();
        self.elem_neighbors(elem, &mut nbrs)?;
        Ok(nbrs.get(slot).copied().flatten())
    }

    /// Distinct elements sharing a `DElem` with `elem`.
    fn get_neighbors(&self, elem: ElemIndex, out: &mut Vec<ElemIndex>) -> Result<(), MeshError> {
        fill(out, |out| {
            let mut nbrs = Vec::new();
            self.elem_neighbors(elem, &mut nbrs)?;
            for n in nbrs.into_iter().flatten() {
                push_unique(out, n);
            }
            Ok(())
        })
    }

    /// Nodes joined to `node` by an edge.
    fn get_node_neighbors(
        &self,
        node: NodeIndex,
        out: &mut Vec<NodeIndex>,
    ) -> Result<(), MeshError> {
        fill(out, |out| {
            let mut edges = Vec::new();
            self.get_edges(Entity::Node(node), &mut edges)?;
            let mut ends = Vec::new();
            for &x in &edges {
                self.entity_nodes(Entity::Edge(x), &mut ends)?;
                for &m in &ends {
                    if m != node {
                        push_unique(out, m);
                    }
                }
            }
            Ok(())
        })
    }

    /// A `DElem` is on the boundary when a single element holds it.
    fn is_boundary(&self, delem: DElemIndex) -> Result<bool, MeshError> {
        let mut elems = Vec::new();
        self.get_elems(Entity::DElem(delem), &mut elems)?;
        Ok(elems.len() < 2)
    }

    /// Edge spanned by exactly `nodes`, in any order.
    fn get_edge(&self, nodes: &[NodeIndex]) -> Result<Option<EdgeIndex>, MeshError> {
        let Some(&first) = nodes.first() else {
            return Ok(None);
        };
        let mut edges = Vec::new();
        self.get_edges(Entity::Node(first), &mut edges)?;
        let candidates: Vec<_> = edges.into_iter().map(Entity::Edge).collect();
        self.find_by_nodes(&candidates, nodes)
            .map(|e| e.map(|e| EdgeIndex::new(e.idx() as u32)))
    }

    /// Face spanned by exactly `nodes`, in any order.
    fn get_face(&self, nodes: &[NodeIndex]) -> Result<Option<FaceIndex>, MeshError> {
        let Some(&first) = nodes.first() else {
            return Ok(None);
        };
        let mut faces = Vec::new();
        self.get_faces(Entity::Node(first), &mut faces)?;
        let candidates: Vec<_> = faces.into_iter().map(Entity::Face).collect();
        self.find_by_nodes(&candidates, nodes)
            .map(|e| e.map(|e| FaceIndex::new(e.idx() as u32)))
    }

    /// Element whose vertices are exactly `nodes`, in any order.
    fn get_elem(&self, nodes: &[NodeIndex]) -> Result<Option<ElemIndex>, MeshError> {
        let Some(&first) = nodes.first() else {
            return Ok(None);
        };
        let mut elems = Vec::new();
        self.get_elems(Entity::Node(first), &mut elems)?;
        let candidates: Vec<_> = elems.into_iter().map(Entity::Elem).collect();
        self.find_by_nodes(&candidates, nodes)
            .map(|e| e.map(|e| ElemIndex::new(e.idx() as u32)))
    }

    fn get_cell(&self, nodes: &[NodeIndex]) -> Result<Option<CellIndex>, MeshError> {
        match self.dimensionality() {
            3 => Ok(self.get_elem(nodes)?.map(|e| CellIndex::new(e.get()))),
            d => Err(unsupported("get_cell", d)),
        }
    }

    /// `DElem` spanned by exactly `nodes`.
    fn get_delem(&self, nodes: &[NodeIndex]) -> Result<Option<DElemIndex>, MeshError> {
        let raw = match self.dimensionality() {
            3 => self.get_face(nodes)?.map(FaceIndex::get),
            2 => self.get_edge(nodes)?.map(EdgeIndex::get),
            1 => match nodes {
                [n] => {
                    check_range(EntityKind::Node, n.idx(), self.num_nodes())?;
                    Some(n.get())
                }
                _ => None,
            },
            d => return Err(unsupported("get_delem", d)),
        };
        Ok(raw.map(DElemIndex::new))
    }

    /// First of `candidates` whose node set equals `nodes`.
    #[doc(hidden)]
    fn find_by_nodes(
        &self,
        candidates: &[Entity],
        nodes: &[NodeIndex],
    ) -> Result<Option<Entity>, MeshError> {
        let mut have = Vec::new();
        for &c in candidates {
            self.entity_nodes(c, &mut have)?;
            if have.len() == nodes.len() && nodes.iter().all(|n| have.contains(n)) {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    /// Nodes of a dimension-typed entity.
    #[doc(hidden)]
    fn entity_nodes(&self, e: Entity, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        out.clear();
        let dim = self.dimensionality();
        match e {
            Entity::Node(n) => {
                check_range(EntityKind::Node, n.idx(), self.num_nodes())?;
                out.push(n);
                Ok(())
            }
            Entity::Edge(x) if dim == 1 => self.elem_nodes(ElemIndex::new(x.get()), out),
            Entity::Edge(x) => self.edge_nodes(x, out),
            Entity::Face(f) if dim == 2 => self.elem_nodes(ElemIndex::new(f.get()), out),
            Entity::Face(f) => self.face_nodes(f, out),
            Entity::Cell(c) => self.elem_nodes(ElemIndex::new(c.get()), out),
            Entity::Elem(_) | Entity::DElem(_) => self.entity_nodes(e.canonical(dim)?, out),
        }
    }

    /// Elements whose vertices include every node of `nodes`.
    #[doc(hidden)]
    fn elems_containing(
        &self,
        nodes: &[NodeIndex],
        out: &mut Vec<ElemIndex>,
    ) -> Result<(), MeshError> {
        out.clear();
        let Some(&first) = nodes.first() else {
            return Ok(());
        };
        let mut around = Vec::new();
        self.node_elems(first, &mut around)?;
        let mut enodes = Vec::new();
        for &e in &around {
            self.elem_nodes(e, &mut enodes)?;
            if nodes[1..].iter().all(|n| enodes.contains(n)) {
                out.push(e);
            }
        }
        Ok(())
    }
}

impl<M: ConcreteMesh + ?Sized> MeshQueries for M {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_clears_on_error() {
        let mut out = vec![1, 2, 3];
        let res = fill(&mut out, |o| {
            o.push(4);
            Err(MeshError::NotEditable)
        });
        assert!(res.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn range_check() {
        assert!(check_range(EntityKind::Node, 2, 3).is_ok());
        assert_eq!(
            check_range(EntityKind::Face, 3, 3),
            Err(MeshError::IndexOutOfRange {
                kind: EntityKind::Face,
                index: 3,
                len: 3
            })
        );
    }
}
