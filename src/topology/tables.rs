//! Builders for the derived connectivity tables.
//
// All tables are computed from the flat element-to-node array and the unit
// element template of the mesh family:
//
// * edges: every unit edge of every element is hashed by its sorted node pair;
//   first occurrence assigns the edge index.
// * faces: same with the sorted node list of each unit face; each face records
//   up to two incident elements, a missing second one marks a boundary face.
// * node neighbors: CSR node -> incident elements.
// * element neighbors: per element and `DElem` slot, the element across it.
//
// Index assignment follows element order, so two builds over the same
// connectivity produce identical tables.

use crate::basis::unit_element::UnitElement;
use crate::config::NonManifoldHandling;
use crate::geometry::Point;
use crate::mesh_error::MeshError;
use crate::topology::index::{EdgeIndex, ElemIndex, EntityKind, FaceIndex, NodeIndex};
use hashbrown::HashMap;

/// Borrowed view of a mesh's primary connectivity.
#[derive(Clone, Copy, Debug)]
pub struct Connectivity<'a> {
    pub unit: &'static UnitElement,
    pub num_nodes: usize,
    /// Flat element-to-node array, `unit.vertices.len()` entries per element.
    pub elems: &'a [NodeIndex],
}

impl<'a> Connectivity<'a> {
    #[inline]
    pub fn nodes_per_elem(&self) -> usize {
        self.unit.vertices.len()
    }

    #[inline]
    pub fn num_elems(&self) -> usize {
        match self.nodes_per_elem() {
            0 => 0,
            n => self.elems.len() / n,
        }
    }

    #[inline]
    pub fn elem_nodes(&self, elem: usize) -> &'a [NodeIndex] {
        let n = self.nodes_per_elem();
        &self.elems[elem * n..(elem + 1) * n]
    }
}

/// Compressed sparse rows: `values[offsets[i]..offsets[i + 1]]` is row `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Csr<T> {
    pub offsets: Vec<usize>,
    pub values: Vec<T>,
}

impl<T> Default for Csr<T> {
    fn default() -> Self {
        Csr {
            offsets: vec![0],
            values: Vec::new(),
        }
    }
}

impl<T: Copy + Default> Csr<T> {
    /// Build from `(row, value)` pairs; values keep their input order within
    /// each row.
    pub fn from_pairs(rows: usize, pairs: &[(usize, T)]) -> Self {
        let mut offsets = vec![0usize; rows + 1];
        for &(r, _) in pairs {
            offsets[r + 1] += 1;
        }
        for i in 0..rows {
            offsets[i + 1] += offsets[i];
        }
        let mut cursor = offsets.clone();
        let mut values = vec![T::default(); pairs.len()];
        for &(r, v) in pairs {
            values[cursor[r]] = v;
            cursor[r] += 1;
        }
        Csr { offsets, values }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.values[self.offsets[i]..self.offsets[i + 1]]
    }
}

/// Node -> incident elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeNeighborTable {
    pub node_elems: Csr<ElemIndex>,
}

impl NodeNeighborTable {
    pub fn build(conn: &Connectivity<'_>) -> Self {
        let mut pairs = Vec::with_capacity(conn.elems.len());
        for e in 0..conn.num_elems() {
            for &n in conn.elem_nodes(e) {
                pairs.push((n.idx(), ElemIndex::from_usize(e)));
            }
        }
        NodeNeighborTable {
            node_elems: Csr::from_pairs(conn.num_nodes, &pairs),
        }
    }

    #[inline]
    pub fn elems(&self, node: NodeIndex) -> &[ElemIndex] {
        self.node_elems.row(node.idx())
    }
}

/// Unique edges of a 2D or 3D mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeTable {
    /// End nodes in the orientation of the first element that produced them.
    pub nodes: Vec<[NodeIndex; 2]>,
    pub lookup: HashMap<(NodeIndex, NodeIndex), EdgeIndex>,
    pub edges_per_elem: usize,
    pub elem_edges: Vec<EdgeIndex>,
    pub edge_elems: Csr<ElemIndex>,
    pub node_edges: Csr<EdgeIndex>,
}

#[inline]
fn edge_key(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a <= b { (a, b) } else { (b, a) }
}

impl EdgeTable {
    pub fn build(conn: &Connectivity<'_>) -> Self {
        let unit_edges = conn.unit.edges;
        let num_elems = conn.num_elems();
        let mut nodes = Vec::new();
        let mut lookup = HashMap::with_capacity(num_elems * unit_edges.len() / 2 + 1);
        let mut elem_edges = Vec::with_capacity(num_elems * unit_edges.len());
        let mut edge_elem_pairs = Vec::with_capacity(num_elems * unit_edges.len());

        for e in 0..num_elems {
            let en = conn.elem_nodes(e);
            for &[a, b] in unit_edges {
                let (na, nb) = (en[a], en[b]);
                let id = *lookup.entry(edge_key(na, nb)).or_insert_with(|| {
                    nodes.push([na, nb]);
                    EdgeIndex::from_usize(nodes.len() - 1)
                });
                elem_edges.push(id);
                edge_elem_pairs.push((id.idx(), ElemIndex::from_usize(e)));
            }
        }

        let mut node_edge_pairs = Vec::with_capacity(nodes.len() * 2);
        for (i, &[a, b]) in nodes.iter().enumerate() {
            let id = EdgeIndex::from_usize(i);
            node_edge_pairs.push((a.idx(), id));
            node_edge_pairs.push((b.idx(), id));
        }

        EdgeTable {
            edge_elems: Csr::from_pairs(nodes.len(), &edge_elem_pairs),
            node_edges: Csr::from_pairs(conn.num_nodes, &node_edge_pairs),
            nodes,
            lookup,
            edges_per_elem: unit_edges.len(),
            elem_edges,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edge joining `a` and `b`, in either orientation.
    #[inline]
    pub fn find(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.lookup.get(&edge_key(a, b)).copied()
    }

    #[inline]
    pub fn elem_edges(&self, elem: usize) -> &[EdgeIndex] {
        &self.elem_edges[elem * self.edges_per_elem..(elem + 1) * self.edges_per_elem]
    }
}

/// Sorted face nodes padded with `u32::MAX`.
pub type FaceKey = [u32; 4];

fn face_key(nodes: impl IntoIterator<Item = NodeIndex>) -> FaceKey {
    let mut key = [u32::MAX; 4];
    for (slot, n) in key.iter_mut().zip(nodes) {
        *slot = n.get();
    }
    key.sort_unstable();
    key
}

/// Unique faces of a 3D mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceTable {
    /// Face nodes in the orientation of the first element that produced them.
    pub nodes: Csr<NodeIndex>,
    pub lookup: HashMap<FaceKey, FaceIndex>,
    pub faces_per_elem: usize,
    pub elem_faces: Vec<FaceIndex>,
    /// Up to two incident elements; `None` in the second slot marks the
    /// boundary.
    pub face_elems: Vec<[Option<ElemIndex>; 2]>,
}

impl FaceTable {
    pub fn build(
        conn: &Connectivity<'_>,
        non_manifold: NonManifoldHandling,
    ) -> Result<Self, MeshError> {
        let unit_faces = conn.unit.faces;
        let num_elems = conn.num_elems();
        let mut offsets = vec![0usize];
        let mut flat = Vec::new();
        let mut lookup: HashMap<FaceKey, FaceIndex> =
            HashMap::with_capacity(num_elems * unit_faces.len() / 2 + 1);
        let mut elem_faces = Vec::with_capacity(num_elems * unit_faces.len());
        let mut face_elems: Vec<[Option<ElemIndex>; 2]> = Vec::new();
        let mut overflow: HashMap<FaceIndex, usize> = HashMap::new();

        for e in 0..num_elems {
            let en = conn.elem_nodes(e);
            let elem = ElemIndex::from_usize(e);
            for &face in unit_faces {
                let key = face_key(face.iter().map(|&v| en[v]));
                let id = *lookup.entry(key).or_insert_with(|| {
                    flat.extend(face.iter().map(|&v| en[v]));
                    offsets.push(flat.len());
                    face_elems.push([None, None]);
                    FaceIndex::from_usize(face_elems.len() - 1)
                });
                elem_faces.push(id);
                let slots = &mut face_elems[id.idx()];
                if slots[0].is_none() {
                    slots[0] = Some(elem);
                } else if slots[1].is_none() {
                    slots[1] = Some(elem);
                } else {
                    *overflow.entry(id).or_insert(2) += 1;
                }
            }
        }

        for (&face, &incident) in &overflow {
            match non_manifold {
                NonManifoldHandling::Ignore => {}
                NonManifoldHandling::Warn => {
                    log::warn!("Non-manifold face detected: face={face} incident_elems={incident}");
                }
                NonManifoldHandling::Error => {
                    return Err(MeshError::NonManifoldFace {
                        face: face.idx(),
                        incident,
                    });
                }
            }
        }

        Ok(FaceTable {
            nodes: Csr {
                offsets,
                values: flat,
            },
            lookup,
            faces_per_elem: unit_faces.len(),
            elem_faces,
            face_elems,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.face_elems.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.face_elems.is_empty()
    }

    #[inline]
    pub fn face_nodes(&self, face: FaceIndex) -> &[NodeIndex] {
        self.nodes.row(face.idx())
    }

    #[inline]
    pub fn elem_faces(&self, elem: usize) -> &[FaceIndex] {
        &self.elem_faces[elem * self.faces_per_elem..(elem + 1) * self.faces_per_elem]
    }

    /// Face with exactly these nodes, in any order.
    pub fn find(&self, nodes: &[NodeIndex]) -> Option<FaceIndex> {
        if nodes.len() > 4 {
            return None;
        }
        self.lookup.get(&face_key(nodes.iter().copied())).copied()
    }

    #[inline]
    pub fn is_boundary(&self, face: FaceIndex) -> bool {
        self.face_elems[face.idx()][1].is_none()
    }
}

/// Per element and `DElem` slot, the element on the other side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElemNeighborTable {
    pub delems_per_elem: usize,
    pub neighbors: Vec<Option<ElemIndex>>,
}

/// Table an element-neighbor build reads from.
#[derive(Clone, Copy, Debug)]
pub enum DElemSource<'t> {
    Faces(&'t FaceTable),
    Edges(&'t EdgeTable),
    Nodes(&'t NodeNeighborTable),
}

impl ElemNeighborTable {
    pub fn build(conn: &Connectivity<'_>, source: DElemSource<'_>) -> Self {
        let num_elems = conn.num_elems();
        let other = |row: &[ElemIndex], me: ElemIndex| row.iter().copied().find(|&o| o != me);
        let (per, neighbors) = match source {
            DElemSource::Faces(faces) => {
                let mut out = Vec::with_capacity(faces.elem_faces.len());
                for e in 0..num_elems {
                    let me = ElemIndex::from_usize(e);
                    for &f in faces.elem_faces(e) {
                        let [a, b] = faces.face_elems[f.idx()];
                        out.push(if a == Some(me) { b } else { a });
                    }
                }
                (faces.faces_per_elem, out)
            }
            DElemSource::Edges(edges) => {
                let mut out = Vec::with_capacity(edges.elem_edges.len());
                for e in 0..num_elems {
                    let me = ElemIndex::from_usize(e);
                    for &ed in edges.elem_edges(e) {
                        out.push(other(edges.edge_elems.row(ed.idx()), me));
                    }
                }
                (edges.edges_per_elem, out)
            }
            DElemSource::Nodes(table) => {
                let mut out = Vec::with_capacity(conn.elems.len());
                for e in 0..num_elems {
                    let me = ElemIndex::from_usize(e);
                    for &n in conn.elem_nodes(e) {
                        out.push(other(table.elems(n), me));
                    }
                }
                (conn.nodes_per_elem(), out)
            }
        };
        ElemNeighborTable {
            delems_per_elem: per,
            neighbors,
        }
    }

    #[inline]
    pub fn neighbors(&self, elem: usize) -> &[Option<ElemIndex>] {
        &self.neighbors[elem * self.delems_per_elem..(elem + 1) * self.delems_per_elem]
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn empty() -> Self {
        BoundingBox {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn from_points<'p>(points: impl IntoIterator<Item = &'p Point>) -> Self {
        let mut bb = BoundingBox::empty();
        for p in points {
            bb.extend(p);
        }
        bb
    }

    pub fn extend(&mut self, p: &Point) {
        for k in 0..3 {
            self.min[k] = self.min[k].min(p[k]);
            self.max[k] = self.max[k].max(p[k]);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..3).any(|k| self.min[k] > self.max[k])
    }

    /// Containment with every side pushed out by `tol`.
    pub fn contains(&self, p: &Point, tol: f64) -> bool {
        (0..3).all(|k| p[k] >= self.min[k] - tol && p[k] <= self.max[k] + tol)
    }

    pub fn center(&self) -> Point {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
            0.5 * (self.min[2] + self.max[2]),
        ]
    }

    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (0..3)
            .map(|k| (self.max[k] - self.min[k]).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Euclidean distance from `p` to the box; 0 inside, infinite for an
    /// empty box.
    pub fn distance(&self, p: &Point) -> f64 {
        if self.is_empty() {
            return f64::INFINITY;
        }
        (0..3)
            .map(|k| (self.min[k] - p[k]).max(p[k] - self.max[k]).max(0.0).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// Nodes sorted along x for closest-node sweeps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeLocateTable {
    pub order: Vec<NodeIndex>,
    pub xs: Vec<f64>,
}

impl NodeLocateTable {
    pub fn build(points: &[Point]) -> Self {
        let mut order: Vec<NodeIndex> = (0..points.len()).map(NodeIndex::from_usize).collect();
        order.sort_by(|a, b| points[a.idx()][0].total_cmp(&points[b.idx()][0]));
        let xs = order.iter().map(|n| points[n.idx()][0]).collect();
        NodeLocateTable { order, xs }
    }

    /// Closest node to `p` and its squared distance. Ties go to the node
    /// met first in the sweep.
    pub fn closest(&self, p: &Point, points: &[Point]) -> Option<(NodeIndex, f64)> {
        if self.order.is_empty() {
            return None;
        }
        let d2 = |n: NodeIndex| {
            let q = &points[n.idx()];
            (0..3).map(|k| (q[k] - p[k]).powi(2)).sum::<f64>()
        };
        let start = self.xs.partition_point(|&x| x < p[0]);
        let mut best: Option<(NodeIndex, f64)> = None;
        let mut consider = |i: usize| -> bool {
            let dx2 = (self.xs[i] - p[0]).powi(2);
            if best.is_some_and(|(_, b)| dx2 > b) {
                return false;
            }
            let n = self.order[i];
            let d = d2(n);
            if best.is_none_or(|(_, b)| d < b) {
                best = Some((n, d));
            }
            true
        };
        for i in start..self.order.len() {
            if !consider(i) {
                break;
            }
        }
        for i in (0..start).rev() {
            if !consider(i) {
                break;
            }
        }
        best
    }
}

/// Per-element bounding boxes for point location.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElemLocateTable {
    pub boxes: Vec<BoundingBox>,
}

impl ElemLocateTable {
    pub fn build(conn: &Connectivity<'_>, points: &[Point]) -> Self {
        let boxes = (0..conn.num_elems())
            .map(|e| BoundingBox::from_points(conn.elem_nodes(e).iter().map(|n| &points[n.idx()])))
            .collect();
        ElemLocateTable { boxes }
    }

    /// Elements whose box, grown by `tol`, contains `p`.
    pub fn candidates<'s>(&'s self, p: &'s Point, tol: f64) -> impl Iterator<Item = ElemIndex> + 's {
        self.boxes
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.contains(p, tol))
            .map(|(i, _)| ElemIndex::from_usize(i))
    }
}

/// Check every present table against the connectivity it was built from.
pub fn validate_tables(
    conn: &Connectivity<'_>,
    tables: &crate::topology::sync::SyncTables,
) -> Result<(), MeshError> {
    let num_elems = conn.num_elems();
    let out_of_range = |kind, index, len| MeshError::IndexOutOfRange { kind, index, len };

    if let Some(nn) = &tables.node_neighbors {
        if nn.node_elems.rows() != conn.num_nodes {
            return Err(out_of_range(
                EntityKind::Node,
                nn.node_elems.rows(),
                conn.num_nodes,
            ));
        }
        if let Some(e) = nn.node_elems.values.iter().find(|e| e.idx() >= num_elems) {
            return Err(out_of_range(EntityKind::Elem, e.idx(), num_elems));
        }
    }
    if let Some(edges) = &tables.edges {
        if edges.elem_edges.len() != num_elems * edges.edges_per_elem {
            return Err(out_of_range(
                EntityKind::Edge,
                edges.elem_edges.len(),
                num_elems * edges.edges_per_elem,
            ));
        }
        if let Some(e) = edges.elem_edges.iter().find(|e| e.idx() >= edges.len()) {
            return Err(out_of_range(EntityKind::Edge, e.idx(), edges.len()));
        }
    }
    if let Some(faces) = &tables.faces {
        if let Some(f) = faces.elem_faces.iter().find(|f| f.idx() >= faces.len()) {
            return Err(out_of_range(EntityKind::Face, f.idx(), faces.len()));
        }
    }
    if let Some(en) = &tables.elem_neighbors {
        for e in 0..num_elems {
            let me = ElemIndex::from_usize(e);
            for nb in en.neighbors(e).iter().flatten() {
                if nb.idx() >= num_elems {
                    return Err(out_of_range(EntityKind::Elem, nb.idx(), num_elems));
                }
                // adjacency is symmetric
                if !en.neighbors(nb.idx()).contains(&Some(me)) {
                    return Err(MeshError::NotIncident {
                        elem: nb.idx(),
                        delem: e,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::unit_element::UnitElement;
    use crate::topology::element::ElementFamily;

    fn n(i: u32) -> NodeIndex {
        NodeIndex::new(i)
    }

    // two triangles sharing edge 1-2
    fn two_tris() -> Vec<NodeIndex> {
        vec![n(0), n(1), n(2), n(1), n(3), n(2)]
    }

    fn tri_conn(elems: &[NodeIndex]) -> Connectivity<'_> {
        Connectivity {
            unit: UnitElement::of(ElementFamily::Triangle),
            num_nodes: 4,
            elems,
        }
    }

    #[test]
    fn csr_from_pairs_keeps_row_order() {
        let csr = Csr::from_pairs(3, &[(2, 7u32), (0, 1), (2, 9), (0, 4)]);
        assert_eq!(csr.row(0), &[1, 4]);
        assert!(csr.row(1).is_empty());
        assert_eq!(csr.row(2), &[7, 9]);
    }

    #[test]
    fn edges_of_two_triangles() {
        let elems = two_tris();
        let t = EdgeTable::build(&tri_conn(&elems));
        assert_eq!(t.len(), 5);
        let shared = t.find(n(2), n(1)).unwrap();
        assert_eq!(t.edge_elems.row(shared.idx()).len(), 2);
        assert_eq!(t.node_edges.row(1).len(), 3);
        assert_eq!(t.elem_edges(1).len(), 3);
    }

    #[test]
    fn elem_neighbors_across_shared_edge() {
        let elems = two_tris();
        let conn = tri_conn(&elems);
        let edges = EdgeTable::build(&conn);
        let nb = ElemNeighborTable::build(&conn, DElemSource::Edges(&edges));
        let e0 = nb.neighbors(0);
        assert_eq!(e0.iter().flatten().count(), 1);
        assert!(e0.contains(&Some(ElemIndex::new(1))));
    }

    #[test]
    fn node_neighbors_csr() {
        let elems = two_tris();
        let nn = NodeNeighborTable::build(&tri_conn(&elems));
        assert_eq!(nn.elems(n(1)), &[ElemIndex::new(0), ElemIndex::new(1)]);
        assert_eq!(nn.elems(n(3)), &[ElemIndex::new(1)]);
    }

    #[test]
    fn closest_node_sweep() {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.4, 2.0, 0.0], [0.6, 0.1, 0.0]];
        let t = NodeLocateTable::build(&points);
        let (best, d2) = t.closest(&[0.55, 0.0, 0.0], &points).unwrap();
        assert_eq!(best, n(3));
        assert!((d2 - 0.0125).abs() < 1e-12);
    }

    #[test]
    fn bounding_box_contains_with_tolerance() {
        let bb = BoundingBox::from_points(&[[0.0, 0.0, 0.0], [1.0, 2.0, 0.0]]);
        assert!(bb.contains(&[1.0, 2.0, 0.0], 0.0));
        assert!(!bb.contains(&[1.1, 0.0, 0.0], 0.0));
        assert!(bb.contains(&[1.05, 0.0, 0.0], 0.1));
        assert!(BoundingBox::empty().is_empty());
        assert_eq!(bb.distance(&[0.5, 1.0, 0.0]), 0.0);
        assert_eq!(bb.distance(&[4.0, 6.0, 0.0]), 5.0);
        assert_eq!(BoundingBox::empty().distance(&[0.0; 3]), f64::INFINITY);
    }
}
