//! The virtual mesh: one object-safe query surface over every concrete mesh.
//!
//! Generic algorithms take `&dyn VirtualMesh` and never see the concrete
//! storage type. [`VirtualMeshAdapter`] implements the trait for any
//! [`ConcreteMesh`](crate::mesh::ConcreteMesh) by borrowing it; the adapter
//! holds nothing but the topology constants of the mesh's basis, everything
//! else is forwarded.
//!
//! Synchronization requests report success as `bool`. Connectivity queries
//! fill caller-provided buffers and synchronize the tables they read on
//! demand.

pub mod adapter;
pub mod facade;

pub use adapter::VirtualMeshAdapter;
pub use facade::{
    CellInfo, EdgeInfo, FaceInfo, MeshComponent, MeshFacade, MeshRange, NodeInfo,
    SmartMeshIterator,
};

use crate::basis::{Basis, BasisOrder, SamplingScheme, UnitElement};
use crate::geometry::Point;
use crate::mesh_error::MeshError;
use crate::topology::element::ElementFamily;
use crate::topology::index::{
    CellIndex, DElemIndex, EdgeIndex, ElemIndex, Entity, FaceIndex, NodeIndex,
};
use crate::topology::sync::SyncFlags;
use crate::topology::tables::BoundingBox;
use serde::{Deserialize, Serialize};

/// Per-element topology constants of a basis, fixed for the lifetime of an
/// adapter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopologyInfo {
    pub family: ElementFamily,
    pub basis_order: BasisOrder,
    pub dimension: usize,
    /// Mesh vertices per element.
    pub num_vertices: usize,
    /// Edge-interior nodes per element.
    pub num_enodes: usize,
    pub num_edges: usize,
    pub num_faces: usize,
    pub num_nodes_per_face: usize,
    pub num_edges_per_face: usize,
    /// Derivative components stored per node by Hermite bases.
    pub num_hderivs: usize,
    /// Measure of the reference element.
    pub domain_size: f64,
    /// Weights per element; the weight vector length.
    pub dofs: usize,
}

impl TopologyInfo {
    pub fn of(basis: Basis) -> Self {
        let unit = basis.unit();
        TopologyInfo {
            family: basis.family(),
            basis_order: basis.order(),
            dimension: unit.domain_dimension,
            num_vertices: unit.number_of_vertices(),
            num_enodes: basis.num_enodes(),
            num_edges: unit.number_of_edges(),
            num_faces: unit.faces_of_cell(),
            num_nodes_per_face: unit.vertices_of_face,
            num_edges_per_face: unit.edges_of_face(),
            num_hderivs: basis.num_hderivs(),
            domain_size: unit.domain_size,
            dofs: basis.dofs(),
        }
    }

    /// Unit-coordinate tables of the family.
    pub fn unit(&self) -> &'static UnitElement {
        UnitElement::of(self.family)
    }
}

/// Result of a closest-element search.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosestElem {
    pub elem: ElemIndex,
    /// Parametric coordinates of `point` in `elem`.
    pub coords: Vec<f64>,
    /// Closest physical point on the mesh.
    pub point: Point,
    pub distance: f64,
}

/// Queries every virtual mesh answers.
///
/// `of` arguments may be any entity up to the mesh dimension, with `Elem`
/// and `DElem` standing for the top-dimensional element and its boundary
/// entity. Output buffers hold exactly the relationship on success and are
/// empty on error.
pub trait VirtualMesh: Send + Sync {
    fn topology(&self) -> &TopologyInfo;
    fn basis(&self) -> Basis;
    fn dimensionality(&self) -> usize;
    fn is_editable(&self) -> bool;
    fn has_normals(&self) -> bool;

    // sizes
    fn num_nodes(&self) -> usize;
    fn num_edges(&self) -> Result<usize, MeshError>;
    fn num_faces(&self) -> Result<usize, MeshError>;
    fn num_cells(&self) -> Result<usize, MeshError>;
    fn num_elems(&self) -> usize;
    fn num_delems(&self) -> Result<usize, MeshError>;

    // connectivity
    fn get_nodes(&self, of: Entity, out: &mut Vec<NodeIndex>) -> Result<(), MeshError>;
    fn get_edges(&self, of: Entity, out: &mut Vec<EdgeIndex>) -> Result<(), MeshError>;
    fn get_faces(&self, of: Entity, out: &mut Vec<FaceIndex>) -> Result<(), MeshError>;
    fn get_cells(&self, of: Entity, out: &mut Vec<CellIndex>) -> Result<(), MeshError>;
    fn get_elems(&self, of: Entity, out: &mut Vec<ElemIndex>) -> Result<(), MeshError>;
    fn get_delems(&self, of: Entity, out: &mut Vec<DElemIndex>) -> Result<(), MeshError>;
    fn get_neighbor(
        &self,
        elem: ElemIndex,
        delem: DElemIndex,
    ) -> Result<Option<ElemIndex>, MeshError>;
    fn get_neighbors(&self, elem: ElemIndex, out: &mut Vec<ElemIndex>) -> Result<(), MeshError>;
    fn get_node_neighbors(
        &self,
        node: NodeIndex,
        out: &mut Vec<NodeIndex>,
    ) -> Result<(), MeshError>;
    fn is_boundary(&self, delem: DElemIndex) -> Result<bool, MeshError>;

    // lookup by node set; `None` when no entity has exactly these nodes
    fn get_edge(&self, nodes: &[NodeIndex]) -> Result<Option<EdgeIndex>, MeshError>;
    fn get_face(&self, nodes: &[NodeIndex]) -> Result<Option<FaceIndex>, MeshError>;
    fn get_cell(&self, nodes: &[NodeIndex]) -> Result<Option<CellIndex>, MeshError>;
    fn get_elem(&self, nodes: &[NodeIndex]) -> Result<Option<ElemIndex>, MeshError>;
    fn get_delem(&self, nodes: &[NodeIndex]) -> Result<Option<DElemIndex>, MeshError>;

    // geometry
    fn get_point(&self, node: NodeIndex) -> Result<Point, MeshError>;
    /// Positions of the nodes of `of`.
    fn get_points(&self, of: Entity, out: &mut Vec<Point>) -> Result<(), MeshError>;
    /// Element centers are the image of the unit center; other entities use
    /// the mean of their nodes.
    fn get_center(&self, of: Entity) -> Result<Point, MeshError>;
    fn get_bounding_box(&self) -> Result<BoundingBox, MeshError>;
    /// Length of an edge, area of a face, measure of an element; nodes have
    /// size 0.
    fn get_size(&self, of: Entity) -> Result<f64, MeshError>;
    fn interpolate(&self, coords: &[f64], elem: ElemIndex) -> Result<Point, MeshError>;
    fn jacobian(&self, coords: &[f64], elem: ElemIndex) -> Result<Vec<Point>, MeshError>;
    fn det_jacobian(&self, coords: &[f64], elem: ElemIndex) -> Result<f64, MeshError>;
    fn inverse_jacobian(&self, coords: &[f64], elem: ElemIndex)
    -> Result<Vec<Point>, MeshError>;
    /// Parametric coordinates of `p` in `elem`; `None` when the inverse map
    /// does not converge.
    fn get_coords(&self, p: &Point, elem: ElemIndex) -> Result<Option<Vec<f64>>, MeshError>;
    fn is_inside(&self, p: &Point, elem: ElemIndex) -> Result<bool, MeshError>;
    /// First element containing `p`, with the parametric coordinates there.
    fn locate(&self, p: &Point) -> Result<Option<(ElemIndex, Vec<f64>)>, MeshError>;
    fn find_closest_node(&self, p: &Point) -> Result<Option<(NodeIndex, f64)>, MeshError>;
    /// Closest point of the mesh to `p` no farther than `max_dist`. An element
    /// containing `p` wins with distance 0.
    fn find_closest_elem_within(
        &self,
        p: &Point,
        max_dist: f64,
    ) -> Result<Option<ClosestElem>, MeshError>;
    fn find_closest_elem(&self, p: &Point) -> Result<Option<ClosestElem>, MeshError> {
        self.find_closest_elem_within(p, f64::INFINITY)
    }

    // weights
    fn num_weights(&self) -> usize {
        self.topology().dofs
    }
    fn num_derivate_weights(&self) -> usize {
        self.topology().dofs * self.topology().dimension
    }
    /// Basis weights at `coords`, without any per-element scaling.
    fn get_weights(&self, coords: &[f64], w: &mut Vec<f64>) -> Result<(), MeshError>;
    fn get_derivate_weights(&self, coords: &[f64], w: &mut Vec<f64>) -> Result<(), MeshError>;
    /// Weights for interpolating on `elem`, scale factors applied.
    fn get_elem_weights(
        &self,
        coords: &[f64],
        elem: ElemIndex,
        w: &mut Vec<f64>,
    ) -> Result<(), MeshError>;
    fn get_elem_derivate_weights(
        &self,
        coords: &[f64],
        elem: ElemIndex,
        w: &mut Vec<f64>,
    ) -> Result<(), MeshError>;
    /// Physical gradient weights: for each physical axis a block of
    /// `num_weights()` entries, so the gradient of a field with dofs `u` is
    /// `g[a * n..(a + 1) * n] . u` along axis `a`.
    fn get_elem_gradient_weights(
        &self,
        coords: &[f64],
        elem: ElemIndex,
        g: &mut Vec<f64>,
    ) -> Result<(), MeshError>;
    /// Locate `p`, then fill its element weights. `Ok(None)` with `w` empty
    /// when `p` lies outside the mesh.
    fn get_interpolate_weights(
        &self,
        p: &Point,
        w: &mut Vec<f64>,
    ) -> Result<Option<ElemIndex>, MeshError> {
        w.clear();
        let Some((elem, coords)) = self.locate(p)? else {
            return Ok(None);
        };
        self.get_elem_weights(&coords, elem, w)?;
        Ok(Some(elem))
    }
    /// Locate `p`, then fill its physical gradient weights.
    fn get_gradient_weights(
        &self,
        p: &Point,
        g: &mut Vec<f64>,
    ) -> Result<Option<ElemIndex>, MeshError> {
        g.clear();
        let Some((elem, coords)) = self.locate(p)? else {
            return Ok(None);
        };
        self.get_elem_gradient_weights(&coords, elem, g)?;
        Ok(Some(elem))
    }

    // sampling schemes of the element family
    fn get_gaussian_scheme(&self, order: usize) -> Result<SamplingScheme, MeshError> {
        SamplingScheme::gaussian(self.topology().family, order)
    }
    fn get_regular_scheme(&self, order: usize) -> Result<SamplingScheme, MeshError> {
        SamplingScheme::regular(self.topology().family, order)
    }

    // synchronization
    fn synchronize(&self, flags: SyncFlags) -> bool;
    fn unsynchronize(&self, flags: SyncFlags) -> bool;
    fn clear_synchronization(&self) -> bool;
    fn synchronized(&self) -> SyncFlags;

    /// This mesh as a trait object.
    fn vmesh(&self) -> &dyn VirtualMesh;
}

/// Convenience wrappers over [`VirtualMesh`] that allocate their results.
pub trait VirtualMeshExt: VirtualMesh {
    fn weights<C: AsRef<[f64]> + ?Sized>(&self, coords: &C) -> Result<Vec<f64>, MeshError> {
        let mut w = Vec::with_capacity(self.num_weights());
        self.get_weights(coords.as_ref(), &mut w)?;
        Ok(w)
    }

    fn derivate_weights<C: AsRef<[f64]> + ?Sized>(
        &self,
        coords: &C,
    ) -> Result<Vec<f64>, MeshError> {
        let mut w = Vec::with_capacity(self.num_derivate_weights());
        self.get_derivate_weights(coords.as_ref(), &mut w)?;
        Ok(w)
    }

    fn elem_weights<C: AsRef<[f64]> + ?Sized>(
        &self,
        coords: &C,
        elem: ElemIndex,
    ) -> Result<Vec<f64>, MeshError> {
        let mut w = Vec::with_capacity(self.num_weights());
        self.get_elem_weights(coords.as_ref(), elem, &mut w)?;
        Ok(w)
    }

    /// Interpolate nodal values `values[node]` at `coords` of `elem`.
    ///
    /// Only bases whose degrees of freedom are the element vertices can be
    /// interpolated from per-node values.
    fn interpolate_values(
        &self,
        values: &[f64],
        coords: &[f64],
        elem: ElemIndex,
    ) -> Result<f64, MeshError> {
        let topo = self.topology();
        match topo.basis_order {
            BasisOrder::Linear => {}
            order => {
                return Err(MeshError::UnsupportedBasis {
                    family: topo.family,
                    order,
                });
            }
        }
        let mut nodes = Vec::with_capacity(topo.num_vertices);
        self.get_nodes(Entity::Elem(elem), &mut nodes)?;
        let w = self.elem_weights(coords, elem)?;
        nodes.iter().zip(&w).try_fold(0.0, |acc, (n, wi)| {
            let v = values.get(n.idx()).ok_or(MeshError::IndexOutOfRange {
                kind: crate::topology::index::EntityKind::Node,
                index: n.idx(),
                len: values.len(),
            })?;
            Ok(acc + wi * v)
        })
    }

    fn nodes_of(&self, of: Entity) -> Result<Vec<NodeIndex>, MeshError> {
        let mut out = Vec::new();
        self.get_nodes(of, &mut out)?;
        Ok(out)
    }

    fn elems_of(&self, of: Entity) -> Result<Vec<ElemIndex>, MeshError> {
        let mut out = Vec::new();
        self.get_elems(of, &mut out)?;
        Ok(out)
    }

    /// Entity iteration over this mesh.
    fn facade(&self) -> MeshFacade<'_> {
        MeshFacade::new(self.vmesh())
    }
}

impl<V: VirtualMesh + ?Sized> VirtualMeshExt for V {}
