//! [`VirtualMesh`] over a borrowed [`ConcreteMesh`].

use super::{ClosestElem, TopologyInfo, VirtualMesh};
use crate::basis::Basis;
use crate::config::AdapterOptions;
use crate::geometry::{self, Point};
use crate::mesh::{ConcreteMesh, MeshQueries, unsupported};
use crate::mesh_error::MeshError;
use crate::topology::index::{
    CellIndex, DElemIndex, EdgeIndex, ElemIndex, Entity, FaceIndex, NodeIndex,
};
use crate::topology::sync::SyncFlags;
use crate::topology::tables::BoundingBox;

/// Non-owning adapter; the mesh outlives it.
#[derive(Debug)]
pub struct VirtualMeshAdapter<'m, M: ConcreteMesh + ?Sized> {
    mesh: &'m M,
    topology: TopologyInfo,
    options: AdapterOptions,
}

impl<M: ConcreteMesh + ?Sized> Clone for VirtualMeshAdapter<'_, M> {
    fn clone(&self) -> Self {
        VirtualMeshAdapter { ..*self }
    }
}

impl<'m, M: ConcreteMesh + ?Sized> VirtualMeshAdapter<'m, M> {
    pub fn new(mesh: &'m M) -> Result<Self, MeshError> {
        Self::with_options(mesh, AdapterOptions::default())
    }

    /// Fails when the basis dimension disagrees with the dimensionality the
    /// mesh reports. `options.eager_sync` is synchronized right away.
    pub fn with_options(mesh: &'m M, options: AdapterOptions) -> Result<Self, MeshError> {
        let basis = mesh.basis();
        if basis.dimension() != mesh.dimensionality() {
            return Err(MeshError::DimensionMismatch {
                family: basis.family(),
                expected: basis.dimension(),
                found: mesh.dimensionality(),
            });
        }
        let topology = TopologyInfo::of(basis);
        if !options.eager_sync.is_empty() && !mesh.synchronize(options.eager_sync) {
            log::warn!(
                "VirtualMeshAdapter: eager synchronize of {:?} incomplete on {:?} mesh",
                options.eager_sync,
                basis.family()
            );
        }
        Ok(VirtualMeshAdapter {
            mesh,
            topology,
            options,
        })
    }

    /// The wrapped concrete mesh.
    pub fn mesh(&self) -> &'m M {
        self.mesh
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    fn elem_vertices(&self, elem: ElemIndex) -> Result<Vec<Point>, MeshError> {
        let mut nodes = Vec::with_capacity(self.topology.num_vertices);
        self.mesh.elem_nodes(elem, &mut nodes)?;
        nodes.iter().map(|&n| self.mesh.get_point(n)).collect()
    }

    /// Chain rule through the inverse Jacobian: `dN/dx_a = sum_k dN/dxi_k * inv[k][a]`.
    fn gradient(
        &self,
        coords: &[f64],
        elem: ElemIndex,
        g: &mut Vec<f64>,
    ) -> Result<(), MeshError> {
        let mut dw = Vec::with_capacity(self.topology.dofs * self.topology.dimension);
        self.get_elem_derivate_weights(coords, elem, &mut dw)?;
        let inv = self.inverse_jacobian(coords, elem)?;
        let n = self.topology.dofs;
        g.resize(3 * n, 0.0);
        for (k, row) in inv.iter().enumerate() {
            for (i, d) in dw[k * n..(k + 1) * n].iter().enumerate() {
                for (a, r) in row.iter().enumerate() {
                    g[a * n + i] += d * r;
                }
            }
        }
        Ok(())
    }

    fn scale(&self, elem: ElemIndex, basis: Basis, w: &mut [f64]) -> Result<(), MeshError> {
        if !basis.order().uses_scale_factors() {
            return Ok(());
        }
        let table = self
            .mesh
            .scale_factors()
            .ok_or(MeshError::MissingScaleFactors { elem: elem.idx() })?;
        basis.apply_scale_factors(table.row(elem)?, w)
    }
}

impl<M: ConcreteMesh + ?Sized> VirtualMesh for VirtualMeshAdapter<'_, M> {
    fn topology(&self) -> &TopologyInfo {
        &self.topology
    }

    fn basis(&self) -> Basis {
        self.mesh.basis()
    }

    fn dimensionality(&self) -> usize {
        self.topology.dimension
    }

    fn is_editable(&self) -> bool {
        self.mesh.is_editable()
    }

    fn has_normals(&self) -> bool {
        self.mesh.has_normals()
    }

    fn num_nodes(&self) -> usize {
        self.mesh.num_nodes()
    }

    fn num_edges(&self) -> Result<usize, MeshError> {
        self.mesh.num_edges()
    }

    fn num_faces(&self) -> Result<usize, MeshError> {
        self.mesh.num_faces()
    }

    fn num_cells(&self) -> Result<usize, MeshError> {
        match self.topology.dimension {
            3 => Ok(self.mesh.num_elems()),
            d => Err(unsupported("num_cells", d)),
        }
    }

    fn num_elems(&self) -> usize {
        self.mesh.num_elems()
    }

    fn num_delems(&self) -> Result<usize, MeshError> {
        match self.topology.dimension {
            3 => self.mesh.num_faces(),
            2 => self.mesh.num_edges(),
            1 => Ok(self.mesh.num_nodes()),
            d => Err(unsupported("num_delems", d)),
        }
    }

    fn get_nodes(&self, of: Entity, out: &mut Vec<NodeIndex>) -> Result<(), MeshError> {
        self.mesh.get_nodes(of, out)
    }

    fn get_edges(&self, of: Entity, out: &mut Vec<EdgeIndex>) -> Result<(), MeshError> {
        self.mesh.get_edges(of, out)
    }

    fn get_faces(&self, of: Entity, out: &mut Vec<FaceIndex>) -> Result<(), MeshError> {
        self.mesh.get_faces(of, out)
    }

    fn get_cells(&self, of: Entity, out: &mut Vec<CellIndex>) -> Result<(), MeshError> {
        self.mesh.get_cells(of, out)
    }

    fn get_elems(&self, of: Entity, out: &mut Vec<ElemIndex>) -> Result<(), MeshError> {
        self.mesh.get_elems(of, out)
    }

    fn get_delems(&self, of: Entity, out: &mut Vec<DElemIndex>) -> Result<(), MeshError> {
        self.mesh.get_delems(of, out)
    }

    fn get_neighbor(
        &self,
        elem: ElemIndex,
        delem: DElemIndex,
    ) -> Result<Option<ElemIndex>, MeshError> {
        self.mesh.get_neighbor(elem, delem)
    }

    fn get_neighbors(&self, elem: ElemIndex, out: &mut Vec<ElemIndex>) -> Result<(), MeshError> {
        self.mesh.get_neighbors(elem, out)
    }

    fn get_node_neighbors(
        &self,
        node: NodeIndex,
        out: &mut Vec<NodeIndex>,
    ) -> Result<(), MeshError> {
        self.mesh.get_node_neighbors(node, out)
    }

    fn is_boundary(&self, delem: DElemIndex) -> Result<bool, MeshError> {
        self.mesh.is_boundary(delem)
    }

    fn get_edge(&self, nodes: &[NodeIndex]) -> Result<Option<EdgeIndex>, MeshError> {
        self.mesh.get_edge(nodes)
    }

    fn get_face(&self, nodes: &[NodeIndex]) -> Result<Option<FaceIndex>, MeshError> {
        self.mesh.get_face(nodes)
    }

    fn get_cell(&self, nodes: &[NodeIndex]) -> Result<Option<CellIndex>, MeshError> {
        self.mesh.get_cell(nodes)
    }

    fn get_elem(&self, nodes: &[NodeIndex]) -> Result<Option<ElemIndex>, MeshError> {
        self.mesh.get_elem(nodes)
    }

    fn get_delem(&self, nodes: &[NodeIndex]) -> Result<Option<DElemIndex>, MeshError> {
        self.mesh.get_delem(nodes)
    }

    fn get_point(&self, node: NodeIndex) -> Result<Point, MeshError> {
        self.mesh.get_point(node)
    }

    fn get_points(&self, of: Entity, out: &mut Vec<Point>) -> Result<(), MeshError> {
        out.clear();
        let mut nodes = Vec::new();
        self.mesh.get_nodes(of, &mut nodes)?;
        for n in nodes {
            match self.mesh.get_point(n) {
                Ok(p) => out.push(p),
                Err(e) => {
                    out.clear();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn get_center(&self, of: Entity) -> Result<Point, MeshError> {
        let dim = self.topology.dimension;
        let e = of.canonical(dim)?;
        if e.dimension() == Some(dim) {
            let unit = self.topology.unit();
            return self.interpolate(&unit.center[..dim], ElemIndex::new(e.idx() as u32));
        }
        let mut points = Vec::new();
        self.get_points(e, &mut points)?;
        let n = points.len().max(1) as f64;
        Ok(points.iter().fold([0.0; 3], |acc, p| {
            [acc[0] + p[0] / n, acc[1] + p[1] / n, acc[2] + p[2] / n]
        }))
    }

    fn get_bounding_box(&self) -> Result<BoundingBox, MeshError> {
        self.mesh.bounding_box()
    }

    fn get_size(&self, of: Entity) -> Result<f64, MeshError> {
        let dim = self.topology.dimension;
        let e = of.canonical(dim)?;
        if e.dimension() == Some(dim) {
            let vertices = self.elem_vertices(ElemIndex::new(e.idx() as u32))?;
            return geometry::measure(self.topology.family, &vertices);
        }
        let mut points = Vec::new();
        self.get_points(e, &mut points)?;
        Ok(match (e, points.as_slice()) {
            (Entity::Edge(_), [a, b, ..]) => geometry::norm(geometry::sub(*b, *a)),
            (Entity::Face(_), _) => geometry::polygon_area(&points),
            _ => 0.0,
        })
    }

    fn interpolate(&self, coords: &[f64], elem: ElemIndex) -> Result<Point, MeshError> {
        geometry::interpolate(self.topology.family, &self.elem_vertices(elem)?, coords)
    }

    fn jacobian(&self, coords: &[f64], elem: ElemIndex) -> Result<Vec<Point>, MeshError> {
        geometry::jacobian(self.topology.family, &self.elem_vertices(elem)?, coords)
    }

    fn det_jacobian(&self, coords: &[f64], elem: ElemIndex) -> Result<f64, MeshError> {
        geometry::det_jacobian(self.topology.family, &self.elem_vertices(elem)?, coords)
    }

    fn inverse_jacobian(
        &self,
        coords: &[f64],
        elem: ElemIndex,
    ) -> Result<Vec<Point>, MeshError> {
        geometry::inverse_jacobian(self.topology.family, &self.elem_vertices(elem)?, coords)
    }

    fn get_coords(&self, p: &Point, elem: ElemIndex) -> Result<Option<Vec<f64>>, MeshError> {
        geometry::get_coords(
            self.topology.family,
            &self.elem_vertices(elem)?,
            p,
            &self.options.locate,
        )
    }

    fn is_inside(&self, p: &Point, elem: ElemIndex) -> Result<bool, MeshError> {
        let inside = geometry::is_inside(
            self.topology.family,
            &self.elem_vertices(elem)?,
            p,
            &self.options.locate,
        )?;
        Ok(inside.is_some())
    }

    fn locate(&self, p: &Point) -> Result<Option<(ElemIndex, Vec<f64>)>, MeshError> {
        let mut candidates = Vec::new();
        let bbox = self.mesh.bounding_box()?;
        let tol = self.options.locate.inside_tolerance * bbox.diagonal().max(1.0);
        self.mesh.locate_candidates(p, tol, &mut candidates)?;
        for elem in candidates {
            let vertices = self.elem_vertices(elem)?;
            if let Some(coords) =
                geometry::is_inside(self.topology.family, &vertices, p, &self.options.locate)?
            {
                return Ok(Some((elem, coords)));
            }
        }
        Ok(None)
    }

    fn find_closest_node(&self, p: &Point) -> Result<Option<(NodeIndex, f64)>, MeshError> {
        self.mesh.closest_node(p)
    }

    fn find_closest_elem_within(
        &self,
        p: &Point,
        max_dist: f64,
    ) -> Result<Option<ClosestElem>, MeshError> {
        if let Some((elem, coords)) = self.locate(p)? {
            return Ok(Some(ClosestElem {
                elem,
                coords,
                point: *p,
                distance: 0.0,
            }));
        }
        let mut candidates = Vec::with_capacity(self.mesh.num_elems());
        for e in 0..self.mesh.num_elems() {
            let elem = ElemIndex::from_usize(e);
            let vertices = self.elem_vertices(elem)?;
            let lower = BoundingBox::from_points(&vertices).distance(p);
            if lower <= max_dist {
                candidates.push((lower, elem, vertices));
            }
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut best: Option<ClosestElem> = None;
        for (lower, elem, vertices) in candidates {
            if best.as_ref().is_some_and(|b| lower > b.distance) {
                break;
            }
            let (coords, point) = geometry::closest_point(
                self.topology.family,
                &vertices,
                p,
                &self.options.locate,
            )?;
            let distance = geometry::norm(geometry::sub(point, *p));
            if distance <= max_dist && best.as_ref().is_none_or(|b| distance < b.distance) {
                best = Some(ClosestElem {
                    elem,
                    coords,
                    point,
                    distance,
                });
            }
        }
        Ok(best)
    }

    fn get_weights(&self, coords: &[f64], w: &mut Vec<f64>) -> Result<(), MeshError> {
        self.mesh.basis().weights(coords, w)
    }

    fn get_derivate_weights(&self, coords: &[f64], w: &mut Vec<f64>) -> Result<(), MeshError> {
        self.mesh.basis().derivative_weights(coords, w)
    }

    fn get_elem_weights(
        &self,
        coords: &[f64],
        elem: ElemIndex,
        w: &mut Vec<f64>,
    ) -> Result<(), MeshError> {
        let basis = self.mesh.basis();
        basis.weights(coords, w)?;
        let res = self.scale(elem, basis, w);
        if res.is_err() {
            w.clear();
        }
        res
    }

    fn get_elem_derivate_weights(
        &self,
        coords: &[f64],
        elem: ElemIndex,
        w: &mut Vec<f64>,
    ) -> Result<(), MeshError> {
        let basis = self.mesh.basis();
        basis.derivative_weights(coords, w)?;
        let res = self.scale(elem, basis, w);
        if res.is_err() {
            w.clear();
        }
        res
    }

    fn get_elem_gradient_weights(
        &self,
        coords: &[f64],
        elem: ElemIndex,
        g: &mut Vec<f64>,
    ) -> Result<(), MeshError> {
        g.clear();
        let res = self.gradient(coords, elem, g);
        if res.is_err() {
            g.clear();
        }
        res
    }

    fn synchronize(&self, flags: SyncFlags) -> bool {
        self.mesh.synchronize(flags)
    }

    fn unsynchronize(&self, flags: SyncFlags) -> bool {
        self.mesh.unsynchronize(flags)
    }

    fn clear_synchronization(&self) -> bool {
        self.mesh.clear_synchronization()
    }

    fn synchronized(&self) -> SyncFlags {
        self.mesh.synchronized()
    }

    fn vmesh(&self) -> &dyn VirtualMesh {
        self
    }
}
