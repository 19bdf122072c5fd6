//! Entity iteration over a [`VirtualMesh`].
//!
//! A [`SmartMeshIterator`] is a cursor over one entity kind. The begin cursor
//! is free; the end cursor synchronizes the table the entity count depends on
//! before reading it. Dereferencing yields a small info value (index plus
//! mesh handle) whose relationships are computed on demand, so nothing is
//! shared or overwritten between steps.
//!
//! ```ignore
//! let mut total = 0.0;
//! for edge in mesh.facade().edges()? {
//!     total += edge.length()?;
//! }
//! ```

use super::VirtualMesh;
use crate::geometry::{self, Point};
use crate::mesh::unsupported;
use crate::mesh_error::MeshError;
use crate::topology::index::{
    CellIndex, DElemIndex, EdgeIndex, ElemIndex, Entity, FaceIndex, NodeIndex,
};
use crate::topology::sync::SyncFlags;
use std::fmt;
use std::marker::PhantomData;

/// An entity kind the facade can iterate.
pub trait MeshComponent {
    type Index: Copy + Eq + fmt::Debug;
    /// Value produced when a cursor is dereferenced.
    type Info<'m>: Copy;

    const NAME: &'static str;

    /// Tables the entity count depends on.
    fn sync_flags() -> SyncFlags;

    fn count(mesh: &dyn VirtualMesh) -> Result<usize, MeshError>;

    fn index(pos: usize) -> Self::Index;

    fn info<'m>(mesh: &'m dyn VirtualMesh, index: Self::Index) -> Self::Info<'m>;
}

/// Bidirectional cursor over the entities of kind `C`.
pub struct SmartMeshIterator<'m, C: MeshComponent> {
    mesh: &'m dyn VirtualMesh,
    pos: usize,
    _component: PhantomData<C>,
}

impl<C: MeshComponent> Clone for SmartMeshIterator<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: MeshComponent> Copy for SmartMeshIterator<'_, C> {}

impl<'m, C: MeshComponent> SmartMeshIterator<'m, C> {
    /// Cursor at the first entity. Does not synchronize.
    pub fn begin(mesh: &'m dyn VirtualMesh) -> Self {
        SmartMeshIterator {
            mesh,
            pos: 0,
            _component: PhantomData,
        }
    }

    /// Cursor one past the last entity, after synchronizing
    /// [`MeshComponent::sync_flags`].
    pub fn end(mesh: &'m dyn VirtualMesh) -> Result<Self, MeshError> {
        let flags = C::sync_flags();
        if !flags.is_empty() && !mesh.synchronize(flags) {
            return Err(MeshError::NotSynchronized(C::NAME));
        }
        Ok(SmartMeshIterator {
            mesh,
            pos: C::count(mesh)?,
            _component: PhantomData,
        })
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn index(&self) -> C::Index {
        C::index(self.pos)
    }

    /// Info of the current entity. Not bounds checked: at the end position
    /// the info's queries fail with an out-of-range index.
    #[inline]
    pub fn get(&self) -> C::Info<'m> {
        C::info(self.mesh, self.index())
    }

    #[inline]
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    pub fn retreat(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }
}

impl<C: MeshComponent> PartialEq for SmartMeshIterator<'_, C> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(self.mesh, other.mesh) && self.pos == other.pos
    }
}

impl<C: MeshComponent> Eq for SmartMeshIterator<'_, C> {}

impl<C: MeshComponent> fmt::Debug for SmartMeshIterator<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartMeshIterator")
            .field("component", &C::NAME)
            .field("pos", &self.pos)
            .finish()
    }
}

/// The half-open range `[begin, end)` as a Rust iterator.
pub struct MeshRange<'m, C: MeshComponent> {
    front: SmartMeshIterator<'m, C>,
    back: SmartMeshIterator<'m, C>,
}

impl<'m, C: MeshComponent> MeshRange<'m, C> {
    pub fn new(mesh: &'m dyn VirtualMesh) -> Result<Self, MeshError> {
        let back = SmartMeshIterator::end(mesh)?;
        Ok(MeshRange {
            front: SmartMeshIterator::begin(mesh),
            back,
        })
    }

    pub fn begin(&self) -> SmartMeshIterator<'m, C> {
        self.front
    }

    pub fn end(&self) -> SmartMeshIterator<'m, C> {
        self.back
    }
}

impl<'m, C: MeshComponent> Iterator for MeshRange<'m, C> {
    type Item = C::Info<'m>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front.pos >= self.back.pos {
            return None;
        }
        let info = self.front.get();
        self.front.advance();
        Some(info)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back.pos.saturating_sub(self.front.pos);
        (n, Some(n))
    }
}

impl<C: MeshComponent> DoubleEndedIterator for MeshRange<'_, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front.pos >= self.back.pos {
            return None;
        }
        self.back.retreat();
        Some(self.back.get())
    }
}

impl<C: MeshComponent> ExactSizeIterator for MeshRange<'_, C> {}

macro_rules! info_value {
    ($(#[$meta:meta])* $info:ident, $marker:ident, $index:ident, $name:literal,
     flags: $flags:expr, count: $count:expr) => {
        /// Iteration marker; see [`MeshComponent`].
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $marker;

        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $info<'m> {
            mesh: &'m dyn VirtualMesh,
            index: $index,
        }

        impl<'m> $info<'m> {
            #[inline]
            pub fn index(&self) -> $index {
                self.index
            }

            #[inline]
            pub fn mesh(&self) -> &'m dyn VirtualMesh {
                self.mesh
            }
        }

        impl fmt::Debug for $info<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($info)).field(&self.index).finish()
            }
        }

        impl PartialEq for $info<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::addr_eq(self.mesh, other.mesh) && self.index == other.index
            }
        }

        impl MeshComponent for $marker {
            type Index = $index;
            type Info<'m> = $info<'m>;

            const NAME: &'static str = $name;

            fn sync_flags() -> SyncFlags {
                $flags
            }

            fn count(mesh: &dyn VirtualMesh) -> Result<usize, MeshError> {
                let count: fn(&dyn VirtualMesh) -> Result<usize, MeshError> = $count;
                count(mesh)
            }

            fn index(pos: usize) -> $index {
                $index::from_usize(pos)
            }

            fn info<'m>(mesh: &'m dyn VirtualMesh, index: $index) -> $info<'m> {
                $info { mesh, index }
            }
        }
    };
}

info_value!(
    /// A node seen through the facade.
    NodeInfo, Nodes, NodeIndex, "NODES",
    flags: SyncFlags::NONE,
    count: |m| Ok(m.num_nodes())
);
info_value!(
    /// An edge seen through the facade.
    EdgeInfo, Edges, EdgeIndex, "EDGES",
    flags: SyncFlags::EDGES,
    count: |m| m.num_edges()
);
info_value!(
    /// A face seen through the facade.
    FaceInfo, Faces, FaceIndex, "FACES",
    flags: SyncFlags::FACES,
    count: |m| m.num_faces()
);
info_value!(
    /// A volume element seen through the facade.
    CellInfo, Cells, CellIndex, "CELLS",
    flags: SyncFlags::NONE,
    count: |m| m.num_cells()
);

fn collect<T>(
    f: impl FnOnce(&mut Vec<T>) -> Result<(), MeshError>,
) -> Result<Vec<T>, MeshError> {
    let mut out = Vec::new();
    f(&mut out)?;
    Ok(out)
}

impl NodeInfo<'_> {
    pub fn point(&self) -> Result<Point, MeshError> {
        self.mesh.get_point(self.index)
    }

    /// Elements using this node.
    pub fn elems(&self) -> Result<Vec<ElemIndex>, MeshError> {
        collect(|out| self.mesh.get_elems(Entity::Node(self.index), out))
    }

    /// Nodes sharing an edge with this one.
    pub fn neighbors(&self) -> Result<Vec<NodeIndex>, MeshError> {
        collect(|out| self.mesh.get_node_neighbors(self.index, out))
    }
}

impl EdgeInfo<'_> {
    pub fn node_indices(&self) -> Result<Vec<NodeIndex>, MeshError> {
        collect(|out| self.mesh.get_nodes(Entity::Edge(self.index), out))
    }

    pub fn node_points(&self) -> Result<Vec<Point>, MeshError> {
        collect(|out| self.mesh.get_points(Entity::Edge(self.index), out))
    }

    pub fn center(&self) -> Result<Point, MeshError> {
        self.mesh.get_center(Entity::Edge(self.index))
    }

    pub fn length(&self) -> Result<f64, MeshError> {
        match self.node_points()?[..] {
            [a, b] => Ok(geometry::norm(geometry::sub(b, a))),
            _ => Err(MeshError::NotSynchronized("EDGES")),
        }
    }

    pub fn elems(&self) -> Result<Vec<ElemIndex>, MeshError> {
        collect(|out| self.mesh.get_elems(Entity::Edge(self.index), out))
    }
}

impl FaceInfo<'_> {
    pub fn node_indices(&self) -> Result<Vec<NodeIndex>, MeshError> {
        collect(|out| self.mesh.get_nodes(Entity::Face(self.index), out))
    }

    pub fn node_points(&self) -> Result<Vec<Point>, MeshError> {
        collect(|out| self.mesh.get_points(Entity::Face(self.index), out))
    }

    pub fn edges(&self) -> Result<Vec<EdgeIndex>, MeshError> {
        collect(|out| self.mesh.get_edges(Entity::Face(self.index), out))
    }

    pub fn center(&self) -> Result<Point, MeshError> {
        self.mesh.get_center(Entity::Face(self.index))
    }

    pub fn elems(&self) -> Result<Vec<ElemIndex>, MeshError> {
        collect(|out| self.mesh.get_elems(Entity::Face(self.index), out))
    }

    /// Boundary face of a volume mesh.
    pub fn is_boundary(&self) -> Result<bool, MeshError> {
        match self.mesh.dimensionality() {
            3 => self.mesh.is_boundary(DElemIndex::new(self.index.get())),
            d => Err(unsupported("FaceInfo::is_boundary", d)),
        }
    }
}

impl CellInfo<'_> {
    fn elem(&self) -> ElemIndex {
        ElemIndex::new(self.index.get())
    }

    pub fn node_indices(&self) -> Result<Vec<NodeIndex>, MeshError> {
        collect(|out| self.mesh.get_nodes(Entity::Cell(self.index), out))
    }

    pub fn node_points(&self) -> Result<Vec<Point>, MeshError> {
        collect(|out| self.mesh.get_points(Entity::Cell(self.index), out))
    }

    pub fn edges(&self) -> Result<Vec<EdgeIndex>, MeshError> {
        collect(|out| self.mesh.get_edges(Entity::Cell(self.index), out))
    }

    pub fn faces(&self) -> Result<Vec<FaceIndex>, MeshError> {
        collect(|out| self.mesh.get_faces(Entity::Cell(self.index), out))
    }

    pub fn neighbors(&self) -> Result<Vec<ElemIndex>, MeshError> {
        collect(|out| self.mesh.get_neighbors(self.elem(), out))
    }

    pub fn center(&self) -> Result<Point, MeshError> {
        self.mesh.get_center(Entity::Cell(self.index))
    }

    /// Volume from the Jacobian at the center; exact for affine cells.
    pub fn volume(&self) -> Result<f64, MeshError> {
        let topo = self.mesh.topology();
        let center = &topo.unit().center[..topo.dimension];
        Ok(self.mesh.det_jacobian(center, self.elem())? * topo.domain_size)
    }
}

/// Entry point for iterating a virtual mesh.
#[derive(Clone, Copy)]
pub struct MeshFacade<'m> {
    mesh: &'m dyn VirtualMesh,
}

impl fmt::Debug for MeshFacade<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshFacade")
            .field("family", &self.mesh.topology().family)
            .finish()
    }
}

impl<'m> MeshFacade<'m> {
    pub fn new(mesh: &'m dyn VirtualMesh) -> Self {
        MeshFacade { mesh }
    }

    pub fn mesh(&self) -> &'m dyn VirtualMesh {
        self.mesh
    }

    pub fn nodes(&self) -> Result<MeshRange<'m, Nodes>, MeshError> {
        MeshRange::new(self.mesh)
    }

    pub fn edges(&self) -> Result<MeshRange<'m, Edges>, MeshError> {
        MeshRange::new(self.mesh)
    }

    pub fn faces(&self) -> Result<MeshRange<'m, Faces>, MeshError> {
        MeshRange::new(self.mesh)
    }

    pub fn cells(&self) -> Result<MeshRange<'m, Cells>, MeshError> {
        MeshRange::new(self.mesh)
    }

    pub fn num_nodes(&self) -> usize {
        self.mesh.num_nodes()
    }

    pub fn num_edges(&self) -> Result<usize, MeshError> {
        self.mesh.num_edges()
    }

    pub fn num_faces(&self) -> Result<usize, MeshError> {
        self.mesh.num_faces()
    }

    pub fn num_cells(&self) -> Result<usize, MeshError> {
        self.mesh.num_cells()
    }
}
