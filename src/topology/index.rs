//! Strong, zero-cost index handles for mesh entities.
//!
//! Every entity of a concrete mesh (node, edge, face, cell) is addressed by a
//! dense `u32` position into that mesh's arrays. The newtypes below keep the
//! kinds apart at compile time, and `Elem`/`DElem` name "the element" and "the
//! element's boundary entity" without committing to a dimension.
//!
//! Indices are only meaningful relative to the mesh that produced them.
//!
//! # Memory layout
//! Every index is `repr(transparent)` over `u32` and `Pod`, so connectivity
//! arrays can be viewed as `&[u32]` with [`bytemuck::cast_slice`].

use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! mesh_index {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(
            Copy,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            bytemuck::Pod,
            bytemuck::Zeroable,
        )]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const KIND: EntityKind = EntityKind::$kind;

            #[inline]
            pub const fn new(raw: u32) -> Self {
                $name(raw)
            }

            /// Raw `u32` value.
            #[inline]
            pub const fn get(self) -> u32 {
                self.0
            }

            /// Position as a `usize`, for indexing into slices.
            #[inline]
            pub const fn idx(self) -> usize {
                self.0 as usize
            }

            /// Build from a `usize` position, failing past the 32-bit range.
            #[inline]
            pub fn try_from_usize(i: usize) -> Result<Self, MeshError> {
                u32::try_from(i)
                    .map($name)
                    .map_err(|_| MeshError::IndexOverflow {
                        kind: EntityKind::$kind,
                        count: i,
                    })
            }

            /// Build from a position already known to fit (mesh sizes are
            /// validated on construction).
            #[inline]
            pub(crate) fn from_usize(i: usize) -> Self {
                debug_assert!(i <= u32::MAX as usize);
                $name(i as u32)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(raw: u32) -> Self {
                $name(raw)
            }
        }

        impl From<$name> for Entity {
            #[inline]
            fn from(i: $name) -> Self {
                Entity::$kind(i)
            }
        }
    };
}

mesh_index!(
    /// A mesh node (vertex).
    NodeIndex,
    Node
);
mesh_index!(
    /// A 1D entity: an edge of a 2D/3D mesh or an element of a curve mesh.
    EdgeIndex,
    Edge
);
mesh_index!(
    /// A 2D entity: a face of a volume mesh or an element of a surface mesh.
    FaceIndex,
    Face
);
mesh_index!(
    /// A 3D element.
    CellIndex,
    Cell
);
mesh_index!(
    /// The mesh's top-dimensional element, whatever its dimension.
    ElemIndex,
    Elem
);
mesh_index!(
    /// An element's boundary entity: faces in 3D, edges in 2D, nodes in 1D.
    DElemIndex,
    DElem
);

static_assertions::assert_eq_size!(NodeIndex, u32);
static_assertions::assert_eq_size!(ElemIndex, u32);
static_assertions::assert_eq_size!(Option<ElemIndex>, u64);

/// Entity kinds addressable through the virtual mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Node,
    Edge,
    Face,
    Cell,
    Elem,
    DElem,
}

/// A typed index of any kind, used as the "of" argument of connectivity queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    Node(NodeIndex),
    Edge(EdgeIndex),
    Face(FaceIndex),
    Cell(CellIndex),
    Elem(ElemIndex),
    DElem(DElemIndex),
}

impl Entity {
    pub fn kind(self) -> EntityKind {
        match self {
            Entity::Node(_) => EntityKind::Node,
            Entity::Edge(_) => EntityKind::Edge,
            Entity::Face(_) => EntityKind::Face,
            Entity::Cell(_) => EntityKind::Cell,
            Entity::Elem(_) => EntityKind::Elem,
            Entity::DElem(_) => EntityKind::DElem,
        }
    }

    #[inline]
    pub fn idx(self) -> usize {
        match self {
            Entity::Node(i) => i.idx(),
            Entity::Edge(i) => i.idx(),
            Entity::Face(i) => i.idx(),
            Entity::Cell(i) => i.idx(),
            Entity::Elem(i) => i.idx(),
            Entity::DElem(i) => i.idx(),
        }
    }

    /// Topological dimension of a dimension-typed entity; `None` for
    /// `Elem`/`DElem`.
    pub fn dimension(self) -> Option<usize> {
        match self {
            Entity::Node(_) => Some(0),
            Entity::Edge(_) => Some(1),
            Entity::Face(_) => Some(2),
            Entity::Cell(_) => Some(3),
            Entity::Elem(_) | Entity::DElem(_) => None,
        }
    }

    /// Dimension-typed entity of dimension `dim` with the same raw index.
    pub fn of_dimension(dim: usize, raw: u32) -> Option<Entity> {
        match dim {
            0 => Some(Entity::Node(NodeIndex(raw))),
            1 => Some(Entity::Edge(EdgeIndex(raw))),
            2 => Some(Entity::Face(FaceIndex(raw))),
            3 => Some(Entity::Cell(CellIndex(raw))),
            _ => None,
        }
    }

    /// Resolve `Elem`/`DElem` against a mesh of dimension `mesh_dim` and reject
    /// entities above the mesh dimension.
    ///
    /// The result is always one of `Node`, `Edge`, `Face`, `Cell`.
    pub fn canonical(self, mesh_dim: usize) -> Result<Entity, MeshError> {
        let unsupported = MeshError::Unsupported {
            query: "entity kind",
            dimension: mesh_dim,
        };
        let resolved = match self {
            Entity::Elem(e) => Entity::of_dimension(mesh_dim, e.0),
            Entity::DElem(d) => match mesh_dim.checked_sub(1) {
                Some(dim) => Entity::of_dimension(dim, d.0),
                None => None,
            },
            other => Some(other),
        };
        match resolved {
            Some(e) if e.dimension().is_some_and(|d| d <= mesh_dim) => Ok(e),
            _ => Err(unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display() {
        let n = NodeIndex::new(7);
        assert_eq!(format!("{n:?}"), "NodeIndex(7)");
        assert_eq!(format!("{n}"), "7");
    }

    #[test]
    fn cast_connectivity_to_raw() {
        let conn = vec![NodeIndex::new(3), NodeIndex::new(1), NodeIndex::new(4)];
        let raw: &[u32] = bytemuck::cast_slice(&conn);
        assert_eq!(raw, &[3, 1, 4]);
    }

    #[test]
    fn try_from_usize_rejects_overflow() {
        assert_eq!(NodeIndex::try_from_usize(5).unwrap(), NodeIndex::new(5));
        let big = u32::MAX as usize + 1;
        assert!(matches!(
            NodeIndex::try_from_usize(big),
            Err(MeshError::IndexOverflow {
                kind: EntityKind::Node,
                ..
            })
        ));
    }

    #[test]
    fn canonical_resolves_elem_and_delem() {
        let e = Entity::Elem(ElemIndex::new(2));
        assert_eq!(e.canonical(3).unwrap(), Entity::Cell(CellIndex::new(2)));
        assert_eq!(e.canonical(2).unwrap(), Entity::Face(FaceIndex::new(2)));
        let d = Entity::DElem(DElemIndex::new(4));
        assert_eq!(d.canonical(3).unwrap(), Entity::Face(FaceIndex::new(4)));
        assert_eq!(d.canonical(1).unwrap(), Entity::Node(NodeIndex::new(4)));
        assert!(d.canonical(0).is_err());
    }

    #[test]
    fn canonical_rejects_entities_above_mesh_dimension() {
        let c = Entity::Cell(CellIndex::new(0));
        assert!(c.canonical(2).is_err());
        let f = Entity::Face(FaceIndex::new(0));
        assert!(f.canonical(1).is_err());
        assert!(f.canonical(3).is_ok());
    }
}
