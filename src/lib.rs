#![cfg_attr(docsrs, feature(doc_cfg))]
//! # vmesh
//!
//! vmesh is a virtual mesh core for scientific computing: one object-safe query
//! surface over concrete mesh storage, derived connectivity that is built
//! lazily and cached explicitly, and closed-form finite-element basis weights
//! for every supported element family.
//!
//! ## Features
//! - [`VirtualMesh`](vmesh::VirtualMesh) trait and the non-owning
//!   [`VirtualMeshAdapter`](vmesh::VirtualMeshAdapter) over any
//!   [`ConcreteMesh`](mesh::ConcreteMesh)
//! - Synchronization flags backed by an explicit table cache
//!   ([`SyncTables`](topology::SyncTables)): a flag is set exactly when its
//!   table exists
//! - Constant, linear, quadratic and cubic Hermite bases (with optional
//!   per-element scale factors) on points, curves, triangles, quads,
//!   tetrahedra, hexahedra and prisms
//! - Element geometry: Jacobians, Newton inverse mapping, point location
//! - Index-based unstructured meshes, a closed-form hexahedral lattice, and
//!   structured box generators
//! - Facade iterators over nodes, edges, faces and cells
//!
//! ## Usage
//!
//! ```ignore
//! use vmesh::prelude::*;
//!
//! let mesh = meshgen::box_hex([2, 2, 2], [0.0; 3], [1.0; 3], MeshGenOptions::default())?;
//! let vm = VirtualMeshAdapter::new(&mesh)?;
//! vm.synchronize(SyncFlags::ELEM_NEIGHBORS);
//! let w = vm.weights(&[0.5, 0.5, 0.5])?;
//! ```
//!
//! Optional Cargo features: `rayon` (parallel batch weight evaluation) and
//! `strict-invariants` (table invariant checks in release builds).
//!
//! ## Logging
//! The crate logs through the [`log`] facade and never installs a logger:
//! table builds and discards at `debug`, no-op synchronization at `trace`,
//! non-manifold faces and non-converging inverse maps at `warn`.

pub mod basis;
pub mod config;
pub mod debug_invariants;
pub mod geometry;
pub mod mesh;
pub mod mesh_error;
pub mod topology;
pub mod vmesh;

pub use debug_invariants::DebugInvariants;
pub use mesh_error::MeshError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::basis::{
        Basis, BasisOrder, SamplingScheme, SchemeKind, ScaleFactorTable, UnitElement,
    };
    pub use crate::config::{
        AdapterOptions, LocateOptions, MeshGenOptions, NonManifoldHandling, SyncOptions,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::Point;
    pub use crate::mesh::{ConcreteMesh, LatticeMesh, MeshQueries, UnstructuredMesh, meshgen};
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::tables::BoundingBox;
    pub use crate::topology::{
        CellIndex, DElemIndex, EdgeIndex, ElemIndex, ElementFamily, Entity, EntityKind,
        FaceIndex, InvalidateCache, NodeIndex, SyncFlags, SyncTables,
    };
    pub use crate::vmesh::{
        ClosestElem, MeshFacade, SmartMeshIterator, TopologyInfo, VirtualMesh,
        VirtualMeshAdapter, VirtualMeshExt,
    };
}
