//! MeshError: Unified error type for vmesh public APIs
//!
//! Every fallible query in the crate returns this error. Synchronization
//! requests are the exception: they report success as a plain `bool`.

use crate::basis::BasisOrder;
use crate::topology::element::ElementFamily;
use crate::topology::index::EntityKind;
use thiserror::Error;

/// Unified error type for vmesh operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// The `(family, order)` pair has no shape functions.
    #[error("unsupported basis: {order:?} on {family:?}")]
    UnsupportedBasis {
        family: ElementFamily,
        order: BasisOrder,
    },
    /// The basis family does not match the dimensionality the mesh reports.
    #[error("basis {family:?} has dimension {expected}, mesh reports {found}")]
    DimensionMismatch {
        family: ElementFamily,
        expected: usize,
        found: usize,
    },
    /// A query is not defined for a mesh of this dimension.
    #[error("unsupported query `{query}` on a {dimension}D mesh")]
    Unsupported {
        query: &'static str,
        dimension: usize,
    },
    /// A derived table was needed but could not be synchronized.
    #[error("derived table `{0}` is unavailable on this mesh")]
    NotSynchronized(&'static str),
    /// An index does not refer to an entity of this mesh.
    #[error("{kind:?} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: EntityKind,
        index: usize,
        len: usize,
    },
    /// The `DElem` is not part of the given element.
    #[error("delem {delem} is not incident to element {elem}")]
    NotIncident { elem: usize, delem: usize },
    /// Parametric coordinates are shorter than the element dimension.
    #[error("coordinate has {found} components, expected at least {expected}")]
    CoordinateDimension { expected: usize, found: usize },
    /// Element connectivity does not match the family template.
    #[error("element {elem}: expected {expected} nodes, got {found}")]
    ElementArity {
        elem: usize,
        expected: usize,
        found: usize,
    },
    /// A face is shared by more than two elements.
    #[error("face {face} is shared by {incident} elements")]
    NonManifoldFace { face: usize, incident: usize },
    /// Scale-factor basis evaluated without a table entry for the element.
    #[error("no scale factors for element {elem}")]
    MissingScaleFactors { elem: usize },
    /// A scale-factor row has the wrong number of entries.
    #[error("scale-factor row has {found} entries, expected {expected}")]
    ScaleFactorArity { expected: usize, found: usize },
    /// Mesh has more entities than the 32-bit index space holds.
    #[error("{kind:?} count {count} exceeds the index range")]
    IndexOverflow { kind: EntityKind, count: usize },
    /// The mesh cannot be modified through this handle.
    #[error("mesh is not editable")]
    NotEditable,
    /// Invalid input geometry (generator extents, singular Jacobian, ...).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}
