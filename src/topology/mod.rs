//! Top-level module for mesh topology abstractions.
//!
//! This module provides:
//! - Element families and typed entity indices
//! - Synchronization flags and the explicit cache of derived tables
//! - Builders for edge, face, neighbor and locate tables
//!
//! Meshes own a [`SyncTables`] and build its entries on demand; everything here
//! is independent of any concrete mesh layout.

pub mod cache;
pub mod element;
pub mod index;
pub mod sync;
pub mod tables;

pub use cache::InvalidateCache;
pub use element::ElementFamily;
pub use index::{
    CellIndex, DElemIndex, EdgeIndex, ElemIndex, Entity, EntityKind, FaceIndex, NodeIndex,
};
pub use sync::{SyncFlags, SyncTables};
