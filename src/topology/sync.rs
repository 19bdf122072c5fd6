//! Synchronization flags and the explicit cache of derived tables.
//!
//! A mesh stores its primary data (node positions, element connectivity) and
//! lazily derives everything else. Which derived tables exist is never tracked
//! separately from the tables themselves: [`SyncTables::flags`] reads it off the
//! `Option` fields, so a flag cannot claim a table that is not there.

use crate::topology::tables::{
    BoundingBox, EdgeTable, ElemLocateTable, ElemNeighborTable, FaceTable, NodeLocateTable,
    NodeNeighborTable,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not, Sub};

/// Set of derived tables, as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncFlags(u32);

impl SyncFlags {
    pub const NONE: SyncFlags = SyncFlags(0);
    /// Node to incident-element map.
    pub const NODE_NEIGHBORS: SyncFlags = SyncFlags(1 << 0);
    /// Edge table (unique edges, element-to-edge and edge-to-element maps).
    pub const EDGES: SyncFlags = SyncFlags(1 << 1);
    /// Face table (unique faces, element-to-face and face-to-element maps).
    pub const FACES: SyncFlags = SyncFlags(1 << 2);
    /// Element neighbors across each `DElem`.
    pub const ELEM_NEIGHBORS: SyncFlags = SyncFlags(1 << 3);
    /// Whatever table backs the mesh's `DElem` kind.
    pub const DELEMS: SyncFlags = SyncFlags(1 << 4);
    pub const BOUNDING_BOX: SyncFlags = SyncFlags(1 << 5);
    /// Spatial index for closest-node queries.
    pub const NODE_LOCATE: SyncFlags = SyncFlags(1 << 6);
    /// Spatial index for point-in-element queries.
    pub const ELEM_LOCATE: SyncFlags = SyncFlags(1 << 7);

    pub const ALL: SyncFlags = SyncFlags((1 << 8) - 1);

    const NAMES: [(SyncFlags, &'static str); 8] = [
        (SyncFlags::NODE_NEIGHBORS, "NODE_NEIGHBORS"),
        (SyncFlags::EDGES, "EDGES"),
        (SyncFlags::FACES, "FACES"),
        (SyncFlags::ELEM_NEIGHBORS, "ELEM_NEIGHBORS"),
        (SyncFlags::DELEMS, "DELEMS"),
        (SyncFlags::BOUNDING_BOX, "BOUNDING_BOX"),
        (SyncFlags::NODE_LOCATE, "NODE_LOCATE"),
        (SyncFlags::ELEM_LOCATE, "ELEM_LOCATE"),
    ];

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping unknown ones.
    #[inline]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        SyncFlags(bits & Self::ALL.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: SyncFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: SyncFlags) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn insert(&mut self, other: SyncFlags) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: SyncFlags) {
        self.0 &= !other.0;
    }

    /// Table that backs the `DElem` kind of a mesh of dimension `dim`.
    pub const fn delem_table(dim: usize) -> SyncFlags {
        match dim {
            3 => SyncFlags::FACES,
            2 => SyncFlags::EDGES,
            1 => SyncFlags::NODE_NEIGHBORS,
            _ => SyncFlags::NONE,
        }
    }

    /// Expand a request into the concrete tables it needs on a mesh of
    /// dimension `dim`.
    ///
    /// `DELEMS` and `ELEM_NEIGHBORS` pull in the `DElem` table; the locate
    /// structures pull in the bounding box. On a point cloud `DELEMS` has no
    /// backing table and stays in the set, where it is reported unsupported.
    pub fn expand(self, dim: usize) -> SyncFlags {
        let mut out = self;
        if self.intersects(SyncFlags::DELEMS | SyncFlags::ELEM_NEIGHBORS) {
            let delem = SyncFlags::delem_table(dim);
            if delem.is_empty() {
                out.insert(SyncFlags::DELEMS);
            } else {
                out.insert(delem);
                out.remove(SyncFlags::DELEMS);
            }
        }
        if self.intersects(SyncFlags::NODE_LOCATE | SyncFlags::ELEM_LOCATE) {
            out.insert(SyncFlags::BOUNDING_BOX);
        }
        out
    }

    /// Flags a mesh of dimension `dim` can ever hold.
    pub const fn supported(dim: usize) -> SyncFlags {
        match dim {
            0 => SyncFlags(
                SyncFlags::NODE_NEIGHBORS.0
                    | SyncFlags::BOUNDING_BOX.0
                    | SyncFlags::NODE_LOCATE.0
                    | SyncFlags::ELEM_LOCATE.0,
            ),
            1 => SyncFlags(SyncFlags::ALL.0 & !SyncFlags::FACES.0),
            _ => SyncFlags::ALL,
        }
    }

    /// Tables that are the element array itself: edges of a curve mesh, faces
    /// of a surface mesh.
    pub const fn native(dim: usize) -> SyncFlags {
        match dim {
            1 => SyncFlags::EDGES,
            2 => SyncFlags::FACES,
            _ => SyncFlags::NONE,
        }
    }

    /// Add the `DELEMS` alias when the table backing it is present.
    pub fn reported(self, dim: usize) -> SyncFlags {
        let delem = SyncFlags::delem_table(dim);
        if !delem.is_empty() && self.contains(delem) {
            self | SyncFlags::DELEMS
        } else {
            self
        }
    }

    /// Names of the set flags, for diagnostics.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(f, _)| self.contains(*f))
            .map(|(_, n)| n)
    }
}

impl BitOr for SyncFlags {
    type Output = SyncFlags;
    #[inline]
    fn bitor(self, rhs: SyncFlags) -> SyncFlags {
        SyncFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for SyncFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: SyncFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SyncFlags {
    type Output = SyncFlags;
    #[inline]
    fn bitand(self, rhs: SyncFlags) -> SyncFlags {
        SyncFlags(self.0 & rhs.0)
    }
}

impl Sub for SyncFlags {
    type Output = SyncFlags;
    #[inline]
    fn sub(self, rhs: SyncFlags) -> SyncFlags {
        SyncFlags(self.0 & !rhs.0)
    }
}

impl Not for SyncFlags {
    type Output = SyncFlags;
    #[inline]
    fn not(self) -> SyncFlags {
        SyncFlags(!self.0 & Self::ALL.0)
    }
}

impl fmt::Debug for SyncFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("SyncFlags(NONE)");
        }
        f.write_str("SyncFlags(")?;
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}

/// Derived tables of one mesh. Each field is present exactly when its flag is
/// synchronized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncTables {
    pub node_neighbors: Option<NodeNeighborTable>,
    pub edges: Option<EdgeTable>,
    pub faces: Option<FaceTable>,
    pub elem_neighbors: Option<ElemNeighborTable>,
    pub bounding_box: Option<BoundingBox>,
    pub node_locate: Option<NodeLocateTable>,
    pub elem_locate: Option<ElemLocateTable>,
}

impl SyncTables {
    /// Flags whose tables are present.
    pub fn flags(&self) -> SyncFlags {
        let mut f = SyncFlags::NONE;
        let present = [
            (self.node_neighbors.is_some(), SyncFlags::NODE_NEIGHBORS),
            (self.edges.is_some(), SyncFlags::EDGES),
            (self.faces.is_some(), SyncFlags::FACES),
            (self.elem_neighbors.is_some(), SyncFlags::ELEM_NEIGHBORS),
            (self.bounding_box.is_some(), SyncFlags::BOUNDING_BOX),
            (self.node_locate.is_some(), SyncFlags::NODE_LOCATE),
            (self.elem_locate.is_some(), SyncFlags::ELEM_LOCATE),
        ];
        for (is_some, flag) in present {
            if is_some {
                f.insert(flag);
            }
        }
        f
    }

    /// Drop the tables named by `flags`.
    ///
    /// Dropping a table also drops the tables derived from it, so the element
    /// neighbor table never outlives the `DElem` table it was built from.
    pub fn discard(&mut self, flags: SyncFlags, dim: usize) {
        let flags = flags.expand_discard(dim);
        if flags.contains(SyncFlags::NODE_NEIGHBORS) {
            self.node_neighbors = None;
        }
        if flags.contains(SyncFlags::EDGES) {
            self.edges = None;
        }
        if flags.contains(SyncFlags::FACES) {
            self.faces = None;
        }
        if flags.contains(SyncFlags::ELEM_NEIGHBORS) {
            self.elem_neighbors = None;
        }
        if flags.contains(SyncFlags::BOUNDING_BOX) {
            self.bounding_box = None;
        }
        if flags.contains(SyncFlags::NODE_LOCATE) {
            self.node_locate = None;
        }
        if flags.contains(SyncFlags::ELEM_LOCATE) {
            self.elem_locate = None;
        }
    }

    pub fn clear(&mut self) {
        *self = SyncTables::default();
    }
}

impl SyncFlags {
    fn expand_discard(self, dim: usize) -> SyncFlags {
        let mut out = self;
        let delem = SyncFlags::delem_table(dim);
        if self.contains(SyncFlags::DELEMS) {
            out.insert(delem);
        }
        if !delem.is_empty() && out.intersects(delem) {
            out.insert(SyncFlags::ELEM_NEIGHBORS);
        }
        if out.contains(SyncFlags::BOUNDING_BOX) {
            out.insert(SyncFlags::NODE_LOCATE | SyncFlags::ELEM_LOCATE);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_operations() {
        let f = SyncFlags::EDGES | SyncFlags::FACES;
        assert!(f.contains(SyncFlags::EDGES));
        assert!(!f.contains(SyncFlags::EDGES | SyncFlags::NODE_NEIGHBORS));
        assert_eq!(f - SyncFlags::EDGES, SyncFlags::FACES);
        assert_eq!((!f) & f, SyncFlags::NONE);
        assert_eq!(SyncFlags::from_bits_truncate(u32::MAX), SyncFlags::ALL);
    }

    #[test]
    fn expand_maps_delems_by_dimension() {
        let f = SyncFlags::ELEM_NEIGHBORS.expand(3);
        assert_eq!(f, SyncFlags::ELEM_NEIGHBORS | SyncFlags::FACES);
        assert_eq!(SyncFlags::DELEMS.expand(2), SyncFlags::EDGES);
        assert_eq!(SyncFlags::DELEMS.expand(1), SyncFlags::NODE_NEIGHBORS);
        assert_eq!(SyncFlags::DELEMS.expand(0), SyncFlags::DELEMS);
        assert_eq!(
            SyncFlags::ELEM_LOCATE.expand(3),
            SyncFlags::ELEM_LOCATE | SyncFlags::BOUNDING_BOX
        );
    }

    #[test]
    fn support_by_dimension() {
        assert!(!SyncFlags::supported(0).contains(SyncFlags::EDGES));
        assert!(!SyncFlags::supported(1).contains(SyncFlags::FACES));
        assert!(SyncFlags::supported(1).contains(SyncFlags::ELEM_NEIGHBORS));
        assert_eq!(SyncFlags::supported(3), SyncFlags::ALL);
        assert_eq!(SyncFlags::native(2), SyncFlags::FACES);
        let r = SyncFlags::EDGES.reported(2);
        assert!(r.contains(SyncFlags::DELEMS));
        assert!(!SyncFlags::EDGES.reported(3).contains(SyncFlags::DELEMS));
    }

    #[test]
    fn debug_lists_names() {
        let f = SyncFlags::EDGES | SyncFlags::BOUNDING_BOX;
        assert_eq!(format!("{f:?}"), "SyncFlags(EDGES | BOUNDING_BOX)");
        assert_eq!(format!("{:?}", SyncFlags::NONE), "SyncFlags(NONE)");
    }

    #[test]
    fn empty_tables_report_no_flags() {
        let t = SyncTables::default();
        assert_eq!(t.flags(), SyncFlags::NONE);
    }

    #[test]
    fn discard_cascades_to_dependents() {
        let mut t = SyncTables {
            bounding_box: Some(BoundingBox::empty()),
            elem_locate: Some(ElemLocateTable::default()),
            ..Default::default()
        };
        t.discard(SyncFlags::BOUNDING_BOX, 3);
        assert_eq!(t.flags(), SyncFlags::NONE);
    }
}
