//! Option structs for synchronization, point location, adapters and
//! generators.

use crate::basis::BasisOrder;
use crate::topology::sync::SyncFlags;
use serde::{Deserialize, Serialize};

/// Behavior when a face is shared by more than two elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonManifoldHandling {
    /// Keep the first two elements, say nothing.
    Ignore,
    /// Keep the first two elements and log a warning.
    #[default]
    Warn,
    /// Fail the face-table build; `synchronize` returns `false`.
    Error,
}

/// Options for building derived tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    pub non_manifold: NonManifoldHandling,
}

/// Newton inverse-mapping parameters for `get_coords` and `locate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocateOptions {
    /// Maximal Newton steps.
    pub max_iterations: usize,
    /// Converged once the parametric update is shorter than this.
    pub tolerance: f64,
    /// Slack on the reference-domain bounds when testing insideness.
    pub inside_tolerance: f64,
}

impl Default for LocateOptions {
    fn default() -> Self {
        LocateOptions {
            max_iterations: 100,
            tolerance: 1e-7,
            inside_tolerance: 1e-7,
        }
    }
}

/// Options for [`VirtualMeshAdapter`](crate::vmesh::VirtualMeshAdapter).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterOptions {
    /// Tables synchronized while constructing the adapter.
    pub eager_sync: SyncFlags,
    pub locate: LocateOptions,
}

/// Options for the structured box generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshGenOptions {
    pub basis_order: BasisOrder,
    pub sync: SyncOptions,
}

impl Default for MeshGenOptions {
    fn default() -> Self {
        MeshGenOptions {
            basis_order: BasisOrder::Linear,
            sync: SyncOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_options_json_round_trip() {
        let opts = AdapterOptions {
            eager_sync: SyncFlags::EDGES | SyncFlags::FACES,
            locate: LocateOptions {
                max_iterations: 25,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&opts).unwrap();
        let back: AdapterOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opts);
    }

    #[test]
    fn defaults() {
        let l = LocateOptions::default();
        assert_eq!(l.max_iterations, 100);
        assert_eq!(l.tolerance, 1e-7);
        assert!(AdapterOptions::default().eager_sync.is_empty());
        assert_eq!(MeshGenOptions::default().basis_order, BasisOrder::Linear);
    }
}
