//! Polynomial order of a basis.

use serde::{Deserialize, Serialize};

/// Order of the shape functions carried by a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasisOrder {
    /// One constant function per element.
    Constant,
    /// Vertex (Lagrange) functions.
    #[default]
    Linear,
    /// Vertex plus edge-interior nodes.
    Quadratic,
    /// Cubic Hermite: vertex values plus parametric derivatives.
    Cubic,
    /// Cubic Hermite with derivative components scaled per element.
    CubicScaleFactors,
}

impl BasisOrder {
    pub const ALL: [BasisOrder; 5] = [
        BasisOrder::Constant,
        BasisOrder::Linear,
        BasisOrder::Quadratic,
        BasisOrder::Cubic,
        BasisOrder::CubicScaleFactors,
    ];

    #[inline]
    pub fn polynomial_order(self) -> usize {
        match self {
            BasisOrder::Constant => 0,
            BasisOrder::Linear => 1,
            BasisOrder::Quadratic => 2,
            BasisOrder::Cubic | BasisOrder::CubicScaleFactors => 3,
        }
    }

    #[inline]
    pub fn is_hermite(self) -> bool {
        matches!(self, BasisOrder::Cubic | BasisOrder::CubicScaleFactors)
    }

    #[inline]
    pub fn uses_scale_factors(self) -> bool {
        self == BasisOrder::CubicScaleFactors
    }
}
