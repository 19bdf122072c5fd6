//! Element families supported by the basis evaluator and the virtual mesh.

use serde::{Deserialize, Serialize};

/// Topological shape category of a mesh element.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum ElementFamily {
    /// 0D point cloud element.
    #[default]
    Point,
    /// 1D segment.
    Curve,
    /// 2D simplex.
    Triangle,
    /// 2D tensor-product cell.
    Quad,
    /// 3D simplex.
    Tet,
    /// 3D tensor-product cell.
    Hex,
    /// 3D wedge: a triangle extruded along the third axis.
    Prism,
}

/// How the shape functions of a family are built.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Construction {
    Point,
    Simplex,
    Tensor,
    Wedge,
}

impl ElementFamily {
    pub const ALL: [ElementFamily; 7] = [
        ElementFamily::Point,
        ElementFamily::Curve,
        ElementFamily::Triangle,
        ElementFamily::Quad,
        ElementFamily::Tet,
        ElementFamily::Hex,
        ElementFamily::Prism,
    ];

    /// Topological (and parametric) dimension.
    pub fn dimension(self) -> usize {
        match self {
            ElementFamily::Point => 0,
            ElementFamily::Curve => 1,
            ElementFamily::Triangle | ElementFamily::Quad => 2,
            ElementFamily::Tet | ElementFamily::Hex | ElementFamily::Prism => 3,
        }
    }

    pub(crate) fn construction(self) -> Construction {
        match self {
            ElementFamily::Point => Construction::Point,
            ElementFamily::Triangle | ElementFamily::Tet => Construction::Simplex,
            ElementFamily::Curve | ElementFamily::Quad | ElementFamily::Hex => {
                Construction::Tensor
            }
            ElementFamily::Prism => Construction::Wedge,
        }
    }
}
