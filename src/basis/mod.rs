//! Basis evaluator: shape-function weights and their parametric derivatives
//! for every supported `(family, order)` pair.
//!
//! Evaluation is pure arithmetic on the parametric coordinates. Coordinates
//! are not range checked, so Newton iterations may evaluate outside the
//! reference domain; the result is the polynomial extrapolation and may be
//! non-finite for non-finite input.
//!
//! # Weight layout
//! - Lagrange orders: one weight per node (vertices, then edge nodes in the
//!   unit edge order).
//! - Hermite orders: per vertex, one weight per derivative component, in the
//!   order of [`Basis::hermite_masks`].
//! - Derivative weights: `dimension` blocks of `dofs` entries, block `j` holding
//!   the derivative along parametric axis `j`.

pub mod hermite;
pub mod order;
pub mod prism;
pub mod quadrature;
pub mod scale_factors;
pub mod simplex;
pub mod tensor;
pub mod unit_element;

pub use order::BasisOrder;
pub use quadrature::{SamplingScheme, SchemeKind};
pub use scale_factors::ScaleFactorTable;
pub use unit_element::UnitElement;

use crate::mesh_error::MeshError;
use crate::topology::element::{Construction, ElementFamily};
use serde::{Deserialize, Serialize};

/// A validated `(family, order)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Basis {
    family: ElementFamily,
    order: BasisOrder,
}

/// Basis function tabulation on the reference element.
#[derive(Clone, Debug, PartialEq)]
pub struct BasisTabulation {
    /// Basis values per point: `[point][dof]`.
    pub values: Vec<Vec<f64>>,
    /// Reference gradients per point: `[point][dof][axis]`.
    pub gradients: Vec<Vec<Vec<f64>>>,
}

impl Basis {
    pub fn new(family: ElementFamily, order: BasisOrder) -> Result<Self, MeshError> {
        let supported = match (family, order) {
            (_, BasisOrder::Constant | BasisOrder::Linear) => true,
            (ElementFamily::Point, _) => false,
            (ElementFamily::Tet, BasisOrder::Cubic | BasisOrder::CubicScaleFactors) => false,
            _ => true,
        };
        if supported {
            Ok(Basis { family, order })
        } else {
            Err(MeshError::UnsupportedBasis { family, order })
        }
    }

    /// Vertex basis of a family; always supported.
    pub fn linear(family: ElementFamily) -> Self {
        Basis {
            family,
            order: BasisOrder::Linear,
        }
    }

    #[inline]
    pub fn family(&self) -> ElementFamily {
        self.family
    }

    #[inline]
    pub fn order(&self) -> BasisOrder {
        self.order
    }

    #[inline]
    pub fn unit(&self) -> &'static UnitElement {
        UnitElement::of(self.family)
    }

    /// Parametric dimension.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.unit().domain_dimension
    }

    /// Derivative components per node, excluding the value itself.
    pub fn num_hderivs(&self) -> usize {
        self.hermite_masks().map_or(0, |m| m.len() - 1)
    }

    /// Per-node derivative masks of Hermite orders.
    pub fn hermite_masks(&self) -> Option<&'static [u8]> {
        if !self.order.is_hermite() {
            return None;
        }
        match self.family.construction() {
            Construction::Point => None,
            Construction::Simplex => Some(&hermite::MASKS_2D),
            Construction::Tensor => Some(tensor::masks(self.dimension())),
            Construction::Wedge => Some(&hermite::MASKS_PRISM),
        }
    }

    /// Edge-interior nodes per element.
    pub fn num_enodes(&self) -> usize {
        match self.order {
            BasisOrder::Quadratic => self.unit().number_of_edges(),
            _ => 0,
        }
    }

    /// Degrees of freedom per element, the length of the weight vector.
    pub fn dofs(&self) -> usize {
        let nv = self.unit().number_of_vertices();
        match self.order {
            BasisOrder::Constant => 1,
            BasisOrder::Linear => nv,
            BasisOrder::Quadratic => nv + self.num_enodes(),
            BasisOrder::Cubic | BasisOrder::CubicScaleFactors => nv * (1 + self.num_hderivs()),
        }
    }

    #[inline]
    pub fn num_weights(&self) -> usize {
        self.dofs()
    }

    #[inline]
    pub fn num_derivative_weights(&self) -> usize {
        self.dofs() * self.dimension()
    }

    fn check_coords(&self, coords: &[f64]) -> Result<(), MeshError> {
        let d = self.dimension();
        if coords.len() < d {
            return Err(MeshError::CoordinateDimension {
                expected: d,
                found: coords.len(),
            });
        }
        Ok(())
    }

    /// Interpolation weights at `coords`. `w` is overwritten.
    pub fn weights(&self, coords: &[f64], w: &mut Vec<f64>) -> Result<(), MeshError> {
        w.clear();
        self.check_coords(coords)?;
        let unit = self.unit();
        let order = self.order;
        match (self.family.construction(), order) {
            (_, BasisOrder::Constant) | (Construction::Point, _) => w.push(1.0),
            (Construction::Simplex, BasisOrder::Linear) => simplex::linear(unit, coords, w),
            (Construction::Simplex, BasisOrder::Quadratic) => simplex::quadratic(unit, coords, w),
            (Construction::Simplex, _) => simplex::tri_cubic(coords, w),
            (Construction::Tensor, BasisOrder::Linear) => tensor::linear(unit, coords, w),
            (Construction::Tensor, BasisOrder::Quadratic) => tensor::quadratic(unit, coords, w),
            (Construction::Tensor, _) => tensor::cubic(unit, coords, w),
            (Construction::Wedge, BasisOrder::Linear) => prism::linear(unit, coords, w),
            (Construction::Wedge, BasisOrder::Quadratic) => prism::quadratic(unit, coords, w),
            (Construction::Wedge, _) => prism::cubic(unit, coords, w),
        }
        Ok(())
    }

    /// Parametric derivative weights at `coords`, one block per axis.
    pub fn derivative_weights(&self, coords: &[f64], w: &mut Vec<f64>) -> Result<(), MeshError> {
        w.clear();
        self.check_coords(coords)?;
        w.resize(self.num_derivative_weights(), 0.0);
        let unit = self.unit();
        match (self.family.construction(), self.order) {
            (_, BasisOrder::Constant) | (Construction::Point, _) => {}
            (Construction::Simplex, BasisOrder::Linear) => {
                simplex::linear_derivatives(unit, coords, w)
            }
            (Construction::Simplex, BasisOrder::Quadratic) => {
                simplex::quadratic_derivatives(unit, coords, w)
            }
            (Construction::Simplex, _) => simplex::tri_cubic_derivatives(coords, w),
            (Construction::Tensor, BasisOrder::Linear) => {
                tensor::linear_derivatives(unit, coords, w)
            }
            (Construction::Tensor, BasisOrder::Quadratic) => {
                tensor::quadratic_derivatives(unit, coords, w)
            }
            (Construction::Tensor, _) => tensor::cubic_derivatives(unit, coords, w),
            (Construction::Wedge, BasisOrder::Linear) => prism::linear_derivatives(unit, coords, w),
            (Construction::Wedge, BasisOrder::Quadratic) => {
                prism::quadratic_derivatives(unit, coords, w)
            }
            (Construction::Wedge, _) => prism::cubic_derivatives(unit, coords, w),
        }
        Ok(())
    }

    /// Fold one element's scale factors into value or derivative weights.
    ///
    /// A no-op unless the order is [`BasisOrder::CubicScaleFactors`].
    pub fn apply_scale_factors(&self, row: &[f64], w: &mut [f64]) -> Result<(), MeshError> {
        if !self.order.uses_scale_factors() {
            return Ok(());
        }
        if row.len() != self.dimension() {
            return Err(MeshError::ScaleFactorArity {
                expected: self.dimension(),
                found: row.len(),
            });
        }
        if let Some(masks) = self.hermite_masks() {
            scale_factors::apply(masks, row, w);
        }
        Ok(())
    }

    /// Evaluate values and gradients at a set of reference points.
    pub fn tabulate<P: AsRef<[f64]>>(&self, points: &[P]) -> Result<BasisTabulation, MeshError> {
        let n = self.dofs();
        let d = self.dimension();
        let mut values = Vec::with_capacity(points.len());
        let mut gradients = Vec::with_capacity(points.len());
        let mut w = Vec::with_capacity(n);
        let mut dw = Vec::with_capacity(n * d);
        for p in points {
            let p = p.as_ref();
            self.weights(p, &mut w)?;
            self.derivative_weights(p, &mut dw)?;
            values.push(w.clone());
            gradients.push((0..n).map(|i| (0..d).map(|j| dw[j * n + i]).collect()).collect());
        }
        Ok(BasisTabulation { values, gradients })
    }

    /// Weights at many points, concatenated: `dofs()` entries per point.
    pub fn weights_batch<P: AsRef<[f64]>>(&self, points: &[P]) -> Result<Vec<f64>, MeshError> {
        let mut out = Vec::with_capacity(points.len() * self.dofs());
        let mut w = Vec::with_capacity(self.dofs());
        for p in points {
            self.weights(p.as_ref(), &mut w)?;
            out.extend_from_slice(&w);
        }
        Ok(out)
    }

    /// Parallel [`weights_batch`](Self::weights_batch).
    #[cfg(feature = "rayon")]
    pub fn weights_batch_par<P>(&self, points: &[P]) -> Result<Vec<f64>, MeshError>
    where
        P: AsRef<[f64]> + Sync,
    {
        use rayon::prelude::*;
        let n = self.dofs();
        let mut out = vec![0.0; points.len() * n];
        out.par_chunks_mut(n.max(1))
            .zip(points.par_iter())
            .try_for_each_init(
                || Vec::with_capacity(n),
                |w, (chunk, p)| {
                    self.weights(p.as_ref(), w)?;
                    chunk.copy_from_slice(w);
                    Ok::<(), MeshError>(())
                },
            )?;
        Ok(out)
    }
}
