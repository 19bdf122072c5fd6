//! Per-element scale factors of Hermite bases.
//!
//! A cubic Hermite element stores parametric derivatives at its nodes. When an
//! element is stretched, each derivative component is rescaled by the
//! element's scale factor along every axis it differentiates, so the stored
//! slopes stay in physical units.

use super::hermite::mask_scale;
use crate::mesh_error::MeshError;
use crate::topology::index::ElemIndex;
use serde::{Deserialize, Serialize};

/// One row of `dim` scale factors per element, stored flat.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactorTable {
    dim: usize,
    values: Vec<f64>,
}

impl ScaleFactorTable {
    pub fn new(dim: usize) -> Self {
        ScaleFactorTable {
            dim,
            values: Vec::new(),
        }
    }

    /// Build from a flat array of `dim` entries per element.
    pub fn from_flat(dim: usize, values: Vec<f64>) -> Result<Self, MeshError> {
        if dim == 0 || values.len() % dim != 0 {
            return Err(MeshError::ScaleFactorArity {
                expected: dim,
                found: values.len(),
            });
        }
        Ok(ScaleFactorTable { dim, values })
    }

    /// Uniform factors for `num_elems` elements.
    pub fn uniform(dim: usize, num_elems: usize, scale: f64) -> Self {
        ScaleFactorTable {
            dim,
            values: vec![scale; dim * num_elems],
        }
    }

    pub fn push(&mut self, row: &[f64]) -> Result<(), MeshError> {
        if row.len() != self.dim {
            return Err(MeshError::ScaleFactorArity {
                expected: self.dim,
                found: row.len(),
            });
        }
        self.values.extend_from_slice(row);
        Ok(())
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Number of element rows.
    #[inline]
    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.values.len() / self.dim }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row(&self, elem: ElemIndex) -> Result<&[f64], MeshError> {
        let start = elem.idx() * self.dim;
        self.values
            .get(start..start + self.dim)
            .ok_or(MeshError::MissingScaleFactors { elem: elem.idx() })
    }
}

/// Multiply every weight by the scale of the derivative component it carries.
///
/// `w` is either a value-weight vector or a derivative-weight vector made of
/// per-axis blocks; both repeat the node pattern `masks` throughout.
pub fn apply(masks: &[u8], row: &[f64], w: &mut [f64]) {
    let scales: Vec<f64> = masks.iter().map(|&m| mask_scale(m, row)).collect();
    for chunk in w.chunks_mut(masks.len()) {
        for (wi, s) in chunk.iter_mut().zip(&scales) {
            *wi *= s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::hermite::MASKS_2D;

    #[test]
    fn rows_and_arity() {
        let mut t = ScaleFactorTable::new(2);
        t.push(&[1.0, 2.0]).unwrap();
        t.push(&[3.0, 4.0]).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.row(ElemIndex::new(1)).unwrap(), &[3.0, 4.0]);
        assert!(matches!(
            t.row(ElemIndex::new(2)),
            Err(MeshError::MissingScaleFactors { elem: 2 })
        ));
        assert!(matches!(
            t.push(&[1.0]),
            Err(MeshError::ScaleFactorArity {
                expected: 2,
                found: 1
            })
        ));
        assert!(ScaleFactorTable::from_flat(3, vec![1.0; 4]).is_err());
    }

    #[test]
    fn apply_scales_derivative_components() {
        let mut w = vec![1.0; 8];
        apply(&MASKS_2D, &[2.0, 5.0], &mut w);
        assert_eq!(w, vec![1.0, 2.0, 5.0, 10.0, 1.0, 2.0, 5.0, 10.0]);
    }
}
