//! Convex regions in half-space form.
//!
//! Conventions
//! - Rows of `a` are not normalized; membership is `a·x <= b + eps`.
//! - Dimension is fixed per polytope; a graph requires all regions to agree.

use nalgebra::{DMatrix, DVector};

use crate::error::{GcsError, Result};

/// Membership tolerance used when none is given.
pub(crate) const FEAS_EPS: f64 = 1e-9;

/// Convex polytope `{x : A x <= b}`.
///
/// Invariants:
/// - `a.nrows() == b.len()`, all entries finite.
/// - `a.ncols()` is the ambient dimension (at least 1).
#[derive(Clone, Debug, PartialEq)]
pub struct HPolytope {
    a: DMatrix<f64>,
    b: DVector<f64>,
}

impl HPolytope {
    pub fn new(a: DMatrix<f64>, b: DVector<f64>) -> Result<Self> {
        if a.nrows() != b.len() {
            return Err(GcsError::DimensionMismatch {
                expected: a.nrows(),
                got: b.len(),
            });
        }
        if a.ncols() == 0 {
            return Err(GcsError::MalformedGraph(
                "region has zero ambient dimension".into(),
            ));
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err(GcsError::MalformedGraph(
                "region has non-finite coefficients".into(),
            ));
        }
        Ok(Self { a, b })
    }

    /// Axis-aligned box `lo <= x <= hi`.
    pub fn from_box(lo: &[f64], hi: &[f64]) -> Result<Self> {
        if lo.len() != hi.len() {
            return Err(GcsError::DimensionMismatch {
                expected: lo.len(),
                got: hi.len(),
            });
        }
        let n = lo.len();
        let mut a = DMatrix::zeros(2 * n, n);
        let mut b = DVector::zeros(2 * n);
        for d in 0..n {
            if lo[d] > hi[d] {
                return Err(GcsError::MalformedGraph(format!(
                    "empty box in dimension {d}: [{}, {}]",
                    lo[d], hi[d]
                )));
            }
            a[(2 * d, d)] = 1.0;
            b[2 * d] = hi[d];
            a[(2 * d + 1, d)] = -1.0;
            b[2 * d + 1] = -lo[d];
        }
        Self::new(a, b)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.a.ncols()
    }

    #[inline]
    pub fn num_halfspaces(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    #[inline]
    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    /// Largest violation `max_i (a_i·x - b_i)`, clamped at 0.
    pub fn violation(&self, x: &DVector<f64>) -> Result<f64> {
        if x.len() != self.dim() {
            return Err(GcsError::DimensionMismatch {
                expected: self.dim(),
                got: x.len(),
            });
        }
        Ok((&self.a * x - &self.b)
            .iter()
            .fold(0.0_f64, |acc, r| acc.max(*r)))
    }

    /// False for points of the wrong dimension.
    pub fn contains_eps(&self, x: &DVector<f64>, eps: f64) -> bool {
        self.violation(x).is_ok_and(|v| v <= eps)
    }

    #[inline]
    pub fn contains(&self, x: &DVector<f64>) -> bool {
        self.contains_eps(x, FEAS_EPS)
    }
}
