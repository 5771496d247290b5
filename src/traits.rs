//! Core traits for linear algebra operations
//!
//! This module defines the fundamental abstractions used throughout the crate:
//! - [`Scalar`]: Trait for matrix entry types (f64 or f32)
//! - [`LinearOperator`]: Trait for matrix-like objects that can perform matrix-vector products
//! - [`Precondition`]: Trait for preconditioning operations

use crate::error::AmgError;
use ndarray::Array1;
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;
use std::iter::Sum;

/// Trait for scalar types that can be used as matrix entries.
///
/// Implemented for `f64` (default for PDE discretizations) and `f32`
/// (memory-constrained applications).
pub trait Scalar:
    Float + NumAssign + FromPrimitive + ToPrimitive + Sum + Send + Sync + Debug + Default + 'static
{
    /// Threshold below which a value is treated as numerically zero
    fn breakdown_tol() -> Self {
        Self::from_f64(1e-30).unwrap_or_else(Self::zero)
    }
}

impl Scalar for f64 {}

impl Scalar for f32 {
    fn breakdown_tol() -> Self {
        1e-20
    }
}

/// Trait for linear operators (matrices) that can perform matrix-vector products.
///
/// This abstraction allows iterative solvers to work with sparse matrices and
/// matrix-free operators interchangeably.
pub trait LinearOperator<S: Scalar>: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<S>) -> Array1<S>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Trait for preconditioners used by the outer Krylov solvers.
///
/// `apply` approximately solves `A x = rhs` and is invoked once per outer
/// iteration. Implementations may reuse internal scratch storage between
/// calls, hence `&mut self`; callers must serialize applications on a single
/// preconditioner instance.
pub trait Precondition<S: Scalar>: Send {
    /// Apply the preconditioner: x ≈ A⁻¹ rhs
    fn apply(&mut self, rhs: &Array1<S>, x: &mut Array1<S>) -> Result<(), AmgError>;
}

/// Identity preconditioner (no preconditioning)
#[derive(Clone, Debug, Default)]
pub struct IdentityPrecond;

impl<S: Scalar> Precondition<S> for IdentityPrecond {
    fn apply(&mut self, rhs: &Array1<S>, x: &mut Array1<S>) -> Result<(), AmgError> {
        if rhs.len() != x.len() {
            return Err(AmgError::DimensionMismatch {
                expected: rhs.len(),
                got: x.len(),
            });
        }
        x.assign(rhs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_precondition() {
        let mut precond = IdentityPrecond;
        let r = array![1.0_f64, -2.0, 3.5];
        let mut x = Array1::zeros(3);
        precond.apply(&r, &mut x).unwrap();
        assert_eq!(r, x);
    }

    #[test]
    fn test_identity_shape_mismatch() {
        let mut precond = IdentityPrecond;
        let r = array![1.0_f64, 2.0];
        let mut x = Array1::zeros(3);
        assert!(Precondition::<f64>::apply(&mut precond, &r, &mut x).is_err());
    }
}
