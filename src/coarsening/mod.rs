//! Coarsening strategies
//!
//! A coarsening strategy turns a fine-level operator into a pair of transfer
//! operators `(P, R)` and a coarse-level operator. Two aggregation-based
//! strategies are provided:
//!
//! - [`Aggregation`]: plain (unsmoothed) aggregation; cheapest setup
//! - [`SmoothedAggregation`]: Jacobi-smoothed tentative prolongation; the
//!   default choice for elliptic problems
//!
//! Both set `R = P^T`. User strategies only need to implement
//! [`Coarsening::transfer_operators`]; the Galerkin coarse operator
//! `A_c = R·A·P` is supplied as the default [`Coarsening::coarse_operator`].

mod aggregation;
mod smoothed;

pub use aggregation::Aggregation;
pub use smoothed::SmoothedAggregation;

use crate::error::AmgError;
use crate::sparse::CsrMatrix;
use crate::traits::Scalar;

/// Strategy for building one level of the hierarchy.
pub trait Coarsening<S: Scalar>: Send + Sync {
    /// Produce prolongation `P: n×m` and restriction `R: m×n` for `A: n×n`.
    ///
    /// A strategy signals an unusable input by returning `P` with zero
    /// columns; the engine turns that into
    /// [`AmgError::DegenerateCoarsening`].
    fn transfer_operators(
        &self,
        a: &CsrMatrix<S>,
    ) -> Result<(CsrMatrix<S>, CsrMatrix<S>), AmgError>;

    /// Produce the coarse-level operator `A_c: m×m`.
    ///
    /// The default is the Galerkin operator `R·A·P`.
    fn coarse_operator(
        &self,
        a: &CsrMatrix<S>,
        p: &CsrMatrix<S>,
        r: &CsrMatrix<S>,
    ) -> CsrMatrix<S> {
        r.matmul(&a.matmul(p))
    }
}
