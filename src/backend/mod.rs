//! Backend contract for the multigrid engine
//!
//! A backend bundles a scalar type, matrix and vector storage kinds, the
//! linear-algebra kernels the cycle needs, copy-from-builder factories and a
//! direct solver for the coarsest level. The engine depends only on this
//! contract; [`NativeBackend`] is the shared-memory CPU realization.

mod native;

pub use native::{NativeBackend, NativeBackendParams};

use crate::error::AmgError;
use crate::sparse::CsrMatrix;
use crate::traits::Scalar;

/// Storage and kernel provider for one target device.
///
/// Matrices and vectors are opaque to the engine; every operation it performs
/// on them goes through these associated functions. Hierarchy construction
/// happens on build-side [`CsrMatrix`] values which are then copied into
/// backend storage once per level.
pub trait Backend: Sized + Send + Sync + 'static {
    /// Matrix entry type
    type Scalar: Scalar;
    /// Device-side sparse matrix storage
    type Matrix: Send + Sync;
    /// Device-side dense vector storage
    type Vector: Send + Sync + Default;
    /// Solver for the coarsest-level system
    type DirectSolver: DirectSolver<Self>;
    /// Backend-specific construction parameters
    type Params: Clone + Default + Send + Sync;

    /// Copy a build-side matrix into backend storage
    fn copy_matrix(a: &CsrMatrix<Self::Scalar>, prm: &Self::Params)
        -> Result<Self::Matrix, AmgError>;

    /// Copy a build-side vector into backend storage
    fn copy_vector(v: &[Self::Scalar], prm: &Self::Params) -> Result<Self::Vector, AmgError>;

    /// Allocate a zeroed vector of the given length
    fn create_vector(n: usize, prm: &Self::Params) -> Result<Self::Vector, AmgError>;

    /// Vector length
    fn len(v: &Self::Vector) -> usize;

    /// Number of rows of a stored matrix
    fn rows(a: &Self::Matrix) -> usize;

    /// Number of stored entries of a matrix
    fn nonzeros(a: &Self::Matrix) -> usize;

    /// Storage footprint of a matrix in bytes
    fn bytes(a: &Self::Matrix) -> usize;

    /// y ← α·A·x + β·y. When β = 0, y is overwritten without being read.
    fn spmv(
        alpha: Self::Scalar,
        a: &Self::Matrix,
        x: &Self::Vector,
        beta: Self::Scalar,
        y: &mut Self::Vector,
    );

    /// out ← rhs − A·x
    fn residual(rhs: &Self::Vector, a: &Self::Matrix, x: &Self::Vector, out: &mut Self::Vector);

    /// Elementwise y ← α·d∘x + β·y (diagonal scaling used by relaxation)
    fn vmul(
        alpha: Self::Scalar,
        d: &Self::Vector,
        x: &Self::Vector,
        beta: Self::Scalar,
        y: &mut Self::Vector,
    );

    /// v ← 0
    fn clear(v: &mut Self::Vector);

    /// dst ← src
    fn copy(src: &Self::Vector, dst: &mut Self::Vector);
}

/// Direct solver for the coarsest level of the hierarchy.
///
/// Factorization happens once at setup; [`DirectSolver::solve`] is called
/// once per cycle reaching the terminal level. Factorization failure aborts
/// hierarchy construction.
pub trait DirectSolver<B: Backend>: Send + Sync + Sized {
    /// Factorize the coarsest-level operator
    fn new(a: &CsrMatrix<B::Scalar>, prm: &B::Params) -> Result<Self, AmgError>;

    /// x ← A⁻¹·rhs
    fn solve(&self, rhs: &B::Vector, x: &mut B::Vector);

    /// Default hierarchy termination threshold: coarsening stops once
    /// `rows(A) <= coarse_enough()`.
    fn coarse_enough() -> usize {
        300
    }
}
