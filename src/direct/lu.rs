//! Dense LU decomposition
//!
//! LU factorization with partial pivoting, used as the direct solver for the
//! coarsest level of the multigrid hierarchy. The coarsest operator is small
//! by construction, so a dense factorization is the right tool.

use crate::sparse::CsrMatrix;
use crate::traits::Scalar;
use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors that can occur during LU factorization
#[derive(Error, Debug)]
pub enum LuError {
    #[error("matrix is singular or nearly singular")]
    SingularMatrix,
    #[error("matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// LU factorization with partial pivoting
///
/// L is unit lower triangular and stored below the diagonal of `lu`;
/// U occupies the diagonal and above.
#[derive(Debug, Clone)]
pub struct DenseLu<S: Scalar> {
    lu: Array2<S>,
    pivots: Vec<usize>,
    n: usize,
}

impl<S: Scalar> DenseLu<S> {
    /// Factorize a dense square matrix
    pub fn factorize(a: &Array2<S>) -> Result<Self, LuError> {
        let n = a.nrows();
        if n != a.ncols() {
            return Err(LuError::DimensionMismatch {
                expected: n,
                got: a.ncols(),
            });
        }

        let mut lu = a.clone();
        let mut pivots: Vec<usize> = (0..n).collect();

        for k in 0..n {
            // Find pivot
            let mut max_val = lu[[k, k]].abs();
            let mut max_row = k;

            for i in (k + 1)..n {
                let val = lu[[i, k]].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            if max_val < S::breakdown_tol() {
                return Err(LuError::SingularMatrix);
            }

            if max_row != k {
                for j in 0..n {
                    let tmp = lu[[k, j]];
                    lu[[k, j]] = lu[[max_row, j]];
                    lu[[max_row, j]] = tmp;
                }
                pivots.swap(k, max_row);
            }

            // Compute multipliers and eliminate
            let pivot = lu[[k, k]];
            for i in (k + 1)..n {
                let mult = lu[[i, k]] / pivot;
                lu[[i, k]] = mult;

                for j in (k + 1)..n {
                    let update = mult * lu[[k, j]];
                    lu[[i, j]] -= update;
                }
            }
        }

        Ok(Self { lu, pivots, n })
    }

    /// Factorize the dense form of a sparse matrix
    pub fn from_csr(a: &CsrMatrix<S>) -> Result<Self, LuError> {
        Self::factorize(&a.to_dense())
    }

    /// Matrix dimension
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Solve Ax = b into a caller-provided vector
    pub fn solve_into(&self, b: &Array1<S>, x: &mut Array1<S>) -> Result<(), LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }
        if x.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: x.len(),
            });
        }

        x.assign(b);

        // Apply row permutations
        for i in 0..self.n {
            let pivot = self.pivots[i];
            if pivot != i {
                x.swap(i, pivot);
            }
        }

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                x[i] = x[i] - l_ij * x[j];
            }
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                let u_ij = self.lu[[i, j]];
                x[i] = x[i] - u_ij * x[j];
            }
            x[i] = x[i] / self.lu[[i, i]];
        }

        Ok(())
    }

    /// Solve Ax = b, returning the solution
    pub fn solve(&self, b: &Array1<S>) -> Result<Array1<S>, LuError> {
        let mut x = Array1::zeros(self.n);
        self.solve_into(b, &mut x)?;
        Ok(x)
    }
}

/// Solve Ax = b using LU decomposition
///
/// This is a convenience function that combines factorization and solve.
pub fn lu_solve<S: Scalar>(a: &Array2<S>, b: &Array1<S>) -> Result<Array1<S>, LuError> {
    DenseLu::factorize(a)?.solve(b)
}
