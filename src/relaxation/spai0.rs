//! SPAI-0 relaxation
//!
//! Sparse approximate inverse of order zero: the diagonal matrix M
//! minimizing ||I - M·A|| over diagonal M, given by
//! `m_i = a_ii / Σ_j a_ij²`. One sweep computes
//! `x ← x + M ∘ (rhs − A·x)`.

use super::Relaxation;
use crate::backend::Backend;
use crate::error::AmgError;
use crate::parallel::parallel_map_indexed;
use crate::sparse::CsrMatrix;
use crate::traits::Scalar;
use num_traits::{One, Zero};

/// SPAI-0 smoother state: the diagonal approximate inverse
pub struct Spai0<B: Backend> {
    m: B::Vector,
}

/// SPAI-0 has no tunable parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Spai0Params;

impl<B: Backend> Spai0<B> {
    fn sweep(&self, a: &B::Matrix, rhs: &B::Vector, x: &mut B::Vector, tmp: &mut B::Vector) {
        B::residual(rhs, a, x, tmp);
        B::vmul(B::Scalar::one(), &self.m, tmp, B::Scalar::one(), x);
    }
}

impl<B: Backend> Relaxation<B> for Spai0<B> {
    type Params = Spai0Params;

    fn new(
        a: &CsrMatrix<B::Scalar>,
        _prm: &Spai0Params,
        backend_prm: &B::Params,
    ) -> Result<Self, AmgError> {
        let m: Vec<B::Scalar> = parallel_map_indexed(a.num_rows, |i| {
            let mut num = B::Scalar::zero();
            let mut den = B::Scalar::zero();
            for (j, v) in a.row_entries(i) {
                den += v * v;
                if j == i {
                    num += v;
                }
            }
            if den <= B::Scalar::breakdown_tol() {
                // Isolated empty row: leave it untouched by the smoother
                log::warn!("spai0: zero row norm at row {i}, disabling relaxation there");
                B::Scalar::zero()
            } else {
                num / den
            }
        });

        Ok(Self {
            m: B::copy_vector(&m, backend_prm)?,
        })
    }

    fn apply_pre(
        &self,
        a: &B::Matrix,
        rhs: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
        _prm: &Spai0Params,
    ) {
        self.sweep(a, rhs, x, tmp);
    }

    fn apply_post(
        &self,
        a: &B::Matrix,
        rhs: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
        _prm: &Spai0Params,
    ) {
        self.sweep(a, rhs, x, tmp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NativeBackend, NativeBackendParams};
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};

    type B = NativeBackend<f64>;

    #[test]
    fn test_spai0_diagonal_values() {
        // Row 0: [2, -1] → m_0 = 2 / (4 + 1) = 0.4
        let a = CsrMatrix::from_dense(&array![[2.0_f64, -1.0], [-1.0, 2.0]], 1e-15);
        let relax: Spai0<B> = Relaxation::new(&a, &Spai0Params, &NativeBackendParams).unwrap();

        assert_relative_eq!(relax.m[0], 0.4, epsilon = 1e-15);
        assert_relative_eq!(relax.m[1], 0.4, epsilon = 1e-15);
    }

    #[test]
    fn test_spai0_zero_row_is_contained() {
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 4.0_f64)]);
        let relax: Spai0<B> = Relaxation::new(&a, &Spai0Params, &NativeBackendParams).unwrap();

        assert_relative_eq!(relax.m[0], 0.25, epsilon = 1e-15);
        assert_relative_eq!(relax.m[1], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_spai0_sweep_reduces_residual() {
        let a = CsrMatrix::from_dense(
            &array![[4.0_f64, -1.0, 0.0], [-1.0, 4.0, -1.0], [0.0, -1.0, 4.0]],
            1e-15,
        );
        let relax: Spai0<B> = Relaxation::new(&a, &Spai0Params, &NativeBackendParams).unwrap();

        let rhs = array![1.0_f64, 2.0, 3.0];
        let mut x = Array1::zeros(3);
        let mut tmp = Array1::zeros(3);

        let r0 = {
            let mut r = Array1::zeros(3);
            B::residual(&rhs, &a, &x, &mut r);
            r.iter().map(|v| v * v).sum::<f64>().sqrt()
        };

        for _ in 0..5 {
            relax.apply_pre(&a, &rhs, &mut x, &mut tmp, &Spai0Params);
        }

        let r1 = {
            let mut r = Array1::zeros(3);
            B::residual(&rhs, &a, &x, &mut r);
            r.iter().map(|v| v * v).sum::<f64>().sqrt()
        };

        assert!(r1 < 0.2 * r0, "smoothing should reduce residual: {r0} -> {r1}");
    }

    #[test]
    fn test_spai0_pre_equals_post() {
        let a = CsrMatrix::from_dense(&array![[2.0_f64, -1.0], [-1.0, 2.0]], 1e-15);
        let relax: Spai0<B> = Relaxation::new(&a, &Spai0Params, &NativeBackendParams).unwrap();

        let rhs = array![1.0_f64, 0.0];
        let mut tmp = Array1::zeros(2);

        let mut x_pre = Array1::zeros(2);
        relax.apply_pre(&a, &rhs, &mut x_pre, &mut tmp, &Spai0Params);

        let mut x_post = Array1::zeros(2);
        relax.apply_post(&a, &rhs, &mut x_post, &mut tmp, &Spai0Params);

        assert_eq!(x_pre, x_post);
    }
}
