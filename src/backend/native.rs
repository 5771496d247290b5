//! Shared-memory CPU backend
//!
//! Stores matrices in CSR format and vectors as `ndarray::Array1`. All
//! per-row kernels are data-parallel over rows when the `rayon` feature is
//! enabled.

use super::{Backend, DirectSolver};
use crate::direct::DenseLu;
use crate::error::AmgError;
use crate::parallel::parallel_for_each_mut;
use crate::sparse::CsrMatrix;
use crate::traits::Scalar;
use ndarray::Array1;
use std::marker::PhantomData;

/// CPU backend over `f64` or `f32` entries
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend<S: Scalar>(PhantomData<S>);

/// Parameters of the CPU backend (none)
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackendParams;

impl<S: Scalar> Backend for NativeBackend<S> {
    type Scalar = S;
    type Matrix = CsrMatrix<S>;
    type Vector = Array1<S>;
    type DirectSolver = DenseLu<S>;
    type Params = NativeBackendParams;

    fn copy_matrix(a: &CsrMatrix<S>, _prm: &NativeBackendParams) -> Result<CsrMatrix<S>, AmgError> {
        Ok(a.clone())
    }

    fn copy_vector(v: &[S], _prm: &NativeBackendParams) -> Result<Array1<S>, AmgError> {
        Ok(Array1::from_vec(v.to_vec()))
    }

    fn create_vector(n: usize, _prm: &NativeBackendParams) -> Result<Array1<S>, AmgError> {
        Ok(Array1::zeros(n))
    }

    fn len(v: &Array1<S>) -> usize {
        v.len()
    }

    fn rows(a: &CsrMatrix<S>) -> usize {
        a.num_rows
    }

    fn nonzeros(a: &CsrMatrix<S>) -> usize {
        a.nnz()
    }

    fn bytes(a: &CsrMatrix<S>) -> usize {
        a.bytes()
    }

    fn spmv(alpha: S, a: &CsrMatrix<S>, x: &Array1<S>, beta: S, y: &mut Array1<S>) {
        debug_assert_eq!(x.len(), a.num_cols);
        debug_assert_eq!(y.len(), a.num_rows);

        let xs = x.as_slice().expect("Array should be contiguous");
        let ys = y.as_slice_mut().expect("Array should be contiguous");

        parallel_for_each_mut(ys, |i, yi| {
            let mut sum = S::zero();
            for idx in a.row_range(i) {
                sum += a.values[idx] * xs[a.col_indices[idx]];
            }
            // beta = 0 overwrites: rows without entries become exactly zero
            *yi = if beta == S::zero() {
                alpha * sum
            } else {
                alpha * sum + beta * *yi
            };
        });
    }

    fn residual(rhs: &Array1<S>, a: &CsrMatrix<S>, x: &Array1<S>, out: &mut Array1<S>) {
        debug_assert_eq!(rhs.len(), a.num_rows);
        debug_assert_eq!(x.len(), a.num_cols);
        debug_assert_eq!(out.len(), a.num_rows);

        let xs = x.as_slice().expect("Array should be contiguous");
        let rs = rhs.as_slice().expect("Array should be contiguous");
        let os = out.as_slice_mut().expect("Array should be contiguous");

        parallel_for_each_mut(os, |i, oi| {
            let mut sum = S::zero();
            for idx in a.row_range(i) {
                sum += a.values[idx] * xs[a.col_indices[idx]];
            }
            *oi = rs[i] - sum;
        });
    }

    fn vmul(alpha: S, d: &Array1<S>, x: &Array1<S>, beta: S, y: &mut Array1<S>) {
        debug_assert_eq!(d.len(), x.len());
        debug_assert_eq!(d.len(), y.len());

        let ds = d.as_slice().expect("Array should be contiguous");
        let xs = x.as_slice().expect("Array should be contiguous");
        let ys = y.as_slice_mut().expect("Array should be contiguous");

        parallel_for_each_mut(ys, |i, yi| {
            *yi = if beta == S::zero() {
                alpha * ds[i] * xs[i]
            } else {
                alpha * ds[i] * xs[i] + beta * *yi
            };
        });
    }

    fn clear(v: &mut Array1<S>) {
        v.fill(S::zero());
    }

    fn copy(src: &Array1<S>, dst: &mut Array1<S>) {
        dst.assign(src);
    }
}

impl<S: Scalar> DirectSolver<NativeBackend<S>> for DenseLu<S> {
    fn new(a: &CsrMatrix<S>, _prm: &NativeBackendParams) -> Result<Self, AmgError> {
        Ok(DenseLu::from_csr(a)?)
    }

    fn solve(&self, rhs: &Array1<S>, x: &mut Array1<S>) {
        self.solve_into(rhs, x)
            .expect("coarse system dimensions are fixed at setup");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    type B = NativeBackend<f64>;

    fn sample_matrix() -> CsrMatrix<f64> {
        CsrMatrix::from_dense(&array![[2.0_f64, -1.0, 0.0], [0.0, 3.0, 0.0]], 1e-15)
    }

    #[test]
    fn test_spmv_overwrites_when_beta_zero() {
        let a = sample_matrix();
        let x = array![1.0_f64, 2.0, 3.0];
        // Stale contents must not leak through with beta = 0
        let mut y = array![f64::NAN, f64::NAN];

        B::spmv(1.0, &a, &x, 0.0, &mut y);

        assert_relative_eq!(y[0], 0.0, epsilon = 1e-15);
        assert_relative_eq!(y[1], 6.0, epsilon = 1e-15);
    }

    #[test]
    fn test_spmv_accumulates() {
        let a = sample_matrix();
        let x = array![1.0_f64, 2.0, 3.0];
        let mut y = array![10.0_f64, 20.0];

        B::spmv(2.0, &a, &x, 0.5, &mut y);

        // y = 2*A*x + 0.5*y = 2*[0, 6] + [5, 10]
        assert_relative_eq!(y[0], 5.0, epsilon = 1e-15);
        assert_relative_eq!(y[1], 22.0, epsilon = 1e-15);
    }

    #[test]
    fn test_residual() {
        let a = CsrMatrix::from_dense(&array![[2.0_f64, -1.0], [-1.0, 2.0]], 1e-15);
        let x = array![1.0_f64, 1.0];
        let rhs = array![1.0_f64, 1.0];
        let mut out = Array1::zeros(2);

        B::residual(&rhs, &a, &x, &mut out);

        // A*[1,1] = [1,1], so the residual vanishes
        assert_relative_eq!(out[0], 0.0, epsilon = 1e-15);
        assert_relative_eq!(out[1], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_vmul() {
        let d = array![1.0_f64, 2.0, 3.0];
        let x = array![4.0_f64, 5.0, 6.0];
        let mut y = array![1.0_f64, 1.0, 1.0];

        B::vmul(2.0, &d, &x, 1.0, &mut y);

        assert_relative_eq!(y[0], 9.0, epsilon = 1e-15);
        assert_relative_eq!(y[1], 21.0, epsilon = 1e-15);
        assert_relative_eq!(y[2], 37.0, epsilon = 1e-15);
    }

    #[test]
    fn test_clear_and_copy() {
        let mut v = array![1.0_f64, 2.0];
        B::clear(&mut v);
        assert_eq!(v, array![0.0, 0.0]);

        let src = array![3.0_f64, 4.0];
        B::copy(&src, &mut v);
        assert_eq!(v, src);
    }

    #[test]
    fn test_direct_solver_contract() {
        let a = CsrMatrix::from_dense(&array![[4.0_f64, 1.0], [1.0, 3.0]], 1e-15);
        let solver =
            <DenseLu<f64> as DirectSolver<B>>::new(&a, &NativeBackendParams).expect("SPD system");

        let rhs = array![1.0_f64, 2.0];
        let mut x = Array1::zeros(2);
        <DenseLu<f64> as DirectSolver<B>>::solve(&solver, &rhs, &mut x);

        let ax = a.matvec(&x);
        assert_relative_eq!(ax[0], rhs[0], epsilon = 1e-12);
        assert_relative_eq!(ax[1], rhs[1], epsilon = 1e-12);

        assert_eq!(<DenseLu<f64> as DirectSolver<B>>::coarse_enough(), 300);
    }
}
