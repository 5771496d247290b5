//! Damped Jacobi relaxation
//!
//! One sweep computes `x ← x + ω·D⁻¹·(rhs − A·x)`. Jacobi needs damping to
//! smooth the oscillatory error components the coarse grid cannot see.

use super::Relaxation;
use crate::backend::Backend;
use crate::error::AmgError;
use crate::parallel::parallel_map_indexed;
use crate::sparse::CsrMatrix;
use num_traits::{Float, FromPrimitive, One, Zero};
use crate::traits::Scalar;

/// Damped Jacobi smoother state: the inverse diagonal of A
pub struct DampedJacobi<B: Backend> {
    dia_inv: B::Vector,
}

/// Damped Jacobi parameters
#[derive(Debug, Clone, Copy)]
pub struct JacobiParams {
    /// Damping factor ω
    pub damping: f64,
}

impl Default for JacobiParams {
    fn default() -> Self {
        Self { damping: 0.72 }
    }
}

impl<B: Backend> DampedJacobi<B> {
    fn sweep(
        &self,
        a: &B::Matrix,
        rhs: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
        prm: &JacobiParams,
    ) {
        let omega = B::Scalar::from_f64(prm.damping).unwrap();
        B::residual(rhs, a, x, tmp);
        B::vmul(omega, &self.dia_inv, tmp, B::Scalar::one(), x);
    }
}

impl<B: Backend> Relaxation<B> for DampedJacobi<B> {
    type Params = JacobiParams;

    fn new(
        a: &CsrMatrix<B::Scalar>,
        _prm: &JacobiParams,
        backend_prm: &B::Params,
    ) -> Result<Self, AmgError> {
        let diag = a.diagonal();
        let dia_inv: Vec<B::Scalar> = parallel_map_indexed(a.num_rows, |i| {
            let d = diag[i];
            if d.abs() <= B::Scalar::breakdown_tol() {
                log::warn!("jacobi: zero diagonal at row {i}, disabling relaxation there");
                B::Scalar::zero()
            } else {
                d.recip()
            }
        });

        Ok(Self {
            dia_inv: B::copy_vector(&dia_inv, backend_prm)?,
        })
    }

    fn apply_pre(
        &self,
        a: &B::Matrix,
        rhs: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
        prm: &JacobiParams,
    ) {
        self.sweep(a, rhs, x, tmp, prm);
    }

    fn apply_post(
        &self,
        a: &B::Matrix,
        rhs: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
        prm: &JacobiParams,
    ) {
        self.sweep(a, rhs, x, tmp, prm);
    }
}
