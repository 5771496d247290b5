//! Relaxation (smoothing) strategies
//!
//! A relaxation strategy is constructed once per level from the build-side
//! matrix and performs one smoothing sweep per call during cycling. Two
//! diagonal smoothers are provided:
//!
//! - [`Spai0`]: sparse approximate inverse of order zero; the reference
//!   smoother, parameter-free and robust
//! - [`DampedJacobi`]: classical damped Jacobi
//!
//! Both define pre- and post-smoothing through a common sweep, which keeps
//! the cycle a symmetric preconditioner for symmetric inputs.

mod jacobi;
mod spai0;

pub use jacobi::{DampedJacobi, JacobiParams};
pub use spai0::{Spai0, Spai0Params};

use crate::backend::Backend;
use crate::error::AmgError;
use crate::sparse::CsrMatrix;

/// Per-level smoother bound to a backend.
pub trait Relaxation<B: Backend>: Send + Sync + Sized {
    /// Strategy parameters, stored once on the engine
    type Params: Clone + Default + Send + Sync;

    /// Precompute auxiliary data (e.g. a scaling vector) for one level
    fn new(
        a: &CsrMatrix<B::Scalar>,
        prm: &Self::Params,
        backend_prm: &B::Params,
    ) -> Result<Self, AmgError>;

    /// One pre-smoothing sweep on `x`, using `tmp` as scratch
    fn apply_pre(
        &self,
        a: &B::Matrix,
        rhs: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
        prm: &Self::Params,
    );

    /// One post-smoothing sweep on `x`, using `tmp` as scratch
    fn apply_post(
        &self,
        a: &B::Matrix,
        rhs: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
        prm: &Self::Params,
    );
}
