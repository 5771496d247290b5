//! Algebraic multigrid preconditioner for sparse linear systems
//!
//! This crate builds a multigrid hierarchy from the entries of a sparse
//! matrix alone (no geometry) and applies V- or W-cycles through it as a
//! preconditioner for Krylov methods or as a standalone solver.
//!
//! # Features
//!
//! - **AMG engine**: setup and cycling, generic over backend, coarsening and
//!   relaxation strategies
//! - **Coarsening**: plain and smoothed aggregation
//! - **Relaxation**: SPAI-0 and damped Jacobi smoothers
//! - **Outer solvers**: CG and BiCGStab, plain and preconditioned
//! - **Sparse kernels**: CSR storage with sparse products, transpose and
//!   parallel matrix-vector operations
//!
//! # Example
//!
//! ```ignore
//! use amg_solvers::{
//!     cg_preconditioned, AmgConfig, AmgSolver, CgConfig, CsrMatrix, NativeBackend,
//!     SmoothedAggregation, Spai0,
//! };
//!
//! type B = NativeBackend<f64>;
//!
//! let a: CsrMatrix<f64> = assemble_system();
//! let mut amg: AmgSolver<B, SmoothedAggregation, Spai0<B>> =
//!     AmgSolver::new(a.clone(), SmoothedAggregation::default(), AmgConfig::default())?;
//!
//! let solution = cg_preconditioned(&a, &rhs, &mut amg, &CgConfig::default())?;
//! ```

pub mod amg;
pub mod backend;
pub mod blas_helpers;
pub mod coarsening;
pub mod direct;
pub mod error;
pub mod iterative;
pub mod parallel;
pub mod relaxation;
pub mod sparse;
pub mod traits;

// Re-export main types
pub use amg::{AmgConfig, AmgDiagnostics, AmgSolver};
pub use backend::{Backend, DirectSolver, NativeBackend, NativeBackendParams};
pub use coarsening::{Aggregation, Coarsening, SmoothedAggregation};
pub use error::AmgError;
pub use relaxation::{DampedJacobi, JacobiParams, Relaxation, Spai0, Spai0Params};
pub use sparse::CsrMatrix;
pub use traits::{IdentityPrecond, LinearOperator, Precondition, Scalar};

// Re-export iterative solvers
pub use iterative::{
    bicgstab, bicgstab_preconditioned, cg, cg_preconditioned, BiCgstabConfig, BiCgstabSolution,
    CgConfig, CgSolution,
};

// Re-export direct solvers
pub use direct::{lu_solve, DenseLu, LuError};
