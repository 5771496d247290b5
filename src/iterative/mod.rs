//! Iterative solvers for linear systems
//!
//! Krylov subspace methods used as the outer loop around the multigrid
//! preconditioner:
//! - [`cg`] / [`cg_preconditioned`]: Conjugate Gradient, for symmetric
//!   positive definite systems
//! - [`bicgstab`] / [`bicgstab_preconditioned`]: BiCGStab, for general
//!   systems

mod bicgstab;
mod cg;

pub use bicgstab::{bicgstab, bicgstab_preconditioned, BiCgstabConfig, BiCgstabSolution};
pub use cg::{cg, cg_preconditioned, CgConfig, CgSolution};
