//! Direct solvers for linear systems
//!
//! This module provides the dense LU solver used at the coarsest level of
//! the multigrid hierarchy.

mod lu;

pub use lu::{lu_solve, DenseLu, LuError};
