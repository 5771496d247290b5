//! Error types surfaced by the AMG engine
//!
//! All errors are reported at construction time or on the failing `apply`;
//! none is retried. Per-row numerical edge cases in the smoothers are
//! contained to that row and never surface here.

use crate::direct::LuError;
use thiserror::Error;

/// Errors produced by hierarchy construction and preconditioner application
#[derive(Error, Debug)]
pub enum AmgError {
    /// The input matrix is not square
    #[error("system matrix must be square: {rows} rows, {cols} columns")]
    NonSquareMatrix { rows: usize, cols: usize },

    /// A right-hand side or solution vector does not match the system size
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Coarsening produced a zero-width prolongation operator.
    ///
    /// Typical cause: a diagonal or disconnected input matrix, where no
    /// strong connections exist and every point ends up isolated.
    #[error("degenerate coarsening at level {level}: prolongation has no columns")]
    DegenerateCoarsening { level: usize },

    /// The coarsest-level factorization failed
    #[error("coarse level direct solver: {0}")]
    DirectSolve(#[from] LuError),

    /// Backend-specific kernel failure, surfaced verbatim
    #[error("backend error: {0}")]
    Backend(String),
}
