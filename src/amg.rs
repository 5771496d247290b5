//! Algebraic multigrid engine
//!
//! The engine owns a hierarchy of coarse operators built once at
//! construction and cycles through it on every application. It is generic
//! over three strategies:
//!
//! - a [`Backend`] providing storage and kernels,
//! - a [`Coarsening`] strategy producing transfer operators,
//! - a [`Relaxation`] strategy smoothing each level.
//!
//! Setup derives `A_{k+1} = R_k · A_k · P_k` until the operator is small
//! enough for a direct factorization. One cycle descends with pre-smoothing
//! and residual restriction, solves the coarsest system directly, and
//! ascends with prolongation and post-smoothing.
//!
//! ```ignore
//! use amg_solvers::{AmgConfig, AmgSolver, NativeBackend, SmoothedAggregation, Spai0};
//!
//! type B = NativeBackend<f64>;
//! let mut amg: AmgSolver<B, SmoothedAggregation, Spai0<B>> =
//!     AmgSolver::new(matrix, SmoothedAggregation::default(), AmgConfig::default())?;
//! amg.apply(&rhs, &mut x)?;
//! ```

use crate::backend::{Backend, DirectSolver};
use crate::coarsening::Coarsening;
use crate::error::AmgError;
use crate::relaxation::Relaxation;
use crate::sparse::CsrMatrix;
use crate::traits::Scalar;
use num_traits::{One, Zero};
use std::fmt;

/// Cycling parameters of the engine
#[derive(Debug, Clone)]
pub struct AmgConfig {
    /// Stop coarsening once `rows(A) <= coarse_enough`; `None` defers to the
    /// backend's direct solver default
    pub coarse_enough: Option<usize>,
    /// Pre-smoothing sweeps per level per cycle
    pub npre: usize,
    /// Post-smoothing sweeps per level per cycle
    pub npost: usize,
    /// Cycles per level: 1 gives a V-cycle, 2 a W-cycle
    pub ncycle: usize,
    /// Cycles per `apply` call; 0 turns `apply` into the identity
    pub pre_cycles: usize,
}

impl Default for AmgConfig {
    fn default() -> Self {
        Self {
            coarse_enough: None,
            npre: 1,
            npost: 1,
            ncycle: 1,
            pre_cycles: 1,
        }
    }
}

/// One level of the hierarchy.
///
/// Non-terminal levels carry the operator, transfer operators and a smoother;
/// the terminal level carries the direct solver and retains its operator only
/// when it is also the finest level (so `system_matrix` stays available for
/// single-level hierarchies). Scratch vectors are reused across cycles.
struct Level<B: Backend, R> {
    a: Option<B::Matrix>,
    p: Option<B::Matrix>,
    r: Option<B::Matrix>,
    relax: Option<R>,
    direct: Option<B::DirectSolver>,
    f: B::Vector,
    u: B::Vector,
    t: B::Vector,
    rows: usize,
    nonzeros: usize,
    bytes: usize,
}

/// Algebraic multigrid preconditioner / standalone solver
pub struct AmgSolver<B, C, R>
where
    B: Backend,
    C: Coarsening<B::Scalar>,
    R: Relaxation<B>,
{
    levels: Vec<Level<B, R>>,
    prm: AmgConfig,
    relax_prm: R::Params,
    #[allow(dead_code)]
    coarsening: C,
}

impl<B, C, R> AmgSolver<B, C, R>
where
    B: Backend,
    C: Coarsening<B::Scalar>,
    R: Relaxation<B>,
{
    /// Build the hierarchy from the system matrix with default strategy and
    /// backend parameters.
    pub fn new(a: CsrMatrix<B::Scalar>, coarsening: C, prm: AmgConfig) -> Result<Self, AmgError> {
        Self::with_params(a, coarsening, prm, R::Params::default(), B::Params::default())
    }

    /// Build the hierarchy with explicit relaxation and backend parameters.
    ///
    /// The input matrix is consumed; rows are sorted as part of setup.
    pub fn with_params(
        mut a: CsrMatrix<B::Scalar>,
        coarsening: C,
        prm: AmgConfig,
        relax_prm: R::Params,
        backend_prm: B::Params,
    ) -> Result<Self, AmgError> {
        if a.num_rows != a.num_cols {
            return Err(AmgError::NonSquareMatrix {
                rows: a.num_rows,
                cols: a.num_cols,
            });
        }

        let coarse_enough = prm
            .coarse_enough
            .unwrap_or_else(B::DirectSolver::coarse_enough);

        a.sort_rows();

        let mut levels: Vec<Level<B, R>> = Vec::new();
        let mut level = 0usize;

        while a.num_rows > coarse_enough {
            let (p, r) = coarsening.transfer_operators(&a)?;
            if p.num_cols == 0 {
                return Err(AmgError::DegenerateCoarsening { level });
            }
            if p.num_cols >= a.num_rows {
                log::warn!(
                    "coarsening did not reduce level {level} ({} rows), stopping early",
                    a.num_rows
                );
                break;
            }

            let rows = a.num_rows;
            let nonzeros = a.nnz();
            let bytes = a.bytes();
            log::debug!("level {level}: {rows} unknowns, {nonzeros} nonzeros");

            let mut a_coarse = coarsening.coarse_operator(&a, &p, &r);
            a_coarse.sort_rows();

            levels.push(Level {
                relax: Some(R::new(&a, &relax_prm, &backend_prm)?),
                a: Some(B::copy_matrix(&a, &backend_prm)?),
                p: Some(B::copy_matrix(&p, &backend_prm)?),
                r: Some(B::copy_matrix(&r, &backend_prm)?),
                direct: None,
                f: B::create_vector(rows, &backend_prm)?,
                u: B::create_vector(rows, &backend_prm)?,
                t: B::create_vector(rows, &backend_prm)?,
                rows,
                nonzeros,
                bytes,
            });

            a = a_coarse;
            level += 1;
        }

        let rows = a.num_rows;
        let nonzeros = a.nnz();
        let bytes = a.bytes();
        log::debug!("level {level}: {rows} unknowns, {nonzeros} nonzeros (direct)");

        let direct = B::DirectSolver::new(&a, &backend_prm)?;
        let a_terminal = if levels.is_empty() {
            Some(B::copy_matrix(&a, &backend_prm)?)
        } else {
            None
        };

        levels.push(Level {
            a: a_terminal,
            p: None,
            r: None,
            relax: None,
            direct: Some(direct),
            f: B::create_vector(rows, &backend_prm)?,
            u: B::create_vector(rows, &backend_prm)?,
            t: B::Vector::default(),
            rows,
            nonzeros,
            bytes,
        });

        let solver = Self {
            levels,
            prm,
            relax_prm,
            coarsening,
        };
        log::info!(
            "AMG hierarchy: {} levels, operator complexity {:.2}, grid complexity {:.2}",
            solver.num_levels(),
            solver.operator_complexity(),
            solver.grid_complexity()
        );
        Ok(solver)
    }

    /// Number of levels in the hierarchy (finest and terminal included)
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Σ nnz(A_k) / nnz(A_0): memory/work overhead of the hierarchy
    pub fn operator_complexity(&self) -> f64 {
        let fine = self.levels[0].nonzeros as f64;
        self.levels.iter().map(|l| l.nonzeros as f64).sum::<f64>() / fine
    }

    /// Σ rows(A_k) / rows(A_0): dof overhead of the hierarchy
    pub fn grid_complexity(&self) -> f64 {
        let fine = self.levels[0].rows as f64;
        self.levels.iter().map(|l| l.rows as f64).sum::<f64>() / fine
    }

    /// Borrow the finest-level operator
    pub fn system_matrix(&self) -> &B::Matrix {
        self.levels[0]
            .a
            .as_ref()
            .expect("finest level always retains the system matrix")
    }

    /// Structural information about the hierarchy
    pub fn diagnostics(&self) -> AmgDiagnostics {
        AmgDiagnostics {
            num_levels: self.num_levels(),
            grid_complexity: self.grid_complexity(),
            operator_complexity: self.operator_complexity(),
            level_rows: self.levels.iter().map(|l| l.rows).collect(),
            level_nonzeros: self.levels.iter().map(|l| l.nonzeros).collect(),
            level_bytes: self.levels.iter().map(|l| l.bytes).collect(),
        }
    }

    /// Single preconditioner application.
    ///
    /// With `pre_cycles > 0` the solution is zeroed first and that many full
    /// cycles are run from it; with `pre_cycles = 0` the right-hand side is
    /// copied through unchanged (identity fallback for tuning experiments).
    pub fn apply(&mut self, rhs: &B::Vector, x: &mut B::Vector) -> Result<(), AmgError> {
        self.check_dims(rhs, x)?;

        if self.prm.pre_cycles == 0 {
            B::copy(rhs, x);
            return Ok(());
        }

        B::clear(x);
        for _ in 0..self.prm.pre_cycles {
            cycle_levels(&mut self.levels, &self.prm, &self.relax_prm, rhs, x);
        }
        Ok(())
    }

    /// Single cycle without clearing `x`; `x` holds the initial approximation
    /// on input and the improved one on output.
    pub fn cycle(&mut self, rhs: &B::Vector, x: &mut B::Vector) -> Result<(), AmgError> {
        self.check_dims(rhs, x)?;
        cycle_levels(&mut self.levels, &self.prm, &self.relax_prm, rhs, x);
        Ok(())
    }

    fn check_dims(&self, rhs: &B::Vector, x: &B::Vector) -> Result<(), AmgError> {
        let n = self.levels[0].rows;
        if B::len(rhs) != n {
            return Err(AmgError::DimensionMismatch {
                expected: n,
                got: B::len(rhs),
            });
        }
        if B::len(x) != n {
            return Err(AmgError::DimensionMismatch {
                expected: n,
                got: B::len(x),
            });
        }
        Ok(())
    }
}

/// Recursive V/W-cycle over a hierarchy slice; `levels[0]` is the current
/// level. Scratch vectors of the next level are moved out for the recursive
/// call and restored afterwards.
fn cycle_levels<B, R>(
    levels: &mut [Level<B, R>],
    prm: &AmgConfig,
    relax_prm: &R::Params,
    rhs: &B::Vector,
    x: &mut B::Vector,
) where
    B: Backend,
    R: Relaxation<B>,
{
    let one = B::Scalar::one();
    let zero = B::Scalar::zero();

    let (lvl, coarser) = levels
        .split_first_mut()
        .expect("hierarchy has at least one level");

    if coarser.is_empty() {
        lvl.direct
            .as_ref()
            .expect("terminal level has a direct solver")
            .solve(rhs, x);
        return;
    }

    let a = lvl.a.as_ref().expect("non-terminal level has its operator");
    let p = lvl.p.as_ref().expect("non-terminal level has prolongation");
    let r = lvl.r.as_ref().expect("non-terminal level has restriction");
    let relax = lvl.relax.as_ref().expect("non-terminal level has a smoother");
    let t = &mut lvl.t;

    for _ in 0..prm.ncycle {
        for _ in 0..prm.npre {
            relax.apply_pre(a, rhs, x, t, relax_prm);
        }

        B::residual(rhs, a, x, t);

        let mut f = std::mem::take(&mut coarser[0].f);
        let mut u = std::mem::take(&mut coarser[0].u);

        B::spmv(one, r, t, zero, &mut f);
        B::clear(&mut u);
        cycle_levels(coarser, prm, relax_prm, &f, &mut u);
        B::spmv(one, p, &u, one, x);

        coarser[0].f = f;
        coarser[0].u = u;

        for _ in 0..prm.npost {
            relax.apply_post(a, rhs, x, t, relax_prm);
        }
    }
}

/// Structural information about a built hierarchy
#[derive(Debug, Clone)]
pub struct AmgDiagnostics {
    /// Number of levels
    pub num_levels: usize,
    /// Σ rows(A_k) / rows(A_0)
    pub grid_complexity: f64,
    /// Σ nnz(A_k) / nnz(A_0)
    pub operator_complexity: f64,
    /// Unknowns per level, finest first
    pub level_rows: Vec<usize>,
    /// Stored entries per level
    pub level_nonzeros: Vec<usize>,
    /// Matrix storage per level in bytes
    pub level_bytes: Vec<usize>,
}

impl fmt::Display for AmgDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "number of levels:    {}", self.num_levels)?;
        writeln!(f, "operator complexity: {:.2}", self.operator_complexity)?;
        writeln!(f, "grid complexity:     {:.2}", self.grid_complexity)?;
        writeln!(f)?;
        writeln!(f, "level     unknowns       nonzeros")?;
        writeln!(f, "---------------------------------")?;

        let sum_nnz: usize = self.level_nonzeros.iter().sum();
        for (lvl, (&rows, &nnz)) in self
            .level_rows
            .iter()
            .zip(self.level_nonzeros.iter())
            .enumerate()
        {
            writeln!(
                f,
                "{lvl:>5}{rows:>13}{nnz:>15} ({:>5.2}%)",
                100.0 * nnz as f64 / sum_nnz as f64
            )?;
        }
        Ok(())
    }
}

mod native_ext {
    //! CPU-side conveniences: standalone solve loop and the preconditioner
    //! hook the outer Krylov solvers call.

    use super::*;
    use crate::backend::NativeBackend;
    use crate::blas_helpers::vector_norm;
    use crate::traits::Precondition;
    use ndarray::Array1;

    impl<S, C, R> AmgSolver<NativeBackend<S>, C, R>
    where
        S: Scalar,
        C: Coarsening<S>,
        R: Relaxation<NativeBackend<S>>,
    {
        /// Use the hierarchy as a standalone solver: cycle until the relative
        /// residual drops below `tol` or `max_iterations` cycles are spent.
        ///
        /// `x` holds the initial approximation on input. Returns the number
        /// of cycles performed and the final relative residual.
        pub fn solve(
            &mut self,
            rhs: &Array1<S>,
            x: &mut Array1<S>,
            tol: S,
            max_iterations: usize,
        ) -> Result<(usize, S), AmgError> {
            self.check_dims(rhs, x)?;

            let rhs_norm = vector_norm(rhs);
            if rhs_norm <= S::breakdown_tol() {
                x.fill(S::zero());
                return Ok((0, S::zero()));
            }

            let mut res = S::infinity();
            for iter in 0..max_iterations {
                cycle_levels(&mut self.levels, &self.prm, &self.relax_prm, rhs, x);

                let r = rhs - &self.system_matrix().matvec(x);
                res = vector_norm(&r) / rhs_norm;
                log::debug!("amg solve cycle {}: relative residual {:.6e}", iter + 1, res.to_f64().unwrap_or(0.0));

                if res < tol {
                    return Ok((iter + 1, res));
                }
            }

            Ok((max_iterations, res))
        }
    }

    impl<S, C, R> Precondition<S> for AmgSolver<NativeBackend<S>, C, R>
    where
        S: Scalar,
        C: Coarsening<S>,
        R: Relaxation<NativeBackend<S>>,
    {
        fn apply(&mut self, rhs: &Array1<S>, x: &mut Array1<S>) -> Result<(), AmgError> {
            AmgSolver::apply(self, rhs, x)
        }
    }
}
