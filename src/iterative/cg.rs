//! CG (Conjugate Gradient) solver
//!
//! The Conjugate Gradient method for symmetric positive definite systems,
//! plain and preconditioned. The preconditioned variant is the intended
//! outer loop around the multigrid engine.

use crate::blas_helpers::{inner_product, vector_norm};
use crate::error::AmgError;
use crate::traits::{LinearOperator, Precondition, Scalar};
use ndarray::Array1;

/// CG solver configuration
#[derive(Debug, Clone)]
pub struct CgConfig<S> {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance for convergence
    pub tolerance: S,
    /// Print progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for CgConfig<f64> {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
            print_interval: 0,
        }
    }
}

/// CG solver result
#[derive(Debug)]
pub struct CgSolution<S: Scalar> {
    /// Solution vector
    pub x: Array1<S>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: S,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the Conjugate Gradient method
///
/// Note: this method is only correct for symmetric positive definite
/// matrices. For non-symmetric systems use BiCGStab instead.
pub fn cg<S, A>(operator: &A, b: &Array1<S>, config: &CgConfig<S>) -> CgSolution<S>
where
    S: Scalar,
    A: LinearOperator<S>,
{
    let n = b.len();
    let mut x = Array1::zeros(n);

    let b_norm = vector_norm(b);
    if b_norm < S::breakdown_tol() {
        return CgSolution {
            x,
            iterations: 0,
            residual: S::zero(),
            converged: true,
        };
    }

    // Initial residual r = b - Ax = b (since x = 0)
    let mut r = b.clone();
    let mut p = r.clone();
    let mut rho = inner_product(&r, &r);

    for iter in 0..config.max_iterations {
        let q = operator.apply(&p);

        let pq = inner_product(&p, &q);
        if pq.abs() < S::breakdown_tol() {
            return CgSolution {
                x,
                iterations: iter,
                residual: vector_norm(&r) / b_norm,
                converged: false,
            };
        }

        let alpha = rho / pq;

        x = &x + &p.mapv(|pi| pi * alpha);
        r = &r - &q.mapv(|qi| qi * alpha);

        let rel_residual = vector_norm(&r) / b_norm;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "CG iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual.to_f64().unwrap_or(0.0)
            );
        }

        if rel_residual < config.tolerance {
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        let rho_new = inner_product(&r, &r);
        if rho.abs() < S::breakdown_tol() {
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            };
        }

        let beta = rho_new / rho;
        rho = rho_new;

        p = &r + &p.mapv(|pi| pi * beta);
    }

    let rel_residual = vector_norm(&r) / b_norm;
    CgSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
    }
}

/// Solve Ax = b using preconditioned Conjugate Gradient
///
/// `precond.apply(r, z)` approximately solves `A z = r` once per iteration.
/// The preconditioner must be symmetric positive definite for CG theory to
/// hold; a multigrid V-cycle with `R = P^T` and matching pre/post smoothing
/// qualifies.
pub fn cg_preconditioned<S, A, M>(
    operator: &A,
    b: &Array1<S>,
    precond: &mut M,
    config: &CgConfig<S>,
) -> Result<CgSolution<S>, AmgError>
where
    S: Scalar,
    A: LinearOperator<S>,
    M: Precondition<S>,
{
    let n = b.len();
    let mut x = Array1::zeros(n);

    let b_norm = vector_norm(b);
    if b_norm < S::breakdown_tol() {
        return Ok(CgSolution {
            x,
            iterations: 0,
            residual: S::zero(),
            converged: true,
        });
    }

    let mut r = b.clone();
    let mut z = Array1::zeros(n);
    precond.apply(&r, &mut z)?;

    let mut p = z.clone();
    let mut rho = inner_product(&r, &z);

    for iter in 0..config.max_iterations {
        let q = operator.apply(&p);

        let pq = inner_product(&p, &q);
        if pq.abs() < S::breakdown_tol() {
            return Ok(CgSolution {
                x,
                iterations: iter,
                residual: vector_norm(&r) / b_norm,
                converged: false,
            });
        }

        let alpha = rho / pq;

        x = &x + &p.mapv(|pi| pi * alpha);
        r = &r - &q.mapv(|qi| qi * alpha);

        let rel_residual = vector_norm(&r) / b_norm;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "PCG iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual.to_f64().unwrap_or(0.0)
            );
        }

        if rel_residual < config.tolerance {
            return Ok(CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            });
        }

        precond.apply(&r, &mut z)?;

        let rho_new = inner_product(&r, &z);
        if rho.abs() < S::breakdown_tol() {
            return Ok(CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            });
        }

        let beta = rho_new / rho;
        rho = rho_new;

        p = &z + &p.mapv(|pi| pi * beta);
    }

    let rel_residual = vector_norm(&r) / b_norm;
    Ok(CgSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::CsrMatrix;
    use crate::traits::IdentityPrecond;
    use ndarray::array;

    #[test]
    fn test_cg_spd() {
        let dense = array![[4.0_f64, 1.0], [1.0, 3.0]];

        let a = CsrMatrix::from_dense(&dense, 1e-15);
        let b = array![1.0_f64, 2.0];

        let config = CgConfig {
            max_iterations: 100,
            tolerance: 1e-10,
            print_interval: 0,
        };

        let solution = cg(&a, &b, &config);

        assert!(solution.converged, "CG should converge for SPD matrix");

        let ax = a.matvec(&solution.x);
        let error: f64 = (&ax - &b).iter().map(|e| e * e).sum::<f64>().sqrt();
        assert!(error < 1e-8, "Solution should satisfy Ax = b");
    }

    #[test]
    fn test_cg_identity() {
        let n = 5;
        let id: CsrMatrix<f64> = CsrMatrix::identity(n);
        let b = Array1::from_iter((1..=n).map(|i| i as f64));

        let config = CgConfig {
            max_iterations: 10,
            tolerance: 1e-12,
            print_interval: 0,
        };

        let solution = cg(&id, &b, &config);

        assert!(solution.converged);
        assert!(solution.iterations <= 2);

        let error: f64 = (&solution.x - &b).iter().map(|e| e * e).sum::<f64>().sqrt();
        assert!(error < 1e-10);
    }

    #[test]
    fn test_pcg_with_identity_matches_cg() {
        let dense = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let a = CsrMatrix::from_dense(&dense, 1e-15);
        let b = array![1.0_f64, 2.0, 3.0];

        let config = CgConfig {
            max_iterations: 100,
            tolerance: 1e-12,
            print_interval: 0,
        };

        let plain = cg(&a, &b, &config);
        let precond = cg_preconditioned(&a, &b, &mut IdentityPrecond, &config).unwrap();

        assert!(plain.converged && precond.converged);
        for i in 0..3 {
            approx::assert_relative_eq!(plain.x[i], precond.x[i], epsilon = 1e-9);
        }
    }
}
