//! BiCGStab (Bi-Conjugate Gradient Stabilized) solver
//!
//! Krylov subspace method for non-symmetric systems, plain and
//! right-preconditioned.

use crate::blas_helpers::{inner_product, vector_norm};
use crate::error::AmgError;
use crate::traits::{LinearOperator, Precondition, Scalar};
use ndarray::Array1;

/// BiCGStab solver configuration
#[derive(Debug, Clone)]
pub struct BiCgstabConfig<S> {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance for convergence
    pub tolerance: S,
    /// Print progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for BiCgstabConfig<f64> {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
            print_interval: 0,
        }
    }
}

/// BiCGStab solver result
#[derive(Debug)]
pub struct BiCgstabSolution<S: Scalar> {
    /// Solution vector
    pub x: Array1<S>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: S,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the BiCGStab method
pub fn bicgstab<S, A>(operator: &A, b: &Array1<S>, config: &BiCgstabConfig<S>) -> BiCgstabSolution<S>
where
    S: Scalar,
    A: LinearOperator<S>,
{
    let mut identity = crate::traits::IdentityPrecond;
    bicgstab_preconditioned(operator, b, &mut identity, config)
        .expect("identity preconditioning cannot fail")
}

/// Solve Ax = b using right-preconditioned BiCGStab
///
/// Each iteration applies the preconditioner twice (search direction and
/// stabilization step).
pub fn bicgstab_preconditioned<S, A, M>(
    operator: &A,
    b: &Array1<S>,
    precond: &mut M,
    config: &BiCgstabConfig<S>,
) -> Result<BiCgstabSolution<S>, AmgError>
where
    S: Scalar,
    A: LinearOperator<S>,
    M: Precondition<S>,
{
    let n = b.len();
    let mut x = Array1::zeros(n);

    let b_norm = vector_norm(b);
    if b_norm < S::breakdown_tol() {
        return Ok(BiCgstabSolution {
            x,
            iterations: 0,
            residual: S::zero(),
            converged: true,
        });
    }

    // Initial residual
    let mut r = b.clone();
    let r0 = r.clone(); // Shadow residual

    let mut rho = S::one();
    let mut alpha = S::one();
    let mut omega = S::one();

    let mut p = Array1::zeros(n);
    let mut v = Array1::zeros(n);
    let mut p_hat = Array1::zeros(n);
    let mut s_hat = Array1::zeros(n);

    for iter in 0..config.max_iterations {
        let rho_new = inner_product(&r0, &r);

        if rho_new.abs() < S::breakdown_tol() {
            return Ok(BiCgstabSolution {
                x,
                iterations: iter,
                residual: vector_norm(&r) / b_norm,
                converged: false,
            });
        }

        let beta = (rho_new / rho) * (alpha / omega);
        rho = rho_new;

        // p = r + beta * (p - omega * v)
        p = &r + &(&p - &v.mapv(|vi| vi * omega)).mapv(|pi| pi * beta);

        precond.apply(&p, &mut p_hat)?;
        v = operator.apply(&p_hat);

        let r0v = inner_product(&r0, &v);
        if r0v.abs() < S::breakdown_tol() {
            return Ok(BiCgstabSolution {
                x,
                iterations: iter,
                residual: vector_norm(&r) / b_norm,
                converged: false,
            });
        }

        alpha = rho / r0v;

        // s = r - alpha * v
        let s = &r - &v.mapv(|vi| vi * alpha);

        // Check for early convergence
        let s_norm = vector_norm(&s);
        if s_norm / b_norm < config.tolerance {
            x = &x + &p_hat.mapv(|pi| pi * alpha);
            return Ok(BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: s_norm / b_norm,
                converged: true,
            });
        }

        precond.apply(&s, &mut s_hat)?;
        let t = operator.apply(&s_hat);

        let tt = inner_product(&t, &t);
        if tt.abs() < S::breakdown_tol() {
            return Ok(BiCgstabSolution {
                x,
                iterations: iter,
                residual: vector_norm(&r) / b_norm,
                converged: false,
            });
        }
        omega = inner_product(&t, &s) / tt;

        // x = x + alpha * p_hat + omega * s_hat
        x = &x + &p_hat.mapv(|pi| pi * alpha) + &s_hat.mapv(|si| si * omega);

        // r = s - omega * t
        r = &s - &t.mapv(|ti| ti * omega);

        let rel_residual = vector_norm(&r) / b_norm;

        if config.print_interval > 0 && (iter + 1) % config.print_interval == 0 {
            log::info!(
                "BiCGStab iteration {}: relative residual = {:.6e}",
                iter + 1,
                rel_residual.to_f64().unwrap_or(0.0)
            );
        }

        if rel_residual < config.tolerance {
            return Ok(BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            });
        }

        // Check for stagnation
        if omega.abs() < S::breakdown_tol() {
            return Ok(BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            });
        }
    }

    let rel_residual = vector_norm(&r) / b_norm;
    Ok(BiCgstabSolution {
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
    use ndarray::array;

    #[test]
    fn test_bicgstab_simple() {
        let dense = array![[4.0_f64, 1.0], [1.0, 3.0]];

        let a = CsrMatrix::from_dense(&dense, 1e-15);
        let b = array![1.0_f64, 2.0];

        let config = BiCgstabConfig {
            max_iterations: 100,
            tolerance: 1e-10,
            print_interval: 0,
        };

        let solution = bicgstab(&a, &b, &config);

        assert!(solution.converged, "BiCGStab should converge");

        let ax = a.matvec(&solution.x);
        let error: f64 = (&ax - &b).iter().map(|e| e * e).sum::<f64>().sqrt();
        assert!(error < 1e-8, "Solution should satisfy Ax = b");
    }

    #[test]
    fn test_bicgstab_nonsymmetric() {
        let dense = array![[3.0_f64, 1.0, 0.0], [0.0, 2.0, 1.0], [1.0, 0.0, 4.0]];

        let a = CsrMatrix::from_dense(&dense, 1e-15);
        let b = array![4.0_f64, 3.0, 5.0];

        let config = BiCgstabConfig {
            max_iterations: 100,
            tolerance: 1e-10,
            print_interval: 0,
        };

        let solution = bicgstab(&a, &b, &config);
        assert!(solution.converged);

        // Exact solution is [1, 1, 1]
        for i in 0..3 {
            approx::assert_relative_eq!(solution.x[i], 1.0, epsilon = 1e-8);
        }
    }
}
