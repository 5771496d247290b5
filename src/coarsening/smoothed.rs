//! Smoothed aggregation coarsening
//!
//! Improves the piecewise-constant tentative prolongation of plain
//! aggregation with one damped-Jacobi smoothing step applied to a filtered
//! fine-level operator:
//!
//! `P = (I − ω·D_f⁻¹·A_f) · P_tent`
//!
//! where `A_f` keeps strong connections and lumps weak off-diagonal entries
//! into the diagonal `D_f`.

use super::aggregation::{plain_aggregates, strong_connections, tentative_prolongation};
use super::Coarsening;
use crate::error::AmgError;
use crate::parallel::parallel_map_indexed;
use crate::sparse::CsrMatrix;
use crate::traits::Scalar;

/// Smoothed aggregation
#[derive(Debug, Clone, Copy)]
pub struct SmoothedAggregation {
    /// Strength threshold for the aggregation graph
    pub eps_strong: f64,
    /// Damping of the prolongation smoother; 2/3 is optimal for Poisson
    pub relax: f64,
}

impl Default for SmoothedAggregation {
    fn default() -> Self {
        Self {
            eps_strong: 0.08,
            relax: 2.0 / 3.0,
        }
    }
}

impl<S: Scalar> Coarsening<S> for SmoothedAggregation {
    fn transfer_operators(
        &self,
        a: &CsrMatrix<S>,
    ) -> Result<(CsrMatrix<S>, CsrMatrix<S>), AmgError> {
        let n = a.num_rows;
        let strong = strong_connections(a, self.eps_strong);
        let agg = plain_aggregates(n, &strong);
        let p_tent: CsrMatrix<S> = tentative_prolongation(n, &agg);

        if agg.count == 0 {
            // Nothing to smooth; the engine reports the degenerate hierarchy
            let r = p_tent.transpose();
            return Ok((p_tent, r));
        }

        let smoother = prolongation_smoother(a, &strong, self.relax);
        let p = smoother.matmul(&p_tent);
        let r = p.transpose();
        Ok((p, r))
    }
}

/// Build `I − ω·D_f⁻¹·A_f` in CSR form.
///
/// Rows whose filtered diagonal vanishes (or that store no diagonal entry at
/// all) degrade to identity rows, so the tentative prolongation passes
/// through unsmoothed there.
fn prolongation_smoother<S: Scalar>(
    a: &CsrMatrix<S>,
    strong: &[Vec<usize>],
    relax: f64,
) -> CsrMatrix<S> {
    let n = a.num_rows;
    let omega = S::from_f64(relax).unwrap();

    let rows: Vec<(Vec<usize>, Vec<S>)> = parallel_map_indexed(n, |i| {
        let strong_i = &strong[i];

        // Dropped weak entries are added to the diagonal so A_f keeps the
        // row sums of A and the smoother leaves constants alone
        let mut dia = S::zero();
        let mut has_dia = false;
        for (j, v) in a.row_entries(i) {
            if j == i {
                dia += v;
                has_dia = true;
            } else if !strong_i.contains(&j) {
                dia += v;
            }
        }

        if !has_dia || dia.abs() <= S::breakdown_tol() {
            log::warn!("prolongation smoother: empty filtered diagonal at row {i}");
            return (vec![i], vec![S::one()]);
        }

        let scale = omega / dia;
        let mut cols = Vec::with_capacity(strong_i.len() + 1);
        let mut vals = Vec::with_capacity(strong_i.len() + 1);
        for (j, v) in a.row_entries(i) {
            if j == i {
                cols.push(i);
                vals.push(S::one() - omega);
            } else if strong_i.contains(&j) {
                cols.push(j);
                vals.push(-(scale * v));
            }
        }
        (cols, vals)
    });

    let mut row_ptrs = Vec::with_capacity(n + 1);
    row_ptrs.push(0);
    let mut total = 0;
    for (cols, _) in &rows {
        total += cols.len();
        row_ptrs.push(total);
    }

    let mut col_indices = Vec::with_capacity(total);
    let mut values = Vec::with_capacity(total);
    for (cols, vals) in rows {
        col_indices.extend(cols);
        values.extend(vals);
    }

    CsrMatrix::from_raw_parts(n, n, row_ptrs, col_indices, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn laplacian_1d(n: usize) -> CsrMatrix<f64> {
        let mut triplets = Vec::new();
        for i in 0..n {
            triplets.push((i, i, 2.0));
            if i > 0 {
                triplets.push((i, i - 1, -1.0));
            }
            if i < n - 1 {
                triplets.push((i, i + 1, -1.0));
            }
        }
        CsrMatrix::from_triplets(n, n, triplets)
    }

    #[test]
    fn test_smoother_interior_rows_sum_to_one() {
        // For the Laplacian all connections are strong, so the filtered
        // matrix is A itself and each smoother row sums to 1 - omega * (row
        // sum of A) / a_ii. Interior rows of A sum to zero, so the smoother
        // rows sum to one there.
        let a = laplacian_1d(10);
        let strong = strong_connections(&a, 0.08);
        let s = prolongation_smoother(&a, &strong, 2.0 / 3.0);

        assert!(s.rows_sorted());
        for i in 1..9 {
            let sum: f64 = s.row_entries(i).map(|(_, v)| v).sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_smoother_lumps_weak_entries_into_diagonal() {
        // Rows mixing strong (-1.9) and weak (-0.2) connections with zero
        // row sums. Weak entries must be lumped into the filtered diagonal
        // (d_f = 4 - 0.2 = 3.8), so the smoother drops the weak column and
        // its rows still sum to one.
        let mut triplets = Vec::new();
        for i in 0..3 {
            triplets.push((i, i, 4.0));
            for j in 0..3 {
                if j != i {
                    triplets.push((i, j, -1.9));
                }
            }
            triplets.push((i, 3, -0.2));
            triplets.push((3, i, -0.2));
        }
        triplets.push((3, 3, 4.0));
        let a = CsrMatrix::from_triplets(4, 4, triplets);

        let strong = strong_connections(&a, 0.08);
        // -0.2 is below the 0.08 * sqrt(4 * 4) threshold, -1.9 above it
        assert_eq!(strong[0], vec![1, 2]);
        assert!(strong[3].is_empty());

        let omega = 2.0 / 3.0;
        let s = prolongation_smoother(&a, &strong, omega);

        assert_relative_eq!(s.get(0, 0), 1.0 - omega, epsilon = 1e-12);
        assert_relative_eq!(s.get(0, 1), omega * 1.9 / 3.8, epsilon = 1e-12);
        // The weak connection is dropped, not smoothed over
        assert_relative_eq!(s.get(0, 3), 0.0, epsilon = 1e-15);

        for i in 0..3 {
            let sum: f64 = s.row_entries(i).map(|(_, v)| v).sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_smoothed_transfer_shapes() {
        let n = 40;
        let a = laplacian_1d(n);
        let (p, r) =
            Coarsening::<f64>::transfer_operators(&SmoothedAggregation::default(), &a).unwrap();

        assert_eq!(p.num_rows, n);
        assert!(p.num_cols > 0);
        assert!(p.num_cols < n);
        assert_eq!(r.num_rows, p.num_cols);
        assert_eq!(r.num_cols, n);
        assert!(p.rows_sorted());

        // Smoothing widens the stencil compared to the tentative operator
        assert!(p.nnz() > p.num_rows);

        // R = P^T
        assert_eq!(r.to_dense(), p.transpose().to_dense());
    }

    #[test]
    fn test_smoothed_on_diagonal_matrix_is_degenerate() {
        let a = CsrMatrix::from_diagonal(&ndarray::array![1.0_f64, 2.0, 3.0]);
        let (p, _r) =
            Coarsening::<f64>::transfer_operators(&SmoothedAggregation::default(), &a).unwrap();
        assert_eq!(p.num_cols, 0);
    }
}
