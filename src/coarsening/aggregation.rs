//! Plain aggregation coarsening
//!
//! Partitions the fine grid into aggregates of strongly coupled points and
//! uses the piecewise-constant tentative prolongation. Fast setup, modest
//! convergence; mostly useful as the base for smoothed aggregation.

use super::Coarsening;
use crate::error::AmgError;
use crate::parallel::parallel_map_indexed;
use crate::sparse::CsrMatrix;
use crate::traits::Scalar;

/// Plain (unsmoothed) aggregation
#[derive(Debug, Clone, Copy)]
pub struct Aggregation {
    /// Strength threshold: `a_ij` couples i and j strongly when
    /// `|a_ij| > eps_strong * sqrt(|a_ii * a_jj|)`
    pub eps_strong: f64,
}

impl Default for Aggregation {
    fn default() -> Self {
        Self { eps_strong: 0.08 }
    }
}

impl<S: Scalar> Coarsening<S> for Aggregation {
    fn transfer_operators(
        &self,
        a: &CsrMatrix<S>,
    ) -> Result<(CsrMatrix<S>, CsrMatrix<S>), AmgError> {
        let strong = strong_connections(a, self.eps_strong);
        let agg = plain_aggregates(a.num_rows, &strong);
        let p = tentative_prolongation(a.num_rows, &agg);
        let r = p.transpose();
        Ok((p, r))
    }
}

/// Per-row strong-connection lists for aggregation-type coarsening.
///
/// Off-diagonal `a_ij` is strong when `a_ij² > eps² * |a_ii * a_jj|`.
pub(crate) fn strong_connections<S: Scalar>(a: &CsrMatrix<S>, eps: f64) -> Vec<Vec<usize>> {
    let diag = a.diagonal();
    let eps2 = S::from_f64(eps * eps).unwrap();

    parallel_map_indexed(a.num_rows, |i| {
        let dii = diag[i].abs();
        let mut row = Vec::new();
        for (j, v) in a.row_entries(i) {
            if j != i && v * v > eps2 * dii * diag[j].abs() {
                row.push(j);
            }
        }
        row
    })
}

/// Aggregate assignment: `id[i]` is the aggregate of point i, `None` for
/// isolated points (no strong connections), which stay out of the coarse
/// space.
pub(crate) struct Aggregates {
    pub id: Vec<Option<usize>>,
    pub count: usize,
}

/// Greedy aggregation over the strong-connection graph.
///
/// First pass: a point whose strong neighborhood is entirely unassigned
/// becomes the root of a new aggregate and claims that neighborhood. Second
/// pass: remaining points join the aggregate of one of their strong
/// neighbors. After the first pass every non-isolated point is assigned or
/// has an assigned strong neighbor, so two passes suffice.
pub(crate) fn plain_aggregates(n: usize, strong: &[Vec<usize>]) -> Aggregates {
    let mut id: Vec<Option<usize>> = vec![None; n];
    let mut count = 0;

    for i in 0..n {
        if strong[i].is_empty() || id[i].is_some() {
            continue;
        }
        if strong[i].iter().any(|&j| id[j].is_some()) {
            continue;
        }
        id[i] = Some(count);
        for &j in &strong[i] {
            id[j] = Some(count);
        }
        count += 1;
    }

    for i in 0..n {
        if id[i].is_some() || strong[i].is_empty() {
            continue;
        }
        if let Some(agg) = strong[i].iter().find_map(|&j| id[j]) {
            id[i] = Some(agg);
        }
    }

    Aggregates { id, count }
}

/// Piecewise-constant prolongation: row i carries a single unit entry in the
/// column of its aggregate. Rows of isolated points are empty.
pub(crate) fn tentative_prolongation<S: Scalar>(n: usize, agg: &Aggregates) -> CsrMatrix<S> {
    let mut row_ptrs = Vec::with_capacity(n + 1);
    row_ptrs.push(0);
    let mut col_indices = Vec::new();
    let mut values = Vec::new();

    for i in 0..n {
        if let Some(j) = agg.id[i] {
            col_indices.push(j);
            values.push(S::one());
        }
        row_ptrs.push(col_indices.len());
    }

    CsrMatrix::from_raw_parts(n, agg.count, row_ptrs, col_indices, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

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
    fn test_strong_connections_laplacian() {
        let a = laplacian_1d(5);
        let strong = strong_connections(&a, 0.08);

        // Every off-diagonal neighbor of the Laplacian is strong
        assert_eq!(strong[0], vec![1]);
        assert_eq!(strong[2], vec![1, 3]);
        assert_eq!(strong[4], vec![3]);
    }

    #[test]
    fn test_diagonal_matrix_has_no_aggregates() {
        let a = CsrMatrix::from_diagonal(&array![1.0_f64, 2.0, 3.0, 4.0, 5.0]);
        let strong = strong_connections(&a, 0.08);
        let agg = plain_aggregates(5, &strong);

        assert_eq!(agg.count, 0);
        assert!(agg.id.iter().all(|id| id.is_none()));

        let p: CsrMatrix<f64> = tentative_prolongation(5, &agg);
        assert_eq!(p.num_cols, 0);
        assert_eq!(p.nnz(), 0);
    }

    #[test]
    fn test_plain_aggregates_cover_connected_grid() {
        let n = 30;
        let a = laplacian_1d(n);
        let strong = strong_connections(&a, 0.08);
        let agg = plain_aggregates(n, &strong);

        assert!(agg.count > 0);
        assert!(agg.count < n);
        // No isolated points in a connected Laplacian
        assert!(agg.id.iter().all(|id| id.is_some()));
        // Every aggregate id in range
        assert!(agg.id.iter().flatten().all(|&j| j < agg.count));
    }

    #[test]
    fn test_transfer_operators_shapes() {
        let n = 30;
        let a = laplacian_1d(n);
        let (p, r) = Coarsening::<f64>::transfer_operators(&Aggregation::default(), &a).unwrap();

        assert_eq!(p.num_rows, n);
        assert_eq!(r.num_cols, n);
        assert_eq!(p.num_cols, r.num_rows);
        assert!(p.num_cols > 0);
        assert!(p.rows_sorted());
        assert!(r.rows_sorted());

        // R = P^T for aggregation
        assert_eq!(r.to_dense(), p.transpose().to_dense());
    }

    #[test]
    fn test_galerkin_default_coarse_operator() {
        let a = laplacian_1d(20);
        let coarsening = Aggregation::default();
        let (p, r) = Coarsening::<f64>::transfer_operators(&coarsening, &a).unwrap();
        let ac = coarsening.coarse_operator(&a, &p, &r);

        assert_eq!(ac.num_rows, p.num_cols);
        assert_eq!(ac.num_cols, p.num_cols);

        let expected = r.matmul(&a.matmul(&p));
        assert_eq!(ac.to_dense(), expected.to_dense());
    }
}
