//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts
//!
//! Every matrix handed to the multigrid setup is kept with column-sorted
//! rows ([`CsrMatrix::sort_rows`]); the sparse product and transpose
//! preserve that ordering.

use crate::parallel::parallel_map_indexed;
use crate::traits::{LinearOperator, Scalar};
use ndarray::{Array1, Array2};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Compressed Sparse Row (CSR) matrix format
///
/// Memory-efficient storage for sparse matrices with O(nnz) space complexity.
/// Matrix-vector products are O(nnz) instead of O(n²) for dense matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<S: Scalar> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<S>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz (total number of non-zeros)
    pub row_ptrs: Vec<usize>,
}

impl<S: Scalar> CsrMatrix<S> {
    /// Create a new empty CSR matrix
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Create a CSR matrix from raw components
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent:
    /// - `row_ptrs` must have length `num_rows + 1`
    /// - `col_indices` and `values` must have the same length
    /// - `row_ptrs[num_rows]` must equal `values.len()`
    pub fn from_raw_parts(
        num_rows: usize,
        num_cols: usize,
        row_ptrs: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<S>,
    ) -> Self {
        assert_eq!(
            row_ptrs.len(),
            num_rows + 1,
            "row_ptrs must have num_rows + 1 elements"
        );
        assert_eq!(
            col_indices.len(),
            values.len(),
            "col_indices and values must have the same length"
        );
        assert_eq!(
            row_ptrs[num_rows],
            values.len(),
            "row_ptrs[num_rows] must equal nnz"
        );

        Self {
            num_rows,
            num_cols,
            row_ptrs,
            col_indices,
            values,
        }
    }

    /// Create a CSR matrix from a dense matrix
    ///
    /// Only stores entries with magnitude > threshold
    pub fn from_dense(dense: &Array2<S>, threshold: S) -> Self {
        let num_rows = dense.nrows();
        let num_cols = dense.ncols();

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = vec![0usize; num_rows + 1];

        for i in 0..num_rows {
            for j in 0..num_cols {
                let val = dense[[i, j]];
                if val.abs() > threshold {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs[i + 1] = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create a CSR matrix from COO (Coordinate) format triplets
    ///
    /// Triplets are (row, col, value). Duplicate entries are summed.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, S)>,
    ) -> Self {
        if triplets.is_empty() {
            return Self::new(num_rows, num_cols);
        }

        // Sort by row, then by column
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut values: Vec<S> = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_ptrs = vec![0usize; num_rows + 1];

        let mut prev_row = usize::MAX;
        let mut prev_col = usize::MAX;

        for (row, col, val) in triplets {
            if row == prev_row && col == prev_col {
                // Same entry, accumulate
                if let Some(last) = values.last_mut() {
                    *last += val;
                }
            } else {
                values.push(val);
                col_indices.push(col);

                // Update row pointers for any rows we skipped
                if row != prev_row {
                    let start = if prev_row == usize::MAX {
                        0
                    } else {
                        prev_row + 1
                    };
                    for item in row_ptrs.iter_mut().take(row + 1).skip(start) {
                        *item = values.len() - 1;
                    }
                }

                prev_row = row;
                prev_col = col;
            }
        }

        // Fill remaining row pointers
        let last_row = if prev_row == usize::MAX {
            0
        } else {
            prev_row + 1
        };
        for item in row_ptrs.iter_mut().take(num_rows + 1).skip(last_row) {
            *item = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Create identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![S::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Create diagonal matrix from vector
    pub fn from_diagonal(diag: &Array1<S>) -> Self {
        let n = diag.len();
        Self {
            num_rows: n,
            num_cols: n,
            values: diag.to_vec(),
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Storage footprint of the three CSR arrays in bytes
    pub fn bytes(&self) -> usize {
        self.row_ptrs.len() * std::mem::size_of::<usize>()
            + self.col_indices.len() * std::mem::size_of::<usize>()
            + self.values.len() * std::mem::size_of::<S>()
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> std::ops::Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, S)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Check that every row stores strictly increasing column indices
    pub fn rows_sorted(&self) -> bool {
        (0..self.num_rows).all(|i| {
            self.col_indices[self.row_range(i)]
                .windows(2)
                .all(|w| w[0] < w[1])
        })
    }

    /// Sort the entries of each row by ascending column index.
    ///
    /// The sort is stable: duplicate column indices keep their relative
    /// order rather than being merged or dropped.
    pub fn sort_rows(&mut self) {
        let n = self.num_rows;
        let mut row_cols: Vec<&mut [usize]> = Vec::with_capacity(n);
        let mut row_vals: Vec<&mut [S]> = Vec::with_capacity(n);

        let mut cols_rest: &mut [usize] = &mut self.col_indices;
        let mut vals_rest: &mut [S] = &mut self.values;
        for i in 0..n {
            let len = self.row_ptrs[i + 1] - self.row_ptrs[i];
            let (c, cr) = cols_rest.split_at_mut(len);
            let (v, vr) = vals_rest.split_at_mut(len);
            cols_rest = cr;
            vals_rest = vr;
            row_cols.push(c);
            row_vals.push(v);
        }

        #[cfg(feature = "rayon")]
        row_cols
            .par_iter_mut()
            .zip(row_vals.par_iter_mut())
            .for_each(|(c, v)| sort_row(c, v));

        #[cfg(not(feature = "rayon"))]
        for (c, v) in row_cols.iter_mut().zip(row_vals.iter_mut()) {
            sort_row(c, v);
        }
    }

    /// Transpose: produce B with B[j, i] = A[i, j], column-sorted rows.
    ///
    /// Uses a counting scatter; entries of each transposed row appear in
    /// original row order, which is ascending, so no extra sort is needed.
    pub fn transpose(&self) -> Self {
        let nnz = self.nnz();
        let mut row_ptrs = vec![0usize; self.num_cols + 1];
        for &c in &self.col_indices {
            row_ptrs[c + 1] += 1;
        }
        for i in 0..self.num_cols {
            row_ptrs[i + 1] += row_ptrs[i];
        }

        let mut col_indices = vec![0usize; nnz];
        let mut values = vec![S::zero(); nnz];
        let mut next = row_ptrs.clone();
        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let c = self.col_indices[idx];
                let dst = next[c];
                col_indices[dst] = i;
                values[dst] = self.values[idx];
                next[c] += 1;
            }
        }

        Self {
            num_rows: self.num_cols,
            num_cols: self.num_rows,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Sparse matrix product C = A * B, row by row.
    ///
    /// Each output row is gathered, stably sorted by column and compressed,
    /// so the result is deterministic with column-sorted rows. Entries that
    /// cancel to exact zero are kept.
    pub fn matmul(&self, other: &Self) -> Self {
        assert_eq!(
            self.num_cols, other.num_rows,
            "matrix dimension mismatch: A.cols ({}) != B.rows ({})",
            self.num_cols, other.num_rows
        );

        let m = self.num_rows;
        let n = other.num_cols;

        if m == 0 || n == 0 || self.nnz() == 0 || other.nnz() == 0 {
            return Self::new(m, n);
        }

        let rows: Vec<(Vec<usize>, Vec<S>)> = parallel_map_indexed(m, |i| {
            let mut row_data: Vec<(usize, S)> = Vec::new();
            for (k, a_ik) in self.row_entries(i) {
                for (j, b_kj) in other.row_entries(k) {
                    row_data.push((j, a_ik * b_kj));
                }
            }
            row_data.sort_by_key(|&(j, _)| j);

            let mut cols: Vec<usize> = Vec::with_capacity(row_data.len());
            let mut vals: Vec<S> = Vec::with_capacity(row_data.len());
            for (j, v) in row_data {
                match cols.last() {
                    Some(&last) if last == j => {
                        let end = vals.len() - 1;
                        vals[end] += v;
                    }
                    _ => {
                        cols.push(j);
                        vals.push(v);
                    }
                }
            }
            (cols, vals)
        });

        let mut row_ptrs = Vec::with_capacity(m + 1);
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

        Self {
            num_rows: m,
            num_cols: n,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Matrix-vector product: y = A * x
    ///
    /// Uses parallel processing when the `rayon` feature is enabled and the
    /// matrix is large enough to benefit from parallelization.
    pub fn matvec(&self, x: &Array1<S>) -> Array1<S> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= 256 {
                return self.matvec_parallel(x);
            }
        }

        self.matvec_sequential(x)
    }

    fn matvec_sequential(&self, x: &Array1<S>) -> Array1<S> {
        let mut y = Array1::zeros(self.num_rows);

        for i in 0..self.num_rows {
            let mut sum = S::zero();
            for idx in self.row_range(i) {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            y[i] = sum;
        }

        y
    }

    #[cfg(feature = "rayon")]
    fn matvec_parallel(&self, x: &Array1<S>) -> Array1<S> {
        let x_slice = x.as_slice().expect("Array should be contiguous");

        let results: Vec<S> = (0..self.num_rows)
            .into_par_iter()
            .map(|i| {
                let mut sum = S::zero();
                for idx in self.row_range(i) {
                    sum += self.values[idx] * x_slice[self.col_indices[idx]];
                }
                sum
            })
            .collect();

        Array1::from_vec(results)
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> S {
        for idx in self.row_range(i) {
            if self.col_indices[idx] == j {
                return self.values[idx];
            }
        }
        S::zero()
    }

    /// Extract diagonal elements
    pub fn diagonal(&self) -> Array1<S> {
        let n = self.num_rows.min(self.num_cols);
        let mut diag = Array1::zeros(n);

        for i in 0..n {
            diag[i] = self.get(i, i);
        }

        diag
    }

    /// Convert to dense matrix (for the coarse-level factorization and debugging)
    pub fn to_dense(&self) -> Array2<S> {
        let mut dense = Array2::zeros((self.num_rows, self.num_cols));

        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                dense[[i, self.col_indices[idx]]] = self.values[idx];
            }
        }

        dense
    }
}

fn sort_row<S: Scalar>(cols: &mut [usize], vals: &mut [S]) {
    if cols.windows(2).all(|w| w[0] <= w[1]) {
        return;
    }
    let mut entries: Vec<(usize, S)> = cols.iter().copied().zip(vals.iter().copied()).collect();
    entries.sort_by_key(|&(c, _)| c);
    for (k, (c, v)) in entries.into_iter().enumerate() {
        cols[k] = c;
        vals[k] = v;
    }
}

impl<S: Scalar> LinearOperator<S> for CsrMatrix<S> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<S>) -> Array1<S> {
        self.matvec(x)
    }
}
