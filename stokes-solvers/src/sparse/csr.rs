//! Compressed Sparse Row (CSR) matrix format
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value, sorted within a row
//! - `row_ptrs`: Index into values/col_indices where each row starts

use crate::traits::{LinearOperator, Scalar};
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};
use std::ops::Range;

/// Compressed Sparse Row (CSR) matrix format
///
/// Matrix-vector products are O(nnz). All structural operations below keep
/// column indices sorted within each row.
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: Scalar> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<T>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    /// row_ptrs[num_rows] = nnz (total number of non-zeros)
    pub row_ptrs: Vec<usize>,
}

impl<T: Scalar> CsrMatrix<T> {
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
        values: Vec<T>,
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
    pub fn from_dense(dense: &Array2<T>, threshold: T) -> Self {
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
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        if triplets.is_empty() {
            return Self::new(num_rows, num_cols);
        }

        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut values = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows];

        let mut prev = (usize::MAX, usize::MAX);
        for (row, col, val) in triplets {
            debug_assert!(row < num_rows && col < num_cols, "triplet out of bounds");
            if (row, col) == prev {
                if let Some(last) = values.last_mut() {
                    *last += val;
                }
            } else {
                values.push(val);
                col_indices.push(col);
                row_counts[row] += 1;
                prev = (row, col);
            }
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        for count in row_counts {
            let last = row_ptrs[row_ptrs.len() - 1];
            row_ptrs.push(last + count);
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Get the range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// Get the (col, value) pairs for a row
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Matrix-vector product: y = A * x
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        let mut y = Array1::from_elem(self.num_rows, T::zero());
        self.spmv(T::one(), x.view(), T::zero(), y.view_mut());
        y
    }

    /// Transpose matrix-vector product: y = A^T * x
    pub fn matvec_transpose(&self, x: &Array1<T>) -> Array1<T> {
        let mut y = Array1::from_elem(self.num_cols, T::zero());
        self.spmv_transpose(T::one(), x.view(), T::zero(), y.view_mut());
        y
    }

    /// General product on views: y = alpha * A * x + beta * y
    ///
    /// With `beta == 0` the previous content of `y` is ignored, so `y` may
    /// hold garbage.
    pub fn spmv(&self, alpha: T, x: ArrayView1<T>, beta: T, mut y: ArrayViewMut1<T>) {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");
        assert_eq!(y.len(), self.num_rows, "Output vector size mismatch");

        for i in 0..self.num_rows {
            let mut sum = T::zero();
            for idx in self.row_range(i) {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            y[i] = if beta == T::zero() {
                alpha * sum
            } else {
                alpha * sum + beta * y[i]
            };
        }
    }

    /// General transpose product on views: y = alpha * A^T * x + beta * y
    pub fn spmv_transpose(&self, alpha: T, x: ArrayView1<T>, beta: T, mut y: ArrayViewMut1<T>) {
        assert_eq!(x.len(), self.num_rows, "Input vector size mismatch");
        assert_eq!(y.len(), self.num_cols, "Output vector size mismatch");

        if beta == T::zero() {
            y.fill(T::zero());
        } else if beta != T::one() {
            y.mapv_inplace(|v| v * beta);
        }

        for i in 0..self.num_rows {
            let xi = alpha * x[i];
            for idx in self.row_range(i) {
                y[self.col_indices[idx]] += self.values[idx] * xi;
            }
        }
    }

    /// Get element at (i, j), returns 0 if not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        let range = self.row_range(i);
        match self.col_indices[range.clone()].binary_search(&j) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => T::zero(),
        }
    }

    /// Extract diagonal elements
    pub fn diagonal(&self) -> Array1<T> {
        let n = self.num_rows.min(self.num_cols);
        Array1::from_shape_fn(n, |i| self.get(i, i))
    }

    /// Largest absolute stored value (0 for an empty matrix)
    pub fn max_abs(&self) -> T {
        self.values
            .iter()
            .fold(T::zero(), |acc, v| if v.abs() > acc { v.abs() } else { acc })
    }

    /// Scale all values by a scalar
    pub fn scale(&mut self, scalar: T) {
        for val in &mut self.values {
            *val *= scalar;
        }
    }

    /// Consuming variant of [`CsrMatrix::scale`]
    pub fn scaled(mut self, scalar: T) -> Self {
        self.scale(scalar);
        self
    }

    /// Multiply row `i` by `factors[i]`: diag(factors) * A
    pub fn scale_rows(&mut self, factors: ArrayView1<T>) {
        assert_eq!(factors.len(), self.num_rows, "Row scaling size mismatch");
        for i in 0..self.num_rows {
            let f = factors[i];
            for idx in self.row_range(i) {
                self.values[idx] *= f;
            }
        }
    }

    /// Multiply column `j` by `factors[j]`: A * diag(factors)
    pub fn scale_cols(&mut self, factors: ArrayView1<T>) {
        assert_eq!(factors.len(), self.num_cols, "Column scaling size mismatch");
        for (val, &j) in self.values.iter_mut().zip(self.col_indices.iter()) {
            *val *= factors[j];
        }
    }

    /// Create identity matrix in CSR format
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Create diagonal matrix from vector
    pub fn from_diagonal(diag: &Array1<T>) -> Self {
        let n = diag.len();
        Self {
            num_rows: n,
            num_cols: n,
            values: diag.to_vec(),
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Convert to dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());

        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                dense[[i, j]] = self.values[idx];
            }
        }

        dense
    }

    /// Explicit transpose
    pub fn transpose(&self) -> CsrMatrix<T> {
        let mut counts = vec![0usize; self.num_cols + 1];
        for &j in &self.col_indices {
            counts[j + 1] += 1;
        }
        for j in 0..self.num_cols {
            counts[j + 1] += counts[j];
        }
        let row_ptrs = counts.clone();

        let mut next = counts;
        let mut col_indices = vec![0usize; self.nnz()];
        let mut values = vec![T::zero(); self.nnz()];
        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                let j = self.col_indices[idx];
                let dest = next[j];
                col_indices[dest] = i;
                values[dest] = self.values[idx];
                next[j] += 1;
            }
        }

        CsrMatrix {
            num_rows: self.num_cols,
            num_cols: self.num_rows,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Sum of two matrices with identical shape: A + B
    pub fn add(&self, other: &CsrMatrix<T>) -> CsrMatrix<T> {
        assert_eq!(
            (self.num_rows, self.num_cols),
            (other.num_rows, other.num_cols),
            "Matrix dimension mismatch in add"
        );

        let mut row_ptrs = Vec::with_capacity(self.num_rows + 1);
        let mut col_indices = Vec::with_capacity(self.nnz() + other.nnz());
        let mut values = Vec::with_capacity(self.nnz() + other.nnz());
        row_ptrs.push(0);

        for i in 0..self.num_rows {
            let mut a = self.row_entries(i).peekable();
            let mut b = other.row_entries(i).peekable();
            loop {
                let next = match (a.peek(), b.peek()) {
                    (Some(&(ja, va)), Some(&(jb, vb))) => {
                        if ja == jb {
                            a.next();
                            b.next();
                            (ja, va + vb)
                        } else if ja < jb {
                            a.next();
                            (ja, va)
                        } else {
                            b.next();
                            (jb, vb)
                        }
                    }
                    (Some(&entry), None) => {
                        a.next();
                        entry
                    }
                    (None, Some(&entry)) => {
                        b.next();
                        entry
                    }
                    (None, None) => break,
                };
                col_indices.push(next.0);
                values.push(next.1);
            }
            row_ptrs.push(values.len());
        }

        CsrMatrix {
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Kronecker product A ⊗ B
    ///
    /// Entry (ia * B.rows + ib, ja * B.cols + jb) equals A[ia, ja] * B[ib, jb],
    /// so the index of the right factor runs fastest.
    pub fn kron(&self, other: &CsrMatrix<T>) -> CsrMatrix<T> {
        let num_rows = self.num_rows * other.num_rows;
        let num_cols = self.num_cols * other.num_cols;
        let nnz = self.nnz() * other.nnz();

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        let mut col_indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_ptrs.push(0);

        for ia in 0..self.num_rows {
            for ib in 0..other.num_rows {
                for (ja, va) in self.row_entries(ia) {
                    for (jb, vb) in other.row_entries(ib) {
                        col_indices.push(ja * other.num_cols + jb);
                        values.push(va * vb);
                    }
                }
                row_ptrs.push(values.len());
            }
        }

        CsrMatrix {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Assemble a block matrix from sub-matrices
    ///
    /// `row_sizes`/`col_sizes` give the block partition and each entry of
    /// `blocks` places a matrix at block position (block_row, block_col).
    /// Missing blocks are zero; blocks at the same position are summed.
    pub fn from_blocks(
        row_sizes: &[usize],
        col_sizes: &[usize],
        blocks: &[(usize, usize, &CsrMatrix<T>)],
    ) -> CsrMatrix<T> {
        let offsets = |sizes: &[usize]| -> Vec<usize> {
            let mut acc = Vec::with_capacity(sizes.len() + 1);
            acc.push(0);
            for &s in sizes {
                let last = acc[acc.len() - 1];
                acc.push(last + s);
            }
            acc
        };
        let row_offsets = offsets(row_sizes);
        let col_offsets = offsets(col_sizes);

        let total_nnz = blocks.iter().map(|(_, _, m)| m.nnz()).sum();
        let mut triplets = Vec::with_capacity(total_nnz);

        for &(bi, bj, block) in blocks {
            assert_eq!(
                (block.num_rows, block.num_cols),
                (row_sizes[bi], col_sizes[bj]),
                "Block ({}, {}) has the wrong shape",
                bi,
                bj
            );
            for i in 0..block.num_rows {
                for (j, v) in block.row_entries(i) {
                    triplets.push((row_offsets[bi] + i, col_offsets[bj] + j, v));
                }
            }
        }

        CsrMatrix::from_triplets(
            row_offsets[row_sizes.len()],
            col_offsets[col_sizes.len()],
            triplets,
        )
    }

    /// Sparse matrix-matrix product: C = A * B
    ///
    /// Entries that cancel to exactly zero are not stored.
    pub fn matmul(&self, other: &CsrMatrix<T>) -> CsrMatrix<T> {
        assert_eq!(
            self.num_cols, other.num_rows,
            "Matrix dimension mismatch: A.cols ({}) != B.rows ({})",
            self.num_cols, other.num_rows
        );

        let m = self.num_rows;
        let n = other.num_cols;

        if m == 0 || n == 0 || self.nnz() == 0 || other.nnz() == 0 {
            return CsrMatrix::new(m, n);
        }

        let mut row_ptrs = Vec::with_capacity(m + 1);
        let mut col_indices = Vec::with_capacity(self.nnz() * 4);
        let mut values = Vec::with_capacity(self.nnz() * 4);
        row_ptrs.push(0);

        let mut row_data: Vec<(usize, T)> = Vec::new();
        for i in 0..m {
            row_data.clear();
            for (k, a_ik) in self.row_entries(i) {
                for (j, b_kj) in other.row_entries(k) {
                    row_data.push((j, a_ik * b_kj));
                }
            }
            row_data.sort_by_key(|&(j, _)| j);

            let mut iter = row_data.iter().copied();
            if let Some((mut current_j, mut current_val)) = iter.next() {
                for (j, val) in iter {
                    if j == current_j {
                        current_val += val;
                    } else {
                        if current_val != T::zero() {
                            col_indices.push(current_j);
                            values.push(current_val);
                        }
                        current_j = j;
                        current_val = val;
                    }
                }
                if current_val != T::zero() {
                    col_indices.push(current_j);
                    values.push(current_val);
                }
            }
            row_ptrs.push(values.len());
        }

        CsrMatrix {
            num_rows: m,
            num_cols: n,
            values,
            col_indices,
            row_ptrs,
        }
    }
}

impl<T: Scalar> LinearOperator<T> for CsrMatrix<T> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec(x)
    }

    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec_transpose(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn sample() -> CsrMatrix<f64> {
        // [1 0 2]
        // [0 3 0]
        // [4 0 5]
        let dense = array![[1.0, 0.0, 2.0], [0.0, 3.0, 0.0], [4.0, 0.0, 5.0]];
        CsrMatrix::from_dense(&dense, 1e-15)
    }

    #[test]
    fn test_csr_from_dense() {
        let csr = sample();

        assert_eq!(csr.num_rows, 3);
        assert_eq!(csr.num_cols, 3);
        assert_eq!(csr.nnz(), 5);

        assert_relative_eq!(csr.get(0, 0), 1.0);
        assert_relative_eq!(csr.get(0, 2), 2.0);
        assert_relative_eq!(csr.get(1, 1), 3.0);
        assert_relative_eq!(csr.get(2, 0), 4.0);
        assert_relative_eq!(csr.get(2, 2), 5.0);
        assert_relative_eq!(csr.get(1, 0), 0.0);
    }

    #[test]
    fn test_csr_matvec() {
        let dense = array![[1.0, 2.0], [3.0, 4.0]];
        let csr = CsrMatrix::from_dense(&dense, 1e-15);
        let x = array![1.0, 2.0];

        let y = csr.matvec(&x);

        // [1 2] * [1]   [5]
        // [3 4]   [2] = [11]
        assert_relative_eq!(y[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 11.0, epsilon = 1e-12);

        let yt = csr.matvec_transpose(&x);
        assert_relative_eq!(yt[0], 7.0, epsilon = 1e-12);
        assert_relative_eq!(yt[1], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spmv_accumulates() {
        let csr = sample();
        let x = array![1.0, 1.0, 1.0];
        let mut y = array![1.0, 1.0, 1.0];
        csr.spmv(2.0, x.view(), -1.0, y.view_mut());
        assert_relative_eq!(y[0], 5.0);
        assert_relative_eq!(y[1], 5.0);
        assert_relative_eq!(y[2], 17.0);

        let mut z = array![f64::NAN, f64::NAN, f64::NAN];
        csr.spmv(1.0, x.view(), 0.0, z.view_mut());
        assert_relative_eq!(z[2], 9.0);
    }

    #[test]
    fn test_csr_triplets_duplicate() {
        let triplets = vec![(1, 1, 3.0), (0, 0, 1.0), (0, 0, 2.0)];
        let csr = CsrMatrix::from_triplets(3, 2, triplets);

        assert_eq!(csr.nnz(), 2);
        assert_relative_eq!(csr.get(0, 0), 3.0);
        assert_relative_eq!(csr.get(1, 1), 3.0);
        assert_eq!(csr.row_range(2).len(), 0);
    }

    #[test]
    fn test_transpose_matches_dense() {
        let dense = array![[1.0, 0.0, 2.0, 0.0], [0.0, 3.0, 0.0, -1.0]];
        let csr = CsrMatrix::from_dense(&dense, 1e-15);
        let t = csr.transpose();
        assert_eq!(t.to_dense(), dense.t().to_owned());
    }

    #[test]
    fn test_add_and_scale() {
        let a = sample();
        let b: CsrMatrix<f64> = CsrMatrix::identity(3);
        let mut c = a.add(&b.scaled(-1.0));
        assert_relative_eq!(c.get(0, 0), 0.0);
        assert_relative_eq!(c.get(1, 1), 2.0);
        assert_relative_eq!(c.get(0, 2), 2.0);

        c.scale_rows(array![1.0, 2.0, 3.0].view());
        c.scale_cols(array![1.0, 1.0, 0.5].view());
        assert_relative_eq!(c.get(1, 1), 4.0);
        assert_relative_eq!(c.get(2, 2), 6.0);
        assert_relative_eq!(c.get(2, 0), 12.0);
    }

    #[test]
    fn test_kron_matches_definition() {
        let a = CsrMatrix::from_dense(&array![[1.0, 2.0], [0.0, 3.0]], 0.0);
        let b = CsrMatrix::from_dense(&array![[0.0, 1.0, 0.0], [4.0, 0.0, 5.0]], 0.0);
        let k = a.kron(&b).to_dense();
        assert_eq!(k.dim(), (4, 6));
        for ia in 0..2 {
            for ja in 0..2 {
                for ib in 0..2 {
                    for jb in 0..3 {
                        assert_relative_eq!(
                            k[[ia * 2 + ib, ja * 3 + jb]],
                            a.get(ia, ja) * b.get(ib, jb)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_blocks() {
        let a: CsrMatrix<f64> = CsrMatrix::identity(2);
        let b = CsrMatrix::from_dense(&array![[7.0], [8.0]], 0.0);
        let full = CsrMatrix::from_blocks(&[2, 1], &[2, 1], &[(0, 0, &a), (0, 1, &b)]);
        let dense = full.to_dense();
        assert_eq!(dense.dim(), (3, 3));
        assert_relative_eq!(dense[[0, 0]], 1.0);
        assert_relative_eq!(dense[[1, 2]], 8.0);
        assert_relative_eq!(dense[[2, 2]], 0.0);
    }

    #[test]
    fn test_matmul_drops_cancellation() {
        let a = CsrMatrix::from_dense(&array![[1.0, -1.0]], 0.0);
        let b = CsrMatrix::from_dense(&array![[1.0, 2.0], [1.0, 0.0]], 0.0);
        let c = a.matmul(&b);
        assert_eq!(c.nnz(), 1);
        assert_relative_eq!(c.get(0, 1), 2.0);
        assert_relative_eq!(c.max_abs(), 2.0);
    }

    #[test]
    fn test_linear_operator_impl() {
        let csr = sample();
        let x = array![1.0, 2.0, 3.0];

        let y = csr.apply(&x);
        assert_relative_eq!(y[0], 7.0, epsilon = 1e-12);
        assert_relative_eq!(y[2], 19.0, epsilon = 1e-12);

        assert!(csr.is_square());
        assert_eq!(LinearOperator::num_rows(&csr), 3);
    }
}
