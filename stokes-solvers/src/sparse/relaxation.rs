//! Point relaxation sweeps on CSR matrices
//!
//! Each sweep approximately solves `A x = b` and updates `x` in place.
//! Rows whose diagonal is (numerically) zero are left untouched.

use super::CsrMatrix;
use crate::traits::Scalar;
use ndarray::{ArrayView1, ArrayViewMut1};

impl<T: Scalar> CsrMatrix<T> {
    /// One forward (row 0 to n-1) Gauss-Seidel sweep
    pub fn gauss_seidel_forward(&self, b: ArrayView1<T>, mut x: ArrayViewMut1<T>) {
        self.check_relaxation_shapes(b.len(), x.len());
        for i in 0..self.num_rows {
            self.relax_row(i, &b, &mut x);
        }
    }

    /// One backward (row n-1 to 0) Gauss-Seidel sweep
    pub fn gauss_seidel_backward(&self, b: ArrayView1<T>, mut x: ArrayViewMut1<T>) {
        self.check_relaxation_shapes(b.len(), x.len());
        for i in (0..self.num_rows).rev() {
            self.relax_row(i, &b, &mut x);
        }
    }

    /// Diagonal scaling: x_i = b_i / a_ii
    ///
    /// This is one undamped Jacobi step from a zero initial guess.
    pub fn jacobi_scale(&self, b: ArrayView1<T>, mut x: ArrayViewMut1<T>) {
        self.check_relaxation_shapes(b.len(), x.len());
        let tiny = T::from_real(1e-300);
        for i in 0..self.num_rows {
            let d = self.get(i, i);
            if d.abs() > tiny {
                x[i] = b[i] / d;
            }
        }
    }

    #[inline]
    fn relax_row(&self, i: usize, b: &ArrayView1<T>, x: &mut ArrayViewMut1<T>) {
        let mut sum = b[i];
        let mut diag = T::zero();
        for (j, a_ij) in self.row_entries(i) {
            if j == i {
                diag = a_ij;
            } else {
                sum -= a_ij * x[j];
            }
        }
        if diag.abs() > T::from_real(1e-300) {
            x[i] = sum / diag;
        }
    }

    fn check_relaxation_shapes(&self, b_len: usize, x_len: usize) {
        assert_eq!(self.num_rows, self.num_cols, "Relaxation needs a square matrix");
        assert_eq!(b_len, self.num_rows, "Right-hand side size mismatch");
        assert_eq!(x_len, self.num_rows, "Iterate size mismatch");
    }
}
