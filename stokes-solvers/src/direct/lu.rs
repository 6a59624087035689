//! LU decomposition solver
//!
//! Dense LU factorization with partial pivoting. Intended for small systems,
//! such as the coarsest level of a multigrid hierarchy, where the factors are
//! computed once and reused for every solve.
//!
//! The matrix is equilibrated (rows and columns scaled to unit max norm)
//! before elimination, so the singularity test on the pivots does not depend
//! on the units of the unknowns. A pivot below `PIVOT_TOLERANCE · n · ε` of
//! the equilibrated matrix is reported as singular.

use crate::sparse::CsrMatrix;
use crate::traits::Scalar;
use ndarray::{Array1, Array2, Axis};
use thiserror::Error;

/// Multiple of n·ε below which an equilibrated pivot counts as zero
pub const PIVOT_TOLERANCE: f64 = 1e3;

const EQUILIBRATION_SWEEPS: usize = 40;

/// Errors that can occur during LU factorization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuError {
    #[error("Matrix is singular or nearly singular (pivot {pivot} vanished)")]
    SingularMatrix { pivot: usize },
    #[error("Matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// LU factorization result
///
/// Stores L and U factors of Dr·A·Dc along with the row interchanges and
/// the equilibration scalings Dr, Dc
#[derive(Debug, Clone)]
pub struct LuFactorization<T: Scalar> {
    /// Combined L and U matrices (L is unit lower triangular, stored below diagonal)
    pub lu: Array2<T>,
    /// Row interchanges: at step k, row k was swapped with row `pivots[k]`
    pub pivots: Vec<usize>,
    /// Row scaling Dr
    pub row_scale: Array1<T>,
    /// Column scaling Dc
    pub col_scale: Array1<T>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: Scalar> LuFactorization<T> {
    /// Factorize a sparse matrix through its dense representation
    pub fn from_csr(a: &CsrMatrix<T>) -> Result<Self, LuError> {
        lu_factorize(&a.to_dense())
    }

    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        // Dr·A·Dc y = Dr b, x = Dc y
        let mut x = b * &self.row_scale;

        for (k, &p) in self.pivots.iter().enumerate() {
            if p != k {
                x.swap(k, p);
            }
        }

        // Forward substitution: Ly = Pb
        for i in 0..self.n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                x[i] = x[i] - l_ij * x[j];
            }
        }

        // Backward substitution: Ux = y (pivots were checked when factorizing)
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                let u_ij = self.lu[[i, j]];
                x[i] = x[i] - u_ij * x[j];
            }
            x[i] /= self.lu[[i, i]];
        }

        x.zip_mut_with(&self.col_scale, |v, &c| *v = *v * c);
        Ok(x)
    }
}

fn max_abs<'a, T: Scalar>(values: impl Iterator<Item = &'a T>) -> T {
    values.fold(T::zero(), |m, &v| m.max(v.abs()))
}

/// Scale rows and columns of `a` in place until every row and column has
/// unit max norm (Ruiz iteration); returns (Dr, Dc)
fn equilibrate<T: Scalar>(a: &mut Array2<T>) -> Result<(Array1<T>, Array1<T>), LuError> {
    let n = a.nrows();
    let mut row_scale = Array1::from_elem(n, T::one());
    let mut col_scale = Array1::from_elem(n, T::one());
    let balanced = T::from_real(1e-3);

    for _ in 0..EQUILIBRATION_SWEEPS {
        let row_max = a.map_axis(Axis(1), |row| max_abs(row.iter()));
        let col_max = a.map_axis(Axis(0), |col| max_abs(col.iter()));

        // An empty row or column makes the matrix exactly singular
        if let Some(i) = row_max.iter().position(|&m| m == T::zero()) {
            return Err(LuError::SingularMatrix { pivot: i });
        }
        if let Some(j) = col_max.iter().position(|&m| m == T::zero()) {
            return Err(LuError::SingularMatrix { pivot: j });
        }

        let done = row_max
            .iter()
            .chain(col_max.iter())
            .all(|&m| (m - T::one()).abs() < balanced);
        if done {
            break;
        }

        let dr = row_max.mapv(|m| T::one() / m.sqrt());
        let dc = col_max.mapv(|m| T::one() / m.sqrt());
        for ((i, j), v) in a.indexed_iter_mut() {
            *v = *v * dr[i] * dc[j];
        }
        row_scale.zip_mut_with(&dr, |s, &d| *s = *s * d);
        col_scale.zip_mut_with(&dc, |s, &d| *s = *s * d);
    }

    Ok((row_scale, col_scale))
}

/// Compute LU factorization with partial pivoting
///
/// Fails with [`LuError::SingularMatrix`] when the matrix is singular or so
/// ill-conditioned that a pivot of the equilibrated matrix drops below
/// `PIVOT_TOLERANCE · n · ε`.
pub fn lu_factorize<T: Scalar>(a: &Array2<T>) -> Result<LuFactorization<T>, LuError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let mut lu = a.clone();
    let (row_scale, col_scale) = equilibrate(&mut lu)?;
    let mut pivots: Vec<usize> = Vec::with_capacity(n);
    let tiny = T::from_real(PIVOT_TOLERANCE * n as f64) * T::epsilon();

    for k in 0..n {
        // Find pivot
        let mut max_val = lu[[k, k]].abs();
        let mut max_row = k;

        for i in (k + 1)..n {
            let val = lu[[i, k]].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val <= tiny {
            return Err(LuError::SingularMatrix { pivot: k });
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
        }
        pivots.push(max_row);

        // Compute multipliers and eliminate
        let pivot = lu[[k, k]];
        for i in (k + 1)..n {
            let mult = lu[[i, k]] / pivot;
            lu[[i, k]] = mult;

            if mult == T::zero() {
                continue;
            }
            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization {
        lu,
        pivots,
        row_scale,
        col_scale,
        n,
    })
}

/// Solve Ax = b using LU decomposition
///
/// This is a convenience function that combines factorization and solve.
pub fn lu_solve<T: Scalar>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, LuError> {
    let factorization = lu_factorize(a)?;
    factorization.solve(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_lu_solve_real() {
        let a = array![[4.0_f64, 1.0], [1.0, 3.0],];

        let b = array![1.0_f64, 2.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_needs_row_interchanges() {
        // Zero leading pivot and a cyclic permutation of rows
        let a = array![[0.0_f64, 1.0, 0.0], [0.0, 0.0, 2.0], [3.0, 0.0, 0.0]];
        let b = array![1.0_f64, 4.0, 9.0];

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        assert_relative_eq!(x[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_lu_identity() {
        let n = 5;
        let a = Array2::from_diag(&Array1::from_elem(n, 1.0_f64));
        let b = Array1::from_iter((1..=n).map(|i| i as f64));

        let x = lu_solve(&a, &b).expect("LU solve should succeed");

        for i in 0..n {
            assert_relative_eq!(x[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_singular() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0],];

        let b = array![1.0_f64, 2.0];

        let result = lu_solve(&a, &b);
        assert!(matches!(result, Err(LuError::SingularMatrix { .. })));
    }

    #[test]
    fn test_lu_nearly_rank_deficient_is_singular() {
        let a = array![[1.0_f64, 1.0], [1.0, 1.0 + 1e-15]];
        let result = lu_factorize(&a);
        assert!(matches!(result, Err(LuError::SingularMatrix { .. })));
    }

    #[test]
    fn test_lu_zero_row_is_singular() {
        let a = array![[1.0_f64, 2.0], [0.0, 0.0]];
        assert!(matches!(
            lu_factorize(&a),
            Err(LuError::SingularMatrix { pivot: 1 })
        ));
    }

    #[test]
    fn test_lu_independent_of_units() {
        // Same system with rows and columns in wildly different units
        let a = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let rows = array![1e-20_f64, 1.0, 1e15];
        let cols = array![1e12_f64, 1e-18, 1.0];
        let scaled = Array2::from_shape_fn((3, 3), |(i, j)| rows[i] * a[[i, j]] * cols[j]);

        let b = array![1.0_f64, 2.0, 3.0];
        let expected = lu_solve(&a, &b).expect("LU solve should succeed");

        // scaled · (x / cols) = rows · b
        let x = lu_solve(&scaled, &(&b * &rows)).expect("scaled system is well posed");
        for i in 0..3 {
            assert_relative_eq!(x[i] * cols[i], expected[i], max_relative = 1e-10);
        }
    }

    #[test]
    fn test_lu_dimension_mismatch() {
        let a = array![[1.0_f64, 0.0], [0.0, 1.0]];
        let factorization = lu_factorize(&a).expect("Factorization should succeed");
        let result = factorization.solve(&array![1.0, 2.0, 3.0]);
        assert_eq!(
            result.unwrap_err(),
            LuError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_lu_from_csr_and_reuse() {
        let triplets = vec![
            (0, 0, 4.0_f64),
            (0, 1, 1.0),
            (1, 0, 1.0),
            (1, 1, 3.0),
            (1, 2, 1.0),
            (2, 1, 1.0),
            (2, 2, 2.0),
        ];
        let csr = CsrMatrix::from_triplets(3, 3, triplets);
        let dense = csr.to_dense();

        let factorization = LuFactorization::from_csr(&csr).expect("Factorization should succeed");

        for b in [array![1.0_f64, 2.0, 3.0], array![4.0_f64, 5.0, 6.0]] {
            let x = factorization.solve(&b).expect("Solve should succeed");
            let ax = dense.dot(&x);
            for i in 0..3 {
                assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
            }
        }
    }
}
