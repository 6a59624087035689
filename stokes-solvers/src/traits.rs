//! Core traits for linear algebra operations
//!
//! This module defines the abstractions shared by the solvers:
//! - [`Scalar`]: real floating-point element type
//! - [`LinearOperator`]: anything that can perform matrix-vector products
//! - [`Preconditioner`]: approximate inverses used by Krylov methods

use ndarray::Array1;
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;

/// Real scalar type usable in the sparse kernels and solvers.
///
/// Provided for `f64` (the default for the Stokes discretization) and `f32`.
pub trait Scalar:
    Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static
{
    /// Convert a double-precision literal into this type
    fn from_real(r: f64) -> Self;

    /// Squared magnitude
    #[inline]
    fn norm_sqr(&self) -> Self {
        *self * *self
    }

    /// Check if this is approximately zero
    #[inline]
    fn is_zero_approx(&self, tol: Self) -> bool {
        self.abs() < tol
    }
}

impl Scalar for f64 {
    #[inline]
    fn from_real(r: f64) -> Self {
        r
    }
}

impl Scalar for f32 {
    #[inline]
    fn from_real(r: f64) -> Self {
        r as f32
    }
}

/// Trait for linear operators (matrices) that can perform matrix-vector products.
///
/// Solvers work with assembled sparse matrices and matrix-free operators
/// interchangeably through this trait.
pub trait LinearOperator<T: Scalar>: Send + Sync {
    /// Number of rows in the operator
    fn num_rows(&self) -> usize;

    /// Number of columns in the operator
    fn num_cols(&self) -> usize;

    /// Apply the operator: y = A * x
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// Apply the transpose: y = A^T * x
    fn apply_transpose(&self, x: &Array1<T>) -> Array1<T>;

    /// Check if the operator is square
    fn is_square(&self) -> bool {
        self.num_rows() == self.num_cols()
    }
}

/// Trait for preconditioners used in iterative solvers.
///
/// A preconditioner M approximates A^(-1), so that M*A is better conditioned
/// than A alone.
pub trait Preconditioner<T: Scalar>: Send + Sync {
    /// Apply the preconditioner: y = M * r
    fn apply(&self, r: &Array1<T>) -> Array1<T>;
}

/// Identity preconditioner (no preconditioning)
#[derive(Clone, Debug, Default)]
pub struct IdentityPreconditioner;

impl<T: Scalar> Preconditioner<T> for IdentityPreconditioner {
    fn apply(&self, r: &Array1<T>) -> Array1<T> {
        r.clone()
    }
}
