//! Linear algebra kernels for the Stokes multigrid workspace
//!
//! This crate provides the sparse and dense building blocks that the
//! discretization and multigrid crate consumes.
//!
//! # Features
//!
//! - **Sparse matrices**: CSR format with products, transposes, Kronecker
//!   products, block assembly and Gauss-Seidel/Jacobi relaxation
//! - **Direct solvers**: dense LU decomposition with partial pivoting
//! - **Iterative solvers**: restarted GMRES, plain and left-preconditioned
//! - **Generic scalar types**: works with f64 and f32
//!
//! # Example
//!
//! ```ignore
//! use solvers::{CsrMatrix, GmresConfig, gmres};
//!
//! let matrix = CsrMatrix::from_triplets(n, n, triplets);
//! let solution = gmres(&matrix, &rhs, &GmresConfig::default());
//! assert!(solution.converged);
//! ```

pub mod direct;
pub mod iterative;
pub mod sparse;
pub mod traits;
pub mod vector;

// Re-export main types
pub use sparse::CsrMatrix;
pub use traits::{IdentityPreconditioner, LinearOperator, Preconditioner, Scalar};

// Re-export iterative solvers
pub use iterative::{
    GmresConfig, GmresSolution, gmres, gmres_preconditioned, gmres_preconditioned_with_guess,
    gmres_with_guess,
};

// Re-export direct solvers
pub use direct::{LuError, LuFactorization, lu_factorize, lu_solve};
