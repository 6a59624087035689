//! Sparse matrix formats and kernels
//!
//! - [`CsrMatrix`]: compressed sparse row storage with products, transposes,
//!   Kronecker products and block assembly
//! - relaxation sweeps (Gauss-Seidel, Jacobi) as inherent methods on [`CsrMatrix`]

mod csr;
mod relaxation;

pub use csr::CsrMatrix;
