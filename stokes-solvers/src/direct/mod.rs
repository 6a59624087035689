//! Direct solvers for linear systems
//!
//! - [`lu_factorize`] / [`LuFactorization`]: dense LU with partial pivoting,
//!   factorized once and reused for many right-hand sides
//! - [`lu_solve`]: one-shot convenience wrapper

mod lu;

pub use lu::{LuError, LuFactorization, lu_factorize, lu_solve};
