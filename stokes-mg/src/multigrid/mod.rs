//! Geometric multigrid for the Stokes-Nitsche system
//!
//! Provides the level hierarchy, V- and W-cycles with distributive
//! Gauss-Seidel smoothing, mass-weighted transfer operators and a
//! preconditioner wrapper for Krylov solvers.

mod cycle;
mod hierarchy;
mod smoother;
mod transfer;

pub use cycle::*;
pub use hierarchy::*;
pub use smoother::*;
pub use transfer::*;
