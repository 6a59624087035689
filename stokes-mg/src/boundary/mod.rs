//! Boundary treatment for the velocity field
//!
//! The tangential no-slip condition u × n = 0 is imposed weakly with
//! Nitsche's method, so no degrees of freedom are eliminated and every
//! level of the hierarchy keeps the full edge space.

mod nitsche;

pub use nitsche::*;
