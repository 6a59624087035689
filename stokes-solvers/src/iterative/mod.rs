//! Iterative solvers for linear systems
//!
//! - [`gmres`]: restarted GMRES for general non-symmetric systems
//! - [`gmres_preconditioned`]: left-preconditioned restarted GMRES

mod gmres;

pub use gmres::{
    GmresConfig, GmresSolution, gmres, gmres_preconditioned, gmres_preconditioned_with_guess,
    gmres_with_guess,
};
