//! Numerical quadrature rules

mod gauss;

pub use gauss::*;
