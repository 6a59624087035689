//! Mesh types, generators and refinement
//!
//! This module provides the structured hexahedral meshes on which the
//! lowest-order de Rham complex is assembled.

mod boundary;
mod generators;
mod refinement;
mod types;

pub use generators::*;
pub use refinement::*;
pub use types::*;
