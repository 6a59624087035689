//! Geometric multigrid for Stokes-Nitsche discretizations in DEC form
//!
//! This crate discretizes the Stokes problem in curl-curl/grad-div form with
//! lowest-order Whitney forms on Cartesian hexahedral meshes and solves it
//! with a geometric multigrid using distributive Gauss-Seidel smoothing.
//!
//! # Features
//!
//! - **Discrete complex**: incidence matrices d0, d1, d2 with d1·d0 = 0 exactly
//! - **Two representations**: consistent Galerkin and lumped-mass DEC operators
//! - **Weak boundary conditions**: Nitsche form for tangential no-slip
//! - **Multigrid**: V- and W-cycles, mass-weighted restriction, direct coarse solve
//! - **Krylov integration**: the hierarchy doubles as a GMRES preconditioner
//!
//! # Example
//!
//! ```ignore
//! use stokes::{StokesMultigrid, StokesParameters, WhitneyHexAssembler, mesh};
//!
//! let params = StokesParameters::default().with_penalty(9.0);
//! let mut mg = StokesMultigrid::with_refinements(
//!     WhitneyHexAssembler,
//!     mesh::unit_cube(1),
//!     params,
//!     4,
//! )?;
//! let result = mg.solve(&b, &mut x, 128, 1e-6);
//! ```

pub mod assembly;
pub mod boundary;
pub mod config;
pub mod error;
pub mod mesh;
pub mod multigrid;
pub mod operator;
pub mod quadrature;

pub use assembly::{ComplexAssembler, DiscreteComplex, FieldProlongation, WhitneyHexAssembler};
pub use boundary::NitscheParameters;
pub use config::{
    CycleType, MassLumping, MultigridConfig, OperatorMode, SmootherKind, StokesParameters,
};
pub use error::{Result, StokesError};
pub use mesh::{CartesianMesh, DofSpace, Point};
pub use multigrid::{
    CoarseStatus, DgsSmoother, LevelTransfer, MultigridPreconditioner, MultigridResult,
    StokesMultigrid,
};
pub use operator::{LumpedMasses, StokesOperator};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
