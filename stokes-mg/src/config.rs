//! Discretization and smoother parameters
//!
//! Everything here is plain data with serde support so callers can keep
//! solver settings next to the rest of their JSON/TOML configuration.

use crate::boundary::NitscheParameters;
use serde::{Deserialize, Serialize};

/// How consistent mass matrices are replaced by diagonals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassLumping {
    /// No lumping; only Galerkin mode is usable
    None,
    /// Diagonal of the consistent mass matrix
    #[default]
    Diagonal,
    /// Barycentric dual-cell volumes (not implemented)
    Barycentric,
}

/// Representation used when applying the Stokes operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorMode {
    /// Finite-element bilinear forms with consistent masses
    Galerkin,
    /// Discrete exterior calculus with lumped (diagonal) masses
    #[default]
    Dec,
}

/// Inner relaxation used by the distributive Gauss-Seidel smoother
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmootherKind {
    /// One forward Gauss-Seidel sweep per field
    #[default]
    GaussSeidelForward,
    /// Forward followed by backward sweep per field
    GaussSeidelSymmetric,
    /// Damped diagonal scaling per field (weakest, kept for comparison)
    Jacobi,
}

/// Multigrid cycle shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleType {
    /// One coarse-grid visit per level
    #[default]
    VCycle,
    /// Two coarse-grid visits per level
    WCycle,
}

/// Parameters for building one level of the discretization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StokesParameters {
    /// Polynomial order of the Whitney spaces
    #[serde(default = "default_order")]
    pub order: usize,
    /// Nitsche symmetry switch (1 symmetric, -1 skew, 0 incomplete)
    #[serde(default = "default_theta")]
    pub theta: f64,
    /// Nitsche penalty coefficient
    #[serde(default = "default_penalty")]
    pub penalty: f64,
    /// Global scaling of the Nitsche boundary form
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// Mass lumping scheme
    #[serde(default)]
    pub lumping: MassLumping,
    /// Smoother relaxation kind
    #[serde(default)]
    pub smoother: SmootherKind,
}

fn default_order() -> usize {
    1
}

fn default_theta() -> f64 {
    1.0
}

fn default_penalty() -> f64 {
    10.0
}

fn default_factor() -> f64 {
    1.0
}

impl Default for StokesParameters {
    fn default() -> Self {
        Self {
            order: default_order(),
            theta: default_theta(),
            penalty: default_penalty(),
            factor: default_factor(),
            lumping: MassLumping::default(),
            smoother: SmootherKind::default(),
        }
    }
}

impl StokesParameters {
    /// Parameters of the Nitsche boundary form
    pub fn nitsche(&self) -> NitscheParameters {
        NitscheParameters {
            theta: self.theta,
            penalty: self.penalty,
            factor: self.factor,
        }
    }

    /// Builder-style override of the Nitsche penalty
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    /// Builder-style override of the smoother kind
    pub fn with_smoother(mut self, smoother: SmootherKind) -> Self {
        self.smoother = smoother;
        self
    }

    /// Builder-style override of the lumping scheme
    pub fn with_lumping(mut self, lumping: MassLumping) -> Self {
        self.lumping = lumping;
        self
    }
}

/// Traversal settings of the multigrid solver
///
/// These can be changed between calls without rebuilding the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultigridConfig {
    pub cycle_type: CycleType,
    /// Smoother sweeps before the coarse-grid correction
    pub pre_smooth: usize,
    /// Smoother sweeps after the coarse-grid correction
    pub post_smooth: usize,
    /// Representation of the right-hand side passed to `mult`
    pub operator_mode: OperatorMode,
    /// Start from the incoming iterate (true) or from zero (false)
    pub iterative_mode: bool,
}

impl Default for MultigridConfig {
    fn default() -> Self {
        Self {
            cycle_type: CycleType::VCycle,
            pre_smooth: 1,
            post_smooth: 1,
            operator_mode: OperatorMode::Dec,
            iterative_mode: true,
        }
    }
}
