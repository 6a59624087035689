//! Error types for discretization and multigrid construction.
//!
//! Contract violations (dimension mismatches, out-of-range level indices)
//! panic; the variants here cover configuration problems that are detected
//! while a level is being built.

use crate::config::MassLumping;
use solvers::LuError;
use thiserror::Error;

/// Errors raised while assembling operators or growing the hierarchy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StokesError {
    /// The requested mass-lumping scheme has no implementation.
    #[error("mass lumping scheme {0:?} is not implemented")]
    UnimplementedLumping(MassLumping),

    /// Only lowest-order Whitney forms are available.
    #[error("polynomial order {0} is not supported (only order 1)")]
    UnsupportedOrder(usize),

    /// The smoother needs a lumped DEC-mode operator.
    #[error("smoother precondition violated: {0}")]
    SmootherPrecondition(&'static str),

    /// The fine mesh is not the uniform refinement of the coarse mesh.
    #[error("meshes are not nested: coarse cells {coarse:?}, fine cells {fine:?}")]
    NonNestedMeshes {
        /// Cells per direction on the coarse mesh
        coarse: [usize; 3],
        /// Cells per direction on the fine mesh
        fine: [usize; 3],
    },

    /// Mesh description is degenerate.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Direct factorization of the coarse system failed.
    #[error("coarse factorization failed: {0}")]
    CoarseFactorization(#[from] LuError),

    /// The coarse direct solve returned NaN or infinite values.
    #[error("coarse direct solve produced non-finite values")]
    NonFiniteCoarseSolution,
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, StokesError>;

impl StokesError {
    /// Returns `true` for errors caused by the solver parameters rather than the mesh.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            StokesError::UnimplementedLumping(_)
                | StokesError::UnsupportedOrder(_)
                | StokesError::SmootherPrecondition(_)
        )
    }

    /// Returns `true` for failures of the coarse direct solver.
    pub fn is_coarse_solver_error(&self) -> bool {
        matches!(
            self,
            StokesError::CoarseFactorization(_) | StokesError::NonFiniteCoarseSolution
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StokesError::UnimplementedLumping(MassLumping::Barycentric);
        assert_eq!(
            err.to_string(),
            "mass lumping scheme Barycentric is not implemented"
        );

        let err = StokesError::NonNestedMeshes {
            coarse: [1, 1, 1],
            fine: [3, 2, 2],
        };
        assert!(err.to_string().contains("[3, 2, 2]"));
    }

    #[test]
    fn test_error_classification() {
        assert!(StokesError::UnsupportedOrder(2).is_configuration_error());
        assert!(!StokesError::UnsupportedOrder(2).is_coarse_solver_error());
        assert!(StokesError::NonFiniteCoarseSolution.is_coarse_solver_error());

        let lu: StokesError = LuError::SingularMatrix { pivot: 3 }.into();
        assert!(matches!(lu, StokesError::CoarseFactorization(_)));
        assert!(!lu.is_configuration_error());
        assert!(lu.is_coarse_solver_error());
    }
}
