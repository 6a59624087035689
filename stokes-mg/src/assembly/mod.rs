//! Discrete de Rham complex assembly
//!
//! Builds everything a Stokes level needs from a mesh: incidence matrices,
//! consistent mass matrices, the Nitsche boundary form and the inter-level
//! interpolation of edge and node fields.

mod incidence;
mod interpolation;
mod mass;

pub use incidence::*;
pub use interpolation::*;
pub use mass::*;

use crate::boundary::{NitscheParameters, assemble_nitsche};
use crate::error::{Result, StokesError};
use crate::mesh::CartesianMesh;
use solvers::CsrMatrix;

/// Tensor product of per-direction factors, x index fastest
pub(crate) fn tensor3(factors: [CsrMatrix<f64>; 3]) -> CsrMatrix<f64> {
    let [fx, fy, fz] = factors;
    fz.kron(&fy.kron(&fx))
}

/// Block-diagonal matrix from square or rectangular blocks
pub(crate) fn block_diagonal(blocks: &[CsrMatrix<f64>]) -> CsrMatrix<f64> {
    let rows: Vec<usize> = blocks.iter().map(|b| b.num_rows).collect();
    let cols: Vec<usize> = blocks.iter().map(|b| b.num_cols).collect();
    let placed: Vec<(usize, usize, &CsrMatrix<f64>)> =
        blocks.iter().enumerate().map(|(i, b)| (i, i, b)).collect();
    CsrMatrix::from_blocks(&rows, &cols, &placed)
}

/// Assembled matrices of one discretization level
#[derive(Debug, Clone)]
pub struct DiscreteComplex {
    /// Gradient incidence (ne x nv)
    pub d0: CsrMatrix<f64>,
    /// Curl incidence (nf x ne)
    pub d1: CsrMatrix<f64>,
    /// H1 mass (nv x nv)
    pub node_mass: CsrMatrix<f64>,
    /// H(curl) mass (ne x ne)
    pub edge_mass: CsrMatrix<f64>,
    /// H(div) mass (nf x nf)
    pub face_mass: CsrMatrix<f64>,
    /// Nitsche boundary form on edges (ne x ne)
    pub nitsche: CsrMatrix<f64>,
}

impl DiscreteComplex {
    /// Number of edges (velocity unknowns)
    pub fn num_edges(&self) -> usize {
        self.d0.num_rows
    }

    /// Number of vertices (pressure unknowns)
    pub fn num_vertices(&self) -> usize {
        self.d0.num_cols
    }

    /// Number of faces
    pub fn num_faces(&self) -> usize {
        self.d1.num_rows
    }

    /// Check that all shapes agree with the incidence matrices
    pub fn validate(&self) -> Result<()> {
        let (ne, nv, nf) = (self.num_edges(), self.num_vertices(), self.num_faces());
        let checks = [
            ("curl incidence", (self.d1.num_rows, self.d1.num_cols), (nf, ne)),
            ("node mass", (self.node_mass.num_rows, self.node_mass.num_cols), (nv, nv)),
            ("edge mass", (self.edge_mass.num_rows, self.edge_mass.num_cols), (ne, ne)),
            ("face mass", (self.face_mass.num_rows, self.face_mass.num_cols), (nf, nf)),
            ("Nitsche form", (self.nitsche.num_rows, self.nitsche.num_cols), (ne, ne)),
        ];
        for (name, got, expected) in checks {
            if got != expected {
                return Err(StokesError::InvalidMesh(format!(
                    "{} has shape {:?}, expected {:?}",
                    name, got, expected
                )));
            }
        }
        Ok(())
    }
}

/// Interpolation of the velocity (edge) and pressure (node) fields between two levels
#[derive(Debug, Clone)]
pub struct FieldProlongation {
    /// Edge interpolation (ne_fine x ne_coarse)
    pub edge: CsrMatrix<f64>,
    /// Node interpolation (nv_fine x nv_coarse)
    pub node: CsrMatrix<f64>,
}

/// Source of meshes and discrete complexes for the multigrid hierarchy
///
/// The hierarchy only talks to this trait, so a different mesh type or
/// element family can be plugged in without touching the cycle.
pub trait ComplexAssembler: Send + Sync {
    /// Mesh type this assembler works on
    type Mesh: Clone + Send + Sync;

    /// Assemble incidence, mass and boundary matrices on `mesh`
    fn assemble(
        &self,
        mesh: &Self::Mesh,
        order: usize,
        nitsche: &NitscheParameters,
    ) -> Result<DiscreteComplex>;

    /// Uniformly refine `mesh`
    fn refine(&self, mesh: &Self::Mesh) -> Self::Mesh;

    /// Interpolation operators from `coarse` to `fine`
    fn prolongation(&self, coarse: &Self::Mesh, fine: &Self::Mesh) -> Result<FieldProlongation>;
}

/// Lowest-order Whitney forms on Cartesian hexahedral meshes
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitneyHexAssembler;

impl ComplexAssembler for WhitneyHexAssembler {
    type Mesh = CartesianMesh;

    fn assemble(
        &self,
        mesh: &CartesianMesh,
        order: usize,
        nitsche: &NitscheParameters,
    ) -> Result<DiscreteComplex> {
        if order != 1 {
            return Err(StokesError::UnsupportedOrder(order));
        }

        let complex = DiscreteComplex {
            d0: gradient_incidence(mesh),
            d1: curl_incidence(mesh),
            node_mass: node_mass(mesh),
            edge_mass: edge_mass(mesh),
            face_mass: face_mass(mesh),
            nitsche: assemble_nitsche(mesh, nitsche),
        };
        complex.validate()?;

        log::debug!(
            "Assembled complex on {:?} cells: {} vertices, {} edges, {} faces",
            mesh.cells(),
            complex.num_vertices(),
            complex.num_edges(),
            complex.num_faces()
        );
        Ok(complex)
    }

    fn refine(&self, mesh: &CartesianMesh) -> CartesianMesh {
        mesh.refined()
    }

    fn prolongation(
        &self,
        coarse: &CartesianMesh,
        fine: &CartesianMesh,
    ) -> Result<FieldProlongation> {
        Ok(FieldProlongation {
            edge: edge_prolongation(coarse, fine)?,
            node: node_prolongation(coarse, fine)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::unit_cube;

    #[test]
    fn test_tensor3_ordering() {
        // diag(1, 2) in x, identity elsewhere: value depends only on the x index
        let fx = CsrMatrix::from_diagonal(&ndarray::Array1::from_vec(vec![1.0, 2.0]));
        let t = tensor3([fx, CsrMatrix::identity(3), CsrMatrix::identity(2)]);
        assert_eq!(t.num_rows, 12);
        for r in 0..12 {
            assert_eq!(t.get(r, r), if r % 2 == 0 { 1.0 } else { 2.0 });
        }
    }

    #[test]
    fn test_assemble_shapes() {
        let mesh = unit_cube(2);
        let complex = WhitneyHexAssembler
            .assemble(&mesh, 1, &NitscheParameters::default())
            .expect("assembly succeeds");
        assert_eq!(complex.num_edges(), mesh.num_edges());
        assert_eq!(complex.num_vertices(), mesh.num_vertices());
        assert_eq!(complex.num_faces(), mesh.num_faces());
        assert!(complex.validate().is_ok());
    }

    #[test]
    fn test_higher_order_rejected() {
        let err = WhitneyHexAssembler
            .assemble(&unit_cube(1), 2, &NitscheParameters::default())
            .unwrap_err();
        assert!(matches!(err, StokesError::UnsupportedOrder(2)));
    }

    #[test]
    fn test_validate_detects_shape_mismatch() {
        let mesh = unit_cube(1);
        let mut complex = WhitneyHexAssembler
            .assemble(&mesh, 1, &NitscheParameters::default())
            .expect("assembly succeeds");
        complex.face_mass = CsrMatrix::identity(3);
        assert!(complex.validate().is_err());
    }
}
