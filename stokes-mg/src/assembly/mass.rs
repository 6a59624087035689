//! Consistent mass matrices of the lowest-order Whitney spaces on hexahedra
//!
//! On a tensor-product mesh every basis function factorizes into 1D pieces:
//! hat functions in "node" directions and scaled indicators (1/h on one
//! cell) in "cell" directions. The 3D mass matrices are therefore Kronecker
//! products of two 1D matrices.

use super::{block_diagonal, tensor3};
use crate::mesh::CartesianMesh;
use solvers::CsrMatrix;

/// 1D P1 mass matrix on `n` uniform cells of size `h`
///
/// Assembled from the element matrix h/6·[[2, 1], [1, 2]].
pub fn p1_mass_1d(n: usize, h: f64) -> CsrMatrix<f64> {
    let mut triplets = Vec::with_capacity(4 * n);
    for c in 0..n {
        triplets.push((c, c, h / 3.0));
        triplets.push((c + 1, c + 1, h / 3.0));
        triplets.push((c, c + 1, h / 6.0));
        triplets.push((c + 1, c, h / 6.0));
    }
    CsrMatrix::from_triplets(n + 1, n + 1, triplets)
}

/// 1D mass of the unit-integral cell indicators χ_c / h
pub fn cell_mass_1d(n: usize, h: f64) -> CsrMatrix<f64> {
    CsrMatrix::from_diagonal(&ndarray::Array1::from_elem(n, 1.0 / h))
}

/// H1 (Q1) mass matrix on vertices
pub fn node_mass(mesh: &CartesianMesh) -> CsrMatrix<f64> {
    let n = mesh.cells();
    let h = mesh.spacing();
    tensor3(std::array::from_fn(|a| p1_mass_1d(n[a], h[a])))
}

/// H(curl) mass matrix of the lowest-order Nédélec edge elements
///
/// Edges along different axes are L2-orthogonal, so the matrix is block diagonal.
pub fn edge_mass(mesh: &CartesianMesh) -> CsrMatrix<f64> {
    let n = mesh.cells();
    let h = mesh.spacing();
    let blocks: Vec<CsrMatrix<f64>> = (0..3)
        .map(|axis| {
            tensor3(std::array::from_fn(|a| {
                if a == axis {
                    cell_mass_1d(n[a], h[a])
                } else {
                    p1_mass_1d(n[a], h[a])
                }
            }))
        })
        .collect();
    block_diagonal(&blocks)
}

/// H(div) mass matrix of the lowest-order Raviart-Thomas face elements
pub fn face_mass(mesh: &CartesianMesh) -> CsrMatrix<f64> {
    let n = mesh.cells();
    let h = mesh.spacing();
    let blocks: Vec<CsrMatrix<f64>> = (0..3)
        .map(|normal| {
            tensor3(std::array::from_fn(|a| {
                if a == normal {
                    p1_mass_1d(n[a], h[a])
                } else {
                    cell_mass_1d(n[a], h[a])
                }
            }))
        })
        .collect();
    block_diagonal(&blocks)
}
