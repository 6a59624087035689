//! Incidence matrices of the cubical de Rham complex
//!
//! All three maps are tensor products of the 1D difference operator
//! (nodes -> cells) with identities, which makes d1·d0 = 0 and d2·d1 = 0
//! hold exactly (the two orderings of mixed differences cancel term by term).

use super::tensor3;
use crate::mesh::CartesianMesh;
use solvers::CsrMatrix;

/// 1D difference operator: (n cells) x (n + 1 nodes), -1 at the start node, +1 at the end
pub fn difference_1d(n: usize) -> CsrMatrix<f64> {
    let mut triplets = Vec::with_capacity(2 * n);
    for c in 0..n {
        triplets.push((c, c, -1.0));
        triplets.push((c, c + 1, 1.0));
    }
    CsrMatrix::from_triplets(n, n + 1, triplets)
}

/// Discrete gradient d0: vertices -> edges (ne x nv)
pub fn gradient_incidence(mesh: &CartesianMesh) -> CsrMatrix<f64> {
    let n = mesh.cells();
    let blocks: Vec<CsrMatrix<f64>> = (0..3)
        .map(|axis| {
            tensor3(std::array::from_fn(|a| {
                if a == axis {
                    difference_1d(n[a])
                } else {
                    CsrMatrix::identity(n[a] + 1)
                }
            }))
        })
        .collect();

    let rows: Vec<usize> = (0..3).map(|a| mesh.num_edges_along(a)).collect();
    CsrMatrix::from_blocks(
        &rows,
        &[mesh.num_vertices()],
        &[(0, 0, &blocks[0]), (1, 0, &blocks[1]), (2, 0, &blocks[2])],
    )
}

/// Discrete curl d1: edges -> faces (nf x ne)
///
/// The face with normal `a` collects the edges along the two other axes;
/// circulation follows the right-hand rule around +a.
pub fn curl_incidence(mesh: &CartesianMesh) -> CsrMatrix<f64> {
    let n = mesh.cells();
    let mut blocks: Vec<(usize, usize, CsrMatrix<f64>)> = Vec::with_capacity(6);

    for normal in 0..3 {
        for edge_axis in (0..3).filter(|&b| b != normal) {
            let diff_axis = 3 - normal - edge_axis;
            let block = tensor3(std::array::from_fn(|a| {
                if a == diff_axis {
                    difference_1d(n[a])
                } else if a == normal {
                    CsrMatrix::identity(n[a] + 1)
                } else {
                    CsrMatrix::identity(n[a])
                }
            }));
            // Edges one step ahead of the normal in cyclic order enter with a minus sign
            let sign = if (edge_axis + 3 - normal) % 3 == 1 {
                -1.0
            } else {
                1.0
            };
            blocks.push((normal, edge_axis, block.scaled(sign)));
        }
    }

    let rows: Vec<usize> = (0..3).map(|a| mesh.num_faces_normal_to(a)).collect();
    let cols: Vec<usize> = (0..3).map(|a| mesh.num_edges_along(a)).collect();
    let refs: Vec<(usize, usize, &CsrMatrix<f64>)> =
        blocks.iter().map(|(i, j, m)| (*i, *j, m)).collect();
    CsrMatrix::from_blocks(&rows, &cols, &refs)
}

/// Discrete divergence d2: faces -> cells (nc x nf)
pub fn divergence_incidence(mesh: &CartesianMesh) -> CsrMatrix<f64> {
    let n = mesh.cells();
    let blocks: Vec<CsrMatrix<f64>> = (0..3)
        .map(|normal| {
            tensor3(std::array::from_fn(|a| {
                if a == normal {
                    difference_1d(n[a])
                } else {
                    CsrMatrix::identity(n[a])
                }
            }))
        })
        .collect();

    let cols: Vec<usize> = (0..3).map(|a| mesh.num_faces_normal_to(a)).collect();
    CsrMatrix::from_blocks(
        &[mesh.num_cells()],
        &cols,
        &[(0, 0, &blocks[0]), (0, 1, &blocks[1]), (0, 2, &blocks[2])],
    )
}
