//! Coarse-to-fine interpolation of nodal and edge fields
//!
//! Built per direction and combined with Kronecker products, like the mass
//! matrices. The edge interpolation commutes with the gradient:
//! P_edge · d0_coarse = d0_fine · P_node.

use super::{block_diagonal, tensor3};
use crate::error::{Result, StokesError};
use crate::mesh::CartesianMesh;
use solvers::CsrMatrix;

/// 1D nodal interpolation from `n` to `2n` cells ((2n + 1) x (n + 1))
///
/// Coincident nodes copy the coarse value, midpoints average their two neighbours.
pub fn node_prolongation_1d(n: usize) -> CsrMatrix<f64> {
    let mut triplets = Vec::with_capacity(3 * n + 1);
    for c in 0..=n {
        triplets.push((2 * c, c, 1.0));
    }
    for c in 0..n {
        triplets.push((2 * c + 1, c, 0.5));
        triplets.push((2 * c + 1, c + 1, 0.5));
    }
    CsrMatrix::from_triplets(2 * n + 1, n + 1, triplets)
}

/// 1D interpolation of unit-integral cell functions from `n` to `2n` cells (2n x n)
pub fn cell_prolongation_1d(n: usize) -> CsrMatrix<f64> {
    let triplets = (0..n)
        .flat_map(|c| [(2 * c, c, 0.5), (2 * c + 1, c, 0.5)])
        .collect();
    CsrMatrix::from_triplets(2 * n, n, triplets)
}

fn check_nested(coarse: &CartesianMesh, fine: &CartesianMesh) -> Result<()> {
    if fine.is_refinement_of(coarse) {
        Ok(())
    } else {
        Err(StokesError::NonNestedMeshes {
            coarse: coarse.cells(),
            fine: fine.cells(),
        })
    }
}

/// Trilinear interpolation of vertex values (nv_fine x nv_coarse)
pub fn node_prolongation(coarse: &CartesianMesh, fine: &CartesianMesh) -> Result<CsrMatrix<f64>> {
    check_nested(coarse, fine)?;
    let n = coarse.cells();
    Ok(tensor3(std::array::from_fn(|a| node_prolongation_1d(n[a]))))
}

/// Interpolation of lowest-order edge fields (ne_fine x ne_coarse)
///
/// Each fine edge lies inside a single coarse edge, face or cell, so the
/// coarse Whitney field is reproduced exactly on the fine mesh.
pub fn edge_prolongation(coarse: &CartesianMesh, fine: &CartesianMesh) -> Result<CsrMatrix<f64>> {
    check_nested(coarse, fine)?;
    let n = coarse.cells();
    let blocks: Vec<CsrMatrix<f64>> = (0..3)
        .map(|axis| {
            tensor3(std::array::from_fn(|a| {
                if a == axis {
                    cell_prolongation_1d(n[a])
                } else {
                    node_prolongation_1d(n[a])
                }
            }))
        })
        .collect();
    Ok(block_diagonal(&blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::gradient_incidence;
    use crate::mesh::{Point, box_mesh, unit_cube};
    use approx::assert_relative_eq;
    use ndarray::Array1;

    #[test]
    fn test_1d_shapes() {
        let p = node_prolongation_1d(3);
        assert_eq!((p.num_rows, p.num_cols), (7, 4));
        assert_relative_eq!(p.get(3, 1), 0.5);
        assert_relative_eq!(p.get(4, 2), 1.0);

        let c = cell_prolongation_1d(3);
        assert_eq!((c.num_rows, c.num_cols), (6, 3));
        assert_relative_eq!(c.get(5, 2), 0.5);
    }

    #[test]
    fn test_commutes_with_gradient() {
        let coarse = box_mesh([2, 1, 3], Point::new(0.0, 0.0, 0.0), Point::new(2.0, 1.0, 1.5))
            .expect("valid mesh");
        let fine = coarse.refined();

        let p_node = node_prolongation(&coarse, &fine).expect("nested");
        let p_edge = edge_prolongation(&coarse, &fine).expect("nested");
        let lhs = p_edge.matmul(&gradient_incidence(&coarse));
        let rhs = gradient_incidence(&fine).matmul(&p_node);

        let diff = lhs.add(&rhs.scaled(-1.0));
        assert!(diff.max_abs() < 1e-14);
    }

    #[test]
    fn test_reproduces_linear_functions() {
        let coarse = unit_cube(2);
        let fine = coarse.refined();
        let p = node_prolongation(&coarse, &fine).expect("nested");

        let linear = |m: &CartesianMesh| -> Array1<f64> {
            let d = m.vertex_dims();
            crate::mesh::grid_indices(d)
                .map(|[i, j, k]| {
                    let x = m.vertex_coords(i, j, k);
                    1.0 + 2.0 * x.x - x.y + 0.5 * x.z
                })
                .collect()
        };

        let interpolated = p.matvec(&linear(&coarse));
        let expected = linear(&fine);
        for (a, b) in interpolated.iter().zip(expected.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-13);
        }
    }

    #[test]
    fn test_non_nested_meshes_rejected() {
        let coarse = unit_cube(2);
        let fine = unit_cube(3);
        let err = edge_prolongation(&coarse, &fine).unwrap_err();
        assert!(matches!(err, StokesError::NonNestedMeshes { .. }));
        assert!(node_prolongation(&coarse, &fine).is_err());
    }
}
