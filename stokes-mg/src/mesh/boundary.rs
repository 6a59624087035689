//! Boundary/interior separation of degrees of freedom
//!
//! A DOF is a boundary DOF when its mesh entity lies on the boundary of the
//! box. Cell DOFs are never boundary DOFs.

use super::types::{CartesianMesh, DofSpace, grid_indices};
use solvers::CsrMatrix;

impl CartesianMesh {
    /// Boundary marker for every DOF of `space`
    pub fn boundary_dofs(&self, space: DofSpace) -> Vec<bool> {
        let cells = self.cells();
        let on_boundary = |axis: usize, idx: usize| idx == 0 || idx == cells[axis];

        match space {
            DofSpace::Node => grid_indices(self.vertex_dims())
                .map(|idx| (0..3).any(|a| on_boundary(a, idx[a])))
                .collect(),
            DofSpace::Edge => (0..3)
                .flat_map(|axis| {
                    grid_indices(self.edge_dims(axis))
                        .map(move |idx| (0..3).any(|a| a != axis && on_boundary(a, idx[a])))
                })
                .collect(),
            DofSpace::Face => (0..3)
                .flat_map(|axis| {
                    grid_indices(self.face_dims(axis)).map(move |idx| on_boundary(axis, idx[axis]))
                })
                .collect(),
            DofSpace::Cell => vec![false; self.num_cells()],
        }
    }

    /// Number of boundary DOFs of `space`
    pub fn num_boundary_dofs(&self, space: DofSpace) -> usize {
        self.boundary_dofs(space).iter().filter(|&&b| b).count()
    }

    /// Permutation matrix moving boundary DOFs to the end
    ///
    /// Row `new` has a single one in column `old`. Interior DOFs keep their
    /// relative order at the front; boundary DOFs fill the tail from the last
    /// position backwards.
    pub fn boundary_permutation(&self, space: DofSpace) -> CsrMatrix<f64> {
        let marker = self.boundary_dofs(space);
        let n = marker.len();
        let mut target = vec![0usize; n];
        let mut interior = 0;
        let mut boundary = n;
        for (old, &is_boundary) in marker.iter().enumerate() {
            if is_boundary {
                boundary -= 1;
                target[old] = boundary;
            } else {
                target[old] = interior;
                interior += 1;
            }
        }

        let triplets = target
            .iter()
            .enumerate()
            .map(|(old, &new)| (new, old, 1.0))
            .collect();
        CsrMatrix::from_triplets(n, n, triplets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::unit_cube;
    use ndarray::Array1;

    #[test]
    fn test_single_cell_is_all_boundary() {
        let mesh = unit_cube(1);
        assert_eq!(mesh.num_boundary_dofs(DofSpace::Node), 8);
        assert_eq!(mesh.num_boundary_dofs(DofSpace::Edge), 12);
        assert_eq!(mesh.num_boundary_dofs(DofSpace::Face), 6);
        assert_eq!(mesh.num_boundary_dofs(DofSpace::Cell), 0);
    }

    #[test]
    fn test_interior_counts() {
        let mesh = unit_cube(3);
        let interior = |space| mesh.num_dofs(space) - mesh.num_boundary_dofs(space);
        assert_eq!(interior(DofSpace::Node), 8);
        // x-edges with interior y and z: 3 * 2 * 2 per direction
        assert_eq!(interior(DofSpace::Edge), 3 * 12);
        // x-faces with interior x: 2 * 3 * 3 per direction
        assert_eq!(interior(DofSpace::Face), 3 * 18);
    }

    #[test]
    fn test_permutation_puts_boundary_last() {
        let mesh = unit_cube(2);
        for space in [DofSpace::Node, DofSpace::Edge, DofSpace::Face] {
            let marker = mesh.boundary_dofs(space);
            let n_interior = marker.iter().filter(|&&b| !b).count();
            let perm = mesh.boundary_permutation(space);
            assert_eq!(perm.nnz(), marker.len());

            let flags = Array1::from_iter(marker.iter().map(|&b| if b { 1.0 } else { 0.0 }));
            let permuted = perm.matvec(&flags);
            assert!(permuted.iter().take(n_interior).all(|&v| v == 0.0));
            assert!(permuted.iter().skip(n_interior).all(|&v| v == 1.0));

            // Orthogonal: P^T P = I
            let ident = perm.transpose().matmul(&perm);
            assert_eq!(ident.nnz(), marker.len());
            assert!((0..marker.len()).all(|i| ident.get(i, i) == 1.0));
        }
    }
}
