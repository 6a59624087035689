//! Uniform mesh refinement (h-refinement)
//!
//! Every hexahedron is bisected along all three axes, so each refinement
//! multiplies the cell count by eight and keeps the coarse mesh nested in
//! the fine one.

use super::types::CartesianMesh;

impl CartesianMesh {
    /// Uniformly refined copy of this mesh
    pub fn refined(&self) -> CartesianMesh {
        let cells = self.cells().map(|n| 2 * n);
        CartesianMesh::new(cells, self.min(), self.max())
            .unwrap_or_else(|e| unreachable!("refining a valid mesh cannot fail: {}", e))
    }

    /// Check whether `self` is exactly one uniform refinement of `coarse`
    pub fn is_refinement_of(&self, coarse: &CartesianMesh) -> bool {
        self.min() == coarse.min()
            && self.max() == coarse.max()
            && self
                .cells()
                .iter()
                .zip(coarse.cells().iter())
                .all(|(f, c)| *f == 2 * c)
    }
}

/// Refine a mesh `times` times
pub fn refine_uniformly(mesh: &CartesianMesh, times: usize) -> CartesianMesh {
    let mut current = mesh.clone();
    for _ in 0..times {
        current = current.refined();
    }
    current
}
