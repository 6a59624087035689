//! Mesh generators

use super::types::{CartesianMesh, Point};
use crate::error::Result;

/// Generate a hexahedral mesh of the box [min, max] with `cells` divisions
pub fn box_mesh(cells: [usize; 3], min: Point, max: Point) -> Result<CartesianMesh> {
    CartesianMesh::new(cells, min, max)
}

/// Generate a unit cube mesh [0,1]³ with n×n×n hexahedra
///
/// # Panics
///
/// Panics if `n == 0`.
pub fn unit_cube(n: usize) -> CartesianMesh {
    assert!(n > 0, "unit_cube needs at least one cell per direction");
    CartesianMesh::new(
        [n, n, n],
        Point::new(0.0, 0.0, 0.0),
        Point::new(1.0, 1.0, 1.0),
    )
    .unwrap_or_else(|e| unreachable!("unit cube is always valid: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cube() {
        let mesh = unit_cube(3);
        assert_eq!(mesh.cells(), [3, 3, 3]);
        assert_eq!(mesh.num_vertices(), 64);
        assert_eq!(mesh.num_edges(), 3 * 3 * 16);
    }

    #[test]
    fn test_box_mesh_rejects_flat_box() {
        let result = box_mesh(
            [2, 2, 2],
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
        );
        assert!(result.is_err());
    }
}
