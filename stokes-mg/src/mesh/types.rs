//! Structured hexahedral box meshes
//!
//! The mesh is the tensor product of three uniform 1D grids. Entities are
//! numbered lexicographically with x fastest; edges and faces are grouped in
//! blocks by direction (x, y, z). Edges point along +axis and faces have
//! their normal along +axis.

use crate::error::{Result, StokesError};
use serde::{Deserialize, Serialize};

/// A point in 3D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    /// Create a 3D point
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along `axis` (0 = x, 1 = y, 2 = z)
    #[inline]
    pub fn coord(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl From<(f64, f64, f64)> for Point {
    fn from(p: (f64, f64, f64)) -> Self {
        Point::new(p.0, p.1, p.2)
    }
}

/// Degree-of-freedom spaces of the lowest-order de Rham complex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DofSpace {
    /// H1, one DOF per vertex (pressure)
    Node,
    /// H(curl), one DOF per edge (velocity)
    Edge,
    /// H(div), one DOF per face
    Face,
    /// L2, one DOF per cell
    Cell,
}

/// Uniform Cartesian hexahedral mesh of an axis-aligned box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianMesh {
    cells: [usize; 3],
    min: Point,
    max: Point,
}

impl CartesianMesh {
    /// Create a box mesh with `cells[a]` hexahedra along axis `a`
    pub fn new(cells: [usize; 3], min: Point, max: Point) -> Result<Self> {
        if cells.contains(&0) {
            return Err(StokesError::InvalidMesh(format!(
                "every direction needs at least one cell, got {:?}",
                cells
            )));
        }
        for axis in 0..3 {
            let len = max.coord(axis) - min.coord(axis);
            if !(len.is_finite() && len > 0.0) {
                return Err(StokesError::InvalidMesh(format!(
                    "extent along axis {} must be positive, got {}",
                    axis, len
                )));
            }
        }
        Ok(Self { cells, min, max })
    }

    /// Cells per direction
    pub fn cells(&self) -> [usize; 3] {
        self.cells
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    /// Cell size per direction
    pub fn spacing(&self) -> [f64; 3] {
        std::array::from_fn(|a| (self.max.coord(a) - self.min.coord(a)) / self.cells[a] as f64)
    }

    /// Volume of the box
    pub fn volume(&self) -> f64 {
        (0..3)
            .map(|a| self.max.coord(a) - self.min.coord(a))
            .product()
    }

    /// Grid dimensions of the vertex lattice
    pub fn vertex_dims(&self) -> [usize; 3] {
        self.cells.map(|n| n + 1)
    }

    /// Grid dimensions of the block of edges along `axis`
    pub fn edge_dims(&self, axis: usize) -> [usize; 3] {
        std::array::from_fn(|a| if a == axis { self.cells[a] } else { self.cells[a] + 1 })
    }

    /// Grid dimensions of the block of faces with normal along `axis`
    pub fn face_dims(&self, axis: usize) -> [usize; 3] {
        std::array::from_fn(|a| if a == axis { self.cells[a] + 1 } else { self.cells[a] })
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_dims().iter().product()
    }

    /// Number of edges along `axis`
    pub fn num_edges_along(&self, axis: usize) -> usize {
        self.edge_dims(axis).iter().product()
    }

    pub fn num_edges(&self) -> usize {
        (0..3).map(|a| self.num_edges_along(a)).sum()
    }

    /// Number of faces with normal along `axis`
    pub fn num_faces_normal_to(&self, axis: usize) -> usize {
        self.face_dims(axis).iter().product()
    }

    pub fn num_faces(&self) -> usize {
        (0..3).map(|a| self.num_faces_normal_to(a)).sum()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.iter().product()
    }

    /// Number of DOFs in a space
    pub fn num_dofs(&self, space: DofSpace) -> usize {
        match space {
            DofSpace::Node => self.num_vertices(),
            DofSpace::Edge => self.num_edges(),
            DofSpace::Face => self.num_faces(),
            DofSpace::Cell => self.num_cells(),
        }
    }

    /// First global index of the edge block along `axis`
    pub fn edge_offset(&self, axis: usize) -> usize {
        (0..axis).map(|a| self.num_edges_along(a)).sum()
    }

    /// First global index of the face block with normal along `axis`
    pub fn face_offset(&self, axis: usize) -> usize {
        (0..axis).map(|a| self.num_faces_normal_to(a)).sum()
    }

    #[inline]
    pub fn vertex_index(&self, i: usize, j: usize, k: usize) -> usize {
        lexicographic(self.vertex_dims(), [i, j, k])
    }

    /// Global index of the edge along `axis` starting at vertex (i, j, k)
    #[inline]
    pub fn edge_index(&self, axis: usize, i: usize, j: usize, k: usize) -> usize {
        self.edge_offset(axis) + lexicographic(self.edge_dims(axis), [i, j, k])
    }

    /// Global index of the face with normal along `axis` and lowest vertex (i, j, k)
    #[inline]
    pub fn face_index(&self, axis: usize, i: usize, j: usize, k: usize) -> usize {
        self.face_offset(axis) + lexicographic(self.face_dims(axis), [i, j, k])
    }

    #[inline]
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        lexicographic(self.cells, [i, j, k])
    }

    /// Coordinates of vertex (i, j, k)
    pub fn vertex_coords(&self, i: usize, j: usize, k: usize) -> Point {
        let h = self.spacing();
        Point::new(
            self.min.x + i as f64 * h[0],
            self.min.y + j as f64 * h[1],
            self.min.z + k as f64 * h[2],
        )
    }
}

#[inline]
fn lexicographic(dims: [usize; 3], idx: [usize; 3]) -> usize {
    debug_assert!(
        idx.iter().zip(dims.iter()).all(|(i, n)| i < n),
        "index {:?} outside grid {:?}",
        idx,
        dims
    );
    idx[0] + dims[0] * (idx[1] + dims[1] * idx[2])
}

/// Iterate over all multi-indices of a grid, x fastest
pub fn grid_indices(dims: [usize; 3]) -> impl Iterator<Item = [usize; 3]> {
    (0..dims[2]).flat_map(move |k| {
        (0..dims[1]).flat_map(move |j| (0..dims[0]).map(move |i| [i, j, k]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mesh_234() -> CartesianMesh {
        CartesianMesh::new([2, 3, 4], Point::new(0.0, 0.0, 0.0), Point::new(2.0, 1.5, 1.0))
            .expect("valid mesh")
    }

    #[test]
    fn test_entity_counts() {
        let mesh = mesh_234();
        assert_eq!(mesh.num_vertices(), 3 * 4 * 5);
        assert_eq!(mesh.num_edges_along(0), 2 * 4 * 5);
        assert_eq!(mesh.num_edges_along(1), 3 * 3 * 5);
        assert_eq!(mesh.num_edges_along(2), 3 * 4 * 4);
        assert_eq!(mesh.num_faces_normal_to(0), 3 * 3 * 4);
        assert_eq!(mesh.num_cells(), 24);
        // Euler characteristic of a closed ball: V - E + F - C = 1
        let euler = mesh.num_vertices() as i64 - mesh.num_edges() as i64
            + mesh.num_faces() as i64
            - mesh.num_cells() as i64;
        assert_eq!(euler, 1);
    }

    #[test]
    fn test_indices_are_contiguous() {
        let mesh = mesh_234();
        let mut seen = vec![false; mesh.num_edges()];
        for axis in 0..3 {
            for [i, j, k] in grid_indices(mesh.edge_dims(axis)) {
                let e = mesh.edge_index(axis, i, j, k);
                assert!(!seen[e]);
                seen[e] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(mesh.face_index(2, 1, 2, 4), mesh.num_faces() - 1);
    }

    #[test]
    fn test_geometry() {
        let mesh = mesh_234();
        let h = mesh.spacing();
        assert_relative_eq!(h[0], 1.0);
        assert_relative_eq!(h[1], 0.5);
        assert_relative_eq!(h[2], 0.25);
        assert_relative_eq!(mesh.volume(), 3.0);
        let p = mesh.vertex_coords(2, 3, 4);
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, 1.5);
        assert_relative_eq!(p.z, 1.0);
    }

    #[test]
    fn test_invalid_meshes() {
        let origin = Point::new(0.0, 0.0, 0.0);
        let one = Point::new(1.0, 1.0, 1.0);
        assert!(CartesianMesh::new([0, 1, 1], origin, one).is_err());
        assert!(CartesianMesh::new([1, 1, 1], one, origin).is_err());
    }
}
