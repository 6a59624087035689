//! Nitsche boundary form for the curl-curl operator
//!
//! For lowest-order edge elements u, v the boundary contribution is
//!
//! ```text
//! N(u, v) = factor · ∫_∂Ω (n × curl u)·v + θ (n × curl v)·u + (γ / h_F) (n × u)·(n × v) ds
//! ```
//!
//! where h_F is the square root of the boundary face area.

use crate::mesh::CartesianMesh;
use crate::quadrature::gauss_legendre_unit;
use serde::{Deserialize, Serialize};
use solvers::CsrMatrix;

/// Coefficients of the Nitsche boundary form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NitscheParameters {
    /// Symmetry switch: 1 symmetric, -1 skew-symmetric, 0 incomplete
    pub theta: f64,
    /// Penalty γ, must be large enough for coercivity
    pub penalty: f64,
    /// Global scaling of the whole form
    pub factor: f64,
}

impl Default for NitscheParameters {
    fn default() -> Self {
        Self {
            theta: 1.0,
            penalty: 10.0,
            factor: 1.0,
        }
    }
}

type Vec3 = [f64; 3];

#[inline]
fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
fn unit(axis: usize) -> Vec3 {
    let mut e = [0.0; 3];
    e[axis] = 1.0;
    e
}

/// 1D linear shape function on [0, 1]: 1 - t at offset 0, t at offset 1
#[inline]
fn hat(offset: usize, t: f64) -> f64 {
    if offset == 0 { 1.0 - t } else { t }
}

#[inline]
fn hat_slope(offset: usize) -> f64 {
    if offset == 0 { -1.0 } else { 1.0 }
}

/// One of the twelve edges of a hexahedron
#[derive(Debug, Clone, Copy)]
struct LocalEdge {
    axis: usize,
    /// Vertex offset of the edge start; zero along `axis`
    offset: [usize; 3],
}

fn local_edges() -> Vec<LocalEdge> {
    let mut edges = Vec::with_capacity(12);
    for axis in 0..3 {
        let (p, q) = ((axis + 1) % 3, (axis + 2) % 3);
        for sp in 0..2 {
            for sq in 0..2 {
                let mut offset = [0; 3];
                offset[p] = sp;
                offset[q] = sq;
                edges.push(LocalEdge { axis, offset });
            }
        }
    }
    edges
}

impl LocalEdge {
    /// Value and curl of the Whitney function at reference point `r` in [0, 1]^3
    fn eval(&self, r: Vec3, h: [f64; 3]) -> (Vec3, Vec3) {
        let a = self.axis;
        let scale = 1.0 / h[a];
        let others = [(a + 1) % 3, (a + 2) % 3];

        let mut value = [0.0; 3];
        value[a] = scale
            * hat(self.offset[others[0]], r[others[0]])
            * hat(self.offset[others[1]], r[others[1]]);

        // Gradient of the scalar factor, then curl(f e_a) = grad f × e_a
        let mut grad = [0.0; 3];
        for (d, other) in [(others[0], others[1]), (others[1], others[0])] {
            grad[d] = scale * hat_slope(self.offset[d]) / h[d] * hat(self.offset[other], r[other]);
        }
        (value, cross(grad, unit(a)))
    }
}

/// Assemble the Nitsche boundary matrix on the edges of `mesh` (ne x ne)
pub fn assemble_nitsche(mesh: &CartesianMesh, params: &NitscheParameters) -> CsrMatrix<f64> {
    if params.penalty <= 0.0 {
        log::warn!(
            "Nitsche penalty {} is not positive; the boundary form will not be coercive",
            params.penalty
        );
    }

    let n = mesh.cells();
    let h = mesh.spacing();
    let ne = mesh.num_edges();
    let edges = local_edges();
    let quad = gauss_legendre_unit(2);

    let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
    let mut local = [[0.0_f64; 12]; 12];

    for axis in 0..3 {
        let (t1, t2) = ((axis + 1) % 3, (axis + 2) % 3);
        let area = h[t1] * h[t2];
        let h_face = area.sqrt();
        let gamma = params.penalty / h_face;

        for side in 0..2 {
            let mut normal = [0.0; 3];
            normal[axis] = if side == 0 { -1.0 } else { 1.0 };
            let layer = if side == 0 { 0 } else { n[axis] - 1 };

            // Local matrix only depends on the side, not on the cell
            for row in local.iter_mut() {
                row.fill(0.0);
            }
            for q1 in &quad {
                for q2 in &quad {
                    let w = params.factor * q1.weight * q2.weight * area;
                    let mut r = [0.0; 3];
                    r[axis] = side as f64;
                    r[t1] = q1.xi;
                    r[t2] = q2.xi;

                    let evals: Vec<(Vec3, Vec3)> = edges.iter().map(|e| e.eval(r, h)).collect();
                    for (l, &(v_l, curl_l)) in evals.iter().enumerate() {
                        let n_curl_l = cross(normal, curl_l);
                        let n_v_l = cross(normal, v_l);
                        for (k, &(v_k, curl_k)) in evals.iter().enumerate() {
                            let consistency = dot(cross(normal, curl_k), v_l);
                            let symmetry = params.theta * dot(v_k, n_curl_l);
                            let penalty = gamma * dot(cross(normal, v_k), n_v_l);
                            local[l][k] += w * (consistency + symmetry + penalty);
                        }
                    }
                }
            }

            let mut dims = n;
            dims[axis] = 1;
            for [i, j, k] in crate::mesh::grid_indices(dims) {
                let mut cell = [i, j, k];
                cell[axis] = layer;
                let dofs: Vec<usize> = edges
                    .iter()
                    .map(|e| {
                        mesh.edge_index(
                            e.axis,
                            cell[0] + e.offset[0],
                            cell[1] + e.offset[1],
                            cell[2] + e.offset[2],
                        )
                    })
                    .collect();
                for (l, &gl) in dofs.iter().enumerate() {
                    for (k, &gk) in dofs.iter().enumerate() {
                        if local[l][k] != 0.0 {
                            triplets.push((gl, gk, local[l][k]));
                        }
                    }
                }
            }
        }
    }

    CsrMatrix::from_triplets(ne, ne, triplets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Point, box_mesh, unit_cube};
    use approx::assert_relative_eq;
    use ndarray::{Array1, s};

    fn x_field(mesh: &CartesianMesh) -> Array1<f64> {
        let mut u = Array1::zeros(mesh.num_edges());
        u.slice_mut(s![0..mesh.num_edges_along(0)])
            .fill(mesh.spacing()[0]);
        u
    }

    #[test]
    fn test_local_edge_degrees_of_freedom() {
        let h = [0.5, 0.25, 2.0];
        for edge in local_edges() {
            // Tangential component at the edge midpoint integrates to one along the edge
            let mut r = [edge.offset[0] as f64, edge.offset[1] as f64, edge.offset[2] as f64];
            r[edge.axis] = 0.5;
            let (value, _) = edge.eval(r, h);
            assert_relative_eq!(value[edge.axis] * h[edge.axis], 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_symmetric_for_theta_one() {
        let mesh = box_mesh([2, 3, 2], Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.5, 0.5))
            .expect("valid mesh");
        let a = assemble_nitsche(&mesh, &NitscheParameters::default());
        let at = a.transpose();
        for i in 0..a.num_rows {
            for (j, v) in a.row_entries(i) {
                assert_relative_eq!(at.get(i, j), v, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_interior_edges_untouched() {
        let mesh = unit_cube(4);
        let a = assemble_nitsche(&mesh, &NitscheParameters::default());
        let e = mesh.edge_index(0, 1, 2, 2);
        assert_eq!(a.row_entries(e).count(), 0);
    }

    #[test]
    fn test_penalty_energy_of_constant_field() {
        // curl of a constant field vanishes: only the penalty on the four side faces remains
        for (n, penalty) in [(1usize, 9.0), (2, 10.0), (3, 4.0)] {
            let mesh = unit_cube(n);
            let params = NitscheParameters {
                theta: 1.0,
                penalty,
                factor: 1.0,
            };
            let a = assemble_nitsche(&mesh, &params);
            let u = x_field(&mesh);
            let energy = u.dot(&a.matvec(&u));
            assert_relative_eq!(energy, penalty * n as f64 * 4.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_factor_scales_linearly() {
        let mesh = unit_cube(2);
        let base = assemble_nitsche(&mesh, &NitscheParameters::default());
        let doubled = assemble_nitsche(
            &mesh,
            &NitscheParameters {
                factor: 2.0,
                ..NitscheParameters::default()
            },
        );
        assert_relative_eq!(doubled.max_abs(), 2.0 * base.max_abs(), epsilon = 1e-12);
    }
}
