//! Transfer operators between two levels of the Stokes hierarchy
//!
//! Prolongation is the canonical interpolation of each field (edges and
//! vertices independently). Restriction is its adjoint under the lumped
//! mass inner products of the two levels:
//!
//! R = diag(1/M_coarse) · Pᵀ · diag(M_fine)
//!
//! so that (R r, e)_coarse = (r, P e)_fine.

use crate::assembly::{FieldProlongation, block_diagonal};
use crate::error::{Result, StokesError};
use crate::operator::StokesOperator;
use ndarray::{Array1, ArrayView1, ArrayViewMut1, s};
use solvers::CsrMatrix;

/// Prolongation and restriction of `[u; p]` vectors between two levels
#[derive(Debug, Clone)]
pub struct LevelTransfer {
    edge_prolongation: CsrMatrix<f64>,
    node_prolongation: CsrMatrix<f64>,
    edge_restriction: CsrMatrix<f64>,
    node_restriction: CsrMatrix<f64>,
}

fn weighted_adjoint(
    p: &CsrMatrix<f64>,
    coarse: &Array1<f64>,
    fine: &Array1<f64>,
) -> CsrMatrix<f64> {
    let mut r = p.transpose();
    r.scale_rows(coarse.mapv(|m| 1.0 / m).view());
    r.scale_cols(fine.view());
    r
}

impl LevelTransfer {
    /// Build both directions from the field interpolations and the lumped masses of each level
    pub fn new(
        prolongation: FieldProlongation,
        coarse: &StokesOperator,
        fine: &StokesOperator,
    ) -> Result<Self> {
        let (mc, mf) = match (coarse.lumped(), fine.lumped()) {
            (Some(mc), Some(mf)) => (mc, mf),
            _ => {
                return Err(StokesError::SmootherPrecondition(
                    "level transfer needs lumped masses on both levels",
                ));
            }
        };

        let FieldProlongation { edge, node } = prolongation;
        assert_eq!(
            (edge.num_rows, edge.num_cols),
            (fine.num_edges(), coarse.num_edges()),
            "edge prolongation shape does not match the levels"
        );
        assert_eq!(
            (node.num_rows, node.num_cols),
            (fine.num_vertices(), coarse.num_vertices()),
            "node prolongation shape does not match the levels"
        );

        let edge_restriction = weighted_adjoint(&edge, &mc.edge, &mf.edge);
        let node_restriction = weighted_adjoint(&node, &mc.node, &mf.node);

        Ok(Self {
            edge_prolongation: edge,
            node_prolongation: node,
            edge_restriction,
            node_restriction,
        })
    }

    fn coarse_edges(&self) -> usize {
        self.edge_prolongation.num_cols
    }

    fn fine_edges(&self) -> usize {
        self.edge_prolongation.num_rows
    }

    /// Size of a coarse `[u; p]` vector
    pub fn coarse_size(&self) -> usize {
        self.coarse_edges() + self.node_prolongation.num_cols
    }

    /// Size of a fine `[u; p]` vector
    pub fn fine_size(&self) -> usize {
        self.fine_edges() + self.node_prolongation.num_rows
    }

    /// fine += P · coarse
    pub fn prolong_add(&self, coarse: ArrayView1<f64>, mut fine: ArrayViewMut1<f64>) {
        assert_eq!(coarse.len(), self.coarse_size(), "coarse vector size mismatch");
        assert_eq!(fine.len(), self.fine_size(), "fine vector size mismatch");
        let (nc, nf) = (self.coarse_edges(), self.fine_edges());
        self.edge_prolongation
            .spmv(1.0, coarse.slice(s![..nc]), 1.0, fine.slice_mut(s![..nf]));
        self.node_prolongation
            .spmv(1.0, coarse.slice(s![nc..]), 1.0, fine.slice_mut(s![nf..]));
    }

    /// coarse = R · fine
    pub fn restrict_into(&self, fine: ArrayView1<f64>, mut coarse: ArrayViewMut1<f64>) {
        assert_eq!(coarse.len(), self.coarse_size(), "coarse vector size mismatch");
        assert_eq!(fine.len(), self.fine_size(), "fine vector size mismatch");
        let (nc, nf) = (self.coarse_edges(), self.fine_edges());
        self.edge_restriction
            .spmv(1.0, fine.slice(s![..nf]), 0.0, coarse.slice_mut(s![..nc]));
        self.node_restriction
            .spmv(1.0, fine.slice(s![nf..]), 0.0, coarse.slice_mut(s![nc..]));
    }

    /// Block-diagonal prolongation over (edge, node)
    pub fn prolongation_matrix(&self) -> CsrMatrix<f64> {
        block_diagonal(&[self.edge_prolongation.clone(), self.node_prolongation.clone()])
    }

    /// Block-diagonal restriction over (edge, node)
    pub fn restriction_matrix(&self) -> CsrMatrix<f64> {
        block_diagonal(&[self.edge_restriction.clone(), self.node_restriction.clone()])
    }
}
