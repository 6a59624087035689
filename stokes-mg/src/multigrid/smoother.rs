//! Distributive Gauss-Seidel smoother for the DEC Stokes operator
//!
//! The saddle-point operator A = [[C, G], [D, 0]] (G = d0, D its adjoint
//! under the lumped inner products) is right-preconditioned with the
//! transform T = [[I, G], [D, 0]]. Since the curl part of C annihilates
//! gradients, A·T is close to block lower triangular:
//!
//! ```text
//! A·T ≈ [ Lu   0  ]    Lu = G·D + C   (edges)
//!       [ D    Lp ]    Lp = D·G       (vertices, pressure Laplacian)
//! ```
//!
//! One sweep relaxes both diagonal blocks and maps the correction back with T.

use crate::config::{OperatorMode, SmootherKind};
use crate::error::{Result, StokesError};
use crate::operator::StokesOperator;
use ndarray::{Array1, ArrayView1, ArrayViewMut1, s};
use solvers::CsrMatrix;

/// Damping of the diagonal-scaling variant, optimal for the Laplacian
const JACOBI_DAMPING: f64 = 2.0 / 3.0;

/// Distributive relaxation built once from a lumped DEC operator
#[derive(Debug, Clone)]
pub struct DgsSmoother {
    kind: SmootherKind,
    num_edges: usize,
    num_vertices: usize,
    /// G = d0 (ne x nv)
    gradient: CsrMatrix<f64>,
    /// D = diag(1/ml0) d0ᵀ diag(ml1) (nv x ne)
    gradient_adjoint: CsrMatrix<f64>,
    /// C = diag(1/ml1) (d1ᵀ diag(ml2) d1 + N) (ne x ne)
    curl_curl: CsrMatrix<f64>,
    edge_operator: CsrMatrix<f64>,
    node_operator: CsrMatrix<f64>,
}

impl DgsSmoother {
    /// Derive the smoother from `op`
    ///
    /// Fails unless `op` is in DEC mode with mass lumping enabled.
    pub fn new(op: &StokesOperator, kind: SmootherKind) -> Result<Self> {
        if op.mode() != OperatorMode::Dec {
            return Err(StokesError::SmootherPrecondition(
                "operator must be in DEC mode",
            ));
        }
        let (lumped, dec_curl) = match (op.lumped(), op.dec_curl()) {
            (Some(m), Some(c)) => (m, c),
            _ => {
                return Err(StokesError::SmootherPrecondition(
                    "operator must use mass lumping",
                ));
            }
        };

        let gradient = op.d0().clone();

        let mut gradient_adjoint = gradient.transpose();
        gradient_adjoint.scale_rows(lumped.node.mapv(|m| 1.0 / m).view());
        gradient_adjoint.scale_cols(lumped.edge.view());

        let mut curl_curl = dec_curl.clone();
        curl_curl.scale_rows(lumped.edge.mapv(|m| 1.0 / m).view());

        let edge_operator = gradient.matmul(&gradient_adjoint).add(&curl_curl);
        let node_operator = gradient_adjoint.matmul(&gradient);

        log::debug!(
            "DGS smoother ({:?}): edge operator nnz {}, node operator nnz {}",
            kind,
            edge_operator.nnz(),
            node_operator.nnz()
        );

        Ok(Self {
            kind,
            num_edges: op.num_edges(),
            num_vertices: op.num_vertices(),
            gradient,
            gradient_adjoint,
            curl_curl,
            edge_operator,
            node_operator,
        })
    }

    pub fn kind(&self) -> SmootherKind {
        self.kind
    }

    /// Change the inner relaxation without rebuilding the operators
    pub fn set_kind(&mut self, kind: SmootherKind) {
        self.kind = kind;
    }

    /// Number of unknowns, ne + nv
    pub fn size(&self) -> usize {
        self.num_edges + self.num_vertices
    }

    /// Edge-space operator Lu = G·D + C
    pub fn edge_operator(&self) -> &CsrMatrix<f64> {
        &self.edge_operator
    }

    /// Node-space operator Lp = D·G
    pub fn node_operator(&self) -> &CsrMatrix<f64> {
        &self.node_operator
    }

    /// r = A x - rhs, using the smoother's own copy of the DEC blocks
    fn residual(&self, rhs: ArrayView1<f64>, x: ArrayView1<f64>) -> Array1<f64> {
        let ne = self.num_edges;
        let (xu, xp) = (x.slice(s![..ne]), x.slice(s![ne..]));

        let mut r = rhs.mapv(|v| -v);
        {
            let (mut ru, mut rp) = r.view_mut().split_at(ndarray::Axis(0), ne);
            self.curl_curl.spmv(1.0, xu, 1.0, ru.view_mut());
            self.gradient.spmv(1.0, xp, 1.0, ru.view_mut());
            self.gradient_adjoint.spmv(1.0, xu, 1.0, rp.view_mut());
        }
        r
    }

    fn relax(&self, matrix: &CsrMatrix<f64>, b: ArrayView1<f64>, mut x: ArrayViewMut1<f64>) {
        match self.kind {
            SmootherKind::GaussSeidelForward => matrix.gauss_seidel_forward(b, x),
            SmootherKind::GaussSeidelSymmetric => {
                matrix.gauss_seidel_forward(b, x.view_mut());
                matrix.gauss_seidel_backward(b, x);
            }
            SmootherKind::Jacobi => {
                matrix.jacobi_scale(b, x.view_mut());
                x *= JACOBI_DAMPING;
            }
        }
    }

    /// One distributive sweep, updating `x` in place
    ///
    /// # Panics
    ///
    /// Panics if `rhs` or `x` does not have ne + nv entries.
    pub fn mult(&self, rhs: ArrayView1<f64>, mut x: ArrayViewMut1<f64>) {
        assert!(
            rhs.len() == self.size() && x.len() == self.size(),
            "smoother of size {} applied to vectors of size {} and {}",
            self.size(),
            rhs.len(),
            x.len()
        );
        let ne = self.num_edges;

        let r = self.residual(rhs, x.view());
        let r_u = r.slice(s![..ne]);
        let mut r_p = r.slice(s![ne..]).to_owned();

        let mut corr_u = Array1::zeros(ne);
        self.relax(&self.edge_operator, r_u, corr_u.view_mut());

        self.gradient_adjoint
            .spmv(-1.0, corr_u.view(), 1.0, r_p.view_mut());
        let mut corr_p = Array1::zeros(self.num_vertices);
        self.relax(&self.node_operator, r_p.view(), corr_p.view_mut());

        // x -= T·(corr_u, corr_p)
        let (mut xu, mut xp) = x.view_mut().split_at(ndarray::Axis(0), ne);
        xu -= &corr_u;
        self.gradient.spmv(-1.0, corr_p.view(), 1.0, xu.view_mut());
        self.gradient_adjoint
            .spmv(-1.0, corr_u.view(), 1.0, xp.view_mut());
    }

    /// ‖A x - rhs‖₂ without modifying `x`
    pub fn compute_residual_norm(&self, rhs: ArrayView1<f64>, x: ArrayView1<f64>) -> f64 {
        assert_eq!(x.len(), self.size(), "iterate size does not match smoother");
        assert_eq!(rhs.len(), self.size(), "right-hand side size does not match smoother");
        let r = self.residual(rhs, x);
        r.dot(&r).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::WhitneyHexAssembler;
    use crate::config::{MassLumping, StokesParameters};
    use crate::mesh::unit_cube;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn operator(n: usize) -> StokesOperator {
        let params = StokesParameters::default().with_penalty(9.0);
        StokesOperator::assemble(&WhitneyHexAssembler, &unit_cube(n), &params)
            .expect("valid operator")
    }

    fn random_vector(n: usize, seed: u64) -> Array1<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array1::from_shape_fn(n, |_| rng.random_range(-1.0..1.0))
    }

    #[test]
    fn test_requires_dec_mode() {
        let mut op = operator(1);
        op.set_mode(OperatorMode::Galerkin);
        let err = DgsSmoother::new(&op, SmootherKind::default()).unwrap_err();
        assert!(matches!(err, StokesError::SmootherPrecondition(_)));
    }

    #[test]
    fn test_requires_lumping() {
        let params = StokesParameters::default().with_lumping(MassLumping::None);
        let mut op = StokesOperator::assemble(&WhitneyHexAssembler, &unit_cube(1), &params)
            .expect("valid operator");
        op.set_mode(OperatorMode::Dec);
        let err = DgsSmoother::new(&op, SmootherKind::default()).unwrap_err();
        assert!(matches!(err, StokesError::SmootherPrecondition(_)));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_residual_norm_matches_operator() {
        let op = operator(2);
        let smoother = DgsSmoother::new(&op, SmootherKind::default()).expect("valid smoother");
        let x = random_vector(op.size(), 1);
        let rhs = random_vector(op.size(), 2);

        let r = op.apply_to(&x) - &rhs;
        let expected = r.dot(&r).sqrt();
        let norm = smoother.compute_residual_norm(rhs.view(), x.view());
        assert!((norm - expected).abs() <= 1e-12 * expected);
    }

    #[test]
    fn test_node_operator_annihilates_constants() {
        let op = operator(2);
        let smoother = DgsSmoother::new(&op, SmootherKind::default()).expect("valid smoother");
        let ones = Array1::from_elem(op.num_vertices(), 1.0);
        let y = smoother.node_operator().matvec(&ones);
        assert!(y.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_exact_solution_is_fixed_point() {
        let op = operator(2);
        let exact = random_vector(op.size(), 4);
        let rhs = op.apply_to(&exact);
        for kind in [
            SmootherKind::GaussSeidelForward,
            SmootherKind::GaussSeidelSymmetric,
            SmootherKind::Jacobi,
        ] {
            let smoother = DgsSmoother::new(&op, kind).expect("valid smoother");
            let mut x = exact.clone();
            smoother.mult(rhs.view(), x.view_mut());
            let diff = &x - &exact;
            assert!(diff.dot(&diff).sqrt() < 1e-10, "kind {:?}", kind);
        }
    }

    #[test]
    fn test_sweeps_reduce_residual() {
        let op = operator(2);
        let exact = random_vector(op.size(), 6);
        let rhs = op.apply_to(&exact);
        for kind in [SmootherKind::GaussSeidelForward, SmootherKind::GaussSeidelSymmetric] {
            let smoother = DgsSmoother::new(&op, kind).expect("valid smoother");
            let mut x = Array1::zeros(op.size());
            let initial = smoother.compute_residual_norm(rhs.view(), x.view());
            for _ in 0..20 {
                smoother.mult(rhs.view(), x.view_mut());
                op.eliminate_constants(&mut x);
            }
            let reduced = smoother.compute_residual_norm(rhs.view(), x.view());
            assert!(reduced < 0.5 * initial, "kind {:?}: {} -> {}", kind, initial, reduced);
        }
    }

    #[test]
    fn test_jacobi_sweeps_reduce_residual() {
        let op = operator(2);
        let exact = random_vector(op.size(), 8);
        let rhs = op.apply_to(&exact);
        let smoother = DgsSmoother::new(&op, SmootherKind::Jacobi).expect("valid smoother");

        let mut x = Array1::zeros(op.size());
        let initial = smoother.compute_residual_norm(rhs.view(), x.view());
        for _ in 0..5 {
            smoother.mult(rhs.view(), x.view_mut());
        }
        let reduced = smoother.compute_residual_norm(rhs.view(), x.view());
        assert!(reduced.is_finite());
        assert!(reduced < initial, "Jacobi residual {} -> {}", initial, reduced);
    }

    #[test]
    #[should_panic(expected = "smoother of size")]
    fn test_wrong_size_panics() {
        let op = operator(1);
        let smoother = DgsSmoother::new(&op, SmootherKind::default()).expect("valid smoother");
        let rhs = Array1::zeros(op.size());
        let mut x = Array1::zeros(op.size() - 1);
        smoother.mult(rhs.view(), x.view_mut());
    }
}
