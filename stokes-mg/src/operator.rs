//! Stokes-Nitsche operator in Galerkin and DEC form
//!
//! The unknown vector is laid out as `[u; p]`: `ne` edge values of the
//! velocity followed by `nv` vertex values of the pressure. With
//! C = d1ᵀ M2 d1 + N (curl-curl plus Nitsche boundary form) the two
//! representations are
//!
//! ```text
//! Galerkin:  [ C          M1 d0 ] [u]      DEC:  [ Ml1⁻¹ C'          d0 ] [u]
//!            [ d0ᵀ M1     0     ] [p]            [ Ml0⁻¹ d0ᵀ Ml1     0  ] [p]
//! ```
//!
//! where C' uses the lumped face mass and Ml0, Ml1 are the lumped node and
//! edge masses. DEC mode is what the smoother and the multigrid cycle use;
//! Galerkin mode is the consistent finite element system.

use crate::assembly::{ComplexAssembler, DiscreteComplex};
use crate::config::{MassLumping, OperatorMode, StokesParameters};
use crate::error::{Result, StokesError};
use ndarray::{Array1, ArrayView1, ArrayViewMut1, s};
use solvers::{CsrMatrix, LinearOperator};

/// Diagonal (lumped) masses of the three DOF spaces
#[derive(Debug, Clone)]
pub struct LumpedMasses {
    /// Vertex masses (nv)
    pub node: Array1<f64>,
    /// Edge masses (ne)
    pub edge: Array1<f64>,
    /// Face masses (nf)
    pub face: Array1<f64>,
}

impl LumpedMasses {
    fn from_complex(complex: &DiscreteComplex, lumping: MassLumping) -> Result<Option<Self>> {
        match lumping {
            MassLumping::None => Ok(None),
            MassLumping::Barycentric => Err(StokesError::UnimplementedLumping(lumping)),
            MassLumping::Diagonal => {
                let lumped = Self {
                    node: complex.node_mass.diagonal(),
                    edge: complex.edge_mass.diagonal(),
                    face: complex.face_mass.diagonal(),
                };
                let positive = |v: &Array1<f64>| v.iter().all(|&m| m > 0.0);
                if !(positive(&lumped.node) && positive(&lumped.edge) && positive(&lumped.face)) {
                    return Err(StokesError::InvalidMesh(
                        "lumped mass has a non-positive entry".to_string(),
                    ));
                }
                Ok(Some(lumped))
            }
        }
    }
}

/// Discrete Stokes operator with weakly imposed tangential boundary conditions
#[derive(Debug, Clone)]
pub struct StokesOperator {
    complex: DiscreteComplex,
    lumping: MassLumping,
    lumped: Option<LumpedMasses>,
    mode: OperatorMode,
    /// d1ᵀ M2 d1 + N
    galerkin_curl: CsrMatrix<f64>,
    /// M1 d0
    mass_gradient: CsrMatrix<f64>,
    /// M0 · 1, the exact integral of each nodal basis function
    node_weights: Array1<f64>,
    /// d1ᵀ diag(ml2) d1 + N, present with lumping
    dec_curl: Option<CsrMatrix<f64>>,
}

impl StokesOperator {
    /// Build the operator from pre-assembled matrices
    ///
    /// Starts in DEC mode when lumping is enabled and in Galerkin mode otherwise.
    pub fn new(complex: DiscreteComplex, lumping: MassLumping) -> Result<Self> {
        complex.validate()?;
        let lumped = LumpedMasses::from_complex(&complex, lumping)?;

        let galerkin_curl = complex
            .d1
            .transpose()
            .matmul(&complex.face_mass.matmul(&complex.d1))
            .add(&complex.nitsche);
        let mass_gradient = complex.edge_mass.matmul(&complex.d0);
        let node_weights = complex
            .node_mass
            .matvec(&Array1::from_elem(complex.num_vertices(), 1.0));

        let dec_curl = lumped.as_ref().map(|m| {
            let mut weighted_curl = complex.d1.clone();
            weighted_curl.scale_rows(m.face.view());
            complex
                .d1
                .transpose()
                .matmul(&weighted_curl)
                .add(&complex.nitsche)
        });

        let mode = if lumped.is_some() {
            OperatorMode::Dec
        } else {
            OperatorMode::Galerkin
        };

        Ok(Self {
            complex,
            lumping,
            lumped,
            mode,
            galerkin_curl,
            mass_gradient,
            node_weights,
            dec_curl,
        })
    }

    /// Assemble the discretization on `mesh` and build the operator
    pub fn assemble<A: ComplexAssembler>(
        assembler: &A,
        mesh: &A::Mesh,
        params: &StokesParameters,
    ) -> Result<Self> {
        // Reject unimplemented lumping before paying for assembly
        if params.lumping == MassLumping::Barycentric {
            return Err(StokesError::UnimplementedLumping(params.lumping));
        }
        let complex = assembler.assemble(mesh, params.order, &params.nitsche())?;
        Self::new(complex, params.lumping)
    }

    /// Switch between Galerkin and DEC representation
    pub fn set_mode(&mut self, mode: OperatorMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> OperatorMode {
        self.mode
    }

    pub fn lumping(&self) -> MassLumping {
        self.lumping
    }

    /// Number of edges (velocity unknowns)
    pub fn num_edges(&self) -> usize {
        self.complex.num_edges()
    }

    /// Number of vertices (pressure unknowns)
    pub fn num_vertices(&self) -> usize {
        self.complex.num_vertices()
    }

    pub fn num_faces(&self) -> usize {
        self.complex.num_faces()
    }

    /// Total number of unknowns, ne + nv
    pub fn size(&self) -> usize {
        self.num_edges() + self.num_vertices()
    }

    pub fn complex(&self) -> &DiscreteComplex {
        &self.complex
    }

    pub fn d0(&self) -> &CsrMatrix<f64> {
        &self.complex.d0
    }

    pub fn d1(&self) -> &CsrMatrix<f64> {
        &self.complex.d1
    }

    pub fn node_mass(&self) -> &CsrMatrix<f64> {
        &self.complex.node_mass
    }

    pub fn edge_mass(&self) -> &CsrMatrix<f64> {
        &self.complex.edge_mass
    }

    pub fn face_mass(&self) -> &CsrMatrix<f64> {
        &self.complex.face_mass
    }

    pub fn nitsche(&self) -> &CsrMatrix<f64> {
        &self.complex.nitsche
    }

    /// Lumped masses, `None` without lumping
    pub fn lumped(&self) -> Option<&LumpedMasses> {
        self.lumped.as_ref()
    }

    /// d1ᵀ diag(ml2) d1 + N, the unscaled curl-curl block of DEC mode
    pub fn dec_curl(&self) -> Option<&CsrMatrix<f64>> {
        self.dec_curl.as_ref()
    }

    fn require_lumped(&self) -> (&LumpedMasses, &CsrMatrix<f64>) {
        match (self.lumped.as_ref(), self.dec_curl.as_ref()) {
            (Some(m), Some(c)) => (m, c),
            _ => panic!("DEC representation requires mass lumping (lumping is {:?})", self.lumping),
        }
    }

    fn check_sizes(&self, x: usize, y: usize) {
        assert!(
            x == self.size() && y == self.size(),
            "Stokes operator of size {} applied to vectors of size {} -> {}",
            self.size(),
            x,
            y
        );
    }

    /// y = A x in the current mode
    ///
    /// # Panics
    ///
    /// Panics on wrong vector sizes or in DEC mode without lumping.
    pub fn mult(&self, x: ArrayView1<f64>, mut y: ArrayViewMut1<f64>) {
        self.check_sizes(x.len(), y.len());
        let ne = self.num_edges();
        let xu = x.slice(s![..ne]);
        let xp = x.slice(s![ne..]);
        let (mut yu, mut yp) = y.view_mut().split_at(ndarray::Axis(0), ne);

        match self.mode {
            OperatorMode::Galerkin => {
                self.galerkin_curl.spmv(1.0, xu, 0.0, yu.view_mut());
                self.mass_gradient.spmv(1.0, xp, 1.0, yu.view_mut());
                self.mass_gradient.spmv_transpose(1.0, xu, 0.0, yp.view_mut());
            }
            OperatorMode::Dec => {
                let (lumped, curl) = self.require_lumped();
                curl.spmv(1.0, xu, 0.0, yu.view_mut());
                yu /= &lumped.edge;
                self.complex.d0.spmv(1.0, xp, 1.0, yu.view_mut());

                let weighted = &xu * &lumped.edge;
                self.complex
                    .d0
                    .spmv_transpose(1.0, weighted.view(), 0.0, yp.view_mut());
                yp /= &lumped.node;
            }
        }
    }

    /// y = Aᵀ x in the current mode
    pub fn mult_transpose(&self, x: ArrayView1<f64>, mut y: ArrayViewMut1<f64>) {
        self.check_sizes(x.len(), y.len());
        let ne = self.num_edges();
        let xu = x.slice(s![..ne]);
        let xp = x.slice(s![ne..]);
        let (mut yu, mut yp) = y.view_mut().split_at(ndarray::Axis(0), ne);

        match self.mode {
            OperatorMode::Galerkin => {
                self.galerkin_curl.spmv_transpose(1.0, xu, 0.0, yu.view_mut());
                self.mass_gradient.spmv(1.0, xp, 1.0, yu.view_mut());
                self.mass_gradient.spmv_transpose(1.0, xu, 0.0, yp.view_mut());
            }
            OperatorMode::Dec => {
                let (lumped, curl) = self.require_lumped();
                let scaled_u = &xu / &lumped.edge;
                curl.spmv_transpose(1.0, scaled_u.view(), 0.0, yu.view_mut());

                let scaled_p = &xp / &lumped.node;
                let mut grad_p = Array1::zeros(ne);
                self.complex.d0.spmv(1.0, scaled_p.view(), 0.0, grad_p.view_mut());
                yu += &(&grad_p * &lumped.edge);

                self.complex.d0.spmv_transpose(1.0, xu, 0.0, yp.view_mut());
            }
        }
    }

    /// Allocating form of [`mult`](Self::mult)
    pub fn apply_to(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut y = Array1::zeros(self.size());
        self.mult(x.view(), y.view_mut());
        y
    }

    /// Project the pressure block onto the complement of constants
    ///
    /// Uses the M0 inner product in Galerkin mode and the lumped node mass in DEC mode.
    pub fn eliminate_constants(&self, x: &mut Array1<f64>) {
        assert_eq!(x.len(), self.size(), "vector size does not match operator");
        let weights = match self.mode {
            OperatorMode::Galerkin => &self.node_weights,
            OperatorMode::Dec => &self.require_lumped().0.node,
        };
        let ne = self.num_edges();
        let mut p = x.slice_mut(s![ne..]);
        let mean = weights.dot(&p) / weights.sum();
        p -= mean;
    }

    /// Convert a Galerkin-mode vector (integrated against test functions)
    /// into the point-value DEC representation by dividing by the lumped masses
    pub fn galerkin_to_dec(&self, v: &mut Array1<f64>) {
        assert_eq!(v.len(), self.size(), "vector size does not match operator");
        let (lumped, _) = self.require_lumped();
        let ne = self.num_edges();
        {
            let mut u = v.slice_mut(s![..ne]);
            u /= &lumped.edge;
        }
        let mut p = v.slice_mut(s![ne..]);
        p /= &lumped.node;
    }

    fn saddle_point_system(
        &self,
        velocity: &CsrMatrix<f64>,
        gradient: &CsrMatrix<f64>,
        divergence: &CsrMatrix<f64>,
        constraint: &Array1<f64>,
    ) -> CsrMatrix<f64> {
        let (ne, nv) = (self.num_edges(), self.num_vertices());
        let column = CsrMatrix::from_triplets(
            nv,
            1,
            constraint.iter().enumerate().map(|(i, &w)| (i, 0, w)).collect(),
        );
        let row = column.transpose();
        CsrMatrix::from_blocks(
            &[ne, nv, 1],
            &[ne, nv, 1],
            &[
                (0, 0, velocity),
                (0, 1, gradient),
                (1, 0, divergence),
                (1, 2, &column),
                (2, 1, &row),
            ],
        )
    }

    /// Monolithic Galerkin system with the zero-mean pressure multiplier, size ne + nv + 1
    pub fn full_galerkin_system(&self) -> CsrMatrix<f64> {
        let divergence = self.mass_gradient.transpose();
        self.saddle_point_system(
            &self.galerkin_curl,
            &self.mass_gradient,
            &divergence,
            &self.node_weights,
        )
    }

    /// Monolithic DEC system with the zero-mean pressure multiplier, size ne + nv + 1
    ///
    /// # Panics
    ///
    /// Panics without mass lumping.
    pub fn full_dec_system(&self) -> CsrMatrix<f64> {
        let (lumped, curl) = self.require_lumped();
        let inv_edge = lumped.edge.mapv(|m| 1.0 / m);
        let inv_node = lumped.node.mapv(|m| 1.0 / m);

        let mut velocity = curl.clone();
        velocity.scale_rows(inv_edge.view());

        let mut divergence = self.complex.d0.transpose();
        divergence.scale_rows(inv_node.view());
        divergence.scale_cols(lumped.edge.view());

        self.saddle_point_system(&velocity, &self.complex.d0, &divergence, &lumped.node)
    }

    /// Monolithic system in the current mode
    pub fn full_system(&self) -> CsrMatrix<f64> {
        match self.mode {
            OperatorMode::Galerkin => self.full_galerkin_system(),
            OperatorMode::Dec => self.full_dec_system(),
        }
    }
}

impl LinearOperator<f64> for StokesOperator {
    fn num_rows(&self) -> usize {
        self.size()
    }

    fn num_cols(&self) -> usize {
        self.size()
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        self.apply_to(x)
    }

    fn apply_transpose(&self, x: &Array1<f64>) -> Array1<f64> {
        let mut y = Array1::zeros(self.size());
        self.mult_transpose(x.view(), y.view_mut());
        y
    }
}
