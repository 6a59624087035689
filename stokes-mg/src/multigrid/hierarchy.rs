//! Level hierarchy for geometric multigrid on the Stokes system
//!
//! Levels are stored coarsest first and only ever appended: each call to
//! [`StokesMultigrid::add_refined_level`] refines the current finest mesh
//! and builds operator, smoother and transfer operators for it.

use super::smoother::DgsSmoother;
use super::transfer::LevelTransfer;
use crate::assembly::{ComplexAssembler, WhitneyHexAssembler};
use crate::config::{CycleType, MultigridConfig, OperatorMode, StokesParameters};
use crate::error::{Result, StokesError};
use crate::operator::StokesOperator;
use ndarray::Array1;
use solvers::{LuFactorization, Preconditioner};

/// One level of the hierarchy with its private scratch space
pub struct Level<M> {
    pub(crate) mesh: M,
    pub(crate) operator: StokesOperator,
    pub(crate) smoother: DgsSmoother,
    /// Transfer from the next coarser level; `None` on level 0
    pub(crate) transfer: Option<LevelTransfer>,
    pub(crate) x: Array1<f64>,
    pub(crate) b: Array1<f64>,
    pub(crate) res: Array1<f64>,
}

impl<M> Level<M> {
    fn new(mesh: M, operator: StokesOperator, smoother: DgsSmoother) -> Self {
        let n = operator.size();
        Self {
            mesh,
            operator,
            smoother,
            transfer: None,
            x: Array1::zeros(n),
            b: Array1::zeros(n),
            res: Array1::zeros(n),
        }
    }

    /// Number of unknowns on this level
    pub fn size(&self) -> usize {
        self.operator.size()
    }
}

/// Solver used on the coarsest level
pub(crate) enum CoarseSolver {
    /// Caller-provided approximate inverse
    User(Box<dyn Preconditioner<f64>>),
    /// Dense LU of the monolithic DEC system with the pressure multiplier
    Direct(LuFactorization<f64>),
    /// Smoother sweeps only
    Smoothing,
}

/// What the coarsest level currently does
#[derive(Debug, Clone, PartialEq)]
pub enum CoarseStatus {
    /// Direct factorization of the coarse system
    Direct,
    /// A solver supplied through [`StokesMultigrid::set_coarse_solver`]
    UserSupplied,
    /// Smoothing sweeps because the direct solve is unavailable
    SmoothingFallback {
        /// Why the direct solver was abandoned
        error: StokesError,
    },
}

impl CoarseStatus {
    /// The error that disabled the direct solver, if any
    pub fn fallback_error(&self) -> Option<&StokesError> {
        match self {
            CoarseStatus::SmoothingFallback { error } => Some(error),
            _ => None,
        }
    }
}

/// Geometric multigrid for the Stokes-Nitsche system with DGS smoothing
pub struct StokesMultigrid<A: ComplexAssembler = WhitneyHexAssembler> {
    pub(crate) assembler: A,
    pub(crate) params: StokesParameters,
    pub(crate) config: MultigridConfig,
    pub(crate) levels: Vec<Level<A::Mesh>>,
    pub(crate) coarse_solver: CoarseSolver,
    pub(crate) coarse_status: CoarseStatus,
}

impl<A: ComplexAssembler> StokesMultigrid<A> {
    /// Build a one-level hierarchy on `coarse_mesh`
    ///
    /// The coarse DEC system is factorized right away; if that fails the
    /// solver falls back to smoothing and reports it via [`coarse_status`](Self::coarse_status).
    pub fn new(assembler: A, coarse_mesh: A::Mesh, params: StokesParameters) -> Result<Self> {
        let level = Self::build_level(&assembler, coarse_mesh, &params)?;

        let n = level.size();
        log::info!(
            "Multigrid level 0: {} edges, {} vertices",
            level.operator.num_edges(),
            level.operator.num_vertices()
        );
        log::debug!("Factorizing coarse DEC system of size {}", n + 1);

        let (coarse_solver, coarse_status) =
            match LuFactorization::from_csr(&level.operator.full_dec_system()) {
                Ok(lu) => (CoarseSolver::Direct(lu), CoarseStatus::Direct),
                Err(e) => {
                    log::warn!("Coarse factorization failed ({}), using smoothing instead", e);
                    (
                        CoarseSolver::Smoothing,
                        CoarseStatus::SmoothingFallback { error: e.into() },
                    )
                }
            };

        Ok(Self {
            assembler,
            params,
            config: MultigridConfig::default(),
            levels: vec![level],
            coarse_solver,
            coarse_status,
        })
    }

    /// Build a hierarchy with `refinements` levels on top of `coarse_mesh`
    pub fn with_refinements(
        assembler: A,
        coarse_mesh: A::Mesh,
        params: StokesParameters,
        refinements: usize,
    ) -> Result<Self> {
        let mut mg = Self::new(assembler, coarse_mesh, params)?;
        for _ in 0..refinements {
            mg.add_refined_level()?;
        }
        Ok(mg)
    }

    fn build_level(
        assembler: &A,
        mesh: A::Mesh,
        params: &StokesParameters,
    ) -> Result<Level<A::Mesh>> {
        let mut operator = StokesOperator::assemble(assembler, &mesh, params)?;
        operator.set_mode(OperatorMode::Dec);
        let smoother = DgsSmoother::new(&operator, params.smoother)?;
        Ok(Level::new(mesh, operator, smoother))
    }

    /// Refine the finest mesh and append a new level
    pub fn add_refined_level(&mut self) -> Result<()> {
        let coarse = self.finest_level();
        let fine_mesh = self.assembler.refine(&coarse.mesh);
        let prolongation = self.assembler.prolongation(&coarse.mesh, &fine_mesh)?;

        let mut level = Self::build_level(&self.assembler, fine_mesh, &self.params)?;
        level.transfer = Some(LevelTransfer::new(
            prolongation,
            &coarse.operator,
            &level.operator,
        )?);

        log::info!(
            "Multigrid level {}: {} edges, {} vertices",
            self.levels.len(),
            level.operator.num_edges(),
            level.operator.num_vertices()
        );
        self.levels.push(level);
        Ok(())
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    fn level(&self, index: usize) -> &Level<A::Mesh> {
        assert!(
            index < self.levels.len(),
            "level index {} out of range (hierarchy has {} levels)",
            index,
            self.levels.len()
        );
        &self.levels[index]
    }

    fn finest_level(&self) -> &Level<A::Mesh> {
        self.level(self.levels.len() - 1)
    }

    /// DEC operator of level `index` (0 = coarsest)
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn operator(&self, index: usize) -> &StokesOperator {
        &self.level(index).operator
    }

    /// Smoother of level `index`
    pub fn smoother(&self, index: usize) -> &DgsSmoother {
        &self.level(index).smoother
    }

    /// Mesh of level `index`
    pub fn mesh(&self, index: usize) -> &A::Mesh {
        &self.level(index).mesh
    }

    /// Transfer from level `index - 1` to level `index`; `None` for level 0
    pub fn transfer(&self, index: usize) -> Option<&LevelTransfer> {
        self.level(index).transfer.as_ref()
    }

    pub fn finest_operator(&self) -> &StokesOperator {
        &self.finest_level().operator
    }

    pub fn finest_smoother(&self) -> &DgsSmoother {
        &self.finest_level().smoother
    }

    pub fn finest_mesh(&self) -> &A::Mesh {
        &self.finest_level().mesh
    }

    /// Number of unknowns on the finest level
    pub fn size(&self) -> usize {
        self.finest_level().size()
    }

    pub fn params(&self) -> &StokesParameters {
        &self.params
    }

    pub fn config(&self) -> &MultigridConfig {
        &self.config
    }

    pub fn coarse_status(&self) -> &CoarseStatus {
        &self.coarse_status
    }

    /// Replace the internal coarse solver
    pub fn set_coarse_solver(&mut self, solver: Box<dyn Preconditioner<f64>>) {
        self.coarse_solver = CoarseSolver::User(solver);
        self.coarse_status = CoarseStatus::UserSupplied;
    }

    /// Number of smoother sweeps before and after each coarse-grid correction
    pub fn set_smooth_iterations(&mut self, pre: usize, post: usize) {
        self.config.pre_smooth = pre;
        self.config.post_smooth = post;
    }

    pub fn set_cycle_type(&mut self, cycle_type: CycleType) {
        self.config.cycle_type = cycle_type;
    }

    /// Representation of right-hand sides passed to [`mult`](Self::mult)
    pub fn set_operator_mode(&mut self, mode: OperatorMode) {
        self.config.operator_mode = mode;
    }

    /// Whether [`mult`](Self::mult) starts from the incoming iterate
    pub fn set_iterative_mode(&mut self, iterative: bool) {
        self.config.iterative_mode = iterative;
    }

    /// Replace the whole traversal configuration
    pub fn set_config(&mut self, config: MultigridConfig) {
        self.config = config;
    }
}
