//! Multigrid cycles on the Stokes hierarchy
//!
//! The coarse-grid correction solves A_c e = R (b - A x) and adds P e to
//! the fine iterate. All vectors live in the DEC representation; Galerkin
//! right-hand sides are converted once on entry.

use super::hierarchy::{CoarseSolver, CoarseStatus, Level, StokesMultigrid};
use crate::assembly::ComplexAssembler;
use crate::config::{CycleType, MultigridConfig, OperatorMode};
use crate::error::StokesError;
use ndarray::{Array1, ArrayView1, ArrayViewMut1, s};
use solvers::Preconditioner;
use std::sync::{Mutex, PoisonError};

/// Outcome of [`StokesMultigrid::solve`]
#[derive(Debug, Clone)]
pub struct MultigridResult {
    /// Number of cycles performed
    pub iterations: usize,
    /// Final residual norm relative to the right-hand side
    pub relative_residual: f64,
    /// Convergence achieved
    pub converged: bool,
}

fn smooth<M>(level: &mut Level<M>, sweeps: usize) {
    for _ in 0..sweeps {
        level.smoother.mult(level.b.view(), level.x.view_mut());
    }
}

/// Solve on level 0 with whatever coarse solver is active
fn coarse_solve<M>(
    level: &mut Level<M>,
    solver: &mut CoarseSolver,
    status: &mut CoarseStatus,
    config: &MultigridConfig,
) {
    let failure = match solver {
        CoarseSolver::User(inner) => {
            let y = inner.apply(&level.b);
            assert_eq!(y.len(), level.size(), "coarse solver returned a vector of wrong size");
            level.x.assign(&y);
            None
        }
        CoarseSolver::Direct(lu) => {
            let n = level.size();
            let mut padded = Array1::zeros(n + 1);
            padded.slice_mut(s![..n]).assign(&level.b);
            match lu.solve(&padded) {
                Ok(sol) if sol.iter().all(|v| v.is_finite()) => {
                    level.x.assign(&sol.slice(s![..n]));
                    None
                }
                Ok(_) => Some(StokesError::NonFiniteCoarseSolution),
                Err(e) => Some(StokesError::CoarseFactorization(e)),
            }
        }
        CoarseSolver::Smoothing => {
            smooth(level, (config.pre_smooth + config.post_smooth).max(1));
            None
        }
    };

    if let Some(error) = failure {
        log::warn!("Coarse direct solve failed ({}), falling back to smoothing", error);
        *solver = CoarseSolver::Smoothing;
        *status = CoarseStatus::SmoothingFallback { error };
        smooth(level, (config.pre_smooth + config.post_smooth).max(1));
    }
}

/// One cycle on the finest level of `levels`, using `levels[..last]` for the correction
fn cycle<M>(
    levels: &mut [Level<M>],
    solver: &mut CoarseSolver,
    status: &mut CoarseStatus,
    config: &MultigridConfig,
) {
    let index = levels.len() - 1;
    if index == 0 {
        coarse_solve(&mut levels[0], solver, status, config);
        return;
    }

    let (lower, upper) = levels.split_at_mut(index);
    let fine = &mut upper[0];

    smooth(fine, config.pre_smooth);

    // res = b - A x
    fine.operator.mult(fine.x.view(), fine.res.view_mut());
    fine.res.zip_mut_with(&fine.b, |r, &b| *r = b - *r);

    let Some(transfer) = fine.transfer.as_ref() else {
        panic!("level {} has no transfer operators", index);
    };
    {
        let coarse = &mut lower[index - 1];
        transfer.restrict_into(fine.res.view(), coarse.b.view_mut());
        coarse.x.fill(0.0);
    }

    let visits = match config.cycle_type {
        CycleType::VCycle => 1,
        CycleType::WCycle => 2,
    };
    for _ in 0..visits {
        cycle(lower, solver, status, config);
    }

    transfer.prolong_add(lower[index - 1].x.view(), fine.x.view_mut());

    smooth(fine, config.post_smooth);
}

impl<A: ComplexAssembler> StokesMultigrid<A> {
    fn load_finest(&mut self, b: ArrayView1<f64>) {
        let mode = self.config.operator_mode;
        let Some(finest) = self.levels.last_mut() else {
            unreachable!("hierarchy always has a coarse level");
        };
        finest.b.assign(&b);
        if mode == OperatorMode::Galerkin {
            finest.operator.galerkin_to_dec(&mut finest.b);
        }
    }

    fn run_cycle(&mut self) {
        cycle(
            &mut self.levels,
            &mut self.coarse_solver,
            &mut self.coarse_status,
            &self.config,
        );
    }

    /// Apply one multigrid cycle to `b`, writing the result into `x`
    ///
    /// With `iterative_mode` the incoming `x` is the initial guess,
    /// otherwise the cycle starts from zero.
    ///
    /// # Panics
    ///
    /// Panics if `b` or `x` does not match the finest level size.
    pub fn mult(&mut self, b: ArrayView1<f64>, mut x: ArrayViewMut1<f64>) {
        let n = self.size();
        assert!(
            b.len() == n && x.len() == n,
            "multigrid of size {} applied to vectors of size {} and {}",
            n,
            b.len(),
            x.len()
        );

        self.load_finest(b);
        let iterative = self.config.iterative_mode;
        if let Some(finest) = self.levels.last_mut() {
            if iterative {
                finest.x.assign(&x);
            } else {
                finest.x.fill(0.0);
            }
        }

        self.run_cycle();

        if let Some(finest) = self.levels.last() {
            x.assign(&finest.x);
        }
    }

    /// Stationary iteration: repeat cycles until the DEC residual drops
    /// below `tolerance` relative to the right-hand side
    pub fn solve(
        &mut self,
        b: &Array1<f64>,
        x: &mut Array1<f64>,
        max_cycles: usize,
        tolerance: f64,
    ) -> MultigridResult {
        assert_eq!(b.len(), self.size(), "right-hand side size mismatch");
        assert_eq!(x.len(), self.size(), "iterate size mismatch");

        self.load_finest(b.view());
        if let Some(finest) = self.levels.last_mut() {
            finest.x.assign(x);
        }

        let residual_norm = |level: &mut Level<A::Mesh>| -> f64 {
            level.operator.mult(level.x.view(), level.res.view_mut());
            level.res.zip_mut_with(&level.b, |r, &b| *r = b - *r);
            level.res.dot(&level.res).sqrt()
        };

        let mut iterations = 0;
        let mut relative = 0.0;
        if let Some(finest) = self.levels.last_mut() {
            let b_norm = finest.b.dot(&finest.b).sqrt().max(f64::MIN_POSITIVE);
            relative = residual_norm(finest) / b_norm;
            while relative > tolerance && iterations < max_cycles {
                self.run_cycle();
                iterations += 1;
                let Some(finest) = self.levels.last_mut() else {
                    break;
                };
                relative = residual_norm(finest) / b_norm;
                log::debug!("Multigrid cycle {}: relative residual {:.3e}", iterations, relative);
            }
        }

        if let Some(finest) = self.levels.last() {
            x.assign(&finest.x);
        }

        MultigridResult {
            iterations,
            relative_residual: relative,
            converged: relative <= tolerance,
        }
    }
}

/// Thread-safe preconditioner wrapper around a [`StokesMultigrid`]
///
/// Every application runs one cycle from a zero initial guess. Concurrent
/// callers are serialized by the internal mutex since the hierarchy owns
/// its scratch vectors.
pub struct MultigridPreconditioner<A: ComplexAssembler> {
    inner: Mutex<StokesMultigrid<A>>,
}

impl<A: ComplexAssembler> MultigridPreconditioner<A> {
    pub fn new(multigrid: StokesMultigrid<A>) -> Self {
        Self {
            inner: Mutex::new(multigrid),
        }
    }

    /// Recover the wrapped hierarchy
    pub fn into_inner(self) -> StokesMultigrid<A> {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: ComplexAssembler> Preconditioner<f64> for MultigridPreconditioner<A> {
    fn apply(&self, r: &Array1<f64>) -> Array1<f64> {
        let mut mg = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut y = Array1::zeros(r.len());
        mg.mult(r.view(), y.view_mut());
        y
    }
}
