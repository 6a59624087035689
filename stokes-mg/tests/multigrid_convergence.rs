//! End-to-end convergence tests for the Stokes multigrid
//!
//! These build real hierarchies on the unit cube and check the behaviour
//! callers rely on: stationary smoothing, V/W-cycle contraction and the
//! hierarchy as a GMRES preconditioner for the Galerkin system.

use ndarray::{Array1, s};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solvers::{GmresConfig, LinearOperator, gmres_preconditioned};
use stokes::mesh::unit_cube;
use stokes::{
    CycleType, DgsSmoother, MultigridPreconditioner, OperatorMode, SmootherKind, StokesMultigrid,
    StokesOperator, StokesParameters, WhitneyHexAssembler,
};

fn params() -> StokesParameters {
    StokesParameters::default().with_penalty(9.0)
}

fn random_vector(n: usize, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array1::from_shape_fn(n, |_| rng.random_range(-1.0..1.0))
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

fn hierarchy(refinements: usize) -> StokesMultigrid {
    StokesMultigrid::with_refinements(WhitneyHexAssembler, unit_cube(1), params(), refinements)
        .expect("valid hierarchy")
}

/// Cycles from zero until the relative residual drops below 1e-6
fn vcycle_run(mg: &mut StokesMultigrid, seed: u64) -> (usize, f64) {
    let exact = random_vector(mg.size(), seed);
    let b = mg.finest_operator().apply_to(&exact);
    let mut x = Array1::zeros(mg.size());
    let result = mg.solve(&b, &mut x, 128, 1e-6);
    assert!(
        result.converged,
        "no convergence after {} cycles (relative residual {:.3e})",
        result.iterations,
        result.relative_residual
    );
    let factor = result.relative_residual.powf(1.0 / result.iterations.max(1) as f64);
    (result.iterations, factor)
}

#[test]
fn test_four_refinements_standalone_then_gmres_preconditioner() {
    let mut mg = hierarchy(4);
    assert_eq!(mg.num_levels(), 5);
    assert_eq!(mg.finest_mesh().cells(), [16, 16, 16]);

    // Standalone V-cycles on the DEC system
    let exact = random_vector(mg.size(), 42);
    let b = mg.finest_operator().apply_to(&exact);
    let mut x = Array1::zeros(mg.size());

    let initial = norm(&b);
    let mut cycles = 0;
    let mut residual = initial;
    while residual > 1e-6 * initial && cycles < 128 {
        mg.mult(b.view(), x.view_mut());
        residual = norm(&(&b - &mg.finest_operator().apply_to(&x)));
        cycles += 1;
    }
    assert!(
        residual <= 1e-6 * initial,
        "relative residual {:.3e} after {} cycles",
        residual / initial,
        cycles
    );

    // Same hierarchy preconditioning GMRES on the Galerkin system
    let mut galerkin =
        StokesOperator::assemble(&WhitneyHexAssembler, mg.finest_mesh(), &params())
            .expect("valid operator");
    galerkin.set_mode(OperatorMode::Galerkin);
    assert_eq!(galerkin.num_rows(), mg.size());

    let mut exact = random_vector(galerkin.size(), 7);
    galerkin.eliminate_constants(&mut exact);
    let b = galerkin.apply(&exact);

    mg.set_operator_mode(OperatorMode::Galerkin);
    let precond = MultigridPreconditioner::new(mg);
    let config = GmresConfig {
        max_iterations: 4,
        restart: 50,
        tolerance: 1e-6,
        print_interval: 0,
    };
    let solution = gmres_preconditioned(&galerkin, &precond, &b, &config);

    assert!(solution.converged, "GMRES residual {:.3e}", solution.residual);
    assert!(solution.residual < 1e-6);

    let true_residual = norm(&(&b - &galerkin.apply(&solution.x))) / norm(&b);
    assert!(true_residual < 1e-4, "true relative residual {:.3e}", true_residual);
}

#[test]
fn test_wcycle_converges() {
    let mut mg = hierarchy(3);
    mg.set_cycle_type(CycleType::WCycle);
    let (cycles, _) = vcycle_run(&mut mg, 3);
    assert!(cycles <= 128);
}

#[test]
fn test_contraction_does_not_degrade_with_depth() {
    let (_, shallow) = vcycle_run(&mut hierarchy(2), 11);
    let (_, deep) = vcycle_run(&mut hierarchy(3), 11);
    assert!(shallow < 0.9 && deep < 0.9, "factors {} and {}", shallow, deep);
    assert!(deep < shallow + 0.1, "factor grew from {} to {}", shallow, deep);
}

#[test]
fn test_symmetric_smoother_in_hierarchy() {
    let params = params().with_smoother(SmootherKind::GaussSeidelSymmetric);
    let mut mg = StokesMultigrid::with_refinements(WhitneyHexAssembler, unit_cube(1), params, 2)
        .expect("valid hierarchy");
    mg.set_smooth_iterations(2, 2);
    vcycle_run(&mut mg, 5);
}

#[test]
fn test_dgs_stationary_iteration() {
    let op = StokesOperator::assemble(&WhitneyHexAssembler, &unit_cube(4), &params())
        .expect("valid operator");
    let smoother = DgsSmoother::new(&op, SmootherKind::GaussSeidelForward).expect("valid smoother");

    let exact = random_vector(op.size(), 1);
    let rhs = op.apply_to(&exact);
    let rhs_norm = norm(&rhs);
    let mut x = random_vector(op.size(), 2);

    let mut iterations = 0;
    let mut relative = smoother.compute_residual_norm(rhs.view(), x.view()) / rhs_norm;
    while relative > 1e-12 && iterations < 10_000 {
        smoother.mult(rhs.view(), x.view_mut());
        op.eliminate_constants(&mut x);
        relative = smoother.compute_residual_norm(rhs.view(), x.view()) / rhs_norm;
        iterations += 1;
    }
    assert!(relative <= 1e-12, "relative residual {:.3e} after {} sweeps", relative, iterations);
}

#[test]
fn test_smoother_residual_matches_operator() {
    let mg = hierarchy(2);
    for level in 0..mg.num_levels() {
        let op = mg.operator(level);
        let x = random_vector(op.size(), 100 + level as u64);
        let rhs = random_vector(op.size(), 200 + level as u64);
        let expected = norm(&(&op.apply_to(&x) - &rhs));
        let got = mg.smoother(level).compute_residual_norm(rhs.view(), x.view());
        assert!((got - expected).abs() <= 1e-12 * expected, "level {}", level);
    }
}

#[test]
fn test_multigrid_preserves_velocity_of_exact_solution() {
    // Starting at the exact solution, a cycle only moves the pressure by a constant
    let mut mg = hierarchy(2);
    let exact = random_vector(mg.size(), 9);
    let b = mg.finest_operator().apply_to(&exact);
    let mut x = exact.clone();
    mg.mult(b.view(), x.view_mut());

    let ne = mg.finest_operator().num_edges();
    let du = &x.slice(s![..ne]) - &exact.slice(s![..ne]);
    assert!(norm(&du) < 1e-8 * norm(&exact));
}
