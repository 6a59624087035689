//! GMRES (Generalized Minimal Residual) solver
//!
//! Implementation of the restarted GMRES algorithm based on Saad & Schultz (1986).
//!
//! GMRES minimizes the residual in a Krylov subspace and is the method of
//! choice for the non-symmetric saddle-point systems in this workspace. The
//! preconditioned variants apply the preconditioner from the left, so the
//! reported residual is the preconditioned one.

use crate::traits::{IdentityPreconditioner, LinearOperator, Preconditioner, Scalar};
use crate::vector::{axpy, inner_product, vector_norm};
use ndarray::{Array1, Array2};

/// GMRES solver configuration
#[derive(Debug, Clone)]
pub struct GmresConfig<R> {
    /// Maximum number of outer iterations (restarts)
    pub max_iterations: usize,
    /// Restart parameter (number of inner iterations before restart)
    pub restart: usize,
    /// Relative tolerance for convergence
    pub tolerance: R,
    /// Log progress every N iterations (0 = no output)
    pub print_interval: usize,
}

impl Default for GmresConfig<f64> {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            restart: 30,
            tolerance: 1e-6,
            print_interval: 0,
        }
    }
}

impl Default for GmresConfig<f32> {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            restart: 30,
            tolerance: 1e-5,
            print_interval: 0,
        }
    }
}

impl<R> GmresConfig<R> {
    /// Create config with specific restart parameter
    pub fn with_restart(restart: usize) -> Self
    where
        Self: Default,
    {
        Self {
            restart,
            ..Default::default()
        }
    }
}

/// GMRES solver result
#[derive(Debug)]
pub struct GmresSolution<T: Scalar> {
    /// Solution vector
    pub x: Array1<T>,
    /// Total number of inner (Arnoldi) iterations
    pub iterations: usize,
    /// Number of restarts performed
    pub restarts: usize,
    /// Final relative residual
    pub residual: T,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve Ax = b using the restarted GMRES method
pub fn gmres<T, A>(operator: &A, b: &Array1<T>, config: &GmresConfig<T>) -> GmresSolution<T>
where
    T: Scalar,
    A: LinearOperator<T>,
{
    gmres_with_guess(operator, b, None, config)
}

/// Solve Ax = b using GMRES with an initial guess
pub fn gmres_with_guess<T, A>(
    operator: &A,
    b: &Array1<T>,
    x0: Option<&Array1<T>>,
    config: &GmresConfig<T>,
) -> GmresSolution<T>
where
    T: Scalar,
    A: LinearOperator<T>,
{
    gmres_preconditioned_with_guess(operator, &IdentityPreconditioner, b, x0, config)
}

/// GMRES solver with preconditioner
///
/// Solves Ax = b using left preconditioning: M⁻¹Ax = M⁻¹b
pub fn gmres_preconditioned<T, A, P>(
    operator: &A,
    precond: &P,
    b: &Array1<T>,
    config: &GmresConfig<T>,
) -> GmresSolution<T>
where
    T: Scalar,
    A: LinearOperator<T>,
    P: Preconditioner<T>,
{
    gmres_preconditioned_with_guess(operator, precond, b, None, config)
}

/// GMRES solver with preconditioner and optional initial guess
pub fn gmres_preconditioned_with_guess<T, A, P>(
    operator: &A,
    precond: &P,
    b: &Array1<T>,
    x0: Option<&Array1<T>>,
    config: &GmresConfig<T>,
) -> GmresSolution<T>
where
    T: Scalar,
    A: LinearOperator<T>,
    P: Preconditioner<T>,
{
    assert_eq!(
        operator.num_rows(),
        b.len(),
        "Right-hand side size mismatch"
    );
    let n = b.len();
    let m = config.restart.max(1);

    let mut x = match x0 {
        Some(guess) => guess.clone(),
        None => Array1::from_elem(n, T::zero()),
    };

    let pb = precond.apply(b);
    let b_norm = vector_norm(&pb);
    if b_norm < T::from_real(1e-15) {
        return GmresSolution {
            x,
            iterations: 0,
            restarts: 0,
            residual: T::zero(),
            converged: true,
        };
    }

    let breakdown_tol = T::from_real(1e-14);
    let mut total_iterations = 0;
    let mut restarts = 0;

    for _outer in 0..config.max_iterations {
        // Preconditioned residual r = M⁻¹(b - Ax)
        let residual: Array1<T> = b - &operator.apply(&x);
        let r = precond.apply(&residual);
        let beta = vector_norm(&r);

        let rel_residual = beta / b_norm;
        if rel_residual < config.tolerance {
            return GmresSolution {
                x,
                iterations: total_iterations,
                restarts,
                residual: rel_residual,
                converged: true,
            };
        }

        let mut v: Vec<Array1<T>> = Vec::with_capacity(m + 1);
        v.push(r.mapv(|ri| ri / beta));

        let mut h: Array2<T> = Array2::from_elem((m + 1, m), T::zero());
        let mut cs: Vec<T> = Vec::with_capacity(m);
        let mut sn: Vec<T> = Vec::with_capacity(m);

        let mut g: Array1<T> = Array1::from_elem(m + 1, T::zero());
        g[0] = beta;

        for j in 0..m {
            total_iterations += 1;

            // w = M⁻¹ * A * v_j
            let av = operator.apply(&v[j]);
            let mut w = precond.apply(&av);

            // Modified Gram-Schmidt
            for i in 0..=j {
                let h_ij = inner_product(&v[i], &w);
                h[[i, j]] = h_ij;
                axpy(-h_ij, &v[i], &mut w);
            }

            let w_norm = vector_norm(&w);
            h[[j + 1, j]] = w_norm;

            let breakdown = w_norm < breakdown_tol;
            if !breakdown {
                v.push(w.mapv(|wi| wi / w_norm));
            }

            // Apply previous Givens rotations to the new column of H
            for i in 0..j {
                let temp = cs[i] * h[[i, j]] + sn[i] * h[[i + 1, j]];
                h[[i + 1, j]] = -sn[i] * h[[i, j]] + cs[i] * h[[i + 1, j]];
                h[[i, j]] = temp;
            }

            let (c, s) = givens_rotation(h[[j, j]], h[[j + 1, j]]);
            cs.push(c);
            sn.push(s);

            h[[j, j]] = c * h[[j, j]] + s * h[[j + 1, j]];
            h[[j + 1, j]] = T::zero();

            let temp = c * g[j] + s * g[j + 1];
            g[j + 1] = -s * g[j] + c * g[j + 1];
            g[j] = temp;

            let rel_residual = g[j + 1].abs() / b_norm;

            if config.print_interval > 0 && total_iterations % config.print_interval == 0 {
                log::info!(
                    "GMRES iteration {} (restart {}): relative residual = {:.6e}",
                    total_iterations,
                    restarts,
                    rel_residual.to_f64().unwrap_or(0.0)
                );
            }

            if rel_residual < config.tolerance || breakdown {
                let y = solve_upper_triangular(&h, &g, j + 1);
                for (i, &yi) in y.iter().enumerate() {
                    axpy(yi, &v[i], &mut x);
                }

                return GmresSolution {
                    x,
                    iterations: total_iterations,
                    restarts,
                    residual: rel_residual,
                    converged: rel_residual < config.tolerance,
                };
            }
        }

        // Maximum inner iterations reached, update the solution and restart
        let y = solve_upper_triangular(&h, &g, m);
        for (i, &yi) in y.iter().enumerate() {
            axpy(yi, &v[i], &mut x);
        }

        restarts += 1;
    }

    let residual: Array1<T> = b - &operator.apply(&x);
    let r = precond.apply(&residual);
    let rel_residual = vector_norm(&r) / b_norm;

    GmresSolution {
        x,
        iterations: total_iterations,
        restarts,
        residual: rel_residual,
        converged: rel_residual < config.tolerance,
    }
}

/// Compute Givens rotation coefficients
#[inline]
fn givens_rotation<T: Scalar>(a: T, b: T) -> (T, T) {
    let tol = T::from_real(1e-30);
    if b.abs() < tol {
        return (T::one(), T::zero());
    }
    if a.abs() < tol {
        return (T::zero(), T::one());
    }

    let r = a.hypot(b);
    (a / r, b / r)
}

/// Solve upper triangular system Hy = g
fn solve_upper_triangular<T: Scalar>(h: &Array2<T>, g: &Array1<T>, k: usize) -> Vec<T> {
    let mut y = vec![T::zero(); k];
    let tol = T::from_real(1e-30);

    for i in (0..k).rev() {
        let mut sum = g[i];
        for j in (i + 1)..k {
            sum -= h[[i, j]] * y[j];
        }
        if h[[i, i]].abs() > tol {
            y[i] = sum / h[[i, i]];
        }
    }

    y
}
