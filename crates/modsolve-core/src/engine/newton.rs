use super::config::ConvergenceCriteria;
use super::error::SolverError;
use super::interface::SolveStats;
use nalgebra::{DMatrix, DVector};
use tracing::trace;

// sqrt(f64::EPSILON): the usual forward-difference perturbation scale.
const FD_EPS: f64 = 1.4901161193847656e-8;

/// Solves F(x) = 0 by Newton–Raphson with a forward-difference Jacobian.
///
/// `residual` evaluates F into its second argument; it is called once per
/// iteration plus once per unknown for the Jacobian columns. On success `x`
/// holds the solution.
pub(crate) fn solve<F>(
    x: &mut DVector<f64>,
    mut residual: F,
    criteria: &ConvergenceCriteria,
) -> Result<SolveStats, SolverError>
where
    F: FnMut(&DVector<f64>, &mut DVector<f64>),
{
    let n = x.len();
    if n == 0 {
        return Ok(SolveStats::default());
    }

    let mut r = DVector::zeros(n);
    residual(x, &mut r);
    let mut norm = check_residual(&r, 0)?;

    for iteration in 0..criteria.max_iterations {
        if norm < criteria.tolerance {
            trace!(
                "Newton converged after {} iteration(s), residual norm {:.3e}",
                iteration, norm
            );
            return Ok(SolveStats {
                iterations: iteration,
                residual_norm: norm,
            });
        }

        let jacobian = fd_jacobian(x, &r, &mut residual);
        let delta = jacobian
            .lu()
            .solve(&r)
            .ok_or(SolverError::SingularJacobian)?;
        *x -= &delta;

        residual(x, &mut r);
        norm = check_residual(&r, iteration + 1)?;
    }

    if norm < criteria.tolerance {
        Ok(SolveStats {
            iterations: criteria.max_iterations,
            residual_norm: norm,
        })
    } else {
        Err(SolverError::Convergence {
            iterations: criteria.max_iterations,
            residual_norm: norm,
        })
    }
}

fn check_residual(r: &DVector<f64>, iteration: usize) -> Result<f64, SolverError> {
    let mut norm = 0.0f64;
    for &value in r.iter() {
        if !value.is_finite() {
            return Err(SolverError::NonFiniteResidual { iteration });
        }
        norm = norm.max(value.abs());
    }
    Ok(norm)
}

fn fd_jacobian<F>(x: &DVector<f64>, r0: &DVector<f64>, residual: &mut F) -> DMatrix<f64>
where
    F: FnMut(&DVector<f64>, &mut DVector<f64>),
{
    let n = x.len();
    let mut jacobian = DMatrix::zeros(n, n);
    let mut x_pert = x.clone();
    let mut r_pert = DVector::zeros(n);

    for j in 0..n {
        let h = FD_EPS * x[j].abs().max(1.0);
        x_pert[j] = x[j] + h;
        residual(&x_pert, &mut r_pert);
        for i in 0..n {
            jacobian[(i, j)] = (r_pert[i] - r0[i]) / h;
        }
        x_pert[j] = x[j];
    }

    jacobian
}
