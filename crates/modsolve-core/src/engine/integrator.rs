use super::config::ConvergenceCriteria;
use super::error::SolverError;
use super::interface::SolveStats;
use super::newton;
use crate::core::expr::Expr;
use crate::core::model::IntegrationMethod;
use nalgebra::DVector;

/// A borrowed view of a semi-explicit DAE:
///
/// ```text
/// x' = f(x, y, p, t)     (one rhs per state)
/// 0  = g(x, y, p, t)     (one residual per algebraic unknown)
/// ```
///
/// `states`/`unknowns` index into the full value vector; `derivatives` is
/// aligned with `states`.
pub(crate) struct DaeProblem<'a> {
    pub states: &'a [usize],
    pub unknowns: &'a [usize],
    pub derivatives: &'a [Expr],
    pub residuals: &'a [Expr],
}

impl DaeProblem<'_> {
    fn eval_derivatives(&self, values: &[f64], t: f64, out: &mut [f64]) {
        for (k, rhs) in self.derivatives.iter().enumerate() {
            out[k] = rhs.eval(values, t);
        }
    }
}

/// Solves the algebraic subsystem for the unknowns, holding states and
/// parameters fixed. Also used for consistent initialization at reset time.
pub(crate) fn solve_algebraic(
    problem: &DaeProblem,
    values: &mut [f64],
    t: f64,
    criteria: &ConvergenceCriteria,
) -> Result<SolveStats, SolverError> {
    if problem.unknowns.is_empty() {
        return Ok(SolveStats::default());
    }

    let mut scratch = values.to_vec();
    let mut y = DVector::from_iterator(
        problem.unknowns.len(),
        problem.unknowns.iter().map(|&i| values[i]),
    );

    let stats = newton::solve(
        &mut y,
        |y, r| {
            for (k, &i) in problem.unknowns.iter().enumerate() {
                scratch[i] = y[k];
            }
            for (m, residual) in problem.residuals.iter().enumerate() {
                r[m] = residual.eval(&scratch, t);
            }
        },
        criteria,
    )?;

    for (k, &i) in problem.unknowns.iter().enumerate() {
        values[i] = y[k];
    }
    Ok(stats)
}

/// Advances the system one step from `t` to `t + h`, updating `values` in
/// place. The caller is responsible for advancing its own clock.
pub(crate) fn step(
    problem: &DaeProblem,
    values: &mut [f64],
    t: f64,
    h: f64,
    method: IntegrationMethod,
    criteria: &ConvergenceCriteria,
) -> Result<SolveStats, SolverError> {
    match method {
        IntegrationMethod::BackwardEuler => implicit_step(problem, values, t, h, criteria, false),
        IntegrationMethod::Trapezoidal => implicit_step(problem, values, t, h, criteria, true),
        IntegrationMethod::Rk4 => rk4_step(problem, values, t, h, criteria),
    }
}

/// Backward Euler / trapezoidal: one Newton solve on the combined
/// state+unknown vector at the end of the step.
fn implicit_step(
    problem: &DaeProblem,
    values: &mut [f64],
    t: f64,
    h: f64,
    criteria: &ConvergenceCriteria,
    trapezoidal: bool,
) -> Result<SolveStats, SolverError> {
    let ns = problem.states.len();
    let nu = problem.unknowns.len();
    let t_new = t + h;

    let x_old: Vec<f64> = problem.states.iter().map(|&i| values[i]).collect();
    let f_old = if trapezoidal {
        let mut derivs = vec![0.0; ns];
        problem.eval_derivatives(values, t, &mut derivs);
        Some(derivs)
    } else {
        None
    };

    let mut scratch = values.to_vec();
    let mut derivs = vec![0.0; ns];
    let mut z = DVector::from_iterator(
        ns + nu,
        problem
            .states
            .iter()
            .chain(problem.unknowns.iter())
            .map(|&i| values[i]),
    );

    let stats = newton::solve(
        &mut z,
        |z, r| {
            for (k, &i) in problem.states.iter().enumerate() {
                scratch[i] = z[k];
            }
            for (k, &i) in problem.unknowns.iter().enumerate() {
                scratch[i] = z[ns + k];
            }
            problem.eval_derivatives(&scratch, t_new, &mut derivs);
            for k in 0..ns {
                r[k] = match &f_old {
                    None => z[k] - x_old[k] - h * derivs[k],
                    Some(f0) => z[k] - x_old[k] - 0.5 * h * (derivs[k] + f0[k]),
                };
            }
            for (m, residual) in problem.residuals.iter().enumerate() {
                r[ns + m] = residual.eval(&scratch, t_new);
            }
        },
        criteria,
    )?;

    for (k, &i) in problem.states.iter().enumerate() {
        values[i] = z[k];
    }
    for (k, &i) in problem.unknowns.iter().enumerate() {
        values[i] = z[ns + k];
    }
    Ok(stats)
}

/// Classic RK4 on the differential variables. After each stage update the
/// algebraic subsystem is re-solved so stage derivatives see consistent
/// unknowns; for pure ODE models the re-solves are no-ops.
fn rk4_step(
    problem: &DaeProblem,
    values: &mut [f64],
    t: f64,
    h: f64,
    criteria: &ConvergenceCriteria,
) -> Result<SolveStats, SolverError> {
    let ns = problem.states.len();
    let x0: Vec<f64> = problem.states.iter().map(|&i| values[i]).collect();

    let mut iterations = 0;
    let mut residual_norm = 0.0;
    let mut track = |stats: SolveStats| {
        iterations += stats.iterations;
        residual_norm = stats.residual_norm;
    };

    let mut k1 = vec![0.0; ns];
    let mut k2 = vec![0.0; ns];
    let mut k3 = vec![0.0; ns];
    let mut k4 = vec![0.0; ns];
    let mut stage = values.to_vec();

    problem.eval_derivatives(values, t, &mut k1);

    set_stage_states(&mut stage, problem.states, &x0, &k1, 0.5 * h);
    track(solve_algebraic(problem, &mut stage, t + 0.5 * h, criteria)?);
    problem.eval_derivatives(&stage, t + 0.5 * h, &mut k2);

    set_stage_states(&mut stage, problem.states, &x0, &k2, 0.5 * h);
    track(solve_algebraic(problem, &mut stage, t + 0.5 * h, criteria)?);
    problem.eval_derivatives(&stage, t + 0.5 * h, &mut k3);

    set_stage_states(&mut stage, problem.states, &x0, &k3, h);
    track(solve_algebraic(problem, &mut stage, t + h, criteria)?);
    problem.eval_derivatives(&stage, t + h, &mut k4);

    for (j, &i) in problem.states.iter().enumerate() {
        values[i] = x0[j] + h / 6.0 * (k1[j] + 2.0 * k2[j] + 2.0 * k3[j] + k4[j]);
    }
    track(solve_algebraic(problem, values, t + h, criteria)?);

    Ok(SolveStats {
        iterations,
        residual_norm,
    })
}

fn set_stage_states(buf: &mut [f64], states: &[usize], x0: &[f64], k: &[f64], hk: f64) {
    for (j, &i) in states.iter().enumerate() {
        buf[i] = x0[j] + hk * k[j];
    }
}
