//! Box-constrained L-BFGS minimisation on top of argmin.
//!
//! Bounds are enforced by clamping every trial point and zeroing gradient
//! components that push past an active bound.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use ms_core::{Error, Result};

/// Stopping rules for [`Minimizer`].
#[derive(Debug, Clone, Copy)]
pub struct MinimizerConfig {
    /// Iteration cap.
    pub max_iter: u64,
    /// Gradient-norm tolerance.
    pub tol: f64,
    /// L-BFGS history depth.
    pub history: usize,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        Self { max_iter: 500, tol: 1e-8, history: 8 }
    }
}

/// Best point found by [`Minimizer::minimize`].
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Argument of the minimum (inside the bounds).
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Iterations used.
    pub n_iter: u64,
    /// Objective evaluations.
    pub n_eval: usize,
    /// Whether the solver reported convergence rather than hitting a cap.
    pub converged: bool,
    /// argmin termination status.
    pub status: String,
}

/// Scalar objective with an optional analytic gradient.
pub trait Objective: Send + Sync {
    /// Objective value.
    fn value(&self, x: &[f64]) -> Result<f64>;

    /// Gradient; central differences unless overridden.
    fn gradient(&self, x: &[f64]) -> Result<Vec<f64>> {
        let mut grad = Vec::with_capacity(x.len());
        let mut shifted = x.to_vec();
        for i in 0..x.len() {
            let h = 1e-7 * x[i].abs().max(1.0);
            shifted[i] = x[i] + h;
            let up = self.value(&shifted)?;
            shifted[i] = x[i] - h;
            let down = self.value(&shifted)?;
            shifted[i] = x[i];
            grad.push((up - down) / (2.0 * h));
        }
        Ok(grad)
    }
}

fn clamp(x: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    x.iter().zip(bounds).map(|(&v, &(lo, hi))| v.clamp(lo, hi)).collect()
}

struct Problem<'a> {
    objective: &'a dyn Objective,
    bounds: &'a [(f64, f64)],
    evals: Arc<AtomicUsize>,
}

impl CostFunction for Problem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
        self.evals.fetch_add(1, Ordering::Relaxed);
        self.objective
            .value(&clamp(x, self.bounds))
            .map_err(|e| argmin::core::Error::msg(e.to_string()))
    }
}

impl Gradient for Problem<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, x: &Self::Param) -> std::result::Result<Vec<f64>, argmin::core::Error> {
        let x = clamp(x, self.bounds);
        let mut g =
            self.objective.gradient(&x).map_err(|e| argmin::core::Error::msg(e.to_string()))?;
        for (gi, (&xi, &(lo, hi))) in g.iter_mut().zip(x.iter().zip(self.bounds)) {
            if (xi <= lo && *gi > 0.0) || (xi >= hi && *gi < 0.0) {
                *gi = 0.0;
            }
        }
        Ok(g)
    }
}

/// L-BFGS with a Moré–Thuente line search and box constraints.
#[derive(Debug, Clone, Default)]
pub struct Minimizer {
    config: MinimizerConfig,
}

impl Minimizer {
    /// Minimizer with explicit stopping rules.
    pub fn new(config: MinimizerConfig) -> Self {
        Self { config }
    }

    /// Minimise `objective` from `start`, keeping each coordinate in `bounds`.
    pub fn minimize(
        &self,
        objective: &dyn Objective,
        start: &[f64],
        bounds: &[(f64, f64)],
    ) -> Result<Minimum> {
        if start.len() != bounds.len() {
            return Err(Error::Validation(format!(
                "{} start values for {} bounds",
                start.len(),
                bounds.len()
            )));
        }
        if let Some((i, _)) = bounds.iter().enumerate().find(|(_, (lo, hi))| !(lo <= hi)) {
            return Err(Error::Validation(format!("empty bound for parameter {i}")));
        }

        // The line search needs a descent direction; a stationary start is already the answer.
        let start = clamp(start, bounds);
        let g0 = objective.gradient(&start)?;
        if g0.iter().map(|g| g * g).sum::<f64>().sqrt() <= self.config.tol {
            return Ok(Minimum {
                value: objective.value(&start)?,
                x: start,
                n_iter: 0,
                n_eval: 1,
                converged: true,
                status: "stationary start".to_string(),
            });
        }

        let evals = Arc::new(AtomicUsize::new(0));
        let problem = Problem { objective, bounds, evals: evals.clone() };
        let solver = LBFGS::new(MoreThuenteLineSearch::new(), self.config.history)
            .with_tolerance_grad(self.config.tol)
            .and_then(|s| s.with_tolerance_cost((0.1 * self.config.tol).max(1e-14)))
            .map_err(|e| Error::Validation(format!("minimizer tolerance: {e}")))?;

        let res = match Executor::new(problem, solver)
            .configure(|state| state.param(start.clone()).max_iters(self.config.max_iter))
            .run()
        {
            Ok(res) => res,
            Err(e) => {
                // The line search gives up when it cannot resolve a descent step in f64.
                tracing::debug!(error = %e, "L-BFGS stopped early");
                return Ok(Minimum {
                    value: objective.value(&start)?,
                    x: start,
                    n_iter: 0,
                    n_eval: evals.load(Ordering::Relaxed),
                    converged: false,
                    status: format!("aborted: {e}"),
                });
            }
        };

        let state = res.state();
        let best = state
            .get_best_param()
            .ok_or_else(|| Error::Computation("minimizer produced no parameters".to_string()))?;
        let status = state.get_termination_status();
        let converged = matches!(
            status,
            TerminationStatus::Terminated(
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            )
        );
        Ok(Minimum {
            x: clamp(best, bounds),
            value: state.get_best_cost(),
            n_iter: state.get_iter(),
            n_eval: evals.load(Ordering::Relaxed),
            converged,
            status: status.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // (x - 2)^2 + 10 (y + 1)^2
    struct Bowl;

    impl Objective for Bowl {
        fn value(&self, x: &[f64]) -> Result<f64> {
            Ok((x[0] - 2.0).powi(2) + 10.0 * (x[1] + 1.0).powi(2))
        }

        fn gradient(&self, x: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![2.0 * (x[0] - 2.0), 20.0 * (x[1] + 1.0)])
        }
    }

    // Same bowl with the default numerical gradient.
    struct NumericBowl;

    impl Objective for NumericBowl {
        fn value(&self, x: &[f64]) -> Result<f64> {
            Bowl.value(x)
        }
    }

    #[test]
    fn finds_interior_minimum() {
        let m = Minimizer::default().minimize(&Bowl, &[0.0, 0.0], &[(-5.0, 5.0); 2]).unwrap();
        assert!(m.converged, "{}", m.status);
        assert_relative_eq!(m.x[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(m.x[1], -1.0, epsilon = 1e-5);
        assert!(m.value < 1e-9);
    }

    #[test]
    fn numerical_gradient_matches() {
        let g = NumericBowl.gradient(&[1.0, 0.5]).unwrap();
        assert_relative_eq!(g[0], -2.0, epsilon = 1e-5);
        assert_relative_eq!(g[1], 30.0, epsilon = 1e-4);
        let m = Minimizer::default().minimize(&NumericBowl, &[4.0, 3.0], &[(-5.0, 5.0); 2]).unwrap();
        assert_relative_eq!(m.x[0], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn stops_at_active_bound() {
        let m = Minimizer::default().minimize(&Bowl, &[4.0, 1.0], &[(3.0, 5.0), (0.0, 2.0)]).unwrap();
        assert_relative_eq!(m.x[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(m.x[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(m.value, 11.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_mismatched_bounds() {
        let err = Minimizer::default().minimize(&Bowl, &[0.0], &[(-1.0, 1.0); 2]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = Minimizer::default().minimize(&Bowl, &[0.0, 0.0], &[(1.0, -1.0); 2]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
