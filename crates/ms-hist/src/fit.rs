//! Chi-squared curve fits to histogram bins.
//!
//! Each fit minimises `Σ ((y - f(t)) / σ)²` over the bins whose center lies in
//! the fit range. Bins with an undefined value or a non-positive error carry
//! no information and are skipped, which also drops empty bins of raw counts.
//!
//! The cost surface of the oscillating models has one local minimum per
//! trial frequency, so every fit starts from a seed found without iteration:
//!
//! - exponential: weighted straight line through `ln y`
//! - oscillations: a frequency grid (and a decay-rate grid for the damped
//!   model); at each grid point the remaining parameters enter linearly and
//!   are solved exactly, and the best grid point wins
//!
//! The seed is then refined by [`Minimizer`] in coordinates scaled to the seed
//! so that every parameter moves on a unit scale. Parameter errors come from
//! the inverse of `JᵀWJ` at the minimum.

use std::f64::consts::PI;

use ms_core::{Error, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::model::FitModel;
use crate::optimizer::{Minimizer, Objective};

/// Fit window used for the muon lifetime, in ns.
pub const DEFAULT_FIT_RANGE: (f64, f64) = (400.0, 5000.0);

const OMEGA_GRID: usize = 600;
const DECAY_GRID: usize = 30;

/// One fitted parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameter {
    /// Name from [`FitModel::parameter_names`].
    pub name: String,
    /// Best-fit value.
    pub value: f64,
    /// Standard error.
    pub error: f64,
}

/// Result of [`fit_curve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFit {
    /// Fitted shape.
    pub model: FitModel,
    /// Parameters in model order.
    pub parameters: Vec<FitParameter>,
    /// χ² at the minimum.
    pub chi2: f64,
    /// Degrees of freedom (`n_points - n_params`).
    pub ndf: usize,
    /// Number of bins used.
    pub n_points: usize,
    /// Fit window `[lo, hi]`.
    pub range: (f64, f64),
    /// Whether the minimizer reported convergence.
    pub converged: bool,
}

impl CurveFit {
    /// Parameter values in model order.
    pub fn values(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.value).collect()
    }

    /// Evaluate the fitted curve.
    pub fn eval(&self, t: f64) -> f64 {
        self.model.eval(&self.values(), t)
    }

    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&FitParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Decay lifetime and its error, for the models that carry one.
    pub fn lifetime(&self) -> Option<(f64, f64)> {
        match self.model {
            FitModel::Exponential => self.parameter("lifetime").map(|p| (p.value, p.error)),
            FitModel::DecayOscillation => self
                .parameter("decay_rate")
                .filter(|p| p.value > 0.0)
                .map(|p| (1.0 / p.value, p.error / (p.value * p.value))),
            FitModel::Oscillation => None,
        }
    }
}

/// Exponential decay fit, `N0 · exp(-t / τ)`.
pub fn fit_lifetime(points: &[(f64, f64, f64)], range: (f64, f64)) -> Result<CurveFit> {
    fit_curve(FitModel::Exponential, points, range)
}

/// Fit `model` to `(t, y, σ)` points inside `range`.
pub fn fit_curve(
    model: FitModel,
    points: &[(f64, f64, f64)],
    range: (f64, f64),
) -> Result<CurveFit> {
    let used = select_points(points, range)?;
    let n_params = model.n_params();
    if used.len() <= n_params {
        return Err(Error::Computation(format!(
            "{} fit needs more than {} usable bins in [{}, {}], got {}",
            model,
            n_params,
            range.0,
            range.1,
            used.len()
        )));
    }

    let data = DataScale::of(&used);
    let seed = match model {
        FitModel::Exponential => seed_exponential(&used)?,
        FitModel::DecayOscillation => seed_decay_oscillation(&used, &data)?,
        FitModel::Oscillation => seed_oscillation(&used, &data)?,
    };
    let bounds = bounds_around(model, &seed, &data);
    let scale = unit_scale(model, &seed, &data);

    let objective = ChiSquare { model, points: &used, scale: &scale };
    let start: Vec<f64> = seed.iter().zip(&scale).map(|(v, s)| v / s).collect();
    let scaled_bounds: Vec<(f64, f64)> =
        bounds.iter().zip(&scale).map(|(&(lo, hi), s)| (lo / s, hi / s)).collect();
    let min = Minimizer::default().minimize(&objective, &start, &scaled_bounds)?;
    if !min.converged {
        tracing::warn!(%model, status = %min.status, "curve fit did not converge");
    }

    let mut best: Vec<f64> = min.x.iter().zip(&scale).map(|(u, s)| u * s).collect();
    if model == FitModel::Oscillation {
        best[3] = wrap_phase(best[3]);
    }
    let errors = parameter_errors(model, &used, &best)?;
    let chi2 = chi_square(model, &used, &best);

    let fit = CurveFit {
        model,
        parameters: model
            .parameter_names()
            .iter()
            .zip(best.iter().zip(&errors))
            .map(|(name, (&value, &error))| FitParameter { name: name.to_string(), value, error })
            .collect(),
        chi2,
        ndf: used.len() - n_params,
        n_points: used.len(),
        range,
        converged: min.converged,
    };
    tracing::info!(
        %model,
        chi2 = fit.chi2,
        ndf = fit.ndf,
        iterations = min.n_iter,
        params = ?fit.values(),
        "curve fit"
    );
    Ok(fit)
}

fn select_points(points: &[(f64, f64, f64)], range: (f64, f64)) -> Result<Vec<(f64, f64, f64)>> {
    let (lo, hi) = range;
    if !lo.is_finite() || !hi.is_finite() || hi <= lo {
        return Err(Error::Validation(format!("invalid fit range [{}, {}]", lo, hi)));
    }
    let in_range = |t: f64| t >= lo && t <= hi;
    let skipped_nan = points.iter().filter(|(t, y, _)| in_range(*t) && y.is_nan()).count();
    if skipped_nan > 0 {
        tracing::warn!(skipped_nan, "skipping undefined bins in fit");
    }
    Ok(points
        .iter()
        .copied()
        .filter(|&(t, y, s)| in_range(t) && y.is_finite() && s.is_finite() && s > 0.0)
        .collect())
}

fn chi_square(model: FitModel, points: &[(f64, f64, f64)], p: &[f64]) -> f64 {
    points
        .iter()
        .map(|&(t, y, s)| {
            let r = (y - model.eval(p, t)) / s;
            r * r
        })
        .sum()
}

/// χ² in seed-scaled coordinates: `p_i = u_i · scale_i`.
struct ChiSquare<'a> {
    model: FitModel,
    points: &'a [(f64, f64, f64)],
    scale: &'a [f64],
}

impl ChiSquare<'_> {
    fn unscale(&self, u: &[f64]) -> Vec<f64> {
        u.iter().zip(self.scale).map(|(u, s)| u * s).collect()
    }
}

impl Objective for ChiSquare<'_> {
    fn value(&self, u: &[f64]) -> Result<f64> {
        let v = chi_square(self.model, self.points, &self.unscale(u));
        if v.is_nan() {
            return Err(Error::Computation(format!("{} χ² is NaN at {:?}", self.model, u)));
        }
        Ok(v)
    }

    fn gradient(&self, u: &[f64]) -> Result<Vec<f64>> {
        let p = self.unscale(u);
        let mut jac = vec![0.0; p.len()];
        let mut grad = vec![0.0; p.len()];
        for &(t, y, s) in self.points {
            self.model.jacobian(&p, t, &mut jac);
            let w = -2.0 * (y - self.model.eval(&p, t)) / (s * s);
            for (g, (j, sc)) in grad.iter_mut().zip(jac.iter().zip(self.scale)) {
                *g += w * j * sc;
            }
        }
        Ok(grad)
    }
}

/// Characteristic sizes of the data, used to pick grids, bounds, and scales.
struct DataScale {
    span: f64,
    spacing: f64,
    y_max: f64,
}

impl DataScale {
    fn of(points: &[(f64, f64, f64)]) -> Self {
        let mut t: Vec<f64> = points.iter().map(|p| p.0).collect();
        t.sort_by(f64::total_cmp);
        let span = (t[t.len() - 1] - t[0]).max(f64::MIN_POSITIVE);
        let spacing = t
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|d| *d > 0.0)
            .fold(f64::INFINITY, f64::min);
        let spacing = if spacing.is_finite() { spacing } else { span };
        let y_max = points.iter().map(|p| p.1.abs()).fold(0.0, f64::max).max(f64::MIN_POSITIVE);
        Self { span, spacing, y_max }
    }

    /// Lowest frequency with a quarter period inside the data up to Nyquist.
    fn omega_grid(&self) -> Vec<f64> {
        log_grid(PI / (2.0 * self.span), PI / self.spacing, OMEGA_GRID)
    }

    fn omega_max(&self) -> f64 {
        2.0 * PI / self.spacing
    }
}

fn log_grid(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let (a, b) = (lo.ln(), hi.ln());
    (0..n).map(|i| (a + (b - a) * i as f64 / (n - 1) as f64).exp()).collect()
}

fn seed_exponential(points: &[(f64, f64, f64)]) -> Result<Vec<f64>> {
    // Var(ln y) ≈ (σ / y)²
    let (mut s, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let mut n = 0;
    for &(t, y, sigma) in points.iter().filter(|p| p.1 > 0.0) {
        let w = (y / sigma).powi(2);
        let ly = y.ln();
        s += w;
        sx += w * t;
        sy += w * ly;
        sxx += w * t * t;
        sxy += w * t * ly;
        n += 1;
    }
    let det = s * sxx - sx * sx;
    if n < 2 || det <= 0.0 {
        return Err(Error::Computation(
            "exponential fit needs at least 2 positive bins at distinct times".to_string(),
        ));
    }
    let slope = (s * sxy - sx * sy) / det;
    if !(slope < 0.0) {
        return Err(Error::Computation(format!(
            "counts do not decay over the fit range (slope={})",
            slope
        )));
    }
    let intercept = (sxx * sy - sx * sxy) / det;
    Ok(vec![intercept.exp(), -1.0 / slope])
}

/// Weighted linear least squares for `y ≈ Σ_k c_k · basis_k(t)`.
/// Returns the coefficients and the χ², or `None` when the basis is degenerate.
fn solve_linear<const K: usize>(
    points: &[(f64, f64, f64)],
    basis: impl Fn(f64) -> [f64; K],
) -> Option<([f64; K], f64)> {
    let mut ata = DMatrix::<f64>::zeros(K, K);
    let mut atb = DVector::<f64>::zeros(K);
    for &(t, y, s) in points {
        let b = basis(t);
        let w = 1.0 / (s * s);
        for i in 0..K {
            atb[i] += w * b[i] * y;
            for j in 0..K {
                ata[(i, j)] += w * b[i] * b[j];
            }
        }
    }
    let coef = ata.cholesky()?.solve(&atb);
    let mut c = [0.0; K];
    c.copy_from_slice(coef.as_slice());
    let chi2 = points
        .iter()
        .map(|&(t, y, s)| {
            let b = basis(t);
            let f: f64 = b.iter().zip(&c).map(|(b, c)| b * c).sum();
            ((y - f) / s).powi(2)
        })
        .sum::<f64>();
    chi2.is_finite().then_some((c, chi2))
}

fn seed_oscillation(points: &[(f64, f64, f64)], data: &DataScale) -> Result<Vec<f64>> {
    let mut best: Option<(f64, Vec<f64>)> = None;
    for omega in data.omega_grid() {
        let Some(([c, alpha, beta], chi2)) =
            solve_linear(points, |t| [1.0, (omega * t).cos(), (omega * t).sin()])
        else {
            continue;
        };
        if best.as_ref().is_none_or(|(b, _)| chi2 < *b) {
            // A·cos(ωt + φ) = A cosφ · cos ωt − A sinφ · sin ωt
            let amplitude = alpha.hypot(beta);
            let phase = (-beta).atan2(alpha);
            best = Some((chi2, vec![c, amplitude, omega, phase]));
        }
    }
    best.map(|(_, p)| p)
        .ok_or_else(|| Error::Computation("no frequency in the scan gave a usable seed".to_string()))
}

fn seed_decay_oscillation(points: &[(f64, f64, f64)], data: &DataScale) -> Result<Vec<f64>> {
    let mut rates = vec![0.0];
    rates.extend(log_grid(0.05 / data.span, 20.0 / data.span, DECAY_GRID));
    let omegas = data.omega_grid();

    let mut best: Option<(f64, Vec<f64>)> = None;
    for &lambda in &rates {
        for &omega in &omegas {
            let basis = |t: f64| {
                let e = (-lambda * t).exp();
                [e, e * (omega * t).cos()]
            };
            let Some(([a, b], chi2)) = solve_linear(points, basis) else {
                continue;
            };
            if best.as_ref().is_none_or(|(c, _)| chi2 < *c) {
                // b < 0 is the same curve shifted by half a period; keep ω and let b carry the sign.
                best = Some((chi2, vec![lambda, a, b, omega]));
            }
        }
    }
    best.map(|(_, p)| p)
        .ok_or_else(|| Error::Computation("no (λ, ω) in the scan gave a usable seed".to_string()))
}

fn bounds_around(model: FitModel, seed: &[f64], data: &DataScale) -> Vec<(f64, f64)> {
    let wide = 1e3 * data.y_max;
    match model {
        FitModel::Exponential => {
            vec![(0.0, 1e3 * seed[0].max(data.y_max)), (seed[1] / 100.0, seed[1] * 100.0)]
        }
        FitModel::DecayOscillation => vec![
            (0.0, (100.0 / data.span).max(10.0 * seed[0])),
            (-wide, wide),
            (-wide, wide),
            (0.0, data.omega_max()),
        ],
        FitModel::Oscillation => vec![
            (-wide, wide),
            (0.0, wide),
            (0.0, data.omega_max()),
            (seed[3] - 2.0 * PI, seed[3] + 2.0 * PI),
        ],
    }
}

/// Per-parameter unit: the seed magnitude, or a data-derived size when the
/// seed sits at zero.
fn unit_scale(model: FitModel, seed: &[f64], data: &DataScale) -> Vec<f64> {
    let rate = 1.0 / data.span;
    let fallback: &[f64] = match model {
        FitModel::Exponential => &[data.y_max, data.span],
        FitModel::DecayOscillation => &[rate, data.y_max, data.y_max, rate],
        FitModel::Oscillation => &[data.y_max, data.y_max, rate, 1.0],
    };
    seed.iter()
        .zip(fallback)
        .map(|(&v, &f)| if v.abs() > 1e-3 * f { v.abs() } else { f })
        .collect()
}

fn wrap_phase(phi: f64) -> f64 {
    let wrapped = (phi + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI { wrapped + 2.0 * PI } else { wrapped }
}

fn parameter_errors(model: FitModel, points: &[(f64, f64, f64)], p: &[f64]) -> Result<Vec<f64>> {
    let k = p.len();
    let mut jac = vec![0.0; k];
    let mut info = DMatrix::<f64>::zeros(k, k);
    for &(t, _, s) in points {
        model.jacobian(p, t, &mut jac);
        let w = 1.0 / (s * s);
        for i in 0..k {
            for j in 0..k {
                info[(i, j)] += w * jac[i] * jac[j];
            }
        }
    }
    let cov = info.try_inverse().ok_or_else(|| {
        Error::Computation(format!("{} fit covariance is singular at {:?}", model, p))
    })?;
    Ok((0..k).map(|i| cov[(i, i)].max(0.0).sqrt()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(model: FitModel, p: &[f64], centers: &[f64], sigma: impl Fn(f64) -> f64) -> Vec<(f64, f64, f64)> {
        centers
            .iter()
            .map(|&t| {
                let y = model.eval(p, t);
                (t, y, sigma(y))
            })
            .collect()
    }

    fn centers(n: usize, width: f64) -> Vec<f64> {
        (0..n).map(|i| width * (i as f64 + 0.5)).collect()
    }

    #[test]
    fn recovers_exact_exponential() {
        let pts = sample(FitModel::Exponential, &[1000.0, 2197.0], &centers(50, 100.0), f64::sqrt);
        let fit = fit_lifetime(&pts, DEFAULT_FIT_RANGE).unwrap();
        let (tau, tau_err) = fit.lifetime().unwrap();
        assert_relative_eq!(tau, 2197.0, max_relative = 1e-6);
        assert_relative_eq!(fit.values()[0], 1000.0, max_relative = 1e-6);
        assert!(tau_err > 0.0 && tau_err.is_finite());
        assert!(fit.chi2 < 1e-8);
        assert_eq!(fit.n_points, 46); // centers 450..4950
        assert_eq!(fit.ndf, 44);
        assert_relative_eq!(fit.eval(0.0), 1000.0, max_relative = 1e-6);
    }

    #[test]
    fn scattered_exponential_stays_close() {
        let mut pts = sample(FitModel::Exponential, &[800.0, 2200.0], &centers(50, 100.0), f64::sqrt);
        for (i, p) in pts.iter_mut().enumerate() {
            p.1 *= 1.0 + 0.03 * (1.7 * i as f64).sin();
        }
        let fit = fit_lifetime(&pts, DEFAULT_FIT_RANGE).unwrap();
        let (tau, _) = fit.lifetime().unwrap();
        assert_relative_eq!(tau, 2200.0, max_relative = 0.05);
        assert!(fit.chi2 > 0.0);
    }

    #[test]
    fn skips_undefined_and_errorless_bins() {
        let mut pts = sample(FitModel::Exponential, &[500.0, 1000.0], &[500.0, 700.0, 900.0, 1100.0, 1300.0], f64::sqrt);
        pts.push((1500.0, f64::NAN, f64::NAN));
        pts.push((1700.0, 0.0, 0.0));
        let fit = fit_lifetime(&pts, DEFAULT_FIT_RANGE).unwrap();
        assert_eq!(fit.n_points, 5);
        assert_relative_eq!(fit.lifetime().unwrap().0, 1000.0, max_relative = 1e-6);
    }

    #[test]
    fn recovers_oscillation() {
        let truth = [0.05, 0.2, 2.0 * PI / 300.0, 0.4];
        let pts = sample(FitModel::Oscillation, &truth, &centers(70, 20.0), |_| 0.02);
        let fit = fit_curve(FitModel::Oscillation, &pts, (0.0, 1400.0)).unwrap();
        let v = fit.values();
        assert_relative_eq!(v[0], truth[0], epsilon = 1e-5);
        assert_relative_eq!(v[1], truth[1], epsilon = 1e-5);
        assert_relative_eq!(v[2], truth[2], max_relative = 1e-5);
        assert_relative_eq!(v[3], truth[3], epsilon = 1e-4);
        assert!(fit.chi2 < 1e-6);
        assert_eq!(fit.ndf, 66);
        assert!(fit.lifetime().is_none());
        assert!(fit.parameters.iter().all(|p| p.error > 0.0 && p.error.is_finite()));
    }

    #[test]
    fn recovers_decay_oscillation() {
        let truth = [1.0 / 2200.0, 100.0, 30.0, 2.0 * PI / 400.0];
        let pts = sample(FitModel::DecayOscillation, &truth, &centers(60, 50.0), |y| y.abs().sqrt() + 1.0);
        let fit = fit_curve(FitModel::DecayOscillation, &pts, (0.0, 3000.0)).unwrap();
        let v = fit.values();
        assert_relative_eq!(v[0], truth[0], max_relative = 1e-4);
        assert_relative_eq!(v[1], truth[1], max_relative = 1e-4);
        assert_relative_eq!(v[2], truth[2], max_relative = 1e-4);
        assert_relative_eq!(v[3], truth[3], max_relative = 1e-5);
        let (tau, tau_err) = fit.lifetime().unwrap();
        assert_relative_eq!(tau, 2200.0, max_relative = 1e-4);
        assert!(tau_err > 0.0);
    }

    #[test]
    fn too_few_points() {
        let pts = sample(FitModel::Exponential, &[500.0, 1000.0], &[500.0, 700.0], f64::sqrt);
        assert!(matches!(fit_lifetime(&pts, DEFAULT_FIT_RANGE), Err(Error::Computation(_))));
        let pts = sample(FitModel::Oscillation, &[0.0, 1.0, 0.1, 0.0], &centers(4, 10.0), |_| 0.1);
        assert!(matches!(fit_curve(FitModel::Oscillation, &pts, (0.0, 40.0)), Err(Error::Computation(_))));
    }

    #[test]
    fn rising_counts_rejected() {
        let pts = vec![(500.0, 10.0, 3.0), (600.0, 20.0, 4.0), (700.0, 40.0, 6.0)];
        assert!(fit_lifetime(&pts, DEFAULT_FIT_RANGE).is_err());
    }

    #[test]
    fn invalid_range() {
        assert!(fit_lifetime(&[], (10.0, 5.0)).is_err());
    }

    #[test]
    fn phase_wraps_into_half_open_interval() {
        assert_relative_eq!(wrap_phase(0.4 + 2.0 * PI), 0.4, epsilon = 1e-12);
        assert_relative_eq!(wrap_phase(-0.4 - 4.0 * PI), -0.4, epsilon = 1e-12);
        assert_relative_eq!(wrap_phase(-PI), PI, epsilon = 1e-12);
    }
}
