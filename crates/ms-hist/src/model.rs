//! Curve shapes fitted to timing histograms.

use serde::{Deserialize, Serialize};

/// Fit model, one per kind of histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitModel {
    /// `N0 · exp(-t / τ)`: decay curve of the raw up, down, or summed counts.
    Exponential,
    /// `exp(-λ t) · (a + b · cos(ω t))`: spin precession riding on the decay,
    /// seen in the up − down difference.
    DecayOscillation,
    /// `c + A · cos(ω t + φ)`: precession in the (up − down) / (up + down)
    /// asymmetry, where the decay cancels.
    Oscillation,
}

impl FitModel {
    /// Parameter names in the order used by [`FitModel::eval`].
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            FitModel::Exponential => &["amplitude", "lifetime"],
            FitModel::DecayOscillation => &["decay_rate", "offset", "amplitude", "angular_frequency"],
            FitModel::Oscillation => &["offset", "amplitude", "angular_frequency", "phase"],
        }
    }

    /// Number of free parameters.
    pub fn n_params(self) -> usize {
        self.parameter_names().len()
    }

    /// Display formula.
    pub fn formula(self) -> &'static str {
        match self {
            FitModel::Exponential => "N0·exp(-t/τ)",
            FitModel::DecayOscillation => "exp(-λt)·(a + b·cos(ωt))",
            FitModel::Oscillation => "c + A·cos(ωt + φ)",
        }
    }

    /// Model value at `t`. `p` must hold [`FitModel::n_params`] values.
    pub fn eval(self, p: &[f64], t: f64) -> f64 {
        match self {
            FitModel::Exponential => p[0] * (-t / p[1]).exp(),
            FitModel::DecayOscillation => (-p[0] * t).exp() * (p[1] + p[2] * (p[3] * t).cos()),
            FitModel::Oscillation => p[0] + p[1] * (p[2] * t + p[3]).cos(),
        }
    }

    /// Partial derivatives of the model with respect to each parameter at `t`.
    pub fn jacobian(self, p: &[f64], t: f64, out: &mut [f64]) {
        match self {
            FitModel::Exponential => {
                let e = (-t / p[1]).exp();
                out[0] = e;
                out[1] = p[0] * e * t / (p[1] * p[1]);
            }
            FitModel::DecayOscillation => {
                let e = (-p[0] * t).exp();
                let (s, c) = (p[3] * t).sin_cos();
                out[0] = -t * e * (p[1] + p[2] * c);
                out[1] = e;
                out[2] = e * c;
                out[3] = -e * p[2] * t * s;
            }
            FitModel::Oscillation => {
                let (s, c) = (p[2] * t + p[3]).sin_cos();
                out[0] = 1.0;
                out[1] = c;
                out[2] = -p[1] * t * s;
                out[3] = -p[1] * s;
            }
        }
    }
}

impl std::fmt::Display for FitModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FitModel::Exponential => "exponential",
            FitModel::DecayOscillation => "decay_oscillation",
            FitModel::Oscillation => "oscillation",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn jacobian_matches_finite_differences() {
        let cases: [(FitModel, &[f64]); 3] = [
            (FitModel::Exponential, &[120.0, 2200.0]),
            (FitModel::DecayOscillation, &[4.5e-4, 80.0, 25.0, 0.015]),
            (FitModel::Oscillation, &[0.05, 0.2, 0.02, 0.7]),
        ];
        for (model, p) in cases {
            let mut jac = vec![0.0; model.n_params()];
            for t in [10.0, 350.0, 1200.0] {
                model.jacobian(p, t, &mut jac);
                for i in 0..p.len() {
                    let h = 1e-6 * p[i].abs();
                    let mut hi = p.to_vec();
                    let mut lo = p.to_vec();
                    hi[i] += h;
                    lo[i] -= h;
                    let numeric = (model.eval(&hi, t) - model.eval(&lo, t)) / (2.0 * h);
                    assert_relative_eq!(jac[i], numeric, epsilon = 1e-6, max_relative = 1e-5);
                }
            }
        }
    }

    #[test]
    fn names_match_arity() {
        assert_eq!(FitModel::Exponential.n_params(), 2);
        assert_eq!(FitModel::DecayOscillation.n_params(), 4);
        assert_eq!(FitModel::Oscillation.parameter_names()[3], "phase");
        assert_eq!(FitModel::DecayOscillation.to_string(), "decay_oscillation");
    }
}
