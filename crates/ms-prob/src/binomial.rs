//! Clopper–Pearson intervals for coincidence ratios.
//!
//! The measured quantity is `k / n`: three-fold coincidences (`k`, successes)
//! out of two-fold coincidences (`n`, trials). With two-sided tail `q`:
//!
//! ```text
//! lower = Beta⁻¹(q/2;     k,     n - k + 1)
//! upper = Beta⁻¹(1 - q/2; k + 1, n - k)
//! ```
//!
//! Error bars are reported as distances from the supplied `ratio`:
//! `low = ratio - lower`, `high = upper - ratio`. A ratio outside
//! `[lower, upper]` cannot have come from the same counts and is rejected.

use ms_core::{Error, ErrorInterval, Result};

use crate::quantile::beta_quantile;
use crate::tail::TailProbability;

/// Slack for ratios rounded in the source sheet.
const RATIO_TOLERANCE: f64 = 1e-9;

/// Exact `(lower, upper)` bounds on the success probability.
///
/// `k = 0` gives `lower = 0` and `k = n` gives `upper = 1`. Zero trials have
/// no defined interval and return `(NaN, NaN)`.
pub fn clopper_pearson(q: TailProbability, trials: f64, successes: f64) -> Result<(f64, f64)> {
    if !trials.is_finite() || trials < 0.0 {
        return Err(Error::Validation(format!("trials must be finite and >= 0, got {}", trials)));
    }
    if !successes.is_finite() || successes < 0.0 {
        return Err(Error::Validation(format!(
            "successes must be finite and >= 0, got {}",
            successes
        )));
    }
    if successes > trials {
        return Err(Error::MalformedInput(format!(
            "successes ({}) exceed trials ({})",
            successes, trials
        )));
    }
    if trials == 0.0 {
        return Ok((f64::NAN, f64::NAN));
    }

    let half = q.value() / 2.0;
    let lower = beta_quantile(half, successes, trials - successes + 1.0)?;
    let upper = beta_quantile(1.0 - half, successes + 1.0, trials - successes)?;
    Ok((lower, upper))
}

/// Asymmetric error bars for a sequence of coincidence ratios.
///
/// All three sequences must have the same length. Points with zero trials get
/// `NaN` in both rows; callers must filter them before plotting or fitting.
pub fn binomial_ratio_errors(
    q: f64,
    trials: &[f64],
    successes: &[f64],
    ratio: &[f64],
) -> Result<ErrorInterval> {
    let q = TailProbability::new(q)?;
    if trials.len() != successes.len() || trials.len() != ratio.len() {
        return Err(Error::MalformedInput(format!(
            "length mismatch (trials={}, successes={}, ratio={})",
            trials.len(),
            successes.len(),
            ratio.len()
        )));
    }

    let mut low = Vec::with_capacity(trials.len());
    let mut high = Vec::with_capacity(trials.len());
    for (i, ((&n, &k), &p)) in trials.iter().zip(successes).zip(ratio).enumerate() {
        let (lower, upper) = clopper_pearson(q, n, k).map_err(|e| match e {
            Error::MalformedInput(msg) => Error::MalformedInput(format!("row {i}: {msg}")),
            Error::Validation(msg) => Error::Validation(format!("row {i}: {msg}")),
            other => other,
        })?;
        if n == 0.0 {
            tracing::debug!(row = i, "zero trials, error bar undefined");
            low.push(f64::NAN);
            high.push(f64::NAN);
            continue;
        }
        if !p.is_finite() || p < lower - RATIO_TOLERANCE || p > upper + RATIO_TOLERANCE {
            return Err(Error::MalformedInput(format!(
                "row {i}: ratio {} lies outside its interval [{}, {}] for {} / {}",
                p, lower, upper, k, n
            )));
        }
        low.push((p - lower).max(0.0));
        high.push((upper - p).max(0.0));
    }
    ErrorInterval::new(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn symmetric_at_one_half() {
        let e = binomial_ratio_errors(0.3173, &[100.0], &[50.0], &[0.5]).unwrap();
        let (lo, hi) = e.get(0).unwrap();
        assert_abs_diff_eq!(lo, hi, epsilon = 1e-5);
        // Normal approximation gives 0.05; the exact interval is slightly wider.
        assert_abs_diff_eq!(lo, 0.05, epsilon = 0.02);
        assert_abs_diff_eq!(hi, 0.05, epsilon = 0.02);
    }

    #[test]
    fn boundary_ratios() {
        let q = TailProbability::one_sigma_two_sided();
        let (lower, upper) = clopper_pearson(q, 20.0, 0.0).unwrap();
        assert_eq!(lower, 0.0);
        assert!(upper > 0.0 && upper < 1.0);

        let (lower, upper) = clopper_pearson(q, 20.0, 20.0).unwrap();
        assert_eq!(upper, 1.0);
        assert!(lower > 0.0 && lower < 1.0);
    }

    #[test]
    fn half_widths_non_negative_for_consistent_ratio() {
        let trials = [10.0, 40.0, 250.0, 1000.0];
        let successes = [1.0, 31.0, 240.0, 999.0];
        let ratio: Vec<f64> = successes.iter().zip(&trials).map(|(k, n)| k / n).collect();
        let e = binomial_ratio_errors(0.3173, &trials, &successes, &ratio).unwrap();
        for i in 0..trials.len() {
            let (lo, hi) = e.get(i).unwrap();
            assert!(lo >= 0.0 && hi >= 0.0, "i={} lo={} hi={}", i, lo, hi);
        }
    }

    #[test]
    fn zero_trials_is_nan_sentinel() {
        let e = binomial_ratio_errors(0.3173, &[0.0, 10.0], &[0.0, 5.0], &[f64::NAN, 0.5]).unwrap();
        assert!(e.low[0].is_nan() && e.high[0].is_nan());
        assert!(e.low[1].is_finite() && e.high[1].is_finite());
    }

    #[test]
    fn successes_above_trials_is_malformed() {
        let err = binomial_ratio_errors(0.3173, &[10.0, 5.0], &[3.0, 6.0], &[0.3, 1.2]).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn ratio_inconsistent_with_counts_is_malformed() {
        // 40 / 100 has a 1σ interval of roughly [0.35, 0.45].
        let err = binomial_ratio_errors(0.3173, &[100.0], &[40.0], &[0.9]).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(err.to_string().contains("row 0"));

        let err = binomial_ratio_errors(0.3173, &[100.0], &[40.0], &[f64::NAN]).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn rounded_ratio_is_accepted() {
        let e = binomial_ratio_errors(0.3173, &[450.0], &[436.0], &[0.9689]).unwrap();
        let (lo, hi) = e.get(0).unwrap();
        assert!(lo > 0.0 && hi > 0.0);
    }

    #[test]
    fn boundary_ratio_has_zero_half_width() {
        let e = binomial_ratio_errors(0.3173, &[20.0, 20.0], &[0.0, 20.0], &[0.0, 1.0]).unwrap();
        assert_eq!(e.low[0], 0.0);
        assert!(e.high[0] > 0.0);
        assert_eq!(e.high[1], 0.0);
        assert!(e.low[1] > 0.0);
    }

    #[test]
    fn length_mismatch_is_malformed() {
        let err = binomial_ratio_errors(0.3173, &[10.0], &[3.0, 4.0], &[0.3]).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn invalid_q() {
        assert!(matches!(
            binomial_ratio_errors(1.0, &[10.0], &[3.0], &[0.3]),
            Err(Error::Validation(_))
        ));
    }
}
