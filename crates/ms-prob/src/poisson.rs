//! Chi-squared confidence intervals for Poisson counts.
//!
//! For an observed count (or rate) `r` and tail probability `q`:
//!
//! ```text
//! low  = | r - Q(q;     2r)     / 2 |
//! high = | r - Q(1 - q; 2r + 1) / 2 |
//! ```
//!
//! where `Q(p; df)` is the chi-squared quantile. The absolute value keeps both
//! half-widths non-negative and is part of the contract.

use ms_core::{Error, ErrorInterval, Result};

use crate::quantile::chi2_quantile;
use crate::tail::TailProbability;

/// `(low, high)` half-widths for a single count.
///
/// At `r = 0` the lower quantile has zero degrees of freedom and evaluates to
/// zero, so `low = 0`.
pub fn count_interval(q: TailProbability, r: f64) -> Result<(f64, f64)> {
    if !r.is_finite() || r < 0.0 {
        return Err(Error::Validation(format!("count must be finite and >= 0, got {}", r)));
    }
    let q = q.value();
    let lo_q = chi2_quantile(q, 2.0 * r)?;
    let hi_q = chi2_quantile(1.0 - q, 2.0 * r + 1.0)?;
    Ok(((r - lo_q / 2.0).abs(), (r - hi_q / 2.0).abs()))
}

/// Asymmetric error bars for a sequence of counts.
///
/// Returns a 2×N [`ErrorInterval`] (row 0 = low, row 1 = high).
pub fn poisson_count_errors(q: f64, rate: &[f64]) -> Result<ErrorInterval> {
    let q = TailProbability::new(q)?;
    if rate.is_empty() {
        return Err(Error::Validation("rate must contain at least one value".to_string()));
    }

    let mut low = Vec::with_capacity(rate.len());
    let mut high = Vec::with_capacity(rate.len());
    for (i, &r) in rate.iter().enumerate() {
        let (lo, hi) = count_interval(q, r).map_err(|e| match e {
            Error::Validation(msg) => Error::Validation(format!("rate[{i}]: {msg}")),
            other => other,
        })?;
        low.push(lo);
        high.push(hi);
    }
    tracing::trace!(n = rate.len(), q = q.value(), "poisson count errors");
    ErrorInterval::new(low, high)
}
