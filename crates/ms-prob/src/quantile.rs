//! Inverse CDFs with explicit behaviour at degenerate shape parameters.
//!
//! `statrs` rejects zero degrees of freedom and zero Beta shapes. Those cases
//! arise naturally for empty bins (`r = 0`) and for ratios at the boundary
//! (`k = 0` or `k = n`), so they are resolved here to the limiting point mass.
//!
//! The statrs chi-squared inverse loses its Newton step for very large degrees
//! of freedom and returns NaN (from df ≈ 2.7e5). A non-finite result falls
//! back to bisection on the CDF, and a quantile that is still not finite is a
//! [`Error::Computation`].

use ms_core::{Error, Result};
use statrs::distribution::{Beta, ChiSquared, ContinuousCDF};

fn check_p(p: f64) -> Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(Error::Validation(format!("p must be finite and in [0,1], got {}", p)));
    }
    Ok(())
}

/// Chi-squared quantile `Q(p; df)`.
///
/// `df = 0` is the point mass at zero and returns `0.0` for every `p`.
/// `p = 1` returns `+∞`.
pub fn chi2_quantile(p: f64, df: f64) -> Result<f64> {
    check_p(p)?;
    if !df.is_finite() || df < 0.0 {
        return Err(Error::Validation(format!("df must be finite and >= 0, got {}", df)));
    }
    if df == 0.0 || p == 0.0 {
        return Ok(0.0);
    }
    if p == 1.0 {
        return Ok(f64::INFINITY);
    }
    let dist = ChiSquared::new(df).map_err(|e| Error::Computation(e.to_string()))?;
    let x = dist.inverse_cdf(p);
    if x.is_finite() {
        return Ok(x);
    }
    tracing::debug!(p, df, "chi-squared inverse not finite, bisecting the CDF");
    bisect_cdf(&dist, p, df)
}

const BISECT_MAX_ITERS: usize = 400;

/// Invert `dist.cdf` by bisection, bracketing around the mean `df` in units
/// of the standard deviation `sqrt(2 df)`.
fn bisect_cdf(dist: &ChiSquared, p: f64, df: f64) -> Result<f64> {
    let width = 40.0 * (2.0 * df).sqrt() + 40.0;
    let mut lo = (df - width).max(0.0);
    let mut hi = df + width;

    let cdf = |x: f64| -> Result<f64> {
        let c = dist.cdf(x);
        if c.is_nan() {
            return Err(Error::Computation(format!(
                "chi-squared CDF is NaN at x={} (df={})",
                x, df
            )));
        }
        Ok(c)
    };

    while cdf(lo)? > p {
        lo /= 2.0;
    }
    let mut expansions = 0;
    while cdf(hi)? < p {
        hi *= 2.0;
        expansions += 1;
        if expansions > 64 || !hi.is_finite() {
            return Err(Error::Computation(format!(
                "cannot bracket chi-squared quantile p={} df={}",
                p, df
            )));
        }
    }

    for _ in 0..BISECT_MAX_ITERS {
        let mid = 0.5 * (lo + hi);
        if cdf(mid)? >= p {
            hi = mid;
        } else {
            lo = mid;
        }
        if hi - lo <= 1e-12 * hi.max(1.0) {
            break;
        }
    }
    let x = 0.5 * (lo + hi);
    if !x.is_finite() {
        return Err(Error::Computation(format!(
            "chi-squared quantile not finite for p={} df={}",
            p, df
        )));
    }
    Ok(x)
}

/// Beta quantile `Beta⁻¹(p; a, b)`.
///
/// `a = 0` collapses to the point mass at 0, `b = 0` to the point mass at 1.
pub fn beta_quantile(p: f64, a: f64, b: f64) -> Result<f64> {
    check_p(p)?;
    if !a.is_finite() || a < 0.0 {
        return Err(Error::Validation(format!("a must be finite and >= 0, got {}", a)));
    }
    if !b.is_finite() || b < 0.0 {
        return Err(Error::Validation(format!("b must be finite and >= 0, got {}", b)));
    }
    match (a == 0.0, b == 0.0) {
        (true, true) => Err(Error::Validation("a and b cannot both be 0".to_string())),
        (true, false) => Ok(0.0),
        (false, true) => Ok(1.0),
        (false, false) => {
            let dist = Beta::new(a, b).map_err(|e| Error::Computation(e.to_string()))?;
            Ok(dist.inverse_cdf(p))
        }
    }
}
