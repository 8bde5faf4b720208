//! Tail probability `q` used by the interval helpers.

use ms_core::{Error, Result};

/// Probability mass of a one-sigma central interval.
pub const ONE_SIGMA_COVERAGE: f64 = 0.6827;

/// Excluded tail probability `q`, strictly inside (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TailProbability(f64);

impl TailProbability {
    /// Validate `q`. Values outside the open interval (0, 1) or non-finite are rejected.
    pub fn new(q: f64) -> Result<Self> {
        if !q.is_finite() || q <= 0.0 || q >= 1.0 {
            return Err(Error::Validation(format!("q must be finite and in (0,1), got {}", q)));
        }
        Ok(Self(q))
    }

    /// Both tails of a one-sigma interval: `1 - 0.6827`.
    pub fn one_sigma_two_sided() -> Self {
        Self(1.0 - ONE_SIGMA_COVERAGE)
    }

    /// A single tail of a one-sigma interval: `(1 - 0.6827) / 2`.
    pub fn one_sigma_one_tail() -> Self {
        Self((1.0 - ONE_SIGMA_COVERAGE) / 2.0)
    }

    /// Raw value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for TailProbability {
    type Error = Error;

    fn try_from(q: f64) -> Result<Self> {
        Self::new(q)
    }
}
