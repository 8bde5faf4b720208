//! Bin-wise combination of the up and down histograms.
//!
//! Undefined asymmetry bins (`up + down == 0`) hold `NaN` in
//! [`CombinedHistogram::values`]. Use [`CombinedHistogram::bin`] or
//! [`CombinedHistogram::defined_points`] to filter them instead of relying
//! on NaN propagation.

use std::fmt;
use std::str::FromStr;

use ms_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::histogram::{BinSpec, Histogram};

/// How two histograms are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    /// `up + down`
    Sum,
    /// `up - down`
    Difference,
    /// `(up - down) / (up + down)`
    Asymmetry,
}

impl CombineMode {
    /// Stable identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            CombineMode::Sum => "sum",
            CombineMode::Difference => "difference",
            CombineMode::Asymmetry => "asymmetry",
        }
    }

    /// Histogram title.
    pub fn title(self) -> &'static str {
        match self {
            CombineMode::Sum => "Sum",
            CombineMode::Difference => "Difference",
            CombineMode::Asymmetry => "Asymmetry",
        }
    }

    /// Y-axis label.
    pub fn y_label(self) -> &'static str {
        match self {
            CombineMode::Sum => "U + D",
            CombineMode::Difference => "U - D",
            CombineMode::Asymmetry => "(U - D) / (U + D)",
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CombineMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sum" => Ok(CombineMode::Sum),
            "difference" | "diff" => Ok(CombineMode::Difference),
            "asymmetry" | "asym" => Ok(CombineMode::Asymmetry),
            other => Err(Error::Validation(format!(
                "unknown combine mode '{}' (expected sum, difference, asymmetry)",
                other
            ))),
        }
    }
}

/// Tagged value of one combined bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinValue {
    /// Well-defined value.
    Defined(f64),
    /// Asymmetry bin with `up + down == 0`.
    ZeroDenominator,
}

impl BinValue {
    /// The value, if defined.
    pub fn value(self) -> Option<f64> {
        match self {
            BinValue::Defined(v) => Some(v),
            BinValue::ZeroDenominator => None,
        }
    }
}

/// One row of the per-bin diagnostic listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombineDiagnostic {
    /// Bin index (0-based, in-range bins only).
    pub bin: usize,
    /// Bin center.
    pub center: f64,
    /// Up content.
    pub up: f64,
    /// Down content.
    pub down: f64,
    /// Combined value (`NaN` when undefined).
    pub combined: f64,
}

/// Result of [`combine`]: same binning as the inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedHistogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Combination that produced this histogram.
    pub mode: CombineMode,
    /// Binning shared with both inputs.
    pub spec: BinSpec,
    /// Combined value per bin (`NaN` for undefined asymmetry bins).
    pub values: Vec<f64>,
    /// Propagated statistical error per bin (`NaN` where undefined).
    pub errors: Vec<f64>,
    /// Up contents used.
    pub up: Vec<f64>,
    /// Down contents used.
    pub down: Vec<f64>,
}

/// Combine `up` and `down` bin by bin.
///
/// Both histograms must have identical binning; otherwise
/// [`Error::BinMismatch`] is returned before any bin is touched.
pub fn combine(up: &Histogram, down: &Histogram, mode: CombineMode) -> Result<CombinedHistogram> {
    up.spec.ensure_same(&down.spec)?;
    let n = up.spec.n_bins;
    if up.bin_content.len() != n || down.bin_content.len() != n {
        return Err(Error::MalformedInput(format!(
            "bin content length does not match n_bins={} (up={}, down={})",
            n,
            up.bin_content.len(),
            down.bin_content.len()
        )));
    }

    let mut values = vec![0.0; n];
    let mut errors = vec![0.0; n];
    for i in 0..n {
        let u = up.bin_content[i];
        let d = down.bin_content[i];
        let vu = up.sumw2.get(i).copied().unwrap_or(u);
        let vd = down.sumw2.get(i).copied().unwrap_or(d);
        let (v, e) = combine_bin(u, d, vu, vd, mode);
        values[i] = v;
        errors[i] = e;
    }

    Ok(CombinedHistogram {
        name: format!("{}_hist", mode.as_str()),
        title: mode.title().to_string(),
        mode,
        spec: up.spec,
        values,
        errors,
        up: up.bin_content.clone(),
        down: down.bin_content.clone(),
    })
}

/// Value and error for one bin; `vu`, `vd` are the input variances.
fn combine_bin(u: f64, d: f64, vu: f64, vd: f64, mode: CombineMode) -> (f64, f64) {
    match mode {
        CombineMode::Sum => (u + d, (vu + vd).sqrt()),
        CombineMode::Difference => (u - d, (vu + vd).sqrt()),
        CombineMode::Asymmetry => {
            let s = u + d;
            if s == 0.0 {
                return (f64::NAN, f64::NAN);
            }
            // dA/du = 2d/s², dA/dd = -2u/s²
            let err = 2.0 * (d * d * vu + u * u * vd).sqrt() / (s * s);
            ((u - d) / s, err)
        }
    }
}

impl CombinedHistogram {
    /// Tagged value of bin `i`.
    pub fn bin(&self, i: usize) -> Option<BinValue> {
        let v = *self.values.get(i)?;
        Some(if v.is_nan() { BinValue::ZeroDenominator } else { BinValue::Defined(v) })
    }

    /// Number of bins whose value is undefined.
    pub fn n_undefined(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// `(center, value, error)` for defined bins only.
    pub fn defined_points(&self) -> Vec<(f64, f64, f64)> {
        self.spec
            .centers()
            .into_iter()
            .zip(self.values.iter().zip(&self.errors))
            .filter(|(_, (v, _))| !v.is_nan())
            .map(|(c, (&v, &e))| (c, v, e))
            .collect()
    }

    /// Per-bin listing of up, down, and combined values.
    pub fn diagnostics(&self) -> Vec<CombineDiagnostic> {
        self.spec
            .centers()
            .into_iter()
            .enumerate()
            .map(|(bin, center)| CombineDiagnostic {
                bin,
                center,
                up: self.up[bin],
                down: self.down[bin],
                combined: self.values[bin],
            })
            .collect()
    }

    /// Emit [`diagnostics`](Self::diagnostics) at debug level.
    pub fn log_diagnostics(&self) {
        for row in self.diagnostics() {
            tracing::debug!(
                mode = %self.mode,
                bin = row.bin,
                center = row.center,
                up = row.up,
                down = row.down,
                combined = row.combined,
                "combined bin"
            );
        }
    }
}
