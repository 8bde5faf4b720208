//! Uniformly binned 1D histogram.

use ms_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Binning fixed at construction: `n_bins` equal-width bins over `[x_min, x_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Lower edge of first bin.
    pub x_min: f64,
    /// Upper edge of last bin.
    pub x_max: f64,
}

impl BinSpec {
    /// Validate and build a bin specification.
    pub fn new(n_bins: usize, x_min: f64, x_max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Validation("n_bins must be >= 1".to_string()));
        }
        if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
            return Err(Error::Validation(format!(
                "histogram range must be finite with x_max > x_min, got [{}, {}]",
                x_min, x_max
            )));
        }
        Ok(Self { n_bins, x_min, x_max })
    }

    /// Width of every bin.
    pub fn width(&self) -> f64 {
        (self.x_max - self.x_min) / self.n_bins as f64
    }

    /// Bin edges (length = n_bins + 1). The last edge is exactly `x_max`.
    pub fn edges(&self) -> Vec<f64> {
        let w = self.width();
        let mut edges: Vec<f64> = (0..self.n_bins).map(|i| self.x_min + w * i as f64).collect();
        edges.push(self.x_max);
        edges
    }

    /// Bin centers (length = n_bins).
    pub fn centers(&self) -> Vec<f64> {
        let w = self.width();
        (0..self.n_bins).map(|i| self.x_min + w * (i as f64 + 0.5)).collect()
    }

    /// Bin index for `x`, or `None` for underflow, overflow, and NaN.
    ///
    /// Bins are half-open: `x_min` falls in bin 0, `x_max` is overflow.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.x_min && x < self.x_max) {
            return None;
        }
        let i = ((x - self.x_min) / self.width()).floor() as usize;
        Some(i.min(self.n_bins - 1))
    }

    /// Fail with [`Error::BinMismatch`] unless `other` has identical binning.
    pub fn ensure_same(&self, other: &BinSpec) -> Result<()> {
        if self != other {
            return Err(Error::BinMismatch(format!(
                "({} bins over [{}, {}]) vs ({} bins over [{}, {}])",
                self.n_bins, self.x_min, self.x_max, other.n_bins, other.x_min, other.x_max
            )));
        }
        Ok(())
    }
}

/// A filled 1D histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Binning.
    pub spec: BinSpec,
    /// Bin contents (length = n_bins, excluding under/overflow).
    pub bin_content: Vec<f64>,
    /// Sum of weights squared per bin.
    pub sumw2: Vec<f64>,
    /// Entries below `x_min`.
    pub underflow: f64,
    /// Entries at or above `x_max`.
    pub overflow: f64,
    /// Entries that landed in a bin.
    pub entries: u64,
}

impl Histogram {
    /// Empty histogram.
    pub fn new(name: impl Into<String>, title: impl Into<String>, spec: BinSpec) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            spec,
            bin_content: vec![0.0; spec.n_bins],
            sumw2: vec![0.0; spec.n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Histogram with given unit-weight counts; `sumw2` equals the contents.
    pub fn from_contents(
        name: impl Into<String>,
        title: impl Into<String>,
        spec: BinSpec,
        contents: Vec<f64>,
    ) -> Result<Self> {
        if contents.len() != spec.n_bins {
            return Err(Error::MalformedInput(format!(
                "expected {} bin contents, got {}",
                spec.n_bins,
                contents.len()
            )));
        }
        if let Some(bad) = contents.iter().find(|c| !c.is_finite() || **c < 0.0) {
            return Err(Error::Validation(format!("bin contents must be finite and >= 0, got {}", bad)));
        }
        let entries = contents.iter().sum::<f64>().round() as u64;
        Ok(Self {
            name: name.into(),
            title: title.into(),
            spec,
            sumw2: contents.clone(),
            bin_content: contents,
            underflow: 0.0,
            overflow: 0.0,
            entries,
        })
    }

    /// Add one unit-weight entry at `x`. NaN is ignored.
    pub fn fill(&mut self, x: f64) {
        if x.is_nan() {
            return;
        }
        match self.spec.find_bin(x) {
            Some(b) => {
                self.bin_content[b] += 1.0;
                self.sumw2[b] += 1.0;
                self.entries += 1;
            }
            None if x < self.spec.x_min => self.underflow += 1.0,
            None => self.overflow += 1.0,
        }
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Per-bin statistical errors, `sqrt(sumw2)`.
    pub fn errors(&self) -> Vec<f64> {
        self.sumw2.iter().map(|w2| w2.sqrt()).collect()
    }

    /// `(center, content, error)` for every bin.
    pub fn points(&self) -> Vec<(f64, f64, f64)> {
        self.spec
            .centers()
            .into_iter()
            .zip(self.bin_content.iter().zip(&self.sumw2))
            .map(|(c, (&v, &w2))| (c, v, w2.sqrt()))
            .collect()
    }
}
