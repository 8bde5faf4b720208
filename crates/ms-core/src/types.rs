//! Common data types for muonstat

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Asymmetric error bars, one `(low, high)` half-width pair per sample point.
///
/// Half-widths are offsets from the observed value, not interval endpoints.
/// The packaging matches asymmetric error-bar APIs: row 0 is `low`, row 1 is `high`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInterval {
    /// Distance from the observed value down to the lower bound.
    pub low: Vec<f64>,
    /// Distance from the observed value up to the upper bound.
    pub high: Vec<f64>,
}

impl ErrorInterval {
    /// Build from two aligned sequences.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(Error::MalformedInput(format!(
                "error interval rows differ in length (low={}, high={})",
                low.len(),
                high.len()
            )));
        }
        Ok(Self { low, high })
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.low.len()
    }

    /// True when there are no sample points.
    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    /// Row-stacked 2×N view: `[low, high]`.
    pub fn rows(&self) -> [&[f64]; 2] {
        [&self.low, &self.high]
    }

    /// Consume into the 2×N row-stacked form.
    pub fn into_rows(self) -> [Vec<f64>; 2] {
        [self.low, self.high]
    }

    /// `(low, high)` pair at index `i`.
    pub fn get(&self, i: usize) -> Option<(f64, f64)> {
        Some((*self.low.get(i)?, *self.high.get(i)?))
    }
}
