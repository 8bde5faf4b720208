//! # ms-hist
//!
//! Fixed-binning 1D histograms for TDC timing data.
//!
//! - [`histogram`]: `BinSpec` and `Histogram` (ROOT TH1-style under/overflow)
//! - [`filler`]: tick → ns conversion and hit selection for up/down channels
//! - [`combine`]: bin-wise sum, difference, and asymmetry of two histograms
//! - [`model`]: exponential and precession curve shapes
//! - [`fit`]: chi-squared fits of those shapes to histogram bins
//! - [`optimizer`]: box-constrained L-BFGS used by the fits
//!
//! ## Example
//!
//! ```
//! use ms_hist::{BinSpec, CombineMode, Histogram, combine};
//!
//! let spec = BinSpec::new(5, 0.0, 5.0).unwrap();
//! let up = Histogram::from_contents("up", "", spec, vec![0.0, 2.0, 4.0, 2.0, 0.0]).unwrap();
//! let down = Histogram::from_contents("down", "", spec, vec![0.0, 1.0, 1.0, 1.0, 0.0]).unwrap();
//! let sum = combine(&up, &down, CombineMode::Sum).unwrap();
//! assert_eq!(sum.values, vec![0.0, 3.0, 5.0, 3.0, 0.0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combine;
pub mod filler;
pub mod fit;
pub mod histogram;
pub mod model;
pub mod optimizer;

pub use combine::{BinValue, CombineDiagnostic, CombineMode, CombinedHistogram, combine};
pub use filler::{NS_PER_TICK, TimingChannel, fill_timing, fill_up_down};
pub use fit::{CurveFit, DEFAULT_FIT_RANGE, FitParameter, fit_curve, fit_lifetime};
pub use histogram::{BinSpec, Histogram};
pub use model::FitModel;
