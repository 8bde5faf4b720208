//! # ms-viz
//!
//! Visualization data artifacts for muonstat.
//!
//! Numbers-first JSON structures (parallel arrays instead of nested objects).
//! Undefined values are carried as `null`, never as NaN.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Timing and combined histogram artifacts.
pub mod histogram;

/// Plateau curve artifacts.
pub mod plateau;

pub use histogram::HistogramArtifact;
pub use plateau::PlateauCurveArtifact;

/// Finite values pass through; NaN and infinities become `None`.
pub(crate) fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
