//! # ms-plateau
//!
//! Detector plateau curves: count rate or coincidence ratio versus applied
//! voltage for one scintillator, with error bars from [`ms_prob`].
//!
//! - [`channel`]: detector wiring (scintillator id → coincidence columns)
//! - [`curve`]: per-scintillator curve construction

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod curve;

pub use channel::Scintillator;
pub use curve::{CurveOptions, PlateauCurve, PlateauKind, rate_curve, ratio_curve, scintillator_rows};
