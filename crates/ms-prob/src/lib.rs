//! Confidence-interval error bars for muonstat.
//!
//! - [`poisson`]: chi-squared (Garwood-style) intervals for raw counts/rates
//! - [`binomial`]: Clopper–Pearson intervals for coincidence ratios
//! - [`quantile`]: degenerate-safe chi-squared and Beta inverse CDFs
//! - [`tail`]: validated tail probability `q`

pub mod binomial;
pub mod poisson;
pub mod quantile;
pub mod tail;

pub use binomial::{binomial_ratio_errors, clopper_pearson};
pub use poisson::{count_interval, poisson_count_errors};
pub use tail::TailProbability;
