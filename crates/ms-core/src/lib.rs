//! # ms-core
//!
//! Shared error type and interval containers for the muonstat crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::ErrorInterval;

/// Workspace version reported by `muonstat version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
