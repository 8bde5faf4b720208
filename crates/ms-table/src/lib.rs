//! # ms-table
//!
//! Column-oriented numeric tables read from CSV spreadsheet exports.
//!
//! Every cell is parsed as `f64`; empty, non-numeric, or `NaN` cells are kept
//! as `None` so selections can decide whether a column is complete.
//!
//! ```no_run
//! use ms_table::Table;
//!
//! let t = Table::from_path("voltage_setup.csv").unwrap();
//! let scint = t.filter_eq("Scintillator", 1.0).unwrap().drop_incomplete_columns();
//! let rate = scint.complete_column("rate").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod table;

pub use table::Table;
