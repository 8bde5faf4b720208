//! Plateau curve construction.
//!
//! Two sheet layouts are supported:
//!
//! - **rate**: one `V` column and a `rate` column of raw counts; errors are
//!   Poisson chi-squared intervals.
//! - **ratio**: per-paddle `V{n}` columns, the coincidence counts, and a
//!   precomputed `ratio.1` column (three-fold / two-fold); errors are
//!   Clopper–Pearson intervals.

use ms_core::{Error, ErrorInterval, Result};
use ms_prob::{binomial_ratio_errors, poisson_count_errors};
use ms_table::Table;
use serde::{Deserialize, Serialize};

use crate::channel::Scintillator;

/// Column holding the scintillator id of each row.
pub const SCINTILLATOR_COLUMN: &str = "Scintillator";
/// Voltage column of the rate sheet.
pub const VOLTAGE_COLUMN: &str = "V";
/// Count-rate column of the rate sheet.
pub const RATE_COLUMN: &str = "rate";
/// Three-fold / two-fold ratio column of the coincidence sheet.
pub const RATIO_COLUMN: &str = "ratio.1";

/// Which measurement a curve plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateauKind {
    /// Count rate with Poisson errors.
    Rate,
    /// Coincidence ratio with binomial errors.
    Ratio,
}

/// Per-curve options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveOptions {
    /// Tail probability passed to the interval helper.
    pub q: f64,
    /// Chosen operating voltage, drawn as a marker line.
    pub peak: Option<f64>,
    /// Plot the y axis logarithmically.
    pub log_y: bool,
}

/// One scintillator's plateau curve, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateauCurve {
    /// Measurement kind.
    pub kind: PlateauKind,
    /// Paddle whose voltage was varied.
    pub scintillator: Scintillator,
    /// Plot title.
    pub title: String,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Applied voltage per point.
    pub voltage: Vec<f64>,
    /// Measured rate or ratio per point.
    pub values: Vec<f64>,
    /// Asymmetric error bars aligned with `values`.
    pub errors: ErrorInterval,
    /// Operating-voltage marker.
    pub peak: Option<f64>,
    /// Logarithmic y axis.
    pub log_y: bool,
    /// Mean of `values`.
    pub mean: f64,
}

/// Rows for one scintillator, with every column that has a gap removed.
pub fn scintillator_rows(table: &Table, scint: Scintillator) -> Result<Table> {
    let rows = table.filter_eq(SCINTILLATOR_COLUMN, scint.id() as f64)?;
    if rows.n_rows() == 0 {
        return Err(Error::MalformedInput(format!("no rows for scintillator {}", scint)));
    }
    Ok(rows.drop_incomplete_columns())
}

fn required(rows: &Table, full: &Table, name: &str, scint: Scintillator) -> Result<Vec<f64>> {
    if !rows.has_column(name) && full.has_column(name) {
        return Err(Error::MalformedInput(format!(
            "column '{}' has missing values for scintillator {}",
            name, scint
        )));
    }
    rows.complete_column(name)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() { f64::NAN } else { values.iter().sum::<f64>() / values.len() as f64 }
}

/// Count rate versus voltage (`V`, `rate`) with Poisson error bars.
pub fn rate_curve(table: &Table, scint: Scintillator, opts: CurveOptions) -> Result<PlateauCurve> {
    let rows = scintillator_rows(table, scint)?;
    let voltage = required(&rows, table, VOLTAGE_COLUMN, scint)?;
    let rate = required(&rows, table, RATE_COLUMN, scint)?;
    let errors = poisson_count_errors(opts.q, &rate)?;
    tracing::debug!(scintillator = scint.id(), points = rate.len(), "rate curve");

    Ok(PlateauCurve {
        kind: PlateauKind::Rate,
        scintillator: scint,
        title: format!("Scintillator {}", scint),
        x_label: "Voltage".to_string(),
        y_label: if opts.log_y { "Rate (log)" } else { "Rate" }.to_string(),
        mean: mean(&rate),
        voltage,
        values: rate,
        errors,
        peak: opts.peak,
        log_y: opts.log_y,
    })
}

/// Coincidence ratio versus paddle voltage (`V{n}`, `ratio.1`) with
/// Clopper–Pearson error bars.
pub fn ratio_curve(table: &Table, scint: Scintillator, opts: CurveOptions) -> Result<PlateauCurve> {
    let three = scint.three_fold_column();
    let two = scint.two_fold_column();

    let rows = scintillator_rows(table, scint)?;
    let voltage = required(&rows, table, scint.voltage_column(), scint)?;
    let ratio = required(&rows, table, RATIO_COLUMN, scint)?;
    let successes = required(&rows, table, three, scint)?;
    let trials = required(&rows, table, two, scint)?;
    let errors = binomial_ratio_errors(opts.q, &trials, &successes, &ratio)?;
    tracing::debug!(scintillator = scint.id(), points = ratio.len(), three, two, "ratio curve");

    Ok(PlateauCurve {
        kind: PlateauKind::Ratio,
        scintillator: scint,
        title: format!("V{} vs {}", scint, three),
        x_label: "Voltage".to_string(),
        y_label: format!("Ratio ({} / {})", three, two),
        mean: mean(&ratio),
        voltage,
        values: ratio,
        errors,
        peak: opts.peak,
        log_y: opts.log_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RATE_SHEET: &str = "\
Scintillator,V,rate
1,1.30,120
1,1.40,340
1,1.50,360
2,1.30,0
2,1.40,
";

    const RATIO_SHEET: &str = "\
Scintillator,V1,V2,V4,C1C2C3,C2C3C4,C2C3,C1C3,ratio,ratio
1,1.30,,,40,,100,,0.1,0.40
1,1.40,,,90,,100,,0.1,0.90
2,,1.30,,30,,,60,0.1,0.50
4,,,1.35,,70,80,,0.1,0.875
";

    fn opts(q: f64) -> CurveOptions {
        CurveOptions { q, peak: Some(1.4), log_y: false }
    }

    #[test]
    fn rate_curve_for_one_paddle() {
        let t = Table::from_reader(RATE_SHEET.as_bytes()).unwrap();
        let c = rate_curve(&t, Scintillator::One, opts(0.15865)).unwrap();
        assert_eq!(c.title, "Scintillator 1");
        assert_eq!(c.voltage, vec![1.30, 1.40, 1.50]);
        assert_eq!(c.values, vec![120.0, 340.0, 360.0]);
        assert_eq!(c.errors.len(), 3);
        assert!(c.errors.low.iter().all(|v| *v >= 0.0));
        assert_relative_eq!(c.mean, 820.0 / 3.0, epsilon = 1e-9);
        assert_eq!(c.y_label, "Rate");
    }

    #[test]
    fn rate_curve_reports_gap() {
        let t = Table::from_reader(RATE_SHEET.as_bytes()).unwrap();
        let err = rate_curve(&t, Scintillator::Two, opts(0.15865)).unwrap_err();
        assert!(err.to_string().contains("'rate' has missing values for scintillator 2"));
    }

    #[test]
    fn ratio_curve_uses_wiring() {
        let t = Table::from_reader(RATIO_SHEET.as_bytes()).unwrap();
        let c = ratio_curve(&t, Scintillator::One, opts(0.3173)).unwrap();
        assert_eq!(c.title, "V1 vs C1C2C3");
        assert_eq!(c.y_label, "Ratio (C1C2C3 / C2C3)");
        assert_eq!(c.values, vec![0.40, 0.90]);
        for i in 0..2 {
            let (lo, hi) = c.errors.get(i).unwrap();
            assert!(lo > 0.0 && hi > 0.0);
        }

        let c4 = ratio_curve(&t, Scintillator::Four, opts(0.3173)).unwrap();
        assert_eq!(c4.title, "V4 vs C2C3C4");
        assert_eq!(c4.voltage, vec![1.35]);

        let c2 = ratio_curve(&t, Scintillator::Two, opts(0.3173)).unwrap();
        assert_eq!(c2.y_label, "Ratio (C1C2C3 / C1C3)");
    }

    #[test]
    fn missing_paddle_rows() {
        let t = Table::from_reader(RATIO_SHEET.as_bytes()).unwrap();
        let err = ratio_curve(&t, Scintillator::Five, opts(0.3173)).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn missing_column_entirely() {
        let t = Table::from_reader(RATE_SHEET.as_bytes()).unwrap();
        let err = ratio_curve(&t, Scintillator::One, opts(0.3173)).unwrap_err();
        assert!(err.to_string().contains("missing column"));
    }

    #[test]
    fn invalid_q_propagates() {
        let t = Table::from_reader(RATE_SHEET.as_bytes()).unwrap();
        assert!(matches!(
            rate_curve(&t, Scintillator::One, opts(1.5)),
            Err(Error::Validation(_))
        ));
    }
}
