//! Timing histogram artifacts (numbers-first).
//!
//! One artifact shape covers both raw up/down histograms and combined
//! (sum, difference, asymmetry) histograms. Bins whose value is undefined
//! serialise as `null`.

use ms_hist::{CombinedHistogram, CurveFit, Histogram};
use serde::{Deserialize, Serialize};

use crate::finite;

/// Schema tag written into every histogram artifact.
pub const HISTOGRAM_SCHEMA: &str = "muonstat_histogram_v1";

/// X-axis label shared by every timing histogram.
pub const TIME_LABEL: &str = "Time (ns)";

/// One row of the per-bin dump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRow {
    /// Zero-based bin index.
    pub bin: usize,
    /// Bin center (ns).
    pub center: f64,
    /// Up-channel content.
    pub up: f64,
    /// Down-channel content.
    pub down: f64,
    /// Combined value, `None` where undefined.
    pub combined: Option<f64>,
}

/// Plot-friendly artifact for one histogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramArtifact {
    /// Schema tag.
    pub schema_version: String,
    /// Histogram name (`up_hist`, `sum_hist`, ...).
    pub name: String,
    /// Plot title.
    pub title: String,
    /// `up`, `down`, `sum`, `difference` or `asymmetry`.
    pub mode: String,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// `n_bins + 1` uniform edges.
    pub bin_edges: Vec<f64>,
    /// Bin value, `null` where undefined.
    pub values: Vec<Option<f64>>,
    /// Bin error, `null` where undefined.
    pub errors: Vec<Option<f64>>,
    /// Count of `null` values.
    pub n_undefined: usize,
    /// Number of fill calls (raw histograms only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub entries: Option<u64>,
    /// Underflow content (raw histograms only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub underflow: Option<f64>,
    /// Overflow content (raw histograms only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub overflow: Option<f64>,
    /// Chi-squared curve fit (exponential, or precession for difference and asymmetry).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fit: Option<CurveFit>,
    /// Per-bin up/down/combined dump (combined histograms only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub diagnostics: Option<Vec<DiagnosticRow>>,
}

impl HistogramArtifact {
    /// Artifact for a raw timing histogram; `mode` is `up` or `down`.
    pub fn from_histogram(hist: &Histogram, mode: &str) -> Self {
        Self {
            schema_version: HISTOGRAM_SCHEMA.to_string(),
            name: hist.name.clone(),
            title: hist.title.clone(),
            mode: mode.to_string(),
            x_label: TIME_LABEL.to_string(),
            y_label: "Counts".to_string(),
            bin_edges: hist.spec.edges(),
            values: hist.bin_content.iter().copied().map(finite).collect(),
            errors: hist.errors().into_iter().map(finite).collect(),
            n_undefined: 0,
            entries: Some(hist.entries),
            underflow: Some(hist.underflow),
            overflow: Some(hist.overflow),
            fit: None,
            diagnostics: None,
        }
    }

    /// Artifact for a combined histogram.
    pub fn from_combined(hist: &CombinedHistogram) -> Self {
        Self {
            schema_version: HISTOGRAM_SCHEMA.to_string(),
            name: hist.name.clone(),
            title: hist.title.clone(),
            mode: hist.mode.as_str().to_string(),
            x_label: TIME_LABEL.to_string(),
            y_label: hist.mode.y_label().to_string(),
            bin_edges: hist.spec.edges(),
            values: hist.values.iter().copied().map(finite).collect(),
            errors: hist.errors.iter().copied().map(finite).collect(),
            n_undefined: hist.n_undefined(),
            entries: None,
            underflow: None,
            overflow: None,
            fit: None,
            diagnostics: None,
        }
    }

    /// Attach a curve fit.
    pub fn with_fit(mut self, fit: CurveFit) -> Self {
        self.fit = Some(fit);
        self
    }

    /// Attach the per-bin dump of a combined histogram.
    pub fn with_diagnostics(mut self, hist: &CombinedHistogram) -> Self {
        self.diagnostics = Some(
            hist.diagnostics()
                .into_iter()
                .map(|d| DiagnosticRow {
                    bin: d.bin,
                    center: d.center,
                    up: d.up,
                    down: d.down,
                    combined: finite(d.combined),
                })
                .collect(),
        );
        self
    }

    /// Bin centers derived from `bin_edges`.
    pub fn bin_centers(&self) -> Vec<f64> {
        self.bin_edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// `(center, value, error)` for bins with a defined value.
    pub fn defined_points(&self) -> Vec<(f64, f64, f64)> {
        self.bin_centers()
            .into_iter()
            .zip(self.values.iter().zip(&self.errors))
            .filter_map(|(c, (v, e))| Some((c, (*v)?, e.unwrap_or(0.0))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_hist::{BinSpec, CombineMode, FitModel, FitParameter, combine};

    fn pair() -> (Histogram, Histogram) {
        let spec = BinSpec::new(5, 0.0, 5.0).unwrap();
        let up = Histogram::from_contents("up_hist", "up", spec, vec![0.0, 2.0, 4.0, 2.0, 0.0])
            .unwrap();
        let down =
            Histogram::from_contents("down_hist", "down", spec, vec![0.0, 1.0, 1.0, 1.0, 0.0])
                .unwrap();
        (up, down)
    }

    #[test]
    fn asymmetry_sentinel_becomes_null() {
        let (up, down) = pair();
        let c = combine(&up, &down, CombineMode::Asymmetry).unwrap();
        let art = HistogramArtifact::from_combined(&c).with_diagnostics(&c);
        assert_eq!(art.n_undefined, 2);
        assert_eq!(art.bin_edges.len(), 6);

        let json = serde_json::to_value(&art).unwrap();
        assert!(json["values"][0].is_null());
        assert!(json["values"][4].is_null());
        assert_eq!(json["mode"], "asymmetry");
        assert!(json["diagnostics"][0]["combined"].is_null());
        assert!(json.get("entries").is_none());

        let text = serde_json::to_string(&art).unwrap();
        let back: HistogramArtifact = serde_json::from_str(&text).unwrap();
        assert_eq!(back.defined_points().len(), 3);
    }

    #[test]
    fn diagnostic_rows_match_their_docs() {
        let (up, down) = pair();
        let c = combine(&up, &down, CombineMode::Difference).unwrap();
        let art = HistogramArtifact::from_combined(&c).with_diagnostics(&c);
        let rows = art.diagnostics.unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(
            rows[2],
            DiagnosticRow { bin: 2, center: 2.5, up: 4.0, down: 1.0, combined: Some(3.0) }
        );
    }

    #[test]
    fn raw_histogram_carries_counts() {
        let (up, _) = pair();
        let art = HistogramArtifact::from_histogram(&up, "up");
        assert_eq!(art.values[2], Some(4.0));
        assert_eq!(art.errors[2], Some(2.0));
        assert_eq!(art.y_label, "Counts");
        assert_eq!(art.bin_centers(), vec![0.5, 1.5, 2.5, 3.5, 4.5]);
        assert!(art.fit.is_none());
    }

    #[test]
    fn fit_round_trips_with_model_tag() {
        let (up, _) = pair();
        let fit = CurveFit {
            model: FitModel::Oscillation,
            parameters: ["offset", "amplitude", "angular_frequency", "phase"]
                .iter()
                .map(|n| FitParameter { name: n.to_string(), value: 0.5, error: 0.1 })
                .collect(),
            chi2: 3.2,
            ndf: 1,
            n_points: 5,
            range: (0.0, 5.0),
            converged: true,
        };
        let art = HistogramArtifact::from_histogram(&up, "up").with_fit(fit.clone());
        let json = serde_json::to_value(&art).unwrap();
        assert_eq!(json["fit"]["model"], "oscillation");
        assert_eq!(json["fit"]["parameters"][3]["name"], "phase");
        let back: HistogramArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(back.fit, Some(fit));
    }
}
