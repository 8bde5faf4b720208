use ms_plateau::{PlateauCurve, PlateauKind};
use serde::{Deserialize, Serialize};

use crate::finite;

/// Schema tag written into every plateau artifact.
pub const PLATEAU_SCHEMA: &str = "muonstat_plateau_v1";

/// Plot-friendly artifact for one scintillator's plateau curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateauCurveArtifact {
    /// Schema tag.
    pub schema_version: String,
    /// `rate` or `ratio`.
    pub kind: PlateauKind,
    /// Scintillator id (1..=5).
    pub scintillator: u32,
    /// Plot title.
    pub title: String,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Applied voltages.
    pub x: Vec<f64>,
    /// Measured values aligned with `x`.
    pub y: Vec<f64>,
    /// Downward error bar lengths (`null` when undefined).
    pub yerr_lo: Vec<Option<f64>>,
    /// Upward error bar lengths (`null` when undefined).
    pub yerr_hi: Vec<Option<f64>>,
    /// Operating-voltage marker.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub peak: Option<f64>,
    /// Logarithmic y axis.
    pub log_y: bool,
    /// Mean of `y`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mean: Option<f64>,
}

impl From<PlateauCurve> for PlateauCurveArtifact {
    fn from(curve: PlateauCurve) -> Self {
        let PlateauCurve {
            kind,
            scintillator,
            title,
            x_label,
            y_label,
            voltage,
            values,
            errors,
            peak,
            log_y,
            mean,
        } = curve;
        let [lo, hi] = errors.into_rows();

        Self {
            schema_version: PLATEAU_SCHEMA.to_string(),
            kind,
            scintillator: scintillator.id(),
            title,
            x_label,
            y_label,
            x: voltage,
            y: values,
            yerr_lo: lo.into_iter().map(finite).collect(),
            yerr_hi: hi.into_iter().map(finite).collect(),
            peak,
            log_y,
            mean: finite(mean),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_plateau::{CurveOptions, Scintillator, ratio_curve};
    use ms_table::Table;

    const SHEET: &str = "\
Scintillator,V1,C1C2C3,C2C3,ratio,ratio
1,1.30,0,0,0,0.0
1,1.40,45,50,0.1,0.9
";

    #[test]
    fn zero_trials_serialise_as_null() {
        let t = Table::from_reader(SHEET.as_bytes()).unwrap();
        let opts = CurveOptions { q: 0.3173, peak: Some(1.499), log_y: false };
        let art = PlateauCurveArtifact::from(ratio_curve(&t, Scintillator::One, opts).unwrap());
        assert_eq!(art.scintillator, 1);
        assert_eq!(art.yerr_lo[0], None);
        assert!(art.yerr_lo[1].is_some());

        let json = serde_json::to_value(&art).unwrap();
        assert_eq!(json["schema_version"], PLATEAU_SCHEMA);
        assert_eq!(json["kind"], "ratio");
        assert!(json["yerr_hi"][0].is_null());
        assert_eq!(json["peak"], 1.499);

        let back: PlateauCurveArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(back.x, art.x);
    }
}
