//! Analysis configuration (`--config analysis.yaml`).
//!
//! Every key is optional; a missing key keeps its default. Command-line flags
//! override values from the file.

use std::path::Path;

use anyhow::{Context, Result};
use ms_hist::{DEFAULT_FIT_RANGE, NS_PER_TICK, TimingChannel};
use ms_viz_render::config::VizConfig;
use serde::Deserialize;

/// Two-sided 1σ coverage used throughout the analysis.
const ONE_SIGMA: f64 = 0.6827;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub rate: RateConfig,
    pub ratio: RatioConfig,
    pub histogram: HistogramConfig,
    pub viz: VizConfig,
}

/// Count-rate plateau settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateConfig {
    /// Tail probability for the chi-squared interval.
    pub q: f64,
    /// Operating voltage per scintillator, indexed by id - 1.
    pub peaks: Vec<f64>,
    pub log_y: bool,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            q: (1.0 - ONE_SIGMA) / 2.0,
            peaks: vec![1.401, 1.35, 1.451, 1.401, 1.449],
            log_y: true,
        }
    }
}

/// Coincidence-ratio plateau settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatioConfig {
    /// Two-sided tail probability for the Clopper–Pearson interval.
    pub q: f64,
    pub peaks: Vec<f64>,
    pub log_y: bool,
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self { q: 1.0 - ONE_SIGMA, peaks: vec![1.499, 1.408, 1.381, 1.369, 1.542], log_y: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistogramConfig {
    pub t_min: f64,
    pub t_max: f64,
    pub bins: usize,
    pub ns_per_tick: f64,
    pub up_column: String,
    pub down_column: String,
    pub fit_range: [f64; 2],
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            t_min: 0.0,
            t_max: 1000.0,
            bins: 50,
            ns_per_tick: NS_PER_TICK,
            up_column: TimingChannel::Up.column().to_string(),
            down_column: TimingChannel::Down.column().to_string(),
            fit_range: [DEFAULT_FIT_RANGE.0, DEFAULT_FIT_RANGE.1],
        }
    }
}

/// Read the config file, or fall back to defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: AnalysisConfig = serde_yaml_ng::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_viz_render::svg::Color;

    #[test]
    fn defaults() {
        let cfg = AnalysisConfig::default();
        assert!((cfg.rate.q - 0.15865).abs() < 1e-12);
        assert!((cfg.ratio.q - 0.3173).abs() < 1e-12);
        assert_eq!(cfg.rate.peaks[2], 1.451);
        assert_eq!(cfg.ratio.peaks[4], 1.542);
        assert!(cfg.rate.log_y && !cfg.ratio.log_y);
        assert_eq!(cfg.histogram.bins, 50);
        assert_eq!(cfg.histogram.up_column, "TDC6");
        assert_eq!(cfg.histogram.fit_range, [400.0, 5000.0]);
    }

    #[test]
    fn partial_sections_keep_their_own_defaults() {
        let yaml = "rate:\n  log_y: false\nratio:\n  q: 0.05\nhistogram:\n  bins: 20\n";
        let cfg: AnalysisConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(!cfg.rate.log_y);
        assert!((cfg.rate.q - 0.15865).abs() < 1e-12);
        assert_eq!(cfg.ratio.q, 0.05);
        assert_eq!(cfg.ratio.peaks.len(), 5);
        assert_eq!(cfg.histogram.bins, 20);
        assert_eq!(cfg.histogram.t_max, 1000.0);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(serde_yaml_ng::from_str::<AnalysisConfig>("rates:\n  q: 0.1\n").is_err());
    }

    #[test]
    fn partial_viz_section_keeps_defaults() {
        let yaml = "viz:\n  figure:\n    width: 300\n  colors:\n    peak_line: '#00ff00'\n";
        let cfg: AnalysisConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(cfg.viz.figure.width, 300.0);
        assert_eq!(cfg.viz.figure.height, 432.0);
        assert_eq!(cfg.viz.colors.peak_line, Color::rgb(0, 255, 0));
        assert_eq!(cfg.viz.colors.fit, Color::RED);
        assert!(cfg.viz.grid.show);
    }

    #[test]
    fn bad_viz_color_is_rejected() {
        let err = serde_yaml_ng::from_str::<AnalysisConfig>("viz:\n  colors:\n    fit: '#xyz'\n")
            .unwrap_err();
        assert!(err.to_string().contains("#xyz"), "{err}");
    }
}
