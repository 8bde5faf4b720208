use serde::Deserialize;

use crate::svg::Color;

/// Plot styling. Read from the `viz:` section of the analysis config;
/// missing keys keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub experiment: ExperimentConfig,
    pub colors: ColorsConfig,
    pub markers: MarkerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 576.0,  // 8" * 72
            height: 432.0, // 6" * 72
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub title_size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 10.0, title_size: 13.0, label_size: 11.0, tick_size: 8.5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            minor_tick_length: 3.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: true, color: Color::rgb(0xCB, 0xD5, 0xE1), alpha: 0.55 }
    }
}

/// Optional lab label drawn top-left of the plot (e.g. **Muon Lab** *Preliminary*).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub points: Color,
    pub error_bars: Color,
    pub peak_line: Color,
    pub histogram: Color,
    pub fit: Color,
    pub zero_line: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            points: Color::INK,
            error_bars: Color::INK,
            peak_line: Color::RED,
            histogram: Color::BLUE,
            fit: Color::RED,
            zero_line: Color::SLATE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub size: f64,
    pub cap_width: f64,
    pub line_width: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self { size: 2.5, cap_width: 5.0, line_width: 1.0 }
    }
}
