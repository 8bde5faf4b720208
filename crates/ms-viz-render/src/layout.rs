//! Axis scales and the plot frame they are drawn into.

use crate::config::VizConfig;
use crate::svg::{Font, Svg};
use crate::text::text_width;

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Labelled major tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

/// Data interval shown along one axis, with its ticks.
#[derive(Debug, Clone)]
pub struct Scale {
    pub lo: f64,
    pub hi: f64,
    pub log: bool,
    pub title: String,
    pub ticks: Vec<Tick>,
    pub minor: Vec<f64>,
}

impl Scale {
    /// Linear scale widened to whole steps of 1, 2 or 5 × 10ⁿ, about five intervals.
    pub fn linear(lo: f64, hi: f64) -> Self {
        let (lo, hi) = if !(lo.is_finite() && hi.is_finite()) {
            (0.0, 1.0)
        } else if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
            (lo - 1.0, hi + 1.0)
        } else {
            (lo, hi)
        };
        let step = tick_step((hi - lo) / 5.0);
        let first = (lo / step).floor() as i64;
        let last = (hi / step).ceil() as i64;
        let decimals = (-step.log10().floor()).max(0.0) as usize;

        let ticks = (first..=last)
            .map(|k| {
                let value = k as f64 * step;
                // k == 0 prints "0", never "-0".
                let shown = if k == 0 { 0.0 } else { value };
                Tick { value, label: format!("{shown:.decimals$}") }
            })
            .collect();
        let minor = (first..last)
            .flat_map(|k| (1..5).map(move |m| (k as f64 + m as f64 / 5.0) * step))
            .collect();
        Self {
            lo: first as f64 * step,
            hi: last as f64 * step,
            log: false,
            title: String::new(),
            ticks,
            minor,
        }
    }

    /// Base-10 scale spanning whole decades. Non-positive bounds are raised to 1e-20.
    pub fn log(lo: f64, hi: f64) -> Self {
        let first = lo.max(1e-20).log10().floor() as i32;
        let last = (hi.max(1e-20).log10().ceil() as i32).max(first + 1);
        let ticks = (first..=last)
            .map(|e| Tick { value: 10f64.powi(e), label: format!("10{}", superscript(e)) })
            .collect();
        let minor =
            (first..last).flat_map(|e| (2..10).map(move |m| m as f64 * 10f64.powi(e))).collect();
        Self {
            lo: 10f64.powi(first),
            hi: 10f64.powi(last),
            log: true,
            title: String::new(),
            ticks,
            minor,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lo && v <= self.hi
    }

    /// Position of `v` along the scale, 0 at `lo` and 1 at `hi`.
    pub fn fraction(&self, v: f64) -> f64 {
        if self.log {
            let v = v.max(1e-20);
            (v / self.lo).ln() / (self.hi / self.lo).ln()
        } else {
            (v - self.lo) / (self.hi - self.lo)
        }
    }
}

fn tick_step(rough: f64) -> f64 {
    let magnitude = 10f64.powf(rough.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= rough * (1.0 - 1e-9))
        .unwrap_or(10.0 * magnitude)
}

fn superscript(n: i32) -> String {
    let abs = n.unsigned_abs().to_string();
    let digits = abs.chars().map(|c| {
        c.to_digit(10).map_or(c, |d| SUPERSCRIPT_DIGITS[d as usize])
    });
    if n < 0 { std::iter::once('⁻').chain(digits).collect() } else { digits.collect() }
}

/// Plot rectangle inside the document, in points.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Frame {
    /// Leave room for the title, the y tick labels, and both axis titles.
    pub fn fit(svg: &Svg, x: &Scale, y: &Scale, config: &VizConfig) -> Self {
        let tick_font = Font::new(config.font.tick_size);
        let title_room = config.font.label_size + 6.0;
        let widest_tick =
            y.ticks.iter().map(|t| text_width(&t.label, &tick_font)).fold(0.0, f64::max);

        let mut left = 15.0 + widest_tick + 8.0;
        let mut bottom = 15.0 + config.font.tick_size + 6.0;
        if !y.title.is_empty() {
            left += title_room;
        }
        if !x.title.is_empty() {
            bottom += title_room;
        }
        let top = config.font.title_size * 1.3 + 16.0;

        let right = (svg.width() - 15.0).max(left + 50.0);
        let bottom = (svg.height() - bottom).max(top + 50.0);
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Horizontal pixel for a value on scale `x`.
    pub fn px(&self, x: &Scale, v: f64) -> f64 {
        self.left + x.fraction(v) * self.width()
    }

    /// Vertical pixel for a value on scale `y`; larger values sit higher.
    pub fn py(&self, y: &Scale, v: f64) -> f64 {
        self.bottom - y.fraction(v) * self.height()
    }
}
