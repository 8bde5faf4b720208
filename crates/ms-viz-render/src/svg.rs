//! Minimal SVG writer for the plot renderers.
//!
//! Elements are written straight into the document body in drawing order.
//! Coordinates are points (1/72 in), y growing downward.

use std::fmt::{self, Write};
use std::str::FromStr;

use serde::Deserialize;

/// Opaque sRGB color. Translucency is a property of the stroke, not the color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(214, 39, 40);
    pub const BLUE: Color = Color::rgb(31, 119, 180);
    pub const SLATE: Color = Color::rgb(0x6B, 0x72, 0x80);
    pub const INK: Color = Color::rgb(0x11, 0x18, 0x27);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Color {
    type Err = String;

    /// `#rrggbb`, `#rgb`, or one of black, white, red, blue, gray.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let named = match s.to_ascii_lowercase().as_str() {
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::RED),
            "blue" => Some(Color::BLUE),
            "gray" | "grey" => Some(Color::SLATE),
            _ => None,
        };
        if let Some(c) = named {
            return Ok(c);
        }
        let digits: Vec<u8> = s
            .strip_prefix('#')
            .filter(|h| h.is_ascii())
            .map(|h| h.chars().map(|c| c.to_digit(16).map(|d| d as u8)).collect::<Option<_>>())
            .flatten()
            .ok_or_else(|| format!("invalid color: {s}"))?;
        match digits[..] {
            [r, g, b] => Ok(Color::rgb(r * 17, g * 17, b * 17)),
            [r1, r0, g1, g0, b1, b0] => Ok(Color::rgb(r1 << 4 | r0, g1 << 4 | g0, b1 << 4 | b0)),
            _ => Err(format!("invalid color: {s}")),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?.parse().map_err(serde::de::Error::custom)
    }
}

/// Dash pattern of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dash {
    Solid,
    /// Operating-voltage marker.
    Dashed,
    /// Zero reference line.
    Dotted,
    /// Background grid.
    Grid,
}

impl Dash {
    fn pattern(self) -> Option<&'static str> {
        match self {
            Dash::Solid => None,
            Dash::Dashed => Some("6 3"),
            Dash::Dotted => Some("2 2"),
            Dash::Grid => Some("3 3"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    pub dash: Dash,
    pub opacity: f64,
}

impl Stroke {
    pub const fn new(color: Color, width: f64) -> Self {
        Self { color, width, dash: Dash::Solid, opacity: 1.0 }
    }

    pub const fn dash(mut self, dash: Dash) -> Self {
        self.dash = dash;
        self
    }

    pub const fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baseline {
    Auto,
    Central,
    Hanging,
}

/// Text appearance. Anchor and baseline place the string relative to its point.
#[derive(Debug, Clone, Copy)]
pub struct Font {
    pub size: f64,
    pub color: Color,
    pub bold: bool,
    pub anchor: Anchor,
    pub baseline: Baseline,
}

impl Font {
    pub const fn new(size: f64) -> Self {
        Self { size, color: Color::BLACK, bold: false, anchor: Anchor::Start, baseline: Baseline::Auto }
    }

    pub const fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub const fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }
}

/// An SVG document under construction.
pub struct Svg {
    width: f64,
    height: f64,
    defs: String,
    body: String,
    open_clips: usize,
    next_clip: usize,
}

impl Svg {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, defs: String::new(), body: String::new(), open_clips: 0, next_clip: 0 }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn line(&mut self, (x1, y1): (f64, f64), (x2, y2): (f64, f64), stroke: &Stroke) {
        let _ = write!(self.body, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#);
        self.stroke_attrs(stroke);
        self.body.push_str(" />\n");
    }

    /// Open path through `points`; fewer than two points draw nothing.
    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) {
        if points.len() < 2 {
            return;
        }
        let coords: Vec<String> = points.iter().map(|(x, y)| format!("{x:.2},{y:.2}")).collect();
        let _ = write!(self.body, r#"<polyline points="{}" fill="none""#, coords.join(" "));
        self.stroke_attrs(stroke);
        self.body.push_str(" />\n");
    }

    pub fn dot(&mut self, (cx, cy): (f64, f64), r: f64, fill: Color) {
        let _ = writeln!(self.body, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{fill}" />"#);
    }

    /// Vertical bar from `y_lo` to `y_hi` with horizontal caps of width `cap`.
    pub fn error_bar(&mut self, x: f64, y_lo: f64, y_hi: f64, cap: f64, stroke: &Stroke) {
        self.line((x, y_lo), (x, y_hi), stroke);
        if cap > 0.0 {
            for y in [y_lo, y_hi] {
                self.line((x - cap / 2.0, y), (x + cap / 2.0, y), stroke);
            }
        }
    }

    pub fn text(&mut self, at: (f64, f64), content: &str, font: &Font) {
        self.text_element(at, content, font, None);
    }

    /// Text reading bottom-to-top, as on a y axis.
    pub fn vertical_text(&mut self, at: (f64, f64), content: &str, font: &Font) {
        self.text_element(at, content, font, Some(-90.0));
    }

    /// Clip everything drawn until [`Svg::unclip`] to the given rectangle.
    pub fn clip_to(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let id = format!("clip{}", self.next_clip);
        self.next_clip += 1;
        let _ = writeln!(
            self.defs,
            r#"<clipPath id="{id}"><rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" /></clipPath>"#
        );
        let _ = writeln!(self.body, r#"<g clip-path="url(#{id})">"#);
        self.open_clips += 1;
    }

    pub fn unclip(&mut self) {
        if self.open_clips > 0 {
            self.body.push_str("</g>\n");
            self.open_clips -= 1;
        }
    }

    /// Close any open clip groups and return the document.
    pub fn finish(mut self) -> String {
        while self.open_clips > 0 {
            self.unclip();
        }
        let (w, h) = (self.width, self.height);
        let mut out = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n"
        );
        if !self.defs.is_empty() {
            let _ = write!(out, "<defs>\n{}</defs>\n", self.defs);
        }
        let _ = writeln!(out, r#"<rect width="{w}" height="{h}" fill="white" />"#);
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }

    fn stroke_attrs(&mut self, stroke: &Stroke) {
        let _ = write!(self.body, r#" stroke="{}" stroke-width="{:.2}""#, stroke.color, stroke.width);
        if let Some(dash) = stroke.dash.pattern() {
            let _ = write!(self.body, r#" stroke-dasharray="{dash}""#);
        }
        if stroke.opacity < 1.0 {
            let _ = write!(self.body, r#" stroke-opacity="{:.3}""#, stroke.opacity);
        }
    }

    fn text_element(&mut self, (x, y): (f64, f64), content: &str, font: &Font, rotate: Option<f64>) {
        let anchor = match font.anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let baseline = match font.baseline {
            Baseline::Auto => "auto",
            Baseline::Central => "central",
            Baseline::Hanging => "hanging",
        };
        let _ = write!(
            self.body,
            r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="{:.1}" fill="{}" text-anchor="{anchor}" dominant-baseline="{baseline}""#,
            font.size, font.color
        );
        if font.bold {
            self.body.push_str(r#" font-weight="bold""#);
        }
        if let Some(angle) = rotate {
            let _ = write!(self.body, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#);
        }
        self.body.push('>');
        for ch in content.chars() {
            match ch {
                '<' => self.body.push_str("&lt;"),
                '>' => self.body.push_str("&gt;"),
                '&' => self.body.push_str("&amp;"),
                '"' => self.body.push_str("&quot;"),
                _ => self.body.push(ch),
            }
        }
        self.body.push_str("</text>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_forms() {
        assert_eq!("#1D4ED8".parse::<Color>(), Ok(Color::rgb(0x1D, 0x4E, 0xD8)));
        assert_eq!("#0f0".parse::<Color>(), Ok(Color::rgb(0, 255, 0)));
        assert_eq!("Red".parse::<Color>(), Ok(Color::RED));
        assert_eq!(Color::rgb(29, 78, 216).to_string(), "#1d4ed8");
        for bad in ["#12", "12ab56", "#zzzzzz", "#ééé"] {
            assert!(bad.parse::<Color>().is_err(), "{bad}");
        }
    }

    #[test]
    fn empty_document() {
        let svg = Svg::new(100.0, 50.0).finish();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50""#));
        assert!(!svg.contains("<defs>"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn labels_are_escaped() {
        let mut svg = Svg::new(200.0, 100.0);
        svg.text((10.0, 20.0), "Ratio (C1C2C3 / C2C3) <&>", &Font::new(10.0));
        assert!(svg.finish().contains("Ratio (C1C2C3 / C2C3) &lt;&amp;&gt;"));
    }

    #[test]
    fn clip_group_wraps_only_its_elements() {
        let mut svg = Svg::new(200.0, 100.0);
        svg.clip_to(0.0, 0.0, 50.0, 50.0);
        svg.line((0.0, 0.0), (100.0, 100.0), &Stroke::new(Color::RED, 1.0).dash(Dash::Dashed));
        svg.unclip();
        svg.dot((5.0, 5.0), 1.0, Color::BLACK);
        let out = svg.finish();
        assert!(out.contains(r#"<clipPath id="clip0">"#));
        assert!(out.contains("<g clip-path=\"url(#clip0)\">\n<line"));
        assert!(out.contains(r##"stroke="#d62728" stroke-width="1.00" stroke-dasharray="6 3""##));
        assert!(out.contains("</g>\n<circle"));
    }

    #[test]
    fn unbalanced_clip_is_closed_on_finish() {
        let mut svg = Svg::new(10.0, 10.0);
        svg.clip_to(0.0, 0.0, 5.0, 5.0);
        svg.polyline(&[(1.0, 1.0)], &Stroke::new(Color::BLACK, 1.0));
        let out = svg.finish();
        assert!(!out.contains("polyline"));
        assert_eq!(out.matches("<g ").count(), out.matches("</g>").count());
    }

    #[test]
    fn translucent_grid_stroke() {
        let mut svg = Svg::new(10.0, 10.0);
        let grid = Stroke::new(Color::SLATE, 0.5).dash(Dash::Grid).opacity(0.55);
        svg.line((0.0, 5.0), (10.0, 5.0), &grid);
        let out = svg.finish();
        assert!(out.contains(r#"stroke-dasharray="3 3" stroke-opacity="0.550""#));
    }
}
