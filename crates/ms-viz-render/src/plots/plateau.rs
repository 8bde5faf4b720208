use ms_viz::PlateauCurveArtifact;

use crate::config::VizConfig;
use crate::header::draw_header;
use crate::layout::{Frame, Scale};
use crate::plots::axes_draw::draw_axes;
use crate::plots::empty_svg;
use crate::svg::{Dash, Font, Stroke, Svg};

/// Scatter of value versus voltage with asymmetric capped error bars and a
/// dashed operating-voltage marker.
pub fn render(artifact: &PlateauCurveArtifact, config: &VizConfig) -> crate::Result<String> {
    let n = artifact.x.len().min(artifact.y.len());
    if n == 0 {
        return Ok(empty_svg("No plateau data"));
    }
    let (xs, ys) = (&artifact.x[..n], &artifact.y[..n]);

    let err = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten().unwrap_or(0.0);
    let lo: Vec<f64> = (0..n).map(|i| ys[i] - err(&artifact.yerr_lo, i)).collect();
    let hi: Vec<f64> = (0..n).map(|i| ys[i] + err(&artifact.yerr_hi, i)).collect();

    let (x_min, x_max) = xs
        .iter()
        .chain(&artifact.peak)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &v| (a.min(v), b.max(v)));
    let pad = 0.05 * (x_max - x_min);
    let x = Scale::linear(x_min - pad, x_max + pad).titled(&artifact.x_label);

    let top = hi.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let smallest_positive =
        lo.iter().chain(ys).copied().filter(|v| *v > 0.0).fold(f64::INFINITY, f64::min);
    let y = if artifact.log_y && smallest_positive.is_finite() {
        Scale::log(smallest_positive, top)
    } else {
        Scale::linear(lo.iter().copied().fold(f64::INFINITY, f64::min), top)
    }
    .titled(&artifact.y_label);

    let mut svg = Svg::new(config.figure.width, config.figure.height);
    let frame = Frame::fit(&svg, &x, &y, config);
    draw_header(&mut svg, &frame, &artifact.title, config);
    draw_axes(&mut svg, &frame, &x, &y, config);

    svg.clip_to(frame.left, frame.top, frame.width(), frame.height());

    let bar = Stroke::new(config.colors.error_bars, config.markers.line_width);
    for i in 0..n {
        let px = frame.px(&x, xs[i]);
        // A bar reaching zero on a log scale stops at the axis floor.
        let bar_lo = frame.py(&y, lo[i].max(y.lo));
        svg.error_bar(px, bar_lo, frame.py(&y, hi[i]), config.markers.cap_width, &bar);
        svg.dot((px, frame.py(&y, ys[i])), config.markers.size, config.colors.points);
    }

    if let Some(peak) = artifact.peak {
        let px = frame.px(&x, peak);
        let marker = Stroke::new(config.colors.peak_line, 1.0).dash(Dash::Dashed);
        svg.line((px, frame.top), (px, frame.bottom), &marker);
        let font = Font::new(config.font.tick_size).color(config.colors.peak_line);
        svg.text((px + 3.0, frame.top + 12.0), &format!("{peak}"), &font);
    }

    svg.unclip();

    Ok(svg.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(log_y: bool, peak: Option<f64>) -> PlateauCurveArtifact {
        let json = serde_json::json!({
            "schema_version": "muonstat_plateau_v1",
            "kind": "rate",
            "scintillator": 1,
            "title": "Scintillator 1",
            "x_label": "Voltage",
            "y_label": "Rate (log)",
            "x": [1.30, 1.35, 1.40, 1.45],
            "y": [0.0, 120.0, 340.0, 360.0],
            "yerr_lo": [0.0, 10.9, 18.4, 19.0],
            "yerr_hi": [1.84, 12.0, 19.4, 20.0],
            "peak": peak,
            "log_y": log_y,
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn draws_points_bars_and_peak() {
        let svg = render(&artifact(true, Some(1.401)), &VizConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<circle").count(), 4);
        assert!(svg.contains("Scintillator 1"));
        assert!(svg.contains("Rate (log)"));
        assert!(svg.contains(r##"stroke="#d62728" stroke-width="1.00" stroke-dasharray="6 3""##));
        assert!(svg.contains(">1.401<"));
    }

    #[test]
    fn no_peak_no_dashed_marker() {
        let svg = render(&artifact(false, None), &VizConfig::default()).unwrap();
        assert!(!svg.contains("stroke-dasharray=\"6 3\""));
    }

    #[test]
    fn empty_artifact() {
        let mut art = artifact(false, None);
        art.x.clear();
        art.y.clear();
        let svg = render(&art, &VizConfig::default()).unwrap();
        assert!(svg.contains("No plateau data"));
    }
}
