use ms_viz::HistogramArtifact;

use crate::config::VizConfig;
use crate::header::draw_header;
use crate::layout::{Frame, Scale};
use crate::plots::axes_draw::{draw_axes, draw_hline};
use crate::plots::empty_svg;
use crate::svg::{Anchor, Dash, Font, Stroke, Svg};

const FIT_SAMPLES: usize = 200;

/// Step outline with per-bin error bars. Undefined (`null`) bins break the
/// outline and get no error bar. An attached curve fit is overlaid over its
/// fit range and labelled with its lifetime or precession frequency.
pub fn render(artifact: &HistogramArtifact, config: &VizConfig) -> crate::Result<String> {
    let n = artifact.values.len();
    let edges = &artifact.bin_edges;
    if n == 0 || edges.len() != n + 1 {
        return Ok(empty_svg("No histogram data"));
    }
    let centers = artifact.bin_centers();
    let err = |i: usize| artifact.errors.get(i).copied().flatten().unwrap_or(0.0);

    let (y_lo, y_hi) = artifact
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (v - err(i), v + err(i))))
        .fold((0.0_f64, 0.0_f64), |(a, b), (lo, hi)| (a.min(lo), b.max(hi)));
    let y_hi = if y_hi == y_lo { y_lo + 1.0 } else { y_hi };
    let x = Scale::linear(edges[0], edges[n]).titled(&artifact.x_label);
    let y = Scale::linear(y_lo, y_hi * 1.05).titled(&artifact.y_label);

    let mut svg = Svg::new(config.figure.width, config.figure.height);
    let frame = Frame::fit(&svg, &x, &y, config);
    draw_header(&mut svg, &frame, &artifact.title, config);
    draw_axes(&mut svg, &frame, &x, &y, config);

    svg.clip_to(frame.left, frame.top, frame.width(), frame.height());

    if y.lo < 0.0 {
        let zero = Stroke::new(config.colors.zero_line, 0.8).dash(Dash::Dotted);
        draw_hline(&mut svg, &frame, &y, 0.0, &zero);
    }

    // One outline per run of defined bins.
    let outline = Stroke::new(config.colors.histogram, 1.2);
    let mut steps: Vec<(f64, f64)> = Vec::new();
    for (i, v) in artifact.values.iter().enumerate() {
        if let Some(v) = *v {
            let py = frame.py(&y, v);
            steps.extend([(frame.px(&x, edges[i]), py), (frame.px(&x, edges[i + 1]), py)]);
        } else {
            svg.polyline(&steps, &outline);
            steps.clear();
        }
    }
    svg.polyline(&steps, &outline);

    let bar = Stroke::new(config.colors.histogram, config.markers.line_width);
    for (i, v) in artifact.values.iter().enumerate() {
        if let Some(v) = *v
            && err(i) > 0.0
        {
            let px = frame.px(&x, centers[i]);
            svg.error_bar(px, frame.py(&y, v - err(i)), frame.py(&y, v + err(i)), 0.0, &bar);
        }
    }

    if let Some(fit) = &artifact.fit {
        let t0 = fit.range.0.max(edges[0]);
        let t1 = fit.range.1.min(edges[n]);
        if t1 > t0 {
            let curve: Vec<(f64, f64)> = (0..=FIT_SAMPLES)
                .map(|k| t0 + (t1 - t0) * k as f64 / FIT_SAMPLES as f64)
                .map(|t| (frame.px(&x, t), frame.py(&y, fit.eval(t))))
                .collect();
            svg.polyline(&curve, &Stroke::new(config.colors.fit, 1.5));
        }
    }

    svg.unclip();

    if let Some(fit) = &artifact.fit {
        let label = match (fit.lifetime(), fit.parameter("angular_frequency")) {
            (Some((tau, err)), _) => Some(format!("\u{03C4} = {tau:.1} \u{00B1} {err:.1} ns")),
            (None, Some(w)) => {
                Some(format!("\u{03C9} = {:.3e} \u{00B1} {:.1e} rad/ns", w.value, w.error))
            }
            (None, None) => None,
        };
        if let Some(label) = label {
            let font = Font::new(config.font.tick_size).color(config.colors.fit).anchor(Anchor::End);
            svg.text((frame.right - 6.0, frame.top + 14.0), &label, &font);
        }
    }

    Ok(svg.finish())
}
