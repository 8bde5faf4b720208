use crate::config::VizConfig;
use crate::layout::{Frame, Scale};
use crate::svg::{Anchor, Baseline, Color, Dash, Font, Stroke, Svg};
use crate::text::text_width;

/// Boxed frame with ticks on all four sides, optional grid, tick labels and
/// axis titles.
pub fn draw_axes(svg: &mut Svg, frame: &Frame, x: &Scale, y: &Scale, config: &VizConfig) {
    let axes = &config.axes;
    let border = Stroke::new(Color::BLACK, 0.8);
    let major = Stroke::new(Color::BLACK, 0.6);
    let minor = Stroke::new(Color::BLACK, 0.4);
    let grid = Stroke::new(config.grid.color, 0.5).dash(Dash::Grid).opacity(config.grid.alpha);

    // Positive lengths point into the frame.
    let inward = if axes.tick_direction == "in" { 1.0 } else { -1.0 };
    let major_len = axes.tick_length * inward;
    let minor_len = axes.minor_tick_length * inward;
    let outside = major_len.min(0.0).abs();

    let (l, r, t, b) = (frame.left, frame.right, frame.top, frame.bottom);
    for (from, to) in [((l, t), (r, t)), ((l, b), (r, b)), ((l, t), (l, b)), ((r, t), (r, b))] {
        svg.line(from, to, &border);
    }

    let tick_font = Font::new(config.font.tick_size);
    let x_font = tick_font.anchor(Anchor::Middle).baseline(Baseline::Hanging);
    let x_text_y = b + outside + 3.0;
    for tick in x.ticks.iter().filter(|tick| x.contains(tick.value)) {
        let px = frame.px(x, tick.value);
        if config.grid.show {
            svg.line((px, t), (px, b), &grid);
        }
        svg.line((px, b), (px, b - major_len), &major);
        if axes.show_top_ticks {
            svg.line((px, t), (px, t + major_len), &major);
        }
        svg.text((px, x_text_y), &tick.label, &x_font);
    }
    for &v in x.minor.iter().filter(|v| x.contains(**v)) {
        let px = frame.px(x, v);
        svg.line((px, b), (px, b - minor_len), &minor);
    }

    let y_font = tick_font.anchor(Anchor::End).baseline(Baseline::Central);
    let y_text_x = l - outside - 4.0;
    let mut widest = 0.0_f64;
    for tick in y.ticks.iter().filter(|tick| y.contains(tick.value)) {
        let py = frame.py(y, tick.value);
        if config.grid.show {
            svg.line((l, py), (r, py), &grid);
        }
        svg.line((l, py), (l + major_len, py), &major);
        if axes.show_right_ticks {
            svg.line((r, py), (r - major_len, py), &major);
        }
        svg.text((y_text_x, py), &tick.label, &y_font);
        widest = widest.max(text_width(&tick.label, &y_font));
    }
    for &v in y.minor.iter().filter(|v| y.contains(**v)) {
        let py = frame.py(y, v);
        svg.line((l, py), (l + minor_len, py), &minor);
    }

    let title_font = Font::new(config.font.label_size).anchor(Anchor::Middle);
    if !x.title.is_empty() {
        let ty = x_text_y + config.font.tick_size + config.font.label_size + 4.0;
        svg.text((l + frame.width() / 2.0, ty), &x.title, &title_font);
    }
    if !y.title.is_empty() {
        let tx = y_text_x - widest - config.font.label_size * 0.5 - 4.0;
        svg.vertical_text((tx, t + frame.height() / 2.0), &y.title, &title_font);
    }
}

/// Full-width horizontal line at `value`, skipped when off-scale.
pub fn draw_hline(svg: &mut Svg, frame: &Frame, y: &Scale, value: f64, stroke: &Stroke) {
    if y.contains(value) {
        let py = frame.py(y, value);
        svg.line((frame.left, py), (frame.right, py), stroke);
    }
}
