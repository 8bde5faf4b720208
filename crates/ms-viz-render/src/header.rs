use crate::config::VizConfig;
use crate::layout::Frame;
use crate::svg::{Anchor, Color, Font, Svg};
use crate::text::text_width;

/// Draw the plot title (centered) and the optional lab label (left).
pub fn draw_header(svg: &mut Svg, frame: &Frame, title: &str, config: &VizConfig) {
    let y = frame.top - 8.0;

    if !title.is_empty() {
        let font = Font::new(config.font.title_size).anchor(Anchor::Middle);
        svg.text((frame.left + frame.width() / 2.0, y), title, &font);
    }

    let lab = &config.experiment;
    if lab.name.is_empty() {
        return;
    }
    let name_font = Font::new(config.font.label_size).bold();
    svg.text((frame.left, y), &lab.name, &name_font);
    if !lab.status.is_empty() {
        let x = frame.left + text_width(&lab.name, &name_font) + 5.0;
        let status_font = Font::new(config.font.label_size * 0.85).color(Color::rgb(80, 80, 80));
        svg.text((x, y), &lab.status, &status_font);
    }
}
