use crate::svg::Font;

/// Approximate rendered width in points for a proportional sans-serif face.
///
/// No font is embedded, so widths come from per-class advance estimates
/// (em fractions) rather than glyph tables.
pub fn text_width(text: &str, font: &Font) -> f64 {
    let em: f64 = text.chars().map(advance).sum();
    let bold = if font.bold { 1.07 } else { 1.0 };
    em * font.size * bold
}

fn advance(ch: char) -> f64 {
    match ch {
        ' ' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | 'i' | 'l' | 'j' => 0.28,
        '(' | ')' | '[' | ']' | 'f' | 't' | 'r' | '-' => 0.36,
        'm' | 'w' | 'M' | 'W' => 0.85,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii_digit() => 0.56,
        _ => 0.55,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_with_size() {
        let small = text_width("Hello", &Font::new(10.0));
        let large = text_width("Hello", &Font::new(20.0));
        assert!(small > 15.0);
        assert!((large - 2.0 * small).abs() < 1e-9);
    }

    #[test]
    fn bold_wider_than_regular() {
        let font = Font::new(10.0);
        assert!(text_width("Test", &font.bold()) > text_width("Test", &font));
    }

    #[test]
    fn empty_is_zero_width() {
        assert_eq!(text_width("", &Font::new(10.0)), 0.0);
    }
}
