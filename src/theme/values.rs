//! Attribute value grammar: colors, number lists and enumerations.

use winnow::ascii::{float, space0};
use winnow::combinator::{delimited, preceded, separated};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::render::{Color, FontFamily, FontStyle, LineCap, LineJoin, ScaleMode};

// Parser result with winnow's default context error.
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

fn hex_digits<'i>(input: &mut &'i str) -> PResult<&'i str> {
    preceded('#', take_while(1.., |c: char| c.is_ascii_hexdigit())).parse_next(input)
}

fn number(input: &mut &str) -> PResult<f64> {
    delimited(space0, float, space0).parse_next(input)
}

fn number_list(input: &mut &str) -> PResult<Vec<f64>> {
    separated(1.., number, ',').parse_next(input)
}

/// `#RRGGBB` or `#AARRGGBB`.
pub fn parse_color(value: &str) -> Option<Color> {
    let digits = hex_digits.parse(value.trim()).ok()?;
    let n = u32::from_str_radix(digits, 16).ok()?;
    let [a, r, g, b] = n.to_be_bytes();
    match digits.len() {
        6 => Some(Color::rgb(r, g, b)),
        8 => Some(Color::rgba(r, g, b, a)),
        _ => None,
    }
}

/// Comma separated list of positive lengths, e.g. a dash pattern.
pub fn parse_lengths(value: &str) -> Option<Vec<f64>> {
    let values = number_list.parse(value.trim()).ok()?;
    values
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
        .then_some(values)
}

pub fn parse_f64(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i32(value: &str) -> Option<i32> {
    value.trim().parse().ok()
}

/// Zoom levels above `max` are clamped.
pub fn parse_zoom(value: &str, max: u8) -> Option<u8> {
    let zoom: u32 = value.trim().parse().ok()?;
    Some(zoom.min(u32::from(max)) as u8)
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn parse_cap(value: &str) -> Option<LineCap> {
    match value {
        "butt" => Some(LineCap::Butt),
        "round" => Some(LineCap::Round),
        "square" => Some(LineCap::Square),
        _ => None,
    }
}

pub fn parse_join(value: &str) -> Option<LineJoin> {
    match value {
        "miter" => Some(LineJoin::Miter),
        "round" => Some(LineJoin::Round),
        "bevel" => Some(LineJoin::Bevel),
        _ => None,
    }
}

pub fn parse_scale(value: &str) -> Option<ScaleMode> {
    match value {
        "none" => Some(ScaleMode::None),
        "stroke" => Some(ScaleMode::Stroke),
        "all" => Some(ScaleMode::All),
        _ => None,
    }
}

pub fn parse_font_family(value: &str) -> Option<FontFamily> {
    match value.to_ascii_lowercase().as_str() {
        "default" => Some(FontFamily::Default),
        "monospace" => Some(FontFamily::Monospace),
        "sans_serif" => Some(FontFamily::SansSerif),
        "serif" => Some(FontFamily::Serif),
        _ => None,
    }
}

pub fn parse_font_style(value: &str) -> Option<FontStyle> {
    match value.to_ascii_lowercase().as_str() {
        "normal" => Some(FontStyle::Normal),
        "bold" => Some(FontStyle::Bold),
        "italic" => Some(FontStyle::Italic),
        "bold_italic" => Some(FontStyle::BoldItalic),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors() {
        assert_eq!(parse_color("#ff8000"), Some(Color::rgb(0xff, 0x80, 0x00)));
        assert_eq!(
            parse_color("#80ff8000"),
            Some(Color::rgba(0xff, 0x80, 0x00, 0x80))
        );
        assert_eq!(parse_color("ff8000"), None);
        assert_eq!(parse_color("#ff80"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn test_lengths() {
        assert_eq!(parse_lengths("5,3"), Some(vec![5.0, 3.0]));
        assert_eq!(parse_lengths(" 1.5 , 2 ,0.5"), Some(vec![1.5, 2.0, 0.5]));
        assert_eq!(parse_lengths("5,0"), None);
        assert_eq!(parse_lengths("5,"), None);
        assert_eq!(parse_lengths(""), None);
    }

    #[test]
    fn test_zoom() {
        assert_eq!(parse_zoom("14", 127), Some(14));
        assert_eq!(parse_zoom("300", 127), Some(127));
        assert_eq!(parse_zoom("-1", 127), None);
    }

    #[test]
    fn test_enumerations() {
        assert_eq!(parse_cap("butt"), Some(LineCap::Butt));
        assert_eq!(parse_join("bevel"), Some(LineJoin::Bevel));
        assert_eq!(parse_scale("all"), Some(ScaleMode::All));
        assert_eq!(parse_scale("some"), None);
        assert_eq!(parse_font_style("BOLD_ITALIC"), Some(FontStyle::BoldItalic));
        assert_eq!(parse_font_family("sans_serif"), Some(FontFamily::SansSerif));
        assert_eq!(parse_bool("true"), Some(true));
    }
}
