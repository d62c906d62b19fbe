//! Color parsing and formatting for the LED strip.
//!
//! Colors are plain RGB triples; the display driver owns any wire-order
//! concerns (GRB reordering, SPI encoding).

use crate::error::{Result, VolstripError};

/// One strip pixel, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// Parse a color string into an [`Rgb`].
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`,
///   `"purple"`, `"cyan"`, `"jade"`
pub fn parse_color(s: &str) -> Result<Rgb> {
    let s = s.trim();

    // Named colors
    match s.to_lowercase().as_str() {
        "red" => return Ok(Rgb::new(0xFF, 0x00, 0x00)),
        "green" => return Ok(Rgb::new(0x00, 0xFF, 0x00)),
        "blue" => return Ok(Rgb::new(0x00, 0x00, 0xFF)),
        "white" => return Ok(Rgb::new(0xFF, 0xFF, 0xFF)),
        "orange" => return Ok(Rgb::new(0xFF, 0x80, 0x00)),
        "yellow" => return Ok(Rgb::new(0xFF, 0xFF, 0x00)),
        "purple" => return Ok(Rgb::new(0x80, 0x00, 0xFF)),
        "cyan" => return Ok(Rgb::new(0x00, 0xFF, 0xFF)),
        "jade" => return Ok(Rgb::new(0x00, 0xFF, 0x28)),
        "off" | "black" => return Ok(Rgb::BLACK),
        _ => {}
    }

    // Hex color
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(VolstripError::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    let val = u32::from_str_radix(hex, 16)
        .map_err(|_| VolstripError::Color(format!("Invalid hex color: {s}")))?;
    Ok(Rgb::new(
        ((val >> 16) & 0xFF) as u8,
        ((val >> 8) & 0xFF) as u8,
        (val & 0xFF) as u8,
    ))
}

/// Format an [`Rgb`] as `#RRGGBB`.
pub fn format_color(c: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", c.r, c.g, c.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_color ──

    #[test]
    fn parse_named_red() {
        assert_eq!(parse_color("red").unwrap(), Rgb::new(0xFF, 0, 0));
    }

    #[test]
    fn parse_named_jade() {
        assert_eq!(parse_color("jade").unwrap(), Rgb::new(0, 0xFF, 0x28));
    }

    #[test]
    fn parse_named_off() {
        assert_eq!(parse_color("off").unwrap(), Rgb::BLACK);
        assert_eq!(parse_color("black").unwrap(), Rgb::BLACK);
    }

    #[test]
    fn parse_named_case_insensitive() {
        assert_eq!(parse_color("RED").unwrap(), Rgb::new(0xFF, 0, 0));
        assert_eq!(parse_color("Red").unwrap(), Rgb::new(0xFF, 0, 0));
        assert_eq!(parse_color("  red  ").unwrap(), Rgb::new(0xFF, 0, 0));
    }

    #[test]
    fn parse_hex_with_hash() {
        assert_eq!(parse_color("#FF0000").unwrap(), Rgb::new(0xFF, 0, 0));
        assert_eq!(parse_color("#00FF00").unwrap(), Rgb::new(0, 0xFF, 0));
        assert_eq!(parse_color("#0000FF").unwrap(), Rgb::new(0, 0, 0xFF));
    }

    #[test]
    fn parse_hex_without_hash() {
        assert_eq!(parse_color("ABCDEF").unwrap(), Rgb::new(0xAB, 0xCD, 0xEF));
    }

    #[test]
    fn parse_hex_lowercase() {
        assert_eq!(parse_color("#ff8000").unwrap(), Rgb::new(0xFF, 0x80, 0));
    }

    #[test]
    fn parse_invalid_short() {
        assert!(parse_color("#FFF").is_err());
    }

    #[test]
    fn parse_invalid_long() {
        assert!(parse_color("#FF000000").is_err());
    }

    #[test]
    fn parse_invalid_name() {
        assert!(parse_color("chartreuse").is_err());
    }

    #[test]
    fn parse_invalid_hex_chars() {
        assert!(parse_color("#GGHHII").is_err());
    }

    // ── format_color ──

    #[test]
    fn format_red() {
        assert_eq!(format_color(Rgb::new(0xFF, 0, 0)), "#FF0000");
    }

    #[test]
    fn format_black() {
        assert_eq!(format_color(Rgb::BLACK), "#000000");
    }

    // ── round-trip ──

    #[test]
    fn parse_format_roundtrip() {
        for name in &[
            "red", "green", "blue", "white", "orange", "yellow", "purple", "cyan", "jade",
        ] {
            let val = parse_color(name).unwrap();
            let hex = format_color(val);
            let val2 = parse_color(&hex).unwrap();
            assert_eq!(val, val2, "round-trip failed for {name}");
        }
    }
}
