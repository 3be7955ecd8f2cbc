//! Color values and hex notation
//!
//! Palette entries are plain RGBA quadruples. The only textual form the editor
//! deals with is hex notation:
//! - `#RGB`, `#RGBA` (each digit doubled)
//! - `#RRGGBB` (alpha defaults to 255)
//! - `#RRGGBBAA`

use image::Rgba;
use thiserror::Error;

/// One palette entry: red, green, blue, alpha.
pub type Color = Rgba<u8>;

/// Opaque magenta, painted wherever real data could not be resolved.
pub const DIAGNOSTIC: Color = Rgba([255, 0, 255, 255]);

/// Fully transparent black, the initial content of every bitmap.
pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Input string doesn't start with '#'
    #[error("color must start with '#'")]
    MissingHash,
    /// Invalid length (must be 3, 4, 6, or 8 hex chars after #)
    #[error("invalid color length {0}, expected 3, 4, 6, or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// Parse a hex color string into an RGBA color.
///
/// # Examples
///
/// ```
/// use tileview::color::parse_hex_color;
///
/// assert_eq!(parse_hex_color("#F00").unwrap(), image::Rgba([255, 0, 0, 255]));
/// assert_eq!(parse_hex_color("#00FF0080").unwrap(), image::Rgba([0, 255, 0, 128]));
/// assert!(parse_hex_color("red").is_err());
/// ```
pub fn parse_hex_color(s: &str) -> Result<Color, ColorError> {
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    let hex = s.strip_prefix('#').ok_or(ColorError::MissingHash)?;

    let digits = hex.chars().map(parse_hex_digit).collect::<Result<Vec<u8>, _>>()?;

    match digits.as_slice() {
        [r, g, b] => Ok(Rgba([r * 17, g * 17, b * 17, 255])),
        [r, g, b, a] => Ok(Rgba([r * 17, g * 17, b * 17, a * 17])),
        [r1, r0, g1, g0, b1, b0] => Ok(Rgba([r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0, 255])),
        [r1, r0, g1, g0, b1, b0, a1, a0] => {
            Ok(Rgba([r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0, a1 * 16 + a0]))
        }
        _ => Err(ColorError::InvalidLength(digits.len())),
    }
}

/// Format a color as `#RRGGBBAA`.
pub fn to_hex(color: Color) -> String {
    format!("#{:02X}{:02X}{:02X}{:02X}", color[0], color[1], color[2], color[3])
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}
