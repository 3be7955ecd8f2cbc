//! Palette type and copy-on-write palette edits.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::core::Version;
use crate::color::{parse_hex_color, Color, ColorError};
use image::Rgba;

/// Error returned by palette edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// Entry index past the end of the palette
    #[error("palette index {index} is out of range (palette has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
    /// Component index other than 0 (R), 1 (G), 2 (B), 3 (A)
    #[error("colour component {0} does not exist, expected 0-3")]
    InvalidComponent(usize),
    /// Entry text is not a complete `#RRGGBBAA` value
    #[error("'{0}' is not a complete #RRGGBBAA colour")]
    IncompleteEntry(String),
    /// Replacement palette had no entries
    #[error("the replacement has no palette to import")]
    EmptyReplacement,
    /// Hex digits could not be parsed
    #[error(transparent)]
    Color(#[from] ColorError),
}

/// An ordered list of RGBA colors, addressed by index.
///
/// A pixel's only identity is its index into this list. Edits never mutate a
/// palette in place: every edit returns a new palette with a new [`Version`].
///
/// # Examples
///
/// ```
/// use tileview::models::Palette;
/// use image::Rgba;
///
/// let pal = Palette::new(vec![Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255])]);
/// let edited = pal.with_component(1, 3, 128).unwrap();
///
/// assert_eq!(pal.get(1), Some(Rgba([255, 255, 255, 255])));
/// assert_eq!(edited.get(1), Some(Rgba([255, 255, 255, 128])));
/// assert_ne!(pal.version(), edited.version());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    #[serde(serialize_with = "serialize_colors", deserialize_with = "deserialize_colors")]
    colors: Vec<Color>,
    #[serde(skip)]
    version: Version,
}

impl PartialEq for Palette {
    fn eq(&self, other: &Self) -> bool {
        self.colors == other.colors
    }
}

impl Eq for Palette {}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors, version: Version::next() }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Look up one entry; `None` when the index is out of range.
    pub fn get(&self, index: usize) -> Option<Color> {
        self.colors.get(index).copied()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Return a copy with one channel of one entry replaced.
    ///
    /// `value` is clamped to 0..=255 the way a numeric text box would be.
    pub fn with_component(&self, index: usize, component: usize, value: i64) -> Result<Palette, PaletteError> {
        if component > 3 {
            return Err(PaletteError::InvalidComponent(component));
        }
        let mut colors = self.colors.clone();
        let entry = colors
            .get_mut(index)
            .ok_or(PaletteError::IndexOutOfRange { index, len: self.colors.len() })?;
        entry[component] = value.clamp(0, 255) as u8;
        Ok(Palette::new(colors))
    }

    /// Return a copy with one entry replaced from `#RRGGBBAA` text.
    ///
    /// Shorter forms are rejected: the user may still be typing.
    pub fn with_hex_entry(&self, index: usize, text: &str) -> Result<Palette, PaletteError> {
        if text.len() != 9 || !text.starts_with('#') {
            return Err(PaletteError::IncompleteEntry(text.to_string()));
        }
        let color = parse_hex_color(text)?;
        let mut colors = self.colors.clone();
        let entry = colors
            .get_mut(index)
            .ok_or(PaletteError::IndexOutOfRange { index, len: self.colors.len() })?;
        *entry = color;
        Ok(Palette::new(colors))
    }

    /// Adopt `replacement` as the new palette, truncated to this palette's length.
    pub fn import_replacement(&self, replacement: &Palette) -> Result<Palette, PaletteError> {
        if replacement.is_empty() {
            return Err(PaletteError::EmptyReplacement);
        }
        let keep = replacement.len().min(self.len());
        Ok(Palette::new(replacement.colors[..keep].to_vec()))
    }
}

fn serialize_colors<S: Serializer>(colors: &[Color], serializer: S) -> Result<S::Ok, S::Error> {
    let raw: Vec<[u8; 4]> = colors.iter().map(|c| c.0).collect();
    raw.serialize(serializer)
}

fn deserialize_colors<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Color>, D::Error> {
    let raw: Vec<[u8; 4]> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(Rgba).collect())
}
