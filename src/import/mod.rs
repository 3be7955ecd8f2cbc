//! Importing a replacement image into an existing document slot.
//!
//! A slot is whatever image the document wants replaced (a sprite, a tileset,
//! a font). What the import may change depends on the slot's capabilities:
//!
//! - A multi-frame slot accepts a single sheet image, which is cut back into
//!   tiles using the slot's own frame sizes.
//! - A slot whose palette is fixed gets the incoming pixels remapped onto its
//!   palette with [`nearest_color_map`]; otherwise the incoming palette is
//!   adopted.
//!
//! The slot's animation sequence always survives the import.

mod palette_remap;

pub use palette_remap::{apply_remap, color_distance, nearest_color_map, remap_image};

use thiserror::Error;

use crate::models::Image;
use crate::spritesheet::{split_sheet, ConvertError};

/// What the document allows an import to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotCapabilities {
    pub palette_writable: bool,
}

/// Errors that abort an import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Incoming image has an empty palette")]
    EmptyPalette,
    #[error("Cannot cut sheet into tiles: {0}")]
    Convert(#[from] ConvertError),
}

/// Build the replacement for `slot` from `incoming`.
///
/// # Examples
///
/// ```
/// use image::Rgba;
/// use tileview::import::{import_image, SlotCapabilities};
/// use tileview::models::{Frame, Image, Palette};
///
/// let slot = Image::new(2, 1, vec![Frame::new(vec![0, 1])],
///     Palette::new(vec![Rgba([0, 0, 0, 255]), Rgba([255, 255, 255, 255])]));
/// let incoming = Image::new(2, 1, vec![Frame::new(vec![0, 1])],
///     Palette::new(vec![Rgba([250, 250, 250, 255]), Rgba([3, 3, 3, 255])]));
///
/// let fixed = SlotCapabilities { palette_writable: false };
/// let result = import_image(&slot, &incoming, fixed).unwrap();
/// assert_eq!(result.frames()[0].pixels, vec![1, 0]);
/// assert_eq!(result.palette(), slot.palette());
/// ```
pub fn import_image(slot: &Image, incoming: &Image, caps: SlotCapabilities) -> Result<Image, ImportError> {
    if incoming.palette().is_empty() {
        return Err(ImportError::EmptyPalette);
    }

    let is_sheet_for_tiles = slot.frames().len() > 1 && incoming.frames().len() == 1;
    let replacement = if is_sheet_for_tiles {
        tracing::debug!(tiles = slot.frames().len(), "splitting imported sheet into tiles");
        let tiles = split_sheet(slot, incoming)?;
        tiles.with_palette(incoming.palette().clone())
    } else {
        slot.clone()
            .with_size(incoming.width, incoming.height)
            .with_frames(incoming.frames().to_vec())
            .with_palette(incoming.palette().clone())
    };

    if caps.palette_writable {
        Ok(replacement)
    } else {
        Ok(remap_image(&replacement, slot.palette()))
    }
}
