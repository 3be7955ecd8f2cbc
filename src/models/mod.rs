//! Document data model: palettes, indexed images and tile maps
//!
//! These values are produced by the external codec layer and handed to the
//! renderer and compositor. They are read-only from the renderer's point of
//! view; edits go through copy-on-write methods that stamp a new [`Version`].

mod core;
mod map;
mod palette;
mod raster;

pub use core::{Version, Warning};
pub use map::{Item, Layer, ListLayer, Map, Resolution, TileCode, TileResolver, TileTable, TiledLayer};
pub use palette::{Palette, PaletteError};
pub use raster::{AnimationStep, Frame, FrameSize, Image};
