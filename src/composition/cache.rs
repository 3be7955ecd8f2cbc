//! Per-layer tile bitmap cache

use image::RgbaImage;
use std::collections::HashMap;

use crate::models::TileCode;

/// What a tile code draws, computed once per cache lifetime.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedTile {
    /// Resolver said "no tile": draw nothing
    Blank,
    /// Resolver had no answer on a grid layer: draw the magenta placeholder
    Diagnostic(RgbaImage),
    /// Resolver had no answer on a list layer: skip the item
    Missing,
    /// One bitmap per frame of the resolved image, never empty
    Frames(Vec<RgbaImage>),
}

impl CachedTile {
    /// Bitmap to draw on `tick`, cycling through the frames.
    pub fn bitmap_for_tick(&self, tick: usize) -> Option<&RgbaImage> {
        match self {
            CachedTile::Blank | CachedTile::Missing => None,
            CachedTile::Diagnostic(bitmap) => Some(bitmap),
            CachedTile::Frames(frames) => frames.get(tick % frames.len()),
        }
    }
}

/// Tile code -> bitmaps for one layer.
///
/// Entries are immutable once inserted. The cache is never partially
/// invalidated; the compositor drops it wholesale when the map changes.
#[derive(Debug, Clone, Default)]
pub struct TileBitmapCache {
    entries: HashMap<TileCode, CachedTile>,
}

impl TileBitmapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: TileCode) -> Option<&CachedTile> {
        self.entries.get(&code)
    }

    /// Return the entry for `code`, building it with `load` on first sight.
    pub fn get_or_load(&mut self, code: TileCode, load: impl FnOnce() -> CachedTile) -> &CachedTile {
        self.entries.entry(code).or_insert_with(load)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
