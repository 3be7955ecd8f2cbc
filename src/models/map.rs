//! Tile maps: layers of tile codes resolved to images by the document.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::core::Version;
use super::raster::Image;

/// Opaque key stored in a layer, resolved to an image by the layer's resolver.
pub type TileCode = u32;

/// Outcome of resolving a tile code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The code draws this image
    Image(&'a Image),
    /// The code deliberately draws nothing
    Blank,
    /// The resolver has no answer for this code (a document defect)
    Unresolved,
}

/// Capability supplied by the document to turn tile codes into images.
pub trait TileResolver {
    fn resolve(&self, code: TileCode) -> Resolution<'_>;
}

/// A resolver backed by a lookup table.
///
/// Codes mapped to `None` are blank; codes absent from the table are unresolved.
#[derive(Debug, Clone, Default)]
pub struct TileTable {
    entries: HashMap<TileCode, Option<Image>>,
}

impl TileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: TileCode, image: Image) {
        self.entries.insert(code, Some(image));
    }

    pub fn insert_blank(&mut self, code: TileCode) {
        self.entries.insert(code, None);
    }

    pub fn with_image(mut self, code: TileCode, image: Image) -> Self {
        self.insert(code, image);
        self
    }

    pub fn with_blank(mut self, code: TileCode) -> Self {
        self.insert_blank(code);
        self
    }
}

impl TileResolver for TileTable {
    fn resolve(&self, code: TileCode) -> Resolution<'_> {
        match self.entries.get(&code) {
            Some(Some(image)) => Resolution::Image(image),
            Some(None) => Resolution::Blank,
            None => Resolution::Unresolved,
        }
    }
}

/// A layer laid out as a grid of fixed-size tiles.
///
/// `tiles[y][x]` holds the code for each cell; `None` means "no tile".
#[derive(Clone)]
pub struct TiledLayer {
    pub tile_width: u32,
    pub tile_height: u32,
    pub tiles: Vec<Vec<Option<TileCode>>>,
    resolver: Rc<dyn TileResolver>,
}

impl TiledLayer {
    pub fn new(
        tile_width: u32,
        tile_height: u32,
        tiles: Vec<Vec<Option<TileCode>>>,
        resolver: Rc<dyn TileResolver>,
    ) -> Self {
        Self { tile_width, tile_height, tiles, resolver }
    }

    pub fn resolve(&self, code: TileCode) -> Resolution<'_> {
        self.resolver.resolve(code)
    }

    /// Pixel size of the grid.
    pub fn extent(&self) -> (u32, u32) {
        let columns = self.tiles.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let rows = self.tiles.len() as u32;
        (columns * self.tile_width, rows * self.tile_height)
    }
}

impl fmt::Debug for TiledLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiledLayer")
            .field("tile_width", &self.tile_width)
            .field("tile_height", &self.tile_height)
            .field("tiles", &self.tiles)
            .finish_non_exhaustive()
    }
}

/// A freely placed sprite in a list layer.
///
/// The attach fractions choose which point of the sprite lands on `(x, y)`:
/// 0 anchors the left/top edge, 1 the right/bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Item {
    pub code: Option<TileCode>,
    pub x: i32,
    pub y: i32,
    pub x_attach: f32,
    pub y_attach: f32,
}

impl Item {
    pub fn new(code: TileCode, x: i32, y: i32) -> Self {
        Self { code: Some(code), x, y, x_attach: 0.0, y_attach: 0.0 }
    }

    pub fn attached(mut self, x_attach: f32, y_attach: f32) -> Self {
        self.x_attach = x_attach;
        self.y_attach = y_attach;
        self
    }
}

/// A layer of freely placed items.
#[derive(Clone)]
pub struct ListLayer {
    pub items: Vec<Item>,
    resolver: Rc<dyn TileResolver>,
}

impl ListLayer {
    pub fn new(items: Vec<Item>, resolver: Rc<dyn TileResolver>) -> Self {
        Self { items, resolver }
    }

    pub fn resolve(&self, code: TileCode) -> Resolution<'_> {
        self.resolver.resolve(code)
    }
}

impl fmt::Debug for ListLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListLayer").field("items", &self.items).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Layer {
    Tiled(TiledLayer),
    List(ListLayer),
}

/// An ordered stack of layers, drawn bottom (index 0) to top.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use tileview::models::{Layer, Map, TileTable, TiledLayer};
///
/// let layer = TiledLayer::new(8, 8, vec![vec![Some(1), None, None]], Rc::new(TileTable::new()));
/// let map = Map::new(vec![Layer::Tiled(layer)]);
/// assert_eq!(map.extent(), (24, 8));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Map {
    layers: Vec<Layer>,
    size: Option<(u32, u32)>,
    animation_delay_ms: Option<u32>,
    version: Version,
}

impl Map {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers, size: None, animation_delay_ms: None, version: Version::next() }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Delay between animation ticks; `None` draws the map once.
    pub fn animation_delay_ms(&self) -> Option<u32> {
        self.animation_delay_ms
    }

    /// Canvas size: the explicit size if set, else the largest tiled layer.
    ///
    /// Each axis is at least 1.
    pub fn extent(&self) -> (u32, u32) {
        let (w, h) = self.size.unwrap_or_else(|| {
            self.layers
                .iter()
                .filter_map(|layer| match layer {
                    Layer::Tiled(tiled) => Some(tiled.extent()),
                    Layer::List(_) => None,
                })
                .fold((0, 0), |(w, h), (lw, lh)| (w.max(lw), h.max(lh)))
        });
        (w.max(1), h.max(1))
    }

    pub fn with_layers(mut self, layers: Vec<Layer>) -> Self {
        self.layers = layers;
        self.version = Version::next();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self.version = Version::next();
        self
    }

    pub fn with_animation_delay(mut self, delay_ms: u32) -> Self {
        self.animation_delay_ms = Some(delay_ms);
        self.version = Version::next();
        self
    }
}
