//! Map compositing: layers of tile codes onto a surface

use image::RgbaImage;

use crate::color::DIAGNOSTIC;
use crate::config::RenderConfig;
use crate::models::{Image, Layer, ListLayer, Map, Resolution, TileCode, TiledLayer, Version, Warning};
use crate::renderer::{logical_extent, rasterize};
use crate::surface::RasterSurface;

use super::cache::{CachedTile, TileBitmapCache};
use super::report::{CompositeReport, FailureLog};

/// Default cap on draw-failure diagnostics per pass.
pub const DEFAULT_MAX_LOGGED_FAILURES: usize = 5;

/// Redraws a map onto a surface, caching tile bitmaps between passes.
///
/// Every pass clears the surface and repaints all layers bottom to top. One
/// tick value drives every layer, so animated tiles stay in step.
///
/// The caches belong to one map version. Passing a map with a different
/// [`Version`] throws all of them away and starts over.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use image::Rgba;
/// use tileview::composition::MapCompositor;
/// use tileview::models::{Frame, Image, Layer, Map, Palette, TileTable, TiledLayer};
/// use tileview::surface::{ImageSurface, RasterSurface};
///
/// let palette = Palette::new(vec![Rgba([0, 0, 0, 0]), Rgba([0, 255, 0, 255])]);
/// let grass = Image::new(2, 2, vec![Frame::new(vec![1; 4])], palette);
/// let table = Rc::new(TileTable::new().with_image(5, grass));
/// let map = Map::new(vec![Layer::Tiled(TiledLayer::new(2, 2, vec![vec![Some(5), None]], table))]);
///
/// let (w, h) = map.extent();
/// let mut surface = ImageSurface::new(w, h);
/// let mut compositor = MapCompositor::new();
/// let report = compositor.composite(&map, 0, &mut surface);
///
/// assert_eq!(report.painted, 1);
/// assert_eq!(*surface.image().get_pixel(0, 0), Rgba([0, 255, 0, 255]));
/// assert_eq!(*surface.image().get_pixel(2, 0), Rgba([0, 0, 0, 0]));
/// ```
#[derive(Debug)]
pub struct MapCompositor {
    map_version: Option<Version>,
    caches: Vec<TileBitmapCache>,
    max_logged_failures: usize,
}

impl Default for MapCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl MapCompositor {
    pub fn new() -> Self {
        Self { map_version: None, caches: Vec::new(), max_logged_failures: DEFAULT_MAX_LOGGED_FAILURES }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self { max_logged_failures: config.compositor.max_logged_failures, ..Self::new() }
    }

    /// Cache for layer `index`, if a pass has built one.
    pub fn cache(&self, index: usize) -> Option<&TileBitmapCache> {
        self.caches.get(index)
    }

    /// Drop every cached bitmap.
    pub fn invalidate(&mut self) {
        self.map_version = None;
        self.caches.clear();
    }

    /// Clear `surface` and draw every layer of `map` for `tick`.
    pub fn composite<S: RasterSurface + ?Sized>(&mut self, map: &Map, tick: usize, surface: &mut S) -> CompositeReport {
        if self.map_version != Some(map.version()) || self.caches.len() != map.layers().len() {
            tracing::debug!(version = %map.version(), layers = map.layers().len(), "rebuilding tile caches");
            self.map_version = Some(map.version());
            self.caches = map.layers().iter().map(|_| TileBitmapCache::new()).collect();
        }

        let mut report = CompositeReport::default();
        let mut failures = FailureLog::new(self.max_logged_failures);

        surface.clear();
        for (index, (layer, cache)) in map.layers().iter().zip(self.caches.iter_mut()).enumerate() {
            match layer {
                Layer::Tiled(tiled) => draw_tiled(index, tiled, cache, tick, surface, &mut report, &mut failures),
                Layer::List(list) => draw_list(index, list, cache, tick, surface, &mut report, &mut failures),
            }
        }

        failures.finish(&mut report);
        report
    }
}

fn draw_tiled<S: RasterSurface + ?Sized>(
    index: usize,
    layer: &TiledLayer,
    cache: &mut TileBitmapCache,
    tick: usize,
    surface: &mut S,
    report: &mut CompositeReport,
    failures: &mut FailureLog,
) {
    for (y, row) in layer.tiles.iter().enumerate() {
        let pixel_y = y as i64 * layer.tile_height as i64;
        for (x, cell) in row.iter().enumerate() {
            let Some(code) = *cell else { continue };
            let pixel_x = x as i64 * layer.tile_width as i64;

            let tile = cache.get_or_load(code, || load_grid_tile(index, layer, code, &mut report.warnings));
            let Some(bitmap) = tile.bitmap_for_tick(tick) else { continue };

            match surface.put_block(bitmap, clamp_coord(pixel_x), clamp_coord(pixel_y)) {
                Ok(()) => report.painted += 1,
                Err(err) => failures.record(index, &err, report),
            }
        }
    }
}

fn draw_list<S: RasterSurface + ?Sized>(
    index: usize,
    layer: &ListLayer,
    cache: &mut TileBitmapCache,
    tick: usize,
    surface: &mut S,
    report: &mut CompositeReport,
    failures: &mut FailureLog,
) {
    for item in &layer.items {
        let Some(code) = item.code else { continue };

        let tile = cache.get_or_load(code, || match layer.resolve(code) {
            Resolution::Image(image) => rasterize_frames(image),
            Resolution::Blank => CachedTile::Blank,
            Resolution::Unresolved => CachedTile::Missing,
        });
        let Some(bitmap) = tile.bitmap_for_tick(tick) else { continue };

        // Attach offsets use the first frame so animated sprites stay anchored
        let (anchor_w, anchor_h) = match tile {
            CachedTile::Frames(frames) => frames[0].dimensions(),
            _ => bitmap.dimensions(),
        };
        let x = attach_position(item.x, anchor_w, item.x_attach);
        let y = attach_position(item.y, anchor_h, item.y_attach);

        match surface.put_block(bitmap, clamp_coord(x), clamp_coord(y)) {
            Ok(()) => report.painted += 1,
            Err(err) => failures.record(index, &err, report),
        }
    }
}

fn load_grid_tile(index: usize, layer: &TiledLayer, code: TileCode, warnings: &mut Vec<Warning>) -> CachedTile {
    match layer.resolve(code) {
        Resolution::Image(image) => rasterize_frames(image),
        Resolution::Blank => CachedTile::Blank,
        Resolution::Unresolved => {
            tracing::error!(layer = index, code, "tile resolver returned no image for tile code");
            warnings.push(Warning::new(format!(
                "Layer {}: no image for tile code {}, drawing placeholder",
                index, code
            )));
            let (w, h) = logical_extent(layer.tile_width, layer.tile_height);
            CachedTile::Diagnostic(RgbaImage::from_pixel(w, h, DIAGNOSTIC))
        }
    }
}

fn rasterize_frames(image: &Image) -> CachedTile {
    let frames: Vec<RgbaImage> = image
        .frames()
        .iter()
        .map(|frame| rasterize(frame, image.palette(), image.default_size()))
        .collect();
    if frames.is_empty() {
        CachedTile::Blank
    } else {
        CachedTile::Frames(frames)
    }
}

/// Draw position for an anchor and attach fraction: 0 keeps the left/top
/// edge at the anchor, 1 puts the right/bottom edge there.
/// The shifted position is truncated toward zero.
fn attach_position(anchor: i32, size: u32, fraction: f32) -> i64 {
    if fraction > 0.0 {
        (anchor as f64 - size as f64 * fraction as f64).trunc() as i64
    } else {
        anchor as i64
    }
}

fn clamp_coord(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
