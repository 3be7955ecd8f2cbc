//! Live previews: an animation driver wired to cached bitmaps and a surface
//!
//! A preview owns everything derived from the value it shows. The host calls
//! `sync` whenever the document may have changed and `on_timer` whenever a
//! scheduled token comes due. A change of version cancels the pending tick,
//! throws away the cached bitmaps, and starts playback over from the top.

use image::RgbaImage;

use crate::animation::{AnimationDriver, Playback, Scheduler, TickToken};
use crate::composition::{CompositeReport, MapCompositor};
use crate::config::RenderConfig;
use crate::models::{Image, Map, Version};
use crate::renderer::{canvas_extent, rasterize};
use crate::surface::RasterSurface;

struct PlacedBitmap {
    bitmap: RgbaImage,
    offset: (i32, i32),
}

/// Preview of one indexed image, animated through its step list.
///
/// # Examples
///
/// ```
/// use image::Rgba;
/// use tileview::animation::ManualScheduler;
/// use tileview::config::RenderConfig;
/// use tileview::models::{AnimationStep, Frame, Image, Palette};
/// use tileview::preview::ImagePreview;
/// use tileview::surface::ImageSurface;
///
/// let palette = Palette::new(vec![Rgba([255, 0, 0, 255]), Rgba([0, 0, 255, 255])]);
/// let image = Image::new(1, 1, vec![Frame::new(vec![0]), Frame::new(vec![1])], palette)
///     .with_animation(vec![AnimationStep::new(0, 100), AnimationStep::new(1, 100)]);
///
/// let mut scheduler = ManualScheduler::new();
/// let mut surface = ImageSurface::new(0, 0);
/// let mut preview = ImagePreview::new(&RenderConfig::default());
///
/// preview.sync(&image, &mut scheduler, &mut surface);
/// assert_eq!(*surface.image().get_pixel(0, 0), Rgba([255, 0, 0, 255]));
///
/// for token in scheduler.advance(100) {
///     preview.on_timer(token, &mut scheduler, &mut surface);
/// }
/// assert_eq!(*surface.image().get_pixel(0, 0), Rgba([0, 0, 255, 255]));
/// ```
pub struct ImagePreview {
    key: Option<(Version, Version)>,
    bitmaps: Vec<PlacedBitmap>,
    driver: AnimationDriver,
    shown: Option<usize>,
}

impl ImagePreview {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            key: None,
            bitmaps: Vec::new(),
            driver: AnimationDriver::new(Playback::Ticker { delay_ms: None }, config.animation.default_delay_ms),
            shown: None,
        }
    }

    /// Frame index drawn most recently.
    pub fn shown_frame(&self) -> Option<usize> {
        self.shown
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    /// Bring the preview up to date with `image`.
    ///
    /// Returns `true` when the image or its palette changed and playback was
    /// restarted.
    pub fn sync<S, R>(&mut self, image: &Image, scheduler: &mut S, surface: &mut R) -> bool
    where
        S: Scheduler + ?Sized,
        R: RasterSurface + ?Sized,
    {
        let key = (image.version(), image.palette().version());
        if self.key == Some(key) {
            return false;
        }

        self.driver.cancel(scheduler);
        self.key = Some(key);
        self.shown = None;
        self.bitmaps = image
            .frames()
            .iter()
            .map(|frame| PlacedBitmap {
                bitmap: rasterize(frame, image.palette(), image.default_size()),
                offset: frame.offset,
            })
            .collect();

        let (width, height) = canvas_extent(image);
        surface.resize(width, height);

        let Self { bitmaps, driver, shown, .. } = self;
        driver.restart(Playback::for_image(image), scheduler, |index| draw_frame(bitmaps, index, surface, shown));
        true
    }

    /// Advance playback for a token that came due.
    pub fn on_timer<S, R>(&mut self, token: TickToken, scheduler: &mut S, surface: &mut R) -> bool
    where
        S: Scheduler + ?Sized,
        R: RasterSurface + ?Sized,
    {
        let Self { bitmaps, driver, shown, .. } = self;
        driver.fire(token, scheduler, |index| draw_frame(bitmaps, index, surface, shown))
    }

    /// Cancel playback; the preview is being torn down.
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.driver.cancel(scheduler);
        self.key = None;
    }
}

fn draw_frame<R: RasterSurface + ?Sized>(
    bitmaps: &[PlacedBitmap],
    index: usize,
    surface: &mut R,
    shown: &mut Option<usize>,
) {
    // A step naming a frame that does not exist shows nothing new
    let Some(placed) = bitmaps.get(index) else { return };

    surface.clear();
    if let Err(err) = surface.put_block(&placed.bitmap, placed.offset.0, placed.offset.1) {
        tracing::warn!(frame = index, "failed to draw frame: {err}");
    }
    *shown = Some(index);
}

/// Preview of a map, redrawn on a shared ticker.
pub struct MapPreview {
    map_version: Option<Version>,
    compositor: MapCompositor,
    driver: AnimationDriver,
    last_report: CompositeReport,
}

impl MapPreview {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            map_version: None,
            compositor: MapCompositor::from_config(config),
            driver: AnimationDriver::new(Playback::Ticker { delay_ms: None }, config.animation.default_delay_ms),
            last_report: CompositeReport::default(),
        }
    }

    /// Report of the most recent redraw.
    pub fn last_report(&self) -> &CompositeReport {
        &self.last_report
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    /// Bring the preview up to date with `map`.
    ///
    /// Returns `true` when the map changed and playback was restarted.
    pub fn sync<S, R>(&mut self, map: &Map, scheduler: &mut S, surface: &mut R) -> bool
    where
        S: Scheduler + ?Sized,
        R: RasterSurface + ?Sized,
    {
        if self.map_version == Some(map.version()) {
            return false;
        }

        self.driver.cancel(scheduler);
        self.compositor.invalidate();
        self.map_version = Some(map.version());

        let (width, height) = map.extent();
        surface.resize(width, height);

        let Self { compositor, driver, last_report, .. } = self;
        driver.restart(Playback::for_map(map), scheduler, |tick| {
            *last_report = compositor.composite(map, tick, surface);
        });
        true
    }

    /// Redraw `map` for a token that came due.
    ///
    /// A map that changed since the last sync is synced instead.
    pub fn on_timer<S, R>(&mut self, map: &Map, token: TickToken, scheduler: &mut S, surface: &mut R) -> bool
    where
        S: Scheduler + ?Sized,
        R: RasterSurface + ?Sized,
    {
        if self.map_version != Some(map.version()) {
            return self.sync(map, scheduler, surface);
        }

        let Self { compositor, driver, last_report, .. } = self;
        driver.fire(token, scheduler, |tick| {
            *last_report = compositor.composite(map, tick, surface);
        })
    }

    /// Cancel playback; the preview is being torn down.
    pub fn stop<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.driver.cancel(scheduler);
        self.map_version = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{DriverState, ManualScheduler};
    use crate::color::TRANSPARENT;
    use crate::models::{AnimationStep, Frame, Layer, Palette, TileTable, TiledLayer};
    use crate::surface::ImageSurface;
    use image::Rgba;
    use std::rc::Rc;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn palette() -> Palette {
        Palette::new(vec![TRANSPARENT, RED, BLUE])
    }

    fn blinking() -> Image {
        Image::new(2, 2, vec![Frame::new(vec![1; 4]), Frame::new(vec![2; 4])], palette())
            .with_animation(vec![AnimationStep::new(0, 100), AnimationStep::new(1, 200)])
    }

    #[test]
    fn test_image_preview_steps_and_wraps() {
        let mut scheduler = ManualScheduler::new();
        let mut surface = ImageSurface::new(0, 0);
        let mut preview = ImagePreview::new(&RenderConfig::default());

        assert!(preview.sync(&blinking(), &mut scheduler, &mut surface));
        assert_eq!(surface.size(), (2, 2));
        assert_eq!(preview.shown_frame(), Some(0));

        let mut seen = vec![];
        for _ in 0..4 {
            let due = scheduler.next_due_ms().unwrap() - scheduler.now_ms();
            for token in scheduler.advance(due) {
                assert!(preview.on_timer(token, &mut scheduler, &mut surface));
            }
            seen.push(*surface.image().get_pixel(1, 1));
        }
        assert_eq!(seen, vec![BLUE, RED, BLUE, RED]);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_image_preview_sync_is_idempotent() {
        let image = blinking();
        let mut scheduler = ManualScheduler::new();
        let mut surface = ImageSurface::new(0, 0);
        let mut preview = ImagePreview::new(&RenderConfig::default());

        assert!(preview.sync(&image, &mut scheduler, &mut surface));
        assert!(!preview.sync(&image, &mut scheduler, &mut surface));
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_palette_edit_restarts_and_drops_stale_tick() {
        let image = blinking();
        let mut scheduler = ManualScheduler::new();
        let mut surface = ImageSurface::new(0, 0);
        let mut preview = ImagePreview::new(&RenderConfig::default());
        preview.sync(&image, &mut scheduler, &mut surface);

        let recolored_palette = image.palette().with_component(1, 1, 255).unwrap();
        let recolored = image.clone().with_palette(recolored_palette);
        assert!(preview.sync(&recolored, &mut scheduler, &mut surface));

        // Only the restarted driver's tick is pending
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(*surface.image().get_pixel(0, 0), Rgba([255, 255, 0, 255]));
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let mut scheduler = ManualScheduler::new();
        let mut surface = ImageSurface::new(0, 0);
        let mut preview = ImagePreview::new(&RenderConfig::default());
        preview.sync(&blinking(), &mut scheduler, &mut surface);

        let stale = scheduler.advance(100);
        preview.stop(&mut scheduler);
        for token in stale {
            assert!(!preview.on_timer(token, &mut scheduler, &mut surface));
        }
        assert_eq!(preview.driver().state(), DriverState::Idle);
    }

    #[test]
    fn test_single_frame_draws_once() {
        let image = Image::new(1, 1, vec![Frame::new(vec![1])], palette());
        let mut scheduler = ManualScheduler::new();
        let mut surface = ImageSurface::new(0, 0);
        let mut preview = ImagePreview::new(&RenderConfig::default());

        preview.sync(&image, &mut scheduler, &mut surface);
        assert_eq!(*surface.image().get_pixel(0, 0), RED);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_missing_frame_step_draws_nothing() {
        let image = Image::new(1, 1, vec![Frame::new(vec![1]), Frame::new(vec![2])], palette())
            .with_animation(vec![AnimationStep::new(0, 10), AnimationStep::new(5, 10)]);
        let mut scheduler = ManualScheduler::new();
        let mut surface = ImageSurface::new(0, 0);
        let mut preview = ImagePreview::new(&RenderConfig::default());

        preview.sync(&image, &mut scheduler, &mut surface);
        for token in scheduler.advance(10) {
            preview.on_timer(token, &mut scheduler, &mut surface);
        }

        assert_eq!(preview.shown_frame(), Some(0));
        assert_eq!(*surface.image().get_pixel(0, 0), RED);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_map_preview_ticks_all_layers() {
        let blink = Image::new(1, 1, vec![Frame::new(vec![1]), Frame::new(vec![2])], palette());
        let table = Rc::new(TileTable::new().with_image(1, blink));
        let layer = TiledLayer::new(1, 1, vec![vec![Some(1), Some(1)]], table);
        let map = Map::new(vec![Layer::Tiled(layer)]).with_animation_delay(50);

        let mut scheduler = ManualScheduler::new();
        let mut surface = ImageSurface::new(0, 0);
        let mut preview = MapPreview::new(&RenderConfig::default());

        assert!(preview.sync(&map, &mut scheduler, &mut surface));
        assert_eq!(surface.size(), (2, 1));
        assert_eq!(preview.last_report().painted, 2);
        assert_eq!(*surface.image().get_pixel(1, 0), RED);

        for token in scheduler.advance(50) {
            assert!(preview.on_timer(&map, token, &mut scheduler, &mut surface));
        }
        assert_eq!(preview.driver().tick(), Some(1));
        assert_eq!(*surface.image().get_pixel(0, 0), BLUE);
        assert_eq!(*surface.image().get_pixel(1, 0), BLUE);
    }

    #[test]
    fn test_static_map_draws_once() {
        let table = Rc::new(TileTable::new().with_image(1, Image::new(1, 1, vec![Frame::new(vec![1])], palette())));
        let map = Map::new(vec![Layer::Tiled(TiledLayer::new(1, 1, vec![vec![Some(1)]], table))]);

        let mut scheduler = ManualScheduler::new();
        let mut surface = ImageSurface::new(0, 0);
        let mut preview = MapPreview::new(&RenderConfig::default());

        preview.sync(&map, &mut scheduler, &mut surface);
        assert_eq!(*surface.image().get_pixel(0, 0), RED);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(preview.driver().state(), DriverState::Idle);
    }
}
