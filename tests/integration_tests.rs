//! Integration tests for the tileview rendering core
//!
//! These tests drive the public API end to end: documents come in as JSON,
//! go through conversion, import and compositing, and come out as pixels.

use std::rc::Rc;

use image::Rgba;
use tileview::animation::ManualScheduler;
use tileview::color::{DIAGNOSTIC, TRANSPARENT};
use tileview::composition::MapCompositor;
use tileview::config::RenderConfig;
use tileview::import::{import_image, nearest_color_map, SlotCapabilities};
use tileview::models::{AnimationStep, Frame, FrameSize, Image, Item, Layer, ListLayer, Map, Palette, TileTable, TiledLayer};
use tileview::preview::{ImagePreview, MapPreview};
use tileview::renderer::{canvas_extent, rasterize, rasterize_image};
use tileview::spritesheet::{frame_from_tileset, sheet_image, split_sheet, tileset_from_frame, ConvertError};
use tileview::surface::{ImageSurface, RasterSurface};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn four_colors() -> Palette {
    Palette::new(vec![BLACK, RED, GREEN, BLUE])
}

#[test]
fn test_black_16x16_from_json() {
    let json = format!(
        r#"{{"width": 16, "height": 16, "frames": [{{"pixels": {:?}}}], "palette": [[0,0,0,255],[255,0,0,255],[0,255,0,255],[0,0,255,255]]}}"#,
        vec![0u8; 256]
    );
    let image: Image = serde_json::from_str(&json).expect("should parse image JSON");

    let bitmaps = rasterize_image(&image);
    assert_eq!(bitmaps.len(), 1);
    assert_eq!(bitmaps[0].dimensions(), (16, 16));
    assert_eq!(bitmaps[0].as_raw().len(), 256 * 4);
    assert!(bitmaps[0].pixels().all(|p| *p == BLACK));
}

#[test]
fn test_zero_sized_frame_gets_unit_canvas() {
    let image = Image::new(0, 0, vec![Frame::new(vec![])], four_colors());
    assert_eq!(canvas_extent(&image), (1, 1));

    let bitmap = rasterize(&image.frames()[0], image.palette(), image.default_size());
    assert_eq!(bitmap.dimensions(), (1, 1));
    assert_eq!(*bitmap.get_pixel(0, 0), TRANSPARENT);
}

#[test]
fn test_bitmap_byte_length_law() {
    let palette = four_colors();
    for (w, h) in [(0, 0), (0, 5), (3, 0), (1, 1), (7, 3), (16, 9)] {
        let frame = Frame::sized(w, h, vec![1; (w * h) as usize]);
        let bitmap = rasterize(&frame, &palette, (99, 99));
        assert_eq!(bitmap.as_raw().len(), (w.max(1) * h.max(1) * 4) as usize, "{w}x{h}");
    }
}

#[test]
fn test_tileset_sheet_round_trip() {
    let tiles: Vec<Frame> = (0..4u8).map(|t| Frame::new((0..64).map(|p| (t * 64 + p) % 4).collect())).collect();
    let image = Image::new(8, 8, tiles, four_colors());

    let sheet = frame_from_tileset(&image, 2).expect("should lay out sheet");
    assert_eq!((sheet.width, sheet.height), (16, 16));

    let dims = vec![FrameSize::Explicit { width: 8, height: 8 }; 4];
    let frames = tileset_from_frame(&sheet, 8, &dims, image.default_size()).expect("should split sheet");
    for (original, recovered) in image.frames().iter().zip(&frames) {
        assert_eq!(original.pixels, recovered.pixels);
    }
}

#[test]
fn test_edit_sheet_and_split_back() {
    let tiles = vec![Frame::new(vec![1; 4]), Frame::new(vec![2; 4]), Frame::new(vec![3; 4])];
    let tileset = Image::new(2, 2, tiles, four_colors())
        .with_animation(vec![AnimationStep::new(2, 80), AnimationStep::new(0, 80)]);

    let sheet = sheet_image(&tileset, 2).expect("should build sheet image");
    assert_eq!((sheet.width, sheet.height), (4, 4));

    // Recolor the third tile in place
    let mut pixels = sheet.frames()[0].pixels.clone();
    for y in 2..4 {
        for x in 0..2 {
            pixels[y * 4 + x] = 1;
        }
    }
    let edited = sheet.clone().with_frames(vec![Frame::new(pixels)]);

    let updated = split_sheet(&tileset, &edited).expect("should split edited sheet");
    assert_eq!(updated.frames().len(), 3);
    assert_eq!(updated.frames()[2].pixels, vec![1; 4]);
    assert_eq!(updated.animation(), tileset.animation());
    assert_ne!(updated.version(), tileset.version());
}

#[test]
fn test_undersized_sheet_is_reported() {
    let tileset = Image::new(4, 4, (0..4).map(|_| Frame::new(vec![0; 16])).collect(), four_colors());
    let small = Image::new(8, 4, vec![Frame::new(vec![0; 32])], four_colors());

    let err = split_sheet(&tileset, &small).expect_err("sheet holds only two tiles");
    assert!(matches!(err, ConvertError::SourceTooSmall { index: 2, .. }));
}

#[test]
fn test_identity_remap_for_eight_colors() {
    let colors: Vec<Rgba<u8>> = (0..8u8).map(|i| Rgba([i * 30, 255 - i * 30, i * 7, 255])).collect();
    let map = nearest_color_map(&colors, &colors);
    assert_eq!(map, (0..8).collect::<Vec<u8>>());
}

#[test]
fn test_import_into_fixed_palette_then_preview() {
    let slot = Image::new(2, 1, vec![Frame::new(vec![0, 0])], four_colors());
    let incoming_palette = Palette::new(vec![Rgba([0, 0, 250, 255]), Rgba([10, 240, 10, 255])]);
    let incoming = Image::new(2, 1, vec![Frame::new(vec![1, 0])], incoming_palette);

    let imported = import_image(&slot, &incoming, SlotCapabilities { palette_writable: false })
        .expect("import should succeed");
    assert_eq!(imported.frames()[0].pixels, vec![2, 3]);

    let mut scheduler = ManualScheduler::new();
    let mut surface = ImageSurface::new(0, 0);
    let mut preview = ImagePreview::new(&RenderConfig::default());
    preview.sync(&imported, &mut scheduler, &mut surface);

    assert_eq!(surface.size(), (2, 1));
    assert_eq!(*surface.image().get_pixel(0, 0), GREEN);
    assert_eq!(*surface.image().get_pixel(1, 0), BLUE);
}

#[test]
fn test_map_with_tiles_sprites_and_defects() {
    let grass = Image::new(2, 2, vec![Frame::new(vec![2; 4])], four_colors());
    let water = Image::new(2, 2, vec![Frame::new(vec![3; 4]), Frame::new(vec![1; 4])], four_colors());
    let hero = Image::new(1, 1, vec![Frame::new(vec![1])], four_colors());
    let table = Rc::new(
        TileTable::new()
            .with_image(1, grass)
            .with_image(2, water)
            .with_image(10, hero)
            .with_blank(0),
    );

    let ground = TiledLayer::new(2, 2, vec![vec![Some(1), Some(2), Some(0)], vec![Some(77), None, Some(1)]], table.clone());
    let sprites = ListLayer::new(vec![Item::new(10, 6, 4).attached(1.0, 1.0), Item::new(55, 0, 0)], table);
    let map = Map::new(vec![Layer::Tiled(ground), Layer::List(sprites)]).with_animation_delay(100);
    assert_eq!(map.extent(), (6, 4));

    let mut scheduler = ManualScheduler::new();
    let mut surface = ImageSurface::new(0, 0);
    let mut preview = MapPreview::new(&RenderConfig::default());
    preview.sync(&map, &mut scheduler, &mut surface);

    let report = preview.last_report();
    // 4 tiles (one a placeholder) plus the hero
    assert_eq!(report.painted, 5);
    assert_eq!(report.warnings.len(), 1);

    let img = surface.image();
    assert_eq!(*img.get_pixel(0, 0), GREEN);
    assert_eq!(*img.get_pixel(2, 0), BLUE);
    assert_eq!(*img.get_pixel(4, 0), TRANSPARENT);
    assert_eq!(*img.get_pixel(0, 2), DIAGNOSTIC);
    assert_eq!(*img.get_pixel(2, 2), TRANSPARENT);
    assert_eq!(*img.get_pixel(5, 3), RED);
    assert_eq!(*img.get_pixel(4, 3), GREEN);

    for token in scheduler.advance(100) {
        preview.on_timer(&map, token, &mut scheduler, &mut surface);
    }
    assert_eq!(*surface.image().get_pixel(2, 0), RED);
    assert!(preview.last_report().warnings.is_empty());
}

#[test]
fn test_compositor_on_custom_surface() {
    struct Recording {
        blocks: Vec<(i32, i32, u32, u32)>,
    }

    impl RasterSurface for Recording {
        fn size(&self) -> (u32, u32) {
            (0, 0)
        }
        fn resize(&mut self, _width: u32, _height: u32) {}
        fn clear(&mut self) {
            self.blocks.clear();
        }
        fn put_block(&mut self, bitmap: &image::RgbaImage, x: i32, y: i32) -> Result<(), tileview::surface::SurfaceError> {
            self.blocks.push((x, y, bitmap.width(), bitmap.height()));
            Ok(())
        }
    }

    let tile = Image::new(3, 5, vec![Frame::new(vec![1; 15])], four_colors());
    let table = Rc::new(TileTable::new().with_image(4, tile));
    let layer = TiledLayer::new(3, 5, vec![vec![None, Some(4)], vec![Some(4)]], table);
    let map = Map::new(vec![Layer::Tiled(layer)]);

    let mut surface = Recording { blocks: Vec::new() };
    MapCompositor::new().composite(&map, 0, &mut surface);
    assert_eq!(surface.blocks, vec![(3, 0, 3, 5), (0, 5, 3, 5)]);
}
