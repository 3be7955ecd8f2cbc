//! Frame rasterization: palette-indexed pixels to RGBA bitmaps

use std::collections::BTreeSet;

use image::RgbaImage;

use crate::color::DIAGNOSTIC;
use crate::models::{Frame, FrameSize, Image, Palette, Warning};

/// Canvas size for a frame of the given size.
///
/// A zero axis becomes 1 so a surface is never zero-sized; the pixel loop
/// still uses the true size.
pub fn logical_extent(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}

/// Canvas size needed to show every frame of an image.
///
/// Starts from the image's default size and grows to cover each frame that
/// carries its own non-zero size, placed at its offset. Each axis is at least 1.
///
/// # Examples
///
/// ```
/// use tileview::models::{Frame, Image, Palette};
/// use tileview::renderer::canvas_extent;
///
/// let img = Image::new(8, 8, vec![
///     Frame::new(vec![0; 64]),
///     Frame::filled(4, 4, 0).with_offset(6, 2),
/// ], Palette::default());
/// assert_eq!(canvas_extent(&img), (10, 8));
/// ```
pub fn canvas_extent(image: &Image) -> (u32, u32) {
    let mut extent_x = image.width as i64;
    let mut extent_y = image.height as i64;
    for frame in image.frames() {
        if let FrameSize::Explicit { width, height } = frame.size {
            if width > 0 && height > 0 {
                extent_x = extent_x.max(frame.offset.0 as i64 + width as i64);
                extent_y = extent_y.max(frame.offset.1 as i64 + height as i64);
            }
        }
    }
    logical_extent(extent_x.clamp(0, u32::MAX as i64) as u32, extent_y.clamp(0, u32::MAX as i64) as u32)
}

/// Rasterize one frame to an RGBA bitmap.
///
/// `inherited` is the owning image's default size, used when the frame has
/// none of its own. Indices past the end of the palette (or missing from a
/// short pixel buffer) are painted magenta rather than failing.
///
/// The bitmap is `max(1, w) x max(1, h)`; a frame with a zero axis yields a
/// 1x1 transparent bitmap with nothing written.
///
/// # Examples
///
/// ```
/// use tileview::models::{Frame, Palette};
/// use tileview::renderer::rasterize;
/// use image::Rgba;
///
/// let palette = Palette::new(vec![Rgba([0, 0, 0, 255]), Rgba([255, 0, 0, 255])]);
/// let frame = Frame::new(vec![0, 1, 9, 0]);
///
/// let bitmap = rasterize(&frame, &palette, (2, 2));
/// assert_eq!(bitmap.dimensions(), (2, 2));
/// assert_eq!(*bitmap.get_pixel(1, 0), Rgba([255, 0, 0, 255]));
/// assert_eq!(*bitmap.get_pixel(0, 1), Rgba([255, 0, 255, 255]));
/// ```
pub fn rasterize(frame: &Frame, palette: &Palette, inherited: (u32, u32)) -> RgbaImage {
    rasterize_with(frame, palette, inherited, |_| {})
}

/// Rasterize one frame, reporting each distinct bad index once.
pub fn rasterize_checked(frame: &Frame, palette: &Palette, inherited: (u32, u32)) -> (RgbaImage, Vec<Warning>) {
    let mut bad: BTreeSet<Option<u8>> = BTreeSet::new();
    let bitmap = rasterize_with(frame, palette, inherited, |px| {
        bad.insert(px);
    });

    let warnings = bad
        .into_iter()
        .map(|px| match px {
            Some(index) => Warning::new(format!(
                "Pixel index {} is outside the {}-entry palette, using magenta",
                index,
                palette.len()
            )),
            None => Warning::new(format!(
                "Frame has {} pixels, fewer than its size needs, using magenta",
                frame.pixels.len()
            )),
        })
        .collect();

    (bitmap, warnings)
}

/// Rasterize every frame of an image in order.
pub fn rasterize_image(image: &Image) -> Vec<RgbaImage> {
    image
        .frames()
        .iter()
        .map(|frame| rasterize(frame, image.palette(), image.default_size()))
        .collect()
}

fn rasterize_with(
    frame: &Frame,
    palette: &Palette,
    inherited: (u32, u32),
    mut on_bad_index: impl FnMut(Option<u8>),
) -> RgbaImage {
    let (width, height) = frame.resolve_size(inherited);
    let (canvas_w, canvas_h) = logical_extent(width, height);
    let mut bitmap = RgbaImage::new(canvas_w, canvas_h);

    if width == 0 || height == 0 {
        return bitmap;
    }

    for y in 0..height {
        for x in 0..width {
            let offset = y as usize * width as usize + x as usize;
            let px = frame.pixels.get(offset).copied();
            let color = match px.and_then(|index| palette.get(index as usize)) {
                Some(color) => color,
                None => {
                    on_bad_index(px);
                    DIAGNOSTIC
                }
            };
            bitmap.put_pixel(x, y, color);
        }
    }

    bitmap
}
