//! Drawing surfaces
//!
//! The renderer never talks to a windowing or canvas library directly. It
//! draws through [`RasterSurface`], which a host implements over whatever it
//! displays with. [`ImageSurface`] is the in-memory implementation used for
//! headless rendering and tests.

use image::{Rgba, RgbaImage};
use thiserror::Error;

use crate::color::TRANSPARENT;

/// A surface rejected a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("block of {width}x{height} at ({x}, {y}) was rejected: {reason}")]
    Rejected { width: u32, height: u32, x: i32, y: i32, reason: String },
}

/// Where rendered bitmaps end up.
pub trait RasterSurface {
    /// Current logical size.
    fn size(&self) -> (u32, u32);

    /// Change the logical size, discarding the content.
    fn resize(&mut self, width: u32, height: u32);

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Draw `bitmap` with its top-left corner at `(x, y)`.
    ///
    /// Parts falling outside the surface are clipped.
    fn put_block(&mut self, bitmap: &RgbaImage, x: i32, y: i32) -> Result<(), SurfaceError>;
}

/// How [`ImageSurface`] combines a block with what is already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockMode {
    /// Porter-Duff source-over, so transparent pixels let lower layers show
    #[default]
    Over,
    /// Overwrite destination pixels, alpha included
    Replace,
}

/// An in-memory RGBA surface.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use tileview::surface::{ImageSurface, RasterSurface};
///
/// let mut surface = ImageSurface::new(4, 4);
/// let block = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
/// surface.put_block(&block, 3, -1).unwrap();
///
/// assert_eq!(*surface.image().get_pixel(3, 0), Rgba([255, 0, 0, 255]));
/// assert_eq!(*surface.image().get_pixel(2, 0), Rgba([0, 0, 0, 0]));
/// ```
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: RgbaImage,
    mode: BlockMode,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::from_pixel(width, height, TRANSPARENT), mode: BlockMode::Over }
    }

    pub fn with_mode(mut self, mode: BlockMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl RasterSurface for ImageSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::from_pixel(width, height, TRANSPARENT);
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    fn put_block(&mut self, bitmap: &RgbaImage, x: i32, y: i32) -> Result<(), SurfaceError> {
        let (canvas_w, canvas_h) = (self.image.width() as i64, self.image.height() as i64);

        for (sy, row) in bitmap.rows().enumerate() {
            let dest_y = y as i64 + sy as i64;
            if dest_y < 0 {
                continue;
            }
            if dest_y >= canvas_h {
                break;
            }

            for (sx, src) in row.enumerate() {
                let dest_x = x as i64 + sx as i64;
                if dest_x < 0 {
                    continue;
                }
                if dest_x >= canvas_w {
                    break;
                }

                let (dx, dy) = (dest_x as u32, dest_y as u32);
                let out = match self.mode {
                    BlockMode::Replace => *src,
                    BlockMode::Over => {
                        if src[3] == 0 {
                            continue;
                        }
                        source_over(src, self.image.get_pixel(dx, dy))
                    }
                };
                self.image.put_pixel(dx, dy, out);
            }
        }

        Ok(())
    }
}

/// Composite `src` over `dst` (straight alpha).
fn source_over(src: &Rgba<u8>, dst: &Rgba<u8>) -> Rgba<u8> {
    if src[3] == 255 {
        return *src;
    }

    let src_alpha = src[3] as f32 / 255.0;
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha == 0.0 {
        return TRANSPARENT;
    }

    let channel = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let result = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        (result.clamp(0.0, 1.0) * 255.0).round() as u8
    };

    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
