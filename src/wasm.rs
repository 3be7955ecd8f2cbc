//! WASM API module for browser/JS interop
//!
//! Provides WebAssembly bindings for previewing indexed images from JSON.
//! Images use the document JSON shape:
//! `{"width": 2, "height": 1, "frames": [{"pixels": [0, 1]}], "palette": [[0, 0, 0, 255], ...]}`.

use wasm_bindgen::prelude::*;

use crate::import::nearest_color_map;
use crate::models::{Image, Palette};
use crate::renderer::rasterize_checked;
use crate::spritesheet::sheet_image;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Result of rasterizing to RGBA pixels.
#[wasm_bindgen]
pub struct RenderResult {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    warnings: Vec<String>,
}

#[wasm_bindgen]
impl RenderResult {
    /// Width of the bitmap in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the bitmap in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA pixel data (4 bytes per pixel)
    #[wasm_bindgen(getter)]
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Any warnings generated during rendering
    #[wasm_bindgen(getter)]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.clone()
    }
}

impl RenderResult {
    fn failed(warning: String) -> Self {
        Self { width: 0, height: 0, pixels: Vec::new(), warnings: vec![warning] }
    }

    fn from_frame(image: &Image, frame: usize) -> Self {
        let Some(source) = image.frames().get(frame) else {
            return Self::failed(format!("Image has no frame {}", frame));
        };

        let (bitmap, warnings) = rasterize_checked(source, image.palette(), image.default_size());
        RenderResult {
            width: bitmap.width(),
            height: bitmap.height(),
            pixels: bitmap.into_raw(),
            warnings: warnings.into_iter().map(|w| w.message).collect(),
        }
    }
}

fn parse_image(json: &str) -> Result<Image, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid image JSON: {}", e))
}

/// Rasterize one frame of an image JSON document to RGBA pixels.
#[wasm_bindgen]
pub fn rasterize_image_json(json: &str, frame: usize) -> RenderResult {
    match parse_image(json) {
        Ok(image) => RenderResult::from_frame(&image, frame),
        Err(message) => RenderResult::failed(message),
    }
}

/// Nearest-color index map from one palette JSON array onto another.
///
/// Returns an empty array if either palette fails to parse.
#[wasm_bindgen]
pub fn remap_palette_json(new_palette: &str, old_palette: &str) -> Vec<u8> {
    let parsed = serde_json::from_str::<Palette>(new_palette)
        .and_then(|new| serde_json::from_str::<Palette>(old_palette).map(|old| (new, old)));
    match parsed {
        Ok((new, old)) => nearest_color_map(new.colors(), old.colors()),
        Err(_) => Vec::new(),
    }
}

/// Lay a tileset image out as one sheet and rasterize it.
#[wasm_bindgen]
pub fn tileset_sheet_json(json: &str, columns: u32) -> RenderResult {
    let image = match parse_image(json) {
        Ok(image) => image,
        Err(message) => return RenderResult::failed(message),
    };
    match sheet_image(&image, columns) {
        Ok(sheet) => RenderResult::from_frame(&sheet, 0),
        Err(e) => RenderResult::failed(e.to_string()),
    }
}
