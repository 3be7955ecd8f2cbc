//! tileview - Rendering core for indexed-color images, tilesets and tile maps
//!
//! This library provides functionality to:
//! - Rasterize palette-indexed frames to RGBA bitmaps
//! - Drive frame animations on a host-supplied timer
//! - Convert between tilesets and single-sheet images
//! - Composite layered tile maps onto a drawing surface
//! - Remap imported images onto a fixed palette

pub mod animation;
pub mod color;
pub mod composition;
pub mod config;
pub mod import;
pub mod models;
pub mod preview;
pub mod renderer;
pub mod spritesheet;
pub mod surface;

#[cfg(feature = "wasm")]
pub mod wasm;
