//! Nearest-color mapping from an incoming palette onto a fixed one.

use crate::color::Color;
use crate::models::{Frame, Image, Palette};

/// Weighted Manhattan distance between two colors.
///
/// Green counts double and alpha ten times, so a transparent entry is never
/// a close match for an opaque one.
pub fn color_distance(a: Color, b: Color) -> u32 {
    let diff = |i: usize| (a[i] as i32 - b[i] as i32).unsigned_abs();
    diff(0) + 2 * diff(1) + diff(2) + 10 * diff(3)
}

/// For each entry of `new`, the index of the closest entry of `old`.
///
/// The search for entry `i` starts at `old[i % len]` and wraps, stopping at
/// the first exact match. Ties keep the earliest candidate in that order, so
/// identical palettes map to the identity without a full scan. Only the first
/// 256 entries of `old` are candidates since pixels store `u8` indices. An
/// empty `old` maps everything to 0.
pub fn nearest_color_map(new: &[Color], old: &[Color]) -> Vec<u8> {
    let old = &old[..old.len().min(256)];
    if old.is_empty() {
        return vec![0; new.len()];
    }

    new.iter()
        .enumerate()
        .map(|(i, &color)| {
            let mut best = i % old.len();
            let mut best_dist = u32::MAX;
            for o in 0..old.len() {
                let candidate = (o + i) % old.len();
                let dist = color_distance(color, old[candidate]);
                if dist < best_dist {
                    best = candidate;
                    best_dist = dist;
                    if dist == 0 {
                        break;
                    }
                }
            }
            best as u8
        })
        .collect()
}

/// Rewrite every pixel of `frames` through `map`.
///
/// Pixels with no entry in `map` (already outside the incoming palette) keep
/// their value.
pub fn apply_remap(frames: &[Frame], map: &[u8]) -> Vec<Frame> {
    frames
        .iter()
        .map(|frame| Frame {
            pixels: frame.pixels.iter().map(|&p| map.get(p as usize).copied().unwrap_or(p)).collect(),
            ..frame.clone()
        })
        .collect()
}

/// Re-express `image` in terms of `target`, returning a new version that
/// carries `target` as its palette.
///
/// Never fails; the worst case is a distant but valid index.
pub fn remap_image(image: &Image, target: &Palette) -> Image {
    let map = nearest_color_map(image.palette().colors(), target.colors());
    let frames = apply_remap(image.frames(), &map);
    image.clone().with_frames(frames).with_palette(target.clone())
}
