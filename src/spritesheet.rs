//! Tileset <-> sheet conversion
//!
//! A tileset is an image whose frames are discrete tiles. A sheet is the same
//! tiles laid out row-major in a grid inside one frame, which is how tilesets
//! are shown as a whole and how an edited sheet comes back in on import.
//!
//! Both directions work on palette indices, never on colors, so converting
//! there and back is lossless.

use thiserror::Error;

use crate::models::{Frame, FrameSize, Image};

/// Palette index used for grid cells with no tile.
pub const BACKGROUND_INDEX: u8 = 0;

/// Largest sheet [`frame_from_tileset`] will lay out, in pixels.
pub const MAX_SHEET_PIXELS: u64 = 1 << 26;

/// Error when converting between a tileset and a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("column count must be at least 1")]
    ZeroColumns,
    #[error("tileset has no frames to lay out")]
    NoFrames,
    #[error("tile width must be at least 1")]
    ZeroFrameWidth,
    #[error("tile width {frame_width} is wider than the {sheet_width} pixel sheet")]
    FrameWiderThanSheet { frame_width: u32, sheet_width: u32 },
    #[error("frame {index} has {actual} pixels, which does not fill its {width}x{height} size")]
    BufferSizeMismatch { index: usize, width: u32, height: u32, actual: usize },
    #[error("tile {index} ({width}x{height}) is wider than the {cell_width} pixel grid cell")]
    TileExceedsCell { index: usize, width: u32, height: u32, cell_width: u32 },
    #[error("sheet is {sheet_width}x{sheet_height} but tile {index} needs the area up to ({needed_x}, {needed_y})")]
    SourceTooSmall { index: usize, sheet_width: u32, sheet_height: u32, needed_x: u32, needed_y: u32 },
    #[error("a sheet must be a single frame, found {0}")]
    NotASheet(usize),
    #[error("{columns}x{rows} grid of {cell_width}x{cell_height} cells is too large for one sheet")]
    SheetTooLarge { columns: u32, rows: u32, cell_width: u32, cell_height: u32 },
}

/// One composite frame together with its size.
///
/// The frame itself never carries a size override: it is always read at the
/// sheet's size, so a stale per-frame size cannot leak into a later split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub width: u32,
    pub height: u32,
    pub frame: Frame,
}

impl Sheet {
    /// Take the single frame of an image as a sheet.
    pub fn from_image(image: &Image) -> Result<Sheet, ConvertError> {
        let frame = match image.frames() {
            [frame] => frame,
            [] => return Err(ConvertError::NoFrames),
            frames => return Err(ConvertError::NotASheet(frames.len())),
        };
        let (width, height) = frame.resolve_size(image.default_size());
        check_buffer(0, frame, width, height)?;
        Ok(Sheet { width, height, frame: Frame::new(frame.pixels.clone()) })
    }

    /// Wrap the sheet as a single-frame image using `template`'s palette.
    pub fn into_image(self, template: &Image) -> Image {
        Image::new(self.width, self.height, vec![self.frame], template.palette().clone())
    }
}

/// Grid cell size for a tileset: the largest tile in either axis.
///
/// For a uniform tileset this is simply the image's default size.
pub fn cell_size(image: &Image) -> (u32, u32) {
    let default = image.default_size();
    image
        .frames()
        .iter()
        .map(|f| f.resolve_size(default))
        .fold((0, 0), |(w, h), (fw, fh)| (w.max(fw), h.max(fh)))
}

/// Lay out a tileset's frames row-major into one sheet.
///
/// The sheet is `columns` cells wide and `ceil(frames / columns)` cells
/// tall; each cell is [`cell_size`]. Cells with no tile, and the unused part
/// of cells holding smaller tiles, are [`BACKGROUND_INDEX`]. A grid larger
/// than [`MAX_SHEET_PIXELS`] is [`ConvertError::SheetTooLarge`].
///
/// # Examples
///
/// ```
/// use tileview::models::{Frame, Image, Palette};
/// use tileview::spritesheet::frame_from_tileset;
///
/// let tiles = (0..3).map(|i| Frame::new(vec![i + 1; 4])).collect();
/// let img = Image::new(2, 2, tiles, Palette::default());
///
/// let sheet = frame_from_tileset(&img, 2).unwrap();
/// assert_eq!((sheet.width, sheet.height), (4, 4));
/// assert_eq!(sheet.frame.pixels[0..4], [1, 1, 2, 2]);
/// assert_eq!(sheet.frame.pixels[8..12], [3, 3, 0, 0]);
/// ```
pub fn frame_from_tileset(image: &Image, columns: u32) -> Result<Sheet, ConvertError> {
    if columns == 0 {
        return Err(ConvertError::ZeroColumns);
    }
    let frames = image.frames();
    if frames.is_empty() {
        return Err(ConvertError::NoFrames);
    }

    let (cell_w, cell_h) = cell_size(image);
    let rows = u32::try_from(frames.len()).map_or(u32::MAX, |n| n.div_ceil(columns));
    let too_large = ConvertError::SheetTooLarge { columns, rows, cell_width: cell_w, cell_height: cell_h };
    let (sheet_width, sheet_height) = match (columns.checked_mul(cell_w), rows.checked_mul(cell_h)) {
        (Some(w), Some(h)) if w as u64 * h as u64 <= MAX_SHEET_PIXELS => (w, h),
        _ => return Err(too_large),
    };
    let mut pixels = vec![BACKGROUND_INDEX; sheet_width as usize * sheet_height as usize];

    for (i, frame) in frames.iter().enumerate() {
        let (w, h) = frame.resolve_size(image.default_size());
        check_buffer(i, frame, w, h)?;

        // In range: the grid area was checked above
        let dest_x = (i % columns as usize) * cell_w as usize;
        let dest_y = (i / columns as usize) * cell_h as usize;

        for y in 0..h as usize {
            let src = y * w as usize;
            let dst = (dest_y + y) * sheet_width as usize + dest_x;
            pixels[dst..dst + w as usize].copy_from_slice(&frame.pixels[src..src + w as usize]);
        }
    }

    Ok(Sheet { width: sheet_width, height: sheet_height, frame: Frame::new(pixels) })
}

/// Slice a sheet back into tiles, the inverse of [`frame_from_tileset`].
///
/// The column count is `sheet.width / frame_width`; each grid row is as tall
/// as the tallest entry of `tile_dims`. One frame is produced per entry of
/// `tile_dims`, carrying that entry as its size. A sheet too small to hold
/// every tile is an error: nothing is padded.
pub fn tileset_from_frame(
    sheet: &Sheet,
    frame_width: u32,
    tile_dims: &[FrameSize],
    default_size: (u32, u32),
) -> Result<Vec<Frame>, ConvertError> {
    if frame_width == 0 {
        return Err(ConvertError::ZeroFrameWidth);
    }
    check_buffer(0, &sheet.frame, sheet.width, sheet.height)?;

    let columns = sheet.width / frame_width;
    if columns == 0 {
        return Err(ConvertError::FrameWiderThanSheet { frame_width, sheet_width: sheet.width });
    }

    let resolved: Vec<(u32, u32)> = tile_dims.iter().map(|d| d.resolve(default_size)).collect();
    let cell_h = resolved.iter().map(|&(_, h)| h).max().unwrap_or(0);

    let mut frames = Vec::with_capacity(tile_dims.len());
    for (i, (&size, &(w, h))) in tile_dims.iter().zip(&resolved).enumerate() {
        if w > frame_width {
            return Err(ConvertError::TileExceedsCell { index: i, width: w, height: h, cell_width: frame_width });
        }

        // Saturated extents never fit, so they report as too small
        let x0 = (i % columns as usize) as u32 * frame_width;
        let y0 = u32::try_from(i / columns as usize).unwrap_or(u32::MAX).saturating_mul(cell_h);
        let needed_x = x0.saturating_add(w);
        let needed_y = y0.saturating_add(h);
        if needed_x > sheet.width || needed_y > sheet.height {
            return Err(ConvertError::SourceTooSmall {
                index: i,
                sheet_width: sheet.width,
                sheet_height: sheet.height,
                needed_x,
                needed_y,
            });
        }

        let mut pixels = Vec::with_capacity(w as usize * h as usize);
        for y in y0 as usize..needed_y as usize {
            let start = y * sheet.width as usize + x0 as usize;
            pixels.extend_from_slice(&sheet.frame.pixels[start..start + w as usize]);
        }
        frames.push(Frame { size, offset: (0, 0), pixels });
    }

    Ok(frames)
}

/// Show a tileset as a single-frame sheet image.
pub fn sheet_image(tileset: &Image, columns: u32) -> Result<Image, ConvertError> {
    Ok(frame_from_tileset(tileset, columns)?.into_image(tileset))
}

/// Replace a tileset's frames with tiles cut from an edited sheet image.
///
/// Tile sizes and grid cell width come from the tileset's current frames.
/// The result is a new version of `tileset`; palette and animation are kept.
pub fn split_sheet(tileset: &Image, sheet: &Image) -> Result<Image, ConvertError> {
    let sheet = Sheet::from_image(sheet)?;
    let (cell_w, _) = cell_size(tileset);
    let frames = tileset_from_frame(&sheet, cell_w, &tileset.frame_sizes(), tileset.default_size())?;
    Ok(tileset.clone().with_frames(frames))
}

fn check_buffer(index: usize, frame: &Frame, width: u32, height: u32) -> Result<(), ConvertError> {
    if frame.pixels.len() != width as usize * height as usize {
        return Err(ConvertError::BufferSizeMismatch { index, width, height, actual: frame.pixels.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Palette;

    /// A tile whose pixels encode their own tile number and position.
    fn numbered_tile(n: u8, w: u32, h: u32) -> Frame {
        Frame::new((0..w * h).map(|p| n * 16 + (p % 16) as u8).collect())
    }

    fn tileset(count: u8, w: u32, h: u32) -> Image {
        Image::new(w, h, (0..count).map(|n| numbered_tile(n + 1, w, h)).collect(), Palette::default())
    }

    #[test]
    fn test_four_8x8_tiles_two_columns() {
        let img = tileset(4, 8, 8);
        let sheet = frame_from_tileset(&img, 2).unwrap();

        assert_eq!((sheet.width, sheet.height), (16, 16));
        assert_eq!(sheet.frame.size, FrameSize::Inherited);

        let at = |x: usize, y: usize| sheet.frame.pixels[y * 16 + x];
        assert_eq!(at(0, 0), img.frames()[0].pixels[0]);
        assert_eq!(at(8, 0), img.frames()[1].pixels[0]);
        assert_eq!(at(0, 8), img.frames()[2].pixels[0]);
        assert_eq!(at(8, 8), img.frames()[3].pixels[0]);
        assert_eq!(at(15, 15), img.frames()[3].pixels[63]);
    }

    #[test]
    fn test_round_trip_recovers_tiles() {
        let img = tileset(4, 8, 8);
        let sheet = frame_from_tileset(&img, 2).unwrap();
        let tiles = tileset_from_frame(&sheet, 8, &img.frame_sizes(), img.default_size()).unwrap();
        assert_eq!(tiles, img.frames());
    }

    #[test]
    fn test_round_trip_uneven_grid_and_mixed_sizes() {
        let frames = vec![
            numbered_tile(1, 4, 4),
            Frame { size: FrameSize::Explicit { width: 2, height: 3 }, ..numbered_tile(2, 2, 3) },
            numbered_tile(3, 4, 4),
        ];
        let img = Image::new(4, 4, frames, Palette::default());

        for columns in 1..=4 {
            let sheet = frame_from_tileset(&img, columns).unwrap();
            let tiles = tileset_from_frame(&sheet, 4, &img.frame_sizes(), img.default_size()).unwrap();
            assert_eq!(tiles, img.frames(), "columns = {}", columns);
        }
    }

    #[test]
    fn test_unfilled_cells_are_background() {
        let img = tileset(3, 2, 2);
        let sheet = frame_from_tileset(&img, 2).unwrap();
        assert_eq!((sheet.width, sheet.height), (4, 4));
        assert_eq!(sheet.frame.pixels[2 * 4 + 2..2 * 4 + 4], [BACKGROUND_INDEX; 2]);
        assert_eq!(sheet.frame.pixels[3 * 4 + 2..3 * 4 + 4], [BACKGROUND_INDEX; 2]);
    }

    #[test]
    fn test_bad_layout_arguments() {
        let img = tileset(2, 2, 2);
        assert_eq!(frame_from_tileset(&img, 0), Err(ConvertError::ZeroColumns));

        let empty = Image::new(2, 2, vec![], Palette::default());
        assert_eq!(frame_from_tileset(&empty, 2), Err(ConvertError::NoFrames));

        let short = Image::new(2, 2, vec![Frame::new(vec![0; 3])], Palette::default());
        assert!(matches!(frame_from_tileset(&short, 1), Err(ConvertError::BufferSizeMismatch { index: 0, .. })));
    }

    #[test]
    fn test_huge_column_count_is_an_error() {
        let img = Image::new(4, 4, vec![Frame::new(vec![1; 16])], Palette::default());
        assert_eq!(
            frame_from_tileset(&img, 1 << 30),
            Err(ConvertError::SheetTooLarge { columns: 1 << 30, rows: 1, cell_width: 4, cell_height: 4 })
        );

        // No overflow, but far past the pixel cap
        let dot = Image::new(1, 1, vec![Frame::new(vec![1])], Palette::default());
        assert!(matches!(frame_from_tileset(&dot, u32::MAX), Err(ConvertError::SheetTooLarge { .. })));
    }

    #[test]
    fn test_more_columns_than_tiles_leaves_empty_cells() {
        let img = tileset(2, 2, 2);
        let sheet = frame_from_tileset(&img, 5).unwrap();
        assert_eq!((sheet.width, sheet.height), (10, 2));
        assert_eq!(sheet.frame.pixels[4..10], [BACKGROUND_INDEX; 6]);
    }

    #[test]
    fn test_huge_tile_height_is_too_small_not_overflow() {
        let sheet = Sheet { width: 2, height: 2, frame: Frame::new(vec![0; 4]) };
        let dims = [FrameSize::Explicit { width: 2, height: 1 }, FrameSize::Explicit { width: 2, height: u32::MAX }];
        let result = tileset_from_frame(&sheet, 2, &dims, (1, 1));
        assert!(matches!(result, Err(ConvertError::SourceTooSmall { index: 1, needed_y: u32::MAX, .. })));
    }

    #[test]
    fn test_undersized_sheet_is_an_error() {
        let img = tileset(4, 8, 8);
        let sheet = frame_from_tileset(&img, 2).unwrap();
        let mut dims = img.frame_sizes();
        dims.push(FrameSize::Inherited);

        let result = tileset_from_frame(&sheet, 8, &dims, img.default_size());
        assert!(matches!(result, Err(ConvertError::SourceTooSmall { index: 4, .. })));
    }

    #[test]
    fn test_split_arguments_checked() {
        let sheet = Sheet { width: 4, height: 2, frame: Frame::new(vec![0; 8]) };
        assert_eq!(tileset_from_frame(&sheet, 0, &[], (1, 1)), Err(ConvertError::ZeroFrameWidth));
        assert_eq!(
            tileset_from_frame(&sheet, 5, &[], (1, 1)),
            Err(ConvertError::FrameWiderThanSheet { frame_width: 5, sheet_width: 4 })
        );
        assert!(matches!(
            tileset_from_frame(&sheet, 2, &[FrameSize::Explicit { width: 3, height: 1 }], (1, 1)),
            Err(ConvertError::TileExceedsCell { index: 0, .. })
        ));

        let broken = Sheet { width: 4, height: 2, frame: Frame::new(vec![0; 7]) };
        assert!(matches!(
            tileset_from_frame(&broken, 2, &[], (1, 1)),
            Err(ConvertError::BufferSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_sheet_image_and_split_sheet() {
        let img = tileset(4, 2, 2);
        let sheet = sheet_image(&img, 4).unwrap();
        assert_eq!(sheet.default_size(), (8, 2));
        assert_eq!(sheet.frames().len(), 1);

        let restored = split_sheet(&img, &sheet).unwrap();
        assert_eq!(restored.frames(), img.frames());
        assert_ne!(restored.version(), img.version());

        let two_frames = tileset(2, 2, 2);
        assert_eq!(split_sheet(&img, &two_frames), Err(ConvertError::NotASheet(2)));
    }
}
