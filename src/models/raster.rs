//! Indexed raster types: frames, animation steps and images.

use serde::{Deserialize, Serialize};

use super::core::Version;
use super::palette::Palette;

/// Size of a frame, either its own or inherited from the owning image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSize {
    /// Use the image's default width and height
    #[default]
    Inherited,
    /// The frame carries its own size
    Explicit { width: u32, height: u32 },
}

impl FrameSize {
    /// Resolve against the owning image's default size.
    pub fn resolve(self, inherited: (u32, u32)) -> (u32, u32) {
        match self {
            FrameSize::Inherited => inherited,
            FrameSize::Explicit { width, height } => (width, height),
        }
    }
}

/// One raster unit: a row-major buffer of palette indices.
///
/// Frames arrive from the codec layer as JSON objects with optional
/// `width`/`height` and `offsetX`/`offsetY` fields. Width and height must be
/// given together or not at all.
///
/// # Examples
///
/// ```
/// use tileview::models::{Frame, FrameSize};
///
/// let frame: Frame = serde_json::from_str(r#"{"pixels": [0, 1, 1, 0]}"#).unwrap();
/// assert_eq!(frame.size, FrameSize::Inherited);
///
/// let frame: Frame = serde_json::from_str(
///     r#"{"width": 2, "height": 1, "offsetX": 3, "pixels": [5, 6]}"#,
/// ).unwrap();
/// assert_eq!(frame.size, FrameSize::Explicit { width: 2, height: 1 });
/// assert_eq!(frame.offset, (3, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawFrame", into = "RawFrame")]
pub struct Frame {
    pub size: FrameSize,
    /// Placement inside the owning image's coordinate space
    pub offset: (i32, i32),
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A frame that inherits the owning image's size.
    pub fn new(pixels: Vec<u8>) -> Self {
        Self { size: FrameSize::Inherited, offset: (0, 0), pixels }
    }

    /// A frame with its own size.
    pub fn sized(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { size: FrameSize::Explicit { width, height }, offset: (0, 0), pixels }
    }

    /// A frame of `width * height` pixels all set to `index`.
    pub fn filled(width: u32, height: u32, index: u8) -> Self {
        Self::sized(width, height, vec![index; width as usize * height as usize])
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = (x, y);
        self
    }

    /// Width and height after inheritance.
    pub fn resolve_size(&self, inherited: (u32, u32)) -> (u32, u32) {
        self.size.resolve(inherited)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    height: Option<u32>,
    #[serde(default)]
    offset_x: i32,
    #[serde(default)]
    offset_y: i32,
    pixels: Vec<u8>,
}

impl TryFrom<RawFrame> for Frame {
    type Error = String;

    fn try_from(raw: RawFrame) -> Result<Self, Self::Error> {
        let size = match (raw.width, raw.height) {
            (Some(width), Some(height)) => FrameSize::Explicit { width, height },
            (None, None) => FrameSize::Inherited,
            _ => return Err("frame width and height must be given together".to_string()),
        };
        Ok(Frame { size, offset: (raw.offset_x, raw.offset_y), pixels: raw.pixels })
    }
}

impl From<Frame> for RawFrame {
    fn from(frame: Frame) -> Self {
        let (width, height) = match frame.size {
            FrameSize::Inherited => (None, None),
            FrameSize::Explicit { width, height } => (Some(width), Some(height)),
        };
        RawFrame { width, height, offset_x: frame.offset.0, offset_y: frame.offset.1, pixels: frame.pixels }
    }
}

/// One entry of a playback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStep {
    pub frame_index: usize,
    /// Delay before the next step; the configured default applies when absent
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post_delay_ms: Option<u32>,
}

impl AnimationStep {
    pub fn new(frame_index: usize, post_delay_ms: u32) -> Self {
        Self { frame_index, post_delay_ms: Some(post_delay_ms) }
    }
}

/// A palette-indexed image: default size, frames, palette and playback order.
///
/// Images are values. Edits consume the image and return one with a fresh
/// [`Version`]; clone first to keep the original around.
///
/// # Examples
///
/// ```
/// use tileview::models::{Frame, Image, Palette};
/// use image::Rgba;
///
/// let img = Image::new(2, 2, vec![Frame::new(vec![0; 4])], Palette::new(vec![Rgba([0, 0, 0, 255])]));
/// let before = img.version();
/// let edited = img.clone().with_frames(vec![Frame::new(vec![0; 4]), Frame::new(vec![0; 4])]);
///
/// assert_eq!(img.frames().len(), 1);
/// assert_eq!(edited.frames().len(), 2);
/// assert_ne!(before, edited.version());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    frames: Vec<Frame>,
    palette: Palette,
    #[serde(default)]
    animation: Vec<AnimationStep>,
    #[serde(skip)]
    version: Version,
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.frames == other.frames
            && self.palette == other.palette
            && self.animation == other.animation
    }
}

impl Image {
    pub fn new(width: u32, height: u32, frames: Vec<Frame>, palette: Palette) -> Self {
        Self { width, height, frames, palette, animation: Vec::new(), version: Version::next() }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn animation(&self) -> &[AnimationStep] {
        &self.animation
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Default size inherited by frames without their own.
    pub fn default_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sizes of every frame as stored (explicit or inherited).
    pub fn frame_sizes(&self) -> Vec<FrameSize> {
        self.frames.iter().map(|f| f.size).collect()
    }

    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self.version = Version::next();
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self.version = Version::next();
        self
    }

    pub fn with_animation(mut self, animation: Vec<AnimationStep>) -> Self {
        self.animation = animation;
        self.version = Version::next();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self.version = Version::next();
        self
    }
}
