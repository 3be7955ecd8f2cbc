//! Map compositing - layering resolved tiles onto a surface

mod cache;
mod render;
mod report;

pub use cache::{CachedTile, TileBitmapCache};
pub use render::{MapCompositor, DEFAULT_MAX_LOGGED_FAILURES};
pub use report::CompositeReport;
