//! PDF Drawer Render Library
//!
//! Rasterizes strokes with tiny-skia: the incremental per-page render cache,
//! history thumbnails and saved-document previews.

pub mod cache;
pub mod error;
pub mod raster;
pub mod thumbnail;

pub use cache::{BakeOutcome, CacheStats, LiveStroke, RenderCache};
pub use error::RenderError;
pub use raster::{draw_points, draw_stroke, page_transform};
pub use thumbnail::{
    encode_png, render_preview, stroke_thumbnail, PreviewConfig, THUMBNAIL_HEIGHT,
    THUMBNAIL_WIDTH,
};

pub use tiny_skia::Pixmap;
