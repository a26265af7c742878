//! PDF Drawer Core Library
//!
//! Stroke data model, per-page undo/redo history and page geometry for the
//! freehand annotation engine.

pub mod color;
pub mod document;
pub mod geometry;
pub mod history;
pub mod store;
pub mod stroke;

pub use color::{
    BrushStyle, ColorParseError, LineSize, Rgb, EXTRA_COLORS, HIGHLIGHTER_OPACITY,
    HIGHLIGHTER_SIZE, PRIMARY_COLORS,
};
pub use document::{DocumentIdentity, FixedPages, PageSize, PageSource, DEFAULT_PAGE_SIZE};
pub use geometry::{simplify, Bounds, Point, DEFAULT_SIMPLIFY_TOLERANCE};
pub use history::{
    HistoryConfig, HistoryEntry, HistoryManager, Navigation, Thumbnail, BASELINE_LABEL,
    DEFAULT_HISTORY_DEPTH, RESTORED_LABEL,
};
pub use store::StrokeStore;
pub use stroke::{has_strokes, total_strokes, PageAnnotations, Stroke, StrokeError, StrokeRef};
