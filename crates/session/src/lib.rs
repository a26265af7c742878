//! PDF Drawer Session Library
//!
//! Drives one annotated document: pointer capture, commits through history,
//! render-cache dirty tracking, zoom, the restore offer, debounced autosave
//! and export.

pub mod config;
pub mod session;

pub use config::{ConfigError, SessionConfig, ZoomConfig};
pub use session::DrawingSession;
