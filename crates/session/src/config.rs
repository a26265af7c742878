//! Session configuration
//!
//! Settings can be customized programmatically with the `with_*` builders or
//! read from environment variables:
//! - `PDF_DRAWER_HISTORY_DEPTH`: history entries kept per page (default: 50)
//! - `PDF_DRAWER_AUTOSAVE_MS`: autosave quiet period in milliseconds (default: 1000)
//! - `PDF_DRAWER_SIMPLIFY_TOLERANCE`: persistence simplification tolerance (default: 1.0)
//! - `PDF_DRAWER_CAPTURE_DOTS`: commit single-tap dots, `true`/`false` (default: false)

use pdf_drawer_core::HistoryConfig;
use pdf_drawer_storage::{AutosaveConfig, CodecConfig};
use std::time::Duration;

pub const HISTORY_DEPTH_ENV: &str = "PDF_DRAWER_HISTORY_DEPTH";
pub const AUTOSAVE_MS_ENV: &str = "PDF_DRAWER_AUTOSAVE_MS";
pub const SIMPLIFY_TOLERANCE_ENV: &str = "PDF_DRAWER_SIMPLIFY_TOLERANCE";
pub const CAPTURE_DOTS_ENV: &str = "PDF_DRAWER_CAPTURE_DOTS";

/// Errors that can occur while building configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration variable
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
}

/// Zoom range and step
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub initial: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 3.0,
            step: 0.25,
            initial: 1.0,
        }
    }
}

impl ZoomConfig {
    pub fn clamp(&self, scale: f32) -> f32 {
        if scale.is_nan() {
            return self.initial.clamp(self.min, self.max);
        }
        scale.clamp(self.min, self.max)
    }
}

/// Configuration for a drawing session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub history: HistoryConfig,
    pub codec: CodecConfig,
    pub autosave: AutosaveConfig,
    pub zoom: ZoomConfig,

    /// Commit single-point strokes as dots
    pub capture_dots: bool,

    /// Attach a rendered thumbnail to every history entry
    pub thumbnails: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            codec: CodecConfig::default(),
            autosave: AutosaveConfig::default(),
            zoom: ZoomConfig::default(),
            capture_dots: false,
            thumbnails: true,
        }
    }
}

impl SessionConfig {
    pub fn with_history_depth(mut self, max_depth: usize) -> Self {
        self.history = self.history.with_max_depth(max_depth);
        self
    }

    pub fn with_autosave(mut self, autosave: AutosaveConfig) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn with_codec(mut self, codec: CodecConfig) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_zoom(mut self, zoom: ZoomConfig) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_capture_dots(mut self, capture_dots: bool) -> Self {
        self.capture_dots = capture_dots;
        self
    }

    pub fn with_thumbnails(mut self, thumbnails: bool) -> Self {
        self.thumbnails = thumbnails;
        self
    }

    /// Defaults overridden by any `PDF_DRAWER_*` variables that are set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let invalid = |name: &str| ConfigError::InvalidValue(name.to_string());

        if let Some(val) = lookup(HISTORY_DEPTH_ENV) {
            let depth = val
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(HISTORY_DEPTH_ENV))?;
            if depth == 0 {
                return Err(invalid(HISTORY_DEPTH_ENV));
            }
            config.history = config.history.with_max_depth(depth);
        }

        if let Some(val) = lookup(AUTOSAVE_MS_ENV) {
            let ms = val
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(AUTOSAVE_MS_ENV))?;
            config.autosave = config.autosave.with_debounce(Duration::from_millis(ms));
        }

        if let Some(val) = lookup(SIMPLIFY_TOLERANCE_ENV) {
            let tolerance = val
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|t| t.is_finite() && *t >= 0.0)
                .ok_or_else(|| invalid(SIMPLIFY_TOLERANCE_ENV))?;
            config.codec = config.codec.with_tolerance(tolerance);
        }

        if let Some(val) = lookup(CAPTURE_DOTS_ENV) {
            config.capture_dots = match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid(CAPTURE_DOTS_ENV)),
            };
        }

        Ok(config)
    }
}
