//! Committed freehand strokes
//!
//! A stroke is immutable once committed. Page lists and history snapshots
//! share strokes through `Arc`, so taking a snapshot never copies points.

use crate::color::{BrushStyle, Rgb};
use crate::geometry::{Bounds, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared handle to an immutable stroke
pub type StrokeRef = Arc<Stroke>;

/// Mapping from 1-based page number to that page's strokes in z-order
pub type PageAnnotations = BTreeMap<u32, Vec<StrokeRef>>;

/// Reasons a stroke cannot be constructed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrokeError {
    #[error("stroke has no points")]
    NoPoints,
    #[error("stroke point {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error("line width {0} must be positive and finite")]
    InvalidLineWidth(f32),
    #[error("opacity {0} must be in (0, 1]")]
    InvalidOpacity(f32),
}

fn default_opacity() -> f32 {
    1.0
}

/// One committed freehand polyline (or dot) with fixed color, width and opacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    points: Vec<Point>,
    color: Rgb,
    line_width: f32,
    #[serde(default = "default_opacity")]
    opacity: f32,
}

impl Stroke {
    /// Create a validated stroke
    pub fn new(
        points: Vec<Point>,
        color: Rgb,
        line_width: f32,
        opacity: f32,
    ) -> Result<Self, StrokeError> {
        let stroke = Self {
            points,
            color,
            line_width,
            opacity,
        };
        stroke.validate()?;
        Ok(stroke)
    }

    /// Create a stroke from captured points and the active brush
    pub fn with_style(points: Vec<Point>, style: &BrushStyle) -> Result<Self, StrokeError> {
        Self::new(points, style.color, style.line_width, style.opacity)
    }

    /// Check the invariants a deserialized stroke may have violated
    pub fn validate(&self) -> Result<(), StrokeError> {
        if self.points.is_empty() {
            return Err(StrokeError::NoPoints);
        }
        if let Some(index) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(StrokeError::NonFinitePoint { index });
        }
        if !(self.line_width.is_finite() && self.line_width > 0.0) {
            return Err(StrokeError::InvalidLineWidth(self.line_width));
        }
        if !(self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(StrokeError::InvalidOpacity(self.opacity));
        }
        Ok(())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Width in page units
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn style(&self) -> BrushStyle {
        BrushStyle {
            color: self.color,
            line_width: self.line_width,
            opacity: self.opacity,
        }
    }

    /// Single-point strokes render as a filled dot of diameter `line_width`
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }

    pub fn is_opaque(&self) -> bool {
        self.opacity >= 1.0
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_points(&self.points)
    }

    /// Copy of this stroke with its points replaced, style preserved
    pub fn with_points(&self, points: Vec<Point>) -> Result<Self, StrokeError> {
        Self::new(points, self.color, self.line_width, self.opacity)
    }
}

/// Total number of strokes across all pages
pub fn total_strokes(annotations: &PageAnnotations) -> usize {
    annotations.values().map(Vec::len).sum()
}

/// Whether at least one page holds a stroke
pub fn has_strokes(annotations: &PageAnnotations) -> bool {
    annotations.values().any(|strokes| !strokes.is_empty())
}
