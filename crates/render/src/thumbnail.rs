//! History thumbnails and saved-document previews
//!
//! Both fit a set of points into a small canvas: the bounding box is padded,
//! scaled to fit (never enlarged past 2x) and centered.

use crate::error::RenderError;
use crate::raster;
use pdf_drawer_core::{Bounds, BrushStyle, PageAnnotations, Rgb, Stroke, Thumbnail};
use tiny_skia::{Color, Pixmap, Transform};

pub const THUMBNAIL_WIDTH: u32 = 80;
pub const THUMBNAIL_HEIGHT: u32 = 60;

/// Upper bound on the fit scale, so tiny strokes are not blown up
pub const MAX_FIT_SCALE: f32 = 2.0;

/// Page-space to canvas mapping that centers `bounds` in a `width`x`height` canvas
fn fit_transform(bounds: &Bounds, width: u32, height: u32) -> (Transform, f32) {
    let (w, h) = (width as f32, height as f32);
    let content_w = bounds.width().max(f32::EPSILON);
    let content_h = bounds.height().max(f32::EPSILON);
    let scale = (w / content_w).min(h / content_h).min(MAX_FIT_SCALE);

    let offset_x = (w - content_w * scale) / 2.0;
    let offset_y = (h - content_h * scale) / 2.0;
    let transform = Transform::from_translate(offset_x, offset_y)
        .pre_scale(scale, scale)
        .pre_translate(-bounds.min_x, -bounds.min_y);
    (transform, scale)
}

/// Style whose width maps to at least one canvas pixel at `scale`
fn at_least_one_pixel(style: BrushStyle, scale: f32) -> BrushStyle {
    BrushStyle {
        line_width: style.line_width.max(1.0 / scale),
        ..style
    }
}

/// Render an 80x60 transparent thumbnail of a single stroke
pub fn stroke_thumbnail(stroke: &Stroke) -> Option<Thumbnail> {
    let bounds = stroke.bounds()?.padded(stroke.line_width());
    let mut pixmap = Pixmap::new(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)?;
    let (transform, scale) = fit_transform(&bounds, THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT);

    let style = at_least_one_pixel(stroke.style(), scale);
    raster::draw_points(&mut pixmap, stroke.points(), &style, transform);

    Some(Thumbnail::new(
        THUMBNAIL_WIDTH,
        THUMBNAIL_HEIGHT,
        pixmap.take(),
    ))
}

/// Canvas settings for saved-document previews
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    pub width: u32,
    pub height: u32,

    /// Page-space margin around the strokes' bounding box
    pub padding: f32,

    pub background: Rgb,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 150,
            padding: 20.0,
            background: Rgb::WHITE,
        }
    }
}

impl PreviewConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = background;
        self
    }
}

/// Draw every stroke of every page into one fitted preview canvas
///
/// Pages overlap in the preview; an annotation set without strokes yields a
/// blank canvas.
pub fn render_preview(
    annotations: &PageAnnotations,
    config: &PreviewConfig,
) -> Result<Pixmap, RenderError> {
    let mut pixmap =
        Pixmap::new(config.width, config.height).ok_or(RenderError::SurfaceAllocation {
            width: config.width,
            height: config.height,
        })?;
    let bg = config.background;
    pixmap.fill(Color::from_rgba8(bg.r, bg.g, bg.b, 255));

    let strokes: Vec<_> = annotations.values().flatten().collect();
    let Some(bounds) = Bounds::of_points(strokes.iter().flat_map(|s| s.points())) else {
        return Ok(pixmap);
    };
    let (transform, scale) = fit_transform(
        &bounds.padded(config.padding),
        config.width,
        config.height,
    );

    for stroke in strokes {
        let style = at_least_one_pixel(stroke.style(), scale);
        raster::draw_points(&mut pixmap, stroke.points(), &style, transform);
    }
    Ok(pixmap)
}

/// Encode a surface as PNG
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    pixmap
        .encode_png()
        .map_err(|e| RenderError::PngEncode(e.to_string()))
}
