//! Page-space strokes to PDF drawing instructions
//!
//! Page space has its origin at the top-left with Y pointing down; PDF user
//! space has its origin at the bottom-left with Y pointing up, so every point
//! becomes `(x, page_height - y)`.
//!
//! Opaque strokes are drawn one segment at a time. Translucent strokes are
//! emitted as a single path inside their own graphics-state scope so that
//! overlapping segments blend once.

use crate::error::ExportResult;
use pdf_drawer_core::{PageAnnotations, Point, Stroke};

/// A point in PDF user space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPoint {
    pub x: f32,
    pub y: f32,
}

impl PdfPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Map a page-space point onto a page `page_height` units tall
pub fn flip_y(point: &Point, page_height: f32) -> PdfPoint {
    PdfPoint::new(point.x, page_height - point.y)
}

/// PDF line cap style (`J` operand)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    Butt = 0,
    Round = 1,
    Square = 2,
}

/// PDF line join style (`j` operand)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

/// Normalized RGB, each channel in 0.0..=1.0
pub type ColorTriple = (f32, f32, f32);

/// One straight opaque line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: PdfPoint,
    pub end: PdfPoint,
    pub width: f32,
    pub color: ColorTriple,
    pub line_cap: LineCap,
}

/// Low-level path operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    PushState,
    /// Stroke and fill alpha, applied through an extended graphics state
    SetAlpha(f32),
    SetStrokeColor(ColorTriple),
    SetLineWidth(f32),
    SetLineCap(LineCap),
    SetLineJoin(LineJoin),
    MoveTo(PdfPoint),
    LineTo(PdfPoint),
    Stroke,
    PopState,
}

/// Instructions for one stroke
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeCommands {
    /// Opaque stroke drawn segment by segment
    Segments(Vec<LineSegment>),
    /// Translucent stroke drawn as one grouped path
    Path(Vec<PathOp>),
}

/// Document that accepts drawing instructions per 1-based page
pub trait ExportTarget {
    fn page_count(&self) -> u32;

    /// Height of `page` in PDF units, `None` when out of range
    fn page_height(&self, page: u32) -> Option<f32>;

    fn draw_line(&mut self, page: u32, segment: &LineSegment) -> ExportResult<()>;

    fn push_operators(&mut self, page: u32, ops: &[PathOp]) -> ExportResult<()>;
}

/// Translate a stroke for a page `page_height` tall; `None` below two points
pub fn stroke_commands(stroke: &Stroke, page_height: f32) -> Option<StrokeCommands> {
    let points = stroke.points();
    if points.len() < 2 {
        return None;
    }

    let color = stroke.color().to_normalized();
    let flipped: Vec<PdfPoint> = points.iter().map(|p| flip_y(p, page_height)).collect();

    if stroke.is_opaque() {
        let segments = flipped
            .windows(2)
            .map(|pair| LineSegment {
                start: pair[0],
                end: pair[1],
                width: stroke.line_width(),
                color,
                line_cap: LineCap::Round,
            })
            .collect();
        return Some(StrokeCommands::Segments(segments));
    }

    let mut ops = Vec::with_capacity(flipped.len() + 8);
    ops.push(PathOp::PushState);
    ops.push(PathOp::SetAlpha(stroke.opacity()));
    ops.push(PathOp::SetStrokeColor(color));
    ops.push(PathOp::SetLineWidth(stroke.line_width()));
    ops.push(PathOp::SetLineCap(LineCap::Round));
    ops.push(PathOp::SetLineJoin(LineJoin::Round));
    ops.push(PathOp::MoveTo(flipped[0]));
    ops.extend(flipped[1..].iter().copied().map(PathOp::LineTo));
    ops.push(PathOp::Stroke);
    ops.push(PathOp::PopState);
    Some(StrokeCommands::Path(ops))
}

/// Counts reported by an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub pages_written: usize,
    pub strokes_written: usize,

    /// Strokes with fewer than two points
    pub strokes_skipped: usize,

    /// Annotated pages the document does not have
    pub pages_skipped: usize,
}

/// Emit every stroke of `annotations` onto `target`
pub fn export_annotations<T: ExportTarget + ?Sized>(
    target: &mut T,
    annotations: &PageAnnotations,
) -> ExportResult<ExportSummary> {
    let mut summary = ExportSummary::default();
    let page_count = target.page_count();

    for (&page, strokes) in annotations {
        if strokes.is_empty() {
            continue;
        }
        let height = match target.page_height(page) {
            Some(height) if page >= 1 && page <= page_count => height,
            _ => {
                tracing::warn!(page, page_count, "skipping annotations for missing page");
                summary.pages_skipped += 1;
                continue;
            }
        };

        let mut wrote_page = false;
        for stroke in strokes {
            match stroke_commands(stroke, height) {
                Some(StrokeCommands::Segments(segments)) => {
                    for segment in &segments {
                        target.draw_line(page, segment)?;
                    }
                }
                Some(StrokeCommands::Path(ops)) => target.push_operators(page, &ops)?,
                None => {
                    summary.strokes_skipped += 1;
                    continue;
                }
            }
            summary.strokes_written += 1;
            wrote_page = true;
        }
        if wrote_page {
            summary.pages_written += 1;
        }
    }

    tracing::debug!(?summary, "exported annotations");
    Ok(summary)
}
