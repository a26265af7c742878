//! Stroke rasterization
//!
//! Single-point strokes are filled circles of diameter `line_width`. Longer
//! strokes are one path stroked with round caps and round joins, painted at
//! the stroke's opacity in a single pass so overlapping segments of the same
//! stroke never darken each other.

use pdf_drawer_core::{BrushStyle, Point, Stroke};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke as SkiaStroke,
    Transform,
};

/// Page space to surface pixels at zoom `scale`
pub fn page_transform(scale: f32) -> Transform {
    Transform::from_scale(scale, scale)
}

fn to_skia_paint(style: &BrushStyle) -> Paint<'static> {
    let alpha = (style.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    let mut paint = Paint::default();
    paint.set_color_rgba8(style.color.r, style.color.g, style.color.b, alpha);
    paint.anti_alias = true;
    paint
}

fn to_skia_stroke(style: &BrushStyle) -> SkiaStroke {
    SkiaStroke {
        width: style.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..SkiaStroke::default()
    }
}

/// Draw a point sequence with `style`, mapping page space through `transform`
///
/// Returns false when nothing could be drawn (no points, or a degenerate path).
pub fn draw_points(
    pixmap: &mut Pixmap,
    points: &[Point],
    style: &BrushStyle,
    transform: Transform,
) -> bool {
    let paint = to_skia_paint(style);

    match points {
        [] => false,
        [dot] => {
            let Some(circle) = PathBuilder::from_circle(dot.x, dot.y, style.line_width / 2.0)
            else {
                return false;
            };
            pixmap.fill_path(&circle, &paint, FillRule::Winding, transform, None);
            true
        }
        [first, rest @ ..] => {
            let mut builder = PathBuilder::new();
            builder.move_to(first.x, first.y);
            for point in rest {
                builder.line_to(point.x, point.y);
            }
            let Some(path) = builder.finish() else {
                return false;
            };
            pixmap.stroke_path(&path, &paint, &to_skia_stroke(style), transform, None);
            true
        }
    }
}

/// Draw a committed stroke
pub fn draw_stroke(pixmap: &mut Pixmap, stroke: &Stroke, transform: Transform) -> bool {
    draw_points(pixmap, stroke.points(), &stroke.style(), transform)
}

/// Reset every pixel to transparent
pub fn clear(pixmap: &mut Pixmap) {
    pixmap.fill(Color::TRANSPARENT);
}
