//! PDF Drawer Export Library
//!
//! Maps page-space strokes onto PDF pages and writes a new document with
//! lopdf.

pub mod error;
pub mod naming;
pub mod pdf;
pub mod transform;

pub use error::{ExportError, ExportResult};
pub use naming::annotated_file_name;
pub use pdf::{
    export_pdf, export_pdf_with_summary, is_encrypted, is_pdf, LopdfTarget, SourceDocument,
};
pub use transform::{
    export_annotations, flip_y, stroke_commands, ExportSummary, ExportTarget, LineCap, LineJoin,
    LineSegment, PathOp, PdfPoint, StrokeCommands,
};
