//! Export error types

use thiserror::Error;

/// Terminal failure of an export; no partial output is produced
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("input is not a PDF document")]
    NotPdf,
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("document has no pages")]
    NoPages,
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("malformed page {page}: {reason}")]
    MalformedPage { page: u32, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;
