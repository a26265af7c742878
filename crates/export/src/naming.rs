//! Output file naming

const PDF_EXTENSION: &str = ".pdf";
const ANNOTATED_SUFFIX: &str = "-annotated";

/// `report.pdf` becomes `report-annotated.pdf`
///
/// The extension match is case-insensitive; names without a `.pdf`
/// extension get `-annotated.pdf` appended.
pub fn annotated_file_name(source_name: &str) -> String {
    let split = source_name.len().checked_sub(PDF_EXTENSION.len());
    match split {
        Some(at)
            if source_name.is_char_boundary(at)
                && source_name[at..].eq_ignore_ascii_case(PDF_EXTENSION) =>
        {
            format!("{}{ANNOTATED_SUFFIX}{}", &source_name[..at], &source_name[at..])
        }
        _ => format!("{source_name}{ANNOTATED_SUFFIX}{PDF_EXTENSION}"),
    }
}
