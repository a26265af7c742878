//! lopdf-backed document access: page sizes and annotation output

use crate::error::{ExportError, ExportResult};
use crate::transform::{export_annotations, ExportSummary, ExportTarget, LineSegment, PathOp};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use pdf_drawer_core::{PageAnnotations, PageSize, PageSource, DEFAULT_PAGE_SIZE};
use std::collections::{BTreeMap, BTreeSet};

/// Magic bytes every PDF file starts with
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Reference chains and `/Parent` chains longer than this are treated as broken
const MAX_CHAIN: usize = 32;

const ENCRYPT_KEY: &[u8] = b"/Encrypt";

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Whether the raw file declares an encryption dictionary
///
/// Checked before parsing, since the parser may strip or consume `/Encrypt`
/// from the trailer while loading.
pub fn is_encrypted(bytes: &[u8]) -> bool {
    bytes
        .windows(ENCRYPT_KEY.len())
        .any(|window| window == ENCRYPT_KEY)
}

fn load(bytes: &[u8]) -> ExportResult<Document> {
    if !is_pdf(bytes) {
        return Err(ExportError::NotPdf);
    }
    if is_encrypted(bytes) {
        return Err(ExportError::EncryptedUnsupported);
    }
    let doc = Document::load_mem(bytes)?;
    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(ExportError::EncryptedUnsupported);
    }
    Ok(doc)
}

/// Follow indirect references to the object they point at
fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_CHAIN {
        match object {
            Object::Reference(id) => object = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Look up a page attribute, honoring inheritance through `/Parent`
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_CHAIN {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn media_box_size(doc: &Document, page_id: ObjectId) -> PageSize {
    inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .and_then(|array| {
            if array.len() != 4 {
                return None;
            }
            let x0 = array[0].as_float().ok()?;
            let y0 = array[1].as_float().ok()?;
            let x1 = array[2].as_float().ok()?;
            let y1 = array[3].as_float().ok()?;
            Some(PageSize::new((x1 - x0).abs(), (y1 - y0).abs()))
        })
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

fn page_table(doc: &Document) -> ExportResult<Vec<(ObjectId, PageSize)>> {
    let pages: Vec<_> = doc
        .get_pages()
        .into_values()
        .map(|id| (id, media_box_size(doc, id)))
        .collect();
    if pages.is_empty() {
        return Err(ExportError::NoPages);
    }
    Ok(pages)
}

/// Page sizes of a source document
#[derive(Debug, Clone)]
pub struct SourceDocument {
    sizes: Vec<PageSize>,
}

impl SourceDocument {
    pub fn from_bytes(bytes: &[u8]) -> ExportResult<Self> {
        let doc = load(bytes)?;
        let sizes = page_table(&doc)?.into_iter().map(|(_, size)| size).collect();
        Ok(Self { sizes })
    }
}

impl PageSource for SourceDocument {
    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn page_size(&self, page: u32) -> Option<PageSize> {
        self.sizes.get(page.checked_sub(1)? as usize).copied()
    }
}

/// Drawing appended to one page on save
#[derive(Debug, Default)]
struct PendingPage {
    operations: Vec<Operation>,

    /// Extended graphics states to register, by resource name
    alpha_states: Vec<(String, f32)>,
}

/// Writes annotations into a parsed PDF
///
/// Drawing is buffered per page and applied on [`LopdfTarget::save`]. The
/// page's existing content is wrapped in `q`/`Q` so its graphics state cannot
/// leak into the annotations.
pub struct LopdfTarget {
    doc: Document,
    pages: Vec<(ObjectId, PageSize)>,
    pending: BTreeMap<u32, PendingPage>,
}

impl LopdfTarget {
    pub fn from_bytes(bytes: &[u8]) -> ExportResult<Self> {
        let doc = load(bytes)?;
        let pages = page_table(&doc)?;
        Ok(Self {
            doc,
            pages,
            pending: BTreeMap::new(),
        })
    }

    fn page_id(&self, page: u32) -> ExportResult<ObjectId> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .map(|(id, _)| *id)
            .ok_or(ExportError::PageOutOfRange {
                page,
                page_count: self.pages.len() as u32,
            })
    }

    /// Names already used in the page's `/ExtGState` resources
    fn existing_state_names(&self, page_id: ObjectId) -> BTreeSet<Vec<u8>> {
        inherited(&self.doc, page_id, b"Resources")
            .and_then(|resources| resources.as_dict().ok())
            .and_then(|resources| resources.get(b"ExtGState").ok())
            .and_then(|states| resolve(&self.doc, states))
            .and_then(|states| states.as_dict().ok())
            .map(|states| states.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    fn allocate_state_name(&mut self, page: u32) -> ExportResult<String> {
        let page_id = self.page_id(page)?;
        let existing = self.existing_state_names(page_id);
        let pending = self.pending.entry(page).or_default();

        let mut n = pending.alpha_states.len();
        loop {
            let name = format!("GSpda{n}");
            let taken = existing.contains(name.as_bytes())
                || pending.alpha_states.iter().any(|(used, _)| *used == name);
            if !taken {
                return Ok(name);
            }
            n += 1;
        }
    }

    /// Apply buffered drawing and serialize the document
    pub fn save(mut self) -> ExportResult<Vec<u8>> {
        let pending = std::mem::take(&mut self.pending);
        for (page, drawing) in pending {
            let page_id = self.page_id(page)?;
            self.apply_page(page, page_id, drawing)?;
        }

        let mut output = Vec::new();
        self.doc.save_to(&mut output)?;
        Ok(output)
    }

    fn apply_page(
        &mut self,
        page: u32,
        page_id: ObjectId,
        drawing: PendingPage,
    ) -> ExportResult<()> {
        let malformed = |reason: &str| ExportError::MalformedPage {
            page,
            reason: reason.to_string(),
        };

        let resources = if drawing.alpha_states.is_empty() {
            None
        } else {
            let mut resources = inherited(&self.doc, page_id, b"Resources")
                .and_then(|obj| obj.as_dict().ok())
                .cloned()
                .unwrap_or_default();
            let mut states = resources
                .get(b"ExtGState")
                .ok()
                .and_then(|obj| resolve(&self.doc, obj))
                .and_then(|obj| obj.as_dict().ok())
                .cloned()
                .unwrap_or_default();

            for (name, alpha) in &drawing.alpha_states {
                let state_id = self.doc.add_object(dictionary! {
                    "Type" => "ExtGState",
                    "CA" => *alpha,
                    "ca" => *alpha,
                });
                states.set(name.as_bytes().to_vec(), Object::Reference(state_id));
            }
            resources.set("ExtGState", Object::Dictionary(states));
            Some(resources)
        };

        let existing: Vec<Object> = match self
            .doc
            .get_dictionary(page_id)
            .map_err(|_| malformed("page object is not a dictionary"))?
            .get(b"Contents")
        {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(_) => return Err(malformed("unsupported /Contents entry")),
            Err(_) => Vec::new(),
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        let mut operations = drawing.operations;
        if !existing.is_empty() {
            let save_state = Content {
                operations: vec![Operation::new("q", vec![])],
            };
            let save_id = self
                .doc
                .add_object(Stream::new(dictionary! {}, save_state.encode()?));
            contents.push(Object::Reference(save_id));
            contents.extend(existing);
            operations.insert(0, Operation::new("Q", vec![]));
        }
        // Leading newline keeps the first operator apart from the previous stream's last token
        let mut annotation_bytes = vec![b'\n'];
        annotation_bytes.extend(Content { operations }.encode()?);
        let annotation_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, annotation_bytes));
        contents.push(Object::Reference(annotation_id));

        let page_dict = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| malformed("page object is not a dictionary"))?;
        page_dict.set("Contents", Object::Array(contents));
        if let Some(resources) = resources {
            page_dict.set("Resources", Object::Dictionary(resources));
        }
        Ok(())
    }
}

fn rgb_operands((r, g, b): (f32, f32, f32)) -> Vec<Object> {
    vec![r.into(), g.into(), b.into()]
}

impl ExportTarget for LopdfTarget {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_height(&self, page: u32) -> Option<f32> {
        let index = page.checked_sub(1)?;
        self.pages.get(index as usize).map(|(_, size)| size.height)
    }

    fn draw_line(&mut self, page: u32, segment: &LineSegment) -> ExportResult<()> {
        self.page_id(page)?;
        let ops = &mut self.pending.entry(page).or_default().operations;
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("RG", rgb_operands(segment.color)));
        ops.push(Operation::new("w", vec![segment.width.into()]));
        ops.push(Operation::new("J", vec![(segment.line_cap as i64).into()]));
        ops.push(Operation::new("m", vec![segment.start.x.into(), segment.start.y.into()]));
        ops.push(Operation::new("l", vec![segment.end.x.into(), segment.end.y.into()]));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
        Ok(())
    }

    fn push_operators(&mut self, page: u32, path: &[PathOp]) -> ExportResult<()> {
        self.page_id(page)?;
        let mut operations = Vec::with_capacity(path.len());
        for op in path {
            let operation = match *op {
                PathOp::PushState => Operation::new("q", vec![]),
                PathOp::PopState => Operation::new("Q", vec![]),
                PathOp::SetAlpha(alpha) => {
                    let name = self.allocate_state_name(page)?;
                    let operation =
                        Operation::new("gs", vec![Object::Name(name.as_bytes().to_vec())]);
                    self.pending
                        .entry(page)
                        .or_default()
                        .alpha_states
                        .push((name, alpha));
                    operation
                }
                PathOp::SetStrokeColor(color) => Operation::new("RG", rgb_operands(color)),
                PathOp::SetLineWidth(width) => Operation::new("w", vec![width.into()]),
                PathOp::SetLineCap(cap) => Operation::new("J", vec![(cap as i64).into()]),
                PathOp::SetLineJoin(join) => Operation::new("j", vec![(join as i64).into()]),
                PathOp::MoveTo(p) => Operation::new("m", vec![p.x.into(), p.y.into()]),
                PathOp::LineTo(p) => Operation::new("l", vec![p.x.into(), p.y.into()]),
                PathOp::Stroke => Operation::new("S", vec![]),
            };
            operations.push(operation);
        }
        self.pending
            .entry(page)
            .or_default()
            .operations
            .extend(operations);
        Ok(())
    }
}

/// Export with counts of what was written
pub fn export_pdf_with_summary(
    source: &[u8],
    annotations: &PageAnnotations,
) -> ExportResult<(Vec<u8>, ExportSummary)> {
    let mut target = LopdfTarget::from_bytes(source)?;
    let summary = export_annotations(&mut target, annotations)?;
    Ok((target.save()?, summary))
}

/// Produce a new PDF with `annotations` drawn onto `source`
///
/// Any failure aborts the whole export.
pub fn export_pdf(source: &[u8], annotations: &PageAnnotations) -> ExportResult<Vec<u8>> {
    export_pdf_with_summary(source, annotations).map(|(bytes, _)| bytes)
}
