//! Document identity and page geometry
//!
//! The annotation engine never parses documents itself. It identifies a
//! document by its file name and byte size, and asks a [`PageSource`] for page
//! counts and sizes.

use serde::{Deserialize, Serialize};

/// US Letter in points, used when a page declares no usable size
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

/// Stable identity of an opened document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentIdentity {
    /// File name as presented by the user, including extension
    pub name: String,

    /// Size of the file in bytes
    pub byte_size: u64,
}

impl DocumentIdentity {
    pub fn new(name: impl Into<String>, byte_size: u64) -> Self {
        Self {
            name: name.into(),
            byte_size,
        }
    }
}

/// Page dimensions in page-space units (points, 1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions at zoom `scale`, rounded up and at least 1x1
    pub fn at_scale(&self, scale: f32) -> (u32, u32) {
        let px = |v: f32| ((v * scale).ceil() as u32).max(1);
        (px(self.width), px(self.height))
    }
}

/// Page count and size provider for an opened document
pub trait PageSource {
    /// Number of pages in the document
    fn page_count(&self) -> u32;

    /// Size of 1-based `page`, or `None` when out of range
    fn page_size(&self, page: u32) -> Option<PageSize>;

    /// Pixel dimensions of `page` when displayed at `scale`
    fn display_size(&self, page: u32, scale: f32) -> Option<(u32, u32)> {
        self.page_size(page).map(|size| size.at_scale(scale))
    }
}

/// Fixed page sizes, for tests and for documents whose sizes were read ahead of time
#[derive(Debug, Clone, Default)]
pub struct FixedPages {
    sizes: Vec<PageSize>,
}

impl FixedPages {
    pub fn new(sizes: Vec<PageSize>) -> Self {
        Self { sizes }
    }

    /// `count` pages of the same size
    pub fn uniform(count: u32, size: PageSize) -> Self {
        Self {
            sizes: vec![size; count as usize],
        }
    }
}

impl PageSource for FixedPages {
    fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    fn page_size(&self, page: u32) -> Option<PageSize> {
        let index = page.checked_sub(1)?;
        self.sizes.get(index as usize).copied()
    }
}
