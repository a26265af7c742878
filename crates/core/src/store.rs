//! Stroke Store
//!
//! Authoritative mapping from page number to the ordered list of committed
//! strokes. Pages without an entry are empty. Page numbers are not checked
//! against the document's page count here; callers own that validation.

use crate::stroke::{PageAnnotations, StrokeRef};
use std::collections::BTreeSet;

#[derive(Debug, Default, Clone)]
pub struct StrokeStore {
    pages: PageAnnotations,

    /// Set on every mutation, cleared once the contents are persisted
    dirty: bool,

    /// Pages mutated since the last drain, for render invalidation
    changed_pages: BTreeSet<u32>,
}

impl StrokeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stroke to the end of `page`'s list
    pub fn append(&mut self, page: u32, stroke: StrokeRef) {
        self.pages.entry(page).or_default().push(stroke);
        self.touch(page);
    }

    /// Replace `page`'s list wholesale; other pages are untouched
    pub fn replace_snapshot(&mut self, page: u32, strokes: Vec<StrokeRef>) {
        self.pages.insert(page, strokes);
        self.touch(page);
    }

    /// Strokes on `page` in z-order; empty when the page has none
    pub fn get(&self, page: u32) -> &[StrokeRef] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of strokes on `page`
    pub fn len(&self, page: u32) -> usize {
        self.get(page).len()
    }

    /// Whether no page holds a stroke
    pub fn is_empty(&self) -> bool {
        self.pages.values().all(Vec::is_empty)
    }

    /// Read-only view of every page
    pub fn annotations(&self) -> &PageAnnotations {
        &self.pages
    }

    /// Cheap copy of every page list (strokes are shared)
    pub fn snapshot(&self) -> PageAnnotations {
        self.pages.clone()
    }

    /// Page numbers that currently have an entry, ascending
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    /// Remove every page
    pub fn clear(&mut self) {
        let pages: Vec<u32> = self.pages.keys().copied().collect();
        self.pages.clear();
        for page in pages {
            self.touch(page);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the current contents as persisted
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Take the set of pages mutated since the previous call
    pub fn drain_changed_pages(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.changed_pages).into_iter().collect()
    }

    fn touch(&mut self, page: u32) {
        self.dirty = true;
        self.changed_pages.insert(page);
    }
}
