//! Per-page undo/redo history
//!
//! Every page keeps an ordered list of full stroke-list snapshots plus a
//! current index. Committing after an undo discards the redo branch, and the
//! list is capped at `HistoryConfig::max_depth` entries by dropping the
//! oldest. All navigation is total: out-of-range requests are ignored.
//!
//! The history manager owns the [`StrokeStore`], which makes it the only
//! component able to replace a page's stroke list wholesale.

use crate::store::StrokeStore;
use crate::stroke::{PageAnnotations, Stroke, StrokeRef};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Recommended history depth per page
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

pub const BASELINE_LABEL: &str = "Default";
pub const RESTORED_LABEL: &str = "Restored";

static BASELINE_HISTORY: [HistoryEntry; 1] = [HistoryEntry::baseline()];

/// Configuration for the history manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of entries kept per page (at least 1)
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl HistoryConfig {
    /// Set the maximum history depth per page
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn effective_depth(&self) -> usize {
        self.max_depth.max(1)
    }
}

/// Small rendered preview attached to a history entry
///
/// Pixels are premultiplied RGBA, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Thumbnail {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Memory size of the pixel buffer in bytes
    pub fn memory_size(&self) -> usize {
        self.pixels.len()
    }
}

/// A page's full stroke list at one point in undo/redo time
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub strokes: Vec<StrokeRef>,
    pub label: Cow<'static, str>,
    pub thumbnail: Option<Thumbnail>,
}

impl HistoryEntry {
    /// The empty-stroke entry every page history starts from
    pub const fn baseline() -> Self {
        Self {
            strokes: Vec::new(),
            label: Cow::Borrowed(BASELINE_LABEL),
            thumbnail: None,
        }
    }
}

/// History of one page: entries plus the current position
#[derive(Debug, Clone)]
struct PageHistory {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl PageHistory {
    fn new() -> Self {
        Self {
            entries: vec![HistoryEntry::baseline()],
            index: 0,
        }
    }

    fn restored(strokes: Vec<StrokeRef>) -> Self {
        Self {
            entries: vec![HistoryEntry {
                strokes,
                label: Cow::Borrowed(RESTORED_LABEL),
                thumbnail: None,
            }],
            index: 0,
        }
    }

    /// Drop entries from the front until at most `depth` remain, keeping the
    /// current position pointed at the same entry where it survives
    fn enforce_depth(&mut self, depth: usize) {
        let overflow = self.entries.len().saturating_sub(depth);
        if overflow == 0 {
            return;
        }
        self.entries.drain(..overflow);
        self.index = self
            .index
            .saturating_sub(overflow)
            .min(self.entries.len() - 1);
    }
}

/// Outcome of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The page moved to the given history index
    Moved(usize),
    /// The request was out of range and ignored
    Ignored,
}

impl Navigation {
    pub fn moved(self) -> bool {
        matches!(self, Navigation::Moved(_))
    }
}

/// Per-page undo/redo manager built on the stroke store
#[derive(Debug, Default)]
pub struct HistoryManager {
    config: HistoryConfig,
    store: StrokeStore,
    pages: HashMap<u32, PageHistory>,
}

impl HistoryManager {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            store: StrokeStore::new(),
            pages: HashMap::new(),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Read access to the stroke store
    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    /// Take the pages whose stroke lists changed since the last call
    pub fn drain_changed_pages(&mut self) -> Vec<u32> {
        self.store.drain_changed_pages()
    }

    /// Mark the store contents as persisted
    pub fn mark_persisted(&mut self) {
        self.store.mark_clean();
    }

    /// Commit a new stroke to `page`
    pub fn commit(&mut self, page: u32, stroke: Stroke) -> usize {
        self.commit_with_thumbnail(page, stroke, None)
    }

    /// Commit a new stroke to `page`, attaching a preview to its history entry.
    ///
    /// Truncates the redo branch, appends a snapshot of the page with the
    /// stroke added, applies the depth cap and appends the stroke to the
    /// store. Returns the new history index.
    pub fn commit_with_thumbnail(
        &mut self,
        page: u32,
        stroke: Stroke,
        thumbnail: Option<Thumbnail>,
    ) -> usize {
        let stroke: StrokeRef = Arc::new(stroke);
        let depth = self.config.effective_depth();

        let mut strokes = self.store.get(page).to_vec();
        strokes.push(Arc::clone(&stroke));

        let history = self.pages.entry(page).or_insert_with(PageHistory::new);
        history.entries.truncate(history.index + 1);
        let label = format!("Stroke {}", history.entries.len());
        history.entries.push(HistoryEntry {
            strokes,
            label: Cow::Owned(label),
            thumbnail,
        });
        history.index = history.entries.len() - 1;
        history.enforce_depth(depth);
        let index = history.index;

        self.store.append(page, stroke);

        tracing::debug!(page, index, "committed stroke");
        index
    }

    /// Step back one entry; ignored at the first entry
    pub fn undo(&mut self, page: u32) -> Navigation {
        match self.index(page) {
            0 => Navigation::Ignored,
            index => self.apply(page, index - 1),
        }
    }

    /// Step forward one entry; ignored at the last entry
    pub fn redo(&mut self, page: u32) -> Navigation {
        if self.can_redo(page) {
            self.apply(page, self.index(page) + 1)
        } else {
            Navigation::Ignored
        }
    }

    /// Move directly to entry `index`; ignored when out of range
    pub fn jump_to(&mut self, page: u32, index: usize) -> Navigation {
        if index >= self.len(page) {
            return Navigation::Ignored;
        }
        if index == self.index(page) {
            return Navigation::Moved(index);
        }
        self.apply(page, index)
    }

    pub fn can_undo(&self, page: u32) -> bool {
        self.index(page) > 0
    }

    pub fn can_redo(&self, page: u32) -> bool {
        self.index(page) + 1 < self.len(page)
    }

    /// Current history index of `page`
    pub fn index(&self, page: u32) -> usize {
        self.pages.get(&page).map_or(0, |history| history.index)
    }

    /// Number of history entries of `page`
    pub fn len(&self, page: u32) -> usize {
        self.entries(page).len()
    }

    /// History entries of `page`; a page without history has only the baseline
    pub fn entries(&self, page: u32) -> &[HistoryEntry] {
        self.pages
            .get(&page)
            .map_or(&BASELINE_HISTORY[..], |history| &history.entries[..])
    }

    /// Replace all strokes with `annotations`, rebuilding a single-entry
    /// history for every restored page
    pub fn restore(&mut self, annotations: PageAnnotations) {
        self.reset();
        for (page, strokes) in annotations {
            self.pages.insert(page, PageHistory::restored(strokes.clone()));
            self.store.replace_snapshot(page, strokes);
        }
        tracing::debug!(pages = self.pages.len(), "restored annotations");
    }

    /// Clear every page's strokes and history
    pub fn reset(&mut self) {
        self.pages.clear();
        self.store.clear();
    }

    fn apply(&mut self, page: u32, index: usize) -> Navigation {
        let Some(history) = self.pages.get_mut(&page) else {
            return Navigation::Ignored;
        };
        let Some(entry) = history.entries.get(index) else {
            return Navigation::Ignored;
        };
        history.index = index;
        let strokes = entry.strokes.clone();
        self.store.replace_snapshot(page, strokes);

        tracing::debug!(page, index, "moved in history");
        Navigation::Moved(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::geometry::Point;

    fn stroke(x: f32) -> Stroke {
        Stroke::new(
            vec![Point::new(x, 0.0), Point::new(x + 10.0, 0.0)],
            Rgb::new(255, 0, 0),
            4.0,
            1.0,
        )
        .unwrap()
    }

    fn xs(manager: &HistoryManager, page: u32) -> Vec<f32> {
        manager
            .store()
            .get(page)
            .iter()
            .map(|s| s.points()[0].x)
            .collect()
    }

    #[test]
    fn test_fresh_page_has_baseline() {
        let manager = HistoryManager::default();
        assert_eq!(manager.len(1), 1);
        assert_eq!(manager.index(1), 0);
        assert_eq!(manager.entries(1)[0].label, BASELINE_LABEL);
        assert!(manager.entries(1)[0].strokes.is_empty());
        assert!(!manager.can_undo(1));
        assert!(!manager.can_redo(1));
    }

    #[test]
    fn test_commit_undo_redo_scenario() {
        let mut manager = HistoryManager::default();
        manager.commit(1, stroke(0.0));

        assert_eq!(manager.len(1), 2);
        assert_eq!(manager.index(1), 1);
        assert_eq!(manager.entries(1)[1].label, "Stroke 1");

        assert_eq!(manager.undo(1), Navigation::Moved(0));
        assert!(manager.store().get(1).is_empty());

        assert_eq!(manager.redo(1), Navigation::Moved(1));
        assert_eq!(manager.store().get(1).len(), 1);
        assert_eq!(*manager.store().get(1)[0], stroke(0.0));
    }

    #[test]
    fn test_can_undo_only_false_at_zero() {
        let mut manager = HistoryManager::default();
        assert!(!manager.can_undo(1));
        for i in 0..5 {
            manager.commit(1, stroke(i as f32));
            assert!(manager.can_undo(1));
            assert!(!manager.can_redo(1));
        }
        for _ in 0..5 {
            assert!(manager.can_undo(1));
            manager.undo(1);
        }
        assert!(!manager.can_undo(1));
        assert!(manager.can_redo(1));
    }

    #[test]
    fn test_commit_after_undo_discards_redo_branch() {
        let mut manager = HistoryManager::default();
        manager.commit(1, stroke(0.0));
        manager.commit(1, stroke(1.0));
        manager.undo(1);
        manager.undo(1);
        assert_eq!(manager.index(1), 0);

        manager.commit(1, stroke(2.0));
        assert!(!manager.can_redo(1));
        assert_eq!(manager.len(1), 2);
        assert_eq!(xs(&manager, 1), vec![2.0]);
        assert_eq!(manager.redo(1), Navigation::Ignored);
    }

    #[test]
    fn test_out_of_range_navigation_is_ignored() {
        let mut manager = HistoryManager::default();
        assert_eq!(manager.undo(3), Navigation::Ignored);
        assert_eq!(manager.redo(3), Navigation::Ignored);
        assert_eq!(manager.jump_to(3, 1), Navigation::Ignored);

        manager.commit(3, stroke(0.0));
        assert_eq!(manager.jump_to(3, 2), Navigation::Ignored);
        assert_eq!(manager.index(3), 1);
        assert_eq!(manager.redo(3), Navigation::Ignored);
    }

    #[test]
    fn test_jump_to_current_index_is_noop() {
        let mut manager = HistoryManager::default();
        manager.commit(2, stroke(0.0));
        manager.commit(2, stroke(1.0));
        manager.drain_changed_pages();

        let before = xs(&manager, 2);
        assert_eq!(manager.jump_to(2, 2), Navigation::Moved(2));
        assert_eq!(xs(&manager, 2), before);
        assert_eq!(manager.len(2), 3);
        assert!(manager.drain_changed_pages().is_empty());
    }

    #[test]
    fn test_jump_to_restores_snapshot() {
        let mut manager = HistoryManager::default();
        for i in 0..4 {
            manager.commit(1, stroke(i as f32));
        }
        assert_eq!(manager.jump_to(1, 2), Navigation::Moved(2));
        assert_eq!(xs(&manager, 1), vec![0.0, 1.0]);
        assert!(manager.can_redo(1));

        manager.jump_to(1, 0);
        assert!(manager.store().get(1).is_empty());
    }

    #[test]
    fn test_depth_cap() {
        let mut manager = HistoryManager::new(HistoryConfig::default().with_max_depth(50));
        for i in 0..60 {
            manager.commit(1, stroke(i as f32));
        }
        assert_eq!(manager.len(1), 50);
        assert_eq!(manager.index(1), 49);
        assert!(!manager.can_redo(1));
        assert_eq!(manager.store().get(1).len(), 60);

        // The oldest surviving entry holds 11 strokes
        manager.jump_to(1, 0);
        assert_eq!(manager.store().get(1).len(), 11);
    }

    #[test]
    fn test_depth_cap_after_undo() {
        let mut manager = HistoryManager::new(HistoryConfig::default().with_max_depth(3));
        for i in 0..3 {
            manager.commit(1, stroke(i as f32));
        }
        manager.undo(1);
        manager.commit(1, stroke(9.0));

        assert_eq!(manager.len(1), 3);
        assert_eq!(manager.index(1), 2);
        assert_eq!(xs(&manager, 1), vec![0.0, 1.0, 9.0]);
    }

    #[test]
    fn test_zero_depth_is_clamped() {
        let mut manager = HistoryManager::new(HistoryConfig::default().with_max_depth(0));
        manager.commit(1, stroke(0.0));
        assert_eq!(manager.len(1), 1);
        assert_eq!(manager.index(1), 0);
        assert!(!manager.can_undo(1));
    }

    #[test]
    fn test_pages_are_independent() {
        let mut manager = HistoryManager::default();
        manager.commit(1, stroke(0.0));
        manager.commit(2, stroke(1.0));
        manager.undo(1);

        assert!(manager.store().get(1).is_empty());
        assert_eq!(manager.store().get(2).len(), 1);
        assert!(manager.can_undo(2));
    }

    #[test]
    fn test_restore_rebuilds_minimal_history() {
        let mut manager = HistoryManager::default();
        manager.commit(5, stroke(0.0));

        let mut annotations = PageAnnotations::new();
        annotations.insert(2, vec![Arc::new(stroke(3.0)), Arc::new(stroke(4.0))]);
        manager.restore(annotations);

        assert!(manager.store().get(5).is_empty());
        assert_eq!(manager.store().get(2).len(), 2);
        assert_eq!(manager.len(2), 1);
        assert_eq!(manager.entries(2)[0].label, RESTORED_LABEL);
        assert!(!manager.can_undo(2));

        manager.commit(2, stroke(5.0));
        assert_eq!(manager.store().get(2).len(), 3);
        manager.undo(2);
        assert_eq!(manager.store().get(2).len(), 2);
    }

    #[test]
    fn test_thumbnail_attached_to_entry() {
        let mut manager = HistoryManager::default();
        let thumb = Thumbnail::new(2, 1, vec![0; 8]);
        manager.commit_with_thumbnail(1, stroke(0.0), Some(thumb.clone()));
        assert_eq!(manager.entries(1)[1].thumbnail.as_ref(), Some(&thumb));
    }
}
