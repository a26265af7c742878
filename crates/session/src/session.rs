//! Drawing session controller
//!
//! A [`DrawingSession`] ties one opened document to the annotation engine:
//! pointer events become page-space strokes, commits flow through the history
//! manager into the stroke store, the render cache is told which pages to
//! redraw and autosave is rescheduled. Every operation completes before it
//! returns, so callers never observe a half-applied commit.

use crate::config::SessionConfig;
use pdf_drawer_core::{
    BrushStyle, DocumentIdentity, HistoryManager, Navigation, PageSource, Point, Stroke,
    StrokeStore,
};
use pdf_drawer_export::{annotated_file_name, export_pdf, ExportResult, SourceDocument};
use pdf_drawer_render::{stroke_thumbnail, BakeOutcome, LiveStroke, Pixmap, RenderCache};
use pdf_drawer_storage::{AnnotationPersistence, AutosaveScheduler, BlobStore};
use std::time::Instant;

/// Stroke being drawn, not yet committed
#[derive(Debug, Clone)]
struct Capture {
    page: u32,
    start: Point,
    points: Vec<Point>,
    style: BrushStyle,
}

pub struct DrawingSession<S> {
    config: SessionConfig,
    identity: DocumentIdentity,
    pages: Box<dyn PageSource>,
    history: HistoryManager,
    cache: RenderCache,
    persistence: AnnotationPersistence<S>,
    autosave: AutosaveScheduler,
    scale: f32,
    brush: Option<BrushStyle>,
    current_page: u32,
    capture: Option<Capture>,
    straight_line: bool,
    restore_offered: bool,
}

impl<S: BlobStore> DrawingSession<S> {
    /// Open a session over `pages`, checking `store` for saved annotations
    ///
    /// Saved annotations are only offered, never loaded implicitly; see
    /// [`restore_saved`](Self::restore_saved).
    pub fn open(
        config: SessionConfig,
        identity: DocumentIdentity,
        pages: Box<dyn PageSource>,
        store: S,
    ) -> Self {
        let persistence = AnnotationPersistence::new(store, &identity, config.codec.clone());
        let restore_offered = persistence.has_saved_data();
        if restore_offered {
            tracing::info!(key = persistence.key(), "saved annotations available");
        }

        Self {
            history: HistoryManager::new(config.history.clone()),
            autosave: AutosaveScheduler::new(config.autosave.clone()),
            scale: config.zoom.clamp(config.zoom.initial),
            cache: RenderCache::new(),
            persistence,
            identity,
            pages,
            brush: None,
            current_page: 1,
            capture: None,
            straight_line: false,
            restore_offered,
            config,
        }
    }

    /// Open a session over PDF bytes
    ///
    /// Input that is not a readable PDF is rejected before any session state
    /// exists.
    pub fn open_pdf(
        config: SessionConfig,
        name: &str,
        bytes: &[u8],
        store: S,
    ) -> ExportResult<Self> {
        let source = SourceDocument::from_bytes(bytes)?;
        let identity = DocumentIdentity::new(name, bytes.len() as u64);
        Ok(Self::open(config, identity, Box::new(source), store))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn identity(&self) -> &DocumentIdentity {
        &self.identity
    }

    pub fn page_count(&self) -> u32 {
        self.pages.page_count()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn store(&self) -> &StrokeStore {
        self.history.store()
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn autosave(&self) -> &AutosaveScheduler {
        &self.autosave
    }

    pub fn persistence(&self) -> &AnnotationPersistence<S> {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut AnnotationPersistence<S> {
        &mut self.persistence
    }

    // Restore banner

    /// Whether saved annotations are waiting to be restored
    pub fn restore_available(&self) -> bool {
        self.restore_offered
    }

    /// Load saved annotations into the session, replacing its strokes
    ///
    /// Returns false when nothing usable is stored. A restore counts as a
    /// change and arms autosave.
    pub fn restore_saved(&mut self) -> bool {
        self.restore_offered = false;
        let Some(annotations) = self.persistence.load() else {
            return false;
        };

        self.capture = None;
        self.history.restore(annotations);
        self.cache.clear();
        self.sync_dirty_pages();
        self.autosave.note_change(Instant::now());
        true
    }

    /// Hide the restore offer without loading anything
    pub fn dismiss_restore(&mut self) {
        self.restore_offered = false;
    }

    // Tools and navigation

    /// Select a brush, or `None` for pointer mode
    pub fn set_brush(&mut self, brush: Option<BrushStyle>) {
        self.brush = brush;
    }

    pub fn brush(&self) -> Option<BrushStyle> {
        self.brush
    }

    /// Constrain the stroke being drawn to a straight line from its start
    pub fn set_straight_line(&mut self, enabled: bool) {
        self.straight_line = enabled;
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Switch to `page`, discarding any stroke in progress
    ///
    /// Pages outside the document are ignored.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page == 0 || page > self.pages.page_count() {
            return false;
        }
        self.capture = None;
        self.current_page = page;
        true
    }

    // Pointer capture

    pub fn is_drawing(&self) -> bool {
        self.capture.is_some()
    }

    /// Points of the stroke in progress, in page space
    pub fn live_points(&self) -> &[Point] {
        self.capture
            .as_ref()
            .map_or(&[][..], |capture| capture.points.as_slice())
    }

    /// Start a stroke at surface pixel `(x_px, y_px)` on the current page
    ///
    /// Returns false in pointer mode.
    pub fn pointer_down(&mut self, x_px: f32, y_px: f32) -> bool {
        let Some(style) = self.brush else {
            return false;
        };
        let point = Point::from_surface(x_px, y_px, self.scale);
        self.capture = Some(Capture {
            page: self.current_page,
            start: point,
            points: vec![point],
            style,
        });
        true
    }

    /// Extend the stroke in progress; returns whether a redraw is needed
    pub fn pointer_move(&mut self, x_px: f32, y_px: f32) -> bool {
        let point = Point::from_surface(x_px, y_px, self.scale);
        let straight_line = self.straight_line;
        let Some(capture) = self.capture.as_mut() else {
            return false;
        };

        if straight_line {
            capture.points = vec![capture.start, point];
        } else {
            capture.points.push(point);
        }
        let page = capture.page;
        self.cache.mark_dirty(page);
        true
    }

    /// Finish the stroke in progress
    ///
    /// Returns the new history index when a stroke was committed.
    pub fn pointer_up(&mut self) -> Option<usize> {
        let capture = self.capture.take()?;
        let min_points = if self.config.capture_dots { 1 } else { 2 };
        if capture.points.len() < min_points {
            self.cache.mark_dirty(capture.page);
            return None;
        }

        let stroke = match Stroke::with_style(capture.points, &capture.style) {
            Ok(stroke) => stroke,
            Err(error) => {
                tracing::warn!(page = capture.page, %error, "discarding invalid stroke");
                self.cache.mark_dirty(capture.page);
                return None;
            }
        };
        Some(self.commit(capture.page, stroke))
    }

    /// Leaving the surface while drawing finishes the stroke
    pub fn pointer_leave(&mut self) -> Option<usize> {
        self.pointer_up()
    }

    /// Commit a finished stroke to `page`
    ///
    /// Updates history and the stroke store, marks the page dirty and
    /// reschedules autosave, in that order.
    pub fn commit(&mut self, page: u32, stroke: Stroke) -> usize {
        let thumbnail = if self.config.thumbnails {
            stroke_thumbnail(&stroke)
        } else {
            None
        };
        let index = self.history.commit_with_thumbnail(page, stroke, thumbnail);
        self.sync_dirty_pages();
        self.autosave.note_change(Instant::now());
        index
    }

    // History

    pub fn undo(&mut self, page: u32) -> Navigation {
        let navigation = self.history.undo(page);
        self.after_navigation(navigation)
    }

    pub fn redo(&mut self, page: u32) -> Navigation {
        let navigation = self.history.redo(page);
        self.after_navigation(navigation)
    }

    pub fn jump_to(&mut self, page: u32, index: usize) -> Navigation {
        let before = self.history.index(page);
        let navigation = self.history.jump_to(page, index);
        if navigation == Navigation::Moved(before) {
            return navigation;
        }
        self.after_navigation(navigation)
    }

    fn after_navigation(&mut self, navigation: Navigation) -> Navigation {
        if navigation.moved() {
            self.sync_dirty_pages();
            self.autosave.note_change(Instant::now());
        }
        navigation
    }

    /// Clear strokes and history on every page
    pub fn reset(&mut self) {
        self.capture = None;
        self.history.reset();
        self.cache.clear();
        self.sync_dirty_pages();
        self.autosave.note_change(Instant::now());
    }

    fn sync_dirty_pages(&mut self) {
        for page in self.history.drain_changed_pages() {
            self.cache.mark_dirty(page);
        }
    }

    // Zoom

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Current zoom as a rounded percentage
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_scale(self.scale + self.config.zoom.step)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_scale(self.scale - self.config.zoom.step)
    }

    pub fn set_zoom_percent(&mut self, percent: f32) -> f32 {
        self.set_scale(percent / 100.0)
    }

    fn set_scale(&mut self, scale: f32) -> f32 {
        let scale = self.config.zoom.clamp(scale);
        if scale != self.scale {
            tracing::debug!(from = self.scale, to = scale, "zoom changed");
            self.scale = scale;
            self.cache.mark_all_dirty();
        }
        self.scale
    }

    // Rendering

    /// Pixel size of `page` at the current zoom
    pub fn display_size(&self, page: u32) -> Option<(u32, u32)> {
        self.pages.display_size(page, self.scale)
    }

    /// Blank surface sized for `page` at the current zoom
    pub fn new_surface(&self, page: u32) -> Option<Pixmap> {
        let (width, height) = self.display_size(page)?;
        Pixmap::new(width, height)
    }

    /// Pages awaiting a redraw
    pub fn dirty_pages(&self) -> Vec<u32> {
        self.cache.dirty_pages()
    }

    /// Draw `page`'s annotation layer onto `target`, stroke in progress included
    pub fn render(&mut self, page: u32, target: &mut Pixmap) -> BakeOutcome {
        let live = self
            .capture
            .as_ref()
            .filter(|capture| capture.page == page)
            .map(|capture| LiveStroke {
                points: &capture.points,
                style: capture.style,
            });
        let strokes = self.history.store().get(page);
        self.cache.render(page, strokes, self.scale, target, live)
    }

    // Persistence

    /// Write annotations if the autosave quiet period has elapsed
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        self.autosave.poll(now) && self.save_now()
    }

    /// Write immediately if anything changed this session, e.g. on close
    pub fn flush(&mut self) -> bool {
        if !self.autosave.is_armed() {
            return false;
        }
        self.autosave.cancel();
        self.save_now()
    }

    /// Failed writes are logged and dropped; the annotations stay in memory.
    fn save_now(&mut self) -> bool {
        match self.persistence.save(self.history.store().annotations()) {
            Ok(()) => {
                self.history.mark_persisted();
                true
            }
            Err(error) => {
                tracing::warn!(key = self.persistence.key(), %error, "dropping annotation save");
                false
            }
        }
    }

    // Export

    /// Annotated copy of `source`, which must be the document this session
    /// was opened for
    pub fn export(&self, source: &[u8]) -> ExportResult<Vec<u8>> {
        export_pdf(source, self.history.store().annotations())
    }

    /// Download name for the exported document
    pub fn export_file_name(&self) -> String {
        annotated_file_name(&self.identity.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoomConfig;
    use lopdf::content::Content;
    use lopdf::{dictionary, Document, Object};
    use pdf_drawer_core::{FixedPages, LineSize, PageSize, Rgb, RESTORED_LABEL};
    use pdf_drawer_storage::{AutosaveConfig, MemoryBlobStore, StorageError, StorageResult};
    use std::time::Duration;

    const NAME: &str = "lecture.pdf";

    fn session_with(
        config: SessionConfig,
        store: MemoryBlobStore,
    ) -> DrawingSession<MemoryBlobStore> {
        DrawingSession::open(
            config,
            DocumentIdentity::new(NAME, 4096),
            Box::new(FixedPages::uniform(3, PageSize::new(200.0, 100.0))),
            store,
        )
    }

    fn session() -> DrawingSession<MemoryBlobStore> {
        session_with(SessionConfig::default(), MemoryBlobStore::new())
    }

    fn draw(
        session: &mut DrawingSession<MemoryBlobStore>,
        from: (f32, f32),
        to: (f32, f32),
    ) -> Option<usize> {
        session.pointer_down(from.0, from.1);
        session.pointer_move((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
        session.pointer_move(to.0, to.1);
        session.pointer_up()
    }

    fn red_pen() -> Option<BrushStyle> {
        Some(BrushStyle::pen(Rgb::RED, LineSize::Medium))
    }

    #[test]
    fn test_commit_undo_redo() {
        let mut session = session();
        session.set_brush(red_pen());

        assert_eq!(draw(&mut session, (0.0, 0.0), (10.0, 0.0)), Some(1));
        assert_eq!(session.history().len(1), 2);
        assert_eq!(session.store().len(1), 1);
        assert!(session.dirty_pages().contains(&1));

        assert_eq!(session.undo(1), Navigation::Moved(0));
        assert!(session.store().get(1).is_empty());
        assert_eq!(session.undo(1), Navigation::Ignored);

        assert_eq!(session.redo(1), Navigation::Moved(1));
        assert_eq!(session.store().len(1), 1);
        assert_eq!(session.store().get(1)[0].color(), Rgb::RED);
        assert_eq!(session.store().get(1)[0].line_width(), 4.0);
    }

    #[test]
    fn test_commit_attaches_thumbnail() {
        let mut session = session();
        session.set_brush(red_pen());
        draw(&mut session, (0.0, 0.0), (40.0, 30.0));

        let entry = &session.history().entries(1)[1];
        let thumbnail = entry.thumbnail.as_ref().expect("thumbnail attached");
        assert_eq!((thumbnail.width, thumbnail.height), (80, 60));

        let mut session = session_with(
            SessionConfig::default().with_thumbnails(false),
            MemoryBlobStore::new(),
        );
        session.set_brush(red_pen());
        draw(&mut session, (0.0, 0.0), (40.0, 30.0));
        assert!(session.history().entries(1)[1].thumbnail.is_none());
    }

    #[test]
    fn test_pointer_mode_does_not_draw() {
        let mut session = session();
        assert!(!session.pointer_down(5.0, 5.0));
        assert!(!session.pointer_move(6.0, 6.0));
        assert_eq!(session.pointer_up(), None);
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_points_are_divided_by_scale() {
        let mut session = session();
        session.set_brush(red_pen());
        session.set_zoom_percent(200.0);
        draw(&mut session, (20.0, 40.0), (60.0, 40.0));

        let stroke = &session.store().get(1)[0];
        assert_eq!(stroke.points()[0], Point::new(10.0, 20.0));
        assert_eq!(stroke.points().last(), Some(&Point::new(30.0, 20.0)));
    }

    #[test]
    fn test_straight_line_mode() {
        let mut session = session();
        session.set_brush(red_pen());
        session.set_straight_line(true);
        session.pointer_down(0.0, 0.0);
        for i in 1..=10 {
            session.pointer_move(i as f32 * 3.0, (i % 3) as f32);
        }
        assert_eq!(session.live_points(), &[Point::new(0.0, 0.0), Point::new(30.0, 1.0)]);
        session.pointer_up();
        assert_eq!(session.store().get(1)[0].points().len(), 2);
    }

    #[test]
    fn test_taps_need_capture_dots() {
        let mut session = session();
        session.set_brush(red_pen());
        session.pointer_down(5.0, 5.0);
        assert_eq!(session.pointer_up(), None);
        assert!(session.store().is_empty());
        assert!(!session.autosave().is_armed());

        let mut session = session_with(
            SessionConfig::default().with_capture_dots(true),
            MemoryBlobStore::new(),
        );
        session.set_brush(red_pen());
        session.pointer_down(5.0, 5.0);
        assert_eq!(session.pointer_leave(), Some(1));
        assert!(session.store().get(1)[0].is_dot());
    }

    #[test]
    fn test_page_switch_cancels_capture() {
        let mut session = session();
        session.set_brush(red_pen());
        session.pointer_down(0.0, 0.0);
        session.pointer_move(10.0, 10.0);
        assert!(session.go_to_page(2));
        assert!(!session.is_drawing());
        assert_eq!(session.pointer_up(), None);

        assert!(!session.go_to_page(0));
        assert!(!session.go_to_page(4));
        assert_eq!(session.current_page(), 2);

        draw(&mut session, (0.0, 0.0), (10.0, 10.0));
        assert_eq!(session.store().len(2), 1);
        assert_eq!(session.store().len(1), 0);
    }

    #[test]
    fn test_no_write_before_first_change() {
        let mut session = session();
        assert!(!session.tick_at(Instant::now() + Duration::from_secs(60)));
        assert!(!session.flush());
        assert!(session.persistence().store().is_empty());
    }

    #[test]
    fn test_autosave_is_debounced() {
        let mut session = session();
        session.set_brush(red_pen());
        draw(&mut session, (0.0, 0.0), (10.0, 0.0));
        draw(&mut session, (0.0, 5.0), (10.0, 5.0));

        assert!(!session.tick_at(Instant::now()));
        assert!(session.persistence().store().is_empty());

        assert!(session.tick_at(Instant::now() + Duration::from_secs(2)));
        assert!(!session.store().is_dirty());
        let saved = session.persistence().load().expect("annotations saved");
        assert_eq!(saved[&1].len(), 2);

        // a single write per quiet period
        assert!(!session.tick_at(Instant::now() + Duration::from_secs(4)));
    }

    #[test]
    fn test_restore_offer() {
        let mut first = session();
        first.set_brush(red_pen());
        draw(&mut first, (0.0, 0.0), (10.0, 0.0));
        first.go_to_page(3);
        draw(&mut first, (5.0, 5.0), (50.0, 50.0));
        assert!(first.flush());
        let store = first.persistence.into_store();

        let mut second = session_with(SessionConfig::default(), store.clone());
        assert!(second.restore_available());
        assert!(second.store().is_empty());
        assert!(second.restore_saved());
        assert!(!second.restore_available());
        assert_eq!(second.store().len(1), 1);
        assert_eq!(second.store().len(3), 1);
        assert_eq!(second.history().entries(3)[0].label, RESTORED_LABEL);
        assert!(!second.history().can_undo(3));
        assert!(second.autosave().is_armed());

        let mut third = session_with(SessionConfig::default(), store);
        third.dismiss_restore();
        assert!(!third.restore_available());
        assert!(third.store().is_empty());
        assert!(!third.autosave().is_armed());
    }

    #[test]
    fn test_nothing_to_restore() {
        let mut session = session();
        assert!(!session.restore_available());
        assert!(!session.restore_saved());
    }

    struct FailingStore;

    impl BlobStore for FailingStore {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn put(&mut self, _key: &str, _blob: &str) -> StorageResult<()> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&mut self, _key: &str) -> StorageResult<bool> {
            Ok(false)
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_failed_write_is_dropped() {
        let mut session = DrawingSession::open(
            SessionConfig::default()
                .with_autosave(AutosaveConfig::default().with_debounce(Duration::ZERO)),
            DocumentIdentity::new(NAME, 1),
            Box::new(FixedPages::uniform(1, PageSize::new(100.0, 100.0))),
            FailingStore,
        );
        session.set_brush(red_pen());
        session.pointer_down(0.0, 0.0);
        session.pointer_move(10.0, 10.0);
        assert_eq!(session.pointer_up(), Some(1));

        assert!(!session.tick_at(Instant::now() + Duration::from_secs(1)));
        assert!(session.store().is_dirty());
        assert_eq!(session.store().len(1), 1);

        session.pointer_down(0.0, 10.0);
        session.pointer_move(10.0, 0.0);
        assert_eq!(session.pointer_up(), Some(2));
    }

    #[test]
    fn test_zoom_clamps_and_dirties() {
        let mut session = session();
        session.set_brush(red_pen());
        draw(&mut session, (0.0, 0.0), (10.0, 0.0));
        let mut surface = session.new_surface(1).expect("surface");
        session.render(1, &mut surface);
        assert!(session.dirty_pages().is_empty());

        assert_eq!(session.zoom_in(), 1.25);
        assert_eq!(session.zoom_percent(), 125);
        assert_eq!(session.dirty_pages(), vec![1]);

        assert_eq!(session.zoom_out(), 1.0);
        assert_eq!(session.set_zoom_percent(1000.0), 3.0);
        assert_eq!(session.zoom_in(), 3.0);
        assert_eq!(session.set_zoom_percent(10.0), 0.5);
        assert_eq!(session.display_size(1), Some((100, 50)));
    }

    #[test]
    fn test_custom_zoom_range() {
        let zoom = ZoomConfig {
            min: 1.0,
            max: 2.0,
            step: 0.5,
            initial: 1.5,
        };
        let mut session =
            session_with(SessionConfig::default().with_zoom(zoom), MemoryBlobStore::new());
        assert_eq!(session.scale(), 1.5);
        assert_eq!(session.zoom_in(), 2.0);
        assert_eq!(session.zoom_in(), 2.0);
    }

    #[test]
    fn test_render_draws_live_stroke_without_baking() {
        let mut session = session();
        session.set_brush(red_pen());
        draw(&mut session, (0.0, 10.0), (100.0, 10.0));

        session.pointer_down(0.0, 50.0);
        session.pointer_move(100.0, 50.0);
        let mut surface = session.new_surface(1).expect("surface");
        let outcome = session.render(1, &mut surface);
        assert_eq!(outcome, BakeOutcome::Rebuilt { drawn: 1 });
        assert_eq!(session.cache().committed_stroke_count(1), 1);
        assert!(surface.pixel(50, 50).is_some_and(|p| p.alpha() > 0));

        session.pointer_up();
        let outcome = session.render(1, &mut surface);
        assert_eq!(outcome, BakeOutcome::Incremental { drawn: 1 });

        session.undo(1);
        let outcome = session.render(1, &mut surface);
        assert_eq!(outcome, BakeOutcome::Rebuilt { drawn: 1 });
        assert!(surface.pixel(50, 50).is_some_and(|p| p.alpha() == 0));
    }

    #[test]
    fn test_jump_to_current_index_is_noop() {
        let mut session = session();
        session.set_brush(red_pen());
        draw(&mut session, (0.0, 0.0), (10.0, 0.0));
        assert!(session.flush());
        assert!(session.autosave().deadline().is_none());

        assert_eq!(session.jump_to(1, 1), Navigation::Moved(1));
        assert!(session.autosave().deadline().is_none());
        assert!(!session.store().is_dirty());

        assert_eq!(session.jump_to(1, 9), Navigation::Ignored);
        assert_eq!(session.jump_to(1, 0), Navigation::Moved(0));
        assert!(session.autosave().deadline().is_some());
    }

    #[test]
    fn test_reset_clears_every_page() {
        let mut session = session();
        session.set_brush(red_pen());
        draw(&mut session, (0.0, 0.0), (10.0, 0.0));
        session.go_to_page(2);
        draw(&mut session, (0.0, 0.0), (10.0, 0.0));

        session.reset();
        assert!(session.store().is_empty());
        assert_eq!(session.history().len(2), 1);
        assert!(session.autosave().is_armed());
    }

    fn sample_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 200.into(), 100.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => 1i64,
                "Kids" => vec![Object::Reference(page_id)],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_open_pdf_and_export() {
        let source = sample_pdf();
        let mut session = DrawingSession::open_pdf(
            SessionConfig::default(),
            "notes.pdf",
            &source,
            MemoryBlobStore::new(),
        )
        .unwrap();
        assert_eq!(session.page_count(), 1);
        assert_eq!(session.identity().byte_size, source.len() as u64);
        assert_eq!(session.export_file_name(), "notes-annotated.pdf");

        session.set_brush(Some(BrushStyle::highlighter(Rgb::YELLOW)));
        draw(&mut session, (10.0, 20.0), (90.0, 20.0));
        // three pages of annotations on a one-page document
        session.commit(
            3,
            Stroke::new(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)], Rgb::BLACK, 2.0, 1.0)
                .unwrap(),
        );

        let output = session.export(&source).unwrap();
        let doc = Document::load_mem(&output).unwrap();
        let page_id = doc.get_pages()[&1];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let operators: Vec<&str> = content
            .operations
            .iter()
            .map(|op| op.operator.as_str())
            .collect();
        assert!(operators.contains(&"gs"));
        assert_eq!(operators.iter().filter(|op| **op == "S").count(), 1);

        let moved = content
            .operations
            .iter()
            .find(|op| op.operator == "m")
            .expect("path start");
        assert_eq!(moved.operands[1].as_float().unwrap(), 80.0);
    }

    #[test]
    fn test_open_rejects_non_pdf() {
        let result = DrawingSession::open_pdf(
            SessionConfig::default(),
            "x.pdf",
            b"not a pdf",
            MemoryBlobStore::new(),
        );
        assert!(matches!(result, Err(pdf_drawer_export::ExportError::NotPdf)));
    }
}
