//! Two-layer page render cache
//!
//! Each page owns an off-screen surface holding its committed strokes,
//! rasterized once. The bake pass brings that surface up to date with the
//! page's stroke list; the composite pass copies it onto the visible surface
//! and draws the in-progress stroke on top.
//!
//! Baking is incremental while strokes are only appended. Any change in scale
//! or surface size, a shrinking stroke list, or a stroke list whose cached
//! prefix no longer matches (undo followed by a new commit) forces a full
//! rebuild.

use crate::raster::{self, page_transform};
use pdf_drawer_core::{BrushStyle, Point, StrokeRef};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// What a bake pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeOutcome {
    /// The surface was already current
    Unchanged,

    /// Only newly appended strokes were drawn
    Incremental { drawn: usize },

    /// The surface was cleared and every stroke redrawn
    Rebuilt { drawn: usize },

    /// No surface could be allocated at the requested size
    Unavailable,
}

/// Statistics about render cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of page surfaces currently held
    pub surfaces: usize,

    /// Total memory held by surfaces (bytes)
    pub memory_used: usize,

    /// Bake passes that found the surface current
    pub unchanged: u64,

    /// Bake passes that appended strokes to an existing surface
    pub incremental_bakes: u64,

    /// Bake passes that redrew a page from scratch
    pub full_rebuilds: u64,

    /// Strokes rasterized by bake passes
    pub strokes_drawn: u64,
}

/// In-progress stroke drawn over the cached layer
#[derive(Debug, Clone, Copy)]
pub struct LiveStroke<'a> {
    pub points: &'a [Point],
    pub style: BrushStyle,
}

/// Off-screen surface of one page
struct CacheSurface {
    pixmap: Pixmap,

    /// Leading strokes of the page list already baked in
    committed_stroke_count: usize,

    /// Zoom factor the surface was rasterized at
    cached_scale: f32,

    /// Strokes baked in, in order, to detect a replaced prefix
    baked: Vec<StrokeRef>,
}

impl CacheSurface {
    fn new(width: u32, height: u32, scale: f32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            committed_stroke_count: 0,
            cached_scale: scale,
            baked: Vec::new(),
        })
    }

    fn is_prefix_of(&self, strokes: &[StrokeRef]) -> bool {
        self.baked.len() <= strokes.len()
            && self
                .baked
                .iter()
                .zip(strokes)
                .all(|(baked, current)| Arc::ptr_eq(baked, current))
    }

    fn can_extend(&self, strokes: &[StrokeRef], scale: f32, width: u32, height: u32) -> bool {
        self.cached_scale == scale
            && self.pixmap.width() == width
            && self.pixmap.height() == height
            && strokes.len() >= self.committed_stroke_count
            && self.is_prefix_of(strokes)
    }

    fn draw(&mut self, strokes: &[StrokeRef]) -> usize {
        let transform = page_transform(self.cached_scale);
        for stroke in strokes {
            raster::draw_stroke(&mut self.pixmap, stroke, transform);
        }
        self.baked.extend(strokes.iter().cloned());
        self.committed_stroke_count = self.baked.len();
        strokes.len()
    }

    fn memory_size(&self) -> usize {
        self.pixmap.data().len()
    }
}

/// Per-page render cache with explicit dirty signalling
#[derive(Default)]
pub struct RenderCache {
    surfaces: HashMap<u32, CacheSurface>,
    dirty: BTreeSet<u32>,
    stats: CacheStats,
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache")
            .field("pages", &self.surfaces.keys().collect::<Vec<_>>())
            .field("dirty", &self.dirty)
            .field("stats", &self.stats)
            .finish()
    }
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag `page` for redraw on the next tick
    pub fn mark_dirty(&mut self, page: u32) {
        self.dirty.insert(page);
    }

    /// Flag every cached page for redraw, e.g. after a scale change
    pub fn mark_all_dirty(&mut self) {
        self.dirty.extend(self.surfaces.keys().copied());
    }

    pub fn is_dirty(&self, page: u32) -> bool {
        self.dirty.contains(&page)
    }

    /// Pages awaiting a redraw, ascending
    pub fn dirty_pages(&self) -> Vec<u32> {
        self.dirty.iter().copied().collect()
    }

    /// Drop `page`'s surface so the next bake rebuilds it
    pub fn invalidate(&mut self, page: u32) {
        self.surfaces.remove(&page);
        self.dirty.insert(page);
    }

    /// Drop every surface
    pub fn clear(&mut self) {
        let pages: Vec<u32> = self.surfaces.keys().copied().collect();
        self.surfaces.clear();
        self.dirty.extend(pages);
    }

    /// Number of strokes baked into `page`'s surface
    pub fn committed_stroke_count(&self, page: u32) -> usize {
        self.surfaces
            .get(&page)
            .map_or(0, |surface| surface.committed_stroke_count)
    }

    /// Zoom factor `page`'s surface was rasterized at
    pub fn cached_scale(&self, page: u32) -> Option<f32> {
        self.surfaces.get(&page).map(|surface| surface.cached_scale)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            surfaces: self.surfaces.len(),
            memory_used: self.surfaces.values().map(CacheSurface::memory_size).sum(),
            ..self.stats
        }
    }

    /// Bring `page`'s surface up to date with `strokes` at `scale`
    pub fn bake(
        &mut self,
        page: u32,
        strokes: &[StrokeRef],
        scale: f32,
        width: u32,
        height: u32,
    ) -> BakeOutcome {
        let extendable = self
            .surfaces
            .get(&page)
            .is_some_and(|surface| surface.can_extend(strokes, scale, width, height));

        let outcome = if extendable {
            let Some(surface) = self.surfaces.get_mut(&page) else {
                return BakeOutcome::Unavailable;
            };
            let start = surface.committed_stroke_count;
            if start == strokes.len() {
                self.stats.unchanged += 1;
                BakeOutcome::Unchanged
            } else {
                let drawn = surface.draw(&strokes[start..]);
                self.stats.incremental_bakes += 1;
                BakeOutcome::Incremental { drawn }
            }
        } else {
            let surface = match self.surfaces.remove(&page) {
                Some(mut surface)
                    if surface.pixmap.width() == width && surface.pixmap.height() == height =>
                {
                    raster::clear(&mut surface.pixmap);
                    surface.baked.clear();
                    surface.committed_stroke_count = 0;
                    surface.cached_scale = scale;
                    surface
                }
                _ => match CacheSurface::new(width, height, scale) {
                    Some(surface) => surface,
                    None => {
                        tracing::warn!(page, width, height, "cannot allocate page cache surface");
                        return BakeOutcome::Unavailable;
                    }
                },
            };
            let surface = self.surfaces.entry(page).or_insert(surface);
            let drawn = surface.draw(strokes);
            self.stats.full_rebuilds += 1;
            BakeOutcome::Rebuilt { drawn }
        };

        if let BakeOutcome::Incremental { drawn } | BakeOutcome::Rebuilt { drawn } = outcome {
            self.stats.strokes_drawn += drawn as u64;
            tracing::debug!(page, scale, ?outcome, "baked page cache");
        }
        outcome
    }

    /// Copy `page`'s cached layer onto `target` and draw `live` on top
    ///
    /// A page without a surface composites as empty.
    pub fn composite(&self, page: u32, target: &mut Pixmap, live: Option<LiveStroke<'_>>) {
        let scale = match self.surfaces.get(&page) {
            Some(surface) => {
                copy_surface(&surface.pixmap, target);
                surface.cached_scale
            }
            None => {
                raster::clear(target);
                1.0
            }
        };

        if let Some(live) = live {
            raster::draw_points(target, live.points, &live.style, page_transform(scale));
        }
    }

    /// Bake then composite onto `target`, sizing the cache to match it
    pub fn render(
        &mut self,
        page: u32,
        strokes: &[StrokeRef],
        scale: f32,
        target: &mut Pixmap,
        live: Option<LiveStroke<'_>>,
    ) -> BakeOutcome {
        let outcome = self.bake(page, strokes, scale, target.width(), target.height());
        self.dirty.remove(&page);
        if outcome == BakeOutcome::Unavailable {
            raster::clear(target);
            if let Some(live) = live {
                raster::draw_points(target, live.points, &live.style, page_transform(scale));
            }
        } else {
            self.composite(page, target, live);
        }
        outcome
    }
}

fn copy_surface(source: &Pixmap, target: &mut Pixmap) {
    if source.width() == target.width() && source.height() == target.height() {
        target.data_mut().copy_from_slice(source.data());
    } else {
        raster::clear(target);
        target.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}
