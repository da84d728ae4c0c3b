// SPDX-License-Identifier: MPL-2.0
//! Viewport culling with a rebuildable spatial index.
//!
//! Given the current viewport, zoom scale and the host's item list, returns
//! only the items intersecting the padded viewport, ordered by priority.
//! A uniform spatial grid amortizes the per-item visibility tests; it is
//! rebuilt wholesale once the viewport has moved or scaled past a threshold
//! since the last build, and every grid candidate is re-verified against
//! exact geometry so no false positive survives to the caller.

mod grid;

use std::time::Instant;

use serde::Serialize;

use crate::config::{
    DEFAULT_GRID_CELL_SIZE, DEFAULT_REBUILD_SCALE_DELTA, DEFAULT_REBUILD_TRANSLATION_PX,
    DEFAULT_VIEWPORT_PADDING_PX, MAX_GRID_CELL_SIZE, MAX_VIEWPORT_PADDING_PX, MIN_GRID_CELL_SIZE,
    MIN_VIEWPORT_PADDING_PX,
};
use crate::geometry::{Extent, Point, Rect};

use grid::SpatialGrid;

/// Tunables for viewport culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullerConfig {
    /// When false, every query falls back to a direct O(n) scan.
    pub enabled: bool,
    /// Screen-space padding around the viewport, so items don't pop in
    /// abruptly at the edges during pan/zoom.
    pub padding_px: f32,
    /// Edge length of one grid cell in world units.
    pub cell_size: f32,
    /// Viewport translation since the last build that forces a rebuild.
    pub rebuild_translation_px: f32,
    /// Scale change since the last build that forces a rebuild.
    pub rebuild_scale_delta: f32,
    /// Cap on the number of items one query returns, highest priority kept.
    pub max_visible_items: Option<usize>,
}

impl Default for CullerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            padding_px: DEFAULT_VIEWPORT_PADDING_PX,
            cell_size: DEFAULT_GRID_CELL_SIZE,
            rebuild_translation_px: DEFAULT_REBUILD_TRANSLATION_PX,
            rebuild_scale_delta: DEFAULT_REBUILD_SCALE_DELTA,
            max_visible_items: None,
        }
    }
}

impl CullerConfig {
    /// Creates a configuration with padding and cell size clamped to their
    /// valid ranges.
    #[must_use]
    pub fn new(padding_px: f32, cell_size: f32) -> Self {
        Self {
            padding_px: padding_px.clamp(MIN_VIEWPORT_PADDING_PX, MAX_VIEWPORT_PADDING_PX),
            cell_size: cell_size.clamp(MIN_GRID_CELL_SIZE, MAX_GRID_CELL_SIZE),
            ..Self::default()
        }
    }
}

/// One positioned item owned by the host renderer.
///
/// The culler only reads the geometry and writes `last_visible_at`; item
/// identity and payloads remain the host's business.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullItem {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub extent: Extent,
    /// Higher values sort earlier in the query result.
    pub priority: i32,
    /// Milliseconds (culler-relative) of the last query that returned this
    /// item, or `None` if it has never been visible.
    pub last_visible_at: Option<u64>,
}

impl CullItem {
    #[must_use]
    pub fn point(id: u64, x: f32, y: f32) -> Self {
        Self::with_extent(id, x, y, Extent::Point)
    }

    #[must_use]
    pub fn circle(id: u64, x: f32, y: f32, radius: f32) -> Self {
        Self::with_extent(id, x, y, Extent::Circle { radius })
    }

    #[must_use]
    pub fn rect(id: u64, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::with_extent(id, x, y, Extent::Rect { width, height })
    }

    #[must_use]
    pub fn with_extent(id: u64, x: f32, y: f32, extent: Extent) -> Self {
        Self {
            id,
            x,
            y,
            extent,
            priority: 0,
            last_visible_at: None,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Snapshot of one culling query.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CullStats {
    pub total_items: usize,
    pub visible_items: usize,
    pub culled_items: usize,
    /// Fraction of items excluded by the query (0 when the list is empty).
    pub culling_ratio: f32,
    pub last_query_duration_ms: f32,
    /// Wholesale index rebuilds since the culler was created.
    pub index_rebuilds: u64,
}

/// Viewport and scale at the last index build, for the rebuild trigger.
#[derive(Debug, Clone, Copy)]
struct BuildSnapshot {
    viewport_x: f32,
    viewport_y: f32,
    scale: f32,
    item_count: usize,
}

/// Spatial-index-accelerated visibility filter.
pub struct ViewportCuller {
    config: CullerConfig,
    grid: SpatialGrid,
    snapshot: Option<BuildSnapshot>,
    stats: CullStats,
    rebuilds: u64,
    /// Origin for `last_visible_at` stamps.
    epoch: Instant,
}

impl Default for ViewportCuller {
    fn default() -> Self {
        Self::new(CullerConfig::default())
    }
}

impl ViewportCuller {
    #[must_use]
    pub fn new(config: CullerConfig) -> Self {
        Self {
            config,
            grid: SpatialGrid::new(config.cell_size),
            snapshot: None,
            stats: CullStats::default(),
            rebuilds: 0,
            epoch: Instant::now(),
        }
    }

    /// Returns the indices of items intersecting the padded viewport,
    /// sorted by descending priority (stable; ties keep input order).
    ///
    /// `viewport` is the screen-space window and `scale` the current zoom;
    /// both are converted to world coordinates before any comparison.
    /// Survivors get `last_visible_at` stamped. Malformed viewport or scale
    /// values yield an empty result rather than an error.
    pub fn cull(&mut self, items: &mut [CullItem], viewport: Rect, scale: f32) -> Vec<usize> {
        let started = Instant::now();
        if !viewport.is_finite() || !scale.is_finite() || scale <= 0.0 {
            return Vec::new();
        }

        let world_view = Rect::new(
            viewport.x / scale,
            viewport.y / scale,
            viewport.width / scale,
            viewport.height / scale,
        )
        .expanded(self.config.padding_px / scale);

        let mut visible: Vec<usize> = if items.is_empty() {
            Vec::new()
        } else if !self.config.enabled {
            Self::scan_all(items, &world_view)
        } else {
            self.maybe_rebuild(items, viewport, scale);
            if self.grid.is_empty() {
                Self::scan_all(items, &world_view)
            } else {
                let mut candidates = self.grid.query(&world_view);
                candidates.retain(|&index| index < items.len());
                // Input order before the priority sort keeps ties stable.
                candidates.sort_unstable();
                candidates
                    .into_iter()
                    .filter(|&index| {
                        items[index]
                            .extent
                            .intersects_rect(items[index].origin(), &world_view)
                    })
                    .collect()
            }
        };

        let now_ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        for &index in &visible {
            items[index].last_visible_at = Some(now_ms);
        }

        visible.sort_by(|&a, &b| items[b].priority.cmp(&items[a].priority));
        if let Some(cap) = self.config.max_visible_items {
            visible.truncate(cap);
        }

        let total = items.len();
        let shown = visible.len();
        #[allow(clippy::cast_precision_loss)] // item counts stay far below f32 precision limits
        let ratio = if total == 0 {
            0.0
        } else {
            (total - shown) as f32 / total as f32
        };
        self.stats = CullStats {
            total_items: total,
            visible_items: shown,
            culled_items: total - shown,
            culling_ratio: ratio,
            last_query_duration_ms: started.elapsed().as_secs_f32() * 1000.0,
            index_rebuilds: self.rebuilds,
        };
        visible
    }

    #[must_use]
    pub fn stats(&self) -> CullStats {
        self.stats
    }

    #[must_use]
    pub fn config(&self) -> &CullerConfig {
        &self.config
    }

    /// Drops the spatial index; the next query rebuilds it from scratch.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    fn scan_all(items: &[CullItem], world_view: &Rect) -> Vec<usize> {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.extent.intersects_rect(item.origin(), world_view))
            .map(|(index, _)| index)
            .collect()
    }

    fn maybe_rebuild(&mut self, items: &[CullItem], viewport: Rect, scale: f32) {
        let needs_rebuild = match self.snapshot {
            None => true,
            Some(snapshot) => {
                snapshot.item_count != items.len()
                    || (viewport.x - snapshot.viewport_x).abs() > self.config.rebuild_translation_px
                    || (viewport.y - snapshot.viewport_y).abs() > self.config.rebuild_translation_px
                    || (scale - snapshot.scale).abs() > self.config.rebuild_scale_delta
            }
        };
        if needs_rebuild {
            self.grid.rebuild(items);
            self.snapshot = Some(BuildSnapshot {
                viewport_x: viewport.x,
                viewport_y: viewport.y,
                scale,
                item_count: items.len(),
            });
            self.rebuilds += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    fn viewport(x: f32, y: f32, width: f32, height: f32) -> Rect {
        Rect::new(x, y, width, height)
    }

    fn ids(items: &[CullItem], indices: &[usize]) -> Vec<u64> {
        indices.iter().map(|&i| items[i].id).collect()
    }

    #[test]
    fn items_inside_viewport_are_returned() {
        let mut culler = ViewportCuller::default();
        let mut items = vec![
            CullItem::point(1, 50.0, 50.0),
            CullItem::point(2, 5_000.0, 5_000.0),
        ];
        let visible = culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(ids(&items, &visible), vec![1]);
    }

    #[test]
    fn padding_keeps_items_just_offscreen() {
        let config = CullerConfig {
            padding_px: 100.0,
            ..CullerConfig::default()
        };
        let mut culler = ViewportCuller::new(config);
        // 50px right of the viewport edge: inside the 100px padding.
        let mut items = vec![CullItem::point(1, 850.0, 300.0)];
        let visible = culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(visible.len(), 1);

        // 150px out: beyond the padding.
        let mut items = vec![CullItem::point(1, 950.0, 300.0)];
        let mut culler = ViewportCuller::new(config);
        let visible = culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert!(visible.is_empty());
    }

    #[test]
    fn comparisons_happen_in_world_coordinates() {
        let config = CullerConfig {
            padding_px: 0.0,
            ..CullerConfig::default()
        };
        let mut culler = ViewportCuller::new(config);
        // At scale 2, a 800x600 screen viewport covers world (0,0)-(400,300).
        let mut items = vec![
            CullItem::point(1, 350.0, 250.0),
            CullItem::point(2, 500.0, 250.0),
        ];
        let visible = culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 2.0);
        assert_eq!(ids(&items, &visible), vec![1]);
    }

    #[test]
    fn circle_and_rect_extents_use_exact_tests() {
        let config = CullerConfig {
            padding_px: 0.0,
            ..CullerConfig::default()
        };
        let mut culler = ViewportCuller::new(config);
        let mut items = vec![
            // Center outside, but the radius reaches in.
            CullItem::circle(1, 830.0, 300.0, 40.0),
            // Center outside and the radius falls short.
            CullItem::circle(2, 900.0, 300.0, 40.0),
            // Rect straddling the edge.
            CullItem::rect(3, 790.0, 0.0, 50.0, 50.0),
        ];
        let visible = culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(ids(&items, &visible), vec![1, 3]);
    }

    #[test]
    fn survivors_are_sorted_by_priority_with_stable_ties() {
        let mut culler = ViewportCuller::default();
        let mut items = vec![
            CullItem::point(1, 10.0, 10.0).with_priority(1),
            CullItem::point(2, 20.0, 10.0).with_priority(5),
            CullItem::point(3, 30.0, 10.0).with_priority(1),
            CullItem::point(4, 40.0, 10.0).with_priority(5),
        ];
        let visible = culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(ids(&items, &visible), vec![2, 4, 1, 3]);
    }

    #[test]
    fn survivors_get_last_visible_stamped() {
        let mut culler = ViewportCuller::default();
        let mut items = vec![
            CullItem::point(1, 10.0, 10.0),
            CullItem::point(2, 5_000.0, 5_000.0),
        ];
        culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert!(items[0].last_visible_at.is_some());
        assert!(items[1].last_visible_at.is_none());
    }

    #[test]
    fn repeat_query_without_rebuild_trigger_is_idempotent() {
        let mut culler = ViewportCuller::default();
        let mut items: Vec<CullItem> = (0..40)
            .map(|i| CullItem::point(i, (i as f32) * 30.0, 100.0))
            .collect();
        let vp = viewport(0.0, 0.0, 800.0, 600.0);

        let first = culler.cull(&mut items, vp, 1.0);
        let rebuilds_after_first = culler.stats().index_rebuilds;
        let second = culler.cull(&mut items, vp, 1.0);

        assert_eq!(first, second);
        assert_eq!(culler.stats().index_rebuilds, rebuilds_after_first);
    }

    #[test]
    fn small_viewport_moves_reuse_the_index() {
        let mut culler = ViewportCuller::default();
        let mut items = vec![CullItem::point(1, 100.0, 100.0)];
        culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(culler.stats().index_rebuilds, 1);

        // 30px pan: under the 50px rebuild threshold.
        culler.cull(&mut items, viewport(30.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(culler.stats().index_rebuilds, 1);

        // 60px pan from the build point: rebuild.
        culler.cull(&mut items, viewport(60.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(culler.stats().index_rebuilds, 2);
    }

    #[test]
    fn scale_change_past_threshold_rebuilds_the_index() {
        let mut culler = ViewportCuller::default();
        let mut items = vec![CullItem::point(1, 100.0, 100.0)];
        let vp = viewport(0.0, 0.0, 800.0, 600.0);

        culler.cull(&mut items, vp, 1.0);
        culler.cull(&mut items, vp, 1.05);
        assert_eq!(culler.stats().index_rebuilds, 1);

        culler.cull(&mut items, vp, 1.2);
        assert_eq!(culler.stats().index_rebuilds, 2);
    }

    #[test]
    fn item_count_change_rebuilds_the_index() {
        let mut culler = ViewportCuller::default();
        let vp = viewport(0.0, 0.0, 800.0, 600.0);
        let mut items = vec![CullItem::point(1, 100.0, 100.0)];
        culler.cull(&mut items, vp, 1.0);

        items.push(CullItem::point(2, 200.0, 100.0));
        let visible = culler.cull(&mut items, vp, 1.0);
        assert_eq!(visible.len(), 2);
        assert_eq!(culler.stats().index_rebuilds, 2);
    }

    #[test]
    fn disabled_culler_scans_directly() {
        let config = CullerConfig {
            enabled: false,
            ..CullerConfig::default()
        };
        let mut culler = ViewportCuller::new(config);
        let mut items = vec![
            CullItem::point(1, 10.0, 10.0),
            CullItem::point(2, 5_000.0, 5_000.0),
        ];
        let visible = culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(ids(&items, &visible), vec![1]);
        assert_eq!(culler.stats().index_rebuilds, 0);
    }

    #[test]
    fn empty_item_list_yields_empty_result_and_zero_ratio() {
        let mut culler = ViewportCuller::default();
        let visible = culler.cull(&mut [], viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert!(visible.is_empty());
        assert_abs_diff_eq!(culler.stats().culling_ratio, 0.0);
    }

    #[test]
    fn malformed_scale_yields_empty_result() {
        let mut culler = ViewportCuller::default();
        let mut items = vec![CullItem::point(1, 10.0, 10.0)];
        assert!(culler
            .cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 0.0)
            .is_empty());
        assert!(culler
            .cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), f32::NAN)
            .is_empty());
    }

    #[test]
    fn max_visible_items_caps_by_priority() {
        let config = CullerConfig {
            max_visible_items: Some(2),
            ..CullerConfig::default()
        };
        let mut culler = ViewportCuller::new(config);
        let mut items = vec![
            CullItem::point(1, 10.0, 10.0).with_priority(1),
            CullItem::point(2, 20.0, 10.0).with_priority(9),
            CullItem::point(3, 30.0, 10.0).with_priority(5),
        ];
        let visible = culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);
        assert_eq!(ids(&items, &visible), vec![2, 3]);
    }

    #[test]
    fn stats_track_counts_and_ratio() {
        let mut culler = ViewportCuller::default();
        let mut items = vec![
            CullItem::point(1, 10.0, 10.0),
            CullItem::point(2, 5_000.0, 5_000.0),
            CullItem::point(3, 6_000.0, 6_000.0),
            CullItem::point(4, 7_000.0, 7_000.0),
        ];
        culler.cull(&mut items, viewport(0.0, 0.0, 800.0, 600.0), 1.0);

        let stats = culler.stats();
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.visible_items, 1);
        assert_eq!(stats.culled_items, 3);
        assert_abs_diff_eq!(stats.culling_ratio, 0.75);
        assert!(stats.last_query_duration_ms >= 0.0);
    }
}
