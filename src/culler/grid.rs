// SPDX-License-Identifier: MPL-2.0
//! Uniform spatial grid backing the viewport culler.
//!
//! Cells are keyed by an integer coordinate pair; each item lands in every
//! cell its bounding box overlaps. The grid is rebuilt wholesale, never
//! patched incrementally, so membership may be stale between rebuilds —
//! callers re-verify exact geometry on every candidate.

use std::collections::HashMap;

use crate::geometry::Rect;

use super::CullItem;

/// Integer cell coordinate. A value-type key keeps the hot query path free
/// of string formatting and parsing.
type CellKey = (i32, i32);

#[derive(Debug, Default)]
pub(crate) struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<usize>>,
    /// Item count at the last rebuild; bounds the candidate indices.
    built_item_count: usize,
}

impl SpatialGrid {
    pub(crate) fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
            built_item_count: 0,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Discards all cells and re-inserts every item.
    pub(crate) fn rebuild(&mut self, items: &[CullItem]) {
        self.cells.clear();
        self.built_item_count = items.len();
        for (index, item) in items.iter().enumerate() {
            let bounds = item.extent.bounding_box(item.origin());
            let (min_x, min_y, max_x, max_y) = self.cell_range(&bounds);
            for cell_y in min_y..=max_y {
                for cell_x in min_x..=max_x {
                    self.cells.entry((cell_x, cell_y)).or_default().push(index);
                }
            }
        }
    }

    /// Collects de-duplicated candidate indices for cells overlapping
    /// `area`. Candidates may be geometric false positives; they are never
    /// false with respect to the grid itself.
    pub(crate) fn query(&self, area: &Rect) -> Vec<usize> {
        let mut seen = vec![false; self.built_item_count];
        let mut candidates = Vec::new();
        let (min_x, min_y, max_x, max_y) = self.cell_range(area);
        for cell_y in min_y..=max_y {
            for cell_x in min_x..=max_x {
                if let Some(members) = self.cells.get(&(cell_x, cell_y)) {
                    for &index in members {
                        if !seen[index] {
                            seen[index] = true;
                            candidates.push(index);
                        }
                    }
                }
            }
        }
        candidates
    }

    fn cell_range(&self, area: &Rect) -> (i32, i32, i32, i32) {
        (
            self.cell_coord(area.x),
            self.cell_coord(area.y),
            self.cell_coord(area.right()),
            self.cell_coord(area.bottom()),
        )
    }

    #[allow(clippy::cast_possible_truncation)] // world coords fit i32 cells by construction
    fn cell_coord(&self, value: f32) -> i32 {
        (value / self.cell_size).floor() as i32
    }
}
