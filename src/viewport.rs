//! Row/column virtualization: prefix-sum offset tables and visible-window
//! computation. One `OffsetTable` per axis; the grid renders only the
//! indices inside the window plus an overscan margin.

use std::ops::Range;

/// Sizes and running offsets along one axis (row heights or column widths).
///
/// Offsets are a prefix-sum table recomputed lazily and invalidated only
/// from a changed index onward, so a measurement callback for index `i`
/// never touches the offsets of indices below `i`.
#[derive(Debug, Clone)]
pub struct OffsetTable {
    sizes: Vec<u16>,
    /// offsets[i] = sum of sizes[0..i]; offsets.len() == sizes.len() + 1
    offsets: Vec<u32>,
    /// offsets[0..=valid_to] are current
    valid_to: usize,
    default_size: u16,
}

impl OffsetTable {
    pub fn new(count: usize, default_size: u16) -> Self {
        let default_size = default_size.max(1);
        let mut offsets = Vec::with_capacity(count + 1);
        offsets.push(0);
        Self {
            sizes: vec![default_size; count],
            offsets,
            valid_to: 0,
            default_size,
        }
    }

    /// Build from explicit sizes (e.g. effective column widths).
    pub fn from_sizes(sizes: impl IntoIterator<Item = u16>, default_size: u16) -> Self {
        let default_size = default_size.max(1);
        let sizes: Vec<u16> = sizes
            .into_iter()
            .map(|s| if s == 0 { default_size } else { s })
            .collect();
        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        offsets.push(0);
        Self {
            sizes,
            offsets,
            valid_to: 0,
            default_size,
        }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn size(&self, index: usize) -> u16 {
        self.sizes.get(index).copied().unwrap_or(self.default_size)
    }

    /// Grow or shrink the axis, keeping existing sizes. New entries get the
    /// default size.
    pub fn set_count(&mut self, count: usize) {
        if count < self.sizes.len() {
            self.sizes.truncate(count);
            self.valid_to = self.valid_to.min(count);
        } else {
            self.sizes.resize(count, self.default_size);
        }
        self.offsets.truncate(self.valid_to + 1);
    }

    /// Record a measured size. A non-positive measurement keeps the
    /// last-known size so the axis never collapses to zero and desyncs the
    /// offset math. Offsets at or below `index` stay valid.
    pub fn set_measured(&mut self, index: usize, measured: i32) {
        if index >= self.sizes.len() {
            return;
        }
        if measured > 0 {
            self.sizes[index] = measured.min(u16::MAX as i32) as u16;
        }
        self.invalidate_from(index);
    }

    /// Set a size directly (e.g. a column resize). Zero falls back to the
    /// default size.
    pub fn set_size(&mut self, index: usize, size: u16) {
        if index >= self.sizes.len() {
            return;
        }
        self.sizes[index] = if size == 0 { self.default_size } else { size };
        self.invalidate_from(index);
    }

    fn invalidate_from(&mut self, index: usize) {
        if self.valid_to > index {
            self.valid_to = index;
            self.offsets.truncate(index + 1);
        }
    }

    fn ensure_valid_to(&mut self, index: usize) {
        let target = index.min(self.sizes.len());
        while self.valid_to < target {
            let next = self.offsets[self.valid_to] + self.sizes[self.valid_to] as u32;
            self.offsets.push(next);
            self.valid_to += 1;
        }
    }

    /// Offset of the leading edge of `index` (index == len gives the total
    /// content size).
    pub fn offset_of(&mut self, index: usize) -> u32 {
        let index = index.min(self.sizes.len());
        self.ensure_valid_to(index);
        self.offsets[index]
    }

    pub fn total_size(&mut self) -> u32 {
        self.offset_of(self.sizes.len())
    }

    /// Index containing `offset`, clamped to the valid index range.
    pub fn index_at(&mut self, offset: u32) -> usize {
        if self.sizes.is_empty() {
            return 0;
        }
        self.ensure_valid_to(self.sizes.len());
        match self.offsets.binary_search(&offset) {
            Ok(i) => i.min(self.sizes.len() - 1),
            Err(i) => (i - 1).min(self.sizes.len() - 1),
        }
    }

    /// Visible window for a scroll position and viewport extent, widened by
    /// `overscan` indices on each side and clamped to `[0, len)`. Scroll
    /// offsets outside the content clamp rather than producing out-of-range
    /// indices.
    pub fn window(&mut self, scroll: u32, viewport: u32, overscan: usize) -> Range<usize> {
        if self.sizes.is_empty() || viewport == 0 {
            return 0..0;
        }
        let total = self.total_size();
        let scroll = scroll.min(total.saturating_sub(1));
        let first = self.index_at(scroll);
        let last = self.index_at(scroll.saturating_add(viewport).saturating_sub(1).min(total - 1));
        let start = first.saturating_sub(overscan);
        let end = (last + 1 + overscan).min(self.sizes.len());
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_prefix_sums() {
        let mut t = OffsetTable::from_sizes([5, 10, 15], 8);
        assert_eq!(t.offset_of(0), 0);
        assert_eq!(t.offset_of(1), 5);
        assert_eq!(t.offset_of(2), 15);
        assert_eq!(t.total_size(), 30);
    }

    #[test]
    fn test_set_size_invalidates_downstream_only() {
        let mut t = OffsetTable::from_sizes([5, 10, 15, 20], 8);
        t.total_size();
        t.set_size(2, 1);
        // Offsets below the change are untouched
        assert_eq!(t.offset_of(1), 5);
        assert_eq!(t.offset_of(3), 16);
        assert_eq!(t.total_size(), 36);
    }

    #[test]
    fn test_non_positive_measurement_keeps_last_size() {
        let mut t = OffsetTable::from_sizes([5, 10], 8);
        t.set_measured(1, 0);
        assert_eq!(t.size(1), 10);
        t.set_measured(1, -3);
        assert_eq!(t.size(1), 10);
        t.set_measured(1, 12);
        assert_eq!(t.size(1), 12);
    }

    #[test]
    fn test_zero_resize_falls_back_to_default() {
        let mut t = OffsetTable::from_sizes([5, 10], 8);
        t.set_size(0, 0);
        assert_eq!(t.size(0), 8);
    }

    #[test]
    fn test_index_at_boundaries() {
        let mut t = OffsetTable::from_sizes([5, 10, 15], 8);
        assert_eq!(t.index_at(0), 0);
        assert_eq!(t.index_at(4), 0);
        assert_eq!(t.index_at(5), 1);
        assert_eq!(t.index_at(14), 1);
        assert_eq!(t.index_at(29), 2);
        // Past the end clamps to the last index
        assert_eq!(t.index_at(1000), 2);
    }

    #[test]
    fn test_window_is_contiguous_and_clamped() {
        let mut t = OffsetTable::new(100, 1);
        assert_eq!(t.window(10, 20, 0), 10..30);
        assert_eq!(t.window(10, 20, 3), 7..33);
        // Overscan clamps at both ends
        assert_eq!(t.window(0, 10, 5), 0..15);
        assert_eq!(t.window(95, 50, 5), 90..100);
        // Scroll far past the content clamps to the valid range
        assert_eq!(t.window(10_000, 10, 0), 99..100);
    }

    #[test]
    fn test_window_empty_axis() {
        let mut t = OffsetTable::new(0, 1);
        assert_eq!(t.window(0, 10, 2), 0..0);
    }

    #[test]
    fn test_set_count_preserves_prefix() {
        let mut t = OffsetTable::from_sizes([5, 10, 15], 8);
        t.total_size();
        t.set_count(5);
        assert_eq!(t.size(1), 10);
        assert_eq!(t.size(4), 8);
        assert_eq!(t.total_size(), 5 + 10 + 15 + 8 + 8);
        t.set_count(2);
        assert_eq!(t.total_size(), 15);
    }
}
