//! Sticky offsets and divider rules for the pinned-column region.

use crate::columns::EffectiveColumn;

/// Sticky left offset for each column: pinned columns get the running sum
/// of the pinned widths before them, everything else gets `None`.
///
/// Operates on the display list (already filtered to visible columns), so
/// hidden columns contribute no width.
pub fn sticky_lefts(columns: &[EffectiveColumn]) -> Vec<Option<u16>> {
    let mut left: u16 = 0;
    columns
        .iter()
        .map(|c| {
            if c.pin {
                let offset = left;
                left = left.saturating_add(c.width);
                Some(offset)
            } else {
                None
            }
        })
        .collect()
}

/// Total width of the pinned region.
pub fn pinned_width(columns: &[EffectiveColumn]) -> u16 {
    columns
        .iter()
        .filter(|c| c.pin)
        .fold(0u16, |acc, c| acc.saturating_add(c.width))
}

/// The three booleans the divider rule is evaluated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividerFlags {
    pub is_pinned: bool,
    pub is_last_pinned_before_scrollable: bool,
    pub is_select_column: bool,
}

impl DividerFlags {
    /// Flags for column `index` of the display list. The reserved row
    /// selector column is not part of the list; use `select_column()` for
    /// it.
    pub fn for_column(columns: &[EffectiveColumn], index: usize) -> Self {
        let is_pinned = columns.get(index).map(|c| c.pin).unwrap_or(false);
        let is_last_pinned = is_pinned
            && columns
                .get(index + 1)
                .map(|next| !next.pin)
                .unwrap_or(false);
        Self {
            is_pinned,
            // The divider needs unpinned content to its right; a fully
            // pinned table draws no divider.
            is_last_pinned_before_scrollable: is_last_pinned,
            is_select_column: false,
        }
    }

    pub fn select_column() -> Self {
        Self {
            is_pinned: true,
            is_last_pinned_before_scrollable: false,
            is_select_column: true,
        }
    }
}

/// Whether a column draws the heavy pinned/unpinned divider on its right
/// edge: only the last pinned column, only when scrollable content follows,
/// and never the reserved row selector.
pub fn draws_divider(flags: DividerFlags) -> bool {
    flags.is_pinned && flags.is_last_pinned_before_scrollable && !flags.is_select_column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::FieldType;

    fn col(id: &str, width: u16, pin: bool) -> EffectiveColumn {
        EffectiveColumn {
            field_id: id.to_string(),
            field_name: id.to_string(),
            field_type: FieldType::Text,
            description: None,
            group_id: None,
            width,
            pin,
            visible: true,
            color: None,
            sort: 0,
        }
    }

    #[test]
    fn test_sticky_lefts_prefix_sums() {
        let cols = vec![col("a", 80, true), col("b", 120, true), col("c", 90, false)];
        assert_eq!(sticky_lefts(&cols), vec![Some(0), Some(80), None]);
        assert_eq!(pinned_width(&cols), 200);
    }

    #[test]
    fn test_sticky_lefts_no_pins() {
        let cols = vec![col("a", 80, false), col("b", 120, false)];
        assert_eq!(sticky_lefts(&cols), vec![None, None]);
        assert_eq!(pinned_width(&cols), 0);
    }

    #[test]
    fn test_divider_only_on_last_pinned_with_scrollable_content() {
        let cols = vec![col("a", 10, true), col("b", 10, true), col("c", 10, false)];
        assert!(!draws_divider(DividerFlags::for_column(&cols, 0)));
        assert!(draws_divider(DividerFlags::for_column(&cols, 1)));
        assert!(!draws_divider(DividerFlags::for_column(&cols, 2)));
    }

    #[test]
    fn test_no_divider_when_everything_is_pinned() {
        let cols = vec![col("a", 10, true), col("b", 10, true)];
        assert!(!draws_divider(DividerFlags::for_column(&cols, 1)));
    }

    #[test]
    fn test_select_column_never_draws_divider() {
        assert!(!draws_divider(DividerFlags::select_column()));
    }
}
