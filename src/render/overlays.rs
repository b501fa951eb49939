//! Selection and editor overlays: the selection rectangle, the editing
//! outline, and the floating expanded-editor anchor.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
};

use super::context::RenderContext;

/// Intersect two rects; None when they don't overlap.
pub fn intersect(a: Rect, b: Rect) -> Option<Rect> {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = a.right().min(b.right());
    let y2 = a.bottom().min(b.bottom());
    if x2 > x1 && y2 > y1 {
        Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
    } else {
        None
    }
}

/// Clip a selection rectangle against the pinned boundary.
///
/// `in_pinned_region` marks a rectangle that lives entirely inside the
/// pinned columns: it does not scroll horizontally, so it only needs
/// clipping to the body. A rectangle in the scrollable region is positioned
/// from scrolled coordinates and must never bleed left of the boundary, so
/// its left edge clamps to `boundary_x`.
pub fn clip_selection(
    rect: Rect,
    boundary_x: u16,
    body: Rect,
    in_pinned_region: bool,
) -> Option<Rect> {
    let rect = intersect(rect, body)?;
    if in_pinned_region {
        return Some(rect);
    }
    let left = rect.x.max(boundary_x);
    if left >= rect.right() {
        return None;
    }
    Some(Rect::new(left, rect.y, rect.right() - left, rect.height))
}

/// Paint the selection rectangle. The active cell keeps its own styling
/// (reversed); the rest of the range gets the selection background. Editing
/// swaps the border color for the editing outline so "being edited" reads
/// differently from "selected".
pub fn render_selection(
    buf: &mut Buffer,
    rect: Rect,
    active: Option<Rect>,
    ctx: &RenderContext,
    editing: bool,
) {
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let inside_active = active
                .map(|a| x >= a.x && x < a.right() && y >= a.y && y < a.bottom())
                .unwrap_or(false);
            let cell = &mut buf[(x, y)];
            if inside_active {
                let style = cell.style().add_modifier(Modifier::REVERSED);
                let style = if editing {
                    style.fg(ctx.editing_outline)
                } else {
                    style
                };
                cell.set_style(style);
            } else {
                cell.set_style(cell.style().bg(ctx.selection_bg));
            }
        }
    }
}

/// Rect for the floating expanded editor, anchored at the edited cell.
/// Prefers opening below and to the right of the cell; flips up when there
/// is no room below, and always clamps inside the frame.
pub fn anchor_editor_rect(cell: Rect, frame: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(frame.width);
    let height = height.min(frame.height);

    let mut x = cell.x;
    if x + width > frame.right() {
        x = frame.right().saturating_sub(width);
    }
    x = x.max(frame.x);

    let below = cell.bottom();
    let mut y = if below + height <= frame.bottom() {
        below
    } else if cell.y >= frame.y + height {
        cell.y - height
    } else {
        frame.bottom().saturating_sub(height)
    };
    y = y.max(frame.y);

    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_disjoint_is_none() {
        let a = Rect::new(0, 0, 5, 5);
        let b = Rect::new(10, 10, 5, 5);
        assert_eq!(intersect(a, b), None);
    }

    #[test]
    fn test_selection_inside_pinned_region_unclipped() {
        let body = Rect::new(0, 1, 80, 20);
        let rect = Rect::new(4, 3, 10, 2);
        assert_eq!(clip_selection(rect, 20, body, true), Some(rect));
    }

    #[test]
    fn test_selection_clips_at_pinned_boundary() {
        let body = Rect::new(0, 1, 80, 20);
        // Scrolled selection whose rect pokes into the pinned region
        let rect = Rect::new(10, 3, 30, 2);
        let clipped = clip_selection(rect, 20, body, false).unwrap();
        assert_eq!(clipped.x, 20);
        assert_eq!(clipped.right(), 40);
    }

    #[test]
    fn test_scrolled_out_selection_is_dropped() {
        let body = Rect::new(0, 1, 80, 20);
        // Scrolled entirely left of the boundary: nothing to draw
        let rect = Rect::new(25, 3, 10, 2);
        assert_eq!(clip_selection(rect, 40, body, false), None);
    }

    #[test]
    fn test_anchor_prefers_below_then_flips_up() {
        let frame = Rect::new(0, 0, 80, 24);
        let cell = Rect::new(10, 5, 16, 1);
        let below = anchor_editor_rect(cell, frame, 40, 6);
        assert_eq!((below.x, below.y), (10, 6));

        let cell_near_bottom = Rect::new(10, 22, 16, 1);
        let above = anchor_editor_rect(cell_near_bottom, frame, 40, 6);
        assert_eq!(above.y, 16);
    }

    #[test]
    fn test_anchor_clamps_to_frame() {
        let frame = Rect::new(0, 0, 50, 10);
        let cell = Rect::new(45, 2, 16, 1);
        let rect = anchor_editor_rect(cell, frame, 40, 6);
        assert!(rect.right() <= frame.right());
        assert!(rect.bottom() <= frame.bottom());
    }
}
