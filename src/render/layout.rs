use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Top-level layout: grid view, control bar, optional debug row. The field
/// panel overlays the right side of the grid view and is split off here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppLayout {
    pub grid: Rect,
    pub field_panel: Option<Rect>,
    pub control_bar: Rect,
    pub debug: Option<Rect>,
}

/// Top-level vertical layout: grid (fill), control bar (1 row), optional
/// debug (1 row). The field panel takes a right-hand strip of the grid area
/// when open.
pub fn app_layout(area: Rect, field_panel_open: bool, debug_enabled: bool) -> AppLayout {
    let mut constraints = vec![Constraint::Fill(1), Constraint::Length(1)];

    if debug_enabled {
        constraints.push(Constraint::Length(1));
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let main_view = layout[0];
    let control_bar_idx = layout.len() - if debug_enabled { 2 } else { 1 };
    let control_bar = layout[control_bar_idx];

    let debug = if debug_enabled {
        Some(layout[layout.len() - 1])
    } else {
        None
    };

    let (grid, field_panel) = if field_panel_open {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(34)])
            .split(main_view);
        (split[0], Some(split[1]))
    } else {
        (main_view, None)
    };

    AppLayout {
        grid,
        field_panel,
        control_bar,
        debug,
    }
}

/// Centered rect within `r` with given percentage width and height.
pub fn centered_rect(r: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Centered rect with fixed width and height, clamped to fit inside `r`.
/// Use for modals that must not shrink (e.g. delete confirm) so content
/// stays visible.
pub fn centered_rect_fixed(r: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(r.width);
    let h = height.min(r.height);
    let x = r.x + r.width.saturating_sub(w) / 2;
    let y = r.y + r.height.saturating_sub(h) / 2;
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_layout_minimal() {
        let area = Rect::new(0, 0, 100, 50);
        let layout = app_layout(area, false, false);

        assert_eq!(layout.grid.height, 49);
        assert_eq!(layout.control_bar.height, 1);
        assert_eq!(layout.control_bar.y, 49);
        assert_eq!(layout.field_panel, None);
        assert_eq!(layout.debug, None);
    }

    #[test]
    fn test_app_layout_with_debug() {
        let area = Rect::new(0, 0, 100, 50);
        let layout = app_layout(area, false, true);

        assert_eq!(layout.grid.height, 48);
        assert_eq!(layout.control_bar.y, 48);
        assert_eq!(layout.debug.unwrap().y, 49);
    }

    #[test]
    fn test_app_layout_field_panel_strip() {
        let area = Rect::new(0, 0, 100, 50);
        let layout = app_layout(area, true, false);

        let panel = layout.field_panel.unwrap();
        assert_eq!(panel.width, 34);
        assert_eq!(layout.grid.width + panel.width, 100);
    }

    #[test]
    fn test_centered_rect_fixed_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect_fixed(area, 40, 20);
        assert_eq!(rect.width, 20);
        assert_eq!(rect.height, 10);
        let rect = centered_rect_fixed(area, 10, 4);
        assert_eq!(rect, Rect::new(5, 3, 10, 4));
    }
}
