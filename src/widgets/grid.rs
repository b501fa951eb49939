//! The enrichment grid widget: virtualized rows and columns, a pinned
//! region, the row-selector column, and the selection overlay.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::StatefulWidget,
};

use crate::columns::{EffectiveColumn, FieldId};
use crate::config::DisplayConfig;
use crate::decorations::{decorations_for, icon_for, Decoration};
use crate::pinned::{draws_divider, pinned_width, sticky_lefts, DividerFlags};
use crate::render::context::RenderContext;
use crate::render::overlays::{clip_selection, render_selection};
use crate::selection::{CellCoord, SelectionMachine};
use crate::store::TableStore;
use crate::viewport::OffsetTable;

/// Screen geometry computed during render and reused for hit-testing and
/// editor anchoring until the next frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub area: Rect,
    pub header: Rect,
    pub body: Rect,
    pub selector_width: u16,
    pub pinned_width: u16,
    /// x of the first scrollable column (right edge of the pinned region)
    pub boundary_x: u16,
}

pub struct GridState {
    /// Visible effective columns, pinned prefix first
    display: Vec<EffectiveColumn>,
    /// Resolved per-column override colors, parallel to `display`
    display_colors: Vec<Option<Color>>,
    pinned_count: usize,
    rows_axis: OffsetTable,
    /// Widths of the scrollable (non-pinned) display columns
    cols_axis: OffsetTable,
    pub scroll_x: u32,
    pub scroll_y: u32,
    pub selection: SelectionMachine,
    overscan_rows: usize,
    overscan_cols: usize,
    pub row_numbers: bool,
    pub row_start_index: usize,
    min_column_width: u16,
    max_column_width: u16,
    default_column_width: u16,
    layout: GridLayout,
    /// Last rendered windows, for the debug row
    pub last_row_window: std::ops::Range<usize>,
    pub last_col_window: std::ops::Range<usize>,
}

impl GridState {
    pub fn new(display_config: &DisplayConfig) -> Self {
        Self {
            display: Vec::new(),
            display_colors: Vec::new(),
            pinned_count: 0,
            rows_axis: OffsetTable::new(0, 1),
            cols_axis: OffsetTable::new(0, display_config.default_column_width),
            scroll_x: 0,
            scroll_y: 0,
            selection: SelectionMachine::new(),
            overscan_rows: display_config.overscan_rows,
            overscan_cols: display_config.overscan_cols,
            row_numbers: display_config.row_numbers,
            row_start_index: display_config.row_start_index,
            min_column_width: display_config.min_column_width,
            max_column_width: display_config.max_column_width,
            default_column_width: display_config.default_column_width,
            layout: GridLayout::default(),
            last_row_window: 0..0,
            last_col_window: 0..0,
        }
    }

    /// Re-derive display columns and axes after a store change. Scroll
    /// positions survive; selection clamps to the new shape.
    pub fn sync<F>(&mut self, effective: &[EffectiveColumn], row_count: usize, resolve_color: F)
    where
        F: Fn(&str) -> Option<Color>,
    {
        let mut display: Vec<EffectiveColumn> =
            effective.iter().filter(|c| c.visible).cloned().collect();
        for column in display.iter_mut() {
            column.width = column
                .width
                .clamp(self.min_column_width, self.max_column_width);
        }
        self.pinned_count = display.iter().take_while(|c| c.pin).count();
        self.display_colors = display
            .iter()
            .map(|c| c.color.as_deref().and_then(&resolve_color))
            .collect();
        self.cols_axis = OffsetTable::from_sizes(
            display[self.pinned_count..].iter().map(|c| c.width),
            self.default_column_width,
        );
        self.display = display;
        if self.rows_axis.len() != row_count {
            self.rows_axis.set_count(row_count);
        }
        self.selection.clamp_to(row_count, self.display.len());
    }

    /// Reset ephemeral state (selection, scroll) after a row-id reset.
    pub fn reset_ephemeral(&mut self) {
        self.selection.reset();
        self.scroll_x = 0;
        self.scroll_y = 0;
    }

    pub fn display(&self) -> &[EffectiveColumn] {
        &self.display
    }

    pub fn pinned_count(&self) -> usize {
        self.pinned_count
    }

    pub fn column_count(&self) -> usize {
        self.display.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows_axis.len()
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn column(&self, index: usize) -> Option<&EffectiveColumn> {
        self.display.get(index)
    }

    pub fn field_id_at(&self, index: usize) -> Option<&FieldId> {
        self.display.get(index).map(|c| &c.field_id)
    }

    /// Report a measured row height (e.g. an expanded preview row). Falls
    /// back internally when the measurement is non-positive.
    pub fn set_measured_row_height(&mut self, row: usize, height: i32) {
        self.rows_axis.set_measured(row, height);
    }

    pub fn row_height(&self, row: usize) -> u16 {
        self.rows_axis.size(row)
    }

    /// Toggle the expanded preview of a row: tall enough to show a few
    /// lines of paragraph content, or back to a single line. Only the
    /// toggled row's offsets recompute.
    pub fn toggle_row_expand(&mut self, row: usize) {
        if row >= self.rows_axis.len() {
            return;
        }
        let next = if self.rows_axis.size(row) > 1 { 1 } else { 4 };
        self.rows_axis.set_measured(row, next);
    }

    pub fn page_rows(&self) -> usize {
        self.layout.body.height.max(1) as usize
    }

    /// Compute and store the frame geometry. Called at the top of render
    /// and from tests.
    pub fn compute_layout(&mut self, area: Rect) -> GridLayout {
        let selector_width = if self.row_numbers {
            let last = self.rows_axis.len() + self.row_start_index;
            (last.max(1).ilog10() as u16 + 1).max(2) + 2
        } else {
            0
        };
        let header = Rect {
            height: 1.min(area.height),
            ..area
        };
        let body = Rect {
            y: area.y + header.height,
            height: area.height.saturating_sub(header.height),
            ..area
        };
        let pinned = pinned_width(&self.display[..self.pinned_count]);
        // Pinned region never swallows the whole body; leave at least one
        // column's worth of scrollable space when anything is unpinned
        let max_pinned = area.width.saturating_sub(selector_width + self.min_column_width);
        let pinned = pinned.min(max_pinned);
        let boundary_x = area.x + selector_width + pinned;
        self.layout = GridLayout {
            area,
            header,
            body,
            selector_width,
            pinned_width: pinned,
            boundary_x,
        };
        self.layout
    }

    /// Scroll the minimal amount that brings `coord` fully into view.
    pub fn ensure_visible(&mut self, coord: CellCoord) {
        let body_height = self.layout.body.height as u32;
        if body_height > 0 && coord.row < self.rows_axis.len() {
            let top = self.rows_axis.offset_of(coord.row);
            let bottom = top + self.rows_axis.size(coord.row) as u32;
            if top < self.scroll_y {
                self.scroll_y = top;
            } else if bottom > self.scroll_y + body_height {
                self.scroll_y = bottom - body_height;
            }
        }

        if coord.col < self.pinned_count {
            return; // pinned columns are always on screen
        }
        let scrollable_width = self
            .layout
            .area
            .width
            .saturating_sub(self.layout.selector_width + self.layout.pinned_width)
            as u32;
        if scrollable_width == 0 {
            return;
        }
        let c = coord.col - self.pinned_count;
        if c >= self.cols_axis.len() {
            return;
        }
        let left = self.cols_axis.offset_of(c);
        let right = left + self.cols_axis.size(c) as u32;
        if left < self.scroll_x {
            self.scroll_x = left;
        } else if right > self.scroll_x + scrollable_width {
            self.scroll_x = right - scrollable_width;
        }
    }

    /// Unclamped screen geometry of a cell: (x, y, width, height). May lie
    /// partly or fully outside the body when scrolled out.
    fn cell_origin(&mut self, coord: CellCoord) -> Option<(i64, i64, u16, u16)> {
        let layout = self.layout;
        if coord.row >= self.rows_axis.len() || coord.col >= self.display.len() {
            return None;
        }
        let height = self.rows_axis.size(coord.row);
        let y = layout.body.y as i64 + self.rows_axis.offset_of(coord.row) as i64
            - self.scroll_y as i64;

        let width = self.display[coord.col].width;
        let x = if coord.col < self.pinned_count {
            let lefts = sticky_lefts(&self.display[..self.pinned_count]);
            layout.area.x as i64
                + layout.selector_width as i64
                + lefts[coord.col].unwrap_or(0) as i64
        } else {
            let c = coord.col - self.pinned_count;
            layout.boundary_x as i64 + self.cols_axis.offset_of(c) as i64 - self.scroll_x as i64
        };
        Some((x, y, width, height))
    }

    /// Screen rect of a cell, if any part of it is on screen.
    pub fn cell_rect(&mut self, coord: CellCoord) -> Option<Rect> {
        let layout = self.layout;
        let (x, y, width, height) = self.cell_origin(coord)?;
        if y + (height as i64) <= layout.body.y as i64 || y >= layout.body.bottom() as i64 {
            return None;
        }
        if x + (width as i64) <= layout.area.x as i64 || x >= layout.area.right() as i64 {
            return None;
        }

        let clamped_y = y.max(layout.body.y as i64) as u16;
        let clamped_x = x.max(layout.area.x as i64) as u16;
        let bottom = ((y + height as i64).min(layout.body.bottom() as i64)) as u16;
        let right = ((x + width as i64).min(layout.area.right() as i64)) as u16;
        Some(Rect::new(
            clamped_x,
            clamped_y,
            right.saturating_sub(clamped_x),
            bottom.saturating_sub(clamped_y),
        ))
    }

    /// Map a screen position to a cell. The selector column and chrome
    /// return None.
    pub fn hit_test(&mut self, x: u16, y: u16) -> Option<CellCoord> {
        let layout = self.layout;
        if !point_in(layout.body, x, y) {
            return None;
        }
        let row_offset = self.scroll_y + (y - layout.body.y) as u32;
        if row_offset >= self.rows_axis.total_size() {
            return None;
        }
        let row = self.rows_axis.index_at(row_offset);

        if x < layout.area.x + layout.selector_width {
            return None; // reserved row selector
        }
        if x < layout.boundary_x {
            // Inside the pinned region: walk the pinned widths
            let mut left = layout.area.x + layout.selector_width;
            for (i, column) in self.display[..self.pinned_count].iter().enumerate() {
                if x < left + column.width {
                    return Some(CellCoord::new(row, i));
                }
                left += column.width;
            }
            return None;
        }
        let col_offset = self.scroll_x + (x - layout.boundary_x) as u32;
        if col_offset >= self.cols_axis.total_size() {
            return None;
        }
        let col = self.pinned_count + self.cols_axis.index_at(col_offset);
        Some(CellCoord::new(row, col))
    }

    pub fn scroll_rows(&mut self, delta: i64) {
        let max = self
            .rows_axis
            .total_size()
            .saturating_sub(self.layout.body.height as u32);
        self.scroll_y = add_clamped(self.scroll_y, delta, max);
    }

    pub fn scroll_cols(&mut self, delta: i64) {
        let scrollable_width = self
            .layout
            .area
            .width
            .saturating_sub(self.layout.selector_width + self.layout.pinned_width);
        let max = self
            .cols_axis
            .total_size()
            .saturating_sub(scrollable_width as u32);
        self.scroll_x = add_clamped(self.scroll_x, delta, max);
    }
}

fn point_in(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x && x < rect.right() && y >= rect.y && y < rect.bottom()
}

fn add_clamped(value: u32, delta: i64, max: u32) -> u32 {
    let next = value as i64 + delta;
    next.clamp(0, max as i64) as u32
}

/// The grid widget. Reads rows straight from the store; all derived state
/// lives in `GridState`.
pub struct Grid<'a> {
    pub store: &'a TableStore,
    pub ctx: &'a RenderContext,
}

impl<'a> StatefulWidget for Grid<'a> {
    type State = GridState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let layout = state.compute_layout(area);

        let header_style = Style::default()
            .fg(self.ctx.table_header)
            .bg(self.ctx.table_header_bg);
        for x in layout.header.x..layout.header.right() {
            buf[(x, layout.header.y)].set_style(header_style);
        }

        // Row window
        let row_window = state.rows_axis.window(
            state.scroll_y,
            layout.body.height as u32,
            state.overscan_rows,
        );
        state.last_row_window = row_window.clone();

        // Row selector column
        if layout.selector_width > 0 {
            let number_style = Style::default().fg(self.ctx.row_numbers);
            for r in row_window.clone() {
                let Some(y) = row_y(state, layout, r) else {
                    continue;
                };
                let label = format!(
                    "{:>width$} ",
                    r + state.row_start_index,
                    width = layout.selector_width as usize - 1
                );
                buf.set_stringn(
                    layout.area.x,
                    y,
                    &label,
                    layout.selector_width as usize,
                    number_style,
                );
            }
        }

        // Scrollable columns first, pinned drawn after so they cover
        // anything that scrolled underneath the boundary
        let scrollable_width = layout
            .area
            .width
            .saturating_sub(layout.selector_width + layout.pinned_width);
        let col_window =
            state
                .cols_axis
                .window(state.scroll_x, scrollable_width as u32, state.overscan_cols);
        state.last_col_window = col_window.clone();

        for c in col_window.clone() {
            let col = state.pinned_count + c;
            let x = layout.boundary_x as i64 + state.cols_axis.offset_of(c) as i64
                - state.scroll_x as i64;
            render_column(
                self.store,
                state,
                buf,
                layout,
                col,
                x,
                layout.boundary_x,
                row_window.clone(),
                self.ctx,
            );
        }

        let pinned = state.pinned_count;
        if pinned > 0 {
            let lefts = sticky_lefts(&state.display[..pinned]);
            for col in 0..pinned {
                let x = layout.area.x as i64
                    + layout.selector_width as i64
                    + lefts[col].unwrap_or(0) as i64;
                render_column(
                    self.store,
                    state,
                    buf,
                    layout,
                    col,
                    x,
                    layout.area.x + layout.selector_width,
                    row_window.clone(),
                    self.ctx,
                );
            }
        }

        render_selection_overlay(state, buf, layout, self.ctx);
    }
}

fn row_y(state: &mut GridState, layout: GridLayout, row: usize) -> Option<u16> {
    let y = layout.body.y as i64 + state.rows_axis.offset_of(row) as i64 - state.scroll_y as i64;
    if y < layout.body.y as i64 || y >= layout.body.bottom() as i64 {
        return None;
    }
    Some(y as u16)
}

#[allow(clippy::too_many_arguments)]
fn render_column(
    store: &TableStore,
    state: &mut GridState,
    buf: &mut Buffer,
    layout: GridLayout,
    col: usize,
    x: i64,
    clip_left: u16,
    row_window: std::ops::Range<usize>,
    ctx: &RenderContext,
) {
    let column = state.display[col].clone();
    let width = column.width;
    // Visible horizontal span of this column
    let left = x.max(clip_left as i64);
    let right = (x + width as i64).min(layout.area.right() as i64);
    if right <= left {
        return;
    }
    let left = left as u16;
    let right = right as u16;
    let divider = draws_divider(DividerFlags::for_column(&state.display, col));

    // Header cell
    let header_text = format!("{} {}", icon_for(column.field_type), column.field_name);
    let header_style = Style::default()
        .fg(ctx.table_header)
        .bg(ctx.table_header_bg)
        .add_modifier(Modifier::BOLD);
    draw_clipped(buf, x, layout.header.y, width, left, right, &header_text, header_style);

    let value_color = state.display_colors[col].unwrap_or_else(|| ctx.field_type_color(column.field_type));

    for r in row_window {
        if r >= store.row_ids().len() {
            break;
        }
        let Some(y) = row_y(state, layout, r) else {
            continue;
        };
        let row_id = &store.row_ids()[r];
        let cell = store.cell(row_id, &column.field_id);

        let (text, prefix, suffix) = match cell {
            Some(cell) => {
                let decorations = decorations_for(cell, column.field_type);
                (cell.value.display(), decorations.prefix, decorations.suffix)
            }
            None => (String::new(), None, None),
        };

        // A row taller than one line (expanded preview) shows successive
        // lines of the value; everything else renders on its first line
        let height = state.rows_axis.size(r);
        let visible_lines = (height as i64).min(layout.body.bottom() as i64 - y as i64).max(0);
        let base = Style::default().fg(value_color);
        let content_right = right.min((x + width as i64 - 1).max(0) as u16);

        for (line_idx, line) in text.split('\n').chain(std::iter::repeat("")).take(visible_lines as usize).enumerate() {
            let line_y = y + line_idx as u16;
            // Clear the cell span first so stale glyphs never bleed through
            for cx in left..right {
                buf[(cx, line_y)].set_symbol(" ").set_style(base);
            }

            let mut spans: Vec<(String, Style)> = Vec::new();
            if line_idx == 0 {
                if let Some(prefix) = prefix {
                    spans.push((
                        format!("{} ", prefix.glyph()),
                        Style::default().fg(decoration_color(prefix, ctx)),
                    ));
                }
            }
            spans.push((line.to_string(), base));
            if line_idx == 0 {
                if let Some(suffix) = suffix {
                    spans.push((
                        format!(" {}", suffix.glyph()),
                        Style::default().fg(decoration_color(suffix, ctx)),
                    ));
                }
            }

            let mut cursor = x + ctx.table_cell_padding as i64;
            for (text, style) in spans {
                for ch in text.chars() {
                    if cursor >= content_right as i64 {
                        break;
                    }
                    if cursor >= left as i64 {
                        buf[(cursor as u16, line_y)].set_symbol(&ch.to_string()).set_style(style);
                    }
                    cursor += 1;
                }
            }

            // Column separator in the last cell of the span
            let sep_x = x + width as i64 - 1;
            if sep_x >= left as i64 && sep_x < right as i64 {
                let (glyph, style) = if divider {
                    ("┃", Style::default().fg(ctx.pinned_divider))
                } else {
                    ("│", Style::default().fg(ctx.column_separator))
                };
                buf[(sep_x as u16, line_y)].set_symbol(glyph).set_style(style);
            }
        }
    }

    // Divider continues through the header
    let sep_x = x + width as i64 - 1;
    if sep_x >= left as i64 && sep_x < right as i64 {
        let (glyph, style) = if divider {
            (
                "┃",
                Style::default().fg(ctx.pinned_divider).bg(ctx.table_header_bg),
            )
        } else {
            (
                "│",
                Style::default().fg(ctx.column_separator).bg(ctx.table_header_bg),
            )
        };
        buf[(sep_x as u16, layout.header.y)].set_symbol(glyph).set_style(style);
    }
}

fn draw_clipped(
    buf: &mut Buffer,
    x: i64,
    y: u16,
    width: u16,
    left: u16,
    right: u16,
    text: &str,
    style: Style,
) {
    let mut cursor = x + 1;
    let content_right = right.min((x + width as i64 - 1).max(0) as u16);
    for ch in text.chars() {
        if cursor >= content_right as i64 {
            break;
        }
        if cursor >= left as i64 {
            buf[(cursor as u16, y)].set_symbol(&ch.to_string()).set_style(style);
        }
        cursor += 1;
    }
}

fn decoration_color(decoration: Decoration, ctx: &RenderContext) -> Color {
    use crate::cells::Confidence;
    match decoration {
        Decoration::ImagePreview => ctx.link_col,
        Decoration::Confidence(Confidence::Low) => ctx.confidence_low,
        Decoration::Confidence(Confidence::Medium) => ctx.confidence_medium,
        Decoration::Confidence(Confidence::High) => ctx.confidence_high,
        Decoration::TypeWarning => ctx.validation_warning,
        Decoration::ValidationFlag(_) => ctx.warning,
    }
}

fn render_selection_overlay(
    state: &mut GridState,
    buf: &mut Buffer,
    layout: GridLayout,
    ctx: &RenderContext,
) {
    let Some(range) = state.selection.selection() else {
        return;
    };
    let (tl, br) = range.normalized();
    let editing = state.selection.is_editing();
    let active_rect = state
        .selection
        .active_cell()
        .and_then(|coord| state.cell_rect(coord));
    let pinned = state.pinned_count;

    // A range spanning the boundary splits in two: the pinned part lives
    // with the non-scrolling pinned columns, the rest clips at the boundary
    if tl.col < pinned {
        let last_pinned = br.col.min(pinned.saturating_sub(1));
        if let Some(rect) = corner_rect(state, tl, CellCoord::new(br.row, last_pinned)) {
            if let Some(rect) = clip_selection(rect, layout.boundary_x, layout.body, true) {
                render_selection(buf, rect, active_rect, ctx, editing);
            }
        }
    }
    if br.col >= pinned {
        let first_scrollable = tl.col.max(pinned);
        if let Some(rect) = corner_rect(state, CellCoord::new(tl.row, first_scrollable), br) {
            if let Some(rect) = clip_selection(rect, layout.boundary_x, layout.body, false) {
                render_selection(buf, rect, active_rect, ctx, editing);
            }
        }
    }
}

/// Bounding rect of two corner cells from their unclamped geometry.
fn corner_rect(state: &mut GridState, tl: CellCoord, br: CellCoord) -> Option<Rect> {
    let (x1, y1, _, _) = state.cell_origin(tl)?;
    let (x2, y2, w2, h2) = state.cell_origin(br)?;
    let lx = x1.clamp(0, u16::MAX as i64) as u16;
    let ty = y1.clamp(0, u16::MAX as i64) as u16;
    let rx = (x2 + w2 as i64).clamp(0, u16::MAX as i64) as u16;
    let by = (y2 + h2 as i64).clamp(0, u16::MAX as i64) as u16;
    if rx <= lx || by <= ty {
        return None;
    }
    Some(Rect::new(lx, ty, rx - lx, by - ty))
}
