//! The field panel: a searchable sidebar listing the active view's columns,
//! where fields are reordered, pinned, and hidden.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::cache::CacheManager;
use crate::cells::FieldType;
use crate::columns::{EffectiveColumn, FieldId};
use crate::decorations::icon_for;
use crate::render::context::RenderContext;
use crate::reorder::ReorderController;

use super::text_input::{TextInput, TextInputEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub field_id: FieldId,
    pub field_name: String,
    pub field_type: FieldType,
    pub pin: bool,
    pub visible: bool,
}

impl FieldEntry {
    pub fn from_column(column: &EffectiveColumn) -> Self {
        Self {
            field_id: column.field_id.clone(),
            field_name: column.field_name.clone(),
            field_type: column.field_type,
            pin: column.pin,
            visible: column.visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldListFocus {
    Search,
    List,
}

/// What a keypress in the panel asks the app to do.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldListAction {
    None,
    Close,
    /// Search text changed; apply it after the debounce window
    SearchChanged,
    /// Drop finished: reorder to this full id list
    Reorder(Vec<FieldId>),
    TogglePin(FieldId, bool),
    ToggleVisibility(FieldId, bool),
}

pub struct FieldListPanel {
    pub active: bool,
    pub focus: FieldListFocus,
    pub search: TextInput,
    /// Filter actually applied to the list (search input lags behind it by
    /// the debounce window)
    pub applied_filter: String,
    pub list_state: ListState,
    entries: Vec<FieldEntry>,
    reorder: ReorderController,
}

impl FieldListPanel {
    pub fn new() -> Self {
        Self {
            active: false,
            focus: FieldListFocus::List,
            search: TextInput::new().with_history("field_search".to_string()),
            applied_filter: String::new(),
            list_state: ListState::default(),
            entries: Vec::new(),
            reorder: ReorderController::default(),
        }
    }

    pub fn open(&mut self) {
        self.active = true;
        self.focus = FieldListFocus::List;
        if self.list_state.selected().is_none() && !self.entries.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn close(&mut self) {
        self.active = false;
        self.reorder.cancel();
        self.search.clear();
        self.applied_filter.clear();
    }

    /// Re-sync from the store's effective columns. A grab in progress is
    /// kept only if the id set is unchanged.
    pub fn set_entries(&mut self, entries: Vec<FieldEntry>) {
        let ids: Vec<FieldId> = entries.iter().map(|e| e.field_id.clone()).collect();
        if self.reorder.grabbed().is_none() || self.reorder.order() != ids.as_slice() {
            self.reorder.set_order(ids);
        }
        self.entries = entries;
        let len = self.filtered().len();
        if len == 0 {
            self.list_state.select(None);
        } else if self.list_state.selected().map(|s| s >= len).unwrap_or(true) {
            self.list_state.select(Some(len - 1));
        }
    }

    pub fn grabbed(&self) -> Option<usize> {
        self.reorder.grabbed()
    }

    /// Apply the debounced search text to the list.
    pub fn apply_filter(&mut self) {
        self.applied_filter = self.search.value().to_string();
        self.reorder.set_filter_active(!self.applied_filter.is_empty());
        let len = self.filtered().len();
        if len == 0 {
            self.list_state.select(None);
        } else {
            self.list_state.select(Some(0));
        }
    }

    /// Entries matching the applied filter, in display order. With a grab
    /// in progress the reorder controller's preview order wins.
    pub fn filtered(&self) -> Vec<&FieldEntry> {
        let ordered: Vec<&FieldEntry> = self
            .reorder
            .order()
            .iter()
            .filter_map(|id| self.entries.iter().find(|e| &e.field_id == id))
            .collect();
        if self.applied_filter.is_empty() {
            return ordered;
        }
        let needle = self.applied_filter.to_lowercase();
        ordered
            .into_iter()
            .filter(|e| e.field_name.to_lowercase().contains(&needle))
            .collect()
    }

    fn selected_entry(&self) -> Option<&FieldEntry> {
        let filtered = self.filtered();
        self.list_state.selected().and_then(|i| filtered.get(i).copied())
    }

    pub fn handle_key(&mut self, event: &KeyEvent, cache: Option<&CacheManager>) -> FieldListAction {
        if self.focus == FieldListFocus::Search {
            return match self.search.handle_key(event, cache) {
                TextInputEvent::Submit => {
                    self.search.set_focused(false);
                    self.focus = FieldListFocus::List;
                    FieldListAction::SearchChanged
                }
                TextInputEvent::Cancel => {
                    self.search.clear();
                    self.search.set_focused(false);
                    self.focus = FieldListFocus::List;
                    FieldListAction::SearchChanged
                }
                TextInputEvent::Changed => FieldListAction::SearchChanged,
                _ => FieldListAction::None,
            };
        }

        let len = self.filtered().len();
        match event.code {
            KeyCode::Esc => {
                if self.reorder.grabbed().is_some() {
                    self.reorder.cancel();
                    FieldListAction::None
                } else {
                    FieldListAction::Close
                }
            }
            KeyCode::Char('/') | KeyCode::Tab => {
                self.focus = FieldListFocus::Search;
                self.search.set_focused(true);
                FieldListAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let selected = self.list_state.selected().unwrap_or(0);
                if selected + 1 < len {
                    if self.reorder.grabbed().is_some() {
                        self.reorder.hover(selected + 1);
                    }
                    self.list_state.select(Some(selected + 1));
                }
                FieldListAction::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let selected = self.list_state.selected().unwrap_or(0);
                if selected > 0 {
                    if self.reorder.grabbed().is_some() {
                        self.reorder.hover(selected - 1);
                    }
                    self.list_state.select(Some(selected - 1));
                }
                FieldListAction::None
            }
            KeyCode::Char(' ') => {
                if self.reorder.grabbed().is_some() {
                    match self.reorder.drop_grabbed() {
                        Some(order) => FieldListAction::Reorder(order),
                        None => FieldListAction::None,
                    }
                } else if let Some(selected) = self.list_state.selected() {
                    // Grab is refused while a search filter is active
                    self.reorder.grab(selected);
                    FieldListAction::None
                } else {
                    FieldListAction::None
                }
            }
            KeyCode::Char('p') => match self.selected_entry() {
                Some(entry) => {
                    FieldListAction::TogglePin(entry.field_id.clone(), !entry.pin)
                }
                None => FieldListAction::None,
            },
            KeyCode::Char('h') | KeyCode::Char('v') => match self.selected_entry() {
                Some(entry) => {
                    FieldListAction::ToggleVisibility(entry.field_id.clone(), !entry.visible)
                }
                None => FieldListAction::None,
            },
            _ => FieldListAction::None,
        }
    }
}

impl Default for FieldListPanel {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FieldListView<'a> {
    pub ctx: &'a RenderContext,
}

impl<'a> StatefulWidget for FieldListView<'a> {
    type State = FieldListPanel;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if state.focus == FieldListFocus::List {
                self.ctx.modal_border_active
            } else {
                self.ctx.modal_border
            }))
            .title(" Fields ");
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Fill(1), Constraint::Length(1)])
            .split(inner);

        // Search line
        let search_prefix = Span::styled("/ ", Style::default().fg(self.ctx.dimmed));
        buf.set_line(chunks[0].x, chunks[0].y, &Line::from(search_prefix), 2);
        let search_area = Rect {
            x: chunks[0].x + 2,
            width: chunks[0].width.saturating_sub(2),
            ..chunks[0]
        };
        (&state.search).render(search_area, buf);

        // Field list
        let grabbed = state.grabbed();
        let reorder_disabled = !state.applied_filter.is_empty();
        let items: Vec<ListItem> = state
            .filtered()
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let marker = if Some(i) == grabbed { "◆ " } else { "  " };
                let pin = if entry.pin { "⊤ " } else { "  " };
                let mut style = Style::default().fg(self.ctx.text_primary);
                if !entry.visible {
                    style = style.fg(self.ctx.dimmed).add_modifier(Modifier::DIM);
                }
                if Some(i) == grabbed {
                    style = style.fg(self.ctx.secondary);
                }
                ListItem::new(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(
                        format!("{} ", icon_for(entry.field_type)),
                        Style::default().fg(self.ctx.dimmed),
                    ),
                    Span::styled(entry.field_name.clone(), style),
                    Span::raw(" "),
                    Span::styled(pin, Style::default().fg(self.ctx.primary)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        StatefulWidget::render(list, chunks[1], buf, &mut state.list_state);

        // Hint line
        let hint = if reorder_disabled {
            "reorder disabled while filtering"
        } else if grabbed.is_some() {
            "j/k move · space drop · esc cancel"
        } else {
            "space grab · p pin · h hide · / search"
        };
        buf.set_line(
            chunks[2].x,
            chunks[2].y,
            &Line::styled(hint, Style::default().fg(self.ctx.dimmed)),
            chunks[2].width,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn entries() -> Vec<FieldEntry> {
        ["name", "arr", "email"]
            .iter()
            .map(|id| FieldEntry {
                field_id: id.to_string(),
                field_name: id.to_string(),
                field_type: FieldType::Text,
                pin: false,
                visible: true,
            })
            .collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_grab_move_drop_emits_full_order() {
        let mut panel = FieldListPanel::new();
        panel.set_entries(entries());
        panel.open();
        assert_eq!(panel.handle_key(&key(KeyCode::Char(' ')), None), FieldListAction::None);
        panel.handle_key(&key(KeyCode::Down), None);
        let action = panel.handle_key(&key(KeyCode::Char(' ')), None);
        assert_eq!(
            action,
            FieldListAction::Reorder(vec![
                "arr".to_string(),
                "name".to_string(),
                "email".to_string()
            ])
        );
    }

    #[test]
    fn test_filter_blocks_grab() {
        let mut panel = FieldListPanel::new();
        panel.set_entries(entries());
        panel.open();
        panel.search.set_value("ar".to_string());
        panel.apply_filter();
        panel.handle_key(&key(KeyCode::Char(' ')), None);
        // Grab refused; space again would be a drop if a grab existed
        assert!(panel.grabbed().is_none());
        assert_eq!(panel.handle_key(&key(KeyCode::Char(' ')), None), FieldListAction::None);
    }

    #[test]
    fn test_filtered_list_narrows() {
        let mut panel = FieldListPanel::new();
        panel.set_entries(entries());
        panel.search.set_value("a".to_string());
        panel.apply_filter();
        let names: Vec<&str> = panel.filtered().iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, ["name", "arr", "email"]);
        panel.search.set_value("arr".to_string());
        panel.apply_filter();
        let names: Vec<&str> = panel.filtered().iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(names, ["arr"]);
    }

    #[test]
    fn test_pin_toggle_targets_selected_entry() {
        let mut panel = FieldListPanel::new();
        panel.set_entries(entries());
        panel.open();
        panel.handle_key(&key(KeyCode::Down), None);
        let action = panel.handle_key(&key(KeyCode::Char('p')), None);
        assert_eq!(action, FieldListAction::TogglePin("arr".to_string(), true));
    }

    #[test]
    fn test_escape_cancels_grab_before_closing() {
        let mut panel = FieldListPanel::new();
        panel.set_entries(entries());
        panel.open();
        panel.handle_key(&key(KeyCode::Char(' ')), None);
        assert_eq!(panel.handle_key(&key(KeyCode::Esc), None), FieldListAction::None);
        assert!(panel.grabbed().is_none());
        assert_eq!(panel.handle_key(&key(KeyCode::Esc), None), FieldListAction::Close);
    }
}
