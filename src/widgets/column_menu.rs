//! The per-column header menu. Grid-owned actions (rename, describe, pin,
//! hide, delete) are handled in-process; enrichment actions belong to the
//! external actions drawer and go through the store's dialog seam.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::columns::FieldId;
use crate::render::context::RenderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Rename,
    Describe,
    TogglePin,
    ToggleVisibility,
    Delete,
    /// Handled by the external actions drawer via open_dialog
    RunEnrichment,
    ClearColumn,
}

impl MenuAction {
    pub fn label(&self, pinned: bool, visible: bool) -> &'static str {
        match self {
            Self::Rename => "Rename",
            Self::Describe => "Edit description",
            Self::TogglePin => {
                if pinned {
                    "Unpin"
                } else {
                    "Pin"
                }
            }
            Self::ToggleVisibility => {
                if visible {
                    "Hide"
                } else {
                    "Show"
                }
            }
            Self::Delete => "Delete",
            Self::RunEnrichment => "Run enrichment…",
            Self::ClearColumn => "Clear column…",
        }
    }

    /// Dialog action type for entries the drawer owns.
    pub fn dialog_action(&self) -> Option<&'static str> {
        match self {
            Self::RunEnrichment => Some("run-enrichment"),
            Self::ClearColumn => Some("clear-column"),
            _ => None,
        }
    }
}

const MENU_ACTIONS: [MenuAction; 7] = [
    MenuAction::Rename,
    MenuAction::Describe,
    MenuAction::TogglePin,
    MenuAction::ToggleVisibility,
    MenuAction::RunEnrichment,
    MenuAction::ClearColumn,
    MenuAction::Delete,
];

#[derive(Debug, Clone, PartialEq)]
pub enum MenuEvent {
    None,
    Close,
    Chosen(MenuAction),
}

pub struct ColumnMenu {
    pub active: bool,
    pub field_id: FieldId,
    pub field_name: String,
    pub pinned: bool,
    pub visible: bool,
    /// Anchor: screen rect of the header cell the menu belongs to
    pub anchor: Rect,
    pub list_state: ListState,
    /// Confirmation stage for Delete
    pub delete_confirm: bool,
}

impl ColumnMenu {
    pub fn new() -> Self {
        Self {
            active: false,
            field_id: String::new(),
            field_name: String::new(),
            pinned: false,
            visible: true,
            anchor: Rect::default(),
            list_state: ListState::default(),
            delete_confirm: false,
        }
    }

    pub fn open(&mut self, field_id: FieldId, field_name: String, pinned: bool, visible: bool, anchor: Rect) {
        self.active = true;
        self.field_id = field_id;
        self.field_name = field_name;
        self.pinned = pinned;
        self.visible = visible;
        self.anchor = anchor;
        self.delete_confirm = false;
        self.list_state.select(Some(0));
    }

    pub fn close(&mut self) {
        self.active = false;
        self.delete_confirm = false;
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> MenuEvent {
        if self.delete_confirm {
            return match event.code {
                KeyCode::Enter | KeyCode::Char('y') => MenuEvent::Chosen(MenuAction::Delete),
                KeyCode::Esc | KeyCode::Char('n') => {
                    self.delete_confirm = false;
                    MenuEvent::None
                }
                _ => MenuEvent::None,
            };
        }
        match event.code {
            KeyCode::Esc => MenuEvent::Close,
            KeyCode::Down | KeyCode::Char('j') => {
                let i = self.list_state.selected().unwrap_or(0);
                if i + 1 < MENU_ACTIONS.len() {
                    self.list_state.select(Some(i + 1));
                }
                MenuEvent::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let i = self.list_state.selected().unwrap_or(0);
                if i > 0 {
                    self.list_state.select(Some(i - 1));
                }
                MenuEvent::None
            }
            KeyCode::Enter => {
                let action = MENU_ACTIONS[self.list_state.selected().unwrap_or(0)];
                if action == MenuAction::Delete {
                    // Delete asks for confirmation first
                    self.delete_confirm = true;
                    MenuEvent::None
                } else {
                    MenuEvent::Chosen(action)
                }
            }
            _ => MenuEvent::None,
        }
    }

    /// Height the rendered menu needs (actions + border).
    pub fn height(&self) -> u16 {
        MENU_ACTIONS.len() as u16 + 2
    }
}

impl Default for ColumnMenu {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ColumnMenuView<'a> {
    pub ctx: &'a RenderContext,
}

impl<'a> StatefulWidget for ColumnMenuView<'a> {
    type State = ColumnMenu;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        Clear.render(area, buf);
        let title = format!(" {} ", state.field_name);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if state.delete_confirm {
                self.ctx.modal_border_error
            } else {
                self.ctx.modal_border_active
            }))
            .title(title);
        let inner = block.inner(area);
        block.render(area, buf);

        if state.delete_confirm {
            let line = Line::styled(
                format!("Delete '{}'? y/n", state.field_name),
                Style::default().fg(self.ctx.error),
            );
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        let items: Vec<ListItem> = MENU_ACTIONS
            .iter()
            .map(|action| {
                let style = if *action == MenuAction::Delete {
                    Style::default().fg(self.ctx.error)
                } else {
                    Style::default().fg(self.ctx.text_primary)
                };
                ListItem::new(Line::styled(
                    action.label(state.pinned, state.visible),
                    style,
                ))
            })
            .collect();
        let list =
            List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        StatefulWidget::render(list, inner, buf, &mut state.list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_chooses_selected_action() {
        let mut menu = ColumnMenu::new();
        menu.open("arr".to_string(), "ARR".to_string(), false, true, Rect::default());
        assert_eq!(menu.handle_key(&key(KeyCode::Enter)), MenuEvent::Chosen(MenuAction::Rename));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut menu = ColumnMenu::new();
        menu.open("arr".to_string(), "ARR".to_string(), false, true, Rect::default());
        for _ in 0..MENU_ACTIONS.len() {
            menu.handle_key(&key(KeyCode::Down));
        }
        // Enter on Delete arms the confirmation, does not fire
        assert_eq!(menu.handle_key(&key(KeyCode::Enter)), MenuEvent::None);
        assert!(menu.delete_confirm);
        // 'n' backs out
        assert_eq!(menu.handle_key(&key(KeyCode::Char('n'))), MenuEvent::None);
        assert!(!menu.delete_confirm);
        // Re-arm and confirm
        menu.handle_key(&key(KeyCode::Enter));
        assert_eq!(
            menu.handle_key(&key(KeyCode::Char('y'))),
            MenuEvent::Chosen(MenuAction::Delete)
        );
    }

    #[test]
    fn test_dialog_actions_map_to_action_types() {
        assert_eq!(MenuAction::RunEnrichment.dialog_action(), Some("run-enrichment"));
        assert_eq!(MenuAction::Rename.dialog_action(), None);
    }
}
