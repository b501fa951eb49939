use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{Input, Key, TextArea};

use crate::config::Theme;

use super::text_input::key_event_to_input;

/// Event emitted by MultiLineTextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiLineEvent {
    None,
    /// Enter without Shift: the expanded editor commits
    Submit,
    /// Esc: discard
    Cancel,
    Changed,
}

/// Multi-line text input wrapping tui-textarea. Backs the expanded
/// (floating) cell editor and the column description editor.
///
/// Enter commits; Shift+Enter inserts a newline and stays in the editor.
pub struct MultiLineTextInput {
    textarea: TextArea<'static>,
    pub value: String,
    pub cursor_line: usize,
    pub cursor_col: usize,
    text_color: Option<Color>,
    background_color: Option<Color>,
    focused: bool,
}

impl MultiLineTextInput {
    pub fn new() -> Self {
        let mut textarea = TextArea::default();
        textarea.set_cursor_line_style(Style::default());

        Self {
            textarea,
            value: String::new(),
            cursor_line: 0,
            cursor_col: 0,
            text_color: None,
            background_color: None,
            focused: false,
        }
    }

    fn sync_from_textarea(&mut self) {
        self.value = self.textarea.lines().join("\n");
        let (line, col) = self.textarea.cursor();
        self.cursor_line = line;
        self.cursor_col = col;
    }

    fn sync_to_textarea(&mut self) {
        let lines: Vec<String> = self.value.split('\n').map(|s| s.to_string()).collect();
        self.textarea = TextArea::from(lines);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea
            .move_cursor(tui_textarea::CursorMove::Bottom);
        self.textarea.move_cursor(tui_textarea::CursorMove::End);
        self.apply_colors_to_textarea();
    }

    fn apply_colors_to_textarea(&mut self) {
        let mut style = Style::default();
        if let Some(text_color) = self.text_color {
            style = style.fg(text_color);
        }
        if let Some(bg_color) = self.background_color {
            style = style.bg(bg_color);
        }
        self.textarea.set_style(style);
        self.textarea.set_cursor_line_style(Style::default());
        if self.focused {
            self.textarea
                .set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
        } else {
            self.textarea.set_cursor_style(Style::default());
        }
    }

    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.text_color = Some(theme.get("text_primary"));
        self.background_color = theme.get_optional("background");
        self.apply_colors_to_textarea();
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.apply_colors_to_textarea();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: String) {
        self.value = value;
        self.sync_to_textarea();
        self.sync_from_textarea();
    }

    pub fn clear(&mut self) {
        self.set_value(String::new());
    }

    pub fn line_count(&self) -> usize {
        self.textarea.lines().len()
    }

    pub fn handle_key(&mut self, event: &KeyEvent) -> MultiLineEvent {
        match event.code {
            KeyCode::Enter if event.modifiers.contains(KeyModifiers::SHIFT) => {
                // Shift+Enter inserts a newline and keeps editing
                self.textarea.input(Input {
                    key: Key::Enter,
                    ctrl: false,
                    alt: false,
                    shift: false,
                });
                self.sync_from_textarea();
                MultiLineEvent::Changed
            }
            KeyCode::Enter => MultiLineEvent::Submit,
            KeyCode::Esc => MultiLineEvent::Cancel,
            _ => {
                let before_len = self.value.len();
                let before_cursor = (self.cursor_line, self.cursor_col);
                self.textarea.input(key_event_to_input(event));
                self.sync_from_textarea();
                if self.value.len() != before_len
                    || (self.cursor_line, self.cursor_col) != before_cursor
                {
                    MultiLineEvent::Changed
                } else {
                    MultiLineEvent::None
                }
            }
        }
    }
}

impl Default for MultiLineTextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &MultiLineTextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.textarea.render(area, buf);

        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let cell = &mut buf[(x, y)];
                let mut style = cell.style();
                style = style.remove_modifier(Modifier::UNDERLINED);
                cell.set_style(style);
            }
        }
    }
}
