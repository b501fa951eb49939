use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use tui_textarea::{Input, Key, TextArea};

use crate::cache::CacheManager;
use crate::config::Theme;

use super::text_input_common::{add_to_history, load_history_impl, save_history_impl};

/// Event emitted by TextInput widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInputEvent {
    None,
    Submit,         // Enter pressed
    Cancel,         // Esc pressed
    Changed,        // Text content changed
    HistoryChanged, // History navigation occurred
}

/// Single-line text input widget wrapping tui-textarea with history support.
/// Used for the inline cell editor, column rename, and the field search box.
pub struct TextInput {
    textarea: TextArea<'static>,
    pub value: String,
    pub cursor: usize,
    pub history_id: Option<String>, // None = no history, Some(id) = use history with this ID
    pub history: Vec<String>,
    pub history_index: Option<usize>, // Current position in history (None = editing new value)
    pub history_temp: Option<String>, // Temporary storage when navigating history
    pub history_limit: usize,
    pub history_loaded: bool, // Track if history has been loaded (for lazy loading)
    text_color: Option<Color>,
    background_color: Option<Color>,
    focused: bool,
}

impl TextInput {
    pub fn new() -> Self {
        let mut textarea = TextArea::default();
        // Single-line: no cursor line underline
        textarea.set_cursor_line_style(Style::default());

        Self {
            textarea,
            value: String::new(),
            cursor: 0,
            history_id: None,
            history: Vec::new(),
            history_index: None,
            history_temp: None,
            history_limit: 1000,
            history_loaded: false,
            text_color: None,
            background_color: None,
            focused: false,
        }
    }

    /// Sync value and cursor from textarea
    fn sync_from_textarea(&mut self) {
        self.value = self.textarea.lines().first().cloned().unwrap_or_default();
        self.cursor = self.textarea.cursor().1;
    }

    /// Sync textarea from value and cursor
    fn sync_to_textarea(&mut self) {
        let single_line = self.value.replace(['\n', '\r'], " ");
        self.textarea = TextArea::from([single_line]);
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea
            .move_cursor(tui_textarea::CursorMove::Jump(0, self.cursor as u16));
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

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = Some(color);
        self.apply_colors_to_textarea();
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self.apply_colors_to_textarea();
        self
    }

    pub fn with_history(mut self, history_id: String) -> Self {
        self.history_id = Some(history_id);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
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
        self.cursor = value.chars().count();
        self.value = value;
        self.sync_to_textarea();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.history_index = None;
        self.history_temp = None;
        self.sync_to_textarea();
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn load_history(&mut self, cache: &CacheManager) -> Result<()> {
        if let Some(id) = &self.history_id {
            self.history = load_history_impl(cache, id)?;
            self.history_loaded = true;
        }
        Ok(())
    }

    pub fn save_to_history(&mut self, cache: &CacheManager) -> Result<()> {
        if let Some(id) = &self.history_id {
            if !self.value.trim().is_empty() {
                add_to_history(&mut self.history, self.value.clone());
                save_history_impl(cache, id, &self.history, self.history_limit)?;
            }
        }
        Ok(())
    }

    pub fn navigate_history_up(&mut self, cache: Option<&CacheManager>) {
        if !self.history_loaded {
            if let Some(cache) = cache {
                let _ = self.load_history(cache);
            }
        }
        if self.history.is_empty() {
            return;
        }
        let next_index = match self.history_index {
            None => {
                self.history_temp = Some(self.value.clone());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(next_index);
        self.set_value(self.history[next_index].clone());
    }

    pub fn navigate_history_down(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };
        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            self.set_value(self.history[index + 1].clone());
        } else {
            self.history_index = None;
            let restored = self.history_temp.take().unwrap_or_default();
            self.set_value(restored);
        }
    }

    pub fn handle_key(&mut self, event: &KeyEvent, cache: Option<&CacheManager>) -> TextInputEvent {
        let input = key_event_to_input(event);

        match event.code {
            KeyCode::Enter => {
                // For single-line, Enter means submit (don't insert newline)
                if let Some(cache) = cache {
                    let _ = self.save_to_history(cache);
                }
                return TextInputEvent::Submit;
            }
            KeyCode::Esc => {
                return TextInputEvent::Cancel;
            }
            KeyCode::Up if self.history_id.is_some() => {
                self.navigate_history_up(cache);
                return TextInputEvent::HistoryChanged;
            }
            KeyCode::Down if self.history_id.is_some() => {
                self.navigate_history_down();
                return TextInputEvent::HistoryChanged;
            }
            _ => {
                if matches!(input.key, Key::Char('\n') | Key::Char('\r')) {
                    return TextInputEvent::None;
                }
                let before = self.value.clone();
                self.textarea.input(input);
                self.sync_from_textarea();
                // Clear history navigation state when user types
                if self.history_index.is_some() {
                    self.history_index = None;
                    self.history_temp = None;
                }
                if self.value != before {
                    return TextInputEvent::Changed;
                }
            }
        }
        TextInputEvent::None
    }
}

/// Convert crossterm KeyEvent to tui_textarea::Input
pub(crate) fn key_event_to_input(event: &KeyEvent) -> Input {
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = event.modifiers.contains(KeyModifiers::ALT);
    let shift = event.modifiers.contains(KeyModifiers::SHIFT);

    let key = match event.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Enter,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::Tab, // BackTab as Tab
        KeyCode::Delete => Key::Delete,
        KeyCode::Esc => Key::Esc,
        _ => Key::Null,
    };

    Input {
        key,
        ctrl,
        alt,
        shift,
    }
}

impl Default for TextInput {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        // The textarea handles text rendering and cursor styling
        self.textarea.render(area, buf);

        // Remove underline modifier from all cells (tui-textarea handles
        // cursor visibility via set_cursor_style)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_updates_value() {
        let mut input = TextInput::new();
        assert_eq!(input.handle_key(&key(KeyCode::Char('h')), None), TextInputEvent::Changed);
        input.handle_key(&key(KeyCode::Char('i')), None);
        assert_eq!(input.value(), "hi");
        assert_eq!(input.cursor, 2);
    }

    #[test]
    fn test_enter_submits_and_esc_cancels() {
        let mut input = TextInput::new();
        input.set_value("hello".to_string());
        assert_eq!(input.handle_key(&key(KeyCode::Enter), None), TextInputEvent::Submit);
        assert_eq!(input.handle_key(&key(KeyCode::Esc), None), TextInputEvent::Cancel);
        // Value untouched by submit/cancel; the caller decides what to do
        assert_eq!(input.value(), "hello");
    }

    #[test]
    fn test_set_value_places_cursor_at_end() {
        let mut input = TextInput::new();
        input.set_value("Amount".to_string());
        assert_eq!(input.cursor, 6);
        input.clear();
        assert!(input.is_empty());
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_history_navigation_restores_draft() {
        let mut input = TextInput::new().with_history("field_search".to_string());
        input.history = vec!["arr".to_string(), "email".to_string()];
        input.history_loaded = true;
        input.set_value("draft".to_string());
        input.navigate_history_up(None);
        assert_eq!(input.value(), "email");
        input.navigate_history_up(None);
        assert_eq!(input.value(), "arr");
        input.navigate_history_down();
        assert_eq!(input.value(), "email");
        input.navigate_history_down();
        assert_eq!(input.value(), "draft");
    }
}
