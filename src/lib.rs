use color_eyre::Result;
use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, StatefulWidget, Widget, Wrap};
use ratatui::buffer::Buffer;

pub mod cache;
pub mod cells;
pub mod columns;
pub mod config;
pub mod decorations;
pub mod pinned;
pub mod render;
pub mod reorder;
pub mod selection;
pub mod snapshot;
pub mod store;
pub mod viewport;
pub mod widgets;

pub use cache::CacheManager;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use leadgrid_cli::Args;

use cells::CellValue;
use columns::FieldId;
use render::context::RenderContext;
use render::layout::{app_layout, centered_rect_fixed};
use render::overlays::anchor_editor_rect;
use selection::{CellCoord, CommitRequest, EditMode};
use snapshot::{load_table, save_table};
use store::{PendingCommit, StoreEvent, TableStore};
use widgets::column_menu::{ColumnMenu, ColumnMenuView, MenuAction, MenuEvent};
use widgets::controls::Controls;
use widgets::field_list::{FieldEntry, FieldListAction, FieldListPanel, FieldListView};
use widgets::grid::{Grid, GridState};
use widgets::multiline_text_input::{MultiLineEvent, MultiLineTextInput};
use widgets::text_input::{TextInput, TextInputEvent};

/// Application name used for cache directory and other app-specific paths
pub const APP_NAME: &str = "leadgrid";

/// Options resolved from CLI args and config when opening a table.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub view: Option<String>,
    pub read_only: bool,
    pub row_numbers: bool,
    pub row_start_index: usize,
    pub default_column_width: u16,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self {
            view: None,
            read_only: false,
            row_numbers: true,
            row_start_index: 1,
            default_column_width: snapshot::DEFAULT_COLUMN_WIDTH,
        }
    }

    /// Create OpenOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &Args, config: &AppConfig) -> Self {
        let mut opts = OpenOptions::new();
        opts.view = args.view.clone();
        opts.read_only = args.read_only;
        opts.row_numbers = args.row_numbers || config.display.row_numbers;
        opts.row_start_index = args
            .row_start_index
            .unwrap_or(config.display.row_start_index);
        opts.default_column_width = args
            .column_width
            .unwrap_or(config.display.default_column_width);
        opts
    }
}

impl From<&Args> for OpenOptions {
    fn from(args: &Args) -> Self {
        // Use default config if creating from args alone
        let config = AppConfig::default();
        Self::from_args_and_config(args, &config)
    }
}

pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Open(PathBuf, OpenOptions),
    Exit,
    Crash(String),
    Resize(u16, u16),
    Update,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    EditingCell,
    FieldPanel,
    ColumnMenu,
    RenameColumn,
    DescribeColumn,
}

#[derive(Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }

    pub fn hide(&mut self) {
        self.active = false;
        self.message.clear();
    }
}

/// A pending deadline for a coalesced side effect. A new schedule replaces
/// the old deadline (last write wins).
#[derive(Debug)]
struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            deadline: None,
        }
    }

    fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }

    fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the deadline passes.
    fn fire_if_due(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Fire immediately (explicit submit supersedes the timer).
    fn flush(&mut self) -> bool {
        let was_pending = self.deadline.is_some();
        self.deadline = None;
        was_pending
    }
}

pub struct App {
    pub store: Option<TableStore>,
    path: Option<PathBuf>,
    events: Sender<AppEvent>,
    pub grid: GridState,
    pub input_mode: InputMode,
    pub field_panel: FieldListPanel,
    pub column_menu: ColumnMenu,
    inline_editor: TextInput,
    expanded_editor: MultiLineTextInput,
    rename_input: TextInput,
    rename_target: Option<FieldId>,
    rename_original: String,
    rename_anchor: Rect,
    describe_editor: MultiLineTextInput,
    describe_target: Option<FieldId>,
    error_modal: ErrorModal,
    cache: CacheManager,
    theme: Theme,
    ctx: RenderContext,
    config: AppConfig,
    read_only: bool,
    debug_enabled: bool,
    rename_debounce: Debounce,
    search_debounce: Debounce,
    last_click: Option<(CellCoord, Instant)>,
    /// Commit records drained from the store, held for the request layer
    commit_log: Vec<PendingCommit>,
    dangling_overrides: usize,
    status: Option<String>,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        let config = AppConfig::default();
        let theme = Theme::from_config(&config.theme).unwrap_or_else(|e| {
            eprintln!(
                "Warning: Failed to create default theme: {}. Using fallback.",
                e
            );
            Theme {
                colors: std::collections::HashMap::new(),
            }
        });
        Self::new_with_config(events, theme, config)
    }

    pub fn new_with_config(events: Sender<AppEvent>, theme: Theme, config: AppConfig) -> App {
        let cache = CacheManager::new(APP_NAME).unwrap_or_else(|e| {
            eprintln!("Warning: Could not initialize cache manager: {}", e);
            CacheManager {
                cache_dir: std::env::temp_dir().join(APP_NAME),
            }
        });

        let ctx = RenderContext::from_theme(&theme, config.display.table_cell_padding);
        let grid = GridState::new(&config.display);
        let history_limit = config.search.history_limit;

        App {
            store: None,
            path: None,
            events,
            grid,
            input_mode: InputMode::Normal,
            field_panel: FieldListPanel::new(),
            column_menu: ColumnMenu::new(),
            inline_editor: TextInput::new().with_theme(&theme),
            expanded_editor: MultiLineTextInput::new().with_theme(&theme),
            rename_input: TextInput::new()
                .with_theme(&theme)
                .with_history("rename".to_string())
                .with_history_limit(history_limit),
            rename_target: None,
            rename_original: String::new(),
            rename_anchor: Rect::default(),
            describe_editor: MultiLineTextInput::new().with_theme(&theme),
            describe_target: None,
            error_modal: ErrorModal::new(),
            cache,
            rename_debounce: Debounce::new(config.performance.rename_debounce_ms),
            search_debounce: Debounce::new(config.performance.search_debounce_ms),
            theme,
            ctx,
            read_only: false,
            debug_enabled: config.debug.enabled,
            config,
            last_click: None,
            commit_log: Vec::new(),
            dangling_overrides: 0,
            status: None,
        }
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn enable_debug(&mut self) {
        self.debug_enabled = true;
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Commit records waiting for the backend request layer. Fire and
    /// forget: nothing here retries or rolls back.
    pub fn drain_commit_log(&mut self) -> Vec<PendingCommit> {
        std::mem::take(&mut self.commit_log)
    }

    /// Handle an application event. May return a follow-up event to queue.
    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Mouse(mouse) => self.mouse(mouse),
            AppEvent::Open(path, opts) => {
                self.open(path.clone(), opts.clone());
                None
            }
            AppEvent::Resize(_, _) | AppEvent::Update => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    /// Open a table snapshot, replacing any table currently loaded.
    pub fn open(&mut self, path: PathBuf, opts: OpenOptions) {
        match load_table(&path, opts.default_column_width) {
            Ok(mut store) => {
                if let Some(view_name) = &opts.view {
                    if !store.set_active_view_by_name(view_name) {
                        self.status = Some(format!("view '{}' not found", view_name));
                    }
                }
                self.read_only = opts.read_only;
                self.grid.row_numbers = opts.row_numbers;
                self.grid.row_start_index = opts.row_start_index;
                self.path = Some(path);
                self.store = Some(store);
                self.grid.reset_ephemeral();
                self.input_mode = InputMode::Normal;
                self.process_store();
            }
            Err(e) => {
                self.error_modal.show(format!("{:#}", e));
            }
        }
    }

    /// Periodic housekeeping from the main loop: fire due debounced work.
    /// Returns true when a redraw is needed.
    pub fn tick(&mut self) -> bool {
        let mut updated = false;
        if self.rename_debounce.fire_if_due() {
            self.apply_pending_rename();
            updated = true;
        }
        if self.search_debounce.fire_if_due() {
            self.field_panel.apply_filter();
            updated = true;
        }
        updated
    }

    /// Drain store events and re-derive grid/panel state.
    fn process_store(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        for event in store.drain_events() {
            match event {
                StoreEvent::RowsReset => {
                    self.grid.reset_ephemeral();
                }
                StoreEvent::DanglingOverrides { field_ids, .. } => {
                    self.dangling_overrides = field_ids.len();
                }
                StoreEvent::DialogOpened(action) => {
                    self.status = Some(format!("dialog: {}", action));
                }
                StoreEvent::DialogClosed => {
                    self.status = None;
                }
                StoreEvent::ColumnsChanged
                | StoreEvent::ViewChanged
                | StoreEvent::CellUpdated { .. } => {}
            }
        }
        let effective: Vec<columns::EffectiveColumn> = store.effective_columns().to_vec();
        // Effective-column recompute may itself report dangling overrides
        for event in store.drain_events() {
            if let StoreEvent::DanglingOverrides { field_ids, .. } = event {
                self.dangling_overrides = field_ids.len();
            }
        }
        let row_count = store.row_ids().len();
        self.commit_log.extend(store.drain_commits());

        let parser = ColorParser::new();
        self.grid
            .sync(&effective, row_count, |s| parser.parse(s).ok());
        self.field_panel
            .set_entries(effective.iter().map(FieldEntry::from_column).collect());
    }

    /// A store write gated on read-only mode.
    fn guard_write(&mut self) -> bool {
        if self.read_only {
            self.status = Some("read-only".to_string());
            false
        } else {
            true
        }
    }

    fn apply_commit(&mut self, request: CommitRequest) {
        if self.read_only {
            return;
        }
        let Some(store) = self.store.as_mut() else {
            return;
        };
        let Some(column) = self.grid.column(request.coord.col).cloned() else {
            return;
        };
        let Some(row_id) = store.row_ids().get(request.coord.row).cloned() else {
            return;
        };
        let value = CellValue::parse(column.field_type, &request.value);
        store.update_cell_value(&row_id, &column.field_id, value);
        self.process_store();
    }

    fn begin_edit_active_cell(&mut self) {
        let Some(coord) = self.grid.selection.active_cell() else {
            return;
        };
        if self.read_only {
            self.status = Some("read-only".to_string());
            return;
        }
        let Some(column) = self.grid.column(coord.col).cloned() else {
            return;
        };
        let initial = self
            .store
            .as_ref()
            .and_then(|s| {
                let row_id = s.row_ids().get(coord.row)?;
                s.cell(row_id, &column.field_id).map(|c| c.value.display())
            })
            .unwrap_or_default();

        let mode = EditMode::for_field_type(column.field_type);
        if let Some(commit) = self.grid.selection.begin_edit(mode, initial.clone()) {
            self.apply_commit(commit);
            // The implicit commit may have re-shaped the grid; re-open on
            // the (possibly clamped) active cell
            self.grid.selection.begin_edit(mode, initial.clone());
        }
        match mode {
            EditMode::Inline => {
                self.inline_editor.set_value(initial);
                self.inline_editor.set_focused(true);
            }
            EditMode::Expanded => {
                self.expanded_editor.set_value(initial);
                self.expanded_editor.set_focused(true);
            }
        }
        self.input_mode = InputMode::EditingCell;
    }

    fn finish_edit(&mut self, commit: bool) {
        if commit {
            if let Some(request) = self.grid.selection.commit() {
                self.apply_commit(request);
            }
        } else {
            self.grid.selection.discard();
        }
        self.inline_editor.set_focused(false);
        self.expanded_editor.set_focused(false);
        self.input_mode = InputMode::Normal;
    }

    fn open_column_menu(&mut self) {
        let Some(coord) = self.grid.selection.active_cell() else {
            return;
        };
        let Some(column) = self.grid.column(coord.col).cloned() else {
            return;
        };
        let anchor = self
            .grid
            .cell_rect(CellCoord::new(coord.row, coord.col))
            .unwrap_or_default();
        self.column_menu.open(
            column.field_id.clone(),
            column.field_name.clone(),
            column.pin,
            column.visible,
            anchor,
        );
        self.input_mode = InputMode::ColumnMenu;
    }

    fn begin_rename(&mut self, field_id: FieldId, current_name: String, anchor: Rect) {
        self.rename_original = current_name.clone();
        self.rename_target = Some(field_id);
        self.rename_anchor = anchor;
        self.rename_input.set_value(current_name);
        self.rename_input.set_focused(true);
        self.rename_debounce.cancel();
        self.input_mode = InputMode::RenameColumn;
    }

    /// Debounced rename write: fires at most once per quiet period.
    fn apply_pending_rename(&mut self) {
        let Some(field_id) = self.rename_target.clone() else {
            return;
        };
        let name = self.rename_input.value().to_string();
        if name.trim().is_empty() {
            return;
        }
        if let Some(store) = self.store.as_mut() {
            store.rename_column(&field_id, name.trim());
        }
        self.process_store();
    }

    fn finish_rename(&mut self, commit: bool) {
        if commit {
            self.rename_debounce.flush();
            self.apply_pending_rename();
            let _ = self.rename_input.save_to_history(&self.cache);
        } else {
            self.rename_debounce.cancel();
            // A debounced write may already have landed; put the original
            // name back
            if let (Some(field_id), Some(store)) = (self.rename_target.clone(), self.store.as_mut())
            {
                store.rename_column(&field_id, &self.rename_original);
            }
            self.process_store();
        }
        self.rename_target = None;
        self.rename_input.set_focused(false);
        self.rename_input.clear();
        self.input_mode = InputMode::Normal;
    }

    fn begin_describe(&mut self, field_id: FieldId) {
        let current = self
            .store
            .as_ref()
            .and_then(|s| {
                s.meta_columns()
                    .iter()
                    .find(|c| c.field_id == field_id)
                    .and_then(|c| c.description.clone())
            })
            .unwrap_or_default();
        self.describe_target = Some(field_id);
        self.describe_editor.set_value(current);
        self.describe_editor.set_focused(true);
        self.input_mode = InputMode::DescribeColumn;
    }

    fn finish_describe(&mut self, commit: bool) {
        if commit {
            if let (Some(field_id), Some(store)) =
                (self.describe_target.clone(), self.store.as_mut())
            {
                store.update_column_description(&field_id, self.describe_editor.value());
            }
            self.process_store();
        }
        self.describe_target = None;
        self.describe_editor.set_focused(false);
        self.describe_editor.clear();
        self.input_mode = InputMode::Normal;
    }

    fn handle_menu_action(&mut self, action: MenuAction) {
        let field_id = self.column_menu.field_id.clone();
        let pinned = self.column_menu.pinned;
        let visible = self.column_menu.visible;
        let field_name = self.column_menu.field_name.clone();
        let anchor = self.column_menu.anchor;
        self.column_menu.close();
        self.input_mode = InputMode::Normal;

        if let Some(dialog_action) = action.dialog_action() {
            // Owned by the external actions drawer
            if let Some(store) = self.store.as_mut() {
                store.open_dialog(dialog_action);
            }
            self.process_store();
            return;
        }

        if !self.guard_write() {
            return;
        }
        match action {
            MenuAction::Rename => self.begin_rename(field_id, field_name, anchor),
            MenuAction::Describe => self.begin_describe(field_id),
            MenuAction::TogglePin => {
                if let Some(store) = self.store.as_mut() {
                    store.toggle_column_pin(&field_id, !pinned);
                }
                self.process_store();
            }
            MenuAction::ToggleVisibility => {
                if let Some(store) = self.store.as_mut() {
                    store.toggle_column_visibility(&field_id, !visible);
                }
                self.process_store();
            }
            MenuAction::Delete => {
                if let Some(store) = self.store.as_mut() {
                    store.delete_column(&field_id);
                }
                self.process_store();
            }
            MenuAction::RunEnrichment | MenuAction::ClearColumn => {}
        }
    }

    fn handle_field_panel_action(&mut self, action: FieldListAction) {
        match action {
            FieldListAction::None => {}
            FieldListAction::Close => {
                self.field_panel.close();
                self.search_debounce.cancel();
                self.input_mode = InputMode::Normal;
            }
            FieldListAction::SearchChanged => {
                self.search_debounce.schedule();
            }
            FieldListAction::Reorder(order) => {
                if self.guard_write() {
                    if let Some(store) = self.store.as_mut() {
                        store.reorder_columns(&order);
                    }
                    self.process_store();
                }
            }
            FieldListAction::TogglePin(field_id, pinned) => {
                if self.guard_write() {
                    if let Some(store) = self.store.as_mut() {
                        store.toggle_column_pin(&field_id, pinned);
                    }
                    self.process_store();
                }
            }
            FieldListAction::ToggleVisibility(field_id, visible) => {
                if self.guard_write() {
                    if let Some(store) = self.store.as_mut() {
                        store.toggle_column_visibility(&field_id, visible);
                    }
                    self.process_store();
                }
            }
        }
    }

    fn mouse(&mut self, event: &MouseEvent) -> Option<AppEvent> {
        if self.input_mode != InputMode::Normal && self.input_mode != InputMode::EditingCell {
            return None;
        }
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(coord) = self.grid.hit_test(event.column, event.row) else {
                    return None;
                };
                let shift = event.modifiers.contains(KeyModifiers::SHIFT);
                let now = Instant::now();
                let double_click_window =
                    Duration::from_millis(self.config.performance.double_click_ms);
                let is_double = self
                    .last_click
                    .map(|(c, at)| c == coord && now.duration_since(at) <= double_click_window)
                    .unwrap_or(false);
                self.last_click = Some((coord, now));

                if self.input_mode == InputMode::EditingCell {
                    // Click-away commits the open session
                    self.finish_edit(true);
                }
                if let Some(commit) = self.grid.selection.pointer_down(coord, shift) {
                    self.apply_commit(commit);
                }
                self.grid.ensure_visible(coord);
                if is_double && !shift {
                    self.begin_edit_active_cell();
                }
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(coord) = self.grid.hit_test(event.column, event.row) {
                    self.grid.selection.pointer_drag(coord);
                    self.grid.ensure_visible(coord);
                }
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.grid.selection.pointer_up();
                None
            }
            MouseEventKind::ScrollDown => {
                self.grid.scroll_rows(3);
                None
            }
            MouseEventKind::ScrollUp => {
                self.grid.scroll_rows(-3);
                None
            }
            MouseEventKind::ScrollRight => {
                self.grid.scroll_cols(4);
                None
            }
            MouseEventKind::ScrollLeft => {
                self.grid.scroll_cols(-4);
                None
            }
            _ => None,
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        if self.error_modal.active {
            match event.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.error_modal.hide();
                }
                _ => {}
            }
            return None;
        }

        match self.input_mode {
            InputMode::EditingCell => {
                self.key_editing_cell(event);
                return None;
            }
            InputMode::FieldPanel => {
                let action = self.field_panel.handle_key(event, Some(&self.cache));
                self.handle_field_panel_action(action);
                return None;
            }
            InputMode::ColumnMenu => {
                match self.column_menu.handle_key(event) {
                    MenuEvent::None => {}
                    MenuEvent::Close => {
                        self.column_menu.close();
                        self.input_mode = InputMode::Normal;
                    }
                    MenuEvent::Chosen(action) => self.handle_menu_action(action),
                }
                return None;
            }
            InputMode::RenameColumn => {
                match self.rename_input.handle_key(event, Some(&self.cache)) {
                    TextInputEvent::Submit => self.finish_rename(true),
                    TextInputEvent::Cancel => self.finish_rename(false),
                    TextInputEvent::Changed => self.rename_debounce.schedule(),
                    _ => {}
                }
                return None;
            }
            InputMode::DescribeColumn => {
                match self.describe_editor.handle_key(event) {
                    MultiLineEvent::Submit => self.finish_describe(true),
                    MultiLineEvent::Cancel => self.finish_describe(false),
                    _ => {}
                }
                return None;
            }
            InputMode::Normal => {}
        }

        self.key_normal(event)
    }

    fn key_editing_cell(&mut self, event: &KeyEvent) {
        let Some(mode) = self.grid.selection.edit_session().map(|(_, m, _)| m) else {
            self.input_mode = InputMode::Normal;
            return;
        };
        match mode {
            EditMode::Inline => match self.inline_editor.handle_key(event, None) {
                TextInputEvent::Submit => {
                    self.grid
                        .selection
                        .set_pending(self.inline_editor.value().to_string());
                    self.finish_edit(true);
                }
                TextInputEvent::Cancel => self.finish_edit(false),
                TextInputEvent::Changed => {
                    // Pending value tracks the editor; no store write happens
                    // until commit
                    self.grid
                        .selection
                        .set_pending(self.inline_editor.value().to_string());
                }
                _ => {}
            },
            EditMode::Expanded => match self.expanded_editor.handle_key(event) {
                MultiLineEvent::Submit => {
                    self.grid
                        .selection
                        .set_pending(self.expanded_editor.value().to_string());
                    self.finish_edit(true);
                }
                MultiLineEvent::Cancel => self.finish_edit(false),
                MultiLineEvent::Changed => {
                    self.grid
                        .selection
                        .set_pending(self.expanded_editor.value().to_string());
                }
                _ => {}
            },
        }
    }

    fn key_normal(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::Right, KeyCode::Char('l')];
        const LEFT_KEYS: [KeyCode; 2] = [KeyCode::Left, KeyCode::Char('h')];
        const DOWN_KEYS: [KeyCode; 2] = [KeyCode::Down, KeyCode::Char('j')];
        const UP_KEYS: [KeyCode; 2] = [KeyCode::Up, KeyCode::Char('k')];

        let rows = self.grid.row_count();
        let cols = self.grid.column_count();
        let shift = event.modifiers.contains(KeyModifiers::SHIFT);

        match event.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return Some(AppEvent::Exit),
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(AppEvent::Exit)
            }
            KeyCode::Esc => {
                let dialog_open = self
                    .store
                    .as_ref()
                    .map(|s| s.open_dialog_action().is_some())
                    .unwrap_or(false);
                if dialog_open {
                    if let Some(store) = self.store.as_mut() {
                        store.close_dialog();
                    }
                    self.process_store();
                } else {
                    self.grid.selection.reset();
                }
            }
            KeyCode::Enter => self.begin_edit_active_cell(),
            KeyCode::Char('F') => {
                self.field_panel.open();
                self.input_mode = InputMode::FieldPanel;
            }
            KeyCode::Char('m') => self.open_column_menu(),
            KeyCode::Char('p') => {
                if let Some(coord) = self.grid.selection.active_cell() {
                    if let Some(column) = self.grid.column(coord.col).cloned() {
                        if self.guard_write() {
                            if let Some(store) = self.store.as_mut() {
                                store.toggle_column_pin(&column.field_id, !column.pin);
                            }
                            self.process_store();
                        }
                    }
                }
            }
            KeyCode::Char('H') => {
                if let Some(coord) = self.grid.selection.active_cell() {
                    if let Some(column) = self.grid.column(coord.col).cloned() {
                        if self.guard_write() {
                            if let Some(store) = self.store.as_mut() {
                                store.toggle_column_visibility(&column.field_id, false);
                            }
                            self.process_store();
                        }
                    }
                }
            }
            KeyCode::Char('v') => {
                if let Some(store) = self.store.as_mut() {
                    let views = store.views();
                    if views.len() > 1 {
                        let current = store.active_view_id().to_string();
                        let idx = views.iter().position(|v| v.view_id == current).unwrap_or(0);
                        let next = views[(idx + 1) % views.len()].view_id.clone();
                        store.set_active_view(&next);
                    }
                }
                self.process_store();
            }
            KeyCode::Char('W') => {
                if self.guard_write() {
                    if let (Some(store), Some(path)) = (self.store.as_ref(), self.path.as_ref()) {
                        match save_table(store, path) {
                            Ok(()) => self.status = Some("table written".to_string()),
                            Err(e) => self.error_modal.show(format!("{:#}", e)),
                        }
                    }
                }
            }
            KeyCode::Char('N') => {
                self.grid.row_numbers = !self.grid.row_numbers;
            }
            KeyCode::Char('x') => {
                // Expanded row preview is display-local state; nothing is
                // written to the store
                if let Some(coord) = self.grid.selection.active_cell() {
                    self.grid.toggle_row_expand(coord.row);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.resize_active_column(2),
            KeyCode::Char('-') | KeyCode::Char('_') => self.resize_active_column(-2),
            KeyCode::PageDown => {
                let page = self.grid.page_rows() as isize;
                self.move_or_extend(page, 0, rows, cols, shift);
            }
            KeyCode::PageUp => {
                let page = self.grid.page_rows() as isize;
                self.move_or_extend(-page, 0, rows, cols, shift);
            }
            KeyCode::Home => self.move_or_extend(isize::MIN / 2, 0, rows, cols, shift),
            KeyCode::End => self.move_or_extend(isize::MAX / 2, 0, rows, cols, shift),
            code if RIGHT_KEYS.contains(&code) => self.move_or_extend(0, 1, rows, cols, shift),
            code if LEFT_KEYS.contains(&code) => self.move_or_extend(0, -1, rows, cols, shift),
            code if DOWN_KEYS.contains(&code) => self.move_or_extend(1, 0, rows, cols, shift),
            code if UP_KEYS.contains(&code) => self.move_or_extend(-1, 0, rows, cols, shift),
            _ => {}
        }
        None
    }

    fn move_or_extend(&mut self, d_row: isize, d_col: isize, rows: usize, cols: usize, shift: bool) {
        if rows == 0 || cols == 0 {
            return;
        }
        if shift {
            self.grid.selection.extend_active(d_row, d_col, rows, cols);
        } else if let Some(commit) = self.grid.selection.move_active(d_row, d_col, rows, cols) {
            self.apply_commit(commit);
        }
        if let Some(coord) = self.grid.selection.active_cell() {
            self.grid.ensure_visible(coord);
        }
    }

    fn resize_active_column(&mut self, delta: i32) {
        let Some(coord) = self.grid.selection.active_cell() else {
            return;
        };
        let Some(column) = self.grid.column(coord.col).cloned() else {
            return;
        };
        if !self.guard_write() {
            return;
        }
        let width = (column.width as i32 + delta)
            .clamp(
                self.config.display.min_column_width as i32,
                self.config.display.max_column_width as i32,
            ) as u16;
        if let Some(store) = self.store.as_mut() {
            store.resize_column(&column.field_id, width);
        }
        self.process_store();
    }

    fn debug_line(&self) -> String {
        let selection = match self.grid.selection.active_cell() {
            Some(coord) => format!("({},{})", coord.row, coord.col),
            None => "-".to_string(),
        };
        let debounce = match (self.rename_debounce.pending(), self.search_debounce.pending()) {
            (true, true) => " rename+search pending",
            (true, false) => " rename pending",
            (false, true) => " search pending",
            (false, false) => "",
        };
        format!(
            " rows {:?}/{} cols {:?} scroll ({},{}) sel {} dangling {} commits {}{}",
            self.grid.last_row_window,
            self.grid.row_count(),
            self.grid.last_col_window,
            self.grid.scroll_x,
            self.grid.scroll_y,
            selection,
            self.dangling_overrides,
            self.commit_log.len(),
            debounce,
        )
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layout = app_layout(area, self.field_panel.active, self.debug_enabled);

        match self.store.as_ref() {
            Some(store) => {
                Grid {
                    store,
                    ctx: &self.ctx,
                }
                .render(layout.grid, buf, &mut self.grid);
            }
            None => {
                Paragraph::new("No table loaded")
                    .style(Style::default().fg(self.ctx.dimmed))
                    .centered()
                    .render(layout.grid, buf);
            }
        }

        // Floating editors over the grid
        let session = self.grid.selection.edit_session().map(|(c, m, _)| (c, m));
        if let Some((coord, mode)) = session {
            match mode {
                EditMode::Inline => {
                    if let Some(rect) = self.grid.cell_rect(coord) {
                        Clear.render(rect, buf);
                        (&self.inline_editor).render(rect, buf);
                    }
                }
                EditMode::Expanded => {
                    if let Some(cell_rect) = self.grid.cell_rect(coord) {
                        let width = cell_rect.width.max(36).min(layout.grid.width);
                        let editor_rect =
                            anchor_editor_rect(cell_rect, layout.grid, width, 7);
                        Clear.render(editor_rect, buf);
                        let block = Block::default()
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(self.ctx.editing_outline));
                        let inner = block.inner(editor_rect);
                        block.render(editor_rect, buf);
                        (&self.expanded_editor).render(inner, buf);
                    }
                }
            }
        }

        if self.input_mode == InputMode::RenameColumn {
            let rect = if self.rename_anchor.width > 0 {
                Rect {
                    height: 1,
                    ..self.rename_anchor
                }
            } else {
                centered_rect_fixed(layout.grid, 30, 1)
            };
            Clear.render(rect, buf);
            (&self.rename_input).render(rect, buf);
        }

        if self.input_mode == InputMode::DescribeColumn {
            let rect = centered_rect_fixed(layout.grid, 56, 9);
            Clear.render(rect, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.ctx.modal_border_active))
                .title(" Description ");
            let inner = block.inner(rect);
            block.render(rect, buf);
            (&self.describe_editor).render(inner, buf);
        }

        if let Some(panel_area) = layout.field_panel {
            FieldListView { ctx: &self.ctx }.render(panel_area, buf, &mut self.field_panel);
        }

        if self.column_menu.active {
            let menu_rect = anchor_editor_rect(
                self.column_menu.anchor,
                layout.grid,
                26,
                self.column_menu.height(),
            );
            ColumnMenuView { ctx: &self.ctx }.render(menu_rect, buf, &mut self.column_menu);
        }

        // Control bar
        let row_count = self.store.as_ref().map(|s| s.row_ids().len());
        let controls = Controls {
            row_count,
            dimmed: self.input_mode != InputMode::Normal,
            read_only: self.read_only,
        };
        (&controls).render(layout.control_bar, buf);

        // Transient status (read-only notice, dialog seam, write result)
        // overlays the right end of the control bar
        if let Some(status) = &self.status {
            let text = format!(" {} ", status);
            let w = (text.chars().count() as u16).min(layout.control_bar.width);
            let line = Line::styled(text, Style::default().fg(self.ctx.secondary));
            buf.set_line(
                layout.control_bar.x + layout.control_bar.width.saturating_sub(w),
                layout.control_bar.y,
                &line,
                w,
            );
        }

        if let Some(debug_area) = layout.debug {
            let line = Line::styled(self.debug_line(), Style::default().fg(self.ctx.dimmed));
            buf.set_line(debug_area.x, debug_area.y, &line, debug_area.width);
        }

        if self.error_modal.active {
            let rect = centered_rect_fixed(area, 60, 7);
            Clear.render(rect, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.ctx.modal_border_error))
                .title(" Error ");
            let inner = block.inner(rect);
            block.render(rect, buf);
            Paragraph::new(self.error_modal.message.clone())
                .wrap(Wrap { trim: true })
                .render(inner, buf);
        }
    }
}
