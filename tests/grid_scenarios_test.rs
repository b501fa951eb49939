//! End-to-end walkthroughs of the grid's acceptance scenarios, driven
//! through the app's key handling the way a user would produce them.

mod common;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use leadgrid::cells::{CellValue, FieldType};
use leadgrid::columns::{merge_columns, Column, View, ViewColumnOverride, ViewType};
use leadgrid::pinned::sticky_lefts;
use leadgrid::{App, AppEvent, OpenOptions};
use std::sync::mpsc::channel;
use tempfile::TempDir;

fn column(id: &str, width: u16) -> Column {
    Column {
        field_id: id.to_string(),
        field_name: id.to_uppercase(),
        field_type: FieldType::Text,
        description: None,
        group_id: None,
        width,
    }
}

fn props(id: &str, sort: u32) -> ViewColumnOverride {
    ViewColumnOverride {
        field_id: id.to_string(),
        pin: false,
        visible: true,
        width: None,
        color: None,
        sort,
    }
}

#[test]
fn test_scenario_a_no_overrides_keeps_metadata_order() {
    let meta = vec![column("a", 10), column("b", 10), column("c", 10)];
    let views = vec![View {
        view_id: "v".to_string(),
        view_name: "v".to_string(),
        view_type: ViewType::General,
        field_props: Vec::new(),
    }];
    let outcome = merge_columns(&meta, &views, "v");
    let ids: Vec<&str> = outcome.columns.iter().map(|c| c.field_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[test]
fn test_scenario_b_override_order_with_unknown_id() {
    let meta = vec![column("a", 10), column("b", 10), column("c", 10)];
    let views = vec![View {
        view_id: "v".to_string(),
        view_name: "v".to_string(),
        view_type: ViewType::Configured,
        field_props: vec![props("c", 0), props("a", 1), props("x", 2)],
    }];
    let outcome = merge_columns(&meta, &views, "v");
    let ids: Vec<&str> = outcome.columns.iter().map(|c| c.field_id.as_str()).collect();
    assert_eq!(ids, ["c", "a"]);
    assert_eq!(outcome.dropped, ["x".to_string()]);
}

#[test]
fn test_scenario_c_sticky_offsets() {
    let meta = vec![column("a", 80), column("b", 120), column("c", 90)];
    let views = vec![View {
        view_id: "v".to_string(),
        view_name: "v".to_string(),
        view_type: ViewType::Configured,
        field_props: vec![
            ViewColumnOverride {
                pin: true,
                ..props("a", 0)
            },
            ViewColumnOverride {
                pin: true,
                ..props("b", 1)
            },
            props("c", 2),
        ],
    }];
    let outcome = merge_columns(&meta, &views, "v");
    assert_eq!(sticky_lefts(&outcome.columns), vec![Some(0), Some(80), None]);
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Open the sample table and move the active cell to (row=2, col="Notes").
fn app_on_notes_cell(dir: &TempDir) -> App {
    let (tx, _rx) = channel::<AppEvent>();
    let mut app = App::new(tx);
    let path = common::sample_table(dir);
    app.open(path, OpenOptions::new());
    assert!(app.store.is_some());

    // Down twice from idle lands on row 2; Right four times reaches the
    // Notes column (metadata order: name, domain, arr, email, notes)
    app.event(&key(KeyCode::Down));
    app.event(&key(KeyCode::Down));
    for _ in 0..4 {
        app.event(&key(KeyCode::Right));
    }
    let coord = app.grid.selection.active_cell().unwrap();
    assert_eq!((coord.row, coord.col), (2, 4));
    app
}

#[test]
fn test_scenario_d_escape_discards_edit() {
    let dir = TempDir::new().unwrap();
    let mut app = app_on_notes_cell(&dir);

    app.event(&key(KeyCode::Enter)); // open editor (paragraph: expanded)
    for c in "hello".chars() {
        app.event(&key(KeyCode::Char(c)));
    }
    app.event(&key(KeyCode::Esc));

    // No write happened: the cell is still absent and nothing was queued
    let store = app.store.as_ref().unwrap();
    assert!(store.cell("r3", "notes").is_none());
    assert!(app.drain_commit_log().is_empty());
    assert!(!app.grid.selection.is_editing());
}

#[test]
fn test_scenario_e_enter_commits_exactly_once() {
    let dir = TempDir::new().unwrap();
    let mut app = app_on_notes_cell(&dir);

    app.event(&key(KeyCode::Enter));
    for c in "hello".chars() {
        app.event(&key(KeyCode::Char(c)));
    }
    app.event(&key(KeyCode::Enter)); // commit

    let store = app.store.as_ref().unwrap();
    assert_eq!(
        store.cell("r3", "notes").unwrap().value,
        CellValue::Text("hello".to_string())
    );
    let commits = app.drain_commit_log();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].row_id, "r3");
    assert_eq!(commits[0].field_id, "notes");
    assert!(!app.grid.selection.is_editing());
}

#[test]
fn test_shift_enter_stays_in_expanded_editor() {
    let dir = TempDir::new().unwrap();
    let mut app = app_on_notes_cell(&dir);

    app.event(&key(KeyCode::Enter));
    app.event(&key(KeyCode::Char('a')));
    app.event(&AppEvent::Key(KeyEvent::new(
        KeyCode::Enter,
        KeyModifiers::SHIFT,
    )));
    app.event(&key(KeyCode::Char('b')));
    // Still editing after Shift+Enter
    assert!(app.grid.selection.is_editing());
    app.event(&key(KeyCode::Enter));

    let store = app.store.as_ref().unwrap();
    assert_eq!(
        store.cell("r3", "notes").unwrap().value,
        CellValue::Text("a\nb".to_string())
    );
}

#[test]
fn test_inline_edit_on_short_text_field() {
    let dir = TempDir::new().unwrap();
    let (tx, _rx) = channel::<AppEvent>();
    let mut app = App::new(tx);
    let path = common::sample_table(&dir);
    app.open(path, OpenOptions::new());

    // Activate (0, 0): the "Company" text column edits inline
    app.event(&key(KeyCode::Up));
    app.event(&key(KeyCode::Enter));
    let (_, mode, pending) = app.grid.selection.edit_session().unwrap();
    assert_eq!(mode, leadgrid::selection::EditMode::Inline);
    // The editor opens seeded with the current value
    assert_eq!(pending, "Acme");
}

#[test]
fn test_read_only_blocks_edits() {
    let dir = TempDir::new().unwrap();
    let (tx, _rx) = channel::<AppEvent>();
    let mut app = App::new(tx);
    let path = common::sample_table(&dir);
    let opts = OpenOptions {
        read_only: true,
        ..OpenOptions::new()
    };
    app.open(path, opts);

    app.event(&key(KeyCode::Up));
    app.event(&key(KeyCode::Enter));
    assert!(!app.grid.selection.is_editing());
}

#[test]
fn test_quit_key_emits_exit() {
    let dir = TempDir::new().unwrap();
    let (tx, _rx) = channel::<AppEvent>();
    let mut app = App::new(tx);
    let path = common::sample_table(&dir);
    app.open(path, OpenOptions::new());
    assert!(matches!(app.event(&key(KeyCode::Char('q'))), Some(AppEvent::Exit)));
}
