mod common;

use leadgrid::cells::{CellValue, Confidence, FieldType, ValidationStatus};
use leadgrid::snapshot::{load_table, save_table, DEFAULT_COLUMN_WIDTH};
use tempfile::TempDir;

#[test]
fn test_load_columns_views_rows() {
    let dir = TempDir::new().unwrap();
    let path = common::sample_table(&dir);
    let store = load_table(&path, DEFAULT_COLUMN_WIDTH).unwrap();

    assert_eq!(store.table_name, "Accounts");
    assert_eq!(store.meta_columns().len(), 5);
    assert_eq!(store.views().len(), 2);
    assert_eq!(store.active_view_id(), "v-general");
    assert_eq!(store.row_ids().len(), 4);

    let notes = store
        .meta_columns()
        .iter()
        .find(|c| c.field_id == "notes")
        .unwrap();
    assert_eq!(notes.field_type, FieldType::Paragraph);
}

#[test]
fn test_cell_values_convert_by_declared_type() {
    let dir = TempDir::new().unwrap();
    let path = common::sample_table(&dir);
    let store = load_table(&path, DEFAULT_COLUMN_WIDTH).unwrap();

    // Numeric JSON under a currency column becomes a currency value
    assert_eq!(
        store.cell("r1", "arr").unwrap().value,
        CellValue::Currency(125000.0)
    );
    // A string that fails its type stays text (renders with a warning)
    assert_eq!(
        store.cell("r2", "arr").unwrap().value,
        CellValue::Text("pending".to_string())
    );
    // Enrichment metadata survives
    let email = store.cell("r1", "email").unwrap();
    assert_eq!(email.confidence, Some(Confidence::High));
    assert_eq!(email.validation, Some(ValidationStatus::Verified));
    assert!(store.cell("r3", "name").unwrap().image_preview.is_some());
    // Paragraph keeps its embedded newline
    assert_eq!(
        store.cell("r1", "notes").unwrap().value,
        CellValue::Text("Spoke at the expo.\nFollow up in Q3.".to_string())
    );
    // Absent cells are simply absent
    assert!(store.cell("r4", "name").is_none());
}

#[test]
fn test_save_and_reload_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = common::sample_table(&dir);
    let mut store = load_table(&path, DEFAULT_COLUMN_WIDTH).unwrap();

    store.update_cell_value("r4", "name", CellValue::Text("Umbrella".to_string()));
    store.toggle_column_pin("arr", true);

    let out = dir.path().join("saved.table.json");
    save_table(&store, &out).unwrap();
    let mut reloaded = load_table(&out, DEFAULT_COLUMN_WIDTH).unwrap();

    assert_eq!(
        reloaded.cell("r4", "name").unwrap().value,
        CellValue::Text("Umbrella".to_string())
    );
    // The pin landed in the active view's overrides and survived the save
    let effective = reloaded.effective_columns();
    assert!(effective[0].pin);
    assert_eq!(effective[0].field_id, "arr");
    // Row order preserved
    assert_eq!(reloaded.row_ids(), store.row_ids());
}
