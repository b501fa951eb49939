//! Table snapshot files: the JSON form a table takes on disk. The snapshot
//! layer is the only place raw JSON values exist; everything past it works
//! with the typed cell model.

use std::collections::HashMap;
use std::path::Path;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cells::{Cell, CellValue, Confidence, FieldType, ValidationStatus};
use crate::columns::{Column, View};
use crate::store::{TableRow, TableStore};

/// On-disk column record. `field_type` stays a string here so an unknown
/// type name from a newer backend degrades to text instead of failing the
/// whole load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnSpec {
    field_id: String,
    field_name: String,
    #[serde(default)]
    field_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    group_id: Option<String>,
    #[serde(default)]
    width: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CellSpec {
    #[serde(default)]
    value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_preview: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RowSpec {
    row_id: String,
    #[serde(default)]
    cells: HashMap<String, CellSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableSnapshot {
    table_name: String,
    columns: Vec<ColumnSpec>,
    #[serde(default)]
    views: Vec<View>,
    #[serde(default)]
    active_view_id: String,
    #[serde(default)]
    rows: Vec<RowSpec>,
}

/// Default width for columns the snapshot stores none for.
pub const DEFAULT_COLUMN_WIDTH: u16 = 16;

/// Load a table snapshot into a store.
pub fn load_table(path: &Path, default_width: u16) -> Result<TableStore> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| eyre!("Failed to read table snapshot {}: {}", path.display(), e))?;
    let snapshot: TableSnapshot = serde_json::from_str(&content)
        .map_err(|e| eyre!("Failed to parse table snapshot {}: {}", path.display(), e))?;

    let columns: Vec<Column> = snapshot
        .columns
        .iter()
        .map(|spec| Column {
            field_id: spec.field_id.clone(),
            field_name: spec.field_name.clone(),
            field_type: spec
                .field_type
                .as_deref()
                .map(FieldType::from_name)
                .unwrap_or_default(),
            description: spec.description.clone(),
            group_id: spec.group_id.clone(),
            width: spec.width.filter(|w| *w > 0).unwrap_or(default_width),
        })
        .collect();

    let types: HashMap<String, FieldType> = columns
        .iter()
        .map(|c| (c.field_id.clone(), c.field_type))
        .collect();

    let mut store = TableStore::new(
        snapshot.table_name,
        columns,
        snapshot.views,
        snapshot.active_view_id,
    );

    let mut row_ids = Vec::with_capacity(snapshot.rows.len());
    let mut rows = Vec::with_capacity(snapshot.rows.len());
    for spec in snapshot.rows {
        let cells = spec
            .cells
            .into_iter()
            .map(|(field_id, cell)| {
                let field_type = types.get(field_id.as_str()).copied().unwrap_or_default();
                (field_id, cell_from_spec(cell, field_type))
            })
            .collect();
        row_ids.push(spec.row_id.clone());
        rows.push(TableRow {
            row_id: spec.row_id,
            cells,
        });
    }
    store.reset_rows(row_ids, rows);
    Ok(store)
}

/// Write the store back out in snapshot form.
pub fn save_table(store: &TableStore, path: &Path) -> Result<()> {
    let snapshot = TableSnapshot {
        table_name: store.table_name.clone(),
        columns: store
            .meta_columns()
            .iter()
            .map(|c| ColumnSpec {
                field_id: c.field_id.clone(),
                field_name: c.field_name.clone(),
                field_type: Some(c.field_type.name().to_string()),
                description: c.description.clone(),
                group_id: c.group_id.clone(),
                width: Some(c.width),
            })
            .collect(),
        views: store.views().to_vec(),
        active_view_id: store.active_view_id().to_string(),
        rows: store
            .row_ids()
            .iter()
            .filter_map(|id| store.row(id))
            .map(|row| RowSpec {
                row_id: row.row_id.clone(),
                cells: row
                    .cells
                    .iter()
                    .map(|(field_id, cell)| (field_id.clone(), cell_to_spec(cell)))
                    .collect(),
            })
            .collect(),
    };
    let content = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, content)
        .map_err(|e| eyre!("Failed to write table snapshot {}: {}", path.display(), e))?;
    Ok(())
}

fn cell_from_spec(spec: CellSpec, field_type: FieldType) -> Cell {
    let value = match spec.value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Checkbox(b),
        Value::Number(n) => {
            let n = n.as_f64().unwrap_or(0.0);
            if field_type == FieldType::Currency {
                CellValue::Currency(n)
            } else {
                CellValue::Number(n)
            }
        }
        Value::String(s) => CellValue::parse(field_type, &s),
        // Arrays/objects are not part of the cell model; keep them visible
        // as their JSON text rather than dropping data.
        other => CellValue::Text(other.to_string()),
    };
    Cell {
        value,
        confidence: spec.confidence,
        validation: spec.validation,
        image_preview: spec.image_preview,
    }
}

fn cell_to_spec(cell: &Cell) -> CellSpec {
    let value = match &cell.value {
        CellValue::Empty => Value::Null,
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Number(n) | CellValue::Currency(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CellValue::Checkbox(b) => Value::Bool(*b),
        CellValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
    };
    CellSpec {
        value,
        confidence: cell.confidence,
        validation: cell.validation,
        image_preview: cell.image_preview.clone(),
    }
}
