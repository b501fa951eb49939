//! The table store: single mutable source of truth for columns, views, and
//! rows. Every mutation goes through an action here; interested parties
//! drain the event queue instead of watching fields.

use std::collections::{HashMap, VecDeque};

use crate::cells::{Cell, CellValue};
use crate::columns::{
    merge_columns, normalize_field_props, Column, EffectiveColumn, FieldId, View,
    ViewColumnOverride,
};

pub type RowId = String;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    pub row_id: RowId,
    pub cells: HashMap<FieldId, Cell>,
}

/// Change notifications, drained by the app after each action batch.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ColumnsChanged,
    ViewChanged,
    RowsReset,
    CellUpdated { row_id: RowId, field_id: FieldId },
    /// A merge dropped overrides whose field no longer exists. Informational;
    /// the effective list simply omits them.
    DanglingOverrides { view_id: String, field_ids: Vec<FieldId> },
    DialogOpened(String),
    DialogClosed,
}

/// An optimistic cell write queued for the backend request layer. The grid
/// does not await or retry these; a rejected commit is surfaced by the
/// notification subsystem, and `prior` gives it enough to offer an undo.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub row_id: RowId,
    pub field_id: FieldId,
    pub value: CellValue,
    pub prior: CellValue,
}

#[derive(Debug, Default)]
pub struct TableStore {
    pub table_name: String,
    meta_columns: Vec<Column>,
    views: Vec<View>,
    active_view_id: String,
    row_ids: Vec<RowId>,
    rows: HashMap<RowId, TableRow>,
    /// Bumped on any change that can affect the effective column list.
    revision: u64,
    effective_cache: Option<(u64, Vec<EffectiveColumn>)>,
    events: VecDeque<StoreEvent>,
    outbox: VecDeque<PendingCommit>,
    open_dialog: Option<String>,
}

impl TableStore {
    pub fn new(
        table_name: String,
        meta_columns: Vec<Column>,
        mut views: Vec<View>,
        active_view_id: String,
    ) -> Self {
        for view in &mut views {
            if !view.field_props.is_empty() {
                normalize_field_props(&mut view.field_props);
            }
        }
        let active_view_id = if views.iter().any(|v| v.view_id == active_view_id) {
            active_view_id
        } else {
            views
                .first()
                .map(|v| v.view_id.clone())
                .unwrap_or_default()
        };
        Self {
            table_name,
            meta_columns,
            views,
            active_view_id,
            ..Default::default()
        }
    }

    // --- reads ---

    pub fn meta_columns(&self) -> &[Column] {
        &self.meta_columns
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn active_view_id(&self) -> &str {
        &self.active_view_id
    }

    pub fn active_view(&self) -> Option<&View> {
        self.views.iter().find(|v| v.view_id == self.active_view_id)
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn row(&self, row_id: &str) -> Option<&TableRow> {
        self.rows.get(row_id)
    }

    pub fn cell(&self, row_id: &str, field_id: &str) -> Option<&Cell> {
        self.rows.get(row_id).and_then(|r| r.cells.get(field_id))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn open_dialog_action(&self) -> Option<&str> {
        self.open_dialog.as_deref()
    }

    /// Effective columns for the active view, memoized on the revision.
    pub fn effective_columns(&mut self) -> &[EffectiveColumn] {
        let stale = match &self.effective_cache {
            Some((rev, _)) => *rev != self.revision,
            None => true,
        };
        if stale {
            let outcome = merge_columns(&self.meta_columns, &self.views, &self.active_view_id);
            if !outcome.dropped.is_empty() {
                self.events.push_back(StoreEvent::DanglingOverrides {
                    view_id: self.active_view_id.clone(),
                    field_ids: outcome.dropped,
                });
            }
            self.effective_cache = Some((self.revision, outcome.columns));
        }
        match &self.effective_cache {
            Some((_, columns)) => columns,
            None => &[],
        }
    }

    // --- row lifecycle ---

    /// Replace the row set. Resets ephemeral grid state downstream
    /// (selection, edit session) via the RowsReset event.
    pub fn reset_rows(&mut self, row_ids: Vec<RowId>, rows: Vec<TableRow>) {
        self.row_ids = row_ids;
        self.rows = rows.into_iter().map(|r| (r.row_id.clone(), r)).collect();
        self.events.push_back(StoreEvent::RowsReset);
    }

    // --- column actions ---

    pub fn rename_column(&mut self, field_id: &str, name: &str) {
        if let Some(column) = self.column_mut(field_id) {
            column.field_name = name.to_string();
            self.touch(StoreEvent::ColumnsChanged);
        }
    }

    pub fn update_column_description(&mut self, field_id: &str, text: &str) {
        if let Some(column) = self.column_mut(field_id) {
            column.description = if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            };
            self.touch(StoreEvent::ColumnsChanged);
        }
    }

    /// Delete the metadata column and its cells. Overrides referencing the
    /// field are left in place in every view; the merge drops them and
    /// reports them as dangling (see DESIGN.md on this deliberate gap).
    pub fn delete_column(&mut self, field_id: &str) {
        let before = self.meta_columns.len();
        self.meta_columns.retain(|c| c.field_id != field_id);
        if self.meta_columns.len() == before {
            return;
        }
        for row in self.rows.values_mut() {
            row.cells.remove(field_id);
        }
        self.touch(StoreEvent::ColumnsChanged);
    }

    /// Apply a full reordered id list (from the reorder controller). With
    /// overrides present the view order changes; a view without overrides
    /// reorders the metadata itself.
    pub fn reorder_columns(&mut self, order: &[FieldId]) {
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let has_overrides = self
            .active_view()
            .map(|v| !v.field_props.is_empty())
            .unwrap_or(false);
        if has_overrides {
            let active_id = self.active_view_id.clone();
            if let Some(view) = self.views.iter_mut().find(|v| v.view_id == active_id) {
                for props in view.field_props.iter_mut() {
                    if let Some(&pos) = position.get(props.field_id.as_str()) {
                        props.sort = pos as u32;
                    }
                }
                normalize_field_props(&mut view.field_props);
            }
            self.touch(StoreEvent::ViewChanged);
        } else {
            self.meta_columns.sort_by_key(|c| {
                position
                    .get(c.field_id.as_str())
                    .copied()
                    .unwrap_or(usize::MAX)
            });
            self.touch(StoreEvent::ColumnsChanged);
        }
    }

    pub fn toggle_column_visibility(&mut self, field_id: &str, visible: bool) {
        self.with_override(field_id, |props| props.visible = visible);
    }

    /// Pin or unpin a column. Normalization moves it to the pinned/unpinned
    /// boundary so pinned columns stay a contiguous prefix.
    pub fn toggle_column_pin(&mut self, field_id: &str, pinned: bool) {
        self.with_override(field_id, |props| props.pin = pinned);
    }

    pub fn resize_column(&mut self, field_id: &str, width: u16) {
        self.with_override(field_id, |props| props.width = Some(width.max(1)));
    }

    // --- cell actions ---

    /// Optimistic cell write: the store value changes immediately and a
    /// commit record is queued for the request layer. Exactly one record
    /// per call.
    pub fn update_cell_value(&mut self, row_id: &str, field_id: &str, value: CellValue) {
        let Some(row) = self.rows.get_mut(row_id) else {
            return;
        };
        let cell = row.cells.entry(field_id.to_string()).or_default();
        let prior = std::mem::replace(&mut cell.value, value.clone());
        self.outbox.push_back(PendingCommit {
            row_id: row_id.to_string(),
            field_id: field_id.to_string(),
            value,
            prior,
        });
        self.events.push_back(StoreEvent::CellUpdated {
            row_id: row_id.to_string(),
            field_id: field_id.to_string(),
        });
    }

    // --- view actions ---

    pub fn set_active_view(&mut self, view_id: &str) {
        if self.views.iter().any(|v| v.view_id == view_id) && self.active_view_id != view_id {
            self.active_view_id = view_id.to_string();
            self.touch(StoreEvent::ViewChanged);
        }
    }

    pub fn set_active_view_by_name(&mut self, name: &str) -> bool {
        match self.views.iter().find(|v| v.view_name == name) {
            Some(view) => {
                let id = view.view_id.clone();
                self.set_active_view(&id);
                true
            }
            None => false,
        }
    }

    // --- dialog seam (owned by the excluded dialog subsystem) ---

    pub fn open_dialog(&mut self, action: &str) {
        self.open_dialog = Some(action.to_string());
        self.events.push_back(StoreEvent::DialogOpened(action.to_string()));
    }

    pub fn close_dialog(&mut self) {
        if self.open_dialog.take().is_some() {
            self.events.push_back(StoreEvent::DialogClosed);
        }
    }

    // --- queues ---

    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        self.events.drain(..).collect()
    }

    pub fn drain_commits(&mut self) -> Vec<PendingCommit> {
        self.outbox.drain(..).collect()
    }

    pub fn has_pending_commits(&self) -> bool {
        !self.outbox.is_empty()
    }

    // --- internals ---

    fn column_mut(&mut self, field_id: &str) -> Option<&mut Column> {
        self.meta_columns.iter_mut().find(|c| c.field_id == field_id)
    }

    fn touch(&mut self, event: StoreEvent) {
        self.revision += 1;
        self.events.push_back(event);
    }

    /// Run `apply` on the active view's override for `field_id`,
    /// materializing overrides from the current effective order first when
    /// the view has none yet.
    fn with_override<F: FnOnce(&mut ViewColumnOverride)>(&mut self, field_id: &str, apply: F) {
        if !self.meta_columns.iter().any(|c| c.field_id == field_id) {
            return;
        }
        let active_id = self.active_view_id.clone();
        let meta_order: Vec<FieldId> = self
            .meta_columns
            .iter()
            .map(|c| c.field_id.clone())
            .collect();
        let Some(view) = self.views.iter_mut().find(|v| v.view_id == active_id) else {
            return;
        };
        if view.field_props.is_empty() {
            view.field_props = meta_order
                .iter()
                .enumerate()
                .map(|(i, id)| ViewColumnOverride {
                    field_id: id.clone(),
                    pin: false,
                    visible: true,
                    width: None,
                    color: None,
                    sort: i as u32,
                })
                .collect();
        }
        if let Some(props) = view
            .field_props
            .iter_mut()
            .find(|p| p.field_id == field_id)
        {
            apply(props);
        }
        normalize_field_props(&mut view.field_props);
        self.touch(StoreEvent::ViewChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::FieldType;

    fn column(id: &str) -> Column {
        Column {
            field_id: id.to_string(),
            field_name: id.to_uppercase(),
            field_type: FieldType::Text,
            description: None,
            group_id: None,
            width: 12,
        }
    }

    fn store() -> TableStore {
        let views = vec![View {
            view_id: "v1".to_string(),
            view_name: "Default".to_string(),
            view_type: Default::default(),
            field_props: Vec::new(),
        }];
        let mut store = TableStore::new(
            "accounts".to_string(),
            vec![column("a"), column("b"), column("c")],
            views,
            "v1".to_string(),
        );
        let rows = vec![TableRow {
            row_id: "r1".to_string(),
            cells: HashMap::new(),
        }];
        store.reset_rows(vec!["r1".to_string()], rows);
        store.drain_events();
        store
    }

    #[test]
    fn test_cell_update_round_trips_and_queues_one_commit() {
        let mut s = store();
        s.update_cell_value("r1", "a", CellValue::Text("hello".to_string()));
        // Committed value reads back immediately (optimistic)
        assert_eq!(
            s.cell("r1", "a").unwrap().value,
            CellValue::Text("hello".to_string())
        );
        let commits = s.drain_commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].prior, CellValue::Empty);
        assert!(!s.has_pending_commits());
    }

    #[test]
    fn test_pin_toggle_keeps_contiguous_prefix() {
        let mut s = store();
        s.toggle_column_pin("c", true);
        let ids: Vec<&str> = s
            .effective_columns()
            .iter()
            .map(|c| c.field_id.as_str())
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
        s.toggle_column_pin("b", true);
        let pins: Vec<bool> = s.effective_columns().iter().map(|c| c.pin).collect();
        assert_eq!(pins, [true, true, false]);
    }

    #[test]
    fn test_effective_columns_memoized_until_mutation() {
        let mut s = store();
        let rev = s.revision();
        s.effective_columns();
        s.effective_columns();
        assert_eq!(s.revision(), rev);
        s.rename_column("a", "Account");
        assert_ne!(s.revision(), rev);
        assert_eq!(s.effective_columns()[0].field_name, "Account");
    }

    #[test]
    fn test_delete_leaves_dangling_overrides_reported() {
        let mut s = store();
        s.toggle_column_pin("c", true); // materializes overrides
        s.delete_column("c");
        let ids: Vec<&str> = s
            .effective_columns()
            .iter()
            .map(|c| c.field_id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b"]);
        let events = s.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            StoreEvent::DanglingOverrides { field_ids, .. } if field_ids == &vec!["c".to_string()]
        )));
    }

    #[test]
    fn test_reorder_without_overrides_moves_metadata() {
        let mut s = store();
        s.reorder_columns(&["b".to_string(), "c".to_string(), "a".to_string()]);
        let ids: Vec<&str> = s.meta_columns().iter().map(|c| c.field_id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn test_reorder_with_overrides_moves_view_order() {
        let mut s = store();
        s.toggle_column_visibility("a", true); // materializes overrides
        s.reorder_columns(&["c".to_string(), "a".to_string(), "b".to_string()]);
        let ids: Vec<&str> = s
            .effective_columns()
            .iter()
            .map(|c| c.field_id.as_str())
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
        // Metadata order is untouched
        let meta: Vec<&str> = s.meta_columns().iter().map(|c| c.field_id.as_str()).collect();
        assert_eq!(meta, ["a", "b", "c"]);
    }

    #[test]
    fn test_dialog_seam() {
        let mut s = store();
        s.open_dialog("run-enrichment");
        assert_eq!(s.open_dialog_action(), Some("run-enrichment"));
        s.close_dialog();
        assert_eq!(s.open_dialog_action(), None);
        let events = s.drain_events();
        assert_eq!(
            events,
            vec![
                StoreEvent::DialogOpened("run-enrichment".to_string()),
                StoreEvent::DialogClosed
            ]
        );
    }

    #[test]
    fn test_resize_floor_is_one_cell() {
        let mut s = store();
        s.resize_column("a", 0);
        assert_eq!(s.effective_columns()[0].width, 1);
    }
}
