//! Column metadata, per-view overrides, and the merge that produces the
//! effective column list used for rendering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cells::FieldType;

/// Stable identity of a field across renames and reorders.
pub type FieldId = String;

/// Table-wide, view-independent field metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub field_id: FieldId,
    pub field_name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub description: Option<String>,
    /// Links derived/AI columns to the column they were enriched from.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Base width in terminal cells; a view override may replace it.
    pub width: u16,
}

/// Per-view display override for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewColumnOverride {
    pub field_id: FieldId,
    #[serde(default)]
    pub pin: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub width: Option<u16>,
    #[serde(default)]
    pub color: Option<String>,
    pub sort: u32,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    General,
    Configured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub view_id: String,
    pub view_name: String,
    #[serde(default)]
    pub view_type: ViewType,
    /// Ordered override list. The store keeps this normalized: sorted by
    /// `sort`, pinned entries first, `sort` reindexed from 0.
    #[serde(default)]
    pub field_props: Vec<ViewColumnOverride>,
}

/// Column metadata merged with the active view's override. This is what the
/// grid actually renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveColumn {
    pub field_id: FieldId,
    pub field_name: String,
    pub field_type: FieldType,
    pub description: Option<String>,
    pub group_id: Option<String>,
    pub width: u16,
    pub pin: bool,
    pub visible: bool,
    pub color: Option<String>,
    pub sort: u32,
}

impl EffectiveColumn {
    fn from_metadata(column: &Column, sort: u32) -> Self {
        Self {
            field_id: column.field_id.clone(),
            field_name: column.field_name.clone(),
            field_type: column.field_type,
            description: column.description.clone(),
            group_id: column.group_id.clone(),
            width: column.width,
            pin: false,
            visible: true,
            color: None,
            sort,
        }
    }
}

/// Result of a merge: the effective columns plus any override entries that
/// referenced a field with no metadata column (dropped from the output).
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub columns: Vec<EffectiveColumn>,
    pub dropped: Vec<FieldId>,
}

/// Merge field metadata with the active view's overrides.
///
/// A view without overrides yields the metadata columns in their original
/// order. Otherwise overrides are walked in stored order; an override whose
/// `field_id` has no metadata column emits nothing and is reported in
/// `dropped`. Pure function of its three inputs, safe to memoize.
pub fn merge_columns(
    meta_columns: &[Column],
    views: &[View],
    active_view_id: &str,
) -> MergeOutcome {
    let overrides = views
        .iter()
        .find(|v| v.view_id == active_view_id)
        .map(|v| v.field_props.as_slice())
        .unwrap_or(&[]);

    if overrides.is_empty() {
        return MergeOutcome {
            columns: meta_columns
                .iter()
                .enumerate()
                .map(|(i, c)| EffectiveColumn::from_metadata(c, i as u32))
                .collect(),
            dropped: Vec::new(),
        };
    }

    let by_id: HashMap<&str, &Column> = meta_columns
        .iter()
        .map(|c| (c.field_id.as_str(), c))
        .collect();

    let mut columns = Vec::with_capacity(overrides.len());
    let mut dropped = Vec::new();

    for props in overrides {
        let Some(column) = by_id.get(props.field_id.as_str()) else {
            dropped.push(props.field_id.clone());
            continue;
        };
        columns.push(EffectiveColumn {
            field_id: column.field_id.clone(),
            field_name: column.field_name.clone(),
            field_type: column.field_type,
            description: column.description.clone(),
            group_id: column.group_id.clone(),
            width: props.width.unwrap_or(column.width),
            pin: props.pin,
            visible: props.visible,
            color: props.color.clone(),
            sort: props.sort,
        });
    }

    MergeOutcome { columns, dropped }
}

/// Restore the pinned-prefix invariant on an override list: stable sort by
/// `sort`, stable partition pinned entries to the front, reindex `sort`.
pub fn normalize_field_props(field_props: &mut Vec<ViewColumnOverride>) {
    field_props.sort_by_key(|p| p.sort);
    let (pinned, unpinned): (Vec<_>, Vec<_>) =
        field_props.drain(..).partition(|p| p.pin);
    field_props.extend(pinned);
    field_props.extend(unpinned);
    for (i, props) in field_props.iter_mut().enumerate() {
        props.sort = i as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn view(id: &str, field_props: Vec<ViewColumnOverride>) -> View {
        View {
            view_id: id.to_string(),
            view_name: id.to_string(),
            view_type: ViewType::General,
            field_props,
        }
    }

    #[test]
    fn test_no_overrides_keeps_metadata_order() {
        let meta = vec![column("a", 10), column("b", 12), column("c", 14)];
        let views = vec![view("v1", Vec::new())];
        let outcome = merge_columns(&meta, &views, "v1");
        let ids: Vec<&str> = outcome.columns.iter().map(|c| c.field_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_missing_view_falls_back_to_metadata() {
        let meta = vec![column("a", 10), column("b", 12)];
        let outcome = merge_columns(&meta, &[], "nope");
        assert_eq!(outcome.columns.len(), 2);
    }

    #[test]
    fn test_override_order_wins_and_unknown_ids_drop() {
        let meta = vec![column("a", 10), column("b", 12), column("c", 14)];
        let views = vec![view(
            "v1",
            vec![props("c", 0), props("a", 1), props("x", 2)],
        )];
        let outcome = merge_columns(&meta, &views, "v1");
        let ids: Vec<&str> = outcome.columns.iter().map(|c| c.field_id.as_str()).collect();
        assert_eq!(ids, ["c", "a"]);
        assert_eq!(outcome.dropped, vec!["x".to_string()]);
    }

    #[test]
    fn test_override_width_beats_metadata_width() {
        let meta = vec![column("a", 10)];
        let mut p = props("a", 0);
        p.width = Some(30);
        let views = vec![view("v1", vec![p])];
        let outcome = merge_columns(&meta, &views, "v1");
        assert_eq!(outcome.columns[0].width, 30);

        // Absent override width falls back to metadata width
        let views = vec![view("v1", vec![props("a", 0)])];
        let outcome = merge_columns(&meta, &views, "v1");
        assert_eq!(outcome.columns[0].width, 10);
    }

    #[test]
    fn test_normalize_moves_pinned_to_front() {
        let mut list = vec![props("a", 0), props("b", 1), props("c", 2)];
        list[2].pin = true;
        normalize_field_props(&mut list);
        let ids: Vec<&str> = list.iter().map(|p| p.field_id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        let sorts: Vec<u32> = list.iter().map(|p| p.sort).collect();
        assert_eq!(sorts, [0, 1, 2]);
    }

    #[test]
    fn test_normalize_is_stable_within_partitions() {
        let mut list = vec![props("a", 5), props("b", 5), props("c", 1)];
        normalize_field_props(&mut list);
        let ids: Vec<&str> = list.iter().map(|p| p.field_id.as_str()).collect();
        // c sorts first; a and b keep their relative order
        assert_eq!(ids, ["c", "a", "b"]);
    }
}
