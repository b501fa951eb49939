use crate::cells::FieldType;
use crate::config::Theme;
use ratatui::style::Color;

/// Snapshot of theme colors and display configuration for rendering.
/// Passed to widgets to avoid threading many individual parameters.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub dimmed: Color,
    pub background: Color,
    pub controls_bg: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_inverse: Color,
    pub modal_border: Color,
    pub modal_border_active: Color,
    pub modal_border_error: Color,

    pub table_header: Color,
    pub table_header_bg: Color,
    pub row_numbers: Color,
    pub column_separator: Color,
    pub pinned_divider: Color,
    pub selection_bg: Color,
    pub selection_border: Color,
    pub editing_outline: Color,

    pub confidence_low: Color,
    pub confidence_medium: Color,
    pub confidence_high: Color,
    pub validation_warning: Color,

    pub text_col: Color,
    pub number_col: Color,
    pub temporal_col: Color,
    pub bool_col: Color,
    pub link_col: Color,

    pub table_cell_padding: u16,
}

impl RenderContext {
    /// Build render context from app theme and config.
    /// This is a snapshot; changes to theme won't affect this instance.
    pub fn from_theme(theme: &Theme, table_cell_padding: u16) -> Self {
        Self {
            primary: theme.get("primary"),
            secondary: theme.get("secondary"),
            success: theme.get("success"),
            warning: theme.get("warning"),
            error: theme.get("error"),
            dimmed: theme.get("dimmed"),
            background: theme.get("background"),
            controls_bg: theme.get("controls_bg"),
            text_primary: theme.get("text_primary"),
            text_secondary: theme.get("text_secondary"),
            text_inverse: theme.get("text_inverse"),
            modal_border: theme.get("modal_border"),
            modal_border_active: theme.get("modal_border_active"),
            modal_border_error: theme.get("modal_border_error"),

            table_header: theme.get("table_header"),
            table_header_bg: theme.get("table_header_bg"),
            row_numbers: theme.get("row_numbers"),
            column_separator: theme.get("column_separator"),
            pinned_divider: theme.get("pinned_divider"),
            selection_bg: theme.get("selection_bg"),
            selection_border: theme.get("selection_border"),
            editing_outline: theme.get("editing_outline"),

            confidence_low: theme.get("confidence_low"),
            confidence_medium: theme.get("confidence_medium"),
            confidence_high: theme.get("confidence_high"),
            validation_warning: theme.get("validation_warning"),

            text_col: theme.get("text_col"),
            number_col: theme.get("number_col"),
            temporal_col: theme.get("temporal_col"),
            bool_col: theme.get("bool_col"),
            link_col: theme.get("link_col"),

            table_cell_padding,
        }
    }

    /// Value color for a column's declared type.
    pub fn field_type_color(&self, field_type: FieldType) -> Color {
        match field_type {
            FieldType::Number | FieldType::Currency => self.number_col,
            FieldType::Date => self.temporal_col,
            FieldType::Checkbox => self.bool_col,
            FieldType::Url | FieldType::ImageUrl | FieldType::Email => self.link_col,
            _ => self.text_col,
        }
    }
}
