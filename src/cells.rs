//! Cell values: the tagged value union, field types, and the per-type
//! conversion and validation functions.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Closed set of column types understood by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Email,
    Phone,
    Currency,
    Date,
    Url,
    ImageUrl,
    Checkbox,
    Select,
    AssignedTo,
    Paragraph,
}

impl FieldType {
    /// Parse a field type name from snapshot data. Unknown names fall back
    /// to Text so a newer snapshot still opens.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "text" => Self::Text,
            "number" => Self::Number,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "currency" => Self::Currency,
            "date" => Self::Date,
            "url" => Self::Url,
            "image-url" | "image_url" => Self::ImageUrl,
            "checkbox" => Self::Checkbox,
            "select" => Self::Select,
            "assigned-to" | "assigned_to" => Self::AssignedTo,
            "paragraph" => Self::Paragraph,
            _ => Self::Text,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Currency => "currency",
            Self::Date => "date",
            Self::Url => "url",
            Self::ImageUrl => "image-url",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::AssignedTo => "assigned-to",
            Self::Paragraph => "paragraph",
        }
    }

    /// Long free-text columns open in the expanded (floating) editor; the
    /// rest edit inline in the cell.
    pub fn uses_expanded_editor(&self) -> bool {
        matches!(self, Self::Paragraph)
    }
}

/// Enrichment confidence attached to a cell by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Backend validation verdict for a cell (e.g. email deliverability).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationStatus {
    Verified,
    PotentialIssue,
    NotValidated,
    NotFound,
}

/// A cell value, tagged by the representation it parsed into. Values that
/// fail their column's typed conversion stay as `Text` and render with a
/// warning decoration; they are never rejected or dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Currency(f64),
    Checkbox(bool),
    Date(NaiveDate),
}

impl CellValue {
    /// Convert raw input to the typed value for `field_type`. Input that
    /// does not convert is kept verbatim as `Text`.
    pub fn parse(field_type: FieldType, raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match field_type {
            FieldType::Number => trimmed
                .replace(',', "")
                .parse::<f64>()
                .map(Self::Number)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            FieldType::Currency => trimmed
                .trim_start_matches(['$', '€', '£'])
                .replace(',', "")
                .parse::<f64>()
                .map(Self::Currency)
                .unwrap_or_else(|_| Self::Text(raw.to_string())),
            FieldType::Checkbox => match trimmed.to_lowercase().as_str() {
                "true" | "yes" | "1" | "x" => Self::Checkbox(true),
                "false" | "no" | "0" | "" => Self::Checkbox(false),
                _ => Self::Text(raw.to_string()),
            },
            FieldType::Date => parse_date(trimmed)
                .map(Self::Date)
                .unwrap_or_else(|| Self::Text(raw.to_string())),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Display form, used both for rendering and to seed an editor.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
            Self::Currency(n) => format!("${}", format_number(*n)),
            Self::Checkbox(b) => if *b { "✓" } else { "" }.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://[^\s]+\.[^\s]+$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9 ().-]{7,20}$").unwrap())
}

/// Check whether a value satisfies its column's declared type. A `false`
/// result only adds a warning decoration; it never blocks selection or
/// editing of the cell.
pub fn validates_for(value: &CellValue, field_type: FieldType) -> bool {
    match (field_type, value) {
        (_, CellValue::Empty) => true,
        (FieldType::Number, CellValue::Number(_)) => true,
        (FieldType::Number, _) => false,
        (FieldType::Currency, CellValue::Currency(_)) => true,
        (FieldType::Currency, _) => false,
        (FieldType::Checkbox, CellValue::Checkbox(_)) => true,
        (FieldType::Checkbox, _) => false,
        (FieldType::Date, CellValue::Date(_)) => true,
        (FieldType::Date, _) => false,
        (FieldType::Email, CellValue::Text(s)) => email_re().is_match(s),
        (FieldType::Email, _) => false,
        (FieldType::Url | FieldType::ImageUrl, CellValue::Text(s)) => url_re().is_match(s),
        (FieldType::Url | FieldType::ImageUrl, _) => false,
        (FieldType::Phone, CellValue::Text(s)) => phone_re().is_match(s),
        (FieldType::Phone, _) => false,
        // Free-form types accept any textual value
        (
            FieldType::Text | FieldType::Select | FieldType::AssignedTo | FieldType::Paragraph,
            CellValue::Text(_),
        ) => true,
        _ => false,
    }
}

/// One cell of a row: the value plus enrichment metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub confidence: Option<Confidence>,
    pub validation: Option<ValidationStatus>,
    pub image_preview: Option<String>,
}

impl Cell {
    pub fn from_value(value: CellValue) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}
