//! Static lookup from field type to header icon, and from cell state to the
//! prefix/suffix decorations drawn around a value.

use crate::cells::{validates_for, Cell, Confidence, FieldType, ValidationStatus};

/// Header glyph for a field type. Total over the closed enum; snapshot
/// parsing already collapses unknown type names to Text.
pub fn icon_for(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text => "≡",
        FieldType::Number => "#",
        FieldType::Email => "@",
        FieldType::Phone => "✆",
        FieldType::Currency => "$",
        FieldType::Date => "⏲",
        FieldType::Url => "⌁",
        FieldType::ImageUrl => "▣",
        FieldType::Checkbox => "☑",
        FieldType::Select => "◨",
        FieldType::AssignedTo => "♙",
        FieldType::Paragraph => "¶",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    /// Cell carries an image preview URL.
    ImagePreview,
    /// Enrichment confidence indicator.
    Confidence(Confidence),
    /// Value fails its column's declared type.
    TypeWarning,
    /// Backend flagged the value (deliverability, staleness, ...).
    ValidationFlag(ValidationStatus),
}

impl Decoration {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::ImagePreview => "▣",
            Self::Confidence(Confidence::Low) => "○",
            Self::Confidence(Confidence::Medium) => "◐",
            Self::Confidence(Confidence::High) => "●",
            Self::TypeWarning => "⚠",
            Self::ValidationFlag(ValidationStatus::PotentialIssue) => "!",
            Self::ValidationFlag(ValidationStatus::NotFound) => "∅",
            Self::ValidationFlag(_) => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decorations {
    pub prefix: Option<Decoration>,
    pub suffix: Option<Decoration>,
}

/// Compute the decorations for a cell.
///
/// Precedence: an image-preview prefix suppresses the confidence prefix; a
/// failed type validation always yields the warning suffix, ahead of any
/// backend validation flag.
pub fn decorations_for(cell: &Cell, field_type: FieldType) -> Decorations {
    let prefix = if cell.image_preview.is_some() {
        Some(Decoration::ImagePreview)
    } else {
        cell.confidence.map(Decoration::Confidence)
    };

    let suffix = if !validates_for(&cell.value, field_type) {
        Some(Decoration::TypeWarning)
    } else {
        match cell.validation {
            Some(s @ (ValidationStatus::PotentialIssue | ValidationStatus::NotFound)) => {
                Some(Decoration::ValidationFlag(s))
            }
            _ => None,
        }
    };

    Decorations { prefix, suffix }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::CellValue;

    #[test]
    fn test_image_preview_suppresses_confidence() {
        let cell = Cell {
            value: CellValue::Text("https://a.io/x.png".to_string()),
            confidence: Some(Confidence::High),
            validation: None,
            image_preview: Some("https://a.io/x.png".to_string()),
        };
        let d = decorations_for(&cell, FieldType::ImageUrl);
        assert_eq!(d.prefix, Some(Decoration::ImagePreview));
    }

    #[test]
    fn test_confidence_prefix_without_preview() {
        let cell = Cell {
            value: CellValue::Text("Acme".to_string()),
            confidence: Some(Confidence::Medium),
            validation: None,
            image_preview: None,
        };
        let d = decorations_for(&cell, FieldType::Text);
        assert_eq!(d.prefix, Some(Decoration::Confidence(Confidence::Medium)));
        assert_eq!(d.suffix, None);
    }

    #[test]
    fn test_type_warning_beats_validation_flag() {
        let cell = Cell {
            value: CellValue::Text("not-an-email".to_string()),
            confidence: None,
            validation: Some(ValidationStatus::PotentialIssue),
            image_preview: None,
        };
        let d = decorations_for(&cell, FieldType::Email);
        assert_eq!(d.suffix, Some(Decoration::TypeWarning));
    }

    #[test]
    fn test_type_warning_renders_alongside_preview_prefix() {
        let cell = Cell {
            value: CellValue::Text("ftp://weird".to_string()),
            confidence: Some(Confidence::Low),
            validation: None,
            image_preview: Some("ftp://weird".to_string()),
        };
        let d = decorations_for(&cell, FieldType::ImageUrl);
        assert_eq!(d.prefix, Some(Decoration::ImagePreview));
        assert_eq!(d.suffix, Some(Decoration::TypeWarning));
    }
}
