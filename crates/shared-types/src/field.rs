//! Field definitions extracted from a fillable document

use serde::{Deserialize, Serialize};

/// Concrete interaction type of a form field.
///
/// Derived from the AcroForm subtype at extraction time and matched
/// exhaustively by the autofill engine, validator and overlay layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    #[serde(rename = "textarea")]
    TextArea,
    Checkbox,
    Radio,
    Select,
    Date,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::TextArea => write!(f, "textarea"),
            FieldKind::Checkbox => write!(f, "checkbox"),
            FieldKind::Radio => write!(f, "radio"),
            FieldKind::Select => write!(f, "select"),
            FieldKind::Date => write!(f, "date"),
        }
    }
}

/// Where a field's current value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    Profile,
    Manual,
    Suggested,
    #[default]
    None,
}

/// Appearance attributes captured from the field's default-appearance
/// string (`/FontName size Tf`) plus the checkbox "on" state token.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAppearance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// Appearance state that checks a checkbox (anything but `/Off`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_value: Option<String>,
}

/// One interactive field of the active document session.
///
/// `name` is unique within a document. Booleans and selections are
/// encoded as strings so the wire format stays uniform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<FieldAppearance>,
    #[serde(default)]
    pub source: FieldSource,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: String::new(),
            label: label.into(),
            options: Vec::new(),
            appearance: None,
            source: FieldSource::None,
        }
    }

    /// True when the field holds a non-whitespace value.
    pub fn is_filled(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FieldKind::TextArea).unwrap(),
            "\"textarea\""
        );
        assert_eq!(
            serde_json::to_string(&FieldKind::Checkbox).unwrap(),
            "\"checkbox\""
        );
    }

    #[test]
    fn field_definition_round_trips() {
        let mut field = FieldDefinition::new("Surname", FieldKind::Text, "Surname");
        field.value = "Okafor".to_string();
        field.source = FieldSource::Manual;

        let json = serde_json::to_string(&field).unwrap();
        let back: FieldDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(field, back);
    }

    #[test]
    fn whitespace_only_value_counts_as_empty() {
        let mut field = FieldDefinition::new("Notes", FieldKind::TextArea, "Notes");
        field.value = "   ".to_string();
        assert!(!field.is_filled());
        field.value = " x ".to_string();
        assert!(field.is_filled());
    }
}
