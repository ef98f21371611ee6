//! Widget-annotation geometry and field binding
//!
//! The overlay layer projects page annotations into screen coordinates
//! and binds each one to a `FieldDefinition`, so an editing surface can
//! place interactive elements directly over the rendered page.

use crate::error::FormPdfError;
use crate::label::humanize_name;
use crate::pdfutil::{dict_name, field_name_of, inherited, number, on_state, resolve};
use lopdf::{Dictionary, Document, Object};
use serde::{Deserialize, Serialize};
use shared_types::{FieldAppearance, FieldDefinition, FieldKind};

/// Rectangle in PDF points, bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rectangle in viewport pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Coordinate transform of the page-rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub page_width: f64,
    pub page_height: f64,
    pub scale: f64,
}

impl ViewTransform {
    /// Map a PDF-space rect (bottom-left origin) into the surface's
    /// pixel rectangle (top-left origin).
    pub fn project(&self, rect: &Rect) -> PixelRect {
        PixelRect {
            x: rect.x * self.scale,
            y: (self.page_height - rect.y - rect.height) * self.scale,
            width: rect.width * self.scale,
            height: rect.height * self.scale,
        }
    }
}

/// One widget annotation read from a page's `/Annots` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetAnnotation {
    pub field_name: String,
    /// 1-based page number.
    pub page: u32,
    pub rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldKind>,
    /// Export value of this widget (radio group member state).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_value: Option<String>,
    /// Appearance state that turns the widget on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_value: Option<String>,
}

/// How the editing surface interacts with a bound widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "shape")]
pub enum InteractionShape {
    SingleLine,
    MultiLine,
    /// Boolean toggle using the field's configured on token.
    Toggle { on_value: String },
    /// Mutually-exclusive choice keyed by the widget's export value.
    Choice { export_value: String },
}

/// A widget bound to its field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayBinding {
    pub field_name: String,
    pub page: u32,
    pub rect: Rect,
    pub shape: InteractionShape,
    /// True when no extracted definition existed and one was
    /// synthesized to keep the overlay usable.
    pub synthetic: bool,
}

// Field flag bits (PDF 32000-1, table 226/228/230).
const FLAG_RADIO: i64 = 1 << 15;
const FLAG_PUSHBUTTON: i64 = 1 << 16;
const FLAG_MULTILINE: i64 = 1 << 12;

fn rect_from_array(doc: &Document, obj: &Object) -> Option<Rect> {
    let array = resolve(doc, obj).as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let x1 = number(resolve(doc, &array[0]))?;
    let y1 = number(resolve(doc, &array[1]))?;
    let x2 = number(resolve(doc, &array[2]))?;
    let y2 = number(resolve(doc, &array[3]))?;
    Some(Rect {
        x: x1.min(x2),
        y: y1.min(y2),
        width: (x2 - x1).abs(),
        height: (y2 - y1).abs(),
    })
}

/// Derive the concrete field kind for a widget from its (possibly
/// inherited) `/FT` and `/Ff` entries.
pub(crate) fn widget_kind(doc: &Document, dict: &Dictionary) -> Option<FieldKind> {
    let ft = inherited(doc, dict, b"FT")?;
    let ft = match ft {
        Object::Name(bytes) => bytes.as_slice(),
        _ => return None,
    };
    let flags = inherited(doc, dict, b"Ff")
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0);

    match ft {
        b"Btn" if flags & FLAG_PUSHBUTTON != 0 => None,
        b"Btn" if flags & FLAG_RADIO != 0 => Some(FieldKind::Radio),
        b"Btn" => Some(FieldKind::Checkbox),
        b"Ch" => Some(FieldKind::Select),
        b"Tx" if flags & FLAG_MULTILINE != 0 => Some(FieldKind::TextArea),
        b"Tx" => Some(FieldKind::Text),
        _ => None,
    }
}

/// Read every widget annotation in the document, page by page.
pub(crate) fn widgets_from_doc(doc: &Document) -> Vec<WidgetAnnotation> {
    let mut widgets = Vec::new();

    for (page_no, page_id) in doc.get_pages() {
        let page_dict = match doc.get_object(page_id).and_then(|o| o.as_dict()) {
            Ok(dict) => dict,
            Err(_) => continue,
        };
        let annots = match page_dict.get(b"Annots") {
            Ok(obj) => resolve(doc, obj),
            Err(_) => continue,
        };
        let annots = match annots.as_array() {
            Ok(array) => array,
            Err(_) => continue,
        };

        for annot in annots {
            let dict = match resolve(doc, annot).as_dict() {
                Ok(dict) => dict,
                Err(_) => continue,
            };
            if dict_name(doc, dict, b"Subtype") != Some(b"Widget".as_slice()) {
                continue;
            }
            let rect = match dict.get(b"Rect").ok().and_then(|r| rect_from_array(doc, r)) {
                Some(rect) => rect,
                None => continue,
            };
            let field_name = match field_name_of(doc, dict) {
                Some(name) => name,
                None => continue,
            };
            let on = on_state(doc, dict);
            widgets.push(WidgetAnnotation {
                field_name,
                page: page_no,
                rect,
                kind: widget_kind(doc, dict),
                export_value: on.clone(),
                on_value: on,
            });
        }
    }

    widgets
}

/// Read widget annotations from raw document bytes.
pub fn collect_widgets(bytes: &[u8]) -> Result<Vec<WidgetAnnotation>, FormPdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| FormPdfError::Parse(e.to_string()))?;
    Ok(widgets_from_doc(&doc))
}

fn shape_for(kind: FieldKind, widget: &WidgetAnnotation, field: &FieldDefinition) -> InteractionShape {
    match kind {
        FieldKind::TextArea => InteractionShape::MultiLine,
        FieldKind::Checkbox => {
            let on_value = field
                .appearance
                .as_ref()
                .and_then(|a| a.on_value.clone())
                .or_else(|| widget.on_value.clone())
                .unwrap_or_else(|| "Yes".to_string());
            InteractionShape::Toggle { on_value }
        }
        FieldKind::Radio => InteractionShape::Choice {
            export_value: widget
                .export_value
                .clone()
                .unwrap_or_else(|| "On".to_string()),
        },
        FieldKind::Text | FieldKind::Select | FieldKind::Date => InteractionShape::SingleLine,
    }
}

/// Bind each widget to its field definition by exact name.
///
/// Widgets whose name has no extracted definition get a synthetic one
/// appended to `fields`, so a partially-malformed document still edits.
pub fn bind_annotations(
    widgets: &[WidgetAnnotation],
    fields: &mut Vec<FieldDefinition>,
) -> Vec<OverlayBinding> {
    let mut bindings = Vec::with_capacity(widgets.len());

    for widget in widgets {
        let (kind, synthetic) = match fields.iter().find(|f| f.name == widget.field_name) {
            Some(field) => (field.kind, false),
            None => {
                let kind = widget.kind.unwrap_or(FieldKind::Text);
                let mut field = FieldDefinition::new(
                    widget.field_name.clone(),
                    kind,
                    humanize_name(&widget.field_name),
                );
                if widget.on_value.is_some() {
                    field.appearance = Some(FieldAppearance {
                        on_value: widget.on_value.clone(),
                        ..Default::default()
                    });
                }
                tracing::debug!(field = %widget.field_name, "synthesized definition for unbound widget");
                fields.push(field);
                (kind, true)
            }
        };

        let field = fields
            .iter()
            .find(|f| f.name == widget.field_name)
            .cloned()
            .unwrap_or_else(|| {
                FieldDefinition::new(widget.field_name.clone(), FieldKind::Text, "")
            });

        bindings.push(OverlayBinding {
            field_name: widget.field_name.clone(),
            page: widget.page,
            rect: widget.rect,
            shape: shape_for(kind, widget, &field),
            synthetic,
        });
    }

    bindings
}

/// Resolve a field key or display name back to its bound widget for
/// focus and a transient highlight.
pub fn jump_target<'a>(
    bindings: &'a [OverlayBinding],
    fields: &[FieldDefinition],
    query: &str,
) -> Option<&'a OverlayBinding> {
    if let Some(binding) = bindings.iter().find(|b| b.field_name == query) {
        return Some(binding);
    }
    let by_label = fields
        .iter()
        .find(|f| f.label.eq_ignore_ascii_case(query))
        .map(|f| f.name.clone())?;
    bindings.iter().find(|b| b.field_name == by_label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn projection_flips_vertical_axis() {
        let transform = ViewTransform {
            page_width: 612.0,
            page_height: 792.0,
            scale: 2.0,
        };
        let rect = Rect {
            x: 100.0,
            y: 700.0,
            width: 120.0,
            height: 20.0,
        };
        let px = transform.project(&rect);
        assert_eq!(px.x, 200.0);
        // Top of the field is 720pt from the bottom, so 72pt from the
        // top of a 792pt page.
        assert_eq!(px.y, 144.0);
        assert_eq!(px.width, 240.0);
        assert_eq!(px.height, 40.0);
    }

    fn widget(name: &str, kind: Option<FieldKind>) -> WidgetAnnotation {
        WidgetAnnotation {
            field_name: name.to_string(),
            page: 1,
            rect: Rect {
                x: 10.0,
                y: 10.0,
                width: 100.0,
                height: 20.0,
            },
            kind,
            export_value: None,
            on_value: None,
        }
    }

    #[test]
    fn binding_uses_extracted_definition() {
        let widgets = vec![widget("Surname", Some(FieldKind::Text))];
        let mut fields = vec![FieldDefinition::new(
            "Surname",
            FieldKind::TextArea,
            "Surname",
        )];
        let bindings = bind_annotations(&widgets, &mut fields);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].shape, InteractionShape::MultiLine);
        assert!(!bindings[0].synthetic);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn unbound_widget_gets_synthetic_definition() {
        let widgets = vec![widget("Orphan", Some(FieldKind::Checkbox))];
        let mut fields = Vec::new();
        let bindings = bind_annotations(&widgets, &mut fields);
        assert!(bindings[0].synthetic);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].kind, FieldKind::Checkbox);
        assert_eq!(
            bindings[0].shape,
            InteractionShape::Toggle {
                on_value: "Yes".to_string()
            }
        );
    }

    #[test]
    fn toggle_uses_configured_on_token() {
        let mut w = widget("Agree", Some(FieldKind::Checkbox));
        w.on_value = Some("1".to_string());
        let mut fields = Vec::new();
        let bindings = bind_annotations(&[w], &mut fields);
        assert_eq!(
            bindings[0].shape,
            InteractionShape::Toggle {
                on_value: "1".to_string()
            }
        );
    }

    #[test]
    fn jump_resolves_name_then_label() {
        let widgets = vec![widget("Surname_1", Some(FieldKind::Text))];
        let mut fields = vec![{
            let mut f = FieldDefinition::new("Surname_1", FieldKind::Text, "Family Name");
            f.value = "Okafor".to_string();
            f
        }];
        let bindings = bind_annotations(&widgets, &mut fields);

        assert!(jump_target(&bindings, &fields, "Surname_1").is_some());
        assert!(jump_target(&bindings, &fields, "family name").is_some());
        assert!(jump_target(&bindings, &fields, "missing").is_none());
    }
}
