//! Document synthesis: write field values back into the AcroForm
//!
//! Every `FieldDefinition` value is written into its interactive field,
//! then `/NeedAppearances` is set so viewers regenerate appearance
//! streams and rendered text reflects the new values.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::FormPdfError;
use crate::pdfutil::{dict_text, kid_ids, on_state, resolve};
use shared_types::{FieldDefinition, FieldKind};

struct FillTarget {
    id: ObjectId,
    /// Widget kids with their on states, for button state updates.
    kids: Vec<(ObjectId, Option<String>)>,
    on_value: Option<String>,
}

fn collect_targets(doc: &Document, id: ObjectId, out: &mut HashMap<String, FillTarget>) {
    let dict = match doc.get_object(id).and_then(|o| o.as_dict()) {
        Ok(dict) => dict,
        Err(_) => return,
    };

    let kids = kid_ids(doc, dict);
    let named_kids: Vec<ObjectId> = kids
        .iter()
        .copied()
        .filter(|kid_id| {
            doc.get_object(*kid_id)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .map(|kid| kid.has(b"T"))
                .unwrap_or(false)
        })
        .collect();

    if !named_kids.is_empty() {
        for kid_id in named_kids {
            collect_targets(doc, kid_id, out);
        }
        return;
    }

    let Some(name) = dict_text(doc, dict, b"T") else {
        return;
    };
    let kid_states = kids
        .iter()
        .map(|kid_id| {
            let state = doc
                .get_object(*kid_id)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .and_then(|kid| on_state(doc, kid));
            (*kid_id, state)
        })
        .collect();
    out.entry(name).or_insert(FillTarget {
        id,
        kids: kid_states,
        on_value: on_state(doc, dict),
    });
}

fn set_on_dict(doc: &mut Document, id: ObjectId, apply: impl FnOnce(&mut Dictionary)) {
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(id) {
        apply(dict);
    }
}

fn write_button(doc: &mut Document, target: &FillTarget, field: &FieldDefinition) {
    let configured_on = field
        .appearance
        .as_ref()
        .and_then(|a| a.on_value.clone())
        .or_else(|| target.on_value.clone())
        .unwrap_or_else(|| "Yes".to_string());

    let state = match field.kind {
        FieldKind::Checkbox => {
            let checked = field.is_filled() && field.value != "Off";
            if checked {
                configured_on
            } else {
                "Off".to_string()
            }
        }
        // Radio: the value is the selected export state.
        _ => {
            if field.is_filled() {
                field.value.clone()
            } else {
                "Off".to_string()
            }
        }
    };

    set_on_dict(doc, target.id, |dict| {
        dict.set("V", Object::Name(state.clone().into_bytes()));
        dict.set("AS", Object::Name(state.clone().into_bytes()));
    });
    for (kid_id, kid_state) in &target.kids {
        let selected = kid_state.as_deref() == Some(state.as_str());
        let as_value = if selected {
            state.clone()
        } else {
            "Off".to_string()
        };
        set_on_dict(doc, *kid_id, |dict| {
            dict.set("AS", Object::Name(as_value.into_bytes()));
        });
    }
}

fn write_text(doc: &mut Document, target: &FillTarget, field: &FieldDefinition) {
    set_on_dict(doc, target.id, |dict| {
        dict.set(
            "V",
            Object::String(field.value.clone().into_bytes(), lopdf::StringFormat::Literal),
        );
        // Stale appearance streams would keep showing the old value.
        dict.remove(b"AP");
    });
}

fn set_need_appearances(doc: &mut Document) -> Result<(), FormPdfError> {
    let catalog_id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => *id,
        _ => return Err(FormPdfError::Write("document has no catalog".to_string())),
    };

    // The AcroForm entry may be inline or an indirect reference.
    let acroform_ref = doc
        .get_object(catalog_id)
        .ok()
        .and_then(|o| o.as_dict().ok())
        .and_then(|catalog| catalog.get(b"AcroForm").ok())
        .and_then(|obj| match obj {
            Object::Reference(id) => Some(*id),
            _ => None,
        });

    match acroform_ref {
        Some(acroform_id) => {
            set_on_dict(doc, acroform_id, |dict| {
                dict.set("NeedAppearances", Object::Boolean(true));
            });
        }
        None => {
            set_on_dict(doc, catalog_id, |catalog| {
                if let Ok(Object::Dictionary(acroform)) = catalog.get_mut(b"AcroForm") {
                    acroform.set("NeedAppearances", Object::Boolean(true));
                }
            });
        }
    }
    Ok(())
}

/// Write every field's value back into the document and return the
/// synthesized bytes, ready for download.
pub fn fill_document(bytes: &[u8], fields: &[FieldDefinition]) -> Result<Vec<u8>, FormPdfError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| FormPdfError::Parse(e.to_string()))?;

    let mut targets = HashMap::new();
    let catalog = doc
        .catalog()
        .map_err(|e| FormPdfError::Parse(e.to_string()))?;
    let field_ids: Vec<ObjectId> = catalog
        .get(b"AcroForm")
        .ok()
        .map(|obj| resolve(&doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .and_then(|acroform| acroform.get(b"Fields").ok())
        .map(|obj| resolve(&doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .map(|array| {
            array
                .iter()
                .filter_map(|entry| match entry {
                    Object::Reference(id) => Some(*id),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    for id in field_ids {
        collect_targets(&doc, id, &mut targets);
    }

    let mut written = 0usize;
    for field in fields {
        let Some(target) = targets.get(&field.name) else {
            continue;
        };
        match field.kind {
            FieldKind::Checkbox | FieldKind::Radio => write_button(&mut doc, target, field),
            FieldKind::Text | FieldKind::TextArea | FieldKind::Select | FieldKind::Date => {
                write_text(&mut doc, target, field)
            }
        }
        written += 1;
    }

    set_need_appearances(&mut doc)?;

    tracing::debug!(written, "filled document fields");

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| FormPdfError::Write(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::testpdf::FormPdfBuilder;
    use crate::extract::extract_fields;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_preserves_written_values() {
        let bytes = FormPdfBuilder::new()
            .text_field("Surname", "", [100, 700, 300, 720])
            .checkbox("PreviousVisits", "Yes", false, [100, 560, 120, 580])
            .radio_group("Gender", &["Male", "Female"], [100, 480, 300, 500])
            .build();

        let mut form = extract_fields(&bytes, &[]).unwrap();
        for field in &mut form.fields {
            match field.name.as_str() {
                "Surname" => field.value = "Okafor".to_string(),
                "PreviousVisits" => field.value = "Yes".to_string(),
                "Gender" => field.value = "Female".to_string(),
                _ => {}
            }
        }

        let filled = fill_document(&bytes, &form.fields).unwrap();
        let reread = extract_fields(&filled, &[]).unwrap();

        let by_name: std::collections::HashMap<&str, &str> = reread
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(by_name["Surname"], "Okafor");
        assert_eq!(by_name["PreviousVisits"], "Yes");
        assert_eq!(by_name["Gender"], "Female");
    }

    #[test]
    fn unchecking_a_checkbox_clears_its_state() {
        let bytes = FormPdfBuilder::new()
            .checkbox("Agree", "1", true, [100, 560, 120, 580])
            .build();

        let mut form = extract_fields(&bytes, &[]).unwrap();
        assert_eq!(form.fields[0].value, "1");
        form.fields[0].value = String::new();

        let filled = fill_document(&bytes, &form.fields).unwrap();
        let reread = extract_fields(&filled, &[]).unwrap();
        assert_eq!(reread.fields[0].value, "");
    }

    #[test]
    fn need_appearances_is_set() {
        let bytes = FormPdfBuilder::new()
            .text_field("Surname", "", [100, 700, 300, 720])
            .build();
        let form = extract_fields(&bytes, &[]).unwrap();
        let filled = fill_document(&bytes, &form.fields).unwrap();

        let doc = Document::load_mem(&filled).unwrap();
        let catalog = doc.catalog().unwrap();
        let acroform = resolve(&doc, catalog.get(b"AcroForm").unwrap())
            .as_dict()
            .unwrap();
        assert_eq!(
            acroform.get(b"NeedAppearances").unwrap(),
            &Object::Boolean(true)
        );
    }
}
