//! AcroForm field extraction
//!
//! Walks the document's interactive-field dictionary and produces an
//! ordered, typed `FieldDefinition` list plus the page count. When the
//! document has no AcroForm at all, named widget annotations are used
//! as a fallback; a document with neither is unprocessable.

use std::collections::{HashMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::FormPdfError;
use crate::intel::{DetectedLabel, DocumentIntelligence};
use crate::label::resolve_label;
use crate::overlay::{widget_kind, widgets_from_doc, Rect};
use crate::pdfutil::{decode_pdf_string, dict_text, kid_ids, on_state, resolve};
use shared_types::{FieldAppearance, FieldDefinition, FieldKind, FieldSource};

/// Extraction result: the typed field list and the page count the
/// renderer needs later.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedForm {
    pub fields: Vec<FieldDefinition>,
    pub page_count: usize,
}

/// Parse raw bytes and return the page count.
pub fn page_count(bytes: &[u8]) -> Result<usize, FormPdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| FormPdfError::Parse(e.to_string()))?;
    Ok(doc.get_pages().len())
}

/// Parse a compact default-appearance string (`/Helv 9 Tf 0 g`) into
/// font name and size.
fn parse_default_appearance(da: &str) -> (Option<String>, Option<f32>) {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    if let Some(tf) = tokens.iter().position(|t| *t == "Tf") {
        if tf >= 2 {
            let font = tokens[tf - 2]
                .strip_prefix('/')
                .map(|name| name.to_string());
            let size = tokens[tf - 1].parse::<f32>().ok();
            return (font, size);
        }
    }
    (None, None)
}

fn looks_like_date(name: &str, label: &str) -> bool {
    let haystack = format!("{} {}", name, label).to_lowercase();
    haystack.contains("date") || haystack.contains("dob") || haystack.contains("birth")
}

/// Current value of a field, uniformly as a string. Buttons report
/// their on token when checked and an empty string otherwise.
fn read_value(doc: &Document, dict: &Dictionary, kind: FieldKind) -> String {
    let raw = match dict.get(b"V").map(|obj| resolve(doc, obj)) {
        Ok(obj) => obj,
        Err(_) => return String::new(),
    };
    match (kind, raw) {
        (FieldKind::Checkbox | FieldKind::Radio, Object::Name(bytes)) => {
            if bytes.as_slice() == b"Off" {
                String::new()
            } else {
                decode_pdf_string(bytes)
            }
        }
        (_, Object::String(bytes, _)) => decode_pdf_string(bytes),
        (_, Object::Name(bytes)) => decode_pdf_string(bytes),
        // Multi-select choice: first selected entry.
        (_, Object::Array(items)) => items
            .first()
            .and_then(|obj| match resolve(doc, obj) {
                Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
                _ => None,
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Options for a choice field, from its `/Opt` array. Entries are
/// either display strings or `[export, display]` pairs.
fn read_options(doc: &Document, dict: &Dictionary) -> Vec<String> {
    let mut options = Vec::new();
    if let Ok(opt) = dict.get(b"Opt") {
        if let Ok(array) = resolve(doc, opt).as_array() {
            for entry in array {
                match resolve(doc, entry) {
                    Object::String(bytes, _) => options.push(decode_pdf_string(bytes)),
                    Object::Array(pair) if pair.len() == 2 => {
                        if let Object::String(bytes, _) = resolve(doc, &pair[1]) {
                            options.push(decode_pdf_string(bytes));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    options
}

/// Export states of a radio group, one per kid widget.
fn radio_options(doc: &Document, dict: &Dictionary) -> Vec<String> {
    let mut options = Vec::new();
    for kid_id in kid_ids(doc, dict) {
        if let Ok(kid) = doc.get_object(kid_id).and_then(|o| o.as_dict()) {
            if let Some(state) = on_state(doc, kid) {
                if !options.contains(&state) {
                    options.push(state);
                }
            }
        }
    }
    options
}

fn checkbox_on_value(doc: &Document, dict: &Dictionary) -> Option<String> {
    on_state(doc, dict).or_else(|| {
        kid_ids(doc, dict).into_iter().find_map(|kid_id| {
            doc.get_object(kid_id)
                .ok()
                .and_then(|o| o.as_dict().ok())
                .and_then(|kid| on_state(doc, kid))
        })
    })
}

struct ExtractContext<'a> {
    labels: &'a [DetectedLabel],
    /// First widget position per field name, for label proximity.
    positions: HashMap<String, (u32, Rect)>,
    default_da: Option<String>,
    seen: HashSet<String>,
}

fn build_definition(
    doc: &Document,
    dict: &Dictionary,
    name: String,
    ctx: &ExtractContext<'_>,
) -> Option<FieldDefinition> {
    let mut kind = widget_kind(doc, dict)?;

    let position = ctx
        .positions
        .get(&name)
        .map(|(page, rect)| (*page, rect));
    let label = resolve_label(&name, ctx.labels, position);

    if kind == FieldKind::Text && looks_like_date(&name, &label) {
        kind = FieldKind::Date;
    }

    let value = read_value(doc, dict, kind);

    let options = match kind {
        FieldKind::Select => read_options(doc, dict),
        FieldKind::Radio => radio_options(doc, dict),
        _ => Vec::new(),
    };

    let da = dict_text(doc, dict, b"DA").or_else(|| ctx.default_da.clone());
    let (font_name, font_size) = da
        .as_deref()
        .map(parse_default_appearance)
        .unwrap_or((None, None));
    let on_value = match kind {
        FieldKind::Checkbox => checkbox_on_value(doc, dict),
        _ => None,
    };

    let appearance = if font_name.is_some() || font_size.is_some() || on_value.is_some() {
        Some(FieldAppearance {
            font_size,
            font_name,
            on_value,
        })
    } else {
        None
    };

    Some(FieldDefinition {
        name,
        kind,
        value,
        label,
        options,
        appearance,
        source: FieldSource::None,
    })
}

/// Recursively collect terminal fields, traversing `/Kids`. A kid with
/// its own `/T` is a child field; unnamed kids are widgets of this one.
fn collect_field(
    doc: &Document,
    id: ObjectId,
    ctx: &mut ExtractContext<'_>,
    out: &mut Vec<FieldDefinition>,
) {
    let dict = match doc.get_object(id).and_then(|o| o.as_dict()) {
        Ok(dict) => dict,
        Err(_) => return,
    };

    let name = dict_text(doc, dict, b"T");
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
            collect_field(doc, kid_id, ctx, out);
        }
        return;
    }

    let Some(name) = name else { return };
    if !ctx.seen.insert(name.clone()) {
        return;
    }
    if let Some(field) = build_definition(doc, dict, name, ctx) {
        out.push(field);
    }
}

fn acroform_field_ids(doc: &Document) -> (Vec<ObjectId>, Option<String>) {
    let Ok(catalog) = doc.catalog() else {
        return (Vec::new(), None);
    };
    let Ok(acroform) = catalog.get(b"AcroForm") else {
        return (Vec::new(), None);
    };
    let Ok(acroform) = resolve(doc, acroform).as_dict() else {
        return (Vec::new(), None);
    };
    let default_da = dict_text(doc, acroform, b"DA");

    let mut ids = Vec::new();
    if let Ok(fields) = acroform.get(b"Fields") {
        if let Ok(array) = resolve(doc, fields).as_array() {
            for entry in array {
                if let Object::Reference(id) = entry {
                    ids.push(*id);
                }
            }
        }
    }
    (ids, default_da)
}

/// Extract the interactive field structure of a document.
///
/// `detected_labels` come from the Document Intelligence collaborator
/// and may be empty; extraction then relies on name heuristics alone.
pub fn extract_fields(
    bytes: &[u8],
    detected_labels: &[DetectedLabel],
) -> Result<ExtractedForm, FormPdfError> {
    let doc = Document::load_mem(bytes).map_err(|e| FormPdfError::Parse(e.to_string()))?;
    let page_count = doc.get_pages().len();

    let widgets = widgets_from_doc(&doc);
    let mut positions = HashMap::new();
    for widget in &widgets {
        positions
            .entry(widget.field_name.clone())
            .or_insert((widget.page, widget.rect));
    }

    let (field_ids, default_da) = acroform_field_ids(&doc);
    let mut ctx = ExtractContext {
        labels: detected_labels,
        positions,
        default_da,
        seen: HashSet::new(),
    };

    let mut fields = Vec::new();
    for id in field_ids {
        collect_field(&doc, id, &mut ctx, &mut fields);
    }

    // Annotation fallback: a document without an AcroForm can still
    // carry named widgets.
    if fields.is_empty() {
        for widget in &widgets {
            if !ctx.seen.insert(widget.field_name.clone()) {
                continue;
            }
            let kind = widget.kind.unwrap_or(FieldKind::Text);
            let mut field = FieldDefinition::new(
                widget.field_name.clone(),
                kind,
                resolve_label(
                    &widget.field_name,
                    detected_labels,
                    Some((widget.page, &widget.rect)),
                ),
            );
            if widget.on_value.is_some() {
                field.appearance = Some(FieldAppearance {
                    on_value: widget.on_value.clone(),
                    ..Default::default()
                });
            }
            fields.push(field);
        }
    }

    if fields.is_empty() {
        return Err(FormPdfError::UnprocessableDocument);
    }

    tracing::info!(fields = fields.len(), pages = page_count, "extracted form");

    Ok(ExtractedForm { fields, page_count })
}

/// Extract with an intelligence pass in front. Analysis failure is
/// soft: extraction falls back to name heuristics alone.
pub fn extract_with_intelligence(
    bytes: &[u8],
    intel: &impl DocumentIntelligence,
    visa_type_hint: Option<&str>,
) -> Result<ExtractedForm, FormPdfError> {
    let labels = match intel.analyze(bytes, visa_type_hint) {
        Ok(analysis) => analysis.labels,
        Err(err) => {
            tracing::warn!(error = %err, "document intelligence unavailable, using name heuristics");
            Vec::new()
        }
    };
    extract_fields(bytes, &labels)
}

#[cfg(test)]
pub(crate) mod testpdf {
    //! In-memory AcroForm PDF construction for tests.

    use lopdf::{Dictionary, Document, Object, ObjectId};

    pub struct FormPdfBuilder {
        doc: Document,
        pages_id: ObjectId,
        page_id: ObjectId,
        field_ids: Vec<ObjectId>,
        annot_ids: Vec<ObjectId>,
    }

    impl FormPdfBuilder {
        pub fn new() -> Self {
            let mut doc = Document::with_version("1.7");
            let pages_id = doc.new_object_id();
            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
            ]);
            let page_id = doc.add_object(page);
            Self {
                doc,
                pages_id,
                page_id,
                field_ids: Vec::new(),
                annot_ids: Vec::new(),
            }
        }

        fn widget_base(rect: [i64; 4]) -> Dictionary {
            Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Annot".to_vec())),
                ("Subtype", Object::Name(b"Widget".to_vec())),
                (
                    "Rect",
                    Object::Array(rect.iter().map(|v| Object::Integer(*v)).collect()),
                ),
            ])
        }

        pub fn text_field(&mut self, name: &str, value: &str, rect: [i64; 4]) -> &mut Self {
            let mut dict = Self::widget_base(rect);
            dict.set("FT", Object::Name(b"Tx".to_vec()));
            dict.set(
                "T",
                Object::String(name.into(), lopdf::StringFormat::Literal),
            );
            if !value.is_empty() {
                dict.set(
                    "V",
                    Object::String(value.into(), lopdf::StringFormat::Literal),
                );
            }
            dict.set(
                "DA",
                Object::String(b"/Helv 9 Tf 0 g".to_vec(), lopdf::StringFormat::Literal),
            );
            let id = self.doc.add_object(dict);
            self.field_ids.push(id);
            self.annot_ids.push(id);
            self
        }

        pub fn multiline_field(&mut self, name: &str, rect: [i64; 4]) -> &mut Self {
            let mut dict = Self::widget_base(rect);
            dict.set("FT", Object::Name(b"Tx".to_vec()));
            dict.set("Ff", Object::Integer(1 << 12));
            dict.set(
                "T",
                Object::String(name.into(), lopdf::StringFormat::Literal),
            );
            let id = self.doc.add_object(dict);
            self.field_ids.push(id);
            self.annot_ids.push(id);
            self
        }

        pub fn checkbox(&mut self, name: &str, on: &str, checked: bool, rect: [i64; 4]) -> &mut Self {
            let mut ap_n = Dictionary::new();
            ap_n.set(on.as_bytes().to_vec(), Object::Null);
            ap_n.set("Off", Object::Null);
            let mut ap = Dictionary::new();
            ap.set("N", Object::Dictionary(ap_n));

            let mut dict = Self::widget_base(rect);
            dict.set("FT", Object::Name(b"Btn".to_vec()));
            dict.set(
                "T",
                Object::String(name.into(), lopdf::StringFormat::Literal),
            );
            dict.set("AP", Object::Dictionary(ap));
            dict.set(
                "V",
                Object::Name(if checked { on.into() } else { b"Off".to_vec() }),
            );
            let id = self.doc.add_object(dict);
            self.field_ids.push(id);
            self.annot_ids.push(id);
            self
        }

        pub fn select(&mut self, name: &str, options: &[&str], rect: [i64; 4]) -> &mut Self {
            let mut dict = Self::widget_base(rect);
            dict.set("FT", Object::Name(b"Ch".to_vec()));
            dict.set(
                "T",
                Object::String(name.into(), lopdf::StringFormat::Literal),
            );
            dict.set(
                "Opt",
                Object::Array(
                    options
                        .iter()
                        .map(|o| Object::String((*o).into(), lopdf::StringFormat::Literal))
                        .collect(),
                ),
            );
            let id = self.doc.add_object(dict);
            self.field_ids.push(id);
            self.annot_ids.push(id);
            self
        }

        pub fn radio_group(&mut self, name: &str, exports: &[&str], rect: [i64; 4]) -> &mut Self {
            let parent_id = self.doc.new_object_id();
            let mut kid_refs = Vec::new();
            for (i, export) in exports.iter().enumerate() {
                let mut ap_n = Dictionary::new();
                ap_n.set(export.as_bytes().to_vec(), Object::Null);
                ap_n.set("Off", Object::Null);
                let mut ap = Dictionary::new();
                ap.set("N", Object::Dictionary(ap_n));

                let mut kid = Self::widget_base([
                    rect[0] + (i as i64) * 30,
                    rect[1],
                    rect[0] + (i as i64) * 30 + 20,
                    rect[3],
                ]);
                kid.set("Parent", Object::Reference(parent_id));
                kid.set("AP", Object::Dictionary(ap));
                kid.set("AS", Object::Name(b"Off".to_vec()));
                let kid_id = self.doc.add_object(kid);
                kid_refs.push(Object::Reference(kid_id));
                self.annot_ids.push(kid_id);
            }

            let parent = Dictionary::from_iter(vec![
                ("FT", Object::Name(b"Btn".to_vec())),
                ("Ff", Object::Integer(1 << 15)),
                (
                    "T",
                    Object::String(name.into(), lopdf::StringFormat::Literal),
                ),
                ("V", Object::Name(b"Off".to_vec())),
                ("Kids", Object::Array(kid_refs)),
            ]);
            self.doc
                .objects
                .insert(parent_id, Object::Dictionary(parent));
            self.field_ids.push(parent_id);
            self
        }

        /// Finish the document. With `with_acroform` false, widgets stay
        /// on the page but the catalog declares no form.
        pub fn build_with(&mut self, with_acroform: bool) -> Vec<u8> {
            let annots: Vec<Object> = self
                .annot_ids
                .iter()
                .map(|id| Object::Reference(*id))
                .collect();
            if let Ok(Object::Dictionary(page)) = self.doc.get_object_mut(self.page_id) {
                page.set("Annots", Object::Array(annots));
            }

            let pages = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Count", Object::Integer(1)),
                ("Kids", Object::Array(vec![Object::Reference(self.page_id)])),
            ]);
            self.doc
                .objects
                .insert(self.pages_id, Object::Dictionary(pages));

            let mut catalog = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Catalog".to_vec())),
                ("Pages", Object::Reference(self.pages_id)),
            ]);
            if with_acroform {
                let fields: Vec<Object> = self
                    .field_ids
                    .iter()
                    .map(|id| Object::Reference(*id))
                    .collect();
                let acroform = Dictionary::from_iter(vec![
                    ("Fields", Object::Array(fields)),
                    (
                        "DA",
                        Object::String(b"/Helv 0 Tf 0 g".to_vec(), lopdf::StringFormat::Literal),
                    ),
                ]);
                let acroform_id = self.doc.add_object(acroform);
                catalog.set("AcroForm", Object::Reference(acroform_id));
            }
            let catalog_id = self.doc.add_object(catalog);
            self.doc.trailer.set("Root", Object::Reference(catalog_id));

            let mut buffer = Vec::new();
            self.doc.save_to(&mut buffer).expect("save test PDF");
            buffer
        }

        pub fn build(&mut self) -> Vec<u8> {
            self.build_with(true)
        }
    }
}
