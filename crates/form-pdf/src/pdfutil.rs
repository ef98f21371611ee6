//! Small lopdf helpers shared by the extract/write/overlay modules.

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Follow a reference to its target, or return the object as-is.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Decode a PDF string: UTF-16BE when BOM-prefixed, Latin-1 otherwise.
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// String or name entry of a dictionary, decoded.
pub(crate) fn dict_text(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = dict.get(key).ok()?;
    match resolve(doc, obj) {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Name entry of a dictionary as raw bytes.
pub(crate) fn dict_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    let obj = dict.get(key).ok()?;
    match resolve(doc, obj) {
        Object::Name(bytes) => Some(bytes),
        _ => None,
    }
}

/// Numeric object as f64.
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Look a key up on a field dictionary, walking the `/Parent` chain
/// when the entry is inherited.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    if let Ok(obj) = dict.get(key) {
        return Some(resolve(doc, obj));
    }
    let mut current = dict;
    // Bounded walk in case of a malformed parent cycle.
    for _ in 0..16 {
        let parent = current.get(b"Parent").ok()?;
        current = resolve(doc, parent).as_dict().ok()?;
        if let Ok(obj) = current.get(key) {
            return Some(resolve(doc, obj));
        }
    }
    None
}

/// Nearest `/T` up the parent chain, for widgets that are kids of a
/// named field.
pub(crate) fn field_name_of(doc: &Document, dict: &Dictionary) -> Option<String> {
    if let Some(name) = dict_text(doc, dict, b"T") {
        return Some(name);
    }
    let mut current = dict;
    for _ in 0..16 {
        let parent = current.get(b"Parent").ok()?;
        current = resolve(doc, parent).as_dict().ok()?;
        if let Some(name) = dict_text(doc, current, b"T") {
            return Some(name);
        }
    }
    None
}

/// First non-`/Off` appearance state in the widget's `/AP /N` dictionary.
pub(crate) fn on_state(doc: &Document, dict: &Dictionary) -> Option<String> {
    let ap = resolve(doc, dict.get(b"AP").ok()?).as_dict().ok()?;
    let normal = resolve(doc, ap.get(b"N").ok()?).as_dict().ok()?;
    for (key, _) in normal.iter() {
        if key.as_slice() != b"Off" {
            return Some(decode_pdf_string(key));
        }
    }
    None
}

/// All object ids in a `/Kids` array.
pub(crate) fn kid_ids(doc: &Document, dict: &Dictionary) -> Vec<ObjectId> {
    let mut ids = Vec::new();
    if let Ok(kids) = dict.get(b"Kids") {
        if let Ok(array) = resolve(doc, kids).as_array() {
            for kid in array {
                if let Object::Reference(id) = kid {
                    ids.push(*id);
                }
            }
        }
    }
    ids
}
