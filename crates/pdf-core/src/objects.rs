//! Object graph helpers shared by forms and merge

use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeSet;

/// Reference chains longer than this are treated as broken
const MAX_REFERENCE_DEPTH: usize = 16;

/// Follow indirect references until a direct object is reached
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_REFERENCE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id)?,
            other => return Ok(other),
        }
    }
    Err(PdfError::ParseError("Reference chain too deep".to_string()))
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Dictionary> {
    resolve(doc, obj)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Expected a dictionary".to_string()))
}

pub(crate) fn resolve_array<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Vec<Object>> {
    resolve(doc, obj)?
        .as_array()
        .map_err(|_| PdfError::ParseError("Expected an array".to_string()))
}

/// Document catalog (`/Root`) with its object id
pub(crate) fn catalog(doc: &Document) -> Result<(ObjectId, &Dictionary)> {
    let root = doc
        .trailer
        .get(b"Root")
        .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))?;
    let catalog_id = root
        .as_reference()
        .map_err(|_| PdfError::ParseError("Root is not a reference".to_string()))?;
    let catalog_dict = doc
        .get_object(catalog_id)?
        .as_dict()
        .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?;
    Ok((catalog_id, catalog_dict))
}

/// Decode a PDF text string into Rust text
///
/// UTF-16BE when it carries a byte order mark, UTF-8 otherwise. Invalid
/// sequences are replaced rather than reported.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = utf16
            .chunks(2)
            .map(|pair| match pair {
                [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                [single] => u16::from(*single),
                _ => 0xFFFD,
            })
            .collect::<Vec<_>>();
        return char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Encode text as a PDF text string
///
/// Plain ASCII is stored as-is; anything else goes out as UTF-16BE with a
/// byte order mark so accents survive in every reader.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

/// Render a leaf object as text (names, strings, numbers, booleans)
pub(crate) fn object_to_text(obj: &Object) -> String {
    match obj {
        Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
        Object::String(bytes, _) => decode_text_string(bytes),
        Object::Integer(i) => i.to_string(),
        Object::Real(r) => r.to_string(),
        Object::Boolean(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Collect every object id reachable from `root`
pub(crate) fn collect_references(doc: &Document, root: &Object, seen: &mut BTreeSet<ObjectId>) {
    match root {
        Object::Reference(id) => {
            if seen.insert(*id) {
                if let Ok(obj) = doc.get_object(*id) {
                    collect_references(doc, obj, seen);
                }
            }
        }
        Object::Array(items) => {
            for item in items {
                collect_references(doc, item, seen);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                collect_references(doc, value, seen);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                collect_references(doc, value, seen);
            }
        }
        _ => {}
    }
}
