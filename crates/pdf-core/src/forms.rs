//! Interactive form (AcroForm) inspection and filling
//!
//! Inspection never fails as a whole: a field entry that cannot be read is
//! logged and skipped, and a document that cannot be parsed at all is
//! reported through [`FormInspection::error`].

use crate::objects::{catalog, encode_text_string, object_to_text, resolve, resolve_array, resolve_dict};
use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use tracing::{debug, info, warn};

/// Fields nested deeper than this are not followed
const MAX_FIELD_DEPTH: usize = 8;

/// One interactive field as found in the AcroForm catalogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Partial field name (`/T`), or `Field_<index>` when unset
    pub name: String,
    /// Field type (`/FT`: Tx, Btn, Ch, Sig) or `Unknown`
    pub field_type: String,
    /// Current value (`/V`), empty when unset
    pub value: String,
    /// Position in the `/Fields` array
    pub index: usize,
}

/// Result of looking for form fields in a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInspection {
    pub has_fields: bool,
    pub count: usize,
    pub fields: Vec<FieldDescriptor>,
    /// Set when the document itself could not be parsed
    pub error: Option<String>,
}

/// Output of [`fill_form_fields`]
#[derive(Debug, Clone)]
pub struct FilledForm {
    /// Names of the fields that received a value
    pub matched: Vec<String>,
    /// The rewritten document
    pub pdf: Vec<u8>,
}

/// Enumerate the interactive form fields of a PDF
///
/// # Example
/// ```ignore
/// let inspection = inspect_form_fields(&bytes);
/// if inspection.has_fields {
///     for field in &inspection.fields {
///         println!("{} ({})", field.name, field.field_type);
///     }
/// }
/// ```
pub fn inspect_form_fields(data: &[u8]) -> FormInspection {
    let doc = match Document::load_mem(data) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "could not parse PDF for field inspection");
            return FormInspection {
                error: Some(PdfError::OpenError(e.to_string()).to_string()),
                ..FormInspection::default()
            };
        }
    };

    let entries = match field_entries(&doc) {
        Ok(Some(entries)) => entries,
        Ok(None) => {
            info!("no AcroForm in document");
            return FormInspection::default();
        }
        Err(e) => {
            warn!(error = %e, "unreadable AcroForm");
            return FormInspection::default();
        }
    };

    let mut fields = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match describe_field(&doc, entry, index) {
            Ok(field) => {
                debug!(index, name = %field.name, field_type = %field.field_type, "form field");
                fields.push(field);
            }
            Err(e) => warn!(index, error = %e, "skipping unreadable form field"),
        }
    }

    info!(count = fields.len(), "form fields found");
    FormInspection {
        has_fields: !fields.is_empty(),
        count: fields.len(),
        fields,
        error: None,
    }
}

/// `/Root/AcroForm/Fields`, or `None` when the document has no form
fn field_entries(doc: &Document) -> Result<Option<Vec<Object>>> {
    let (_, catalog_dict) = catalog(doc)?;
    let acro_form = match catalog_dict.get(b"AcroForm") {
        Ok(obj) => resolve_dict(doc, obj)?,
        Err(_) => return Ok(None),
    };
    match acro_form.get(b"Fields") {
        Ok(fields) => Ok(Some(resolve_array(doc, fields)?.clone())),
        Err(_) => Ok(None),
    }
}

fn describe_field(doc: &Document, entry: &Object, index: usize) -> Result<FieldDescriptor> {
    let dict = resolve_dict(doc, entry)?;

    let name = dict
        .get(b"T")
        .ok()
        .and_then(|t| resolve(doc, t).ok())
        .map(object_to_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Field_{index}"));

    let field_type = inherited(doc, dict, b"FT")
        .map(object_to_text)
        .unwrap_or_else(|| "Unknown".to_string());

    let value = inherited(doc, dict, b"V")
        .map(object_to_text)
        .unwrap_or_default();

    Ok(FieldDescriptor {
        name,
        field_type,
        value,
        index,
    })
}

/// Look up an inheritable field attribute on the field or its ancestors
fn inherited<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = dict;
    for _ in 0..MAX_FIELD_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value).ok();
        }
        current = current
            .get(b"Parent")
            .ok()
            .and_then(|parent| resolve_dict(doc, parent).ok())?;
    }
    None
}

/// Write values into the document's own form fields
///
/// Every widget annotation on every page is checked; its field name (on
/// the widget itself, or on its parent field) is passed to `lookup`, and
/// when a value comes back it is stored as the field's `/V`. The AcroForm
/// gets `/NeedAppearances true` so viewers regenerate the visible text.
///
/// A document without fields is not an error: `matched` is simply empty.
pub fn fill_form_fields<F>(data: &[u8], lookup: F) -> Result<FilledForm>
where
    F: Fn(&str) -> Option<String>,
{
    let mut doc = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;

    let mut updates: Vec<(ObjectId, String, String)> = Vec::new();
    for (page_number, page_id) in doc.get_pages() {
        for (field_id, name) in page_field_ids(&doc, page_id) {
            if updates.iter().any(|(id, _, _)| *id == field_id) {
                continue;
            }
            if let Some(value) = lookup(&name) {
                debug!(page = page_number, field = %name, "filling form field");
                updates.push((field_id, name, value));
            }
        }
    }

    let mut matched = Vec::with_capacity(updates.len());
    for (field_id, name, value) in updates {
        doc.get_object_mut(field_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError(format!("Field '{name}' is not a dictionary")))?
            .set("V", Object::String(encode_text_string(&value), StringFormat::Literal));
        matched.push(name);
    }

    if !matched.is_empty() {
        set_need_appearances(&mut doc)?;
    }

    let mut pdf = Vec::new();
    doc.save_to(&mut pdf)
        .map_err(|e| PdfError::SaveError(e.to_string()))?;

    info!(matched = matched.len(), "native form filling done");
    Ok(FilledForm { matched, pdf })
}

/// `(field object id, field name)` for every named widget on a page
fn page_field_ids(doc: &Document, page_id: ObjectId) -> Vec<(ObjectId, String)> {
    let annots = match doc
        .get_object(page_id)
        .ok()
        .and_then(|page| page.as_dict().ok())
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|annots| resolve_array(doc, annots).ok())
    {
        Some(annots) => annots,
        None => return Vec::new(),
    };

    let mut out = Vec::new();
    for annot in annots {
        let Object::Reference(annot_id) = annot else {
            continue;
        };
        match named_field(doc, *annot_id) {
            Some(found) => out.push(found),
            None => debug!(annotation = ?annot_id, "annotation without field name"),
        }
    }
    out
}

/// The object carrying the field name for a widget: itself or its parent
fn named_field(doc: &Document, widget_id: ObjectId) -> Option<(ObjectId, String)> {
    let mut current_id = widget_id;
    for _ in 0..MAX_FIELD_DEPTH {
        let dict = doc.get_object(current_id).ok()?.as_dict().ok()?;
        if let Ok(name) = dict.get(b"T") {
            let name = object_to_text(resolve(doc, name).ok()?);
            return (!name.is_empty()).then_some((current_id, name));
        }
        current_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn set_need_appearances(doc: &mut Document) -> Result<()> {
    let (catalog_id, catalog_dict) = catalog(doc)?;
    let acro_ref = match catalog_dict.get(b"AcroForm") {
        Ok(Object::Reference(id)) => Some(*id),
        Ok(Object::Dictionary(_)) => None,
        _ => return Ok(()),
    };

    let acro_form = match acro_ref {
        Some(id) => doc.get_object_mut(id)?,
        None => doc
            .get_object_mut(catalog_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Catalog is not a dictionary".to_string()))?
            .get_mut(b"AcroForm")?,
    };
    acro_form
        .as_dict_mut()
        .map_err(|_| PdfError::ParseError("AcroForm is not a dictionary".to_string()))?
        .set("NeedAppearances", Object::Boolean(true));
    Ok(())
}
