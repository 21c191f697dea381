//! Overlay merging
//!
//! Stamps the first page of one document onto the first page of another.
//! The overlay page becomes a Form XObject inside the base document, so
//! the base page keeps its own content, annotations and form fields.

use crate::document::{
    effective_resources, media_box, read_page_content, replace_page_content, set_page_entry,
    sub_dictionary,
};
use crate::objects::collect_references;
use crate::{PdfError, Result};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeSet;
use tracing::debug;

/// Prefix of the XObject resource names created here
const OVERLAY_PREFIX: &str = "Ovl";

/// Draw page 1 of `overlay` on top of page 1 of `original`
///
/// Other pages of `original` are left untouched; other pages of `overlay`
/// are ignored. Both documents need at least one page.
///
/// # Example
/// ```ignore
/// let stamped = merge_overlay(&template_bytes, &overlay_bytes)?;
/// std::fs::write("out.pdf", stamped)?;
/// ```
pub fn merge_overlay(original: &[u8], overlay: &[u8]) -> Result<Vec<u8>> {
    let mut base = Document::load_mem(original).map_err(|e| PdfError::OpenError(e.to_string()))?;
    let mut stamp = Document::load_mem(overlay).map_err(|e| PdfError::OpenError(e.to_string()))?;

    let base_page = first_page(&base)?;
    if first_page(&stamp).is_err() {
        return Err(PdfError::NoPages);
    }

    // Move the overlay's ids past the base document's before copying
    stamp.renumber_objects_with(base.max_id + 1);
    let stamp_page = first_page(&stamp)?;

    let form_id = import_page_as_form(&mut base, &stamp, stamp_page)?;
    stamp_page_with_form(&mut base, base_page, form_id)?;

    let mut out = Vec::new();
    base.save_to(&mut out)
        .map_err(|e| PdfError::SaveError(e.to_string()))?;
    Ok(out)
}

fn first_page(doc: &Document) -> Result<ObjectId> {
    doc.get_pages()
        .into_values()
        .next()
        .ok_or(PdfError::NoPages)
}

/// Copy a page of `source` into `target` as a Form XObject
///
/// Only objects reachable from the page's resources come along; the page
/// tree of `source` is not copied.
fn import_page_as_form(target: &mut Document, source: &Document, page_id: ObjectId) -> Result<ObjectId> {
    let content = read_page_content(source, page_id)?;
    let resources = effective_resources(source, page_id)?;
    let [x1, y1, x2, y2] = media_box(source, page_id)?;

    let mut reachable = BTreeSet::new();
    collect_references(source, &Object::Dictionary(resources.clone()), &mut reachable);
    for id in &reachable {
        if let Ok(obj) = source.get_object(*id) {
            target.objects.insert(*id, obj.clone());
        }
    }
    target.max_id = target.max_id.max(source.max_id);
    debug!(objects = reachable.len(), "overlay resources copied");

    let form = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Real(x1 as f32),
                Object::Real(y1 as f32),
                Object::Real(x2 as f32),
                Object::Real(y2 as f32),
            ],
            "Resources" => resources,
        },
        content,
    );
    Ok(target.add_object(form))
}

/// Register the form on a page and paint it after the existing content
fn stamp_page_with_form(doc: &mut Document, page_id: ObjectId, form_id: ObjectId) -> Result<()> {
    let mut resources = effective_resources(doc, page_id)?;
    let mut xobjects = sub_dictionary(doc, &resources, b"XObject");

    let mut n = 1;
    let name = loop {
        let candidate = format!("{OVERLAY_PREFIX}{n}");
        if !xobjects.has(candidate.as_bytes()) {
            break candidate;
        }
        n += 1;
    };
    xobjects.set(name.clone(), Object::Reference(form_id));
    resources.set("XObject", Object::Dictionary(xobjects));
    set_page_entry(doc, page_id, "Resources", Object::Dictionary(resources))?;

    // The original content is isolated so its graphics state cannot leak
    let existing = read_page_content(doc, page_id)?;
    let mut content = Vec::with_capacity(existing.len() + 32);
    content.extend_from_slice(b"q\n");
    content.extend_from_slice(&existing);
    content.extend_from_slice(b"\nQ\n");
    content.extend_from_slice(format!("q\n/{name} Do\nQ\n").as_bytes());
    replace_page_content(doc, page_id, content)?;

    debug!(xobject = %name, "overlay stamped on page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Align, PdfDocument, A4_HEIGHT, A4_WIDTH};

    fn blank_bytes() -> Vec<u8> {
        PdfDocument::blank(A4_WIDTH, A4_HEIGHT)
            .unwrap()
            .to_bytes()
            .unwrap()
    }

    fn overlay_bytes(text: &str) -> Vec<u8> {
        let mut doc = PdfDocument::blank(A4_WIDTH, A4_HEIGHT).unwrap();
        doc.insert_text(text, 1, 268.0, 684.0, Align::Left).unwrap();
        doc.to_bytes().unwrap()
    }

    fn page_one(bytes: &[u8]) -> (Document, ObjectId) {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = first_page(&doc).unwrap();
        (doc, page_id)
    }

    #[test]
    fn test_merge_keeps_page_count() {
        let merged = merge_overlay(&blank_bytes(), &overlay_bytes("Jean Dupont")).unwrap();
        let (doc, _) = page_one(&merged);
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_merge_paints_form_xobject() {
        let merged = merge_overlay(&blank_bytes(), &overlay_bytes("Jean Dupont")).unwrap();
        let (doc, page_id) = page_one(&merged);

        let content = String::from_utf8_lossy(&read_page_content(&doc, page_id).unwrap()).into_owned();
        assert!(content.starts_with("q\n"));
        assert!(content.contains("/Ovl1 Do"));

        let resources = effective_resources(&doc, page_id).unwrap();
        let xobjects = sub_dictionary(&doc, &resources, b"XObject");
        let form_id = xobjects.get(b"Ovl1").unwrap().as_reference().unwrap();
        let Object::Stream(form) = doc.get_object(form_id).unwrap() else {
            panic!("overlay is not a stream");
        };
        assert_eq!(form.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");

        // The overlay's font comes along with it
        let form_resources = form.dict.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(form_resources.has(b"Font"));
        let form_content = String::from_utf8_lossy(&form.content).into_owned();
        assert!(form_content.contains("Tj"));
    }

    #[test]
    fn test_merge_twice_uses_distinct_names() {
        let once = merge_overlay(&blank_bytes(), &overlay_bytes("A")).unwrap();
        let twice = merge_overlay(&once, &overlay_bytes("B")).unwrap();
        let (doc, page_id) = page_one(&twice);

        let content = String::from_utf8_lossy(&read_page_content(&doc, page_id).unwrap()).into_owned();
        assert!(content.contains("/Ovl1 Do"));
        assert!(content.contains("/Ovl2 Do"));
    }

    #[test]
    fn test_merge_rejects_garbage() {
        assert!(matches!(
            merge_overlay(b"nope", &blank_bytes()),
            Err(PdfError::OpenError(_))
        ));
    }
}
