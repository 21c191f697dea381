//! Integration tests for pdf-core
//!
//! These tests run the public API against PDFs built by hand with lopdf.

use lopdf::{dictionary, Document, Object, Stream};
use pdf_core::{
    fill_form_fields, inspect_form_fields, merge_overlay, Align, PdfDocument, PdfError,
    StandardFont, A4_HEIGHT, A4_WIDTH,
};
use pretty_assertions::assert_eq;

/// Create a minimal valid PDF with the given number of A4 pages
fn create_test_pdf_with_pages(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Count" => page_count as i32,
        "Kids" => vec![],
    }));

    let mut page_ids = Vec::new();
    for _ in 0..page_count {
        let contents_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, vec![])));
        let page_id = doc.add_object(Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
            "Resources" => dictionary! {},
            "Contents" => contents_id,
        }));
        page_ids.push(page_id);
    }

    let mut pages_dict = doc.get_object(pages_id).unwrap().as_dict().unwrap().clone();
    pages_dict.set(
        "Kids",
        Object::Array(page_ids.into_iter().map(|id| id.into()).collect()),
    );
    doc.objects.insert(pages_id, pages_dict.into());

    let catalog_id = doc.add_object(Object::Dictionary(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    }));
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A PDF whose page tree holds no page at all
fn create_pageless_pdf() -> Vec<u8> {
    create_test_pdf_with_pages(0)
}

/// One-page PDF with a parent field and one child widget per name
///
/// The field type sits on the parent, the name on the child, the way
/// many form designers export them.
fn create_form_pdf(names: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();
    let parent_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let y = 700 - (i as i64) * 40;
        let widget_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Parent" => parent_id,
            "T" => Object::string_literal(*name),
            "Rect" => vec![100.into(), y.into(), 400.into(), (y + 18).into()],
        });
        kids.push(Object::Reference(widget_id));
    }

    doc.objects.insert(
        parent_id,
        Object::Dictionary(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("demandeur"),
            "Kids" => kids.clone(),
        }),
    );
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Annots" => kids.clone(),
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! { "Fields" => kids },
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn page_text(bytes: &[u8], page: u32) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().get(&page).unwrap();
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

#[test]
fn test_blank_page_with_text() {
    let mut doc = PdfDocument::blank(A4_WIDTH, A4_HEIGHT).unwrap();
    doc.set_font(StandardFont::Helvetica, 10.0);
    doc.insert_text("Jean Dupont", 1, 268.0, 684.0, Align::Left)
        .unwrap();
    let bytes = doc.to_bytes().unwrap();

    let content = page_text(&bytes, 1);
    assert!(content.contains("268 684 Td"));
    assert!(content.contains("<4A65616E204475706F6E74> Tj"));
}

#[test]
fn test_insert_text_page_out_of_range() {
    let mut doc = PdfDocument::blank(A4_WIDTH, A4_HEIGHT).unwrap();

    match doc.insert_text("x", 3, 0.0, 0.0, Align::Left) {
        Err(PdfError::InvalidPage(3, 1)) => {}
        other => panic!("expected InvalidPage, got {other:?}"),
    }
}

#[test]
fn test_inspect_document_without_form() {
    let inspection = inspect_form_fields(&create_test_pdf_with_pages(1));
    assert!(!inspection.has_fields);
    assert_eq!(inspection.count, 0);
    assert!(inspection.fields.is_empty());
    assert_eq!(inspection.error, None);
}

#[test]
fn test_inspect_inherits_field_type() {
    let inspection = inspect_form_fields(&create_form_pdf(&["nom_prenom", "adresse"]));
    assert_eq!(inspection.count, 2);

    let names: Vec<&str> = inspection.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["nom_prenom", "adresse"]);
    assert!(inspection.fields.iter().all(|f| f.field_type == "Tx"));
}

#[test]
fn test_fill_then_inspect() {
    let pdf = create_form_pdf(&["nom_prenom", "adresse", "mail"]);
    let filled = fill_form_fields(&pdf, |name| match name {
        "nom_prenom" => Some("Jean Dupont".to_string()),
        "mail" => Some("jean@example.com".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(filled.matched.len(), 2);

    let inspection = inspect_form_fields(&filled.pdf);
    let values: Vec<&str> = inspection.fields.iter().map(|f| f.value.as_str()).collect();
    assert_eq!(values, vec!["Jean Dupont", "", "jean@example.com"]);
}

#[test]
fn test_fill_document_without_form() {
    let filled = fill_form_fields(&create_test_pdf_with_pages(1), |_| {
        Some("ignored".to_string())
    })
    .unwrap();
    assert!(filled.matched.is_empty());
    assert!(Document::load_mem(&filled.pdf).is_ok());
}

#[test]
fn test_merge_keeps_all_pages_of_original() {
    let mut overlay = PdfDocument::blank(A4_WIDTH, A4_HEIGHT).unwrap();
    overlay
        .insert_text("AB-123-CD", 1, 305.0, 324.0, Align::Left)
        .unwrap();
    let overlay = overlay.to_bytes().unwrap();

    let merged = merge_overlay(&create_test_pdf_with_pages(2), &overlay).unwrap();
    let doc = Document::load_mem(&merged).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
    assert!(page_text(&merged, 1).contains(" Do"));
    assert!(!page_text(&merged, 2).contains(" Do"));
}

#[test]
fn test_merge_preserves_form_fields() {
    let template = create_form_pdf(&["nom_prenom"]);
    let overlay = PdfDocument::blank(A4_WIDTH, A4_HEIGHT)
        .unwrap()
        .to_bytes()
        .unwrap();

    let merged = merge_overlay(&template, &overlay).unwrap();
    assert_eq!(inspect_form_fields(&merged).count, 1);
}

#[test]
fn test_merge_requires_pages() {
    let one_page = create_test_pdf_with_pages(1);

    assert!(matches!(
        merge_overlay(&create_pageless_pdf(), &one_page),
        Err(PdfError::NoPages)
    ));
    assert!(matches!(
        merge_overlay(&one_page, &create_pageless_pdf()),
        Err(PdfError::NoPages)
    ));
}
