//! End-to-end tests: raw upstream record to filled PDF

use cerfa::aliases::aliases;
use cerfa::{
    fill_named_fields, format_cp_ville, map_record, parse_cp_ville, raw_records, render_overlay,
    ApplicantRecord, CerfaFiller, FillMethod, FillStrategy, Layout, RawInboundRecord, Slot,
};
use chrono::NaiveDate;
use lopdf::{dictionary, Document, Object, Stream};
use pdf_core::{encode_win_ansi_hex, inspect_form_fields, merge_overlay};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn jean_dupont() -> RawInboundRecord {
    json!({
        "Nom prenom": "Jean Dupont",
        "Adresse": "1 rue de la Paix",
        "CP VILLE": "75001 Paris",
        "Marque modele": "Peugeot 208",
        "Immatriculation ": "AB-123-CD"
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

fn page_content(bytes: &[u8], page: u32) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().get(&page).unwrap();
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

/// Text drawn anywhere in the document: page streams plus form XObjects
fn all_drawn_text(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let mut text = String::new();
    for object in doc.objects.values() {
        if let Object::Stream(stream) = object {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            text.push_str(&String::from_utf8_lossy(&data));
            text.push('\n');
        }
    }
    text
}

/// A plain PDF with `pages` A4 pages and a marker string on each
fn template_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for i in 0..pages {
        let content = format!("BT /F1 12 Tf 50 800 Td (Page {}) Tj ET", i + 1);
        let contents_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => contents_id,
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// One-page PDF with a text field per name
fn form_pdf(names: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let mut fields = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let y = 700 - (i as i64) * 30;
        let field_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal(*name),
            "Rect" => vec![100.into(), y.into(), 400.into(), (y + 20).into()],
        });
        fields.push(Object::Reference(field_id));
    }
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Annots" => fields.clone(),
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
    let acro_form_id = doc.add_object(dictionary! { "Fields" => fields });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acro_form_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn filler(strategy: FillStrategy) -> CerfaFiller {
    CerfaFiller::new(Layout::cerfa_13757().unwrap(), strategy)
}

#[test]
fn test_jean_dupont_mapping() {
    let record = map_record(&jean_dupont());

    assert_eq!(record.nom_prenom.as_deref(), Some("Jean Dupont"));
    assert_eq!(record.adresse.as_deref(), Some("1 rue de la Paix"));
    assert_eq!(record.cp_ville.as_deref(), Some("75001 Paris"));
    assert_eq!(record.marque_modele.as_deref(), Some("Peugeot 208"));
    assert_eq!(record.immatriculation.as_deref(), Some("AB-123-CD"));
    assert_eq!(parse_cp_ville(record.cp_ville.as_deref().unwrap()), ("75001", "Paris"));
    for slot in [Slot::Mail, Slot::Telephone, Slot::DateNaissance, Slot::NumeroFormule] {
        assert_eq!(record.get(slot), None);
    }
}

#[test]
fn test_jean_dupont_overlay() {
    let layout = Layout::cerfa_13757().unwrap();
    let record = map_record(&jean_dupont());
    let content = page_content(&render_overlay(&record, &layout, today()).unwrap(), 1);

    for (text, position) in [
        ("Jean Dupont", "268 684 Td"),
        ("1 rue de la Paix", "443 633 Td"),
        ("75001 Paris", "287 591 Td"),
        ("Peugeot 208", "243 420 Td"),
        ("AB-123-CD", "305 324 Td"),
    ] {
        assert!(content.contains(position), "nothing drawn at {position}");
        assert!(content.contains(&format!("{} Tj", encode_win_ansi_hex(text))));
    }
    for absent in ["200 610 Td", "200 570 Td", "200 650 Td", "350 650 Td", "200 340 Td"] {
        assert!(!content.contains(absent), "unexpected text at {absent}");
    }
    assert_eq!(content.matches(" Tj").count(), 5);
}

#[test]
fn test_empty_record_keeps_page_count() {
    let layout = Layout::cerfa_13757().unwrap();
    let overlay = render_overlay(&ApplicantRecord::default(), &layout, today()).unwrap();
    assert_eq!(page_count(&overlay), 1);

    let template = template_pdf(3);
    let merged = merge_overlay(&template, &overlay).unwrap();
    assert_eq!(page_count(&merged), 3);
}

#[test]
fn test_merging_empty_overlay_twice_is_stable() {
    let layout = Layout::cerfa_13757().unwrap();
    let overlay = render_overlay(&ApplicantRecord::default(), &layout, today()).unwrap();
    let template = template_pdf(2);

    let once = merge_overlay(&template, &overlay).unwrap();
    let twice = merge_overlay(&once, &overlay).unwrap();

    assert_eq!(page_count(&once), page_count(&template));
    assert_eq!(page_count(&twice), page_count(&template));
    for page in 1..=2 {
        assert!(page_content(&twice, page).contains(&format!("(Page {page}) Tj")));
    }
    assert_eq!(page_content(&once, 2), page_content(&twice, 2));
}

#[test]
fn test_always_overlay_ignores_form_fields() {
    let record = map_record(&jean_dupont());
    let outcome = filler(FillStrategy::AlwaysOverlay)
        .fill_on(Some(form_pdf(&["nom_prenom"]).as_slice()), &record, today())
        .unwrap();

    assert_eq!(outcome.method, FillMethod::Overlay);
    let inspection = inspect_form_fields(&outcome.pdf);
    assert_eq!(inspection.fields[0].value, "");
}

#[test]
fn test_prefer_native_fields_fills_matching_names() {
    let record = map_record(&jean_dupont());
    let pdf = form_pdf(&["nom_prenom", "Immatriculation", "Marque modèle", "signature"]);
    let outcome = filler(FillStrategy::PreferNativeFields)
        .fill_on(Some(pdf.as_slice()), &record, today())
        .unwrap();

    assert_eq!(outcome.method, FillMethod::NativeFields);
    let values: Vec<String> = inspect_form_fields(&outcome.pdf)
        .fields
        .into_iter()
        .map(|f| f.value)
        .collect();
    assert_eq!(
        values,
        vec![
            "Jean Dupont".to_string(),
            "AB-123-CD".to_string(),
            "Peugeot 208".to_string(),
            String::new(),
        ]
    );
}

#[test]
fn test_prefer_native_fields_without_form_uses_overlay() {
    let record = map_record(&jean_dupont());
    let outcome = filler(FillStrategy::PreferNativeFields)
        .fill_on(Some(template_pdf(1).as_slice()), &record, today())
        .unwrap();

    assert_eq!(outcome.method, FillMethod::Overlay);
    assert!(all_drawn_text(&outcome.pdf).contains(&encode_win_ansi_hex("Jean Dupont")));
}

#[test]
fn test_unmatched_fields_fall_back_to_overlay() {
    let record = map_record(&jean_dupont());
    let layout = Layout::cerfa_13757().unwrap();
    let pdf = form_pdf(&["champ_1", "champ_2"]);

    let outcome = fill_named_fields(&pdf, &record, &layout, today()).unwrap();
    assert_eq!(outcome.method, FillMethod::Overlay);
    assert_eq!(page_count(&outcome.pdf), 1);
    assert!(all_drawn_text(&outcome.pdf).contains(&encode_win_ansi_hex("AB-123-CD")));
}

#[test]
fn test_absent_slots_do_not_count_as_matches() {
    let record = map_record(&jean_dupont());
    let outcome = filler(FillStrategy::NativeWithFallback)
        .fill_on(Some(form_pdf(&["mail", "telephone"]).as_slice()), &record, today())
        .unwrap();
    assert_eq!(outcome.method, FillMethod::Overlay);
}

#[test]
fn test_generated_template_when_nothing_uploaded() {
    let record = map_record(&jean_dupont());
    let outcome = filler(FillStrategy::AlwaysOverlay)
        .fill_on(None, &record, today())
        .unwrap();

    assert_eq!(page_count(&outcome.pdf), 1);
    let drawn = all_drawn_text(&outcome.pdf);
    assert!(drawn.contains(&encode_win_ansi_hex("Jean Dupont")));
    assert!(drawn.contains(&encode_win_ansi_hex("Mandat d'immatriculation - CERFA 13757*03")));
}

#[test]
fn test_configured_template_is_used() {
    let record = map_record(&jean_dupont());
    let outcome = filler(FillStrategy::AlwaysOverlay)
        .with_template(template_pdf(2))
        .fill_on(None, &record, today())
        .unwrap();
    assert_eq!(page_count(&outcome.pdf), 2);
}

#[test]
fn test_invalid_upload_is_render_error() {
    let result = filler(FillStrategy::AlwaysOverlay).fill_on(
        Some(b"not a pdf".as_slice()),
        &ApplicantRecord::default(),
        today(),
    );
    assert!(matches!(result, Err(cerfa::CerfaError::RenderError(_))));
}

#[test]
fn test_every_record_of_an_array_maps() {
    let records = raw_records(json!([
        {"Nom prenom": "Jean Dupont"},
        {"Nom prenom": "Marie Curie", "Mail": "marie@example.com"}
    ]))
    .unwrap();
    let mapped: Vec<ApplicantRecord> = records.iter().map(map_record).collect();

    assert_eq!(mapped.len(), 2);
    assert_eq!(mapped[1].mail.as_deref(), Some("marie@example.com"));
}

fn every_alias() -> Vec<&'static str> {
    Slot::ALL
        .into_iter()
        .flat_map(|slot| aliases(slot).iter().copied())
        .collect()
}

fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        ".{0,12}".prop_map(Value::String),
        Just(json!(["nested"])),
        Just(json!({"nested": true})),
    ]
}

fn raw_record() -> impl Strategy<Value = RawInboundRecord> {
    let keys = prop_oneof![
        proptest::sample::select(every_alias()).prop_map(str::to_string),
        "[A-Za-z ]{1,10}",
    ];
    proptest::collection::btree_map(keys, json_scalar(), 0..16)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_map_is_total_and_faithful(raw in raw_record()) {
        let record = map_record(&raw);
        for slot in Slot::ALL {
            let source = aliases(slot).iter().find_map(|key| raw.get(*key));
            let expected = match source {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Bool(b)) => Some(b.to_string()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            prop_assert_eq!(record.raw(slot).cloned(), expected);
        }
    }

    #[test]
    fn prop_cp_ville_round_trip(code in "[0-9A-Z]{1,6}", city in "([A-Za-zéè-]+( [A-Za-zéè-]+)*)?") {
        let joined = format_cp_ville(&code, &city);
        prop_assert_eq!(parse_cp_ville(&joined), (code.as_str(), city.as_str()));
    }
}
