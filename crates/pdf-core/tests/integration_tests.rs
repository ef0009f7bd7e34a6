//! Integration tests for pdf-core
//!
//! These tests verify end-to-end functionality with real PDF operations.

use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, ObjectId};
use pdf_core::{Color, PdfDocument, PdfError, SourcePdf, StandardFont};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Create a minimal valid PDF with the given number of A4 pages
///
/// `page_content` is written into every page's content stream and
/// `page_fonts` becomes the page's existing `/Font` resource dictionary.
fn create_test_pdf_with(page_count: usize, page_content: &[u8], page_fonts: lopdf::Dictionary) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for _ in 0..page_count {
        let contents_id = doc.add_object(lopdf::Stream::new(
            dictionary! {},
            page_content.to_vec(),
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
            "Resources" => dictionary! { "Font" => page_fonts.clone() },
            "Contents" => contents_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_count as i64,
            "Kids" => page_ids.into_iter().map(Object::from).collect::<Vec<_>>(),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn create_test_pdf_with_pages(page_count: usize) -> Vec<u8> {
    create_test_pdf_with(page_count, b"", dictionary! {})
}

fn create_test_pdf() -> Vec<u8> {
    create_test_pdf_with_pages(1)
}

fn open(data: &[u8]) -> PdfDocument {
    SourcePdf::from_bytes(data).expect("Failed to open PDF").instantiate()
}

/// A `Tj` found in a page's content, with the state that was active for it
#[derive(Debug, PartialEq)]
struct ShownText {
    font_resource: String,
    font_size: f64,
    x: f64,
    y: f64,
    bytes: Vec<u8>,
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => *r as f64,
        other => panic!("expected a number, found {other:?}"),
    }
}

fn page_id(doc: &Document, page: u32) -> ObjectId {
    *doc.get_pages().get(&page).expect("page exists")
}

fn shown_text(doc: &Document, page: u32) -> Vec<ShownText> {
    let data = doc.get_page_content(page_id(doc, page)).unwrap();
    let content = Content::decode(&data).unwrap();

    let mut result = Vec::new();
    let mut font = (String::new(), 0.0);
    let mut position = (0.0, 0.0);
    for op in content.operations {
        match op.operator.as_str() {
            "Tf" => {
                let name = op.operands[0].as_name().unwrap();
                font = (String::from_utf8_lossy(name).into_owned(), number(&op.operands[1]));
            }
            "Td" => position = (number(&op.operands[0]), number(&op.operands[1])),
            "Tj" => {
                let bytes = match &op.operands[0] {
                    Object::String(bytes, _) => bytes.clone(),
                    other => panic!("expected a string, found {other:?}"),
                };
                result.push(ShownText {
                    font_resource: font.0.clone(),
                    font_size: font.1,
                    x: position.0,
                    y: position.1,
                    bytes,
                });
            }
            _ => {}
        }
    }
    result
}

fn font_resource(doc: &Document, page: u32, name: &str) -> Object {
    let page_dict = doc.get_object(page_id(doc, page)).unwrap().as_dict().unwrap();
    let resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap();
    let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
    fonts.get(name.as_bytes()).unwrap().clone()
}

#[test]
fn test_instantiate_save_roundtrip() {
    let pdf_data = create_test_pdf();

    let mut doc = open(&pdf_data);
    assert_eq!(doc.page_count(), 1);

    let saved_data = doc.to_bytes().expect("Failed to save PDF");

    let doc2 = open(&saved_data);
    assert_eq!(doc2.page_count(), 1);
}

#[test]
fn test_open_invalid_bytes() {
    let result = SourcePdf::from_bytes(b"definitely not a pdf");
    assert!(matches!(result, Err(PdfError::OpenError(_))));
}

#[test]
fn test_insert_text_basic() {
    let pdf_data = create_test_pdf();

    let mut doc = open(&pdf_data);
    doc.set_font(StandardFont::Helvetica, 10.0)
        .expect("Failed to set font");
    doc.insert_text("Jane Doe", 1, 120.0, 250.0)
        .expect("Failed to insert text");

    let saved = Document::load_mem(&doc.to_bytes().unwrap()).unwrap();

    assert_eq!(
        shown_text(&saved, 1),
        vec![ShownText {
            font_resource: "FF1".to_string(),
            font_size: 10.0,
            x: 120.0,
            y: 250.0,
            bytes: b"Jane Doe".to_vec(),
        }]
    );

    let font_ref = font_resource(&saved, 1, "FF1").as_reference().unwrap();
    let font_dict = saved.get_object(font_ref).unwrap().as_dict().unwrap();
    assert_eq!(
        font_dict.get(b"BaseFont").unwrap().as_name().unwrap(),
        b"Helvetica"
    );
}

#[test]
fn test_multiple_fonts_share_page() {
    let pdf_data = create_test_pdf();

    let mut doc = open(&pdf_data);

    doc.set_font(StandardFont::Courier, 12.0).unwrap();
    doc.insert_text("Font 1", 1, 100.0, 700.0).unwrap();

    doc.set_font(StandardFont::TimesBold, 14.0).unwrap();
    doc.insert_text("Font 2", 1, 100.0, 680.0).unwrap();

    let saved = Document::load_mem(&doc.to_bytes().unwrap()).unwrap();
    let shown = shown_text(&saved, 1);

    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].font_size, 12.0);
    assert_eq!(shown[1].font_size, 14.0);
    assert_ne!(shown[0].font_resource, shown[1].font_resource);
}

#[test]
fn test_text_on_multiple_pages() {
    let buffer = create_test_pdf_with_pages(2);

    let mut doc = open(&buffer);
    assert_eq!(doc.page_count(), 2);

    doc.insert_text("Page 1", 1, 100.0, 700.0).unwrap();
    doc.insert_text("Page 2", 2, 100.0, 700.0).unwrap();

    let saved = Document::load_mem(&doc.to_bytes().unwrap()).unwrap();

    assert_eq!(shown_text(&saved, 1)[0].bytes, b"Page 1".to_vec());
    assert_eq!(shown_text(&saved, 2)[0].bytes, b"Page 2".to_vec());
}

#[test]
fn test_empty_text_draws_nothing() {
    let pdf_data = create_test_pdf();

    let mut doc = open(&pdf_data);
    doc.insert_text("", 1, 100.0, 700.0)
        .expect("Failed to insert empty text");

    let saved = Document::load_mem(&doc.to_bytes().unwrap()).unwrap();
    assert!(shown_text(&saved, 1).is_empty());
}

#[rstest]
#[case(0)]
#[case(2)]
#[case(999)]
fn test_invalid_page_number(#[case] page: usize) {
    let pdf_data = create_test_pdf();

    let mut doc = open(&pdf_data);

    match doc.insert_text("Test", page, 100.0, 700.0) {
        Err(PdfError::InvalidPage(p, total)) => {
            assert_eq!(p, page);
            assert_eq!(total, 1);
        }
        other => panic!("Expected InvalidPage error, got {other:?}"),
    }
}

#[test]
fn test_existing_font_resource_is_kept() {
    let existing_font_id = (900, 0);
    let pdf_data = create_test_pdf_with(
        1,
        b"BT /FF1 12 Tf 10 10 Td (old) Tj ET",
        dictionary! { "FF1" => Object::Reference(existing_font_id) },
    );

    let mut doc = open(&pdf_data);
    doc.insert_text("new", 1, 50.0, 60.0).unwrap();
    let saved = Document::load_mem(&doc.to_bytes().unwrap()).unwrap();

    assert_eq!(
        font_resource(&saved, 1, "FF1"),
        Object::Reference(existing_font_id)
    );

    let shown = shown_text(&saved, 1);
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].bytes, b"old".to_vec());
    assert_eq!(shown[1].font_resource, "FF2");
    assert_eq!(shown[1].bytes, b"new".to_vec());
}

#[test]
fn test_existing_content_is_isolated() {
    let pdf_data = create_test_pdf_with(1, b"2 0 0 2 0 0 cm", dictionary! {});

    let mut doc = open(&pdf_data);
    doc.insert_text("X", 1, 10.0, 10.0).unwrap();
    let saved = Document::load_mem(&doc.to_bytes().unwrap()).unwrap();

    let data = saved.get_page_content(page_id(&saved, 1)).unwrap();
    let operators: Vec<String> = Content::decode(&data)
        .unwrap()
        .operations
        .into_iter()
        .map(|op| op.operator)
        .collect();

    let cm = operators.iter().position(|op| op == "cm").unwrap();
    let save = operators.iter().position(|op| op == "q").unwrap();
    let restore = operators.iter().position(|op| op == "Q").unwrap();
    let begin_text = operators.iter().position(|op| op == "BT").unwrap();
    assert!(save < cm && cm < restore && restore < begin_text);
}

#[test]
fn test_text_color() {
    let pdf_data = create_test_pdf();

    let mut doc = open(&pdf_data);
    doc.set_text_color(Color::rgb(0.0, 0.0, 1.0));
    doc.insert_text("blue", 1, 10.0, 10.0).unwrap();
    let saved = Document::load_mem(&doc.to_bytes().unwrap()).unwrap();

    let data = saved.get_page_content(page_id(&saved, 1)).unwrap();
    let content = Content::decode(&data).unwrap();
    let rg = content
        .operations
        .iter()
        .find(|op| op.operator == "rg")
        .expect("color operator");
    let components: Vec<f64> = rg.operands.iter().map(number).collect();
    assert_eq!(components, vec![0.0, 0.0, 1.0]);
}

#[test]
fn test_source_is_not_mutated_by_copies() {
    let source = SourcePdf::from_bytes(&create_test_pdf()).unwrap();
    let objects_before = source.inner().objects.len();

    let mut first = source.instantiate();
    first.insert_text("one", 1, 10.0, 10.0).unwrap();
    first.to_bytes().unwrap();

    assert_eq!(source.inner().objects.len(), objects_before);

    let mut second = source.instantiate();
    let saved = Document::load_mem(&second.to_bytes().unwrap()).unwrap();
    assert!(shown_text(&saved, 1).is_empty());
}

#[test]
fn test_identical_input_gives_identical_bytes() {
    let source = SourcePdf::from_bytes(&create_test_pdf_with_pages(2)).unwrap();

    let render = || {
        let mut doc = source.instantiate();
        doc.set_font(StandardFont::HelveticaBold, 9.0).unwrap();
        doc.insert_text("Total", 2, 400.0, 120.5).unwrap();
        doc.set_font(StandardFont::Courier, 11.0).unwrap();
        doc.insert_text("1,234.50", 1, 72.0, 700.0).unwrap();
        doc.to_bytes().unwrap()
    };

    assert_eq!(render(), render());
}

#[test]
fn test_save_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");

    let mut doc = open(&create_test_pdf());
    doc.insert_text("saved", 1, 10.0, 10.0).unwrap();
    std::fs::write(&path, doc.to_bytes().unwrap()).unwrap();

    let reopened = SourcePdf::open(&path).unwrap();
    assert_eq!(reopened.page_count(), 1);
    assert_eq!(shown_text(reopened.inner(), 1)[0].bytes, b"saved".to_vec());
}
