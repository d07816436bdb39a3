//! Opening real PDF files and cutting page-range artifacts from them

use book_chunker::materialize::ArtifactRequest;
use book_chunker::{ArtifactStore, ChunkerError, DocumentSource, PageRangePdfWriter, PdfDocument};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::path::Path;

fn write_pdf(path: &Path, pages: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn test_open_pdf_without_outline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.pdf");
    write_pdf(&path, &["first page", "second page", "third page", "fourth page"]);

    let pdf = PdfDocument::open(&path).unwrap();
    assert_eq!(pdf.total_pages(), 4);
    assert!(pdf.outline().is_empty());
    assert_eq!(pdf.source_path(), Some(path.as_path()));
    assert!(pdf.page_text(5).is_err());
}

#[test]
fn test_page_range_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source.pdf");
    write_pdf(&path, &["one", "two", "three", "four", "five"]);
    let pdf = PdfDocument::open(&path).unwrap();

    let mut writer = PageRangePdfWriter::new(pdf.bytes(), dir.path().join("mini_pdfs"));
    writer.init().unwrap();
    let artifact = writer
        .store(&ArtifactRequest {
            book_id: "source",
            start_page: 2,
            end_page: 3,
            text_end_page: 4,
        })
        .unwrap()
        .unwrap();
    writer.close().unwrap();

    assert_eq!(artifact.name, "source_2_3.pdf");
    let cut = Document::load(&artifact.location).unwrap();
    assert_eq!(cut.get_pages().len(), 3);

    let out_of_range = writer.store(&ArtifactRequest {
        book_id: "source",
        start_page: 4,
        end_page: 5,
        text_end_page: 6,
    });
    assert!(matches!(out_of_range, Err(ChunkerError::Artifact(_))));
}
