use super::*;
use crate::ingest::test_helpers::{build_archive, slide_xml};

#[test]
fn test_extract_two_slides() {
    let slide1 = slide_xml(&["A"]);
    let slide2 = slide_xml(&["B"]);
    let bytes = build_archive(&[
        ("ppt/slides/slide1.xml", &slide1),
        ("ppt/slides/slide2.xml", &slide2),
    ]);

    assert_eq!(extract_text(&bytes).unwrap(), "A\n\nB");
}

#[test]
fn test_runs_joined_with_spaces() {
    let slide = slide_xml(&["Quarterly", "results", "&amp; outlook"]);
    let bytes = build_archive(&[("ppt/slides/slide1.xml", &slide)]);

    assert_eq!(extract_text(&bytes).unwrap(), "Quarterly results & outlook");
}

#[test]
fn test_archive_order_is_kept() {
    let slide1 = slide_xml(&["first"]);
    let slide10 = slide_xml(&["tenth"]);
    let slide2 = slide_xml(&["second"]);
    let bytes = build_archive(&[
        ("ppt/slides/slide10.xml", &slide10),
        ("ppt/slides/slide1.xml", &slide1),
        ("ppt/slides/slide2.xml", &slide2),
    ]);

    assert_eq!(extract_text(&bytes).unwrap(), "tenth\n\nfirst\n\nsecond");
}

#[test]
fn test_non_slide_entries_are_skipped() {
    let slide = slide_xml(&["Body"]);
    let layout = slide_xml(&["Layout"]);
    let notes = slide_xml(&["Notes"]);
    let bytes = build_archive(&[
        ("ppt/slideLayouts/slideLayout1.xml", &layout),
        ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
        ("ppt/notesSlides/notesSlide1.xml", &notes),
        ("ppt/slides/slide1.xml", &slide),
    ]);

    assert_eq!(extract_text(&bytes).unwrap(), "Body");
}

#[test]
fn test_text_run_with_attributes() {
    let xml = r#"<a:p><a:r><a:t xml:space="preserve">  spaced </a:t></a:r><a:r><a:tab/></a:r><a:r><a:t>end</a:t></a:r></a:p>"#;
    assert_eq!(slide_text(xml), "  spaced  end");
}

#[test]
fn test_self_closing_text_run_is_empty() {
    let xml = r#"<a:p><a:r><a:t xml:space="preserve"/></a:r></a:p><a:p><a:r><a:rPr b="1"/><a:t>Title</a:t></a:r><a:r><a:t >Sub</a:t></a:r></a:p>"#;
    assert_eq!(slide_text(xml), "Title Sub");
}

#[test]
fn test_is_slide() {
    assert!(is_slide("ppt/slides/slide1.xml"));
    assert!(!is_slide("ppt/slides/"));
    assert!(!is_slide("ppt/slides/_rels/slide1.xml.rels"));
    assert!(!is_slide("ppt/slideMasters/slideMaster1.xml"));
    assert!(!is_slide("slide1.xml"));
}

#[test]
fn test_corrupt_archive() {
    let err = extract_text(b"definitely not a zip").unwrap_err();
    assert!(matches!(err, IngestError::Archive(_)));
}
