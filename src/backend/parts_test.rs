use super::*;

#[test]
fn test_build_parts_without_files() {
    let parts = build_parts(&[], "What is this?");
    assert_eq!(parts, vec![ContentPart::text("What is this?")]);
}

#[test]
fn test_build_parts_order_and_shape() {
    let files = vec![
        UploadedFile::binary("chart.png", "image/png", "iVBORw0KGgo="),
        UploadedFile::extracted("deck.pptx", crate::ingest::PPTX_MIME, "A\n\nB"),
        UploadedFile::binary("paper.pdf", "application/pdf", "JVBERi0="),
    ];

    let parts = build_parts(&files, "Compare them");

    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], ContentPart::inline_data("image/png", "iVBORw0KGgo="));
    assert_eq!(
        parts[1].as_text(),
        Some("Content from file \"deck.pptx\":\n\nA\n\nB")
    );
    assert_eq!(parts[2], ContentPart::inline_data("application/pdf", "JVBERi0="));
    assert_eq!(parts[3].as_text(), Some("Compare them"));
}

#[test]
fn test_parts_wire_format() {
    let files = vec![
        UploadedFile::binary("a.png", "image/png", "AA=="),
        UploadedFile::extracted("b.docx", crate::ingest::DOCX_MIME, "hi"),
    ];
    let value = serde_json::to_value(build_parts(&files, "go")).unwrap();

    assert_eq!(
        value,
        serde_json::json!([
            {"inlineData": {"mimeType": "image/png", "data": "AA=="}},
            {"text": "Content from file \"b.docx\":\n\nhi"},
            {"text": "go"}
        ])
    );
}
