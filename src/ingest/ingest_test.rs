use super::*;
use crate::ingest::test_helpers::{build_archive, docx_bytes, pptx_bytes};

#[test]
fn test_file_kind_from_mime() {
    assert_eq!(FileKind::from_mime(DOCX_MIME), FileKind::DocxText);
    assert_eq!(FileKind::from_mime(PPTX_MIME), FileKind::PptxText);
    assert_eq!(
        FileKind::from_mime(&format!("{}; charset=binary", PPTX_MIME.to_uppercase())),
        FileKind::PptxText
    );
    assert_eq!(FileKind::from_mime("application/pdf"), FileKind::Binary);
    assert_eq!(FileKind::from_mime("image/png"), FileKind::Binary);
    assert_eq!(FileKind::from_mime(""), FileKind::Binary);
    // Legacy office formats are not zip containers.
    assert_eq!(FileKind::from_mime("application/msword"), FileKind::Binary);
}

#[test]
fn test_process_binary_file() {
    let raw = RawFile::new("notes.txt", "text/plain", b"hello".to_vec());
    let file = process_file(&raw).unwrap();

    assert_eq!(file.name(), "notes.txt");
    assert_eq!(file.mime_type(), "text/plain");
    assert_eq!(file.raw_bytes_base64(), "aGVsbG8=");
    assert_eq!(file.extracted_text(), None);
}

#[test]
fn test_process_pptx_keeps_original_mime() {
    let raw = RawFile::new("deck.pptx", PPTX_MIME, pptx_bytes(&[&["A"], &["B"]]));
    let file = process_file(&raw).unwrap();

    assert_eq!(file.mime_type(), PPTX_MIME);
    assert_eq!(file.extracted_text(), Some("A\n\nB"));
    assert_eq!(file.raw_bytes_base64(), "");
}

#[test]
fn test_process_docx() {
    let raw = RawFile::new("memo.docx", DOCX_MIME, docx_bytes(&["Dear team,", "Thanks."]));
    let file = process_file(&raw).unwrap();

    assert_eq!(file.mime_type(), DOCX_MIME);
    assert_eq!(file.extracted_text(), Some("Dear team,\n\nThanks."));
    assert_eq!(file.raw_bytes_base64(), "");
}

#[test]
fn test_process_empty_presentation() {
    let raw = RawFile::new(
        "empty.pptx",
        PPTX_MIME,
        build_archive(&[("ppt/presentation.xml", "<p:presentation/>")]),
    );

    assert!(matches!(process_file(&raw), Err(IngestError::NoText)));
}

#[test]
fn test_process_empty_file() {
    for mime in ["image/png", "application/pdf", DOCX_MIME] {
        let raw = RawFile::new("empty", mime, Vec::new());
        assert!(matches!(process_file(&raw), Err(IngestError::Empty)));
    }
}

#[tokio::test]
async fn test_process_files_keeps_order_and_drops_failures() {
    let files = vec![
        RawFile::new("a.png", "image/png", vec![1, 2, 3]),
        RawFile::new("broken.pptx", PPTX_MIME, b"not a zip".to_vec()),
        RawFile::new("deck.pptx", PPTX_MIME, pptx_bytes(&[&["Slide"]])),
        RawFile::new("broken.docx", DOCX_MIME, Vec::new()),
        RawFile::new("z.pdf", "application/pdf", b"%PDF-1.4".to_vec()),
    ];

    let batch = process_files(files).await;

    let names = batch.files().iter().map(|f| f.name()).collect::<Vec<_>>();
    assert_eq!(names, vec!["a.png", "deck.pptx", "z.pdf"]);
    assert_eq!(batch.dropped_count(), 2);
    assert_eq!(batch.dropped()[0].name, "broken.pptx");
    assert_eq!(batch.dropped()[1].name, "broken.docx");
    assert!(batch.dropped()[0].reason.starts_with("reading archive"));
    assert_eq!(batch.dropped()[1].reason, "file is empty");
}

#[tokio::test]
async fn test_process_files_empty_batch() {
    let batch = process_files(vec![]).await;
    assert!(batch.files().is_empty());
    assert_eq!(batch.dropped_count(), 0);
}

#[test]
fn test_mime_from_path() {
    assert_eq!(mime_from_path(Path::new("deck.PPTX")), PPTX_MIME);
    assert_eq!(mime_from_path(Path::new("/tmp/memo.docx")), DOCX_MIME);
    assert_eq!(mime_from_path(Path::new("paper.pdf")), "application/pdf");
    assert_eq!(mime_from_path(Path::new("photo.jpeg")), "image/jpeg");
    assert_eq!(mime_from_path(Path::new("README")), DEFAULT_MIME);
}

#[tokio::test]
async fn test_raw_file_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.md");
    std::fs::write(&path, "# Summary").unwrap();

    let raw = RawFile::from_path(&path).await.unwrap();
    assert_eq!(raw.name(), "summary.md");
    assert_eq!(raw.mime_type(), "text/markdown");
    assert_eq!(raw.bytes(), b"# Summary");
    assert_eq!(raw.kind(), FileKind::Binary);

    assert!(RawFile::from_path(dir.path().join("missing.pdf")).await.is_err());
}
