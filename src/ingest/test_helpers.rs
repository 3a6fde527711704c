use std::io::{Cursor, Write};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Builds a zip archive holding the given entries, in order.
pub(crate) fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub(crate) fn slide_xml(runs: &[&str]) -> String {
    let runs = runs
        .iter()
        .map(|run| format!(r#"<a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r>"#, run))
        .collect::<String>();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p>{}</a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
        runs
    )
}

pub(crate) fn document_xml(paragraphs: &[&str]) -> String {
    let body = paragraphs
        .iter()
        .map(|text| format!(r#"<w:p><w:pPr><w:pStyle w:val="Normal"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text))
        .collect::<String>();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        body
    )
}

pub(crate) fn pptx_bytes(slides: &[&[&str]]) -> Vec<u8> {
    let xmls = slides.iter().map(|runs| slide_xml(runs)).collect::<Vec<_>>();
    let names = (1..=slides.len())
        .map(|idx| format!("ppt/slides/slide{}.xml", idx))
        .collect::<Vec<_>>();
    let mut entries = vec![("[Content_Types].xml", "<Types/>")];
    entries.extend(names.iter().map(String::as_str).zip(xmls.iter().map(String::as_str)));
    build_archive(&entries)
}

pub(crate) fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let xml = document_xml(paragraphs);
    build_archive(&[("[Content_Types].xml", "<Types/>"), ("word/document.xml", &xml)])
}
