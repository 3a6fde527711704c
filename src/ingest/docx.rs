#[cfg(test)]
#[path = "docx_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

use super::IngestError;
use super::xml::{decode_entities, open_archive, read_entry};

const DOCUMENT_PART: &str = "word/document.xml";

// Self-closing paragraphs come first so they never open a match that runs
// into the next paragraph.
static PARAGRAPH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>(.*?)</w:p>")
        .expect("valid paragraph regex")
});

static RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*[^/>])?\s*>(.*?)</w:t>|<w:tab\s*/>|<w:(?:br|cr)(?:\s[^>]*)?/>")
        .expect("valid run regex")
});

/// Extracts the body text of a word processing document. Paragraphs are
/// separated by a blank line.
pub fn extract_text(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive = open_archive(bytes)?;
    let idx = archive
        .index_for_name(DOCUMENT_PART)
        .ok_or_else(|| IngestError::MissingPart(DOCUMENT_PART.to_string()))?;
    let xml = read_entry(&mut archive, idx)?;

    let paragraphs = PARAGRAPH_RE
        .captures_iter(&xml)
        .map(|caps| caps.get(1).map(|body| paragraph_text(body.as_str())).unwrap_or_default())
        .collect::<Vec<_>>();

    Ok(paragraphs.join("\n\n").trim().to_string())
}

fn paragraph_text(body: &str) -> String {
    let mut text = String::new();
    for caps in RUN_RE.captures_iter(body) {
        match caps.get(1) {
            Some(run) => text.push_str(&decode_entities(run.as_str())),
            None if caps[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text
}
