#[cfg(test)]
#[path = "pptx_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

use super::IngestError;
use super::xml::{decode_entities, open_archive, read_entry};

const SLIDES_DIR: &str = "ppt/slides/";

// The opening tag may carry attributes but must not close itself.
static TEXT_RUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<a:t(?:\s[^>]*[^/>])?\s*>(.*?)</a:t>").expect("valid text run regex")
});

/// Extracts the text of every slide of a presentation, in archive order,
/// slides separated by a blank line.
pub fn extract_text(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive = open_archive(bytes)?;

    let mut text = String::new();
    for idx in 0..archive.len() {
        let name = archive.name_for_index(idx).unwrap_or_default();
        if !is_slide(name) {
            continue;
        }
        log::trace!("Reading slide {}", name);

        let xml = read_entry(&mut archive, idx)?;
        text.push_str(&slide_text(&xml));
        text.push_str("\n\n");
    }

    Ok(text.trim().to_string())
}

fn is_slide(name: &str) -> bool {
    name.strip_prefix(SLIDES_DIR)
        .is_some_and(|rel| rel.starts_with("slide") && rel.ends_with(".xml"))
}

/// Joins the text runs of a slide with single spaces. This is a tolerant
/// scan, the XML is never fully parsed.
fn slide_text(xml: &str) -> String {
    TEXT_RUN_RE
        .captures_iter(xml)
        .map(|caps| decode_entities(&caps[1]).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
