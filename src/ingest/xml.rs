use std::borrow::Cow;
use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use zip::ZipArchive;

use super::IngestError;

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("valid entity regex")
});

pub(crate) type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub(crate) fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, IngestError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

pub(crate) fn read_entry(archive: &mut Archive<'_>, idx: usize) -> Result<String, IngestError> {
    let mut entry = archive.by_index(idx)?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Replaces the predefined XML entities and numeric character references.
/// Unknown or malformed references are left as they are.
pub(crate) fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(text, |caps: &Captures| {
        let entity = &caps[1];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                let code = match entity.strip_prefix("#x") {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => entity.trim_start_matches('#').parse::<u32>().ok(),
                };
                code.and_then(char::from_u32)
            }
        };
        match decoded {
            Some(ch) => ch.to_string(),
            None => caps[0].to_string(),
        }
    })
}
