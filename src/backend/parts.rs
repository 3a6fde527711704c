#[cfg(test)]
#[path = "parts_test.rs"]
mod tests;

use crate::models::{ContentPart, UploadedFile};

/// Turns the files of a turn and its prompt into request parts: one part per
/// file, in order, then the prompt.
pub fn build_parts(files: &[UploadedFile], prompt: &str) -> Vec<ContentPart> {
    let mut parts = files.iter().map(file_part).collect::<Vec<_>>();
    parts.push(ContentPart::text(prompt));
    parts
}

fn file_part(file: &UploadedFile) -> ContentPart {
    match file.extracted_text() {
        Some(text) => ContentPart::text(format!(
            "Content from file \"{}\":\n\n{}",
            file.name(),
            text
        )),
        None => ContentPart::inline_data(file.mime_type(), file.raw_bytes_base64()),
    }
}
