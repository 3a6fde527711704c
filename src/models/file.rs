use serde::{Deserialize, Serialize};

/// A document attached to a conversation, normalized by the ingestion
/// pipeline. The payload is either the base64 encoded bytes or the text
/// extracted from the document, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    name: String,
    /// MIME type of the original upload, even when the payload is text.
    mime_type: String,
    #[serde(default)]
    raw_bytes_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extracted_text: Option<String>,
}

impl UploadedFile {
    pub fn binary(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        raw_bytes_base64: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            raw_bytes_base64: raw_bytes_base64.into(),
            extracted_text: None,
        }
    }

    pub fn extracted(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            raw_bytes_base64: String::new(),
            extracted_text: Some(text.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn raw_bytes_base64(&self) -> &str {
        &self.raw_bytes_base64
    }

    /// Extracted text, if any was produced.
    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref().filter(|text| !text.is_empty())
    }
}
