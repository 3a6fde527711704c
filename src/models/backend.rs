use serde::{Deserialize, Serialize};

/// One incremental piece of a streamed answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub text: Option<String>,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self { text: None }
    }

    /// The fragment's text when it carries any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One unit of a request payload. Serializes to the shape the
/// generateContent API expects: `{"text": ..}` or `{"inlineData": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentPart {
    Text(String),
    InlineData(InlineData),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        ContentPart::InlineData(InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(text) => Some(text),
            ContentPart::InlineData(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackendPrompt {
    model: Option<String>,
    parts: Vec<ContentPart>,
}

impl BackendPrompt {
    pub fn new(parts: Vec<ContentPart>) -> BackendPrompt {
        BackendPrompt { model: None, parts }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn parts(&self) -> &[ContentPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<ContentPart> {
        self.parts
    }
}
