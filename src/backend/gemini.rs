#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use std::fmt::Display;

use crate::{
    config::{BackendConfig, constants::DEFAULT_ENDPOINT, constants::DEFAULT_MODEL, user_agent},
    models::{BackendPrompt, ContentPart, Fragment},
};
use async_trait::async_trait;
use eyre::{Context, Result};
use futures::stream::TryStreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::io::StreamReader;

use crate::backend::{Backend, FragmentStream};

pub struct Gemini {
    alias: String,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    thinking_budget: Option<i32>,
    client: reqwest::Client,
}

impl Gemini {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = format_model(model);
        self
    }

    pub fn with_thinking_budget(mut self, budget: Option<i32>) -> Self {
        self.thinking_budget = budget;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: BackendPrompt) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: prompt.into_parts(),
            }],
            generation_config: self.thinking_budget.map(|thinking_budget| GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget },
            }),
        }
    }
}

#[async_trait]
impl Backend for Gemini {
    fn name(&self) -> &str {
        &self.alias
    }

    async fn stream_generate(&self, prompt: BackendPrompt) -> Result<FragmentStream> {
        let model = prompt
            .model()
            .map(format_model)
            .unwrap_or_else(|| self.model.clone());

        let mut params = vec![("alt", "sse")];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        let url = reqwest::Url::parse_with_params(
            &format!("{}/models/{}:streamGenerateContent", self.endpoint, model),
            params.as_slice(),
        )
        .wrap_err("parsing url")?;

        let body = self.request_body(prompt);
        log::trace!(
            "Sending generate request to model {} with {} parts",
            model,
            body.contents[0].parts.len()
        );

        let resp = self
            .client
            .post(url)
            .header("User-Agent", user_agent())
            .json(&body)
            .send()
            .await
            .wrap_err("sending generate request")?;

        if !resp.status().is_success() {
            let http_code = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GeminiError::from_response(http_code, &body).into());
        }

        let stream = resp.bytes_stream().map_err(|e| {
            let err_msg = e.to_string();
            return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
        });

        let lines = StreamReader::new(stream).lines();
        let fragments = futures::stream::try_unfold(lines, |mut lines| async move {
            let fragment = next_fragment(&mut lines).await?;
            Ok::<_, eyre::Report>(fragment.map(|fragment| (fragment, lines)))
        });

        Ok(Box::pin(fragments))
    }
}

/// Reads server-sent events until the next chunk and turns it into a
/// fragment. Returns `None` once the stream is exhausted.
async fn next_fragment<R>(lines: &mut Lines<R>) -> Result<Option<Fragment>>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines
        .next_line()
        .await
        .wrap_err("reading response stream")?
    {
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() {
            continue;
        }

        log::trace!("Received chunk: {}", data);
        let chunk: StreamChunk = serde_json::from_str(data).wrap_err("unmarshalling response")?;
        return chunk.into_fragment().map(Some);
    }
    Ok(None)
}

impl Default for Gemini {
    fn default() -> Self {
        Gemini {
            alias: "Gemini".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            thinking_budget: None,
            client: reqwest::Client::new(),
        }
    }
}

impl From<&BackendConfig> for Gemini {
    fn from(value: &BackendConfig) -> Self {
        Gemini::default()
            .with_endpoint(&value.endpoint)
            .with_model(&value.model)
            .with_thinking_budget(value.thinking_budget)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
struct Content {
    role: String,
    parts: Vec<ContentPart>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: i32,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<GenerateCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<GeminiError>,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateCandidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Default, Debug, Clone, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl StreamChunk {
    fn into_fragment(self) -> Result<Fragment> {
        if let Some(mut err) = self.error {
            err.http_code = err.code.unwrap_or_default();
            return Err(err.into());
        }

        let candidate = match self.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
                    eyre::bail!("prompt was blocked: {}", reason);
                }
                return Ok(Fragment::empty());
            }
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            log::debug!("Candidate finished: {}", reason);
        }

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Ok(Fragment::empty());
        }
        Ok(Fragment::new(text))
    }
}

#[derive(Default, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: GeminiError,
}

#[derive(Default, Error, Debug, Clone, Serialize, Deserialize)]
pub struct GeminiError {
    #[serde(skip)]
    pub http_code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub status: Option<String>,
}

impl GeminiError {
    /// Decodes an error body. Bodies that are not the documented error
    /// envelope are kept verbatim as the message.
    fn from_response(http_code: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(resp) => GeminiError {
                http_code,
                ..resp.error
            },
            Err(_) => GeminiError {
                http_code,
                message: body.trim().to_string(),
                code: None,
                status: None,
            },
        }
    }
}

impl Display for GeminiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            Some(status) => write!(
                f,
                "Gemini error ({} {}): {}",
                self.http_code, status, self.message
            ),
            None => write!(f, "Gemini error ({}): {}", self.http_code, self.message),
        }
    }
}

fn format_model(model: &str) -> String {
    let model = model.strip_prefix("model/").unwrap_or(model);
    let model = model.strip_prefix("models/").unwrap_or(model);
    model.to_string()
}
