//! Normalizes uploaded blobs into [`UploadedFile`] records.
//!
//! Office documents are reduced to their text, every other type travels as
//! base64. A file that cannot be processed is dropped from the batch and
//! reported in [`IngestBatch::dropped`]; the rest of the batch is unaffected.

#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;

#[cfg(test)]
pub(crate) mod test_helpers;

pub mod docx;
pub mod pptx;
pub(crate) mod xml;

use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use eyre::{Context, Result};
use thiserror::Error;

use crate::models::UploadedFile;

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("reading archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("archive has no {0} entry")]
    MissingPart(String),
    #[error("reading archive entry: {0}")]
    Io(#[from] std::io::Error),
    #[error("no text found in document")]
    NoText,
    #[error("file is empty")]
    Empty,
    #[error("ingestion task failed: {0}")]
    Task(String),
}

/// How a file is turned into a payload, derived once from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Binary,
    DocxText,
    PptxText,
}

impl FileKind {
    pub fn from_mime(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            DOCX_MIME => FileKind::DocxText,
            PPTX_MIME => FileKind::PptxText,
            _ => FileKind::Binary,
        }
    }
}

/// An upload as handed over by the front end.
#[derive(Debug, Clone)]
pub struct RawFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, declaring its type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .wrap_err(format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, mime_from_path(path), bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_mime(&self.mime_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub reason: String,
}

/// Result of processing a batch: the files that made it, in input order,
/// and the ones that were dropped.
#[derive(Debug, Default)]
pub struct IngestBatch {
    files: Vec<UploadedFile>,
    dropped: Vec<DroppedFile>,
}

impl IngestBatch {
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn dropped(&self) -> &[DroppedFile] {
        &self.dropped
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    pub fn into_files(self) -> Vec<UploadedFile> {
        self.files
    }
}

pub fn process_file(raw: &RawFile) -> Result<UploadedFile, IngestError> {
    if raw.bytes().is_empty() {
        return Err(IngestError::Empty);
    }

    let text = match raw.kind() {
        FileKind::Binary => {
            return Ok(UploadedFile::binary(
                raw.name(),
                raw.mime_type(),
                STANDARD.encode(raw.bytes()),
            ));
        }
        FileKind::DocxText => docx::extract_text(raw.bytes())?,
        FileKind::PptxText => pptx::extract_text(raw.bytes())?,
    };

    if text.trim().is_empty() {
        return Err(IngestError::NoText);
    }
    Ok(UploadedFile::extracted(raw.name(), raw.mime_type(), text))
}

/// Processes every file on the blocking pool. The output keeps the input
/// order whatever order the files finish in; failures never abort the batch.
pub async fn process_files(files: Vec<RawFile>) -> IngestBatch {
    let tasks = files.into_iter().map(|raw| async move {
        let name = raw.name().to_string();
        let result = tokio::task::spawn_blocking(move || process_file(&raw))
            .await
            .map_err(|err| IngestError::Task(err.to_string()))
            .and_then(|result| result);
        (name, result)
    });

    let mut batch = IngestBatch::default();
    for (name, result) in futures::future::join_all(tasks).await {
        match result {
            Ok(file) => {
                log::debug!("Ingested {} ({})", file.name(), file.mime_type());
                batch.files.push(file);
            }
            Err(err) => {
                log::error!("Error processing file {}: {}", name, err);
                batch.dropped.push(DroppedFile {
                    name,
                    reason: err.to_string(),
                });
            }
        }
    }
    batch
}

pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_lowercase();

    match ext.as_str() {
        "docx" => DOCX_MIME,
        "pptx" => PPTX_MIME,
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        _ => DEFAULT_MIME,
    }
}
