#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Message, UploadedFile};

pub const NEW_CONVERSATION_TITLE: &str = "New Research";

const TITLE_MAX_CHARS: usize = 40;
const TITLE_ELLIPSIS: &str = "...";

/// Default title for a conversation: the first 40 characters of the prompt,
/// with an ellipsis when it had to be cut.
pub fn title_from_prompt(prompt: &str) -> String {
    let mut chars = prompt.chars();
    let title: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}{}", title, TITLE_ELLIPSIS)
    } else {
        title
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    id: String,
    title: String,
    #[serde(default)]
    files: Vec<UploadedFile>,
    #[serde(default)]
    messages: Vec<Message>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl Conversation {
    pub fn new(title: impl Into<String>) -> Self {
        Self::default().with_title(title)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_created_at(mut self, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        self.created_at = timestamp;
        self
    }

    pub fn with_files(mut self, files: Vec<UploadedFile>) -> Self {
        self.files = files;
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Files are only ever added to a conversation.
    pub(crate) fn add_files(&mut self, files: &[UploadedFile]) {
        self.files.extend_from_slice(files);
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The model message of the turn in progress. Every turn opens with a
    /// user message, so a trailing model message always belongs to the
    /// latest turn.
    pub(crate) fn trailing_model_message_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut().filter(|msg| msg.is_model())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            id: format!("convo-{}", uuid::Uuid::new_v4().simple()),
            title: NEW_CONVERSATION_TITLE.to_string(),
            files: vec![],
            messages: vec![],
            created_at: chrono::Utc::now(),
        }
    }
}

/// Every conversation, most recent first, plus the active one.
///
/// When `active_id` is set it always names a conversation of the set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSet {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
}

impl ConversationSet {
    pub fn new(conversations: Vec<Conversation>, active_id: Option<String>) -> Self {
        let mut set = Self {
            conversations,
            active_id: None,
        };
        if let Some(id) = active_id {
            if set.contains(&id) {
                set.active_id = Some(id);
            } else {
                log::warn!("Active conversation {} no longer exists, clearing it", id);
            }
        }
        set
    }

    /// Decodes the persisted form: a JSON array of conversations and an
    /// optional JSON string holding the active id.
    pub fn from_persisted(conversations: Option<&str>, active_id: Option<&str>) -> Result<Self> {
        let conversations: Vec<Conversation> = match conversations {
            Some(raw) => serde_json::from_str(raw).wrap_err("decoding conversations")?,
            None => vec![],
        };
        let active_id: Option<String> = match active_id {
            Some(raw) => Some(serde_json::from_str(raw).wrap_err("decoding active id")?),
            None => None,
        };
        Ok(Self::new(conversations, active_id))
    }

    pub fn conversations_json(&self) -> Result<String> {
        serde_json::to_string(&self.conversations).wrap_err("encoding conversations")
    }

    pub fn active_id_json(&self) -> Result<Option<String>> {
        self.active_id
            .as_ref()
            .map(|id| serde_json::to_string(id).wrap_err("encoding active id"))
            .transpose()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id() == id)
    }

    pub(crate) fn insert_front(&mut self, conversation: Conversation) {
        self.conversations.insert(0, conversation);
    }

    /// Sets the active conversation. Returns false, leaving the active id
    /// untouched, when the id is unknown.
    pub(crate) fn set_active(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.active_id = Some(id.to_string());
        true
    }

    /// Removes a conversation. Deleting the active one re-points the active
    /// id to the first remaining conversation, or clears it.
    pub(crate) fn remove(&mut self, id: &str) -> Option<Conversation> {
        let idx = self.conversations.iter().position(|c| c.id() == id)?;
        let removed = self.conversations.remove(idx);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.conversations.first().map(|c| c.id().to_string());
        }
        Some(removed)
    }
}
