#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use std::{
    collections::HashSet,
    sync::{Arc, Mutex as StdMutex},
};

use eyre::{Context, Result};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    models::{Conversation, ConversationSet, Message, UploadedFile, title_from_prompt},
    storage::{ACTIVE_CONVERSATION_KEY, ArcStorage, CONVERSATIONS_KEY},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("a response is already being generated for conversation {0}")]
    TurnInProgress(String),
}

pub type SharedStore = Arc<Mutex<ConversationStore>>;

type InFlight = Arc<StdMutex<HashSet<String>>>;

/// Marks a conversation as having a turn in flight until dropped, whichever
/// way the turn ends.
#[derive(Debug)]
pub struct TurnGuard {
    id: String,
    in_flight: InFlight,
}

impl TurnGuard {
    pub fn conversation_id(&self) -> &str {
        &self.id
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        lock_in_flight(&self.in_flight).remove(&self.id);
    }
}

fn lock_in_flight(in_flight: &InFlight) -> std::sync::MutexGuard<'_, HashSet<String>> {
    in_flight
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the conversation set. Every mutation is followed by a full write of
/// the set to storage; a failed write is logged and the in-memory state is
/// kept as is.
pub struct ConversationStore {
    storage: ArcStorage,
    set: ConversationSet,
    in_flight: InFlight,
}

impl ConversationStore {
    /// Reads the persisted set. Missing or unreadable data starts an empty
    /// set.
    pub async fn load(storage: ArcStorage) -> Self {
        let set = match read_persisted(&storage).await {
            Ok(set) => set,
            Err(err) => {
                log::error!("Failed to load conversations, starting empty: {:#}", err);
                ConversationSet::default()
            }
        };
        log::debug!(
            "Loaded {} conversations, active: {:?}",
            set.len(),
            set.active_id()
        );

        Self {
            storage,
            set,
            in_flight: InFlight::default(),
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    pub fn conversations(&self) -> &[Conversation] {
        self.set.conversations()
    }

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.set.get(id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.set.active_id()
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.set.active()
    }

    pub async fn create_conversation(&mut self, initial_title: &str) -> String {
        let conversation = Conversation::new(initial_title);
        let id = conversation.id().to_string();
        self.set.insert_front(conversation);
        self.set.set_active(&id);
        log::debug!("Created conversation {}", id);
        self.persist().await;
        id
    }

    pub async fn select_conversation(&mut self, id: &str) {
        if !self.set.set_active(id) {
            log::warn!("Cannot select unknown conversation {}", id);
            return;
        }
        self.persist().await;
    }

    pub async fn delete_conversation(&mut self, id: &str) {
        if self.set.remove(id).is_none() {
            log::warn!("Cannot delete unknown conversation {}", id);
            return;
        }
        log::debug!("Deleted conversation {}", id);
        self.persist().await;
    }

    pub async fn rename_conversation(&mut self, id: &str, new_title: &str) {
        let title = new_title.trim();
        if title.is_empty() {
            log::debug!("Ignoring empty title for conversation {}", id);
            return;
        }
        let Some(conversation) = self.set.get_mut(id) else {
            log::warn!("Cannot rename unknown conversation {}", id);
            return;
        };
        conversation.set_title(title);
        self.persist().await;
    }

    /// Adds the files and the user message of a new turn. The first message
    /// of a conversation also names it after the prompt.
    pub async fn append_user_turn(&mut self, id: &str, prompt: &str, files: &[UploadedFile]) {
        let Some(conversation) = self.set.get_mut(id) else {
            log::warn!("Cannot append a turn to unknown conversation {}", id);
            return;
        };
        conversation.add_files(files);
        if conversation.is_empty() {
            conversation.set_title(title_from_prompt(prompt));
        }
        conversation.push_message(Message::new_user(prompt));
        self.persist().await;
    }

    pub async fn append_or_update_trailing_model_message(&mut self, id: &str, content: &str) {
        let Some(conversation) = self.set.get_mut(id) else {
            log::warn!("Cannot update unknown conversation {}", id);
            return;
        };
        match conversation.trailing_model_message_mut() {
            Some(message) => message.set_content(content),
            None => conversation.push_message(Message::new_model(content)),
        }
        self.persist().await;
    }

    /// Appends a fragment onto the open model message, opening it when the
    /// turn has none yet.
    pub async fn extend_trailing_model_message(&mut self, id: &str, fragment: &str) {
        let Some(conversation) = self.set.get_mut(id) else {
            log::warn!("Cannot update unknown conversation {}", id);
            return;
        };
        match conversation.trailing_model_message_mut() {
            Some(message) => message.append(fragment),
            None => conversation.push_message(Message::new_model(fragment)),
        }
        self.persist().await;
    }

    /// Writes the error text into the model message of the turn, unless
    /// it already holds part of an answer. Returns whether it was written.
    pub async fn fail_trailing_model_message(&mut self, id: &str, error_text: &str) -> bool {
        let Some(conversation) = self.set.get_mut(id) else {
            log::warn!("Cannot update unknown conversation {}", id);
            return false;
        };
        let written = match conversation.trailing_model_message_mut() {
            Some(message) if message.content().is_empty() => {
                message.set_content(error_text);
                true
            }
            Some(_) => false,
            None => {
                conversation.push_message(Message::new_model(error_text));
                true
            }
        };
        if written {
            self.persist().await;
        }
        written
    }

    pub fn snapshot_files_for(&self, id: &str) -> Vec<UploadedFile> {
        self.set
            .get(id)
            .map(|c| c.files().to_vec())
            .unwrap_or_default()
    }

    /// Marks a turn as in flight. Only one turn per conversation may run;
    /// the mark is lifted when the returned guard is dropped.
    pub fn begin_turn(&self, id: &str) -> Result<TurnGuard, StoreError> {
        if !lock_in_flight(&self.in_flight).insert(id.to_string()) {
            return Err(StoreError::TurnInProgress(id.to_string()));
        }
        Ok(TurnGuard {
            id: id.to_string(),
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn is_loading(&self, id: &str) -> bool {
        lock_in_flight(&self.in_flight).contains(id)
    }

    async fn persist(&self) {
        if let Err(err) = self.write_all().await {
            log::error!("Failed to persist conversations: {:#}", err);
        }
    }

    async fn write_all(&self) -> Result<()> {
        let conversations = self.set.conversations_json()?;
        self.storage
            .set(CONVERSATIONS_KEY, &conversations)
            .await
            .wrap_err("writing conversations")?;

        match self.set.active_id_json()? {
            Some(active_id) => self
                .storage
                .set(ACTIVE_CONVERSATION_KEY, &active_id)
                .await
                .wrap_err("writing active conversation")?,
            None => self
                .storage
                .remove(ACTIVE_CONVERSATION_KEY)
                .await
                .wrap_err("removing active conversation")?,
        }
        Ok(())
    }
}

async fn read_persisted(storage: &ArcStorage) -> Result<ConversationSet> {
    let conversations = storage
        .get(CONVERSATIONS_KEY)
        .await
        .wrap_err("reading conversations")?;
    let active_id = storage
        .get(ACTIVE_CONVERSATION_KEY)
        .await
        .wrap_err("reading active conversation")?;
    ConversationSet::from_persisted(conversations.as_deref(), active_id.as_deref())
}
