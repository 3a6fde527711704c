//! Drives one request/response turn: stages the user turn, sends the
//! context to the backend and folds the streamed fragments into the
//! conversation as they arrive.

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;

use std::{future::Future, time::Duration};

use eyre::Result;
use futures::StreamExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    backend::{ArcBackend, build_parts},
    models::{
        ArcEventTx, BackendPrompt, Event, TurnOutcome, TurnPhase, UploadedFile, title_from_prompt,
    },
    store::{SharedStore, StoreError, TurnGuard},
};

pub const FALLBACK_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

const OPEN_ERROR_PREFIX: &str = "Failed to get response from AI";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ways a turn ends early without the backend reporting an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Interrupted {
    #[error("Request cancelled")]
    Cancelled,
    #[error("Timed out waiting for the model after {0}s")]
    TimedOut(u64),
}

pub struct ChatEngine {
    store: SharedStore,
    backend: ArcBackend,
    timeout: Option<Duration>,
    event_tx: Option<ArcEventTx>,
}

impl ChatEngine {
    pub fn new(store: SharedStore, backend: ArcBackend) -> Self {
        Self {
            store,
            backend,
            timeout: None,
            event_tx: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_tx(mut self, event_tx: ArcEventTx) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Sends `prompt` with the newly attached `files` to the active
    /// conversation, creating one when none is active.
    ///
    /// Backend failures do not surface here: they end up as the content of
    /// the model message and in the returned outcome.
    pub async fn send(&self, prompt: &str, files: Vec<UploadedFile>) -> Result<TurnOutcome, EngineError> {
        self.send_with_cancel(prompt, files, CancellationToken::new())
            .await
    }

    pub async fn send_with_cancel(
        &self,
        prompt: &str,
        files: Vec<UploadedFile>,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, EngineError> {
        let (guard, prior_files) = self.stage(prompt, &files).await?;
        let mut turn = Turn::new(guard.conversation_id().to_string());
        turn.transition(TurnPhase::Staged);
        self.emit(Event::TurnStaged {
            conversation_id: turn.id.clone(),
        })
        .await;

        let mut context = prior_files;
        context.extend(files);
        let prompt = BackendPrompt::new(build_parts(&context, prompt));
        log::debug!(
            "Conversation {}: sending {} context files",
            turn.id,
            context.len()
        );

        self.store
            .lock()
            .await
            .append_or_update_trailing_model_message(&turn.id, "")
            .await;
        self.emit(Event::ModelMessageOpened {
            conversation_id: turn.id.clone(),
        })
        .await;
        turn.transition(TurnPhase::AwaitingFirstFragment);

        let result = self.stream_answer(&mut turn, prompt, &cancel).await;
        let outcome = self.finish(turn, guard, result).await;
        self.emit(Event::TurnFinished(outcome.clone())).await;
        Ok(outcome)
    }

    /// Resolves the target conversation, marks the turn in flight and
    /// appends the user turn. Returns the in-flight guard and the files the
    /// conversation held before this turn.
    async fn stage(
        &self,
        prompt: &str,
        files: &[UploadedFile],
    ) -> Result<(TurnGuard, Vec<UploadedFile>), EngineError> {
        let mut store = self.store.lock().await;
        let id = match store.active_id() {
            Some(id) => id.to_string(),
            None => store.create_conversation(&title_from_prompt(prompt)).await,
        };
        let guard = store.begin_turn(&id)?;
        let prior_files = store.snapshot_files_for(&id);
        store.append_user_turn(&id, prompt, files).await;
        Ok((guard, prior_files))
    }

    async fn stream_answer(
        &self,
        turn: &mut Turn,
        prompt: BackendPrompt,
        cancel: &CancellationToken,
    ) -> Result<(), TurnError> {
        let mut stream = self
            .bounded(cancel, self.backend.stream_generate(prompt))
            .await?
            .map_err(TurnError::Open)?;

        while let Some(fragment) = self.bounded(cancel, stream.next()).await? {
            let fragment = fragment.map_err(TurnError::Stream)?;
            let Some(text) = fragment.text() else {
                continue;
            };

            if turn.phase == TurnPhase::AwaitingFirstFragment {
                turn.transition(TurnPhase::Streaming);
            }
            turn.fragments += 1;
            self.store
                .lock()
                .await
                .extend_trailing_model_message(&turn.id, text)
                .await;
            self.emit(Event::Fragment {
                conversation_id: turn.id.clone(),
                text: text.to_string(),
            })
            .await;
        }
        Ok(())
    }

    /// Awaits `fut` unless the turn is cancelled or the configured timeout
    /// expires first.
    async fn bounded<F: Future>(
        &self,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<F::Output, TurnError> {
        let bounded = async {
            match self.timeout {
                Some(timeout) => tokio::time::timeout(timeout, fut)
                    .await
                    .map_err(|_| Interrupted::TimedOut(timeout.as_secs())),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(TurnError::Interrupted(Interrupted::Cancelled)),
            output = bounded => output.map_err(TurnError::Interrupted),
        }
    }

    async fn finish(
        &self,
        mut turn: Turn,
        guard: TurnGuard,
        result: Result<(), TurnError>,
    ) -> TurnOutcome {
        let mut store = self.store.lock().await;
        let error = match result {
            Ok(()) => {
                turn.transition(TurnPhase::Completed);
                None
            }
            Err(err) => {
                turn.transition(TurnPhase::Failed);
                let message = err.message();
                log::error!("Conversation {}: turn failed: {}", turn.id, message);
                if !store.fail_trailing_model_message(&turn.id, &message).await {
                    log::debug!(
                        "Conversation {}: keeping partial answer after failure",
                        turn.id
                    );
                }
                Some(message)
            }
        };
        drop(guard);

        let content = store
            .conversation(&turn.id)
            .and_then(|c| c.last_message())
            .filter(|m| m.is_model())
            .map(|m| m.content().to_string())
            .unwrap_or_default();

        TurnOutcome {
            conversation_id: turn.id,
            phase: turn.phase,
            content,
            fragments: turn.fragments,
            error,
        }
    }

    async fn emit(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            if let Err(err) = tx.send(event).await {
                log::debug!("Dropping turn event, receiver is gone: {}", err);
            }
        }
    }
}

struct Turn {
    id: String,
    phase: TurnPhase,
    fragments: usize,
}

impl Turn {
    fn new(id: String) -> Self {
        Self {
            id,
            phase: TurnPhase::Idle,
            fragments: 0,
        }
    }

    fn transition(&mut self, next: TurnPhase) {
        log::debug!("Conversation {}: {} -> {}", self.id, self.phase, next);
        self.phase = next;
    }
}

enum TurnError {
    Open(eyre::Report),
    Stream(eyre::Report),
    Interrupted(Interrupted),
}

impl TurnError {
    /// Text shown in place of the answer.
    fn message(&self) -> String {
        let message = match self {
            TurnError::Open(err) => {
                let detail = format!("{:#}", err);
                if detail.trim().is_empty() {
                    String::new()
                } else {
                    format!("{}: {}", OPEN_ERROR_PREFIX, detail)
                }
            }
            TurnError::Stream(err) => format!("{:#}", err),
            TurnError::Interrupted(err) => err.to_string(),
        };

        if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}
