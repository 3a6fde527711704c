use std::sync::Arc;

use tokio::sync::mpsc;

use super::TurnOutcome;

/// Progress of a turn, published for front ends that render incrementally.
#[derive(Debug, Clone)]
pub enum Event {
    TurnStaged { conversation_id: String },
    ModelMessageOpened { conversation_id: String },
    Fragment { conversation_id: String, text: String },
    TurnFinished(TurnOutcome),
}

#[async_trait::async_trait]
pub trait EventTx {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>>;
}

#[async_trait::async_trait]
impl EventTx for mpsc::Sender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event).await
    }
}

#[async_trait::async_trait]
impl EventTx for mpsc::UnboundedSender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event)
    }
}

pub type ArcEventTx = Arc<dyn EventTx + Send + Sync>;
