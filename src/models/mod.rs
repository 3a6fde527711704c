pub mod backend;
pub mod conversation;
pub mod event;
pub mod file;
pub mod message;
pub mod turn;

pub use backend::*;
pub use conversation::{Conversation, ConversationSet, NEW_CONVERSATION_TITLE, title_from_prompt};
pub use event::{ArcEventTx, Event, EventTx};
pub use file::UploadedFile;
pub use message::{Message, Role};
pub use turn::{TurnOutcome, TurnPhase};
