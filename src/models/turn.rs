use std::fmt::Display;

/// Phases a single send goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Staged,
    AwaitingFirstFragment,
    Streaming,
    Completed,
    Failed,
}

impl Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnPhase::Idle => "idle",
            TurnPhase::Staged => "staged",
            TurnPhase::AwaitingFirstFragment => "awaiting_first_fragment",
            TurnPhase::Streaming => "streaming",
            TurnPhase::Completed => "completed",
            TurnPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub conversation_id: String,
    pub phase: TurnPhase,
    /// Final content of the model message for this turn.
    pub content: String,
    pub fragments: usize,
    /// Message of the failure, when the turn failed.
    pub error: Option<String>,
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        self.phase == TurnPhase::Completed
    }
}
