use feedbackloop_feedback::Feedback;
use feedbackloop_model::ChatHistory;
use std::time::{Duration, Instant};

/// Where the conversation is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Chatting,
    AwaitingFeedback,
    Terminated,
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversationState::Chatting => write!(f, "chatting"),
            ConversationState::AwaitingFeedback => write!(f, "awaiting_feedback"),
            ConversationState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Mutable state of one session, owned by the loop
#[derive(Debug)]
pub struct ChatContext {
    pub history: ChatHistory,
    pub state: ConversationState,
    /// User messages read so far, including ones whose reply failed
    pub turn: usize,
    /// Set once, when the session leaves AwaitingFeedback
    pub feedback: Option<Feedback>,
    started_at: Instant,
}

impl ChatContext {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            history: ChatHistory::new(greeting),
            state: ConversationState::Chatting,
            turn: 0,
            feedback: None,
            started_at: Instant::now(),
        }
    }

    /// Completed user/model exchanges
    pub fn exchanges(&self) -> usize {
        self.history.exchanges()
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_starts_chatting_with_greeting() {
        let context = ChatContext::new("Hi!");
        assert_eq!(context.state, ConversationState::Chatting);
        assert_eq!(context.history.len(), 1);
        assert_eq!(context.history.last_user_message(), Some("Hi!"));
        assert_eq!(context.exchanges(), 0);
        assert!(context.feedback.is_none());
    }
}
