use serde::{Deserialize, Serialize};

/// Who produced a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Model,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => write!(f, "User"),
            ChatRole::Model => write!(f, "Model"),
        }
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }

    /// Render as `"<Role>: <text>"`
    pub fn render(&self) -> String {
        format!("{}: {}", self.role, self.text)
    }
}

/// Ordered conversation history.
///
/// Always starts with one synthetic greeting from the user. Append-only,
/// except that a pending user turn can be rolled back when its reply fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    pub const DEFAULT_GREETING: &'static str = "Hello!";

    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![ChatTurn::user(greeting)],
        }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn::user(text));
    }

    pub fn push_model(&mut self, text: impl Into<String>) {
        self.turns.push(ChatTurn::model(text));
    }

    /// Remove the trailing user turn. The greeting is never removed.
    pub fn rollback_user_turn(&mut self) -> Option<ChatTurn> {
        if self.turns.len() <= 1 {
            return None;
        }
        match self.turns.last() {
            Some(turn) if turn.role == ChatRole::User => self.turns.pop(),
            _ => None,
        }
    }

    /// Text of the most recent user turn
    pub fn last_user_message(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == ChatRole::User)
            .map(|t| t.text.as_str())
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Never true: the greeting is always present
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of completed user/model exchanges
    pub fn exchanges(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.role == ChatRole::Model)
            .count()
    }

    /// Flatten the whole history into one prompt, one turn per line
    pub fn render_prompt(&self) -> String {
        self.turns
            .iter()
            .map(ChatTurn::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_GREETING)
    }
}
