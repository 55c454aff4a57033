//! # feedbackloop-core
//!
//! The conversation loop: chat turns, exit detection, feedback on the way out.
//!
//! ## Key Types
//!
//! - [`ConversationLoop`] - Drives one session over a console and a model gateway
//! - [`ConversationState`] - Chatting, AwaitingFeedback, Terminated
//! - [`SessionOutcome`] - How the session ended, with its process exit code

mod context;
mod conversation;
mod error;
mod outcome;

pub use context::{ChatContext, ConversationState};
pub use conversation::ConversationLoop;
pub use error::LoopError;
pub use outcome::SessionOutcome;
