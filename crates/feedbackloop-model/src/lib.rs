//! # feedbackloop-model
//!
//! The boundary between feedbackloop and the remote language model.
//!
//! ## Key Types
//!
//! - [`ModelGateway`] - Trait every model backend implements
//! - [`GenerateResult`] - Plain text, or text plus a structured function call
//! - [`GeminiGateway`] - Gemini `generateContent` implementation
//! - [`ChatHistory`] - Ordered conversation turns owned by the chat loop

mod gemini;
mod history;
#[cfg(any(test, feature = "test-util"))]
mod scripted;
mod traits;

pub use gemini::GeminiGateway;
pub use history::{ChatHistory, ChatRole, ChatTurn};
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{RecordedCall, ScriptedGateway};
pub use traits::{FunctionCall, GatewayConfig, GatewayError, GenerateResult, ModelGateway, ToolSchema};
