use feedbackloop_model::{GatewayError, ModelGateway};
use tracing::debug;

use crate::JudgePrompts;

/// Decides whether the user's latest message asks to end the conversation
pub struct ExitIntentClassifier<'a> {
    gateway: &'a dyn ModelGateway,
}

impl<'a> ExitIntentClassifier<'a> {
    pub fn new(gateway: &'a dyn ModelGateway) -> Self {
        Self { gateway }
    }

    /// Classify one message.
    ///
    /// Gateway failures are returned unchanged; the caller decides what a
    /// failed classification means.
    pub async fn classify(&self, last_user_message: &str) -> Result<bool, GatewayError> {
        let prompt = JudgePrompts::build_exit_intent_prompt(last_user_message);
        let result = self.gateway.generate(&prompt).await?;
        let exit = parse_exit_verdict(result.text());

        debug!(exit, answer = result.text().trim(), "Exit intent classified");
        Ok(exit)
    }
}

/// The verdict is positive iff the answer mentions "true" or "yes"
pub fn parse_exit_verdict(answer: &str) -> bool {
    let lower = answer.trim().to_lowercase();
    lower.contains("true") || lower.contains("yes")
}
