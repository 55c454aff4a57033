use feedbackloop_model::{GatewayError, ModelGateway};
use tracing::debug;

use crate::JudgePrompts;

/// Asks the model whether a review is legitimate feedback
pub struct ReviewValidator<'a> {
    gateway: &'a dyn ModelGateway,
}

impl<'a> ReviewValidator<'a> {
    pub fn new(gateway: &'a dyn ModelGateway) -> Self {
        Self { gateway }
    }

    /// Returns `Ok(false)` only when the model explicitly answers "invalid"
    pub async fn is_legitimate(&self, review: &str) -> Result<bool, GatewayError> {
        let prompt = JudgePrompts::build_review_validation_prompt(review);
        let result = self.gateway.generate(&prompt).await?;
        let invalid = result.text().trim().to_lowercase().contains("invalid");

        debug!(invalid, "Review validated");
        Ok(!invalid)
    }
}
