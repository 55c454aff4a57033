use feedbackloop_feedback::FeedbackError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Input closed")]
    InputClosed,

    #[error("Console error: {0}")]
    Console(#[from] std::io::Error),

    #[error("Feedback error: {0}")]
    Feedback(FeedbackError),
}

impl From<FeedbackError> for LoopError {
    fn from(error: FeedbackError) -> Self {
        match error {
            FeedbackError::InputClosed => LoopError::InputClosed,
            other => LoopError::Feedback(other),
        }
    }
}
