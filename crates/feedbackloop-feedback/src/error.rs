use feedbackloop_model::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Input closed before feedback was complete")]
    InputClosed,

    #[error("Console error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Review cannot be empty")]
    EmptyReview,
}
