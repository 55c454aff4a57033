//! # feedbackloop-feedback
//!
//! Collects a review, a 1-5 rating, and a sentiment label once the user
//! decides to leave.
//!
//! [`FeedbackExtractor`] drives the exchange over a [`Console`]. In
//! [`FeedbackMode::Interactive`] the review is screened by the model, cleaned
//! up through the `collect_feedback` function call, and confirmed by the user.
//! In [`FeedbackMode::Announce`] the model only announces the request and the
//! raw answers are recorded.

mod console;
mod error;
mod extractor;
mod feedback;
mod schema;

#[cfg(any(test, feature = "test-util"))]
pub use console::ScriptedConsole;
pub use console::{Console, StdConsole};
pub use error::FeedbackError;
pub use extractor::{FeedbackExtractor, FeedbackMode};
pub use feedback::{
    accept_processed_review, Feedback, Rating, RatingError, MIN_PROCESSED_REVIEW_LEN, RULE_WIDTH,
};
pub use schema::{feedback_tool_schema, FEEDBACK_FUNCTION_NAME};
