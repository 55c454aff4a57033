use feedbackloop_judge::{JudgePrompts, ReviewValidator, SentimentScorer};
use feedbackloop_model::{ChatHistory, GenerateResult, ModelGateway};
use tracing::{debug, info, warn};

use crate::feedback::{accept_processed_review, Feedback, Rating};
use crate::schema::{feedback_tool_schema, FEEDBACK_FUNCTION_NAME};
use crate::{Console, FeedbackError};

const REVIEW_PROMPT: &str = "\nPlease share your thoughts about the chat experience: ";
const RATING_PROMPT: &str = "Your rating (1-5): ";
const CONFIRM_PROMPT: &str = "\nIs this feedback correct? (y/n): ";
const EMPTY_REVIEW_MESSAGE: &str = "Review cannot be empty. Please provide some feedback.";
const INVALID_REVIEW_MESSAGE: &str = "Please provide meaningful feedback about your chat experience.";
const RATING_BANNER: &str = "\nOn a scale of 1-5, how would you rate your experience?";
const RATING_LEGEND: &str =
    "1: Very Dissatisfied | 2: Dissatisfied | 3: Neutral | 4: Satisfied | 5: Very Satisfied";
const DEFAULT_FEEDBACK_REQUEST: &str =
    "\nThanks for chatting! Before you go, we'd love to hear about your experience.";

/// How feedback is gathered when the user leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackMode {
    /// Validate the review, let the model clean it up, then confirm with the user
    #[default]
    Interactive,
    /// Let the model ask for feedback, then record the raw answers without confirmation
    Announce,
}

impl std::fmt::Display for FeedbackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedbackMode::Interactive => write!(f, "interactive"),
            FeedbackMode::Announce => write!(f, "announce"),
        }
    }
}

impl std::str::FromStr for FeedbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interactive" | "validate" => Ok(FeedbackMode::Interactive),
            "announce" | "simple" => Ok(FeedbackMode::Announce),
            _ => Err(format!("Unknown feedback mode: {}", s)),
        }
    }
}

/// Turns a finished conversation into a [`Feedback`] record
pub struct FeedbackExtractor<'a> {
    gateway: &'a dyn ModelGateway,
    scorer: &'a dyn SentimentScorer,
    console: &'a dyn Console,
    mode: FeedbackMode,
    validate_reviews: bool,
}

impl<'a> FeedbackExtractor<'a> {
    pub fn new(
        gateway: &'a dyn ModelGateway,
        scorer: &'a dyn SentimentScorer,
        console: &'a dyn Console,
    ) -> Self {
        Self {
            gateway,
            scorer,
            console,
            mode: FeedbackMode::default(),
            validate_reviews: true,
        }
    }

    pub fn with_mode(mut self, mode: FeedbackMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether the model is asked to reject non-feedback reviews (interactive mode only)
    pub fn with_review_validation(mut self, enabled: bool) -> Self {
        self.validate_reviews = enabled;
        self
    }

    pub fn mode(&self) -> FeedbackMode {
        self.mode
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Collect feedback for the conversation.
    ///
    /// `Ok(None)` means the user left without feedback being recorded.
    pub async fn collect(&self, history: &ChatHistory) -> Result<Option<Feedback>, FeedbackError> {
        info!(mode = %self.mode, turns = history.len(), "Collecting feedback");
        match self.mode {
            FeedbackMode::Interactive => self.collect_interactive().await.map(Some),
            FeedbackMode::Announce => Ok(self.collect_announced(history).await),
        }
    }

    /// Extract, summarize, and confirm; rejected summaries restart from the review prompt
    async fn collect_interactive(&self) -> Result<Feedback, FeedbackError> {
        let mut attempt = 1;
        loop {
            let feedback = self.extract_once().await?;

            for line in feedback.summary_lines() {
                self.console.say(&line);
            }

            let answer = self
                .console
                .read_line(CONFIRM_PROMPT)
                .await?
                .ok_or(FeedbackError::InputClosed)?;
            let answer = answer.trim().to_lowercase();
            if answer == "y" || answer == "yes" {
                debug!(attempt, "Feedback confirmed");
                return Ok(feedback);
            }

            self.console.say("Let's try again.");
            attempt += 1;
        }
    }

    async fn extract_once(&self) -> Result<Feedback, FeedbackError> {
        let review = self.prompt_review(self.validate_reviews).await?;
        let rating = self.prompt_rating().await?;

        self.console.say("\nProcessing your feedback...");
        self.process(review, rating).await
    }

    /// Ask the model to clean up the review via the feedback function.
    ///
    /// Any failure falls back to the raw review and rating.
    async fn process(&self, review: String, rating: Rating) -> Result<Feedback, FeedbackError> {
        let prompt = JudgePrompts::build_feedback_processing_prompt(
            &review,
            rating.value(),
            FEEDBACK_FUNCTION_NAME,
        );
        let tools = [feedback_tool_schema()];

        let (review, rating) = match self.gateway.generate_with_tools(&prompt, &tools).await {
            Ok(GenerateResult::TextWithCall(_, call)) if call.name == FEEDBACK_FUNCTION_NAME => {
                let processed_review = accept_processed_review(call.arg("review"), &review);
                let processed_rating = call
                    .arg("rating")
                    .and_then(Rating::from_json)
                    .unwrap_or(rating);
                debug!(
                    review_replaced = processed_review != review,
                    rating_replaced = processed_rating != rating,
                    "Applied processed feedback"
                );
                (processed_review, processed_rating)
            }
            Ok(_) => {
                self.console
                    .say("Using original feedback with sentiment analysis...");
                (review, rating)
            }
            Err(e) => {
                warn!(error = %e, "Feedback processing failed");
                self.console
                    .say(&format!("Error using the model for feedback processing: {}", e));
                self.console.say("Processing feedback locally...");
                (review, rating)
            }
        };

        let sentiment = self.scorer.score(&review).await;
        Feedback::new(review, rating, sentiment)
    }

    /// One model call announces the request, then the raw answers are recorded
    async fn collect_announced(&self, history: &ChatHistory) -> Option<Feedback> {
        match self.try_collect_announced(history).await {
            Ok(feedback) => Some(feedback),
            Err(e) => {
                warn!(error = %e, "Feedback collection abandoned");
                self.console
                    .say(&format!("Error during feedback collection: {}", e));
                None
            }
        }
    }

    async fn try_collect_announced(&self, history: &ChatHistory) -> Result<Feedback, FeedbackError> {
        let prompt = JudgePrompts::build_feedback_request_prompt(&history.render_prompt());
        let tools = [feedback_tool_schema()];
        let result = self.gateway.generate_with_tools(&prompt, &tools).await?;

        let header = result.text().trim();
        if header.is_empty() {
            self.console.say(DEFAULT_FEEDBACK_REQUEST);
        } else {
            self.console.say(&format!("\n{}", header));
        }

        let review = self.prompt_review(false).await?;
        let rating = self.prompt_rating().await?;
        let sentiment = self.scorer.score(&review).await;
        Feedback::new(review, rating, sentiment)
    }

    /// Prompt until a non-empty review is given.
    ///
    /// Blank input never reaches the model. When `consult_model` is set the
    /// model may reject the review; if that call fails the review is kept.
    async fn prompt_review(&self, consult_model: bool) -> Result<String, FeedbackError> {
        let validator = ReviewValidator::new(self.gateway);
        loop {
            let input = self
                .console
                .read_line(REVIEW_PROMPT)
                .await?
                .ok_or(FeedbackError::InputClosed)?;
            let review = input.trim();

            if review.is_empty() {
                self.console.say(EMPTY_REVIEW_MESSAGE);
                continue;
            }

            if consult_model {
                match validator.is_legitimate(review).await {
                    Ok(true) => {}
                    Ok(false) => {
                        self.console.say(INVALID_REVIEW_MESSAGE);
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "Review validation unavailable, accepting review");
                    }
                }
            }

            return Ok(review.to_string());
        }
    }

    async fn prompt_rating(&self) -> Result<Rating, FeedbackError> {
        self.console.say(RATING_BANNER);
        self.console.say(RATING_LEGEND);

        loop {
            let input = self
                .console
                .read_line(RATING_PROMPT)
                .await?
                .ok_or(FeedbackError::InputClosed)?;

            match Rating::parse(&input) {
                Ok(rating) => return Ok(rating),
                Err(e) => {
                    debug!(error = %e, "Rejected rating");
                    self.console.say(&format!(
                        "Invalid input: {}. Please enter a number between 1 and 5.",
                        input.trim()
                    ));
                }
            }
        }
    }
}
