/// Prompt templates for the single-call judgements
pub struct JudgePrompts;

impl JudgePrompts {
    /// Build the exit-intent classification prompt for the latest user message
    pub fn build_exit_intent_prompt(last_message: &str) -> String {
        format!(
            r#"[Instruction]:
You are an exit intent detector. Your only job is to determine if the user's last message
indicates they want to end the conversation. Return true ONLY if the user clearly wants to exit
(using phrases like "bye", "exit", "end chat", "I want to leave", "goodbye", etc.).
Return false for all other cases, even if the message seems like a conclusion but doesn't explicitly
indicate exit intent.

[User Message]: Based on this message, does the user want to exit the conversation? Message: '{message}'"#,
            message = last_message,
        )
    }

    /// Build the review validation prompt
    pub fn build_review_validation_prompt(review: &str) -> String {
        format!(
            r#"You are a review validator. Check if the user's review is valid feedback about a chat experience.
Return ONLY "valid" or "invalid" based on whether this seems like legitimate feedback.

Review: {review}"#,
            review = review,
        )
    }

    /// Build the one-word sentiment classification prompt
    pub fn build_sentiment_prompt(review: &str) -> String {
        format!(
            r#"You are a sentiment analysis assistant. Given a user review, classify the sentiment as:
- Positive
- Neutral
- Negative

Be concise. Return only one of the three words above.

Review: {review}"#,
            review = review,
        )
    }

    /// Build the prompt asking the model to clean up a review through the feedback function
    pub fn build_feedback_processing_prompt(review: &str, rating: u8, function_name: &str) -> String {
        format!(
            r#"You are a feedback processor for a chat application. The user has provided a review and rating.

Your tasks:
1. Clean up the review text (fix typos, grammar, etc.)
2. Extract the key points of feedback
3. Structure the feedback appropriately
4. Return the processed feedback by calling the {function} function

Respond ONLY by calling the {function} function with the processed feedback.

Original Review: {review}
Rating: {rating}/5"#,
            function = function_name,
            review = review,
            rating = rating,
        )
    }

    /// Build the prompt asking the model to politely request feedback after a conversation
    pub fn build_feedback_request_prompt(transcript: &str) -> String {
        format!(
            r#"The user has decided to end the conversation below. Thank them and politely request
feedback about the chat experience: a short written review and a rating from 1 to 5.
Keep the request to two or three sentences.

## Conversation
{transcript}"#,
            transcript = transcript,
        )
    }
}
