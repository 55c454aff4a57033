use feedbackloop_judge::Sentiment;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::FeedbackError;

/// Width of the dashed rules around the feedback summary
pub const RULE_WIDTH: usize = 50;

/// Minimum trimmed length for a model-processed review to replace the raw one
pub const MIN_PROCESSED_REVIEW_LEN: usize = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RatingError {
    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    #[error("{0} is outside 1-5")]
    OutOfRange(i64),
}

/// A satisfaction rating, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, RatingError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RatingError::OutOfRange(value))
        }
    }

    /// Parse user input such as `" 4 "`
    pub fn parse(input: &str) -> Result<Self, RatingError> {
        let value: i64 = input
            .trim()
            .parse()
            .map_err(|_| RatingError::NotANumber(input.to_string()))?;
        Self::new(value)
    }

    /// Accept a function-call argument.
    ///
    /// JSON integers qualify, as do floats without a fractional part since the
    /// model API encodes all numbers as doubles.
    pub fn from_json(value: &Value) -> Option<Self> {
        if let Some(n) = value.as_i64() {
            return Self::new(n).ok();
        }
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.is_finite() => Self::new(f as i64).ok(),
            _ => None,
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exit feedback for one conversation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    review: String,
    rating: Rating,
    sentiment: Sentiment,
}

impl Feedback {
    pub fn new(
        review: impl Into<String>,
        rating: Rating,
        sentiment: Sentiment,
    ) -> Result<Self, FeedbackError> {
        let review = review.into();
        if review.trim().is_empty() {
            return Err(FeedbackError::EmptyReview);
        }
        Ok(Self {
            review,
            rating,
            sentiment,
        })
    }

    pub fn review(&self) -> &str {
        &self.review
    }

    pub fn rating(&self) -> Rating {
        self.rating
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    /// Lines of the summary shown before confirmation
    pub fn summary_lines(&self) -> Vec<String> {
        let rule = "-".repeat(RULE_WIDTH);
        vec![
            String::new(),
            rule.clone(),
            "FEEDBACK SUMMARY".to_string(),
            rule,
            format!("Rating: {}/5", self.rating),
            format!("Review: {}", self.review),
            format!("Sentiment: {}", self.sentiment),
        ]
    }
}

/// Pick the model-processed review when it is usable, else the raw one.
///
/// Line breaks are folded so the review stays on a single line.
pub fn accept_processed_review(candidate: Option<&Value>, raw: &str) -> String {
    match candidate.and_then(Value::as_str) {
        Some(text) if text.trim().chars().count() >= MIN_PROCESSED_REVIEW_LEN => {
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        }
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rating_accepts_one_through_five() {
        for r in 1..=5 {
            assert_eq!(Rating::parse(&r.to_string()).unwrap().value(), r as u8);
        }
        assert_eq!(Rating::parse(" 3 \n").unwrap().value(), 3);
    }

    #[test]
    fn test_rating_rejects_out_of_range_and_garbage() {
        assert_eq!(Rating::parse("0"), Err(RatingError::OutOfRange(0)));
        assert_eq!(Rating::parse("6"), Err(RatingError::OutOfRange(6)));
        assert_eq!(Rating::parse("-1"), Err(RatingError::OutOfRange(-1)));
        assert!(matches!(Rating::parse("abc"), Err(RatingError::NotANumber(_))));
        assert!(matches!(Rating::parse("4.5"), Err(RatingError::NotANumber(_))));
        assert!(matches!(Rating::parse(""), Err(RatingError::NotANumber(_))));
    }

    #[test]
    fn test_rating_from_json() {
        assert_eq!(Rating::from_json(&json!(4)).map(|r| r.value()), Some(4));
        assert_eq!(Rating::from_json(&json!(5.0)).map(|r| r.value()), Some(5));
        assert_eq!(Rating::from_json(&json!(4.5)), None);
        assert_eq!(Rating::from_json(&json!(9)), None);
        assert_eq!(Rating::from_json(&json!("4")), None);
    }

    #[test]
    fn test_feedback_rejects_blank_review() {
        let rating = Rating::new(3).unwrap();
        assert!(matches!(
            Feedback::new("   ", rating, Sentiment::Neutral),
            Err(FeedbackError::EmptyReview)
        ));
    }

    #[test]
    fn test_accept_processed_review() {
        assert_eq!(
            accept_processed_review(Some(&json!("Great chat.")), "grt chat"),
            "Great chat."
        );
        assert_eq!(accept_processed_review(Some(&json!(" ok ")), "fine"), "fine");
        assert_eq!(accept_processed_review(Some(&json!(42)), "fine"), "fine");
        assert_eq!(accept_processed_review(None, "fine"), "fine");
        assert_eq!(
            accept_processed_review(Some(&json!("Fast.\nAccurate.")), "raw"),
            "Fast. Accurate."
        );
    }

    #[test]
    fn test_summary_lines() {
        let feedback = Feedback::new("Great chat", Rating::new(5).unwrap(), Sentiment::Positive).unwrap();
        let lines = feedback.summary_lines();
        assert_eq!(lines[2], "FEEDBACK SUMMARY");
        assert_eq!(lines[4], "Rating: 5/5");
        assert_eq!(lines[6], "Sentiment: Positive");
    }
}
