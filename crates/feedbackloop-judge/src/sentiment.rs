use async_trait::async_trait;
use feedbackloop_model::ModelGateway;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::JudgePrompts;

/// Coarse polarity label attached to a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl Sentiment {
    /// Map a free-form model answer to a label.
    ///
    /// The answer is trimmed and capitalized first; anything other than the
    /// three polar labels becomes `Unknown`.
    pub fn from_label(answer: &str) -> Self {
        match capitalize(answer.trim()).as_str() {
            "Positive" => Sentiment::Positive,
            "Neutral" => Sentiment::Neutral,
            "Negative" => Sentiment::Negative,
            _ => Sentiment::Unknown,
        }
    }

    /// Threshold a compound polarity score in [-1, 1]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= 0.05 {
            Sentiment::Positive
        } else if compound <= -0.05 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
            Sentiment::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Which scorer backs sentiment labelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentimentStrategy {
    /// Ask the language model for a one-word label
    #[default]
    Model,
    /// Score locally against the built-in valence lexicon
    Lexicon,
}

impl std::fmt::Display for SentimentStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentStrategy::Model => write!(f, "model"),
            SentimentStrategy::Lexicon => write!(f, "lexicon"),
        }
    }
}

impl std::str::FromStr for SentimentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "model" | "llm" | "gemini" => Ok(SentimentStrategy::Model),
            "lexicon" | "local" | "vader" => Ok(SentimentStrategy::Lexicon),
            _ => Err(format!("Unknown sentiment strategy: {}", s)),
        }
    }
}

/// Maps free text to a [`Sentiment`]. Total: never fails.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &str;

    async fn score(&self, text: &str) -> Sentiment;
}

/// Delegates to the model with a fixed one-word instruction
pub struct ModelSentimentScorer<'a> {
    gateway: &'a dyn ModelGateway,
}

impl<'a> ModelSentimentScorer<'a> {
    pub fn new(gateway: &'a dyn ModelGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl SentimentScorer for ModelSentimentScorer<'_> {
    fn name(&self) -> &str {
        "model"
    }

    async fn score(&self, text: &str) -> Sentiment {
        let prompt = JudgePrompts::build_sentiment_prompt(text);
        match self.gateway.generate(&prompt).await {
            Ok(result) => {
                let sentiment = Sentiment::from_label(result.text());
                debug!(%sentiment, "Model sentiment scored");
                sentiment
            }
            Err(e) => {
                warn!(error = %e, "Sentiment analysis failed");
                Sentiment::Unknown
            }
        }
    }
}

/// Local VADER scorer; never returns `Unknown`
pub struct LexiconSentimentScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl LexiconSentimentScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Compound polarity in [-1, 1]
    pub fn compound(&self, text: &str) -> f64 {
        self.analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

impl Default for LexiconSentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentScorer for LexiconSentimentScorer {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn score(&self, text: &str) -> Sentiment {
        let compound = self.compound(text);
        debug!(compound, "Lexicon sentiment scored");
        Sentiment::from_compound(compound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedbackloop_model::{GatewayError, ScriptedGateway};

    #[test]
    fn test_from_label() {
        assert_eq!(Sentiment::from_label("Positive"), Sentiment::Positive);
        assert_eq!(Sentiment::from_label("  negative\n"), Sentiment::Negative);
        assert_eq!(Sentiment::from_label("NEUTRAL"), Sentiment::Neutral);
        assert_eq!(Sentiment::from_label("Positive."), Sentiment::Unknown);
        assert_eq!(Sentiment::from_label("mixed"), Sentiment::Unknown);
        assert_eq!(Sentiment::from_label(""), Sentiment::Unknown);
    }

    #[test]
    fn test_from_compound_thresholds() {
        assert_eq!(Sentiment::from_compound(0.05), Sentiment::Positive);
        assert_eq!(Sentiment::from_compound(0.049), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(-0.049), Sentiment::Neutral);
        assert_eq!(Sentiment::from_compound(-0.05), Sentiment::Negative);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("lexicon".parse::<SentimentStrategy>(), Ok(SentimentStrategy::Lexicon));
        assert_eq!("Model".parse::<SentimentStrategy>(), Ok(SentimentStrategy::Model));
        assert!("dice".parse::<SentimentStrategy>().is_err());
    }

    #[tokio::test]
    async fn test_model_scorer_maps_answers() {
        let gateway = ScriptedGateway::new();
        gateway
            .push_text("positive\n")
            .push_text("It is rather negative")
            .push_error(GatewayError::Transport("down".into()));

        let scorer = ModelSentimentScorer::new(&gateway);
        assert_eq!(scorer.score("Great chat").await, Sentiment::Positive);
        assert_eq!(scorer.score("meh").await, Sentiment::Unknown);
        assert_eq!(scorer.score("anything").await, Sentiment::Unknown);
        assert!(gateway.calls()[0].prompt.ends_with("Review: Great chat"));
    }

    #[tokio::test]
    async fn test_lexicon_scorer_never_unknown() {
        let scorer = LexiconSentimentScorer::new();
        for text in ["Great chat", "terrible and useless", "", "the bot answered", "!!!"] {
            assert_ne!(scorer.score(text).await, Sentiment::Unknown);
        }
    }

    #[test]
    fn test_lexicon_polarity() {
        let scorer = LexiconSentimentScorer::new();
        assert!(scorer.compound("Great chat") > 0.5);
        assert!(scorer.compound("terrible and useless") < -0.5);
        assert_eq!(scorer.compound(""), 0.0);
    }

    #[test]
    fn test_lexicon_negation_and_emphasis() {
        let scorer = LexiconSentimentScorer::new();
        assert!(scorer.compound("not good") < -0.05);
        assert!(scorer.compound("it was never helpful") < -0.05);
        assert!(scorer.compound("very good") > scorer.compound("good"));
        assert!(scorer.compound("good!!") > scorer.compound("good"));
        assert!(scorer.compound("the start was bad but the answers were great") > 0.05);
    }

    #[tokio::test]
    async fn test_lexicon_scorer_labels() {
        let scorer = LexiconSentimentScorer::new();
        assert_eq!(scorer.score("Helpful and friendly").await, Sentiment::Positive);
        assert_eq!(scorer.score("The answers were wrong and annoying").await, Sentiment::Negative);
        assert_eq!(scorer.score("the bot answered").await, Sentiment::Neutral);
    }
}
