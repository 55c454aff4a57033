mod intent;
mod prompts;
mod sentiment;
mod validator;

pub use intent::{parse_exit_verdict, ExitIntentClassifier};
pub use prompts::JudgePrompts;
pub use sentiment::{
    LexiconSentimentScorer, ModelSentimentScorer, Sentiment, SentimentScorer, SentimentStrategy,
};
pub use validator::ReviewValidator;
