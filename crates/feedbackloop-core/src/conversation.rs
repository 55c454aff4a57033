use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use feedbackloop_feedback::{Console, Feedback, FeedbackExtractor, RULE_WIDTH};
use feedbackloop_judge::ExitIntentClassifier;
use feedbackloop_logging::{FeedbackWriter, LogEvent, Logger, TranscriptWriter};
use feedbackloop_model::{ChatHistory, GatewayError, ModelGateway};

use crate::context::{ChatContext, ConversationState};
use crate::error::LoopError;
use crate::outcome::SessionOutcome;

const CHAT_PROMPT: &str = "You: ";

/// Orchestrates one chat session from greeting to goodbye
pub struct ConversationLoop<'a> {
    gateway: &'a dyn ModelGateway,
    console: &'a dyn Console,
    extractor: FeedbackExtractor<'a>,
    transcript: TranscriptWriter,
    feedback_log: FeedbackWriter,
    logger: Arc<Logger>,
    greeting: String,
}

impl<'a> ConversationLoop<'a> {
    pub fn new(
        gateway: &'a dyn ModelGateway,
        console: &'a dyn Console,
        extractor: FeedbackExtractor<'a>,
        transcript: TranscriptWriter,
        feedback_log: FeedbackWriter,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            gateway,
            console,
            extractor,
            transcript,
            feedback_log,
            logger,
            greeting: ChatHistory::DEFAULT_GREETING.to_string(),
        }
    }

    /// Synthetic first user turn of every history
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Run until the user leaves or input closes
    pub async fn run(&self) -> SessionOutcome {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until the session ends or `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> SessionOutcome
    where
        F: Future<Output = ()>,
    {
        let mut context = self.new_context();
        self.run_with(&mut context, shutdown).await
    }

    /// Fresh session state holding only the greeting
    pub fn new_context(&self) -> ChatContext {
        ChatContext::new(self.greeting.clone())
    }

    /// Run a session over caller-owned state.
    ///
    /// On shutdown whatever call is in flight is dropped; nothing of that
    /// turn is persisted.
    pub async fn run_with<F>(&self, context: &mut ChatContext, shutdown: F) -> SessionOutcome
    where
        F: Future<Output = ()>,
    {
        self.logger.log(&LogEvent::SessionStarted {
            provider: self.gateway.name().to_string(),
            model: self.gateway.model().to_string(),
            transcript_file: self.transcript.path().to_path_buf(),
            feedback_file: self.feedback_log.path().to_path_buf(),
        });
        self.print_banner();

        tokio::pin!(shutdown);
        let result = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            result = self.drive(context) => Some(result),
        };

        let turns = context.exchanges();
        let duration = context.total_duration();
        let outcome = match result {
            None => {
                info!("Chat interrupted by user");
                self.console.say("\nChat terminated by user.");
                SessionOutcome::interrupted(turns, duration)
            }
            Some(Ok(())) => SessionOutcome::completed(turns, context.feedback.clone(), duration),
            Some(Err(LoopError::InputClosed)) => {
                info!(state = %context.state, "Input closed");
                if context.state == ConversationState::AwaitingFeedback {
                    self.logger.log(&LogEvent::FeedbackSkipped {
                        reason: "input closed".to_string(),
                    });
                }
                self.console.say("Input closed. Goodbye!");
                SessionOutcome::input_closed(turns, duration)
            }
            Some(Err(e)) => {
                warn!(error = %e, "Chat session failed");
                self.console.say(&format!("An error occurred: {}", e));
                SessionOutcome::failed(turns, e.to_string(), duration)
            }
        };

        self.logger.log(&LogEvent::SessionEnded {
            outcome: outcome.label().to_string(),
            turns: outcome.turns(),
            duration_secs: duration.as_secs_f64(),
        });

        outcome
    }

    fn print_banner(&self) {
        self.console.say("Welcome to the feedbackloop chat!");
        self.console.say(
            "Type your messages and press Enter. Type 'exit', 'bye', or similar to end the chat.",
        );
        self.console.say(&"-".repeat(RULE_WIDTH));
    }

    /// Step the state machine until it terminates
    async fn drive(&self, context: &mut ChatContext) -> Result<(), LoopError> {
        loop {
            let next = match context.state {
                ConversationState::Chatting => self.chat_turn(context).await?,
                ConversationState::AwaitingFeedback => {
                    context.feedback = self.collect_feedback(&context.history).await?;
                    ConversationState::Terminated
                }
                ConversationState::Terminated => return Ok(()),
            };
            if next != context.state {
                debug!(from = %context.state, to = %next, "State transition");
            }
            context.state = next;
        }
    }

    /// Read one message and either reply to it or move on to feedback
    async fn chat_turn(&self, context: &mut ChatContext) -> Result<ConversationState, LoopError> {
        let line = self
            .console
            .read_line(CHAT_PROMPT)
            .await?
            .ok_or(LoopError::InputClosed)?;
        let message = line.as_str();

        context.turn += 1;
        let turn = context.turn;
        self.logger.log(&LogEvent::TurnStarted {
            turn,
            message_preview: message.chars().take(100).collect(),
        });

        context.history.push_user(message);

        let classifier = ExitIntentClassifier::new(self.gateway);
        let exit = match classifier.classify(message).await {
            Ok(exit) => exit,
            Err(e) => {
                warn!(turn, error = %e, "Exit intent classification failed, continuing");
                self.logger.log(&LogEvent::ClassifierFailed {
                    turn,
                    error: e.to_string(),
                });
                false
            }
        };
        self.logger.log(&LogEvent::ExitIntentClassified { turn, exit });

        if exit {
            return Ok(ConversationState::AwaitingFeedback);
        }

        let started = Instant::now();
        let reply = self
            .gateway
            .generate(&context.history.render_prompt())
            .await
            .and_then(|result| {
                let text = result.into_text();
                if text.trim().is_empty() {
                    Err(GatewayError::EmptyResponse)
                } else {
                    Ok(text)
                }
            });
        match reply {
            Ok(reply) => {
                self.console.say("Bot:");
                self.console.say(&reply);
                context.history.push_model(reply.as_str());
                self.logger.log(&LogEvent::ReplyReceived {
                    turn,
                    reply_chars: reply.chars().count(),
                    duration_secs: started.elapsed().as_secs_f64(),
                });

                if let Err(e) = self.transcript.append_exchange(message, &reply) {
                    warn!(error = %e, "Failed to append to transcript");
                    self.console
                        .say(&format!("Failed to save chat history: {}", e));
                    self.logger.log(&LogEvent::PersistenceFailed {
                        target: self.transcript.path().display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
            Err(e) => {
                context.history.rollback_user_turn();
                match &e {
                    GatewayError::EmptyResponse => {
                        self.console.say("Error: Received empty response from API")
                    }
                    other => self
                        .console
                        .say(&format!("Error getting response from API: {}", other)),
                }
                self.logger.log(&LogEvent::ReplyFailed {
                    turn,
                    error: e.to_string(),
                    transient: e.is_transient(),
                });
            }
        }

        Ok(ConversationState::Chatting)
    }

    async fn collect_feedback(&self, history: &ChatHistory) -> Result<Option<Feedback>, LoopError> {
        self.logger.log(&LogEvent::FeedbackStarted {
            mode: self.extractor.mode().to_string(),
            scorer: self.extractor.scorer_name().to_string(),
        });

        let Some(feedback) = self.extractor.collect(history).await? else {
            self.logger.log(&LogEvent::FeedbackSkipped {
                reason: "no feedback collected".to_string(),
            });
            self.console.say("Goodbye!");
            return Ok(None);
        };

        self.save_feedback(&feedback);
        self.console.say(&format!(
            "Thank you for your feedback! Review: {}, Rating: {}/5",
            feedback.review(),
            feedback.rating()
        ));
        self.console.say("Goodbye!");

        Ok(Some(feedback))
    }

    /// A failed write is reported; the session still ends normally
    fn save_feedback(&self, feedback: &Feedback) {
        let result = self.feedback_log.append(
            feedback.review(),
            feedback.rating().value(),
            feedback.sentiment().as_str(),
        );

        match result {
            Ok(()) => {
                self.console.say(&format!(
                    "Feedback saved successfully to {}",
                    self.feedback_log.path().display()
                ));
                self.logger.log(&LogEvent::FeedbackSaved {
                    rating: feedback.rating().value(),
                    sentiment: feedback.sentiment().to_string(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to save feedback");
                self.console.say(&format!("Failed to save feedback: {}", e));
                self.logger.log(&LogEvent::PersistenceFailed {
                    target: self.feedback_log.path().display().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}
