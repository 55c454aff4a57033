use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Structured log events for a chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LogEvent {
    SessionStarted {
        provider: String,
        model: String,
        transcript_file: PathBuf,
        feedback_file: PathBuf,
    },
    TurnStarted {
        turn: usize,
        message_preview: String,
    },
    ExitIntentClassified {
        turn: usize,
        exit: bool,
    },
    ClassifierFailed {
        turn: usize,
        error: String,
    },
    ReplyReceived {
        turn: usize,
        reply_chars: usize,
        duration_secs: f64,
    },
    ReplyFailed {
        turn: usize,
        error: String,
        transient: bool,
    },
    FeedbackStarted {
        mode: String,
        scorer: String,
    },
    FeedbackSaved {
        rating: u8,
        sentiment: String,
    },
    FeedbackSkipped {
        reason: String,
    },
    PersistenceFailed {
        target: String,
        error: String,
    },
    SessionEnded {
        outcome: String,
        turns: usize,
        duration_secs: f64,
    },
}

impl LogEvent {
    /// Add a timestamp to serialize with the event
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Logger for session events - writes to stderr and optionally to a JSONL file
pub struct Logger {
    format: LogFormat,
    file_writer: Option<Mutex<File>>,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            file_writer: None,
        }
    }

    /// Create a logger that also appends every event to `log_path`
    pub fn with_file(format: LogFormat, log_path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            format,
            file_writer: Some(Mutex::new(file)),
        })
    }

    pub fn log(&self, event: &LogEvent) {
        // File output is always JSON
        if let Some(ref writer) = self.file_writer {
            if let Ok(mut file) = writer.lock() {
                let json = event.with_timestamp();
                let _ = writeln!(file, "{}", json);
            }
        }

        match self.format {
            LogFormat::Json => self.log_json(event),
            LogFormat::Pretty => self.log_pretty(event),
            LogFormat::Compact => self.log_compact(event),
        }
    }

    fn log_json(&self, event: &LogEvent) {
        if let Ok(json) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{}", json);
        }
    }

    /// The chat itself is on stdout; only problems and the saved feedback are shown
    fn log_pretty(&self, event: &LogEvent) {
        let mut stderr = std::io::stderr();
        match event {
            LogEvent::ClassifierFailed { error, .. } => {
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    "⚠".bright_yellow(),
                    format!("Exit check unavailable, continuing: {}", error).dimmed()
                );
            }
            LogEvent::ReplyFailed {
                error, transient, ..
            } => {
                let hint = if *transient { " (try again)" } else { "" };
                let _ = writeln!(
                    stderr,
                    "{} {}{}",
                    "✗".bright_red(),
                    error.bright_red(),
                    hint.dimmed()
                );
            }
            LogEvent::PersistenceFailed { target, error } => {
                let _ = writeln!(
                    stderr,
                    "{} Could not write {}: {}",
                    "✗".bright_red(),
                    target,
                    error.bright_red()
                );
            }
            LogEvent::FeedbackSaved { rating, sentiment } => {
                let _ = writeln!(
                    stderr,
                    "{} {}",
                    "✓".bright_green(),
                    format!("Feedback saved ({}/5, {})", rating, sentiment).dimmed()
                );
            }
            LogEvent::SessionStarted { .. }
            | LogEvent::TurnStarted { .. }
            | LogEvent::ExitIntentClassified { .. }
            | LogEvent::ReplyReceived { .. }
            | LogEvent::FeedbackStarted { .. }
            | LogEvent::FeedbackSkipped { .. }
            | LogEvent::SessionEnded { .. } => {}
        }
    }

    fn log_compact(&self, event: &LogEvent) {
        let timestamp = chrono::Utc::now().format("%H:%M:%S");
        let _ = writeln!(
            std::io::stderr(),
            "[{}] {}",
            timestamp,
            Self::compact_line(event)
        );
    }

    fn compact_line(event: &LogEvent) -> String {
        match event {
            LogEvent::SessionStarted {
                provider, model, ..
            } => format!("session:start {}/{}", provider, model),
            LogEvent::TurnStarted { turn, .. } => format!("turn:start:{}", turn),
            LogEvent::ExitIntentClassified { turn, exit } => {
                format!("turn:exit:{} {}", turn, exit)
            }
            LogEvent::ClassifierFailed { turn, error } => {
                format!("turn:exit:{} error={}", turn, error)
            }
            LogEvent::ReplyReceived {
                turn,
                reply_chars,
                duration_secs,
            } => format!(
                "turn:reply:{} {}c {:.1}s",
                turn, reply_chars, duration_secs
            ),
            LogEvent::ReplyFailed {
                turn,
                error,
                transient,
            } => format!("turn:error:{} transient={} {}", turn, transient, error),
            LogEvent::FeedbackStarted { mode, scorer } => {
                format!("feedback:start {} scorer={}", mode, scorer)
            }
            LogEvent::FeedbackSaved { rating, sentiment } => {
                format!("feedback:saved {}/5 {}", rating, sentiment)
            }
            LogEvent::FeedbackSkipped { reason } => format!("feedback:skipped {}", reason),
            LogEvent::PersistenceFailed { target, error } => {
                format!("write:error {} {}", target, error)
            }
            LogEvent::SessionEnded {
                outcome,
                turns,
                duration_secs,
            } => format!("session:end {} turns={} {:.1}s", outcome, turns, duration_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = LogEvent::ExitIntentClassified { turn: 2, exit: true };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "exit_intent_classified");
        assert_eq!(json["turn"], 2);
        assert_eq!(json["exit"], true);
    }

    #[test]
    fn test_file_logger_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");

        let logger = Logger::with_file(LogFormat::Compact, &path).unwrap();
        logger.log(&LogEvent::FeedbackStarted {
            mode: "interactive".into(),
            scorer: "lexicon".into(),
        });
        logger.log(&LogEvent::FeedbackSkipped {
            reason: "input closed".into(),
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "feedback_started");
        assert!(lines[1]["timestamp"].is_string());
    }

    #[test]
    fn test_compact_line() {
        let line = Logger::compact_line(&LogEvent::FeedbackSaved {
            rating: 4,
            sentiment: "Positive".into(),
        });
        assert_eq!(line, "feedback:saved 4/5 Positive");

        let line = Logger::compact_line(&LogEvent::ReplyFailed {
            turn: 3,
            error: "timed out".into(),
            transient: true,
        });
        assert_eq!(line, "turn:error:3 transient=true timed out");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
