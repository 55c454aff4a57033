use feedbackloop_feedback::Feedback;
use serde::Serialize;
use std::time::Duration;

/// The final outcome of a chat session
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The user asked to leave; feedback may or may not have been given
    Completed {
        turns: usize,
        feedback: Option<Feedback>,
        total_duration_secs: f64,
    },
    /// User pressed Ctrl+C
    Interrupted {
        turns: usize,
        total_duration_secs: f64,
    },
    /// Standard input reached end of file
    InputClosed {
        turns: usize,
        total_duration_secs: f64,
    },
    /// Unrecoverable error
    Failed {
        turns: usize,
        error: String,
        total_duration_secs: f64,
    },
}

impl SessionOutcome {
    pub fn completed(turns: usize, feedback: Option<Feedback>, duration: Duration) -> Self {
        Self::Completed {
            turns,
            feedback,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn interrupted(turns: usize, duration: Duration) -> Self {
        Self::Interrupted {
            turns,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn input_closed(turns: usize, duration: Duration) -> Self {
        Self::InputClosed {
            turns,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn failed(turns: usize, error: String, duration: Duration) -> Self {
        Self::Failed {
            turns,
            error,
            total_duration_secs: duration.as_secs_f64(),
        }
    }

    /// Completed user/model exchanges
    pub fn turns(&self) -> usize {
        match self {
            Self::Completed { turns, .. } => *turns,
            Self::Interrupted { turns, .. } => *turns,
            Self::InputClosed { turns, .. } => *turns,
            Self::Failed { turns, .. } => *turns,
        }
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            Self::Completed { feedback, .. } => feedback.as_ref(),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Interrupted { .. } => "interrupted",
            Self::InputClosed { .. } => "input_closed",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed { .. } => 0,
            Self::Interrupted { .. } => 130,
            Self::InputClosed { .. } => 0,
            Self::Failed { .. } => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let d = Duration::from_secs(1);
        assert_eq!(SessionOutcome::completed(2, None, d).exit_code(), 0);
        assert_eq!(SessionOutcome::interrupted(2, d).exit_code(), 130);
        assert_eq!(SessionOutcome::input_closed(2, d).exit_code(), 0);
        assert_eq!(SessionOutcome::failed(2, "boom".into(), d).exit_code(), 2);
    }

    #[test]
    fn test_serializes_with_status_tag() {
        let outcome = SessionOutcome::interrupted(3, Duration::from_millis(1500));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "interrupted");
        assert_eq!(json["turns"], 3);
        assert_eq!(json["total_duration_secs"], 1.5);
    }
}
