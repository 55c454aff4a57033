//! Configuration for feedbackloop.
//!
//! Loads optional settings from `feedbackloop.toml` in the working directory,
//! applies command-line overrides, and resolves the model credential from the
//! environment or a `.env` file.

use feedbackloop_feedback::FeedbackMode;
use feedbackloop_judge::SentimentStrategy;
use feedbackloop_model::{ChatHistory, GatewayConfig};
use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "feedbackloop.toml";

pub const DOTENV_FILE_NAME: &str = ".env";

pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_TRANSCRIPT_FILE: &str = "chat_history.txt";
pub const DEFAULT_FEEDBACK_FILE: &str = "feedback.txt";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to load {path}: {source}")]
    DotEnv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("{var} not found in the environment")]
    MissingCredential { var: String },
}

/// Project-level configuration loaded from `feedbackloop.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub transcript_file: Option<PathBuf>,
    pub feedback_file: Option<PathBuf>,
    /// `model` or `lexicon`
    pub sentiment: Option<String>,
    /// `interactive` or `announce`
    pub feedback_mode: Option<String>,
    pub validate_reviews: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub greeting: Option<String>,
}

impl ProjectConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path.clone(),
            source,
        })?;

        Ok(Some(config))
    }
}

/// Variables from an optional `.env` file in the working directory.
///
/// The process environment is not modified; callers consult these only when
/// a variable is missing from the real environment.
#[derive(Debug, Default)]
pub struct DotEnv {
    vars: HashMap<String, String>,
}

impl DotEnv {
    pub fn load(working_dir: &Path) -> Result<Self, ConfigError> {
        let path = working_dir.join(DOTENV_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let to_error = |source| ConfigError::DotEnv {
            path: path.clone(),
            source,
        };
        let vars = dotenvy::from_path_iter(&path)
            .map_err(to_error)?
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(to_error)?;

        Ok(Self { vars })
    }

    pub fn get(&self, var: &str) -> Option<String> {
        self.vars.get(var).cloned()
    }

    /// The process environment first, then the file
    pub fn lookup(&self, var: &str) -> Option<String> {
        std::env::var(var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.get(var))
    }
}

/// Remediation shown when the credential is missing
pub fn missing_credential_help(var: &str, working_dir: &Path) -> Vec<String> {
    vec![
        format!("Error: {} not found in the environment.", var),
        "Set it before starting the chat:".to_string(),
        format!("  export {}=your_api_key_here", var),
        format!(
            "or add this line to {}:",
            working_dir.join(DOTENV_FILE_NAME).display()
        ),
        format!("  {}=your_api_key_here", var),
    ]
}

/// Values given on the command line; each one beats the config file
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub transcript_file: Option<PathBuf>,
    pub feedback_file: Option<PathBuf>,
    pub sentiment: Option<SentimentStrategy>,
    pub feedback_mode: Option<FeedbackMode>,
    pub validate_reviews: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub greeting: Option<String>,
}

/// Fully resolved settings for one run
#[derive(Debug)]
pub struct AppConfig {
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub api_key: Option<SecretString>,
    pub transcript_file: PathBuf,
    pub feedback_file: PathBuf,
    pub sentiment: SentimentStrategy,
    pub feedback_mode: FeedbackMode,
    pub validate_reviews: bool,
    pub timeout: Duration,
    pub greeting: String,
}

impl AppConfig {
    /// Merge defaults, file and overrides. Relative paths resolve against `working_dir`.
    ///
    /// `lookup_env` reads the credential; an empty value counts as missing.
    pub fn resolve(
        project: Option<ProjectConfig>,
        overrides: ConfigOverrides,
        working_dir: &Path,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let project = project.unwrap_or_default();

        let sentiment = match (overrides.sentiment, project.sentiment) {
            (Some(strategy), _) => strategy,
            (None, Some(raw)) => raw.parse().map_err(|message| ConfigError::Invalid {
                field: "sentiment",
                message,
            })?,
            (None, None) => SentimentStrategy::default(),
        };

        let feedback_mode = match (overrides.feedback_mode, project.feedback_mode) {
            (Some(mode), _) => mode,
            (None, Some(raw)) => raw.parse().map_err(|message| ConfigError::Invalid {
                field: "feedback_mode",
                message,
            })?,
            (None, None) => FeedbackMode::default(),
        };

        let timeout_secs = overrides
            .timeout_secs
            .or(project.timeout_secs)
            .unwrap_or(GatewayConfig::DEFAULT_TIMEOUT.as_secs());
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }

        let api_key_env = overrides
            .api_key_env
            .or(project.api_key_env)
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        let api_key = lookup_env(&api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(SecretString::from);

        let resolve_path = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                working_dir.join(path)
            }
        };

        Ok(Self {
            model: overrides
                .model
                .or(project.model)
                .unwrap_or_else(|| GatewayConfig::DEFAULT_MODEL.to_string()),
            base_url: overrides
                .base_url
                .or(project.base_url)
                .unwrap_or_else(|| GatewayConfig::DEFAULT_BASE_URL.to_string()),
            api_key_env,
            api_key,
            transcript_file: resolve_path(
                overrides
                    .transcript_file
                    .or(project.transcript_file)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSCRIPT_FILE)),
            ),
            feedback_file: resolve_path(
                overrides
                    .feedback_file
                    .or(project.feedback_file)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_FEEDBACK_FILE)),
            ),
            sentiment,
            feedback_mode,
            validate_reviews: overrides
                .validate_reviews
                .or(project.validate_reviews)
                .unwrap_or(true),
            timeout: Duration::from_secs(timeout_secs),
            greeting: overrides
                .greeting
                .or(project.greeting)
                .unwrap_or_else(|| ChatHistory::DEFAULT_GREETING.to_string()),
        })
    }

    /// Gateway settings, or the missing-credential error
    pub fn gateway_config(&self) -> Result<GatewayConfig, ConfigError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingCredential {
                var: self.api_key_env.clone(),
            })?;

        Ok(GatewayConfig::new(api_key)
            .with_model(self.model.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout))
    }

    /// Human-readable settings with the credential redacted
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Model", self.model.clone()),
            ("Base URL", self.base_url.clone()),
            (
                "API key",
                match self.api_key {
                    Some(_) => format!("set via {} (redacted)", self.api_key_env),
                    None => format!("missing ({} not set)", self.api_key_env),
                },
            ),
            ("Transcript", self.transcript_file.display().to_string()),
            ("Feedback", self.feedback_file.display().to_string()),
            ("Sentiment", self.sentiment.to_string()),
            ("Feedback mode", self.feedback_mode.to_string()),
            ("Validate reviews", self.validate_reviews.to_string()),
            ("Timeout", format!("{}s", self.timeout.as_secs())),
            ("Greeting", self.greeting.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_load_no_config_file() {
        let dir = TempDir::new().unwrap();
        let result = ProjectConfig::load(dir.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
model = "gemini-1.5-pro"
base_url = "http://localhost:8080"
api_key_env = "MY_KEY"
transcript_file = "logs/chat.txt"
feedback_file = "/var/tmp/feedback.txt"
sentiment = "lexicon"
feedback_mode = "announce"
validate_reviews = false
timeout_secs = 15
greeting = "Hi"
"#,
        )
        .unwrap();

        let project = ProjectConfig::load(dir.path()).unwrap();
        let config = AppConfig::resolve(project, ConfigOverrides::default(), dir.path(), |var| {
            (var == "MY_KEY").then(|| "secret".to_string())
        })
        .unwrap();

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.api_key.as_ref().unwrap().expose_secret(), "secret");
        assert_eq!(config.transcript_file, dir.path().join("logs/chat.txt"));
        assert_eq!(config.feedback_file, PathBuf::from("/var/tmp/feedback.txt"));
        assert_eq!(config.sentiment, SentimentStrategy::Lexicon);
        assert_eq!(config.feedback_mode, FeedbackMode::Announce);
        assert!(!config.validate_reviews);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.greeting, "Hi");
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config =
            AppConfig::resolve(None, ConfigOverrides::default(), dir.path(), no_env).unwrap();

        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
        assert!(config.api_key.is_none());
        assert_eq!(config.transcript_file, dir.path().join("chat_history.txt"));
        assert_eq!(config.feedback_file, dir.path().join("feedback.txt"));
        assert_eq!(config.sentiment, SentimentStrategy::Model);
        assert_eq!(config.feedback_mode, FeedbackMode::Interactive);
        assert!(config.validate_reviews);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.greeting, "Hello!");
    }

    #[test]
    fn test_overrides_beat_file() {
        let dir = TempDir::new().unwrap();
        let project = ProjectConfig {
            model: Some("from-file".to_string()),
            sentiment: Some("lexicon".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            model: Some("from-cli".to_string()),
            sentiment: Some(SentimentStrategy::Model),
            ..Default::default()
        };

        let config = AppConfig::resolve(Some(project), overrides, dir.path(), no_env).unwrap();
        assert_eq!(config.model, "from-cli");
        assert_eq!(config.sentiment, SentimentStrategy::Model);
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "temperature = 0.5\n").unwrap();
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_feedback_mode() {
        let dir = TempDir::new().unwrap();
        let project = ProjectConfig {
            feedback_mode: Some("shout".to_string()),
            ..Default::default()
        };
        let result = AppConfig::resolve(Some(project), ConfigOverrides::default(), dir.path(), no_env);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "feedback_mode",
                ..
            })
        ));
    }

    #[test]
    fn test_blank_credential_is_missing() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(None, ConfigOverrides::default(), dir.path(), |_| {
            Some("   ".to_string())
        })
        .unwrap();

        let err = config.gateway_config().unwrap_err();
        assert_eq!(err.to_string(), "GEMINI_API_KEY not found in the environment");
    }

    #[test]
    fn test_describe_redacts_key() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(None, ConfigOverrides::default(), dir.path(), |_| {
            Some("super-secret".to_string())
        })
        .unwrap();

        let described = config.describe();
        assert!(described.iter().all(|(_, v)| !v.contains("super-secret")));
        assert!(config.gateway_config().is_ok());
    }

    #[test]
    fn test_dotenv_supplies_credential() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(DOTENV_FILE_NAME),
            "# local settings\nFEEDBACKLOOP_DOTENV_TEST_KEY=from-dotenv\nOTHER=\"quoted value\"\n",
        )
        .unwrap();

        let dotenv = DotEnv::load(dir.path()).unwrap();
        assert_eq!(dotenv.get("OTHER").as_deref(), Some("quoted value"));

        let overrides = ConfigOverrides {
            api_key_env: Some("FEEDBACKLOOP_DOTENV_TEST_KEY".to_string()),
            ..Default::default()
        };
        let config =
            AppConfig::resolve(None, overrides, dir.path(), |var| dotenv.lookup(var)).unwrap();
        assert_eq!(
            config.gateway_config().unwrap().api_key.expose_secret(),
            "from-dotenv"
        );
    }

    #[test]
    fn test_missing_dotenv_is_empty() {
        let dir = TempDir::new().unwrap();
        let dotenv = DotEnv::load(dir.path()).unwrap();
        assert!(dotenv.get("GEMINI_API_KEY").is_none());
    }

    #[test]
    fn test_malformed_dotenv_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DOTENV_FILE_NAME), "KEY='unterminated\n").unwrap();
        assert!(matches!(
            DotEnv::load(dir.path()),
            Err(ConfigError::DotEnv { .. })
        ));
    }

    #[test]
    fn test_missing_credential_help_mentions_dotenv() {
        let dir = TempDir::new().unwrap();
        let help = missing_credential_help("GEMINI_API_KEY", dir.path());
        assert!(help.contains(&"  export GEMINI_API_KEY=your_api_key_here".to_string()));
        assert!(help.contains(&"  GEMINI_API_KEY=your_api_key_here".to_string()));
        assert!(help
            .iter()
            .any(|line| line.contains(&dir.path().join(".env").display().to_string())));
    }
}
