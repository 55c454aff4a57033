mod config;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::warn;

use feedbackloop_core::{ConversationLoop, SessionOutcome};
use feedbackloop_feedback::{FeedbackExtractor, FeedbackMode, StdConsole};
use feedbackloop_judge::{
    LexiconSentimentScorer, ModelSentimentScorer, SentimentScorer, SentimentStrategy,
};
use feedbackloop_logging::{init_tracing, FeedbackWriter, LogFormat, Logger, TranscriptWriter};
use feedbackloop_model::GeminiGateway;

use config::{
    missing_credential_help, AppConfig, ConfigError, ConfigOverrides, DotEnv, ProjectConfig,
};
use report::{handle_feedback_command, FeedbackAction};

#[derive(Parser, Debug)]
#[command(
    name = "feedbackloop",
    about = "Chat with a language model and collect feedback on the way out",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Working directory (default: current directory)
    #[arg(short = 'd', long, global = true)]
    working_dir: Option<PathBuf>,

    /// Diagnostic log level, used when RUST_LOG is not set
    #[arg(long, default_value = "error", global = true)]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a chat session (default)
    Chat(ChatArgs),

    /// Inspect recorded feedback
    Feedback {
        /// Feedback file (default: from feedbackloop.toml, else ./feedback.txt)
        #[arg(long)]
        file: Option<PathBuf>,

        #[command(subcommand)]
        action: FeedbackAction,
    },
}

#[derive(Args, Debug, Default)]
struct ChatArgs {
    /// Model to chat with
    #[arg(short, long)]
    model: Option<String>,

    /// Model API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Environment variable holding the API key
    #[arg(long)]
    api_key_env: Option<String>,

    /// Transcript file (default: ./chat_history.txt)
    #[arg(long)]
    transcript_file: Option<PathBuf>,

    /// Feedback file (default: ./feedback.txt)
    #[arg(long)]
    feedback_file: Option<PathBuf>,

    /// How review sentiment is scored
    #[arg(long, value_enum)]
    sentiment: Option<SentimentChoice>,

    /// How exit feedback is gathered
    #[arg(long, value_enum)]
    feedback_mode: Option<FeedbackModeChoice>,

    /// Accept any non-empty review without asking the model
    #[arg(long)]
    no_validate: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Synthetic first user message of the conversation
    #[arg(long)]
    greeting: Option<String>,

    /// Also append session events as JSON lines to this file
    #[arg(long)]
    events_file: Option<PathBuf>,

    /// Write daily diagnostic trace files to the user data directory
    #[arg(long)]
    trace: bool,

    /// Print the session outcome as JSON when the chat ends
    #[arg(long)]
    json_output: bool,

    /// Dry run: show the resolved configuration without contacting the model
    #[arg(long)]
    dry_run: bool,
}

impl ChatArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            api_key_env: self.api_key_env.clone(),
            transcript_file: self.transcript_file.clone(),
            feedback_file: self.feedback_file.clone(),
            sentiment: self.sentiment.map(Into::into),
            feedback_mode: self.feedback_mode.map(Into::into),
            validate_reviews: self.no_validate.then_some(false),
            timeout_secs: self.timeout_secs,
            greeting: self.greeting.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SentimentChoice {
    Model,
    Lexicon,
}

impl From<SentimentChoice> for SentimentStrategy {
    fn from(choice: SentimentChoice) -> Self {
        match choice {
            SentimentChoice::Model => SentimentStrategy::Model,
            SentimentChoice::Lexicon => SentimentStrategy::Lexicon,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeedbackModeChoice {
    Interactive,
    Announce,
}

impl From<FeedbackModeChoice> for FeedbackMode {
    fn from(choice: FeedbackModeChoice) -> Self {
        match choice {
            FeedbackModeChoice::Interactive => FeedbackMode::Interactive,
            FeedbackModeChoice::Announce => FeedbackMode::Announce,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let working_dir = match cli.working_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let project = ProjectConfig::load(&working_dir)?;
    let dotenv = DotEnv::load(&working_dir)?;
    let log_format: LogFormat = cli.log_format.into();

    let code = match cli.command {
        Some(Command::Feedback { file, action }) => {
            let overrides = ConfigOverrides {
                feedback_file: file,
                ..Default::default()
            };
            let config =
                AppConfig::resolve(project, overrides, &working_dir, |var| dotenv.lookup(var))?;
            handle_feedback_command(action, &config.feedback_file)?;
            0
        }
        Some(Command::Chat(args)) => {
            run_chat(args, project, &dotenv, &working_dir, &cli.log_level, log_format).await?
        }
        None => {
            run_chat(
                ChatArgs::default(),
                project,
                &dotenv,
                &working_dir,
                &cli.log_level,
                log_format,
            )
            .await?
        }
    };

    // A pending stdin read would hold up runtime shutdown, so exit directly
    std::process::exit(i32::from(code));
}

/// Run one chat session and return its exit code.
///
/// The trace guard is dropped on return, flushing the trace file before the
/// process exits.
async fn run_chat(
    args: ChatArgs,
    project: Option<ProjectConfig>,
    dotenv: &DotEnv,
    working_dir: &Path,
    log_level: &str,
    log_format: LogFormat,
) -> Result<u8> {
    let trace_dir = if args.trace {
        let dir = dirs::data_dir()
            .context("Could not determine data directory")?
            .join("feedbackloop")
            .join("logs");
        Some(dir)
    } else {
        None
    };
    let _trace_guard = init_tracing(log_level, log_format, trace_dir.as_deref())
        .context("Failed to initialize tracing")?;

    let config =
        AppConfig::resolve(project, args.overrides(), working_dir, |var| dotenv.lookup(var))?;

    if args.dry_run {
        println!("=== Dry Run ===");
        println!("Working dir: {}", working_dir.display());
        for (label, value) in config.describe() {
            println!("{}: {}", label, value);
        }
        return Ok(0);
    }

    let gateway_config = match config.gateway_config() {
        Ok(gateway_config) => gateway_config,
        Err(ConfigError::MissingCredential { var }) => {
            warn!(%var, "Model credential missing");
            for line in missing_credential_help(&var, working_dir) {
                eprintln!("{}", line);
            }
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };
    let gateway = GeminiGateway::new(gateway_config).context("Failed to create model client")?;

    let console = StdConsole::new();
    let scorer: Box<dyn SentimentScorer + '_> = match config.sentiment {
        SentimentStrategy::Model => Box::new(ModelSentimentScorer::new(&gateway)),
        SentimentStrategy::Lexicon => Box::new(LexiconSentimentScorer::new()),
    };
    let extractor = FeedbackExtractor::new(&gateway, scorer.as_ref(), &console)
        .with_mode(config.feedback_mode)
        .with_review_validation(config.validate_reviews);

    let logger = match args.events_file {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open events file {}", path.display()))?,
        None => Logger::new(log_format),
    };

    let chat = ConversationLoop::new(
        &gateway,
        &console,
        extractor,
        TranscriptWriter::new(config.transcript_file.clone()),
        FeedbackWriter::new(config.feedback_file.clone()),
        Arc::new(logger),
    )
    .with_greeting(config.greeting.clone());

    let outcome = chat.run_until(shutdown_signal()).await;

    if args.json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if let SessionOutcome::Failed { error, .. } = &outcome {
        eprintln!("Session failed: {}", error);
    }

    Ok(outcome.exit_code())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
