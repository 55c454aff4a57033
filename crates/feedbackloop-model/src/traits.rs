use async_trait::async_trait;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a model gateway.
///
/// Transport, authentication and quota failures are kept apart so callers
/// can pick their own fallback.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to reach the model API: {0}")]
    Transport(String),

    #[error("Model request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model API rejected the credential: {0}")]
    AuthenticationFailed(String),

    #[error("Model API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Model API returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Failed to parse model response: {0}")]
    Deserialization(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Gateway configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether the failure comes from the network path rather than the request itself
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::Transport(_) | GatewayError::Timeout(_) | GatewayError::QuotaExceeded(_)
        )
    }
}

/// Structured arguments returned when the model answers with a function call
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Map<String, Value>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }
}

/// Result of one generate call.
///
/// Callers match on the variant instead of probing for a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateResult {
    /// Plain generated text
    Text(String),
    /// Generated text (possibly empty) plus a structured function call
    TextWithCall(String, FunctionCall),
}

impl GenerateResult {
    pub fn text(&self) -> &str {
        match self {
            GenerateResult::Text(text) => text,
            GenerateResult::TextWithCall(text, _) => text,
        }
    }

    pub fn function_call(&self) -> Option<&FunctionCall> {
        match self {
            GenerateResult::Text(_) => None,
            GenerateResult::TextWithCall(_, call) => Some(call),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            GenerateResult::Text(text) => text,
            GenerateResult::TextWithCall(text, _) => text,
        }
    }
}

/// Function declaration offered to the model for structured output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Connection settings for a gateway, built once at startup
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API credential; never logged
    pub api_key: SecretString,
    /// Model identifier
    pub model: String,
    /// API base URL (without trailing slash)
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl GatewayConfig {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The boundary to the remote text-generation service
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Human-readable provider name (e.g., "Gemini")
    fn name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Generate a reply for a prompt without tools
    async fn generate(&self, prompt: &str) -> Result<GenerateResult, GatewayError> {
        self.generate_with_tools(prompt, &[]).await
    }

    /// Generate a reply, offering the given function declarations
    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[ToolSchema],
    ) -> Result<GenerateResult, GatewayError>;
}
