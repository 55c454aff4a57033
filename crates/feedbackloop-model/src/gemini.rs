use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::debug;

use crate::{FunctionCall, GatewayConfig, GatewayError, GenerateResult, ModelGateway, ToolSchema};

/// Gemini `generateContent` gateway.
///
/// Deliberately not `Debug`: it holds the API key.
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl GeminiGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.config.timeout)
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[ToolSchema],
    ) -> Result<GenerateResult, GatewayError> {
        let start = Instant::now();
        let body = GeminiRequest::new(prompt, tools);

        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            tools = tools.len(),
            "Sending generate request"
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &error_body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Deserialization(e.to_string()))?;

        debug!(
            duration_ms = start.elapsed().as_millis(),
            "Generate request completed"
        );

        parsed.into_result()
    }
}

/// Map a non-2xx status and body to a gateway error
fn classify_error(status: u16, body: &str) -> GatewayError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        401 | 403 => GatewayError::AuthenticationFailed(message),
        400 if message.to_lowercase().contains("api key") => {
            GatewayError::AuthenticationFailed(message)
        }
        429 => GatewayError::QuotaExceeded(message),
        _ => GatewayError::Provider { status, message },
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool<'a>>,
}

impl<'a> GeminiRequest<'a> {
    fn new(prompt: &'a str, tools: &'a [ToolSchema]) -> Self {
        let tools = if tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTool {
                function_declarations: tools,
            }]
        };

        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiTextPart { text: prompt }],
            }],
            tools,
        }
    }
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiTextPart<'a>>,
}

#[derive(Serialize)]
struct GeminiTextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool<'a> {
    function_declarations: &'a [ToolSchema],
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GeminiResponse {
    fn into_result(self) -> Result<GenerateResult, GatewayError> {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        if parts.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }

        let mut text = String::new();
        let mut call = None;
        for part in parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if call.is_none() {
                call = part
                    .function_call
                    .map(|fc| FunctionCall::new(fc.name, fc.args));
            }
        }

        match call {
            Some(call) => Ok(GenerateResult::TextWithCall(text, call)),
            None => Ok(GenerateResult::Text(text)),
        }
    }
}
