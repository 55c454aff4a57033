//! Deterministic gateway for tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{FunctionCall, GatewayError, GenerateResult, ModelGateway, ToolSchema};

/// A call observed by [`ScriptedGateway`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub tool_names: Vec<String>,
}

/// Gateway that replays queued responses in order and records every prompt.
///
/// An exhausted script answers with [`GatewayError::Provider`].
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<GenerateResult, GatewayError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<GenerateResult, GatewayError>) -> &Self {
        self.responses
            .lock()
            .expect("scripted gateway lock poisoned")
            .push_back(response);
        self
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.push(Ok(GenerateResult::Text(text.to_string())))
    }

    pub fn push_call(&self, name: &str, args: Value) -> &Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.push(Ok(GenerateResult::TextWithCall(
            String::new(),
            FunctionCall::new(name, args),
        )))
    }

    pub fn push_error(&self, error: GatewayError) -> &Self {
        self.push(Err(error))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .expect("scripted gateway lock poisoned")
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .expect("scripted gateway lock poisoned")
            .len()
    }

    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .expect("scripted gateway lock poisoned")
            .len()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        tools: &[ToolSchema],
    ) -> Result<GenerateResult, GatewayError> {
        self.calls
            .lock()
            .expect("scripted gateway lock poisoned")
            .push(RecordedCall {
                prompt: prompt.to_string(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            });

        self.responses
            .lock()
            .expect("scripted gateway lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(GatewayError::Provider {
                    status: 599,
                    message: "scripted gateway exhausted".to_string(),
                })
            })
    }
}
