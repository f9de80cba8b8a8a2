//! OpenAI-compatible `/chat/completions` provider with function calling

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AssistantTurn, LlmError, ReasoningProvider};
use crate::LlmConfig;
use crate::agent::{ActionRequest, ActionSpec, Conversation, Message};

pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl ChatCompletionsClient {
    /// Build a client, reading the API key from `config.api_key_env`.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl WireMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

fn function_kind() -> String {
    "function".to_string()
}

/// Map the conversation onto chat-completions messages.
///
/// Assistant tool calls that never received a result (unknown actions) are
/// left out, since the protocol requires every call to be answered.
fn to_wire_messages(preamble: &str, conversation: &Conversation) -> Vec<WireMessage> {
    let answered: HashSet<&str> = conversation
        .messages()
        .iter()
        .filter_map(|m| match m {
            Message::ToolResult { id, .. } => Some(id.as_str()),
            _ => None,
        })
        .collect();

    let mut wire = vec![WireMessage::text("system", preamble)];
    for message in conversation.messages() {
        match message {
            Message::System { content } => wire.push(WireMessage::text("system", content)),
            Message::Human { content } => wire.push(WireMessage::text("user", content)),
            Message::Assistant { content, actions } => {
                let calls: Vec<WireToolCall> = actions
                    .iter()
                    .filter(|a| answered.contains(a.id.as_str()))
                    .map(|a| WireToolCall {
                        id: a.id.clone(),
                        kind: function_kind(),
                        function: WireFunctionCall {
                            name: a.name.clone(),
                            arguments: a.arguments.to_string(),
                        },
                    })
                    .collect();
                let mut msg = WireMessage::text("assistant", content);
                msg.tool_calls = (!calls.is_empty()).then_some(calls);
                wire.push(msg);
            }
            Message::ToolResult { id, name, content } => {
                let mut msg = WireMessage::text("tool", content);
                msg.tool_call_id = Some(id.clone());
                msg.name = Some(name.clone());
                wire.push(msg);
            }
        }
    }
    wire
}

/// Decode a tool call's JSON-string arguments; anything but an object becomes `{}`.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            warn!("Tool arguments are not an object, ignoring: {}", other);
            Value::Object(Map::new())
        }
        Err(e) => {
            warn!("Discarding unparseable tool arguments {:?}: {}", raw, e);
            Value::Object(Map::new())
        }
    }
}

#[async_trait]
impl ReasoningProvider for ChatCompletionsClient {
    async fn complete(
        &self,
        preamble: &str,
        conversation: &Conversation,
        catalog: &[ActionSpec],
    ) -> Result<AssistantTurn, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: to_wire_messages(preamble, conversation),
            tools: catalog
                .iter()
                .map(|spec| WireTool {
                    kind: "function",
                    function: WireFunction {
                        name: spec.name,
                        description: spec.description,
                        parameters: &spec.parameters,
                    },
                })
                .collect(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            "Requesting completion with {} message(s)",
            body.messages.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("invalid response body: {}", e)))?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| LlmError::Protocol("response has no choices".into()))?;

        let actions = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                ActionRequest::new(call.id, call.function.name, parse_arguments(&call.function.arguments))
            })
            .collect();

        Ok(AssistantTurn {
            content: message.content.unwrap_or_default(),
            actions,
        })
    }
}
