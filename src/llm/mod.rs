//! Reasoning capability used by the orchestrator
//!
//! A provider receives the instruction preamble, the conversation so far and
//! the action catalog, and answers with either a final message or a list of
//! action requests.

mod openai;

pub use openai::ChatCompletionsClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::agent::{ActionRequest, ActionSpec, Conversation, Message};

/// One assistant decision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssistantTurn {
    pub content: String,
    pub actions: Vec<ActionRequest>,
}

impl AssistantTurn {
    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            actions: Vec::new(),
        }
    }

    pub fn acting(actions: Vec<ActionRequest>) -> Self {
        Self {
            content: String::new(),
            actions,
        }
    }

    pub fn into_message(self) -> Message {
        Message::assistant(self.content, self.actions)
    }
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key not found: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Protocol(String),
}

#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn complete(
        &self,
        preamble: &str,
        conversation: &Conversation,
        catalog: &[ActionSpec],
    ) -> Result<AssistantTurn, LlmError>;
}
