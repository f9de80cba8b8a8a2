//! Conversation history shared between the orchestrator and the reasoning provider

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One action the reasoning provider asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Correlation id echoed back on the matching tool result
    pub id: String,
    pub name: String,
    /// Argument object; `{}` when the provider sent nothing usable
    pub arguments: Value,
}

impl ActionRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    Human {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default)]
        actions: Vec<ActionRequest>,
    },
    ToolResult {
        id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>, actions: Vec<ActionRequest>) -> Self {
        Message::Assistant {
            content: content.into(),
            actions,
        }
    }

    pub fn tool_result(request: &ActionRequest, content: impl Into<String>) -> Self {
        Message::ToolResult {
            id: request.id.clone(),
            name: request.name.clone(),
            content: content.into(),
        }
    }
}

/// Append-only message log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Action requests carried by the latest message, if it is an assistant turn.
    pub fn pending_actions(&self) -> &[ActionRequest] {
        match self.messages.last() {
            Some(Message::Assistant { actions, .. }) => actions,
            _ => &[],
        }
    }
}
