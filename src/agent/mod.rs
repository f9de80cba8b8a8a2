mod actions;
mod conversation;
mod dispatcher;
mod orchestrator;
pub mod prompts;

pub use actions::{
    Action, ActionCatalog, ActionError, ActionSpec, ClickAction, GenerateReportAction,
    GoBackAction, ReadAction, ScrollAction, SearchAction, parameters_schema,
};
pub use conversation::{ActionRequest, Conversation, Message};
pub use dispatcher::dispatch;
pub use orchestrator::{AgentState, Orchestrator, transition};
pub use prompts::{DEFAULT_PREAMBLE, load_preamble};

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::LlmError;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to read instruction preamble {}: {source}", path.display())]
    Preamble {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Outcome of one orchestrator run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Reasoning calls made
    pub turns: usize,
    /// Text of the last assistant message
    pub final_answer: String,
    pub conversation: Conversation,
    /// The turn ceiling was hit before a final answer
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn new(turns: usize, conversation: Conversation, stopped_early: bool) -> Self {
        let final_answer = conversation
            .messages()
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::Assistant { content, .. } => Some(content.clone()),
                _ => None,
            })
            .unwrap_or_default();

        Self {
            turns,
            final_answer,
            conversation,
            stopped_early,
        }
    }

    /// Number of actions that produced a result.
    pub fn actions_run(&self) -> usize {
        self.conversation
            .messages()
            .iter()
            .filter(|m| matches!(m, Message::ToolResult { .. }))
            .count()
    }
}
