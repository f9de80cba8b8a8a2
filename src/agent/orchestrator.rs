//! Reasoning/acting control loop
//!
//! The loop alternates between asking the reasoning provider for a decision
//! and dispatching the requested actions. It ends on the first assistant turn
//! that requests no action, or when the optional turn ceiling is reached.

use tracing::{info, warn};

use super::actions::ActionCatalog;
use super::conversation::{Conversation, Message};
use super::dispatcher::dispatch;
use super::prompts::DEFAULT_PREAMBLE;
use super::{AgentResult, RunSummary};
use crate::llm::{AssistantTurn, ReasoningProvider};
use crate::session::ResearchSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Waiting for the provider's next decision
    Reasoning,
    /// Running the actions of the latest assistant turn
    Acting,
    /// The latest assistant turn requested nothing
    Finished,
}

/// Next state given the conversation after the current state's work.
pub fn transition(state: AgentState, conversation: &Conversation) -> AgentState {
    match state {
        AgentState::Reasoning if conversation.pending_actions().is_empty() => AgentState::Finished,
        AgentState::Reasoning => AgentState::Acting,
        AgentState::Acting => AgentState::Reasoning,
        AgentState::Finished => AgentState::Finished,
    }
}

pub struct Orchestrator<P> {
    provider: P,
    catalog: ActionCatalog,
    session: ResearchSession,
    preamble: String,
    max_turns: Option<usize>,
}

impl<P: ReasoningProvider> Orchestrator<P> {
    pub fn new(provider: P, session: ResearchSession) -> Self {
        Self {
            provider,
            catalog: ActionCatalog::default(),
            session,
            preamble: DEFAULT_PREAMBLE.to_string(),
            max_turns: None,
        }
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    pub fn with_catalog(mut self, catalog: ActionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Stop after this many reasoning calls. `None` runs until the provider
    /// answers without actions.
    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn session(&self) -> &ResearchSession {
        &self.session
    }

    /// Run `task` to completion.
    pub async fn run(&mut self, task: &str) -> AgentResult<RunSummary> {
        info!("Task: {}", task);

        let specs = self.catalog.specs();
        let mut conversation = Conversation::new();
        conversation.push(Message::human(task));

        let mut state = AgentState::Reasoning;
        let mut turns = 0;

        loop {
            match state {
                AgentState::Reasoning => {
                    if let Some(max) = self.max_turns
                        && turns >= max
                    {
                        warn!("Stopping after {} turn(s) without a final answer", turns);
                        return Ok(RunSummary::new(turns, conversation, true));
                    }

                    let turn = self
                        .provider
                        .complete(&self.preamble, &conversation, &specs)
                        .await?;
                    turns += 1;
                    log_decision(turns, &turn);
                    conversation.push(turn.into_message());
                }
                AgentState::Acting => {
                    let requests = conversation.pending_actions().to_vec();
                    let results = dispatch(&self.catalog, &mut self.session, &requests).await;
                    conversation.extend(results);
                }
                AgentState::Finished => break,
            }
            state = transition(state, &conversation);
        }

        info!("Finished after {} turn(s)", turns);
        Ok(RunSummary::new(turns, conversation, false))
    }
}

fn log_decision(turn_no: usize, turn: &AssistantTurn) {
    match turn.actions.first() {
        Some(first) if turn.actions.len() > 1 => info!(
            "Turn {}: {} {} (+{} more)",
            turn_no,
            first.name,
            first.arguments,
            turn.actions.len() - 1
        ),
        Some(first) => info!("Turn {}: {} {}", turn_no, first.name, first.arguments),
        None => info!("Turn {}: final answer:\n{}", turn_no, turn.content),
    }
}
