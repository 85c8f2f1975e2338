//! Shared execution context for one agent call tree.

use std::sync::Arc;

use crate::config::Config;
use crate::knowledge::KnowledgeServices;
use crate::llm::LlmClient;

use super::budget::RecursionBudget;
use super::events::EventSink;

/// Context shared by every agent in one root request.
///
/// The context is cloned freely: the LLM client and knowledge services are
/// behind `Arc`, and the recursion budget clone shares its counter so the
/// invocation ceiling holds across the whole call tree. Conversations are NOT
/// part of the context; each agent owns its own.
#[derive(Clone)]
pub struct AgentContext {
    /// Application configuration
    pub config: Config,

    /// LLM client for model calls
    pub llm: Arc<dyn LlmClient>,

    /// Delegate knowledge services for the leaf capabilities
    pub knowledge: KnowledgeServices,

    /// Central recursion budget for this root request
    pub budget: RecursionBudget,

    /// Progress-event sink for the operator log
    pub events: EventSink,
}

impl AgentContext {
    /// Create a context with a disabled event sink.
    pub fn new(config: Config, llm: Arc<dyn LlmClient>, knowledge: KnowledgeServices) -> Self {
        let budget = RecursionBudget::new(config.max_depth, config.max_invocations);
        Self {
            config,
            llm,
            knowledge,
            budget,
            events: EventSink::disabled(),
        }
    }

    /// Attach a live event sink.
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Start a fresh budget for a new root request on the same wiring.
    pub fn fresh_budget(&self) -> Self {
        let mut ctx = self.clone();
        ctx.budget = RecursionBudget::new(self.config.max_depth, self.config.max_invocations);
        ctx
    }
}
