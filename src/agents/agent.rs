//! The agent: identity, capability registry, conversation, and the bounded
//! dispatch loop behind `request`.
//!
//! One agent instance serves one caller. Its conversation is append-only and
//! private; recursive delegation happens inside capabilities, which construct
//! a fresh child agent at `depth + 1` and block on its `request`.

use std::time::{Duration, Instant};

use async_recursion::async_recursion;
use thiserror::Error;

use crate::llm::{ChatMessage, Role, ToolCall};

use super::budget::BudgetError;
use super::capability::{parse_arguments, validate_arguments, CapabilityError, CapabilityRegistry};
use super::context::AgentContext;
use super::events::AgentEvent;

/// Terminal errors from an agent request.
///
/// Individual capability failures never show up here; they are folded back
/// into the conversation as error payloads. What remains is budget
/// exhaustion, hard model-service failure, and the loop bounds.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error("model service failure: {0}")]
    Llm(String),

    #[error("dispatch iteration limit of {0} reached")]
    IterationLimit(usize),

    #[error("request deadline of {0}s exceeded")]
    DeadlineExceeded(u64),
}

/// An orchestration unit: name, role persona, capabilities, conversation,
/// and a recursion depth fixed at construction.
pub struct Agent {
    name: String,
    role: String,
    depth: usize,
    registry: CapabilityRegistry,
    conversation: Vec<ChatMessage>,
}

impl Agent {
    /// Create an agent. The conversation is seeded with the role persona as
    /// the system turn; `depth` is 1 for a root agent and never mutated.
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        registry: CapabilityRegistry,
        depth: usize,
    ) -> Self {
        let role = role.into();
        Self {
            name: name.into(),
            conversation: vec![ChatMessage::new(Role::System, role.clone())],
            role,
            depth,
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// The conversation so far (read-only; turns are only appended).
    pub fn conversation(&self) -> &[ChatMessage] {
        &self.conversation
    }

    /// Solve one prompt: append it as a user turn and run the dispatch loop
    /// to a terminal text answer.
    #[async_recursion]
    pub async fn request(&mut self, prompt: &str, ctx: &AgentContext) -> Result<String, AgentError> {
        self.conversation.push(ChatMessage::new(Role::User, prompt));
        self.run_dispatch(ctx).await
    }

    /// The dispatch loop: send the conversation to the model, execute any
    /// requested capability invocations, feed results back, repeat until the
    /// model answers in plain text or a bound is hit.
    ///
    /// A conversation already ending in a terminal assistant text turn is
    /// returned as-is, with no model call.
    pub async fn run_dispatch(&mut self, ctx: &AgentContext) -> Result<String, AgentError> {
        if let Some(last) = self.conversation.last() {
            if last.is_terminal_text() {
                return Ok(last.content.clone().unwrap_or_default());
            }
        }

        let deadline = Instant::now() + Duration::from_secs(ctx.config.request_timeout_secs);
        let schemas = self.registry.schemas();
        let tools = if schemas.is_empty() {
            None
        } else {
            Some(schemas.as_slice())
        };

        for iteration in 0..ctx.config.max_iterations {
            if Instant::now() >= deadline {
                return Err(AgentError::DeadlineExceeded(ctx.config.request_timeout_secs));
            }

            tracing::debug!(
                agent = %self.name,
                depth = self.depth,
                iteration,
                "dispatch round trip"
            );

            let response = ctx
                .llm
                .chat_completion(&ctx.config.model, &self.conversation, tools)
                .await
                .map_err(|e| AgentError::Llm(e.to_string()))?;

            if response.has_tool_calls() {
                let calls = response.tool_calls.unwrap_or_default();
                // A turn carrying both text and invocations counts as an
                // invocation turn; the text rides along in the transcript.
                self.conversation
                    .push(ChatMessage::assistant_calls(response.content, calls.clone()));

                for call in &calls {
                    let payload = self.dispatch_invocation(call, ctx).await?;
                    self.conversation
                        .push(ChatMessage::tool_result(call.id.clone(), payload));
                }
                continue;
            }

            // Terminal: plain text (possibly empty; the caller decides what an
            // empty answer means).
            let content = response.content.unwrap_or_default();
            self.conversation
                .push(ChatMessage::new(Role::Assistant, content.clone()));
            return Ok(content);
        }

        Err(AgentError::IterationLimit(ctx.config.max_iterations))
    }

    /// Resolve and execute one invocation, returning the payload to append as
    /// a capability-result turn.
    ///
    /// Unknown names, invalid arguments, and delegate failures become
    /// structured error payloads so the model can recover. Budget exhaustion
    /// aborts the request.
    async fn dispatch_invocation(
        &self,
        call: &ToolCall,
        ctx: &AgentContext,
    ) -> Result<String, AgentError> {
        ctx.budget.charge_invocation()?;

        let name = call.function.name.as_str();
        let outcome = match self.registry.get(name) {
            None => Err(CapabilityError::Unknown(name.to_string())),
            Some(capability) => {
                match parse_arguments(&call.function.arguments).and_then(|args| {
                    validate_arguments(&capability.parameters_schema(), &args).map(|_| args)
                }) {
                    Err(reason) => Err(CapabilityError::InvalidArguments {
                        name: name.to_string(),
                        reason,
                    }),
                    Ok(args) => capability.execute(args, ctx, self.depth).await,
                }
            }
        };

        match outcome {
            Ok(payload) => {
                ctx.events.emit(AgentEvent::Invocation {
                    agent: self.name.clone(),
                    depth: self.depth,
                    capability: name.to_string(),
                    ok: true,
                });
                Ok(payload)
            }
            Err(CapabilityError::Budget(e)) => Err(e.into()),
            Err(CapabilityError::Model { name, reason }) => {
                Err(AgentError::Llm(format!("{name}: {reason}")))
            }
            Err(recoverable) => {
                ctx.events.emit(AgentEvent::Invocation {
                    agent: self.name.clone(),
                    depth: self.depth,
                    capability: name.to_string(),
                    ok: false,
                });
                tracing::warn!(
                    agent = %self.name,
                    capability = name,
                    "recoverable dispatch error: {}",
                    recoverable
                );
                Ok(serde_json::json!({ "error": recoverable.to_string() }).to_string())
            }
        }
    }
}
