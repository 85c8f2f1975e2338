//! Test doubles shared by the agent tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::Config;
use crate::knowledge::KnowledgeServices;
use crate::llm::{ChatMessage, ChatResponse, FunctionCall, LlmClient, ToolCall, ToolDefinition};

use super::context::AgentContext;

/// Scripted LLM: pops one canned response per completion call.
///
/// `repeating` replays the same response forever (for loop-bound tests);
/// an exhausted script returns an error so a test that should not reach the
/// model fails loudly if it does.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<ChatResponse>>,
    repeat: Option<ChatResponse>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat: None,
        }
    }

    pub fn repeating(response: ChatResponse) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat: Some(response),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChatResponse> {
        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return Ok(next);
        }
        if let Some(ref repeat) = self.repeat {
            return Ok(repeat.clone());
        }
        anyhow::bail!("scripted LLM exhausted: unexpected model call")
    }
}

/// Context wired to a scripted LLM, no knowledge services, disabled events.
pub fn scripted_ctx(llm: ScriptedLlm) -> AgentContext {
    AgentContext::new(
        Config::new("test-key".into(), "test-model".into()),
        Arc::new(llm),
        KnowledgeServices::none(),
    )
}

/// A plain-text model response.
pub fn text_response(text: &str) -> ChatResponse {
    ChatResponse {
        content: Some(text.to_string()),
        ..Default::default()
    }
}

/// A model response requesting the given invocations.
pub fn calls_response(calls: Vec<ToolCall>) -> ChatResponse {
    ChatResponse {
        tool_calls: Some(calls),
        ..Default::default()
    }
}

/// One invocation of `name` with a raw JSON argument string.
pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        call_type: "function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}
