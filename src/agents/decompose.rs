//! Decomposition: one model request that turns a problem into an ordered
//! list of subproblems (least-to-most reasoning).
//!
//! The prompt is scoped to the calling agent's registered capability
//! descriptions, so the model only plans steps the agent can actually
//! dispatch. Zero markers in the response means "no decomposition occurred";
//! that is a valid empty plan, never an error.

use crate::llm::{ChatMessage, ChatOptions, Role};
use crate::markers::extract_subproblems;
use crate::prompts::decomposition_system_prompt;

use super::agent::AgentError;
use super::capability::CapabilityRegistry;
use super::context::AgentContext;

/// Decomposition sampling: low temperature for stable plans.
const DECOMPOSITION_TEMPERATURE: f64 = 0.2;

/// Decompose `problem` into ordered subproblems solvable with `registry`.
///
/// Returns an empty vec when the model produces no subproblem markers; the
/// caller decides the fallback (single-step solve or no solution).
pub async fn decompose(
    problem: &str,
    registry: &CapabilityRegistry,
    ctx: &AgentContext,
) -> Result<Vec<String>, AgentError> {
    let messages = vec![
        ChatMessage::new(
            Role::System,
            decomposition_system_prompt(&registry.description_lines()),
        ),
        ChatMessage::new(Role::User, problem),
    ];

    let response = ctx
        .llm
        .chat_completion_with_options(
            &ctx.config.model,
            &messages,
            None,
            ChatOptions {
                temperature: Some(DECOMPOSITION_TEMPERATURE),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| AgentError::Llm(e.to_string()))?;

    let raw = response.content.unwrap_or_default();
    let subproblems = extract_subproblems(&raw);

    tracing::debug!(
        count = subproblems.len(),
        "decomposition produced {} subproblem(s)",
        subproblems.len()
    );

    Ok(subproblems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{scripted_ctx, text_response, ScriptedLlm};

    #[tokio::test]
    async fn parses_ordered_subproblems() {
        let ctx = scripted_ctx(ScriptedLlm::new(vec![text_response(
            "Plan: <subproblem>assess safety</subproblem> then \
             <subproblem>assess efficacy</subproblem>",
        )]));

        let got = decompose("will the trial pass?", &CapabilityRegistry::empty(), &ctx)
            .await
            .unwrap();
        assert_eq!(got, vec!["assess safety", "assess efficacy"]);
    }

    #[tokio::test]
    async fn zero_markers_is_an_empty_plan_not_an_error() {
        let ctx = scripted_ctx(ScriptedLlm::new(vec![text_response(
            "I cannot break this down further.",
        )]));

        let got = decompose("will the trial pass?", &CapabilityRegistry::empty(), &ctx)
            .await
            .unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn empty_model_content_is_an_empty_plan() {
        let ctx = scripted_ctx(ScriptedLlm::new(vec![crate::llm::ChatResponse::default()]));

        let got = decompose("will the trial pass?", &CapabilityRegistry::empty(), &ctx)
            .await
            .unwrap();
        assert!(got.is_empty());
    }
}
