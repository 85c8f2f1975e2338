//! Aggregation: fold ordered subproblem solutions into the final answer.
//!
//! Subproblems and solutions travel together as ordered pairs from the moment
//! a subproblem is solved; the aggregation prompt lists each solution (or the
//! no-solution sentinel) in original order and demands exactly one numeric
//! result inside the result markers.

use crate::llm::{ChatMessage, Role};
use crate::markers::{count_final_results, extract_probability, NO_SOLUTION};
use crate::prompts::{aggregation_system_prompt, result_token_reminder};

use super::agent::AgentError;
use super::context::AgentContext;

/// Outcome of solving one subproblem.
///
/// An empty or failed delegate answer degrades to `Unsolved` so one bad
/// subproblem never blocks the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolutionRecord {
    Solved(String),
    Unsolved,
}

impl SolutionRecord {
    /// Classify a delegate answer: blank means unsolved.
    pub fn from_answer(answer: String) -> Self {
        if answer.trim().is_empty() {
            SolutionRecord::Unsolved
        } else {
            SolutionRecord::Solved(answer)
        }
    }

    /// Text that flows into the aggregation prompt.
    pub fn text(&self) -> &str {
        match self {
            SolutionRecord::Solved(text) => text,
            SolutionRecord::Unsolved => NO_SOLUTION,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SolutionRecord::Solved(_))
    }
}

/// One subproblem paired with its solution, in decomposition order.
#[derive(Debug, Clone)]
pub struct SolvedSubproblem {
    pub subproblem: String,
    pub solution: SolutionRecord,
}

/// The final aggregated answer.
///
/// `probability` is `None` when the model failed to honor the result-token
/// contract even after a retry; the text is still returned.
#[derive(Debug, Clone)]
pub struct FinalAnswer {
    pub text: String,
    pub probability: Option<f64>,
}

/// Build the aggregation turns: restate the problem, list every solution in
/// original order, ask for the final answer with the result token.
pub fn aggregation_messages(
    problem: &str,
    solved: &[SolvedSubproblem],
    few_shot: Option<&str>,
) -> Vec<ChatMessage> {
    let solutions = solved
        .iter()
        .enumerate()
        .map(|(idx, pair)| {
            format!(
                "{}. {}\n   Solution: {}",
                idx + 1,
                pair.subproblem,
                pair.solution.text()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ChatMessage::new(Role::System, aggregation_system_prompt(few_shot)),
        ChatMessage::new(
            Role::User,
            format!("The original user problem is: {problem}"),
        ),
        ChatMessage::new(
            Role::User,
            format!("The subproblems that have been solved are:\n{solutions}"),
        ),
        ChatMessage::new(
            Role::User,
            "Please solve the user's problem and provide the reason.",
        ),
    ]
}

/// Run the aggregation request and extract the result token.
///
/// A missing token is recoverable: the request is re-sent once with an
/// explicit reminder appended. If the token is still missing, the answer is
/// returned with a warning and no probability.
pub async fn aggregate(
    problem: &str,
    solved: &[SolvedSubproblem],
    few_shot: Option<&str>,
    ctx: &AgentContext,
) -> Result<FinalAnswer, AgentError> {
    let mut messages = aggregation_messages(problem, solved, few_shot);

    let first = complete(&messages, ctx).await?;
    if let Some(p) = extract_probability(&first) {
        if count_final_results(&first) > 1 {
            tracing::warn!("final answer contains more than one result token; using the first");
        }
        return Ok(FinalAnswer {
            text: first,
            probability: Some(p),
        });
    }

    tracing::warn!("final answer missing the result token; retrying aggregation once");
    messages.push(ChatMessage::new(Role::Assistant, first.clone()));
    messages.push(ChatMessage::new(Role::User, result_token_reminder()));

    let second = complete(&messages, ctx).await?;
    match extract_probability(&second) {
        Some(p) => Ok(FinalAnswer {
            text: second,
            probability: Some(p),
        }),
        None => {
            tracing::warn!("result token still missing after retry; returning answer without it");
            Ok(FinalAnswer {
                text: second,
                probability: None,
            })
        }
    }
}

async fn complete(messages: &[ChatMessage], ctx: &AgentContext) -> Result<String, AgentError> {
    let response = ctx
        .llm
        .chat_completion(&ctx.config.model, messages, None)
        .await
        .map_err(|e| AgentError::Llm(e.to_string()))?;
    Ok(response.content.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{scripted_ctx, text_response, ScriptedLlm};

    fn pairs() -> Vec<SolvedSubproblem> {
        vec![
            SolvedSubproblem {
                subproblem: "find A".into(),
                solution: SolutionRecord::Unsolved,
            },
            SolvedSubproblem {
                subproblem: "find B".into(),
                solution: SolutionRecord::Solved("B is safe".into()),
            },
        ]
    }

    #[test]
    fn empty_answer_degrades_to_unsolved() {
        assert_eq!(SolutionRecord::from_answer("".into()), SolutionRecord::Unsolved);
        assert_eq!(
            SolutionRecord::from_answer("  \n".into()),
            SolutionRecord::Unsolved
        );
        assert!(SolutionRecord::from_answer("found it".into()).is_solved());
    }

    #[test]
    fn prompt_lists_solutions_in_original_order_with_sentinel() {
        let messages = aggregation_messages("will it pass?", &pairs(), None);
        let listing = messages[2].content.as_deref().unwrap();

        let sentinel_pos = listing.find(NO_SOLUTION).expect("sentinel present");
        let solved_pos = listing.find("B is safe").expect("solution present");
        assert!(sentinel_pos < solved_pos, "order must match decomposition");
        assert!(messages[1]
            .content
            .as_deref()
            .unwrap()
            .contains("will it pass?"));
    }

    #[tokio::test]
    async fn result_token_is_extracted() {
        let ctx = scripted_ctx(ScriptedLlm::new(vec![text_response(
            "The failure rate of the clinical trial is <final_result>0.8</final_result>.",
        )]));

        let answer = aggregate("will it pass?", &pairs(), None, &ctx).await.unwrap();
        assert_eq!(answer.probability, Some(0.8));
    }

    #[tokio::test]
    async fn missing_token_triggers_one_retry() {
        let ctx = scripted_ctx(ScriptedLlm::new(vec![
            text_response("I think it will probably fail."),
            text_response("Corrected: <final_result>0.7</final_result>"),
        ]));

        let answer = aggregate("will it pass?", &pairs(), None, &ctx).await.unwrap();
        assert_eq!(answer.probability, Some(0.7));
        assert!(answer.text.contains("0.7"));
    }

    #[tokio::test]
    async fn token_still_missing_after_retry_degrades_to_warning() {
        let ctx = scripted_ctx(ScriptedLlm::new(vec![
            text_response("no token here"),
            text_response("still no token"),
        ]));

        let answer = aggregate("will it pass?", &pairs(), None, &ctx).await.unwrap();
        assert_eq!(answer.probability, None);
        assert_eq!(answer.text, "still no token");
    }
}
