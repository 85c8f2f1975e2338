//! Top-level solve loop: decompose the root problem, solve each subproblem
//! with one shared clinical agent, aggregate into the final answer.

use crate::agents::{
    aggregate, clinical_agent, decompose, AgentContext, AgentError, AgentEvent, FinalAnswer,
    SolutionRecord, SolvedSubproblem,
};
use crate::prompts::subproblem_prompt;

/// Solve one root problem end to end.
///
/// A fresh recursion budget is taken for every call, so repeated problems on
/// the same context do not starve each other. Subproblems are solved in
/// decomposition order on one shared root agent whose conversation carries
/// earlier answers forward. A subproblem that runs out of iterations or time
/// degrades to the no-solution sentinel; budget exhaustion and model-service
/// failure abort the whole request.
pub async fn solve_problem(
    user_problem: &str,
    ctx: &AgentContext,
) -> Result<FinalAnswer, AgentError> {
    let ctx = ctx.fresh_budget();
    let mut root = clinical_agent(user_problem);

    ctx.events.emit(AgentEvent::Plan {
        agent: root.name().to_string(),
        depth: root.depth(),
        problem: user_problem.to_string(),
    });

    let mut subproblems = decompose(user_problem, root.registry(), &ctx).await?;
    if subproblems.is_empty() {
        tracing::warn!("decomposition produced no subproblems; solving in a single step");
        subproblems.push(user_problem.to_string());
    }

    let mut solved = Vec::with_capacity(subproblems.len());
    for subproblem in subproblems {
        ctx.events.emit(AgentEvent::Subproblem {
            agent: root.name().to_string(),
            depth: root.depth(),
            text: subproblem.clone(),
        });

        let record = match root
            .request(&subproblem_prompt(user_problem, &subproblem), &ctx)
            .await
        {
            Ok(answer) => SolutionRecord::from_answer(answer),
            Err(err @ (AgentError::Budget(_) | AgentError::Llm(_))) => return Err(err),
            Err(bounded) => {
                tracing::warn!("subproblem hit a bound: {}", bounded);
                SolutionRecord::Unsolved
            }
        };

        ctx.events.emit(AgentEvent::Solution {
            agent: root.name().to_string(),
            depth: root.depth(),
            text: record.text().to_string(),
        });
        solved.push(SolvedSubproblem {
            subproblem,
            solution: record,
        });
    }

    let few_shot = load_few_shot(&ctx);
    let answer = aggregate(user_problem, &solved, few_shot.as_deref(), &ctx).await?;

    ctx.events.emit(AgentEvent::FinalAnswer {
        text: answer.text.clone(),
        probability: answer.probability,
    });
    Ok(answer)
}

/// Read the few-shot examples if configured. An unreadable file is logged and
/// skipped, never fatal.
fn load_few_shot(ctx: &AgentContext) -> Option<String> {
    let path = ctx.config.few_shot_path.as_ref()?;
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(path = %path.display(), "failed to read few-shot examples: {}", e);
            None
        }
    }
}
