//! Prompt text for the orchestrator.
//!
//! Personas and prompt builders live here so the control flow in `agents` and
//! `solve` stays free of wall-of-text literals. The marker instructions must
//! stay in sync with the grammar in [`crate::markers`].

use crate::markers::{FINAL_RESULT_CLOSE, FINAL_RESULT_OPEN, SUBPROBLEM_CLOSE, SUBPROBLEM_OPEN};

/// Persona of the root clinical agent.
pub const CLINICAL_ROLE: &str =
    "You are a pharmaceutical research scientist and an expert in clinical trials.";

/// Persona of the drug-safety specialist.
pub const SAFETY_ROLE: &str = "You are an expert in drug safety. You assess toxicity, side \
     effects, and historical failure risk of pharmaceutical drugs.";

/// Persona of the drug-efficacy specialist.
pub const EFFICACY_ROLE: &str = "You are an expert in drug efficacy. You evaluate how effective \
     a drug is against a disease using biomedical knowledge-graph evidence.";

/// Persona of the enrollment specialist.
pub const ENROLLMENT_ROLE: &str = "You are an expert in clinical-trial recruitment. You judge \
     whether eligibility criteria allow a trial to enroll enough patients.";

/// Persona of the graph-reasoning specialist.
pub const GRAPH_ROLE: &str = "As an expert in graph reasoning, you answer the user's \
     instruction by consulting a knowledge graph and reasoning over the paths between nodes.";

/// System prompt for a decomposition request.
///
/// Least-to-most: the model is asked for an ordered list of subproblems, each
/// wrapped in the subproblem markers, scoped to the capabilities the calling
/// agent can actually dispatch.
pub fn decomposition_system_prompt(capability_lines: &str) -> String {
    format!(
        "You are a planner using least-to-most reasoning. Decompose the user's problem into \
         an ordered list of subproblems, from the simplest to the hardest, such that each \
         subproblem can be solved with the capabilities listed below and solving them in \
         order answers the original problem.\n\
         \n\
         Available capabilities:\n{capability_lines}\n\
         \n\
         Wrap every subproblem in {SUBPROBLEM_OPEN}{SUBPROBLEM_CLOSE} tags, e.g. \
         {SUBPROBLEM_OPEN}assess the toxicity of the drug{SUBPROBLEM_CLOSE}. \
         Do not number the subproblems and do not answer them."
    )
}

/// User turn handed to an agent for one subproblem, restating the root problem.
pub fn subproblem_prompt(original_problem: &str, subproblem: &str) -> String {
    format!(
        "The original user problem is: {original_problem}\nNow, solve this problem: {subproblem}"
    )
}

/// System prompt for the final aggregation request.
///
/// The probability must land inside the result markers so the caller can
/// extract it mechanically. Few-shot examples are appended when configured.
pub fn aggregation_system_prompt(few_shot: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an expert in clinical trials. Based on the subproblems that have been \
         solved, solve the user's problem and provide the reason.\n\
         First, give the final result of the user's problem; you must give a specific, \
         clear answer.\n\
         Second, provide the reasoning step by step.\n\
         You must include the exact probability within the \
         {FINAL_RESULT_OPEN}{FINAL_RESULT_CLOSE} tags, e.g. 'The failure rate of the \
         clinical trial is {FINAL_RESULT_OPEN}0.8{FINAL_RESULT_CLOSE}.' Include the tags \
         exactly once."
    );

    if let Some(examples) = few_shot {
        prompt.push_str(
            "\n\nThe following examples are essential for your understanding. Each example \
             is within <example></example> tags.\nExamples:\n",
        );
        prompt.push_str(examples);
    }

    prompt
}

/// Reminder sent when the final answer came back without a result token.
pub fn result_token_reminder() -> String {
    format!(
        "Your previous answer did not contain the required result token. Answer again and \
         include the exact probability within {FINAL_RESULT_OPEN}{FINAL_RESULT_CLOSE} tags."
    )
}

/// Root problem statement built from a trial record.
pub fn trial_problem(criteria: &str, drugs: &str, diseases: &str) -> String {
    format!(
        "I have designed a clinical trial and hope you can help me predict whether this \
         trial can pass.\n#criteria#: {criteria}\n#drugs#: {drugs}\n#diseases#: {diseases}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposition_prompt_carries_markers_and_capabilities() {
        let prompt = decomposition_system_prompt("- safety_agent: checks drug safety");
        assert!(prompt.contains("<subproblem>"));
        assert!(prompt.contains("safety_agent"));
    }

    #[test]
    fn aggregation_prompt_with_examples() {
        let prompt = aggregation_system_prompt(Some("<example>trial passed</example>"));
        assert!(prompt.contains("<final_result>"));
        assert!(prompt.contains("<example>trial passed</example>"));

        let bare = aggregation_system_prompt(None);
        assert!(!bare.contains("<example>"));
    }

    #[test]
    fn trial_problem_embeds_fields() {
        let p = trial_problem("adults 18+", "aspirin", "headache");
        assert!(p.contains("#criteria#: adults 18+"));
        assert!(p.contains("#drugs#: aspirin"));
        assert!(p.contains("#diseases#: headache"));
    }
}
