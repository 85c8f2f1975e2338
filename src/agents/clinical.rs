//! The root clinical agent and its delegation capabilities.
//!
//! Each delegation capability spawns the matching specialist one level deeper
//! and blocks on it. Safety and efficacy run the full decompose-then-solve
//! cycle inside the child; enrollment and graph reasoning are single-shot
//! requests. Every delegation carries the root problem text so the child sees
//! the full context.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::prompts::{subproblem_prompt, CLINICAL_ROLE};

use super::agent::{Agent, AgentError};
use super::aggregate::SolutionRecord;
use super::capability::{string_object_schema, Capability, CapabilityError, CapabilityRegistry};
use super::context::AgentContext;
use super::decompose::decompose;
use super::events::AgentEvent;
use super::specialists;

/// Build the root clinical agent for one problem.
///
/// The problem text is captured by the delegation capabilities so children can
/// be shown the original question alongside their subproblem.
pub fn clinical_agent(user_problem: &str) -> Agent {
    let registry = CapabilityRegistry::new(vec![
        Arc::new(SafetyDelegation {
            user_problem: user_problem.to_string(),
        }) as Arc<dyn Capability>,
        Arc::new(EfficiencyDelegation {
            user_problem: user_problem.to_string(),
        }),
        Arc::new(EnrollmentDelegation {
            user_problem: user_problem.to_string(),
        }),
        Arc::new(GraphReasoningDelegation {
            user_problem: user_problem.to_string(),
        }),
    ]);
    Agent::new("clinical_agent", CLINICAL_ROLE, registry, 1)
}

/// Run one child request, folding the child's terminal errors into the
/// capability error model.
///
/// Budget exhaustion and model failure stay terminal. A child that runs out
/// of iterations or time has simply failed to solve its problem; that becomes
/// the unsolved record and the batch continues.
async fn run_child(
    child: &mut Agent,
    prompt: &str,
    ctx: &AgentContext,
) -> Result<SolutionRecord, CapabilityError> {
    match child.request(prompt, ctx).await {
        Ok(answer) => Ok(SolutionRecord::from_answer(answer)),
        Err(AgentError::Budget(e)) => Err(e.into()),
        Err(AgentError::Llm(reason)) => Err(CapabilityError::Model {
            name: child.name().to_string(),
            reason,
        }),
        Err(bounded @ (AgentError::IterationLimit(_) | AgentError::DeadlineExceeded(_))) => {
            tracing::warn!(
                agent = child.name(),
                depth = child.depth(),
                "child request hit a bound: {}",
                bounded
            );
            Ok(SolutionRecord::Unsolved)
        }
    }
}

/// Decompose `question` with the child's own capabilities, solve each
/// subproblem in order on one shared child conversation, and join the
/// solutions (or sentinels) into the delegation payload.
async fn solve_with_decomposition(
    child: &mut Agent,
    user_problem: &str,
    question: &str,
    ctx: &AgentContext,
) -> Result<String, CapabilityError> {
    ctx.events.emit(AgentEvent::Plan {
        agent: child.name().to_string(),
        depth: child.depth(),
        problem: question.to_string(),
    });

    let mut subproblems = decompose(question, child.registry(), ctx)
        .await
        .map_err(|e| CapabilityError::Model {
            name: child.name().to_string(),
            reason: e.to_string(),
        })?;
    if subproblems.is_empty() {
        // No decomposition: solve the question itself as a single step.
        subproblems.push(question.to_string());
    }

    let mut solutions = Vec::with_capacity(subproblems.len());
    for subproblem in &subproblems {
        ctx.events.emit(AgentEvent::Subproblem {
            agent: child.name().to_string(),
            depth: child.depth(),
            text: subproblem.clone(),
        });

        let record = run_child(child, &subproblem_prompt(user_problem, subproblem), ctx).await?;

        ctx.events.emit(AgentEvent::Solution {
            agent: child.name().to_string(),
            depth: child.depth(),
            text: record.text().to_string(),
        });
        solutions.push(record.text().to_string());
    }

    Ok(solutions.join("\n"))
}

fn required_str<'a>(args: &'a Value, key: &str) -> &'a str {
    args[key].as_str().unwrap_or_default()
}

/// Delegate to the drug-safety specialist.
pub struct SafetyDelegation {
    user_problem: String,
}

#[async_trait]
impl Capability for SafetyDelegation {
    fn name(&self) -> &str {
        "safety_agent"
    }

    fn description(&self) -> &str {
        "Evaluate the safety of the drug used in this clinical trial, including its \
         safety profile, toxicity, side effects, and historical failure rates. Given \
         the drug name and the disease name, returns a safety assessment."
    }

    fn parameters_schema(&self) -> Value {
        string_object_schema(&[
            ("drug_name", "The drug name", true),
            ("disease_name", "The disease name", true),
        ])
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &AgentContext,
        depth: usize,
    ) -> Result<String, CapabilityError> {
        ctx.budget.check_depth(depth + 1)?;
        let drug = required_str(&args, "drug_name");
        let disease = required_str(&args, "disease_name");

        let mut child = specialists::safety_agent(depth + 1);
        let question =
            format!("How can I evaluate the safety of the drug {drug} for the disease {disease}?");
        solve_with_decomposition(&mut child, &self.user_problem, &question, ctx).await
    }
}

/// Delegate to the drug-efficacy specialist.
pub struct EfficiencyDelegation {
    user_problem: String,
}

#[async_trait]
impl Capability for EfficiencyDelegation {
    fn name(&self) -> &str {
        "efficiency_agent"
    }

    fn description(&self) -> &str {
        "Evaluate the efficiency of the drug used in this clinical trial against the \
         target disease, using knowledge-graph evidence about the drug, the disease, \
         and the path between them. Given the drug name and the disease name, returns \
         an efficacy assessment."
    }

    fn parameters_schema(&self) -> Value {
        string_object_schema(&[
            ("drug_name", "The drug name", true),
            ("disease_name", "The disease name", true),
        ])
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &AgentContext,
        depth: usize,
    ) -> Result<String, CapabilityError> {
        ctx.budget.check_depth(depth + 1)?;
        let drug = required_str(&args, "drug_name");
        let disease = required_str(&args, "disease_name");

        let mut child = specialists::efficiency_agent(depth + 1);
        let question = format!(
            "How can I evaluate the efficiency of the drug {drug} against the disease {disease}?"
        );
        solve_with_decomposition(&mut child, &self.user_problem, &question, ctx).await
    }
}

/// Delegate to the enrollment specialist (single-shot, no decomposition).
pub struct EnrollmentDelegation {
    user_problem: String,
}

#[async_trait]
impl Capability for EnrollmentDelegation {
    fn name(&self) -> &str {
        "enrollment_agent"
    }

    fn description(&self) -> &str {
        "Evaluate the enrollment difficulty of this clinical trial from its eligibility \
         criteria. Given the eligibility criteria, the drug name, and the disease name, \
         returns an enrollment assessment."
    }

    fn parameters_schema(&self) -> Value {
        string_object_schema(&[
            (
                "eligibility_criteria",
                "Eligibility criteria of the clinical trial, containing inclusion and \
                 exclusion criteria",
                true,
            ),
            ("drug_name", "The drug name", true),
            ("disease_name", "The disease name", true),
        ])
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &AgentContext,
        depth: usize,
    ) -> Result<String, CapabilityError> {
        ctx.budget.check_depth(depth + 1)?;
        let criteria = required_str(&args, "eligibility_criteria");
        let drug = required_str(&args, "drug_name");
        let disease = required_str(&args, "disease_name");

        let mut child = specialists::enrollment_agent(depth + 1);
        let question = format!(
            "Evaluate the enrollment difficulty of a clinical trial studying the drug {drug} \
             for the disease {disease}, with the following eligibility criteria:\n{criteria}"
        );
        let record = run_child(
            &mut child,
            &subproblem_prompt(&self.user_problem, &question),
            ctx,
        )
        .await?;

        ctx.events.emit(AgentEvent::Solution {
            agent: child.name().to_string(),
            depth: child.depth(),
            text: record.text().to_string(),
        });
        Ok(record.text().to_string())
    }
}

/// Delegate to the graph-reasoning specialist (single-shot, no decomposition).
pub struct GraphReasoningDelegation {
    user_problem: String,
}

#[async_trait]
impl Capability for GraphReasoningDelegation {
    fn name(&self) -> &str {
        "graph_reasoning_agent"
    }

    fn description(&self) -> &str {
        "Answer an instruction by reasoning over the biomedical knowledge graph. Given \
         two keywords indicating nodes in the graph and the instruction, returns an \
         answer grounded in the relationships and paths between the nodes."
    }

    fn parameters_schema(&self) -> Value {
        string_object_schema(&[
            ("keyword_1", "The first keyword indicating a node in the graph", true),
            ("keyword_2", "The second keyword indicating a node in the graph", true),
            ("user_instruction", "The user's instruction to be answered", true),
        ])
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &AgentContext,
        depth: usize,
    ) -> Result<String, CapabilityError> {
        ctx.budget.check_depth(depth + 1)?;
        let keyword_1 = required_str(&args, "keyword_1");
        let keyword_2 = required_str(&args, "keyword_2");
        let instruction = required_str(&args, "user_instruction");

        let mut child = specialists::graph_reasoning_agent(depth + 1);
        let question = format!(
            "Using the knowledge graph nodes for {keyword_1} and {keyword_2}, answer this \
             instruction: {instruction}"
        );
        let record = run_child(
            &mut child,
            &subproblem_prompt(&self.user_problem, &question),
            ctx,
        )
        .await?;

        ctx.events.emit(AgentEvent::Solution {
            agent: child.name().to_string(),
            depth: child.depth(),
            text: record.text().to_string(),
        });
        Ok(record.text().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::budget::{BudgetError, RecursionBudget};
    use crate::agents::events::EventSink;
    use crate::agents::testing::{calls_response, scripted_ctx, text_response, tool_call, ScriptedLlm};
    use crate::knowledge::{KnowledgeServices, SafetyLookup};
    use crate::markers::NO_SOLUTION;
    use crate::llm::Role;

    struct FakeSafety;

    #[async_trait]
    impl SafetyLookup for FakeSafety {
        async fn drug_profile(&self, drug_name: &str) -> anyhow::Result<String> {
            Ok(format!("{drug_name}: low toxicity"))
        }

        async fn failure_rates(&self, _drug: &str, _disease: &str) -> anyhow::Result<String> {
            Ok("historical failure 0.3".into())
        }
    }

    fn safety_delegation_script() -> ScriptedLlm {
        // In call order:
        //   1. root dispatch: invoke safety_agent
        //   2. decomposition inside the delegation
        //   3. child dispatch: invoke drug_safety_profile
        //   4. child dispatch: terminal text
        //   5. root dispatch: terminal text
        ScriptedLlm::new(vec![
            calls_response(vec![tool_call(
                "call_1",
                "safety_agent",
                r#"{"drug_name": "aspirin", "disease_name": "headache"}"#,
            )]),
            text_response("<subproblem>check the toxicity of aspirin</subproblem>"),
            calls_response(vec![tool_call(
                "call_2",
                "drug_safety_profile",
                r#"{"drug_name": "aspirin"}"#,
            )]),
            text_response("Aspirin shows low toxicity."),
            text_response("The trial looks safe."),
        ])
    }

    #[tokio::test]
    async fn safety_delegation_runs_a_child_one_level_deeper() {
        let (events, mut rx) = EventSink::channel();
        let mut ctx = scripted_ctx(safety_delegation_script()).with_events(events);
        ctx.knowledge = KnowledgeServices {
            safety: Some(Arc::new(FakeSafety)),
            ..KnowledgeServices::none()
        };

        let mut root = clinical_agent("will the trial pass?");
        let got = root.request("will the trial pass?", &ctx).await.unwrap();
        assert_eq!(got, "The trial looks safe.");

        // Root invocation plus the child's leaf invocation.
        assert_eq!(ctx.budget.invocations_used(), 2);

        // The child's leaf invocation happened at depth 2.
        let mut child_invocation_depth = None;
        while let Ok(event) = rx.try_recv() {
            if let AgentEvent::Invocation {
                capability, depth, ..
            } = event
            {
                if capability == "drug_safety_profile" {
                    child_invocation_depth = Some(depth);
                }
            }
        }
        assert_eq!(child_invocation_depth, Some(2));
    }

    #[tokio::test]
    async fn delegation_payload_joins_solutions_in_order() {
        let mut ctx = scripted_ctx(safety_delegation_script());
        ctx.knowledge = KnowledgeServices {
            safety: Some(Arc::new(FakeSafety)),
            ..KnowledgeServices::none()
        };

        let mut root = clinical_agent("will the trial pass?");
        root.request("will the trial pass?", &ctx).await.unwrap();

        let payload = root
            .conversation()
            .iter()
            .find(|m| m.role == Role::Tool)
            .and_then(|m| m.content.clone())
            .unwrap();
        assert_eq!(payload, "Aspirin shows low toxicity.");
    }

    #[tokio::test]
    async fn depth_ceiling_rejects_the_delegation() {
        let mut ctx = scripted_ctx(ScriptedLlm::new(vec![calls_response(vec![tool_call(
            "call_1",
            "safety_agent",
            r#"{"drug_name": "aspirin", "disease_name": "headache"}"#,
        )])]));
        ctx.budget = RecursionBudget::new(1, 64);

        let mut root = clinical_agent("will the trial pass?");
        let err = root.request("will the trial pass?", &ctx).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Budget(BudgetError::DepthExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn empty_child_answer_becomes_the_sentinel() {
        // Enrollment child answers with empty text; the delegation payload is
        // the no-solution sentinel and the root continues.
        let ctx = scripted_ctx(ScriptedLlm::new(vec![
            calls_response(vec![tool_call(
                "call_1",
                "enrollment_agent",
                r#"{"eligibility_criteria": "adults 18-65", "drug_name": "aspirin",
                    "disease_name": "headache"}"#,
            )]),
            text_response(""),
            text_response("Enrollment is uncertain."),
        ]));

        let mut root = clinical_agent("will the trial pass?");
        let got = root.request("will the trial pass?", &ctx).await.unwrap();
        assert_eq!(got, "Enrollment is uncertain.");

        let payload = root
            .conversation()
            .iter()
            .find(|m| m.role == Role::Tool)
            .and_then(|m| m.content.clone())
            .unwrap();
        assert_eq!(payload, NO_SOLUTION);
    }

    #[tokio::test]
    async fn empty_decomposition_falls_back_to_a_single_step() {
        // Decomposition returns no markers; the delegation solves the whole
        // question as one step.
        let mut ctx = scripted_ctx(ScriptedLlm::new(vec![
            calls_response(vec![tool_call(
                "call_1",
                "safety_agent",
                r#"{"drug_name": "aspirin", "disease_name": "headache"}"#,
            )]),
            text_response("no plan needed"),
            text_response("Aspirin is broadly safe."),
            text_response("The trial looks safe."),
        ]));
        ctx.knowledge = KnowledgeServices {
            safety: Some(Arc::new(FakeSafety)),
            ..KnowledgeServices::none()
        };

        let mut root = clinical_agent("will the trial pass?");
        let got = root.request("will the trial pass?", &ctx).await.unwrap();
        assert_eq!(got, "The trial looks safe.");

        let payload = root
            .conversation()
            .iter()
            .find(|m| m.role == Role::Tool)
            .and_then(|m| m.content.clone())
            .unwrap();
        assert_eq!(payload, "Aspirin is broadly safe.");
    }

    #[test]
    fn root_registry_advertises_all_four_delegations() {
        let root = clinical_agent("will the trial pass?");
        assert_eq!(root.depth(), 1);
        for name in [
            "safety_agent",
            "efficiency_agent",
            "enrollment_agent",
            "graph_reasoning_agent",
        ] {
            assert!(root.registry().get(name).is_some(), "missing {name}");
        }
    }
}
