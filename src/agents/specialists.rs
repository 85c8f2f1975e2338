//! Specialist child agents and their leaf capabilities.
//!
//! Each specialist is a plain [`Agent`] whose capabilities are thin adapters
//! over the delegate knowledge services: no further delegation happens below
//! this level. A missing or failing service is a delegate failure, which the
//! dispatch loop folds back into the conversation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::prompts::{EFFICACY_ROLE, ENROLLMENT_ROLE, GRAPH_ROLE, SAFETY_ROLE};

use super::agent::Agent;
use super::capability::{string_object_schema, Capability, CapabilityError, CapabilityRegistry};
use super::context::AgentContext;

fn required_str<'a>(args: &'a Value, key: &str) -> &'a str {
    // Arguments were validated against the schema before dispatch.
    args[key].as_str().unwrap_or_default()
}

fn delegate_err(name: &str, err: impl std::fmt::Display) -> CapabilityError {
    CapabilityError::Delegate {
        name: name.to_string(),
        reason: err.to_string(),
    }
}

fn service_missing(name: &str, service: &str) -> CapabilityError {
    CapabilityError::Delegate {
        name: name.to_string(),
        reason: format!("{service} service is not configured"),
    }
}

/// Safety profile lookup: introduction, ADMET, toxicity, side effects.
pub struct DrugSafetyProfile;

#[async_trait]
impl Capability for DrugSafetyProfile {
    fn name(&self) -> &str {
        "drug_safety_profile"
    }

    fn description(&self) -> &str {
        "Retrieve the safety information of a drug: introduction, ADMET properties, \
         toxicity, and side effects. Given the drug name, returns the safety profile."
    }

    fn parameters_schema(&self) -> Value {
        string_object_schema(&[("drug_name", "The drug name", true)])
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &AgentContext,
        _depth: usize,
    ) -> Result<String, CapabilityError> {
        let service = ctx
            .knowledge
            .safety
            .as_ref()
            .ok_or_else(|| service_missing(self.name(), "safety"))?;
        service
            .drug_profile(required_str(&args, "drug_name"))
            .await
            .map_err(|e| delegate_err(self.name(), e))
    }
}

/// Historical failure rates for a drug/disease combination.
pub struct HistoricalFailureRates;

#[async_trait]
impl Capability for HistoricalFailureRates {
    fn name(&self) -> &str {
        "historical_failure_rates"
    }

    fn description(&self) -> &str {
        "Retrieve historical clinical-trial failure rates for a drug and disease \
         combination. Given the drug name and disease name, returns the risk profile."
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
        _depth: usize,
    ) -> Result<String, CapabilityError> {
        let service = ctx
            .knowledge
            .safety
            .as_ref()
            .ok_or_else(|| service_missing(self.name(), "safety"))?;
        service
            .failure_rates(
                required_str(&args, "drug_name"),
                required_str(&args, "disease_name"),
            )
            .await
            .map_err(|e| delegate_err(self.name(), e))
    }
}

/// Hetionet evidence: drug introduction, disease introduction, and the path
/// between them in the knowledge graph.
pub struct DrugDiseaseEvidence;

#[async_trait]
impl Capability for DrugDiseaseEvidence {
    fn name(&self) -> &str {
        "drug_disease_evidence"
    }

    fn description(&self) -> &str {
        "Retrieve efficacy evidence for a drug against a disease: the drug \
         introduction, the disease introduction, and the path between drug and \
         disease in the Hetionet knowledge graph."
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
        _depth: usize,
    ) -> Result<String, CapabilityError> {
        let service = ctx
            .knowledge
            .efficacy
            .as_ref()
            .ok_or_else(|| service_missing(self.name(), "efficacy"))?;
        service
            .drug_disease_evidence(
                required_str(&args, "drug_name"),
                required_str(&args, "disease_name"),
            )
            .await
            .map_err(|e| delegate_err(self.name(), e))
    }
}

/// Enrollment classifier over eligibility criteria.
pub struct ClassifyEnrollment;

#[async_trait]
impl Capability for ClassifyEnrollment {
    fn name(&self) -> &str {
        "classify_enrollment"
    }

    fn description(&self) -> &str {
        "Classify the enrollment potential of a clinical trial from its eligibility \
         criteria. Returns poor enrollment, good enrollment, or excellent enrollment."
    }

    fn parameters_schema(&self) -> Value {
        string_object_schema(&[(
            "eligibility_criteria",
            "Eligibility criteria, containing inclusion and exclusion criteria",
            true,
        )])
    }

    async fn execute(
        &self,
        args: Value,
        ctx: &AgentContext,
        _depth: usize,
    ) -> Result<String, CapabilityError> {
        let service = ctx
            .knowledge
            .enrollment
            .as_ref()
            .ok_or_else(|| service_missing(self.name(), "enrollment"))?;
        let outlook = service
            .classify(required_str(&args, "eligibility_criteria"))
            .await
            .map_err(|e| delegate_err(self.name(), e))?;
        Ok(format!("The clinical trial is predicted to have {outlook}."))
    }
}

/// Graph-reasoning answerer over a node pair and an instruction.
pub struct AnswerToInstruction;

#[async_trait]
impl Capability for AnswerToInstruction {
    fn name(&self) -> &str {
        "answer_to_instruction"
    }

    fn description(&self) -> &str {
        "Answer the user's instruction using information from the knowledge graph. \
         Given two keywords indicating nodes in the graph and the instruction, \
         returns an answer based on the relationships and paths between the nodes."
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
        _depth: usize,
    ) -> Result<String, CapabilityError> {
        let service = ctx
            .knowledge
            .graph
            .as_ref()
            .ok_or_else(|| service_missing(self.name(), "graph"))?;
        service
            .answer(
                required_str(&args, "keyword_1"),
                required_str(&args, "keyword_2"),
                required_str(&args, "user_instruction"),
            )
            .await
            .map_err(|e| delegate_err(self.name(), e))
    }
}

/// Drug-safety specialist.
pub fn safety_agent(depth: usize) -> Agent {
    Agent::new(
        "safety_agent",
        SAFETY_ROLE,
        CapabilityRegistry::new(vec![
            Arc::new(DrugSafetyProfile),
            Arc::new(HistoricalFailureRates),
        ]),
        depth,
    )
}

/// Drug-efficacy specialist.
pub fn efficiency_agent(depth: usize) -> Agent {
    Agent::new(
        "efficiency_agent",
        EFFICACY_ROLE,
        CapabilityRegistry::new(vec![Arc::new(DrugDiseaseEvidence)]),
        depth,
    )
}

/// Enrollment specialist.
pub fn enrollment_agent(depth: usize) -> Agent {
    Agent::new(
        "enrollment_agent",
        ENROLLMENT_ROLE,
        CapabilityRegistry::new(vec![Arc::new(ClassifyEnrollment)]),
        depth,
    )
}

/// Graph-reasoning specialist.
pub fn graph_reasoning_agent(depth: usize) -> Agent {
    Agent::new(
        "graph_reasoning_agent",
        GRAPH_ROLE,
        CapabilityRegistry::new(vec![Arc::new(AnswerToInstruction)]),
        depth,
    )
}
