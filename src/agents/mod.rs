//! Recursive tool-dispatch orchestration.
//!
//! The pieces: a central [`budget::RecursionBudget`] bounding the call tree,
//! the [`capability::Capability`] trait and per-agent registry, the
//! [`agent::Agent`] dispatch loop, decomposition and aggregation around it,
//! and the concrete clinical agent hierarchy.

pub mod agent;
pub mod aggregate;
pub mod budget;
pub mod capability;
pub mod clinical;
pub mod context;
pub mod decompose;
pub mod events;
pub mod specialists;

#[cfg(test)]
pub(crate) mod testing;

pub use agent::{Agent, AgentError};
pub use aggregate::{aggregate, FinalAnswer, SolutionRecord, SolvedSubproblem};
pub use budget::{BudgetError, RecursionBudget};
pub use capability::{Capability, CapabilityError, CapabilityRegistry};
pub use clinical::clinical_agent;
pub use context::AgentContext;
pub use decompose::decompose;
pub use events::{AgentEvent, EventSink};
