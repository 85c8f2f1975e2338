//! # Clinical Agent
//!
//! Recursive tool-dispatch agent orchestrator for clinical-trial risk
//! prediction.
//!
//! This library provides:
//! - A root clinical agent that delegates to safety, efficacy, enrollment,
//!   and graph-reasoning specialists via model tool calls
//! - Least-to-most decomposition and ordered aggregation around a bounded
//!   dispatch loop
//! - A central recursion budget capping delegation depth and total
//!   capability invocations per request
//!
//! ## Request Flow
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │          clinical_agent          │
//!        │   (decompose → solve → final)    │
//!        └────────────────┬─────────────────┘
//!                         │ tool calls, depth + 1
//!         ┌───────────┬───┴───────┬──────────────┐
//!         ▼           ▼           ▼              ▼
//!      safety     efficiency  enrollment   graph_reasoning
//!      agent        agent       agent          agent
//!         │           │           │              │
//!         ▼           ▼           ▼              ▼
//!            domain knowledge services (HTTP)
//! ```
//!
//! ## Modules
//! - `agents`: the dispatch loop, budget, capabilities, and agent hierarchy
//! - `solve`: end-to-end solve of one root problem
//! - `markers`: the subproblem / final-result marker grammar
//! - `knowledge`: delegate knowledge-service traits and HTTP clients

pub mod agents;
pub mod config;
pub mod knowledge;
pub mod llm;
pub mod markers;
pub mod prompts;
pub mod solve;
pub mod trial;

pub use agents::{Agent, AgentContext, AgentError, EventSink, FinalAnswer};
pub use config::Config;
pub use solve::solve_problem;
