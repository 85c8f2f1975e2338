//! Marker grammar shared between the orchestrator and the model.
//!
//! Two fixed marker pairs are the only structured contract the model is asked
//! to honor: one enclosing each subproblem of a decomposition, one enclosing
//! the numeric result of the final answer. Everything else is free text.
//!
//! The grammar is deliberately tiny: exact marker strings, no nesting, and a
//! first-match-wins scan on malformed input. Model output is untrusted, so the
//! parser never fails — zero matches is an empty vec, not an error.

use regex::Regex;
use std::sync::OnceLock;

/// Marker pair enclosing one subproblem in a decomposition response.
pub const SUBPROBLEM_OPEN: &str = "<subproblem>";
pub const SUBPROBLEM_CLOSE: &str = "</subproblem>";

/// Marker pair enclosing the numeric result in a final answer.
pub const FINAL_RESULT_OPEN: &str = "<final_result>";
pub const FINAL_RESULT_CLOSE: &str = "</final_result>";

/// Fixed sentinel recorded when a delegate fails or returns nothing.
pub const NO_SOLUTION: &str = "No solution found";

fn subproblem_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<subproblem>(.*?)</subproblem>").unwrap())
}

fn final_result_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<final_result>(.*?)</final_result>").unwrap())
}

/// Extract every `<subproblem>` span from `text`, trimmed, in document order.
///
/// Non-overlapping, left-to-right. Markers embedded in otherwise unstructured
/// prose are fine; an unpaired open marker is ignored.
pub fn extract_subproblems(text: &str) -> Vec<String> {
    subproblem_re()
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Extract the first `<final_result>` span from `text`, trimmed.
pub fn extract_final_result(text: &str) -> Option<String> {
    final_result_re()
        .captures(text)
        .map(|c| c[1].trim().to_string())
}

/// Parse the first result token as a probability, if it is one.
pub fn extract_probability(text: &str) -> Option<f64> {
    extract_final_result(text).and_then(|s| s.parse::<f64>().ok())
}

/// Count result tokens in `text` (the aggregation contract asks for exactly one).
pub fn count_final_results(text: &str) -> usize {
    final_result_re().captures_iter(text).count()
}
