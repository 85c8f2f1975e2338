//! Central recursion budget for a root request.
//!
//! Delegation is driven by untrusted model output, so the call tree is bounded
//! here rather than per-agent: one shared budget caps both the delegation
//! depth and the total number of capability invocations across the whole tree.
//! Exhaustion is a typed terminal error, never a hang or a stack overflow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Budget exhaustion errors. Terminal for the enclosing root request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BudgetError {
    #[error("delegation depth {depth} exceeds the maximum of {max}")]
    DepthExhausted { depth: usize, max: usize },

    #[error("capability invocation budget of {max} exhausted")]
    InvocationsExhausted { max: u64 },
}

/// Shared recursion budget, cloned into every agent context in one call tree.
///
/// Clones share the invocation counter, so enforcement is global per root
/// request regardless of how deep the delegation goes.
#[derive(Debug, Clone)]
pub struct RecursionBudget {
    max_depth: usize,
    max_invocations: u64,
    used: Arc<AtomicU64>,
}

impl RecursionBudget {
    pub fn new(max_depth: usize, max_invocations: u64) -> Self {
        Self {
            max_depth,
            max_invocations,
            used: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Check that an agent may exist at `depth` (root is depth 1).
    pub fn check_depth(&self, depth: usize) -> Result<(), BudgetError> {
        if depth > self.max_depth {
            return Err(BudgetError::DepthExhausted {
                depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }

    /// Charge one capability invocation against the shared counter.
    pub fn charge_invocation(&self) -> Result<(), BudgetError> {
        let used = self.used.fetch_add(1, Ordering::SeqCst);
        if used >= self.max_invocations {
            return Err(BudgetError::InvocationsExhausted {
                max: self.max_invocations,
            });
        }
        Ok(())
    }

    /// Invocations charged so far across the whole call tree.
    pub fn invocations_used(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_within_bound_is_ok() {
        let budget = RecursionBudget::new(3, 10);
        assert!(budget.check_depth(1).is_ok());
        assert!(budget.check_depth(3).is_ok());
        assert_eq!(
            budget.check_depth(4),
            Err(BudgetError::DepthExhausted { depth: 4, max: 3 })
        );
    }

    #[test]
    fn invocation_counter_is_shared_across_clones() {
        let budget = RecursionBudget::new(3, 2);
        let clone = budget.clone();

        assert!(budget.charge_invocation().is_ok());
        assert!(clone.charge_invocation().is_ok());
        assert_eq!(
            budget.charge_invocation(),
            Err(BudgetError::InvocationsExhausted { max: 2 })
        );
        assert_eq!(clone.invocations_used(), 3);
    }
}
