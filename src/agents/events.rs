//! Progress events for the operator log.
//!
//! The core emits structured events (plan / subproblem / invocation / solution
//! / final answer); a collaborator renders them, typically as the
//! depth-indented log the CLI prints. Events ride a `tokio::sync::broadcast`
//! channel so the core never blocks on a slow or absent consumer.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Channel capacity for progress events. Lagging receivers drop old events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One progress event from the orchestration core.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// An agent started planning (decomposing) a problem.
    Plan {
        agent: String,
        depth: usize,
        problem: String,
    },
    /// One subproblem produced by a decomposition, in order.
    Subproblem {
        agent: String,
        depth: usize,
        text: String,
    },
    /// A capability invocation was dispatched.
    Invocation {
        agent: String,
        depth: usize,
        capability: String,
        ok: bool,
    },
    /// A solution (or the no-solution sentinel) for one subproblem.
    Solution {
        agent: String,
        depth: usize,
        text: String,
    },
    /// The final aggregated answer for the root problem.
    FinalAnswer {
        text: String,
        probability: Option<f64>,
    },
}

impl AgentEvent {
    /// Depth used for log indentation (final answers render at the root).
    pub fn depth(&self) -> usize {
        match self {
            AgentEvent::Plan { depth, .. }
            | AgentEvent::Subproblem { depth, .. }
            | AgentEvent::Invocation { depth, .. }
            | AgentEvent::Solution { depth, .. } => *depth,
            AgentEvent::FinalAnswer { .. } => 1,
        }
    }

    /// Render the event as one operator-log line.
    pub fn render(&self) -> String {
        match self {
            AgentEvent::Plan { agent, problem, .. } => {
                format!("[{}] [PLAN]: {}", agent, problem)
            }
            AgentEvent::Subproblem { text, .. } => {
                format!("<subproblem>{}</subproblem>", text)
            }
            AgentEvent::Invocation {
                agent, capability, ok, ..
            } => {
                let status = if *ok { "ok" } else { "error" };
                format!("[{}] [ACTION]: {} -> {}", agent, capability, status)
            }
            AgentEvent::Solution { text, .. } => {
                format!("<solution>{}</solution>", text)
            }
            AgentEvent::FinalAnswer { text, probability } => match probability {
                Some(p) => format!("[FINAL] p={} {}", p, text),
                None => format!("[FINAL] {}", text),
            },
        }
    }
}

/// Sink the core emits progress events into.
///
/// A disabled sink drops everything; either way each event is also traced, so
/// operators get the depth-indented log even without a subscriber task.
#[derive(Debug, Clone)]
pub struct EventSink {
    request_id: Uuid,
    tx: Option<broadcast::Sender<AgentEvent>>,
}

impl EventSink {
    /// Create a live sink plus the receiver end for a renderer task.
    pub fn channel() -> (Self, broadcast::Receiver<AgentEvent>) {
        let (tx, rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                request_id: Uuid::new_v4(),
                tx: Some(tx),
            },
            rx,
        )
    }

    /// Create a sink that only traces.
    pub fn disabled() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            tx: None,
        }
    }

    /// Correlation id for this root request.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Emit one event. Never fails; a closed channel just drops the event.
    pub fn emit(&self, event: AgentEvent) {
        let indent = "\t".repeat(event.depth().saturating_sub(1));
        tracing::info!(
            target: "clinical_agent::progress",
            request_id = %self.request_id,
            "{}{}",
            indent,
            event.render()
        );
        if let Some(ref tx) = self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_reach_the_receiver() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(AgentEvent::Subproblem {
            agent: "clinical_agent".into(),
            depth: 1,
            text: "find A".into(),
        });

        let got = rx.try_recv().expect("event should be buffered");
        match got {
            AgentEvent::Subproblem { text, .. } => assert_eq!(text, "find A"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn disabled_sink_does_not_panic() {
        let sink = EventSink::disabled();
        sink.emit(AgentEvent::FinalAnswer {
            text: "done".into(),
            probability: Some(0.5),
        });
    }

    #[test]
    fn render_formats() {
        let event = AgentEvent::Solution {
            agent: "safety_agent".into(),
            depth: 2,
            text: "low toxicity".into(),
        };
        assert_eq!(event.render(), "<solution>low toxicity</solution>");
        assert_eq!(event.depth(), 2);
    }
}
