//! clinical-agent - CLI Entry Point
//!
//! Predicts the outcome of one clinical trial from the configured extract.

use std::sync::Arc;

use clinical_agent::agents::EventSink;
use clinical_agent::config::Config;
use clinical_agent::knowledge::KnowledgeServices;
use clinical_agent::llm::OpenRouterClient;
use clinical_agent::{solve_problem, AgentContext};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Use a custom tokio runtime with larger worker thread stacks (16 MB
    // instead of default 2 MB). Recursive delegation (root agent → specialist
    // → leaf capability) nests futures deeply enough to overflow the default
    // worker stack.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(16 * 1024 * 1024)
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinical_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.model);

    // Which trial row to predict (zero-based), default 0
    let index: usize = std::env::args()
        .nth(1)
        .map(|raw| raw.parse())
        .transpose()
        .map_err(|e| anyhow::anyhow!("trial index must be a number: {e}"))?
        .unwrap_or(0);

    let trials_path = config
        .trials_path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("TRIALS_PATH is not set"))?;
    let trial = clinical_agent::trial::load_trial(&trials_path, index)?;
    info!(nctid = %trial.nctid, "predicting trial outcome");

    let llm = Arc::new(OpenRouterClient::new(config.api_key.clone()));
    let knowledge = KnowledgeServices::from_config(&config.knowledge);

    let (events, mut rx) = EventSink::channel();
    let ctx = AgentContext::new(config, llm, knowledge).with_events(events);

    // Render progress events as a depth-indented transcript.
    let renderer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let indent = "\t".repeat(event.depth().saturating_sub(1));
                    println!("{}{}", indent, event.render());
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let answer = solve_problem(&trial.problem(), &ctx).await?;
    drop(ctx);
    let _ = renderer.await;

    println!("\n{}", answer.text);
    match answer.probability {
        Some(p) => match trial.label {
            Some(label) => println!("predicted failure probability: {p} (known label: {label})"),
            None => println!("predicted failure probability: {p}"),
        },
        None => println!("no probability could be extracted from the final answer"),
    }

    Ok(())
}
