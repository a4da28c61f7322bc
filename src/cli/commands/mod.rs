//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod courses;
mod ingest;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use courses::run_courses;
pub use ingest::run_ingest;
pub use serve::run_serve;

use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::RagEngine;
use crate::reasoner::OpenAIReasoner;
use std::sync::Arc;

/// Open the configured store and build a query engine over it.
fn build_engine(
    settings: &Settings,
    model: Option<&str>,
    max_rounds: Option<usize>,
) -> anyhow::Result<(Orchestrator, RagEngine)> {
    let orchestrator = Orchestrator::new(settings.clone())?;

    let mut reasoner = OpenAIReasoner::from_settings(settings)?;
    if let Some(model) = model {
        reasoner = reasoner.with_model(model);
    }

    let mut engine = orchestrator.rag_engine(Arc::new(reasoner))?;
    if let Some(max_rounds) = max_rounds {
        anyhow::ensure!(max_rounds >= 1, "--max-rounds must be at least 1");
        engine = engine.with_max_rounds(max_rounds);
    }

    Ok((orchestrator, engine))
}
