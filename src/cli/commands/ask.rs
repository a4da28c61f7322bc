//! Ask command implementation.

use super::build_engine;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    max_rounds: Option<usize>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let (_orchestrator, engine) = build_engine(&settings, model.as_deref(), max_rounds)?;

    let spinner = Output::spinner("Thinking...");

    match engine.query(question, None).await {
        Ok(response) => {
            spinner.finish_and_clear();
            Output::answer(&response.answer, &response.sources);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
