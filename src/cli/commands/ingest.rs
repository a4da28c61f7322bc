//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::Path;

/// Index every course document in `folder`.
pub async fn run_ingest(folder: &str, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let folder = Settings::expand_path(folder);

    ingest_folder(&orchestrator, &folder, clear).await
}

/// Ingest with progress output. Shared with `serve --docs`.
pub(super) async fn ingest_folder(orchestrator: &Orchestrator, folder: &Path, clear: bool) -> Result<()> {
    let spinner = Output::spinner(&format!("Ingesting {}...", folder.display()));
    let result = orchestrator.add_course_folder(folder, clear).await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    for title in &result.skipped {
        Output::info(&format!("Already indexed: {}", title));
    }
    for path in &result.failed {
        Output::warning(&format!("Could not read {}", path.display()));
    }

    Output::success(&format!(
        "Added {} course(s) with {} chunk(s)",
        result.courses_added, result.chunks_added
    ));

    Ok(())
}
