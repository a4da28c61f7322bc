//! Courses command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// List the indexed courses.
pub async fn run_courses(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let store = orchestrator.vector_store();

    let titles = match store.list_course_titles().await {
        Ok(titles) => titles,
        Err(e) => {
            Output::error(&format!("Failed to list courses: {}", e));
            return Err(e.into());
        }
    };

    if titles.is_empty() {
        Output::info("No courses indexed yet. Use 'pensum ingest <folder>' to add some.");
        return Ok(());
    }

    Output::header(&format!("Indexed Courses ({})", titles.len()));
    println!();
    for title in &titles {
        Output::list_item(title);
    }

    println!();
    Output::kv("Total courses", &titles.len().to_string());
    Output::kv("Total chunks", &store.chunk_count().await?.to_string());

    Ok(())
}
