//! Semantic search over lesson content.

use super::{optional_str, optional_u32, required_str, ParameterKind, Source, Tool, ToolOutput, ToolParameter, ToolSpec};
use crate::error::{PensumError, Result};
use crate::rag::{CourseIndex, CourseResolver};
use crate::vector_store::{Collection, CourseCatalogEntry, SearchFilter, SearchResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const DEFAULT_MAX_RESULTS: usize = 5;

/// `search_course_content`: content chunks, optionally scoped to a course and lesson.
pub struct CourseSearchTool {
    index: Arc<CourseIndex>,
    resolver: CourseResolver,
    max_results: usize,
}

impl CourseSearchTool {
    pub const NAME: &'static str = "search_course_content";

    pub fn new(index: Arc<CourseIndex>, max_results: usize) -> Self {
        Self {
            resolver: CourseResolver::new(index.clone()),
            index,
            max_results,
        }
    }

    async fn render(&self, mut hits: Vec<SearchResult>) -> Result<ToolOutput> {
        // Stable: similarity order is kept within a lesson.
        hits.sort_by_key(|hit| hit.lesson_number);

        let mut catalog: HashMap<String, Option<CourseCatalogEntry>> = HashMap::new();
        let mut blocks = Vec::with_capacity(hits.len());
        let mut sources = Vec::with_capacity(hits.len());

        for hit in &hits {
            if !catalog.contains_key(&hit.course_title) {
                let entry = self.index.get_course(&hit.course_title).await?;
                catalog.insert(hit.course_title.clone(), entry);
            }
            let entry = catalog.get(&hit.course_title).and_then(Option::as_ref);

            let label = match hit.lesson_number {
                Some(n) => format!("{} - Lesson {}", hit.course_title, n),
                None => hit.course_title.clone(),
            };
            blocks.push(format!("[{}]\n{}", label, hit.document));

            sources.push(Source {
                label,
                course_link: entry.and_then(|e| e.course_link.clone()),
                lesson_link: hit
                    .lesson_number
                    .and_then(|n| entry.and_then(|e| e.lesson(n)))
                    .and_then(|l| l.link.clone()),
                lesson_number: hit.lesson_number,
            });
        }

        Ok(ToolOutput::with_sources(blocks.join("\n\n"), sources))
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            Self::NAME,
            "Search course materials with smart course name matching and lesson filtering",
            vec![
                ToolParameter::required(
                    "query",
                    ParameterKind::String,
                    "What to search for in the course content",
                ),
                ToolParameter::optional(
                    "course_name",
                    ParameterKind::String,
                    "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
                ),
                ToolParameter::optional(
                    "lesson_number",
                    ParameterKind::Integer,
                    "Specific lesson number to search within (e.g. 1, 2, 3)",
                ),
            ],
        )
    }

    #[instrument(skip_all, fields(tool = Self::NAME))]
    async fn execute(&self, args: &Value) -> Result<ToolOutput> {
        let query = required_str(args, "query")?;
        let course_name = optional_str(args, "course_name");
        let lesson_number = optional_u32(args, "lesson_number")?;

        let course_title = match course_name {
            Some(name) => match self.resolver.resolve(name).await {
                Ok(title) => Some(title),
                Err(PensumError::CourseNotFound(_)) => {
                    return Ok(ToolOutput::text(format!(
                        "No course found matching '{}'.",
                        name
                    )));
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let filter = SearchFilter::new(course_title, lesson_number);
        let hits = self
            .index
            .search(Collection::Content, query, &filter, self.max_results)
            .await?;
        debug!("Content search for '{}' returned {} chunks", query, hits.len());

        if hits.is_empty() {
            let mut scope = String::new();
            if let Some(name) = course_name {
                scope.push_str(&format!(" in course '{}'", name));
            }
            if let Some(n) = lesson_number {
                scope.push_str(&format!(" in lesson {}", n));
            }
            return Ok(ToolOutput::text(format!("No relevant content found{}.", scope)));
        }

        self.render(hits).await
    }
}
