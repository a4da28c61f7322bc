//! Course outline lookup.

use super::{required_str, ParameterKind, Source, Tool, ToolOutput, ToolParameter, ToolSpec};
use crate::error::{PensumError, Result};
use crate::rag::{CourseIndex, CourseResolver};
use crate::vector_store::CourseCatalogEntry;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

/// `get_course_outline`: title, link, instructor and ordered lessons of one course.
pub struct CourseOutlineTool {
    index: Arc<CourseIndex>,
    resolver: CourseResolver,
}

impl CourseOutlineTool {
    pub const NAME: &'static str = "get_course_outline";

    pub fn new(index: Arc<CourseIndex>) -> Self {
        Self {
            resolver: CourseResolver::new(index.clone()),
            index,
        }
    }
}

fn render_outline(entry: &CourseCatalogEntry) -> ToolOutput {
    let lessons = entry.sorted_lessons();

    let mut text = format!("Course: {}\n", entry.title);
    if let Some(link) = &entry.course_link {
        text.push_str(&format!("Course Link: {}\n", link));
    }
    if let Some(instructor) = &entry.instructor {
        text.push_str(&format!("Instructor: {}\n", instructor));
    }
    text.push_str(&format!("\nLessons ({} total):\n", lessons.len()));

    let mut sources = Vec::with_capacity(lessons.len() + 1);
    for lesson in &lessons {
        text.push_str(&format!("\nLesson {}: {}", lesson.number, lesson.title));
        if let Some(link) = &lesson.link {
            text.push_str(&format!("\nLink: {}", link));
        }
        sources.push(Source {
            label: format!("{} - Lesson {}", entry.title, lesson.number),
            course_link: entry.course_link.clone(),
            lesson_link: lesson.link.clone(),
            lesson_number: Some(lesson.number),
        });
    }

    sources.push(Source {
        label: entry.title.clone(),
        course_link: entry.course_link.clone(),
        lesson_link: None,
        lesson_number: None,
    });

    ToolOutput::with_sources(text, sources)
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            Self::NAME,
            "Get the complete outline of a course: title, link, instructor and every lesson with its number and title",
            vec![ToolParameter::required(
                "course_name",
                ParameterKind::String,
                "Course title (partial matches work, e.g. 'MCP', 'Computer Use')",
            )],
        )
    }

    #[instrument(skip_all, fields(tool = Self::NAME))]
    async fn execute(&self, args: &Value) -> Result<ToolOutput> {
        let course_name = required_str(args, "course_name")?;

        let title = match self.resolver.resolve(course_name).await {
            Ok(title) => title,
            Err(PensumError::CourseNotFound(_)) => {
                return Ok(ToolOutput::text(format!(
                    "No course found matching '{}'.",
                    course_name
                )));
            }
            Err(e) => return Err(e),
        };

        match self.index.get_course(&title).await? {
            Some(entry) => Ok(render_outline(&entry)),
            None => Ok(ToolOutput::text(format!(
                "Course '{}' found but no metadata available.",
                title
            ))),
        }
    }
}
