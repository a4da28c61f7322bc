//! Parsing of course documents.
//!
//! Expected layout:
//!
//! ```text
//! Course Title: <title>
//! Course Link: <url>
//! Course Instructor: <name>
//!
//! Lesson 0: <lesson title>
//! Lesson Link: <url>
//! <lesson text...>
//! ```

use super::SentenceChunker;
use crate::vector_store::{CourseCatalogEntry, Lesson};
use regex::Regex;
use std::sync::OnceLock;

const METADATA_LINES: usize = 4;
const CONTENT_START_LINE: usize = 3;

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Course Title:\s*(.+)$").expect("Invalid regex"))
}

fn course_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Course Link:\s*(.+)$").expect("Invalid regex"))
}

fn instructor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Course Instructor:\s*(.+)$").expect("Invalid regex"))
}

fn lesson_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Lesson\s+(\d+):\s*(.+)$").expect("Invalid regex"))
}

fn lesson_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Lesson Link:\s*(.+)$").expect("Invalid regex"))
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Raw text of one lesson, or of the whole body when there are no lesson markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonText {
    pub number: Option<u32>,
    pub text: String,
}

/// A chunk ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseChunk {
    pub lesson_number: Option<u32>,
    pub chunk_index: u32,
    pub content: String,
}

/// A parsed course: catalog metadata plus lesson bodies.
#[derive(Debug, Clone)]
pub struct CourseDocument {
    pub entry: CourseCatalogEntry,
    pub lessons: Vec<LessonText>,
}

impl CourseDocument {
    /// Chunk every lesson, numbering chunks across the whole course.
    ///
    /// Lesson chunks carry a `Course <title> Lesson <n> content:` prefix.
    pub fn chunks(&self, chunker: &SentenceChunker) -> Vec<CourseChunk> {
        let mut chunks = Vec::new();
        for lesson in &self.lessons {
            for text in chunker.chunk(&lesson.text) {
                let content = match lesson.number {
                    Some(n) => format!("Course {} Lesson {} content: {}", self.entry.title, n, text),
                    None => text,
                };
                chunks.push(CourseChunk {
                    lesson_number: lesson.number,
                    chunk_index: chunks.len() as u32,
                    content,
                });
            }
        }
        chunks
    }
}

/// Close the current lesson. Lessons without text are dropped.
fn flush(
    current: Option<Lesson>,
    text: &mut Vec<&str>,
    entry: &mut CourseCatalogEntry,
    lessons: &mut Vec<LessonText>,
) {
    let body = text.join("\n").trim().to_string();
    text.clear();
    if let Some(lesson) = current.filter(|_| !body.is_empty()) {
        lessons.push(LessonText {
            number: Some(lesson.number),
            text: body,
        });
        entry.lessons.push(lesson);
    }
}

/// Parse a course document. `fallback_title` is used when the first line is blank.
///
/// Lessons without any text are left out of the catalog entry.
pub fn parse_course_document(content: &str, fallback_title: &str) -> CourseDocument {
    let lines: Vec<&str> = content.trim().lines().collect();

    let title = match lines.first().map(|l| l.trim()) {
        Some(first) if !first.is_empty() => {
            capture(title_re(), first).unwrap_or_else(|| first.to_string())
        }
        _ => fallback_title.to_string(),
    };

    let mut course_link = None;
    let mut instructor = None;
    for line in lines.iter().take(METADATA_LINES).skip(1) {
        if let Some(link) = capture(course_link_re(), line) {
            course_link = Some(link);
        } else if let Some(name) = capture(instructor_re(), line) {
            instructor = Some(name);
        }
    }

    let mut start = CONTENT_START_LINE;
    if lines.get(start).is_some_and(|l| l.trim().is_empty()) {
        start += 1;
    }
    let body = lines.get(start..).unwrap_or_default();

    let mut entry = CourseCatalogEntry {
        title,
        course_link,
        instructor,
        lessons: Vec::new(),
    };
    let mut lessons = Vec::new();

    let mut current: Option<Lesson> = None;
    let mut text: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < body.len() {
        let line = body[i];
        let marker = lesson_re().captures(line.trim()).and_then(|c| {
            let number = c.get(1)?.as_str().parse::<u32>().ok()?;
            Some((number, c.get(2)?.as_str().trim().to_string()))
        });

        match marker {
            Some((number, lesson_title)) => {
                flush(current.take(), &mut text, &mut entry, &mut lessons);
                let link = body.get(i + 1).and_then(|next| capture(lesson_link_re(), next));
                if link.is_some() {
                    i += 1;
                }
                current = Some(Lesson {
                    number,
                    title: lesson_title,
                    link,
                });
            }
            None => text.push(line),
        }
        i += 1;
    }
    flush(current.take(), &mut text, &mut entry, &mut lessons);

    if lessons.is_empty() && lines.len() > 2 {
        let rest = body.join("\n").trim().to_string();
        if !rest.is_empty() {
            lessons.push(LessonText {
                number: None,
                text: rest,
            });
        }
    }

    CourseDocument { entry, lessons }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = "Course Title: Introduction to MCP
Course Link: https://example.com/mcp
Course Instructor: Elie Schoppik

Lesson 0: Introduction
Lesson Link: https://example.com/mcp/0
Welcome to the course. You will build servers.

Lesson 1: Why MCP
MCP standardizes context. It is an open protocol.
Lesson 2: Empty lesson
";

    #[test]
    fn test_parse_metadata_and_lessons() {
        let doc = parse_course_document(DOCUMENT, "mcp.txt");

        assert_eq!(doc.entry.title, "Introduction to MCP");
        assert_eq!(doc.entry.course_link.as_deref(), Some("https://example.com/mcp"));
        assert_eq!(doc.entry.instructor.as_deref(), Some("Elie Schoppik"));

        assert_eq!(doc.entry.lessons.len(), 2);
        assert_eq!(doc.entry.lessons[0].title, "Introduction");
        assert_eq!(doc.entry.lessons[0].link.as_deref(), Some("https://example.com/mcp/0"));
        assert_eq!(doc.entry.lessons[1].number, 1);
        assert_eq!(doc.entry.lessons[1].link, None);

        assert_eq!(doc.lessons[0].text, "Welcome to the course. You will build servers.");
    }

    #[test]
    fn test_chunks_are_prefixed_and_numbered() {
        let doc = parse_course_document(DOCUMENT, "mcp.txt");
        let chunks = doc.chunks(&SentenceChunker::new(800, 100));

        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].content,
            "Course Introduction to MCP Lesson 0 content: Welcome to the course. You will build servers."
        );
        assert_eq!(chunks[1].lesson_number, Some(1));
        assert_eq!(chunks[1].chunk_index, 1);
    }

    #[test]
    fn test_document_without_lessons() {
        let doc = parse_course_document(
            "Course Title: Notes\nCourse Link: https://example.com\nCourse Instructor: Someone\nJust some text. More text.",
            "notes.txt",
        );

        assert!(doc.entry.lessons.is_empty());
        let chunks = doc.chunks(&SentenceChunker::new(800, 100));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].lesson_number, None);
        assert_eq!(chunks[0].content, "Just some text. More text.");
    }

    #[test]
    fn test_blank_first_line_uses_fallback_title() {
        let doc = parse_course_document("\n\n", "fallback.txt");
        assert_eq!(doc.entry.title, "fallback.txt");
        assert!(doc.lessons.is_empty());
    }

    #[test]
    fn test_unlabeled_first_line_is_the_title() {
        let doc = parse_course_document(
            "Prompt Engineering Basics
Course Instructor: Someone

Lesson 1: Intro
First lesson text.",
            "prompting.txt",
        );
        assert_eq!(doc.entry.title, "Prompt Engineering Basics");
        assert_eq!(doc.entry.instructor.as_deref(), Some("Someone"));
    }
}
