//! Vector store abstraction for Pensum.
//!
//! A store holds two logical collections: a catalog with one entry per course
//! (embedded by title) and the content chunks of every lesson. Stores are written
//! during ingestion and only read while answering questions.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two logical collections of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Course metadata, one entry per course title.
    Catalog,
    /// Lesson content chunks.
    Content,
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::Catalog => write!(f, "catalog"),
            Collection::Content => write!(f, "content"),
        }
    }
}

/// A lesson inside a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    pub link: Option<String>,
}

/// Structural metadata of one course. The title is the primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseCatalogEntry {
    pub title: String,
    pub course_link: Option<String>,
    pub instructor: Option<String>,
    pub lessons: Vec<Lesson>,
}

impl CourseCatalogEntry {
    /// Find a lesson by number.
    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.number == number)
    }

    /// Lessons in ascending lesson-number order.
    pub fn sorted_lessons(&self) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self.lessons.iter().collect();
        lessons.sort_by_key(|l| l.number);
        lessons
    }
}

/// A catalog row: course metadata plus the embedding of its title.
#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub entry: CourseCatalogEntry,
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

impl CourseRecord {
    pub fn new(entry: CourseCatalogEntry, embedding: Vec<f32>) -> Self {
        Self {
            entry,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A content row: one chunk of lesson text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: Uuid,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    /// Position of this chunk within its course.
    pub chunk_index: u32,
    pub content: String,
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    pub fn new(
        course_title: String,
        lesson_number: Option<u32>,
        chunk_index: u32,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_title,
            lesson_number,
            chunk_index,
            content,
            embedding,
        }
    }
}

/// Exact-match filter applied before similarity ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

impl SearchFilter {
    pub fn new(course_title: Option<String>, lesson_number: Option<u32>) -> Self {
        Self {
            course_title,
            lesson_number,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.course_title.is_none() && self.lesson_number.is_none()
    }

    /// Whether a row with this metadata passes the filter.
    pub fn matches(&self, course_title: &str, lesson_number: Option<u32>) -> bool {
        let course_ok = self
            .course_title
            .as_deref()
            .map_or(true, |t| t == course_title);
        let lesson_ok = self.lesson_number.is_none() || self.lesson_number == lesson_number;
        course_ok && lesson_ok
    }
}

/// A search hit: document text plus its metadata.
///
/// For catalog hits the document is the course title.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub document: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    /// Similarity score (higher is better). Only the ordering is meaningful.
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a course in the catalog.
    async fn upsert_course(&self, course: &CourseRecord) -> Result<()>;

    /// Bulk insert content chunks.
    async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize>;

    /// Similarity search over one collection, best match first.
    ///
    /// The filter only applies to the content collection.
    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Fetch a catalog entry by exact title.
    async fn get_course(&self, title: &str) -> Result<Option<CourseCatalogEntry>>;

    /// All course titles in the catalog.
    async fn list_course_titles(&self) -> Result<Vec<String>>;

    /// Number of courses in the catalog.
    async fn course_count(&self) -> Result<usize>;

    /// Number of content chunks.
    async fn chunk_count(&self) -> Result<usize>;

    /// Remove every course and chunk.
    async fn clear(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort best-first and keep the top `limit`. Ties keep their input order.
pub(crate) fn rank(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_filter_matching() {
        let any = SearchFilter::default();
        assert!(any.is_empty());
        assert!(any.matches("Course A", None));

        let course = SearchFilter::new(Some("Course A".to_string()), None);
        assert!(course.matches("Course A", Some(3)));
        assert!(!course.matches("Course B", Some(3)));

        let both = SearchFilter::new(Some("Course A".to_string()), Some(2));
        assert!(both.matches("Course A", Some(2)));
        assert!(!both.matches("Course A", Some(3)));
        assert!(!both.matches("Course A", None));
    }

    #[test]
    fn test_sorted_lessons() {
        let entry = CourseCatalogEntry {
            title: "Course".to_string(),
            course_link: None,
            instructor: None,
            lessons: vec![
                Lesson { number: 2, title: "Two".to_string(), link: None },
                Lesson { number: 0, title: "Zero".to_string(), link: None },
                Lesson { number: 1, title: "One".to_string(), link: None },
            ],
        };

        let numbers: Vec<u32> = entry.sorted_lessons().iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert_eq!(entry.lesson(1).map(|l| l.title.as_str()), Some("One"));
    }
}
