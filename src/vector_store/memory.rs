//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets. Rows keep insertion order so equal
//! scores rank deterministically.

use super::{
    cosine_similarity, rank, ChunkRecord, Collection, CourseCatalogEntry, CourseRecord,
    SearchFilter, SearchResult, VectorStore,
};
use crate::error::{PensumError, Result};
use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    courses: RwLock<Vec<CourseRecord>>,
    chunks: RwLock<Vec<ChunkRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            courses: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
        }
    }

    fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
        lock.read()
            .map_err(|e| PensumError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
        lock.write()
            .map_err(|e| PensumError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_course(&self, course: &CourseRecord) -> Result<()> {
        let mut courses = Self::write(&self.courses)?;
        match courses
            .iter_mut()
            .find(|c| c.entry.title == course.entry.title)
        {
            Some(existing) => *existing = course.clone(),
            None => courses.push(course.clone()),
        }
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize> {
        let mut store = Self::write(&self.chunks)?;
        for chunk in chunks {
            match store.iter_mut().find(|c| c.id == chunk.id) {
                Some(existing) => *existing = chunk.clone(),
                None => store.push(chunk.clone()),
            }
        }
        Ok(chunks.len())
    }

    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let results = match collection {
            Collection::Catalog => Self::read(&self.courses)?
                .iter()
                .map(|c| SearchResult {
                    document: c.entry.title.clone(),
                    course_title: c.entry.title.clone(),
                    lesson_number: None,
                    score: cosine_similarity(query_embedding, &c.embedding),
                })
                .collect(),
            Collection::Content => Self::read(&self.chunks)?
                .iter()
                .filter(|c| filter.matches(&c.course_title, c.lesson_number))
                .map(|c| SearchResult {
                    document: c.content.clone(),
                    course_title: c.course_title.clone(),
                    lesson_number: c.lesson_number,
                    score: cosine_similarity(query_embedding, &c.embedding),
                })
                .collect(),
        };

        Ok(rank(results, limit))
    }

    async fn get_course(&self, title: &str) -> Result<Option<CourseCatalogEntry>> {
        let courses = Self::read(&self.courses)?;
        Ok(courses
            .iter()
            .find(|c| c.entry.title == title)
            .map(|c| c.entry.clone()))
    }

    async fn list_course_titles(&self) -> Result<Vec<String>> {
        let courses = Self::read(&self.courses)?;
        Ok(courses.iter().map(|c| c.entry.title.clone()).collect())
    }

    async fn course_count(&self) -> Result<usize> {
        Ok(Self::read(&self.courses)?.len())
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(Self::read(&self.chunks)?.len())
    }

    async fn clear(&self) -> Result<()> {
        Self::write(&self.courses)?.clear();
        Self::write(&self.chunks)?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::Lesson;

    fn course(title: &str, embedding: Vec<f32>) -> CourseRecord {
        CourseRecord::new(
            CourseCatalogEntry {
                title: title.to_string(),
                course_link: None,
                instructor: None,
                lessons: vec![Lesson {
                    number: 1,
                    title: "Intro".to_string(),
                    link: None,
                }],
            },
            embedding,
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store.upsert_course(&course("Course A", vec![1.0, 0.0, 0.0])).await.unwrap();
        store.upsert_course(&course("Course B", vec![0.0, 1.0, 0.0])).await.unwrap();
        // Replacing by title keeps a single entry
        store.upsert_course(&course("Course A", vec![1.0, 0.0, 0.0])).await.unwrap();
        assert_eq!(store.course_count().await.unwrap(), 2);

        let chunks = vec![
            ChunkRecord::new("Course A".to_string(), Some(1), 0, "alpha".to_string(), vec![1.0, 0.0, 0.0]),
            ChunkRecord::new("Course A".to_string(), Some(2), 1, "beta".to_string(), vec![0.9, 0.1, 0.0]),
            ChunkRecord::new("Course B".to_string(), Some(1), 0, "gamma".to_string(), vec![1.0, 0.0, 0.0]),
        ];
        assert_eq!(store.upsert_chunks(&chunks).await.unwrap(), 3);

        let catalog = store
            .search(Collection::Catalog, &[0.0, 1.0, 0.0], &SearchFilter::default(), 1)
            .await
            .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].course_title, "Course B");

        let filtered = store
            .search(
                Collection::Content,
                &[1.0, 0.0, 0.0],
                &SearchFilter::new(Some("Course A".to_string()), None),
                10,
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].document, "alpha");
        assert!(filtered[0].score >= filtered[1].score);

        let lesson = store
            .search(
                Collection::Content,
                &[1.0, 0.0, 0.0],
                &SearchFilter::new(Some("Course A".to_string()), Some(2)),
                10,
            )
            .await
            .unwrap();
        assert_eq!(lesson.len(), 1);
        assert_eq!(lesson[0].document, "beta");

        store.clear().await.unwrap();
        assert_eq!(store.course_count().await.unwrap(), 0);
        assert_eq!(store.chunk_count().await.unwrap(), 0);
    }
}
