//! Text-level access to the vector store.
//!
//! Embeds query text and runs it against one of the two collections. This is
//! the only path by which question answering touches the store, and it never
//! writes.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{Collection, CourseCatalogEntry, SearchFilter, SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Similarity search over the course catalog and content collections.
pub struct CourseIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl CourseIndex {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Search `collection` for `query_text`, best match first.
    #[instrument(skip(self, filter), fields(collection = %collection))]
    pub async fn search(
        &self,
        collection: Collection,
        query_text: &str,
        filter: &SearchFilter,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(query_text).await?;
        let results = self
            .store
            .search(collection, &embedding, filter, top_k)
            .await?;
        debug!("{} search returned {} hits", collection, results.len());
        Ok(results)
    }

    /// Catalog metadata for an exact course title.
    pub async fn get_course(&self, title: &str) -> Result<Option<CourseCatalogEntry>> {
        self.store.get_course(title).await
    }

    pub async fn course_titles(&self) -> Result<Vec<String>> {
        self.store.list_course_titles().await
    }

    pub async fn course_count(&self) -> Result<usize> {
        self.store.course_count().await
    }

    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::seeded_index;

    #[tokio::test]
    async fn test_content_search_respects_filter() {
        let index = seeded_index().await;

        let filter = SearchFilter::new(
            Some("Building Towards Computer Use with Anthropic".to_string()),
            None,
        );
        let results = index
            .search(Collection::Content, "computer use screenshots", &filter, 5)
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert!(results
            .iter()
            .all(|r| r.course_title == "Building Towards Computer Use with Anthropic"));
    }

    #[tokio::test]
    async fn test_top_k_caps_results() {
        let index = seeded_index().await;
        let results = index
            .search(Collection::Content, "lesson", &SearchFilter::default(), 2)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }
}
