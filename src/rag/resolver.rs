//! Course name resolution.

use super::CourseIndex;
use crate::error::{PensumError, Result};
use crate::vector_store::{Collection, SearchFilter};
use std::sync::Arc;
use tracing::debug;

/// Maps a free-text, possibly partial course name to one exact catalog title.
///
/// No similarity threshold is applied: whenever the catalog has at least one
/// course, the nearest title wins. Similarly named courses can therefore be
/// confused with each other.
#[derive(Clone)]
pub struct CourseResolver {
    index: Arc<CourseIndex>,
}

impl CourseResolver {
    pub fn new(index: Arc<CourseIndex>) -> Self {
        Self { index }
    }

    /// Resolve `course_name` to the nearest catalog title.
    ///
    /// Fails with [`PensumError::CourseNotFound`] only when the catalog is empty.
    pub async fn resolve(&self, course_name: &str) -> Result<String> {
        let hits = self
            .index
            .search(Collection::Catalog, course_name, &SearchFilter::default(), 1)
            .await?;

        match hits.into_iter().next() {
            Some(hit) => {
                debug!("Resolved '{}' to '{}'", course_name, hit.course_title);
                Ok(hit.course_title)
            }
            None => Err(PensumError::CourseNotFound(course_name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{empty_index, seeded_index, MCP_COURSE};

    #[tokio::test]
    async fn test_partial_name_resolves() {
        let resolver = CourseResolver::new(Arc::new(seeded_index().await));
        assert_eq!(resolver.resolve("MCP").await.unwrap(), MCP_COURSE);
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let resolver = CourseResolver::new(Arc::new(seeded_index().await));
        let first = resolver.resolve("computer use").await.unwrap();
        let second = resolver.resolve("computer use").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "Building Towards Computer Use with Anthropic");
    }

    #[tokio::test]
    async fn test_unrelated_name_still_resolves() {
        let resolver = CourseResolver::new(Arc::new(seeded_index().await));
        let title = resolver.resolve("zzz").await.unwrap();
        assert!(!title.is_empty());
    }

    #[tokio::test]
    async fn test_empty_catalog_is_not_found() {
        let resolver = CourseResolver::new(Arc::new(empty_index()));
        let err = resolver.resolve("MCP").await.unwrap_err();
        assert!(matches!(err, PensumError::CourseNotFound(name) if name == "MCP"));
    }
}
