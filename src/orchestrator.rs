//! Pipeline orchestrator for Pensum.
//!
//! Wires settings to the store, the embedder and the prompts, and runs
//! ingestion: course documents in, catalog and content collections out.

use crate::chunking::{parse_course_document, CourseDocument, SentenceChunker};
use crate::config::{Prompts, Settings, VectorStoreProvider};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{PensumError, Result};
use crate::rag::{CourseIndex, RagEngine};
use crate::reasoner::Reasoner;
use crate::vector_store::{ChunkRecord, CourseRecord, MemoryVectorStore, SqliteVectorStore, VectorStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Owns the shared components and performs ingestion.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    chunker: SentenceChunker,
}

impl Orchestrator {
    /// Create an orchestrator from settings, opening the configured store.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings)?);

        let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider {
            VectorStoreProvider::Sqlite => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
            VectorStoreProvider::Memory => {
                info!("Using in-memory vector store; the index lives only as long as this process");
                Arc::new(MemoryVectorStore::new())
            }
        };

        Self::with_components(settings, embedder, vector_store)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self {
            chunker: SentenceChunker::from_settings(&settings.chunking),
            settings,
            prompts,
            embedder,
            vector_store,
        })
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read-only search surface over the store.
    pub fn course_index(&self) -> Arc<CourseIndex> {
        Arc::new(CourseIndex::new(self.vector_store.clone(), self.embedder.clone()))
    }

    /// Build a query engine over this orchestrator's store.
    pub fn rag_engine(&self, reasoner: Arc<dyn Reasoner>) -> Result<RagEngine> {
        Ok(RagEngine::new(self.course_index(), reasoner, &self.settings.rag)?
            .with_prompts(self.prompts.clone()))
    }

    /// Ingest every course document in `folder`.
    ///
    /// Courses whose title is already in the catalog are skipped. With
    /// `clear_existing` the store is emptied first.
    #[instrument(skip(self), fields(folder = %folder.display()))]
    pub async fn add_course_folder(&self, folder: &Path, clear_existing: bool) -> Result<IngestResult> {
        if !folder.is_dir() {
            return Err(PensumError::InvalidInput(format!(
                "Not a directory: {}",
                folder.display()
            )));
        }

        if clear_existing {
            info!("Clearing existing course data");
            self.vector_store.clear().await?;
        }

        let mut known: HashSet<String> = self
            .vector_store
            .list_course_titles()
            .await?
            .into_iter()
            .collect();

        let mut result = IngestResult::default();
        for path in course_files(folder)? {
            let document = match read_course_document(&path) {
                Ok(document) => document,
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    result.failed.push(path);
                    continue;
                }
            };

            let title = document.entry.title.clone();
            if known.contains(&title) {
                info!("Course already indexed, skipping: {}", title);
                result.skipped.push(title);
                continue;
            }

            let chunks = self.index_course(document).await?;
            info!("Indexed '{}' ({} chunks)", title, chunks);
            result.courses_added += 1;
            result.chunks_added += chunks;
            known.insert(title);
        }

        Ok(result)
    }

    /// Embed a parsed course into both collections. Returns the chunk count.
    async fn index_course(&self, document: CourseDocument) -> Result<usize> {
        let chunks = document.chunks(&self.chunker);
        debug!("Chunked '{}' into {} chunks", document.entry.title, chunks.len());

        let title_embedding = self.embedder.embed(&document.entry.title).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                ChunkRecord::new(
                    document.entry.title.clone(),
                    chunk.lesson_number,
                    chunk.chunk_index,
                    chunk.content,
                    embedding,
                )
            })
            .collect();

        let count = self.vector_store.upsert_chunks(&records).await?;
        self.vector_store
            .upsert_course(&CourseRecord::new(document.entry, title_embedding))
            .await?;

        Ok(count)
    }
}

/// Course documents directly inside `folder`, sorted by path.
fn course_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_course_document(path: &Path) -> Result<CourseDocument> {
    let content = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(parse_course_document(&content, &file_name))
}

/// Outcome of ingesting a folder.
#[derive(Debug, Default)]
pub struct IngestResult {
    pub courses_added: usize,
    pub chunks_added: usize,
    /// Titles that were already in the catalog.
    pub skipped: Vec<String>,
    /// Files that could not be read.
    pub failed: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;
    use crate::vector_store::{Collection, SearchFilter};

    fn orchestrator() -> (Orchestrator, Arc<MemoryVectorStore>) {
        let store = Arc::new(MemoryVectorStore::new());
        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            Arc::new(KeywordEmbedder::new()),
            store.clone(),
        )
        .unwrap();
        (orchestrator, store)
    }

    fn write_course(dir: &Path, file: &str, title: &str) {
        let content = format!(
            "Course Title: {title}\nCourse Link: https://example.com/{file}\nCourse Instructor: Ada\n\n\
             Lesson 1: Basics\nLesson Link: https://example.com/{file}/1\nThe basics come first. Then practice.\n\
             Lesson 2: Advanced\nAdvanced material follows."
        );
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn test_add_course_folder() {
        let dir = tempfile::tempdir().unwrap();
        write_course(dir.path(), "a.txt", "Alpha Course");
        write_course(dir.path(), "b.md", "Beta Course");
        std::fs::write(dir.path().join("notes.pdf"), "ignored").unwrap();

        let (orchestrator, store) = orchestrator();
        let result = orchestrator.add_course_folder(dir.path(), false).await.unwrap();

        assert_eq!(result.courses_added, 2);
        assert_eq!(result.chunks_added, 4);
        assert_eq!(store.course_count().await.unwrap(), 2);

        let entry = store.get_course("Alpha Course").await.unwrap().unwrap();
        assert_eq!(entry.lessons.len(), 2);
        assert_eq!(entry.lesson(1).unwrap().link.as_deref(), Some("https://example.com/a.txt/1"));

        let index = orchestrator.course_index();
        let hits = index
            .search(
                Collection::Content,
                "basics",
                &SearchFilter::new(Some("Beta Course".to_string()), Some(1)),
                5,
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].document.starts_with("Course Beta Course Lesson 1 content: "));
    }

    #[tokio::test]
    async fn test_existing_courses_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_course(dir.path(), "a.txt", "Alpha Course");

        let (orchestrator, store) = orchestrator();
        orchestrator.add_course_folder(dir.path(), false).await.unwrap();
        let again = orchestrator.add_course_folder(dir.path(), false).await.unwrap();

        assert_eq!(again.courses_added, 0);
        assert_eq!(again.skipped, vec!["Alpha Course".to_string()]);
        assert_eq!(store.chunk_count().await.unwrap(), 2);

        let cleared = orchestrator.add_course_folder(dir.path(), true).await.unwrap();
        assert_eq!(cleared.courses_added, 1);
        assert_eq!(store.chunk_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let (orchestrator, _) = orchestrator();
        let err = orchestrator
            .add_course_folder(Path::new("/nonexistent/pensum-docs"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, PensumError::InvalidInput(_)));
    }
}
