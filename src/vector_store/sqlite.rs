//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity. Exact-match
//! filters are pushed into SQL; ranking happens on the filtered rows.

use super::{
    cosine_similarity, rank, ChunkRecord, Collection, CourseCatalogEntry, CourseRecord, Lesson,
    SearchFilter, SearchResult, VectorStore,
};
use crate::error::{PensumError, Result};
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, types::Value, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS courses (
        title TEXT PRIMARY KEY,
        course_link TEXT,
        instructor TEXT,
        lessons_json TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        course_title TEXT NOT NULL,
        lesson_number INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title, lesson_number);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets concurrent readers proceed during ingestion
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PensumError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn search_catalog(conn: &Connection, query_embedding: &[f32]) -> Result<Vec<SearchResult>> {
        let mut stmt = conn.prepare("SELECT title, embedding FROM courses ORDER BY rowid")?;

        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            Ok((title, embedding_bytes))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (title, embedding_bytes) = row?;
            let score = cosine_similarity(query_embedding, &Self::bytes_to_embedding(&embedding_bytes));
            results.push(SearchResult {
                document: title.clone(),
                course_title: title,
                lesson_number: None,
                score,
            });
        }
        Ok(results)
    }

    fn search_content(
        conn: &Connection,
        query_embedding: &[f32],
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>> {
        let mut sql = String::from(
            "SELECT content, course_title, lesson_number, embedding FROM chunks",
        );
        let mut clauses = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(title) = &filter.course_title {
            values.push(Value::Text(title.clone()));
            clauses.push(format!("course_title = ?{}", values.len()));
        }
        if let Some(lesson) = filter.lesson_number {
            values.push(Value::Integer(i64::from(lesson)));
            clauses.push(format!("lesson_number = ?{}", values.len()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY course_title, chunk_index");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            let content: String = row.get(0)?;
            let course_title: String = row.get(1)?;
            let lesson_number: Option<u32> = row.get(2)?;
            let embedding_bytes: Vec<u8> = row.get(3)?;
            Ok((content, course_title, lesson_number, embedding_bytes))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (document, course_title, lesson_number, embedding_bytes) = row?;
            let score = cosine_similarity(query_embedding, &Self::bytes_to_embedding(&embedding_bytes));
            results.push(SearchResult {
                document,
                course_title,
                lesson_number,
                score,
            });
        }
        Ok(results)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, course), fields(title = %course.entry.title))]
    async fn upsert_course(&self, course: &CourseRecord) -> Result<()> {
        let conn = self.lock()?;
        let lessons_json = serde_json::to_string(&course.entry.lessons)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO courses
            (title, course_link, instructor, lessons_json, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                course.entry.title,
                course.entry.course_link,
                course.entry.instructor,
                lessons_json,
                Self::embedding_to_bytes(&course.embedding),
                course.indexed_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted course {}", course.entry.title);
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn upsert_chunks(&self, chunks: &[ChunkRecord]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for chunk in chunks {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, course_title, lesson_number, chunk_index, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index,
                    chunk.content,
                    Self::embedding_to_bytes(&chunk.embedding),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        collection: Collection,
        query_embedding: &[f32],
        filter: &SearchFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let results = match collection {
            Collection::Catalog => Self::search_catalog(&conn, query_embedding)?,
            Collection::Content => Self::search_content(&conn, query_embedding, filter)?,
        };

        let results = rank(results, limit);
        debug!("Found {} matching {} rows", results.len(), collection);
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn get_course(&self, title: &str) -> Result<Option<CourseCatalogEntry>> {
        let conn = self.lock()?;

        let row = conn.query_row(
            "SELECT title, course_link, instructor, lessons_json FROM courses WHERE title = ?1",
            params![title],
            |row| {
                let title: String = row.get(0)?;
                let course_link: Option<String> = row.get(1)?;
                let instructor: Option<String> = row.get(2)?;
                let lessons_json: String = row.get(3)?;
                Ok((title, course_link, instructor, lessons_json))
            },
        );

        match row {
            Ok((title, course_link, instructor, lessons_json)) => {
                let lessons: Vec<Lesson> = serde_json::from_str(&lessons_json).map_err(|e| {
                    PensumError::VectorStore(format!(
                        "Corrupt lesson list for '{}': {}",
                        title, e
                    ))
                })?;
                Ok(Some(CourseCatalogEntry {
                    title,
                    course_link,
                    instructor,
                    lessons,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY rowid")?;
        let titles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(titles)
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM courses;")?;
        info!("Cleared vector store");
        Ok(())
    }
}
