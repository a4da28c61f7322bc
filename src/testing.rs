//! Deterministic stand-ins for the embedding model and the reasoner, plus a
//! seeded two-course catalog. Only compiled for unit tests.

use crate::agent::ToolSpec;
use crate::embedding::Embedder;
use crate::error::{PensumError, Result};
use crate::rag::CourseIndex;
use crate::reasoner::{Message, Reasoner, ReasonerReply, ToolInvocation};
use crate::vector_store::{
    ChunkRecord, CourseCatalogEntry, CourseRecord, Lesson, MemoryVectorStore, VectorStore,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const MCP_COURSE: &str = "Introduction to MCP: Build Rich-Context AI Apps with Anthropic";
pub const COMPUTER_USE_COURSE: &str = "Building Towards Computer Use with Anthropic";

const DIMENSIONS: usize = 256;

/// Bag-of-words embedder: every distinct lowercase token gets its own axis.
///
/// Texts sharing no token have similarity 0, so partial names resolve to the
/// title containing them.
#[derive(Default)]
pub struct KeywordEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
    queries: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of single-text `embed` calls, i.e. query-time searches.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vocabulary = self.vocabulary.lock().unwrap();
        let mut vector = vec![0.0; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
        {
            let next = vocabulary.len();
            let axis = *vocabulary.entry(token).or_insert(next);
            assert!(axis < DIMENSIONS, "test vocabulary exhausted");
            vector[axis] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }
}

fn lesson(number: u32, title: &str, link: Option<&str>) -> Lesson {
    Lesson {
        number,
        title: title.to_string(),
        link: link.map(str::to_string),
    }
}

/// The two seeded courses. MCP lessons are stored out of order on purpose.
pub fn sample_courses() -> Vec<CourseCatalogEntry> {
    vec![
        CourseCatalogEntry {
            title: MCP_COURSE.to_string(),
            course_link: Some("https://example.com/mcp".to_string()),
            instructor: Some("Elie Schoppik".to_string()),
            lessons: vec![
                lesson(0, "Introduction", Some("https://example.com/mcp/0")),
                lesson(1, "Why MCP", Some("https://example.com/mcp/1")),
                lesson(5, "Creating An MCP Client", Some("https://example.com/mcp/5")),
                lesson(2, "MCP Architecture", None),
            ],
        },
        CourseCatalogEntry {
            title: COMPUTER_USE_COURSE.to_string(),
            course_link: Some("https://example.com/computer-use".to_string()),
            instructor: Some("Colt Steele".to_string()),
            lessons: vec![
                lesson(1, "Overview", Some("https://example.com/computer-use/1")),
                lesson(2, "Working With The API", Some("https://example.com/computer-use/2")),
            ],
        },
    ]
}

fn sample_chunks() -> Vec<(&'static str, Option<u32>, &'static str)> {
    vec![
        (MCP_COURSE, Some(0), "Welcome to this lesson on the model context protocol and MCP servers."),
        (MCP_COURSE, Some(1), "MCP standardizes how applications provide context to language models."),
        (MCP_COURSE, Some(5), "In this lesson you build an MCP client that connects to a server and lists its tools."),
        (COMPUTER_USE_COURSE, Some(1), "Computer use lets the model read screenshots and act on them."),
        (COMPUTER_USE_COURSE, Some(2), "This lesson covers sending requests to the API with images."),
    ]
}

/// Store and embedder seeded with [`sample_courses`] and their chunks.
pub async fn seeded_parts() -> (Arc<MemoryVectorStore>, Arc<KeywordEmbedder>) {
    let store = Arc::new(MemoryVectorStore::new());
    let embedder = Arc::new(KeywordEmbedder::new());

    let courses = sample_courses();
    let titles: Vec<String> = courses.iter().map(|c| c.title.clone()).collect();
    let title_embeddings = embedder.embed_batch(&titles).await.unwrap();
    for (entry, embedding) in courses.into_iter().zip(title_embeddings) {
        store.upsert_course(&CourseRecord::new(entry, embedding)).await.unwrap();
    }

    let chunks = sample_chunks();
    let texts: Vec<String> = chunks.iter().map(|(_, _, text)| text.to_string()).collect();
    let embeddings = embedder.embed_batch(&texts).await.unwrap();
    let records: Vec<ChunkRecord> = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, ((course, lesson, text), embedding))| {
            ChunkRecord::new(course.to_string(), lesson, i as u32, text.to_string(), embedding)
        })
        .collect();
    store.upsert_chunks(&records).await.unwrap();

    (store, embedder)
}

pub async fn seeded_index() -> CourseIndex {
    let (store, embedder) = seeded_parts().await;
    CourseIndex::new(store, embedder)
}

pub fn empty_index() -> CourseIndex {
    CourseIndex::new(
        Arc::new(MemoryVectorStore::new()),
        Arc::new(KeywordEmbedder::new()),
    )
}

/// One recorded reasoner call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub transcript: Vec<Message>,
    pub tools_offered: Option<Vec<String>>,
}

/// Reasoner that replays a script and records every call.
///
/// When the script runs out, the last reply is repeated.
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<ReasonerReply>>,
    last: Mutex<Option<ReasonerReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedReasoner {
    pub fn new(replies: Vec<ReasonerReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn complete(
        &self,
        transcript: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<ReasonerReply> {
        self.calls.lock().unwrap().push(RecordedCall {
            transcript: transcript.to_vec(),
            tools_offered: tools.map(|specs| specs.iter().map(|s| s.name.clone()).collect()),
        });

        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        let reply = match next {
            Some(reply) => reply,
            None => last
                .clone()
                .unwrap_or_else(|| ReasonerReply::Answer("(script exhausted)".to_string())),
        };
        *last = Some(reply.clone());
        Ok(reply)
    }
}

/// Reasoner whose transport always fails.
pub struct FailingReasoner;

#[async_trait]
impl Reasoner for FailingReasoner {
    async fn complete(
        &self,
        _transcript: &[Message],
        _tools: Option<&[ToolSpec]>,
    ) -> Result<ReasonerReply> {
        Err(PensumError::OpenAI("connection refused".to_string()))
    }
}

pub fn answer(text: &str) -> ReasonerReply {
    ReasonerReply::Answer(text.to_string())
}

pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> ReasonerReply {
    ReasonerReply::ToolCalls {
        content: None,
        calls: vec![ToolInvocation::new(id, name, arguments)],
    }
}
