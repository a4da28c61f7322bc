//! Pensum - question answering over course materials
//!
//! Course documents are ingested into two vector collections: a catalog of
//! course metadata and a collection of lesson chunks. Questions are answered
//! by a language model that decides for itself whether to search, over a
//! bounded number of tool rounds, and every answer carries the lesson-level
//! citations gathered along the way.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `embedding` - Embedding generation
//! - `vector_store` - Catalog and content collections (SQLite or in-memory)
//! - `reasoner` - Typed chat protocol with tool calls, backed by OpenAI
//! - `agent` - Tools, tool registry and the bounded reasoning loop
//! - `rag` - Course name resolution, conversation memory and the query engine
//! - `chunking` - Course document parsing and sentence chunking
//! - `orchestrator` - Component wiring and ingestion
//!
//! # Example
//!
//! ```rust,no_run
//! use pensum::config::Settings;
//! use pensum::orchestrator::Orchestrator;
//! use pensum::reasoner::OpenAIReasoner;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let reasoner = Arc::new(OpenAIReasoner::from_settings(&settings)?);
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     orchestrator.add_course_folder(Path::new("docs"), false).await?;
//!
//!     let engine = orchestrator.rag_engine(reasoner)?;
//!     let response = engine.query("What is covered in lesson 5 of the MCP course?", None).await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod reasoner;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{PensumError, Result};
