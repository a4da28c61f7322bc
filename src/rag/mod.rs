//! Retrieval-augmented question answering over the course catalog.
//!
//! [`CourseIndex`] is the read-only search surface over the vector store,
//! [`CourseResolver`] maps loose course names to catalog titles, and
//! [`RagEngine`] answers queries with the tool-using agent while keeping
//! per-session conversation memory.

mod engine;
mod index;
mod resolver;
pub mod session;

pub use engine::{CourseAnalytics, RagEngine, RagResponse};
pub use index::CourseIndex;
pub use resolver::CourseResolver;
pub use session::{ConversationMemory, SessionManager};
