//! The reasoner: the language model consulted for tool-use decisions and answers.
//!
//! The loop only branches on whether a reply carries tool invocations, so the
//! protocol is modelled as a closed set of typed messages and replies.

mod openai;

pub use openai::OpenAIReasoner;

use crate::agent::ToolSpec;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A request from the reasoner to run one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-assigned identifier, echoed back with the result.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

impl std::fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// One entry of the transcript sent to the reasoner.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolInvocation>,
    },
    /// The result of one invocation, keyed by its identifier.
    Tool {
        invocation_id: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User(content.into())
    }

    pub fn tool(invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            invocation_id: invocation_id.into(),
            content: content.into(),
        }
    }
}

/// What the reasoner answered.
#[derive(Debug, Clone, PartialEq)]
pub enum ReasonerReply {
    /// Final text; no tools requested.
    Answer(String),
    /// One or more tool invocations, with any text that accompanied them.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolInvocation>,
    },
}

impl ReasonerReply {
    /// Build a reply from a provider response, treating an empty call list as an answer.
    pub fn from_parts(content: Option<String>, calls: Vec<ToolInvocation>) -> Self {
        if calls.is_empty() {
            ReasonerReply::Answer(content.unwrap_or_default())
        } else {
            ReasonerReply::ToolCalls { content, calls }
        }
    }
}

/// Request/response interface to the language model.
///
/// Transport failures are returned as errors and are fatal to the query.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Complete the transcript. `tools` is `None` when tools are withheld.
    async fn complete(
        &self,
        transcript: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<ReasonerReply>;
}
