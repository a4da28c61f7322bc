//! The bounded tool-use loop.

use super::registry::ToolDispatch;
use super::tools::Source;
use crate::error::Result;
use crate::reasoner::{Message, Reasoner, ReasonerReply, ToolInvocation};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Returned when the forced final call yields no text.
pub const NO_ANSWER_FALLBACK: &str =
    "I couldn't produce an answer from the retrieved course material.";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The reasoner replied without requesting tools.
    Answered,
    /// The round limit was reached and a tool-less final call was forced.
    RoundsExhausted,
}

/// Drives the reasoner through at most `max_rounds` tool rounds.
///
/// Each round is one reasoner call plus the dispatch of every invocation it
/// requested, in order. Once the limit is reached the reasoner is called one
/// last time with tools withheld, so a run makes at most `max_rounds + 1`
/// reasoner calls.
pub struct Agent {
    reasoner: Arc<dyn Reasoner>,
    max_rounds: usize,
}

impl Agent {
    pub fn new(reasoner: Arc<dyn Reasoner>) -> Self {
        Self {
            reasoner,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Set the round limit.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Answer `query` using the tools behind `tools`.
    ///
    /// Tool failures are fed back to the reasoner as text. Only reasoner
    /// failures abort the run.
    #[instrument(skip_all, fields(max_rounds = self.max_rounds))]
    pub async fn run(
        &self,
        tools: &mut ToolDispatch<'_>,
        system_prompt: &str,
        history: Option<&str>,
        query: &str,
    ) -> Result<AgentResponse> {
        let system = match history {
            Some(history) if !history.is_empty() => {
                format!("{}\n\nPrevious conversation:\n{}", system_prompt, history)
            }
            _ => system_prompt.to_string(),
        };

        let mut transcript = vec![Message::system(system), Message::user(query)];
        let mut rounds = 0;
        let mut reasoner_calls = 0;
        let mut tool_calls = Vec::new();

        loop {
            if rounds >= self.max_rounds {
                info!("Round limit reached after {} round(s), forcing final answer", rounds);
                reasoner_calls += 1;
                let answer = match self.reasoner.complete(&transcript, None).await? {
                    ReasonerReply::Answer(text) => text,
                    ReasonerReply::ToolCalls { content, calls } => {
                        warn!("Ignoring {} tool call(s) requested on the final round", calls.len());
                        content.unwrap_or_default()
                    }
                };
                if answer.trim().is_empty() {
                    warn!("Final round produced no text, using fallback answer");
                }
                return Ok(AgentResponse {
                    answer: non_empty_or_fallback(answer),
                    sources: tools.drain_sources(),
                    termination: Termination::RoundsExhausted,
                    reasoner_calls,
                    tool_calls,
                });
            }

            debug!("Round {}", rounds + 1);
            reasoner_calls += 1;
            let (content, calls) = match self
                .reasoner
                .complete(&transcript, Some(tools.schemas()))
                .await?
            {
                ReasonerReply::Answer(answer) => {
                    info!("Answered after {} round(s)", rounds);
                    return Ok(AgentResponse {
                        answer,
                        sources: tools.drain_sources(),
                        termination: Termination::Answered,
                        reasoner_calls,
                        tool_calls,
                    });
                }
                ReasonerReply::ToolCalls { content, calls } => (content, calls),
            };

            transcript.push(Message::Assistant {
                content,
                tool_calls: calls.clone(),
            });

            for call in calls {
                let record = Self::execute_tool_call(tools, &call).await;
                transcript.push(Message::tool(call.id.clone(), record.result.clone()));
                tool_calls.push(record);
            }

            rounds += 1;
        }
    }

    /// Dispatch one invocation, turning failures into text for the reasoner.
    async fn execute_tool_call(tools: &mut ToolDispatch<'_>, call: &ToolInvocation) -> ToolCallRecord {
        info!("Calling tool: {}", call);

        let (result, succeeded) = match tools.dispatch(&call.name, &call.arguments).await {
            Ok(text) => (text, true),
            Err(e) => {
                warn!("Tool call {} failed: {}", call.name, e);
                (format!("Tool error: {}", e), false)
            }
        };

        ToolCallRecord {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
            result,
            succeeded,
        }
    }
}

fn non_empty_or_fallback(answer: String) -> String {
    if answer.trim().is_empty() {
        NO_ANSWER_FALLBACK.to_string()
    } else {
        answer
    }
}

/// Outcome of one run.
#[derive(Debug)]
pub struct AgentResponse {
    pub answer: String,
    /// Citations from every successful dispatch, in order, duplicates kept.
    pub sources: Vec<Source>,
    pub termination: Termination,
    /// Number of reasoner calls, including a forced final one.
    pub reasoner_calls: usize,
    pub tool_calls: Vec<ToolCallRecord>,
}

/// Record of a tool call made during a run.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Text fed back to the reasoner.
    pub result: String,
    pub succeeded: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
