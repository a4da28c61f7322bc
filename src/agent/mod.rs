//! Tool-using question answering.
//!
//! The [`Agent`] runs the bounded reasoning loop, the [`ToolRegistry`] maps
//! tool names to implementations, and [`tools`] holds the course tools.

mod registry;
mod runner;
pub mod tools;

pub use registry::{ToolDispatch, ToolRegistry};
pub use runner::{
    Agent, AgentResponse, Termination, ToolCallRecord, DEFAULT_MAX_ROUNDS, NO_ANSWER_FALLBACK,
};
pub use tools::{ParameterKind, Source, Tool, ToolOutput, ToolParameter, ToolSpec};
