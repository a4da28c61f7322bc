//! Tool registry and per-query dispatch.

use super::tools::{CourseOutlineTool, CourseSearchTool, Source, Tool, ToolOutput, ToolSpec};
use crate::error::{PensumError, Result};
use crate::rag::CourseIndex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Holds the registered tools. Built once at startup and shared read-only.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    specs: Vec<ToolSpec>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the content-search and outline tools over `index`.
    pub fn with_course_tools(index: Arc<CourseIndex>, max_results: usize) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(CourseSearchTool::new(index.clone(), max_results)))?;
        registry.register(Box::new(CourseOutlineTool::new(index)))?;
        Ok(registry)
    }

    /// Register a tool under its spec name.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let spec = tool.spec();
        if self.by_name.contains_key(&spec.name) {
            return Err(PensumError::DuplicateTool(spec.name));
        }

        debug!("Registered tool: {}", spec.name);
        self.by_name.insert(spec.name.clone(), self.tools.len());
        self.specs.push(spec);
        self.tools.push(tool);
        Ok(())
    }

    /// Specs of every registered tool, in registration order.
    pub fn schemas(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run the named tool.
    ///
    /// Fails with [`PensumError::UnknownTool`] for unregistered names; tool
    /// failures come back as [`PensumError::ToolExecution`] carrying the tool name.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<ToolOutput> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| PensumError::UnknownTool(name.to_string()))?;

        self.tools[index]
            .execute(args)
            .await
            .map_err(|e| PensumError::ToolExecution {
                tool: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Start collecting citations for one query.
    pub fn scope(&self) -> ToolDispatch<'_> {
        ToolDispatch {
            registry: self,
            sources: Vec::new(),
        }
    }
}

/// Dispatch handle owned by a single query.
///
/// Citations from every successful dispatch accumulate here until drained,
/// so concurrent queries sharing one registry never see each other's sources.
pub struct ToolDispatch<'a> {
    registry: &'a ToolRegistry,
    sources: Vec<Source>,
}

impl ToolDispatch<'_> {
    pub fn schemas(&self) -> &[ToolSpec] {
        self.registry.schemas()
    }

    /// Run the named tool and keep its citations. Returns the result text.
    pub async fn dispatch(&mut self, name: &str, args: &Value) -> Result<String> {
        let output = self.registry.dispatch(name, args).await?;
        self.sources.extend(output.sources);
        Ok(output.text)
    }

    /// Citations gathered so far, in dispatch order. Leaves the buffer empty.
    pub fn drain_sources(&mut self) -> Vec<Source> {
        std::mem::take(&mut self.sources)
    }
}
