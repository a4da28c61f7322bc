//! Tools the reasoner may invoke.
//!
//! Every tool describes itself with a [`ToolSpec`] and returns its result as
//! text plus the citations backing that text. Tools hold no per-query state;
//! citations travel back in the [`ToolOutput`] of each call.

mod outline;
mod search;

pub use outline::CourseOutlineTool;
pub use search::CourseSearchTool;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
}

impl ParameterKind {
    fn json_type(self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Integer => "integer",
        }
    }
}

/// One named input of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
    pub required: bool,
}

impl ToolParameter {
    pub fn required(name: &str, kind: ParameterKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        }
    }

    pub fn optional(name: &str, kind: ParameterKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// Name, description and inputs of a tool, as presented to the reasoner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str, parameters: Vec<ToolParameter>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    /// JSON Schema object describing the parameters.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A pointer back to the material behind part of an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lesson_link.as_ref().or(self.course_link.as_ref()) {
            Some(link) => write!(f, "{} ({})", self.label, link),
            None => write!(f, "{}", self.label),
        }
    }
}

/// Result of one tool execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// Text-only output with no citations.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// A capability the reasoner can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Run the tool. Errors are reported back to the reasoner, not the user.
    async fn execute(&self, args: &Value) -> Result<ToolOutput>;
}

/// Required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            crate::error::PensumError::InvalidInput(format!(
                "missing required string argument '{}'",
                name
            ))
        })
}

/// Optional string argument; empty strings count as absent.
pub(crate) fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Optional non-negative integer argument. Numeric strings are accepted.
pub(crate) fn optional_u32(args: &Value, name: &str) -> Result<Option<u32>> {
    let invalid = || {
        crate::error::PensumError::InvalidInput(format!(
            "argument '{}' must be a non-negative integer",
            name
        ))
    };

    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_schema() {
        let spec = ToolSpec::new(
            "search_course_content",
            "Search",
            vec![
                ToolParameter::required("query", ParameterKind::String, "What to search for"),
                ToolParameter::optional("lesson_number", ParameterKind::Integer, "Lesson"),
            ],
        );

        let schema = spec.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["lesson_number"]["type"], "integer");
        assert_eq!(schema["required"], json!(["query"]));
    }

    #[test]
    fn test_argument_helpers() {
        let args = json!({"query": "mcp", "course_name": "  ", "lesson_number": "5"});
        assert_eq!(required_str(&args, "query").unwrap(), "mcp");
        assert!(required_str(&args, "missing").is_err());
        assert_eq!(optional_str(&args, "course_name"), None);
        assert_eq!(optional_u32(&args, "lesson_number").unwrap(), Some(5));
        assert_eq!(optional_u32(&json!({}), "lesson_number").unwrap(), None);
        assert!(optional_u32(&json!({"lesson_number": -1}), "lesson_number").is_err());
    }

    #[test]
    fn test_source_serialization_skips_missing_links() {
        let source = Source {
            label: "Intro".to_string(),
            course_link: None,
            lesson_link: None,
            lesson_number: None,
        };
        assert_eq!(serde_json::to_value(&source).unwrap(), json!({"label": "Intro"}));
        assert_eq!(source.to_string(), "Intro");
    }
}
