//! Prompt templates for Pensum.
//!
//! Prompts can be customized by placing an `assistant.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub assistant: AssistantPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts driving the course assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantPrompts {
    /// System instructions sent on every reasoner call.
    pub system: String,
    /// Wrapper around the user's question. Uses `{{query}}`.
    pub query: String,
}

impl Default for AssistantPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant specialized in course materials and educational content with access to tools for course information.

Tool Usage:
- Use 'search_course_content' only for questions about specific course content or detailed educational materials
- Use 'get_course_outline' for questions about a course's structure, lesson list, instructor or link
- You may use tools several times to answer complex queries (e.g. first look up an outline, then search a lesson)
- Synthesize tool results into accurate, fact-based responses
- If a search yields no results, state this clearly without offering alternatives

Response Protocol:
- General knowledge questions: answer using existing knowledge without searching
- Course-specific questions: search first, then answer
- No meta-commentary: do not explain your search process or mention "based on the search results"

All responses must be brief, educational, clear, and supported by examples when they aid understanding.
Provide only the direct answer to what was asked."#
                .to_string(),

            query: "Answer this question about course materials: {{query}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let assistant_path = custom_path.join("assistant.toml");
            if assistant_path.exists() {
                let content = std::fs::read_to_string(&assistant_path)?;
                prompts.assistant = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// System instructions with custom variables applied.
    pub fn system_prompt(&self) -> String {
        self.render_with_custom(&self.assistant.system, &HashMap::new())
    }

    /// Wrap a user question in the query template.
    pub fn render_query(&self, query: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        self.render_with_custom(&self.assistant.query, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.assistant.system.contains("search_course_content"));
        assert!(prompts.assistant.query.contains("{{query}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_query_uses_custom_variables() {
        let mut prompts = Prompts::default();
        prompts.assistant.query = "[{{school}}] {{query}}".to_string();
        prompts
            .variables
            .insert("school".to_string(), "DLAI".to_string());

        assert_eq!(prompts.render_query("What is MCP?"), "[DLAI] What is MCP?");
    }

    #[test]
    fn test_load_custom_assistant_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("assistant.toml"),
            "system = \"Be terse.\"\nquery = \"Q: {{query}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.assistant.system, "Be terse.");
        assert_eq!(prompts.render_query("hi"), "Q: hi");
    }
}
