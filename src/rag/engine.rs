//! Query facade: one question in, one cited answer out.

use super::session::SessionManager;
use super::CourseIndex;
use crate::agent::{Agent, Source, ToolRegistry};
use crate::config::{Prompts, RagSettings};
use crate::error::Result;
use crate::reasoner::Reasoner;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Answer to one query.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: String,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!("\n{}", source.label));
                if let Some(link) = source.lesson_link.as_ref().or(source.course_link.as_ref()) {
                    output.push_str(&format!("\n  {}", link));
                }
            }
        }

        output
    }
}

/// Catalog summary.
#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Ties the course tools, the reasoning loop and session memory together.
///
/// Safe to share across tasks: per-query state lives on the stack of
/// [`RagEngine::query`], and sessions are behind their own lock.
pub struct RagEngine {
    index: Arc<CourseIndex>,
    registry: ToolRegistry,
    agent: Agent,
    prompts: Prompts,
    sessions: SessionManager,
}

impl RagEngine {
    pub fn new(
        index: Arc<CourseIndex>,
        reasoner: Arc<dyn Reasoner>,
        settings: &RagSettings,
    ) -> Result<Self> {
        Ok(Self {
            registry: ToolRegistry::with_course_tools(index.clone(), settings.max_results)?,
            agent: Agent::new(reasoner).with_max_rounds(settings.max_rounds),
            prompts: Prompts::default(),
            sessions: SessionManager::new(settings.max_history)
                .with_max_sessions(settings.max_sessions),
            index,
        })
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Override the round limit.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.agent = self.agent.with_max_rounds(max_rounds);
        self
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Answer `query`, continuing `session_id` or starting a new session.
    ///
    /// The session only records the exchange when an answer was produced.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<RagResponse> {
        info!("Processing query");

        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session()?,
        };
        let history = self.sessions.history(&session_id)?;

        let mut tools = self.registry.scope();
        let response = self
            .agent
            .run(
                &mut tools,
                &self.prompts.system_prompt(),
                history.as_deref(),
                &self.prompts.render_query(query),
            )
            .await?;

        info!(
            "Answered with {} source(s) after {} reasoner call(s) ({:?})",
            response.sources.len(),
            response.reasoner_calls,
            response.termination
        );

        self.sessions
            .add_exchange(&session_id, query, &response.answer)?;

        Ok(RagResponse {
            answer: response.answer,
            sources: response.sources,
            session_id,
        })
    }

    /// Number and titles of the indexed courses.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.index.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoner::Message;
    use crate::testing::{
        answer, call, seeded_index, FailingReasoner, ScriptedReasoner, COMPUTER_USE_COURSE,
        MCP_COURSE,
    };
    use serde_json::json;

    async fn engine(reasoner: Arc<dyn Reasoner>) -> RagEngine {
        RagEngine::new(
            Arc::new(seeded_index().await),
            reasoner,
            &RagSettings::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_wraps_question_and_records_history() {
        let reasoner = Arc::new(ScriptedReasoner::new(vec![
            answer("MCP is a protocol."),
            answer("It was built by Anthropic."),
        ]));
        let engine = engine(reasoner.clone()).await;

        let first = engine.query("What is MCP?", None).await.unwrap();
        assert_eq!(first.answer, "MCP is a protocol.");

        let second = engine
            .query("Who made it?", Some(&first.session_id))
            .await
            .unwrap();
        assert_eq!(second.session_id, first.session_id);

        let calls = reasoner.calls();
        assert_eq!(
            calls[0].transcript[1],
            Message::user("Answer this question about course materials: What is MCP?")
        );
        match &calls[1].transcript[0] {
            Message::System(system) => assert!(system.ends_with(
                "Previous conversation:\nUser: What is MCP?\nAssistant: MCP is a protocol."
            )),
            other => panic!("unexpected first message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sources_do_not_leak_between_queries() {
        let reasoner = Arc::new(ScriptedReasoner::new(vec![
            call("call_1", "get_course_outline", json!({"course_name": "computer use"})),
            answer("Here is the outline."),
            answer("Hello!"),
        ]));
        let engine = engine(reasoner).await;

        let first = engine.query("Outline of computer use?", None).await.unwrap();
        assert_eq!(first.sources.len(), 3);
        assert_eq!(first.sources[2].label, COMPUTER_USE_COURSE);

        let second = engine.query("Hi", Some(&first.session_id)).await.unwrap();
        assert!(second.sources.is_empty());
    }

    #[tokio::test]
    async fn test_reasoner_failure_leaves_history_untouched() {
        let engine = engine(Arc::new(FailingReasoner)).await;
        let session = engine.sessions().create_session().unwrap();

        assert!(engine.query("What is MCP?", Some(&session)).await.is_err());
        assert_eq!(engine.sessions().history(&session).unwrap(), None);
    }

    #[tokio::test]
    async fn test_custom_query_template() {
        let reasoner = Arc::new(ScriptedReasoner::new(vec![answer("ok")]));
        let mut prompts = Prompts::default();
        prompts.assistant.query = "Q: {{query}}".to_string();
        let engine = engine(reasoner.clone()).await.with_prompts(prompts);

        engine.query("lesson 5?", None).await.unwrap();
        assert_eq!(reasoner.calls()[0].transcript[1], Message::user("Q: lesson 5?"));
    }

    #[tokio::test]
    async fn test_anonymous_queries_do_not_grow_sessions_unbounded() {
        let settings = RagSettings {
            max_sessions: 10,
            ..RagSettings::default()
        };
        let engine = RagEngine::new(
            Arc::new(seeded_index().await),
            Arc::new(ScriptedReasoner::new(vec![answer("hi")])),
            &settings,
        )
        .unwrap();

        let mut last = None;
        for _ in 0..50 {
            last = Some(engine.query("hi", None).await.unwrap().session_id);
        }

        assert_eq!(engine.sessions().session_count().unwrap(), 10);
        let last = last.unwrap();
        assert!(engine.sessions().history(&last).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_course_analytics() {
        let engine = engine(Arc::new(ScriptedReasoner::new(vec![]))).await;
        let analytics = engine.course_analytics().await.unwrap();

        assert_eq!(analytics.total_courses, 2);
        assert!(analytics.course_titles.contains(&MCP_COURSE.to_string()));
        assert!(analytics.course_titles.contains(&COMPUTER_USE_COURSE.to_string()));
    }

    #[test]
    fn test_format_for_display() {
        let response = RagResponse {
            answer: "Answer".to_string(),
            sources: vec![Source {
                label: "MCP - Lesson 1".to_string(),
                course_link: Some("https://example.com/mcp".to_string()),
                lesson_link: Some("https://example.com/mcp/1".to_string()),
                lesson_number: Some(1),
            }],
            session_id: "s".to_string(),
        };
        assert_eq!(
            response.format_for_display(),
            "Answer\n\n--- Sources ---\n\nMCP - Lesson 1\n  https://example.com/mcp/1"
        );
    }
}
