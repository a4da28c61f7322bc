//! OpenAI chat-completions reasoner with function tools.

use super::{Message, Reasoner, ReasonerReply, ToolInvocation};
use crate::agent::ToolSpec;
use crate::config::Settings;
use crate::error::{PensumError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Reasoner backed by the OpenAI chat-completions API.
pub struct OpenAIReasoner {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIReasoner {
    /// Create a reasoner from application settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(
                settings.openai.timeout_secs,
            ))?,
            model: settings.rag.model.clone(),
            temperature: settings.rag.temperature,
            max_tokens: settings.rag.max_tokens,
        })
    }

    /// Override the model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Reasoner for OpenAIReasoner {
    #[instrument(skip_all, fields(model = %self.model, messages = transcript.len(), tools = tools.is_some()))]
    async fn complete(
        &self,
        transcript: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<ReasonerReply> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(to_request_messages(transcript)?)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens);

        if let Some(specs) = tools.filter(|s| !s.is_empty()) {
            builder.tools(specs.iter().map(to_chat_tool).collect::<Vec<_>>());
        }

        let request = builder.build().map_err(|e| PensumError::Reasoner(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PensumError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PensumError::Reasoner("No response from model".to_string()))?;

        let calls: Vec<ToolInvocation> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(from_chat_tool_call)
            .collect();

        debug!("Reasoner returned {} tool call(s)", calls.len());

        Ok(ReasonerReply::from_parts(choice.message.content, calls))
    }
}

/// Convert a `ToolSpec` into an OpenAI function tool.
fn to_chat_tool(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.input_schema()),
            strict: None,
        },
    }
}

/// Convert an OpenAI tool call into an invocation.
///
/// Arguments that are not valid JSON are forwarded as a JSON string so the tool
/// rejects them with an execution error the reasoner can see.
fn from_chat_tool_call(call: ChatCompletionMessageToolCall) -> ToolInvocation {
    let arguments = serde_json::from_str(&call.function.arguments)
        .unwrap_or(serde_json::Value::String(call.function.arguments));
    ToolInvocation {
        id: call.id,
        name: call.function.name,
        arguments,
    }
}

fn to_request_messages(transcript: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let err = |e: async_openai::error::OpenAIError| PensumError::Reasoner(e.to_string());

    transcript
        .iter()
        .map(|message| {
            let converted: ChatCompletionRequestMessage = match message {
                Message::System(content) => ChatCompletionRequestSystemMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map_err(err)?
                    .into(),
                Message::User(content) => ChatCompletionRequestUserMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map_err(err)?
                    .into(),
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                    if let Some(content) = content {
                        args.content(content.clone());
                    }
                    if !tool_calls.is_empty() {
                        args.tool_calls(
                            tool_calls
                                .iter()
                                .map(|call| ChatCompletionMessageToolCall {
                                    id: call.id.clone(),
                                    r#type: ChatCompletionToolType::Function,
                                    function: FunctionCall {
                                        name: call.name.clone(),
                                        arguments: call.arguments.to_string(),
                                    },
                                })
                                .collect::<Vec<_>>(),
                        );
                    }
                    args.build().map_err(err)?.into()
                }
                Message::Tool {
                    invocation_id,
                    content,
                } => ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(invocation_id.clone())
                    .content(content.clone())
                    .build()
                    .map_err(err)?
                    .into(),
            };
            Ok(converted)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ParameterKind, ToolParameter};
    use serde_json::json;

    #[test]
    fn test_tool_spec_conversion() {
        let spec = ToolSpec::new(
            "get_course_outline",
            "Get a course outline",
            vec![ToolParameter::required("course_name", ParameterKind::String, "Course title")],
        );

        let tool = to_chat_tool(&spec);
        assert_eq!(tool.function.name, "get_course_outline");
        let params = tool.function.parameters.unwrap();
        assert_eq!(params["required"], json!(["course_name"]));
    }

    #[test]
    fn test_invalid_arguments_forwarded_as_string() {
        let call = ChatCompletionMessageToolCall {
            id: "call_1".to_string(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: "search_course_content".to_string(),
                arguments: "{not json".to_string(),
            },
        };

        let invocation = from_chat_tool_call(call);
        assert_eq!(invocation.arguments, json!("{not json"));
    }

    #[test]
    fn test_transcript_conversion() {
        let transcript = vec![
            Message::system("system"),
            Message::user("What is in lesson 5?"),
            Message::Assistant {
                content: None,
                tool_calls: vec![ToolInvocation::new(
                    "call_1",
                    "get_course_outline",
                    json!({"course_name": "MCP"}),
                )],
            },
            Message::tool("call_1", "Course: Introduction to MCP"),
        ];

        let messages = to_request_messages(&transcript).unwrap();
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[3], ChatCompletionRequestMessage::Tool(_)));
    }
}
