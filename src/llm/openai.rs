use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::config::LlmConfig;

use super::types;
use super::{ChatProvider, Completion, LlmError, OutputSchema, ToolInvocation, ToolSpec, Turn};

/// OpenAI-compatible Chat Completions client with tool calling and
/// structured output.
#[derive(Debug)]
pub struct OpenAiClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_messages(messages: &[Turn]) -> Vec<types::Message> {
        messages
            .iter()
            .map(|turn| match turn {
                Turn::System(content) => types::Message {
                    role: "system",
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Turn::User(content) => types::Message {
                    role: "user",
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                },
                Turn::Assistant {
                    content,
                    tool_calls,
                } => types::Message {
                    role: "assistant",
                    content: content.clone(),
                    tool_calls: if tool_calls.is_empty() {
                        None
                    } else {
                        Some(
                            tool_calls
                                .iter()
                                .map(|call| types::ToolCallRequest {
                                    id: call.id.clone(),
                                    call_type: "function",
                                    function: types::FunctionCallRequest {
                                        name: call.name.clone(),
                                        arguments: call.arguments.clone(),
                                    },
                                })
                                .collect(),
                        )
                    },
                    tool_call_id: None,
                },
                Turn::ToolResult { call_id, content } => types::Message {
                    role: "tool",
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(call_id.clone()),
                },
            })
            .collect()
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.config.model, turns = messages.len()))]
    async fn complete(
        &self,
        messages: &[Turn],
        tools: &[ToolSpec],
        output_schema: Option<&OutputSchema>,
    ) -> Result<Completion, LlmError> {
        let body = types::Request {
            model: &self.config.model,
            messages: Self::build_messages(messages),
            tools: if tools.is_empty() {
                None
            } else {
                Some(
                    tools
                        .iter()
                        .map(|spec| types::Tool {
                            tool_type: "function",
                            function: types::FunctionDef {
                                name: spec.name,
                                description: spec.description,
                                parameters: &spec.parameters,
                            },
                        })
                        .collect(),
                )
            },
            response_format: output_schema.map(|out| types::ResponseFormat {
                format_type: "json_schema",
                json_schema: types::JsonSchemaFormat {
                    name: out.name,
                    schema: &out.schema,
                    strict: true,
                },
            }),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_secs)
                } else {
                    LlmError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: types::Response = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseFormat(e.to_string()))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseFormat("response has no choices".into()))?
            .message;

        let tool_calls: Vec<ToolInvocation> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolInvocation {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!(
            has_text = message.content.is_some(),
            tool_calls = tool_calls.len(),
            "model round complete"
        );

        Ok(Completion {
            text: message.content.filter(|text| !text.is_empty()),
            tool_calls,
        })
    }
}
