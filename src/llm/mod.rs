mod openai;
mod types;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One turn of the model conversation, including the tool-calling turns the
/// orchestrators append between provider rounds.
#[derive(Debug, Clone)]
pub enum Turn {
    System(String),
    User(String),
    /// Assistant text from a prior turn (inbound history has no tool calls).
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolInvocation>,
    },
    /// Result of executing one requested tool call, fed back to the model.
    ToolResult { call_id: String, content: String },
}

impl Turn {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// A tool call requested by the model. `arguments` is the raw JSON string
/// from the wire; validation happens at the tool boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Definition of a callable tool as advertised to the model.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// JSON-schema constraint for structured output (scan flow).
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// One provider round: assistant text and/or requested tool calls.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model request timed out after {0}s")]
    Timeout(u64),
    #[error("model returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("malformed model response: {0}")]
    ResponseFormat(String),
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// One model round trip over the full conversation so far.
    async fn complete(
        &self,
        messages: &[Turn],
        tools: &[ToolSpec],
        output_schema: Option<&OutputSchema>,
    ) -> Result<Completion, LlmError>;
}
