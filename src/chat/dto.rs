use serde::Deserialize;

use crate::llm::Turn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api/chat`: the full prior transcript, unbounded, no
/// server-side trimming.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<InboundMessage>,
}

impl ChatRequest {
    pub fn into_turns(self) -> Vec<Turn> {
        self.messages
            .into_iter()
            .map(|message| match message.role {
                Role::System => Turn::System(message.content),
                Role::User => Turn::User(message.content),
                Role::Assistant => Turn::assistant(message.content),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_converts_transcript() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"messages": [
                {"role": "user", "content": "I ate two eggs"},
                {"role": "assistant", "content": "Logged."}
            ]}"#,
        )
        .unwrap();
        let turns = request.into_turns();
        assert_eq!(turns.len(), 2);
        assert!(matches!(&turns[0], Turn::User(content) if content == "I ate two eggs"));
        assert!(matches!(
            &turns[1],
            Turn::Assistant { content: Some(text), tool_calls } if text == "Logged." && tool_calls.is_empty()
        ));
    }

    #[test]
    fn rejects_unknown_role() {
        let result = serde_json::from_str::<ChatRequest>(
            r#"{"messages": [{"role": "tool", "content": "x"}]}"#,
        );
        assert!(result.is_err());
    }
}
