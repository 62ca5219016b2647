//! Conversation orchestrator: a bounded model⇄tool loop that streams
//! assistant text to the caller as it is produced.
//!
//! One request owns one loop; rounds are strictly sequential, tool calls
//! inside a round run concurrently. The step ceiling guarantees termination
//! even against a model that requests tools forever.

use std::convert::Infallible;

use bytes::Bytes;
use futures::channel::mpsc;
use futures::future::join_all;
use futures::SinkExt;
use tracing::{error, warn};

use crate::llm::{Completion, LlmError, ToolSpec, Turn};
use crate::state::AppState;
use crate::tools::ToolRegistry;

/// Appended after any partial text when the step ceiling is hit without a
/// final answer.
pub const INCOMPLETE_MARKER: &str = "\n[incomplete: step limit reached]";

const MID_STREAM_ERROR: &str = "\nSomething went wrong while generating the reply.";

pub type ChunkStream = mpsc::Receiver<Result<Bytes, Infallible>>;

/// Run the first model round, then hand the rest of the loop to a task that
/// feeds the returned stream. A failure on the first round surfaces as an
/// `Err` so the transport can still answer with a proper 500; later
/// failures become an error chunk (the status line is already gone).
pub async fn stream_reply(state: AppState, mut turns: Vec<Turn>) -> Result<ChunkStream, LlmError> {
    let registry = ToolRegistry::chat(&state);
    let specs = registry.specs();

    let first = state.llm.complete(&turns, &specs, None).await?;

    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        drive_loop(state, registry, specs, &mut turns, first, tx).await;
    });
    Ok(rx)
}

async fn drive_loop(
    state: AppState,
    registry: ToolRegistry,
    specs: Vec<ToolSpec>,
    turns: &mut Vec<Turn>,
    first: Completion,
    mut tx: mpsc::Sender<Result<Bytes, Infallible>>,
) {
    let max_steps = state.config.llm.chat_max_steps.max(1);
    let mut completion = first;
    let mut rounds = 1u32;

    loop {
        if let Some(text) = completion.text.clone() {
            // A send failure means the consumer closed the stream; stop the
            // whole loop rather than keep burning model rounds.
            if tx.send(Ok(Bytes::from(text))).await.is_err() {
                return;
            }
        }

        if completion.tool_calls.is_empty() {
            // Natural completion; closing the channel ends the stream.
            return;
        }

        let calls = completion.tool_calls.clone();
        turns.push(Turn::Assistant {
            content: completion.text.clone(),
            tool_calls: calls.clone(),
        });

        let outcomes = join_all(calls.iter().map(|call| registry.execute(call))).await;
        for (call, outcome) in calls.iter().zip(&outcomes) {
            if !outcome.success {
                warn!(tool = %call.name, message = %outcome.message, "tool call failed");
            }
            turns.push(Turn::ToolResult {
                call_id: call.id.clone(),
                content: outcome.feedback(),
            });
        }

        if rounds >= max_steps {
            let _ = tx
                .send(Ok(Bytes::from_static(INCOMPLETE_MARKER.as_bytes())))
                .await;
            return;
        }

        match state.llm.complete(turns, &specs, None).await {
            Ok(next) => {
                rounds += 1;
                completion = next;
            }
            Err(e) => {
                error!(error = %e, round = rounds, "model round failed mid-stream");
                let _ = tx
                    .send(Ok(Bytes::from_static(MID_STREAM_ERROR.as_bytes())))
                    .await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::StreamExt;

    use super::*;
    use crate::llm::ToolInvocation;
    use crate::state::fakes::{FailingLookup, LoopingChat, ScriptedChat};
    use crate::state::AppState;

    fn tool_call(name: &str, arguments: &str) -> ToolInvocation {
        ToolInvocation {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    async fn collect(stream: ChunkStream) -> String {
        let chunks: Vec<_> = stream.collect().await;
        chunks
            .into_iter()
            .map(|chunk| String::from_utf8(chunk.unwrap().to_vec()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn plain_answer_streams_and_closes() {
        let llm = ScriptedChat::new(vec![Ok(Completion {
            text: Some("You logged 540 kcal today.".into()),
            tool_calls: Vec::new(),
        })]);
        let state = AppState::fake_with_llm(Arc::new(llm));

        let stream = stream_reply(state, vec![Turn::User("how much today?".into())])
            .await
            .unwrap();
        assert_eq!(collect(stream).await, "You logged 540 kcal today.");
    }

    #[tokio::test]
    async fn adversarial_model_terminates_at_step_ceiling() {
        // Every round requests another tool call; the loop must stop at the
        // ceiling and still produce a non-empty response.
        let llm = LoopingChat::new(Completion {
            text: None,
            tool_calls: vec![tool_call("getCurrentIsoTime", "{}")],
        });
        let state = AppState::fake_with_llm(Arc::new(llm));

        let stream = stream_reply(state, vec![Turn::User("loop forever".into())])
            .await
            .unwrap();
        let body = collect(stream).await;
        assert!(!body.is_empty());
        assert!(body.ends_with(INCOMPLETE_MARKER));
    }

    #[tokio::test]
    async fn failing_tool_does_not_abort_the_conversation() {
        let llm = ScriptedChat::new(vec![
            Ok(Completion {
                text: None,
                tool_calls: vec![tool_call(
                    "getFoodNutritionalInformation",
                    r#"{"id": "4000417025005"}"#,
                )],
            }),
            Ok(Completion {
                text: Some("I could not reach the food database.".into()),
                tool_calls: Vec::new(),
            }),
        ]);
        let mut state = AppState::fake_with_llm(Arc::new(llm));
        state.lookup = Arc::new(FailingLookup::network("connection reset"));

        let stream = stream_reply(state, vec![Turn::User("scan this".into())])
            .await
            .unwrap();
        assert_eq!(collect(stream).await, "I could not reach the food database.");
    }

    #[tokio::test]
    async fn first_round_failure_is_an_error_not_a_stream() {
        let llm = ScriptedChat::new(vec![Err(LlmError::Timeout(5))]);
        let state = AppState::fake_with_llm(Arc::new(llm));

        let result = stream_reply(state, vec![Turn::User("hi".into())]).await;
        assert!(matches!(result, Err(LlmError::Timeout(5))));
    }

    #[tokio::test]
    async fn mid_stream_failure_emits_error_chunk() {
        let llm = ScriptedChat::new(vec![
            Ok(Completion {
                text: Some("Checking the clock.".into()),
                tool_calls: vec![tool_call("getCurrentIsoTime", "{}")],
            }),
            Err(LlmError::Request("boom".into())),
        ]);
        let state = AppState::fake_with_llm(Arc::new(llm));

        let stream = stream_reply(state, vec![Turn::User("hi".into())])
            .await
            .unwrap();
        let body = collect(stream).await;
        assert!(body.starts_with("Checking the clock."));
        assert!(body.ends_with(MID_STREAM_ERROR));
    }
}
