//! Scan orchestrator: a single bounded model invocation constrained to a
//! fixed output schema, with only the external nutrition lookup available.

use serde_json::json;
use tracing::warn;

use crate::llm::{LlmError, OutputSchema, Turn};
use crate::state::AppState;
use crate::tools::ToolRegistry;

use super::dto::ScanResult;

const SYSTEM_PROMPT: &str = "You receive the id of a food product and can use the tools to get \
its nutritional information. Return exactly the following information:\n\
- productName: The name of the food product\n\
- calories: Calories in the food product per 100g\n\
- fat: Fat content in grams per 100g\n\
- protein: Protein content in grams per 100g\n\
- carbohydrates: Carbohydrates content in grams per 100g";

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("model produced no structured output within {0} steps")]
    Incomplete(u32),
    #[error("structured output did not match the expected schema: {0}")]
    Schema(String),
}

fn output_schema() -> OutputSchema {
    OutputSchema {
        name: "ingredient",
        schema: json!({
            "type": "object",
            "properties": {
                "productName": {"type": "string", "description": "Name of the food product."},
                "calories": {"type": "number", "description": "Calories in the food product per 100g."},
                "fat": {"type": "number", "description": "Fat content in grams per 100g."},
                "protein": {"type": "number", "description": "Protein content in grams per 100g."},
                "carbohydrates": {"type": "number", "description": "Carbohydrates content in grams per 100g."}
            },
            "required": ["productName", "calories", "fat", "protein", "carbohydrates"],
            "additionalProperties": false
        }),
    }
}

/// Produce one ingredient-shaped candidate for a product id. Never writes
/// to the store; persistence is the caller's explicit confirmation step.
pub async fn scan_product(state: &AppState, id: &str) -> Result<ScanResult, ScanError> {
    let registry = ToolRegistry::scan(state);
    let specs = registry.specs();
    let schema = output_schema();
    let max_steps = state.config.llm.scan_max_steps.max(1);

    let mut turns = vec![
        Turn::System(SYSTEM_PROMPT.into()),
        Turn::User(format!("The food product id is {id}.")),
    ];

    for _ in 0..max_steps {
        let completion = state.llm.complete(&turns, &specs, Some(&schema)).await?;

        if completion.tool_calls.is_empty() {
            let text = completion
                .text
                .ok_or_else(|| ScanError::Schema("empty final message".into()))?;
            return serde_json::from_str(&text).map_err(|e| ScanError::Schema(e.to_string()));
        }

        let calls = completion.tool_calls.clone();
        turns.push(Turn::Assistant {
            content: completion.text,
            tool_calls: calls.clone(),
        });
        for call in &calls {
            let outcome = registry.execute(call).await;
            if !outcome.success {
                warn!(tool = %call.name, message = %outcome.message, "scan tool call failed");
            }
            turns.push(Turn::ToolResult {
                call_id: call.id.clone(),
                content: outcome.feedback(),
            });
        }
    }

    Err(ScanError::Incomplete(max_steps))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm::{Completion, ToolInvocation};
    use crate::state::fakes::{LoopingChat, ScriptedChat};
    use crate::state::AppState;

    fn lookup_call() -> ToolInvocation {
        ToolInvocation {
            id: "call_1".into(),
            name: "getFoodNutritionalInformation".into(),
            arguments: r#"{"id": "4000417025005"}"#.into(),
        }
    }

    #[test]
    fn prompt_and_schema_agree_on_the_output_shape() {
        let schema = output_schema().schema;
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["required"].as_array().map(Vec::len), Some(5));
        // The strict schema forbids extra fields, so the prompt must not
        // invite any.
        assert!(!SYSTEM_PROMPT.contains("extra information"));
    }

    fn structured(text: &str) -> Completion {
        Completion {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    #[tokio::test]
    async fn lookup_then_structured_answer() {
        let llm = ScriptedChat::new(vec![
            Ok(Completion {
                text: None,
                tool_calls: vec![lookup_call()],
            }),
            Ok(structured(
                r#"{"productName": "Whole Milk", "calories": 64.0, "fat": 3.5,
                    "protein": 3.3, "carbohydrates": 4.8}"#,
            )),
        ]);
        let state = AppState::fake_with_llm(Arc::new(llm));

        let result = scan_product(&state, "4000417025005").await.unwrap();
        assert_eq!(result.product_name, "Whole Milk");
        assert_eq!(result.calories, 64.0);
    }

    #[tokio::test]
    async fn missing_required_field_is_a_schema_error() {
        let llm = ScriptedChat::new(vec![Ok(structured(
            r#"{"productName": "Mystery", "calories": 100.0}"#,
        ))]);
        let state = AppState::fake_with_llm(Arc::new(llm));

        let err = scan_product(&state, "0000").await.unwrap_err();
        assert!(matches!(err, ScanError::Schema(_)));
    }

    #[tokio::test]
    async fn endless_tool_requests_hit_the_ceiling() {
        let llm = LoopingChat::new(Completion {
            text: None,
            tool_calls: vec![lookup_call()],
        });
        let state = AppState::fake_with_llm(Arc::new(llm));

        let err = scan_product(&state, "0000").await.unwrap_err();
        assert!(matches!(err, ScanError::Incomplete(5)));
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let llm = ScriptedChat::new(vec![Err(LlmError::Upstream {
            status: 429,
            message: "rate limited".into(),
        })]);
        let state = AppState::fake_with_llm(Arc::new(llm));

        let err = scan_product(&state, "0000").await.unwrap_err();
        assert!(matches!(err, ScanError::Llm(LlmError::Upstream { status: 429, .. })));
    }
}
