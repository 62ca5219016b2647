//! The fixed set of operations the model may invoke. Dispatch is a closed
//! sum type keyed by tool name; arguments are validated by deserialization
//! before any side effect runs. Execution never propagates an error past
//! the tool boundary: every failure becomes a `success: false` outcome fed
//! back to the model as ordinary conversation content.

mod foods;
mod ingredients;
mod nutrition;
mod time;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::warn;

use crate::llm::{ToolInvocation, ToolSpec};
use crate::lookup::FoodLookup;
use crate::state::AppState;

/// Result of one tool execution, serialized back to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub message: String,
    // Flattened Option serializes nothing when None.
    #[serde(flatten)]
    pub data: Option<Value>,
}

impl ToolOutcome {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn fail_with(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Some(data),
        }
    }

    /// JSON string fed back into the conversation as the tool-result turn.
    pub fn feedback(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            json!({"success": false, "message": "failed to encode tool result"}).to_string()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    CurrentIsoTime,
    CurrentLocalTime,
    FoodNutritionalInformation,
    IngredientByName,
    AddIngredient,
    AddEatenFood,
}

impl ToolKind {
    /// Full set offered to chat conversations.
    pub const CHAT: &'static [ToolKind] = &[
        ToolKind::CurrentIsoTime,
        ToolKind::CurrentLocalTime,
        ToolKind::FoodNutritionalInformation,
        ToolKind::IngredientByName,
        ToolKind::AddIngredient,
        ToolKind::AddEatenFood,
    ];

    /// Barcode scans only get the external lookup; they never write.
    pub const SCAN: &'static [ToolKind] = &[ToolKind::FoodNutritionalInformation];

    pub fn name(self) -> &'static str {
        match self {
            Self::CurrentIsoTime => "getCurrentIsoTime",
            Self::CurrentLocalTime => "getCurrentLocalTime",
            Self::FoodNutritionalInformation => "getFoodNutritionalInformation",
            Self::IngredientByName => "getIngredientByName",
            Self::AddIngredient => "addIngredient",
            Self::AddEatenFood => "addEatenFood",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "getCurrentIsoTime" => Some(Self::CurrentIsoTime),
            "getCurrentLocalTime" => Some(Self::CurrentLocalTime),
            "getFoodNutritionalInformation" => Some(Self::FoodNutritionalInformation),
            "getIngredientByName" => Some(Self::IngredientByName),
            "addIngredient" => Some(Self::AddIngredient),
            "addEatenFood" => Some(Self::AddEatenFood),
            _ => None,
        }
    }

    pub fn spec(self) -> ToolSpec {
        match self {
            Self::CurrentIsoTime => ToolSpec {
                name: self.name(),
                description: "Get the current time",
                parameters: empty_params(),
            },
            Self::CurrentLocalTime => ToolSpec {
                name: self.name(),
                description: "Get the current time in local format",
                parameters: empty_params(),
            },
            Self::FoodNutritionalInformation => ToolSpec {
                name: self.name(),
                description: "Get nutritional information for a food item by its ID",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "string",
                            "description": "The ID of the food item to get nutritional information for"
                        }
                    },
                    "required": ["id"],
                    "additionalProperties": false
                }),
            },
            Self::IngredientByName => ToolSpec {
                name: self.name(),
                description: "Look up a saved ingredient by its exact name",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "The exact name of the ingredient"
                        }
                    },
                    "required": ["name"],
                    "additionalProperties": false
                }),
            },
            Self::AddIngredient => ToolSpec {
                name: self.name(),
                description: "Save a reusable ingredient with its nutritional facts per reference quantity",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Name of the food product"},
                        "calories": {"type": "number", "description": "Calories per the reference quantity"},
                        "fat": {"type": "number", "description": "Fat in grams per the reference quantity"},
                        "protein": {"type": "number", "description": "Protein in grams per the reference quantity"},
                        "carbohydrates": {"type": "number", "description": "Carbohydrates in grams per the reference quantity"},
                        "unit": {"type": "string", "enum": ["g", "ml"], "description": "Unit of measurement"},
                        "quantity": {"type": "number", "description": "Reference quantity the macros are reported for, normally 100"},
                        "ean_id": {"type": "string", "description": "Optional EAN barcode of the product"}
                    },
                    "required": ["name", "calories", "fat", "protein", "carbohydrates", "unit", "quantity"],
                    "additionalProperties": false
                }),
            },
            Self::AddEatenFood => ToolSpec {
                name: self.name(),
                description: "Add a food item to the list of eaten foods",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "foodName": {"type": "string", "description": "The name of the food item to add"},
                        "quantity": {"type": "number", "description": "The quantity of the food item"},
                        "date": {"type": "string", "description": "The date when the food was eaten, ISO-8601"},
                        "unit": {"type": "string", "enum": ["g", "lb", "oz", "ml"], "description": "The unit of measurement for the food item"},
                        "ingredientId": {"type": "string", "description": "Optional id of a saved ingredient to snapshot macros from"}
                    },
                    "required": ["foodName", "quantity", "date", "unit"],
                    "additionalProperties": false
                }),
            },
        }
    }
}

fn empty_params() -> Value {
    json!({"type": "object", "properties": {}, "additionalProperties": false})
}

/// Executes tool calls against the injected store and lookup handles.
/// Scoped per flow: chat gets the full set, scan only the lookup.
#[derive(Clone)]
pub struct ToolRegistry {
    db: PgPool,
    lookup: Arc<dyn FoodLookup>,
    tools: &'static [ToolKind],
}

impl ToolRegistry {
    pub fn chat(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            lookup: state.lookup.clone(),
            tools: ToolKind::CHAT,
        }
    }

    pub fn scan(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            lookup: state.lookup.clone(),
            tools: ToolKind::SCAN,
        }
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|kind| kind.spec()).collect()
    }

    /// Execute one requested call. Always returns an outcome; unknown names,
    /// invalid arguments, and downstream failures all become failure results.
    pub async fn execute(&self, call: &ToolInvocation) -> ToolOutcome {
        let Some(kind) = ToolKind::from_name(&call.name).filter(|k| self.tools.contains(k)) else {
            warn!(tool = %call.name, "model requested unknown tool");
            return ToolOutcome::fail(format!("Unknown tool: {}", call.name));
        };

        match kind {
            ToolKind::CurrentIsoTime => time::current_iso_time(),
            ToolKind::CurrentLocalTime => time::current_local_time(),
            ToolKind::FoodNutritionalInformation => match parse_args(&call.arguments) {
                Ok(args) => nutrition::food_nutritional_information(&*self.lookup, args).await,
                Err(outcome) => outcome,
            },
            ToolKind::IngredientByName => match parse_args(&call.arguments) {
                Ok(args) => ingredients::ingredient_by_name(&self.db, args).await,
                Err(outcome) => outcome,
            },
            ToolKind::AddIngredient => match parse_args(&call.arguments) {
                Ok(args) => ingredients::add_ingredient(&self.db, args).await,
                Err(outcome) => outcome,
            },
            ToolKind::AddEatenFood => match parse_args(&call.arguments) {
                Ok(args) => foods::add_eaten_food(&self.db, args).await,
                Err(outcome) => outcome,
            },
        }
    }
}

/// Deserialize the raw argument string into the tool's typed input. An empty
/// argument string counts as `{}` (parameterless calls).
fn parse_args<T: DeserializeOwned>(raw: &str) -> Result<T, ToolOutcome> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw)
        .map_err(|e| ToolOutcome::fail(format!("Invalid tool arguments: {e}")))
}
