use serde::Deserialize;
use serde_json::json;

use crate::lookup::{FoodLookup, LookupError};

use super::ToolOutcome;

#[derive(Debug, Deserialize)]
pub(super) struct NutritionArgs {
    pub id: String,
}

pub(super) async fn food_nutritional_information(
    lookup: &dyn FoodLookup,
    args: NutritionArgs,
) -> ToolOutcome {
    match lookup.product(&args.id).await {
        Ok(info) => ToolOutcome::ok(
            format!("Fetched nutritional information for food ID {}.", args.id),
            json!({ "nutritionalInfo": info }),
        ),
        Err(LookupError::Status(status)) => ToolOutcome::fail(format!(
            "Failed to fetch nutritional information for food ID {}. Status: {status}",
            args.id
        )),
        Err(LookupError::Request(error)) => ToolOutcome::fail_with(
            format!(
                "Failed to fetch nutritional information for food ID {}.",
                args.id
            ),
            json!({ "error": error }),
        ),
    }
}
