use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::foods::dto::{FoodUnit, NewLoggedFood};
use crate::foods::repo;

use super::ToolOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddEatenFoodArgs {
    pub food_name: String,
    pub quantity: f64,
    pub date: String,
    pub unit: FoodUnit,
    #[serde(default)]
    pub ingredient_id: Option<Uuid>,
}

pub(super) async fn add_eaten_food(db: &PgPool, args: AddEatenFoodArgs) -> ToolOutcome {
    if args.food_name.trim().is_empty() {
        return ToolOutcome::fail("Invalid food: foodName must be non-empty");
    }

    let new = NewLoggedFood {
        name: args.food_name.clone(),
        quantity: args.quantity,
        date: args.date,
        unit: args.unit,
        ingredient_id: args.ingredient_id,
    };

    match repo::create(db, &new).await {
        Ok(food) => ToolOutcome::ok(
            format!("Added {} to the list of eaten foods.", args.food_name),
            json!({ "addedFood": food }),
        ),
        Err(e) => ToolOutcome::fail_with(
            format!(
                "Failed to add {} to the list of eaten foods.",
                args.food_name
            ),
            json!({ "error": e.to_string() }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_are_camel_case_like_the_tool_schema() {
        let args: AddEatenFoodArgs = serde_json::from_str(
            r#"{"foodName": "Rice", "quantity": 150, "date": "2025-06-01", "unit": "g"}"#,
        )
        .unwrap();
        assert_eq!(args.food_name, "Rice");
        assert_eq!(args.unit, FoodUnit::G);
        assert!(args.ingredient_id.is_none());
    }

    #[test]
    fn rejects_unknown_unit() {
        let result = serde_json::from_str::<AddEatenFoodArgs>(
            r#"{"foodName": "Tea", "quantity": 1, "date": "2025-06-01", "unit": "cup"}"#,
        );
        assert!(result.is_err());
    }
}
