use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::ingredients::dto::NewIngredient;
use crate::ingredients::repo;

use super::ToolOutcome;

#[derive(Debug, Deserialize)]
pub(super) struct ByNameArgs {
    pub name: String,
}

pub(super) async fn ingredient_by_name(db: &PgPool, args: ByNameArgs) -> ToolOutcome {
    match repo::find_by_name(db, &args.name).await {
        Ok(Some(ingredient)) => ToolOutcome::ok(
            format!("Found ingredient {}.", args.name),
            json!({ "ingredient": ingredient }),
        ),
        Ok(None) => ToolOutcome::fail(format!("No ingredient found with name {}.", args.name)),
        Err(e) => ToolOutcome::fail_with(
            format!("Failed to look up ingredient {}.", args.name),
            json!({ "error": e.to_string() }),
        ),
    }
}

pub(super) async fn add_ingredient(db: &PgPool, args: NewIngredient) -> ToolOutcome {
    if let Err(msg) = args.validate() {
        return ToolOutcome::fail(format!("Invalid ingredient: {msg}"));
    }

    match repo::create(db, &args).await {
        Ok(outcome) => ToolOutcome::ok(
            match outcome {
                repo::CreateOutcome::Inserted(_) => format!("Saved ingredient {}.", args.name),
                repo::CreateOutcome::Existing(_) => {
                    format!("Ingredient {} already exists.", args.name)
                }
            },
            json!({
                "ingredient": {
                    "id": outcome.id(),
                    "name": args.name,
                    "calories": args.calories,
                    "fat": args.fat,
                    "protein": args.protein,
                    "carbohydrates": args.carbohydrates,
                    "unit": args.unit.as_str(),
                    "quantity": args.quantity,
                    "ean_id": args.ean_id,
                }
            }),
        ),
        Err(e) => ToolOutcome::fail_with(
            format!("Failed to save ingredient {}.", args.name),
            json!({ "error": e.to_string() }),
        ),
    }
}
