use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::dto::NewIngredient;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub calories: f64,
    pub fat: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub unit: String,
    pub quantity: f64,
    pub ean_id: Option<String>,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str =
    "id, name, calories, fat, protein, carbohydrates, unit, quantity, ean_id, created_at";

/// Most-recently-inserted match for an EAN, if any.
pub async fn find_by_ean(db: &PgPool, ean_id: &str) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM ingredients
        WHERE ean_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#
    ))
    .bind(ean_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Most-recently-inserted match for an exact name, if any.
pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM ingredients
        WHERE name = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#
    ))
    .bind(name)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// All exact-name matches, newest first, capped at 100.
pub async fn search_by_name(db: &PgPool, name: &str) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM ingredients
        WHERE name = $1
        ORDER BY created_at DESC
        LIMIT 100
        "#
    ))
    .bind(name)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM ingredients
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Result of `create`: either a fresh row or the row that already held the
/// EAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Inserted(Uuid),
    Existing(Uuid),
}

impl CreateOutcome {
    pub fn id(self) -> Uuid {
        match self {
            Self::Inserted(id) | Self::Existing(id) => id,
        }
    }
}

/// Create an ingredient. Idempotent on `ean_id`: if a row with the same EAN
/// already exists, its id is returned and nothing is inserted. The partial
/// unique index on `ean_id` backstops concurrent creators.
pub async fn create(db: &PgPool, new: &NewIngredient) -> anyhow::Result<CreateOutcome> {
    if let Some(ean_id) = &new.ean_id {
        if let Some(existing) = find_by_ean(db, ean_id).await? {
            debug!(%ean_id, id = %existing.id, "ingredient already exists for EAN");
            return Ok(CreateOutcome::Existing(existing.id));
        }
    }

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO ingredients (name, calories, fat, protein, carbohydrates, unit, quantity, ean_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&new.name)
    .bind(new.calories)
    .bind(new.fat)
    .bind(new.protein)
    .bind(new.carbohydrates)
    .bind(new.unit.as_str())
    .bind(new.quantity)
    .bind(&new.ean_id)
    .fetch_one(db)
    .await?;
    Ok(CreateOutcome::Inserted(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::dto::{IngredientUnit, NewIngredient};

    fn oats(ean_id: Option<&str>) -> NewIngredient {
        NewIngredient {
            name: "oats".into(),
            calories: 389.0,
            fat: 6.9,
            protein: 16.9,
            carbohydrates: 66.3,
            unit: IngredientUnit::G,
            quantity: 100.0,
            ean_id: ean_id.map(Into::into),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_is_idempotent_on_ean(pool: PgPool) {
        let first = create(&pool, &oats(Some("4000417025005"))).await.unwrap();
        let replay = create(&pool, &oats(Some("4000417025005"))).await.unwrap();

        assert!(matches!(first, CreateOutcome::Inserted(_)));
        assert_eq!(replay, CreateOutcome::Existing(first.id()));
        assert_eq!(search_by_name(&pool, "oats").await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn creates_without_ean_always_insert(pool: PgPool) {
        let first = create(&pool, &oats(None)).await.unwrap();
        let second = create(&pool, &oats(None)).await.unwrap();

        assert!(matches!(second, CreateOutcome::Inserted(_)));
        assert_ne!(first.id(), second.id());
        assert_eq!(search_by_name(&pool, "oats").await.unwrap().len(), 2);
    }
}
