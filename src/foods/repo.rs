use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ingredients::repo::{self as ingredients_repo, Ingredient};

use super::dto::{FoodUnit, NewLoggedFood};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoggedFood {
    pub id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub date: String,
    pub ingredient_id: Option<Uuid>,
    pub calories: Option<f64>,
    pub fat: Option<f64>,
    pub protein: Option<f64>,
    pub carbohydrates: Option<f64>,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, name, quantity, unit, date, ingredient_id, \
     calories, fat, protein, carbohydrates, created_at";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroSnapshot {
    pub calories: f64,
    pub fat: f64,
    pub protein: f64,
    pub carbohydrates: f64,
}

/// Macros for the logged amount, scaled from the ingredient's reference
/// quantity. None when the logged unit cannot be compared to the reference
/// unit (e.g. ounces against a millilitre-based ingredient).
pub fn scaled_snapshot(
    ingredient: &Ingredient,
    quantity: f64,
    unit: FoodUnit,
) -> Option<MacroSnapshot> {
    if ingredient.quantity <= 0.0 {
        return None;
    }
    let amount = match ingredient.unit.as_str() {
        "g" => unit.to_grams(quantity)?,
        "ml" if unit == FoodUnit::Ml => quantity,
        _ => return None,
    };
    let scale = amount / ingredient.quantity;
    Some(MacroSnapshot {
        calories: ingredient.calories * scale,
        fat: ingredient.fat * scale,
        protein: ingredient.protein * scale,
        carbohydrates: ingredient.carbohydrates * scale,
    })
}

/// Record one consumption event. The name is lowercased at write time; when
/// an ingredient is referenced, its macros are denormalized onto the row so
/// later ingredient edits never alter history. Rows are immutable once
/// created.
pub async fn create(db: &PgPool, new: &NewLoggedFood) -> anyhow::Result<LoggedFood> {
    let snapshot = match new.ingredient_id {
        Some(ingredient_id) => {
            let ingredient = ingredients_repo::find_by_id(db, ingredient_id)
                .await?
                .with_context(|| format!("ingredient {ingredient_id} not found"))?;
            scaled_snapshot(&ingredient, new.quantity, new.unit)
        }
        None => None,
    };

    let row = sqlx::query_as::<_, LoggedFood>(&format!(
        r#"
        INSERT INTO foods (name, quantity, unit, date, ingredient_id,
                           calories, fat, protein, carbohydrates)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(new.name.to_lowercase())
    .bind(new.quantity)
    .bind(new.unit.as_str())
    .bind(&new.date)
    .bind(new.ingredient_id)
    .bind(snapshot.map(|s| s.calories))
    .bind(snapshot.map(|s| s.fat))
    .bind(snapshot.map(|s| s.protein))
    .bind(snapshot.map(|s| s.carbohydrates))
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Inclusive date-range query, newest date first, capped at 100 rows.
/// Dates are ISO-8601 text, so lexicographic order matches calendar order.
pub async fn list_by_date_range(
    db: &PgPool,
    from: &str,
    to: &str,
) -> anyhow::Result<Vec<LoggedFood>> {
    let rows = sqlx::query_as::<_, LoggedFood>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM foods
        WHERE date >= $1 AND date <= $2
        ORDER BY date DESC
        LIMIT 100
        "#
    ))
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oats() -> Ingredient {
        Ingredient {
            id: Uuid::new_v4(),
            name: "oats".into(),
            calories: 389.0,
            fat: 6.9,
            protein: 16.9,
            carbohydrates: 66.3,
            unit: "g".into(),
            quantity: 100.0,
            ean_id: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn snapshot_scales_by_reference_quantity() {
        let snap = scaled_snapshot(&oats(), 50.0, FoodUnit::G).unwrap();
        assert!((snap.calories - 194.5).abs() < 1e-9);
        assert!((snap.protein - 8.45).abs() < 1e-9);
    }

    #[test]
    fn snapshot_converts_mass_units() {
        let snap = scaled_snapshot(&oats(), 1.0, FoodUnit::Lb).unwrap();
        assert!((snap.calories - 389.0 * 4.53592).abs() < 1e-6);
    }

    #[test]
    fn snapshot_refuses_mass_against_volume_reference() {
        let mut milk = oats();
        milk.unit = "ml".into();
        assert!(scaled_snapshot(&milk, 30.0, FoodUnit::Oz).is_none());
        assert!(scaled_snapshot(&milk, 250.0, FoodUnit::Ml).is_some());
    }

    #[test]
    fn snapshot_refuses_volume_against_mass_reference() {
        assert!(scaled_snapshot(&oats(), 250.0, FoodUnit::Ml).is_none());
    }

    #[test]
    fn snapshot_guards_zero_reference_quantity() {
        let mut bad = oats();
        bad.quantity = 0.0;
        assert!(scaled_snapshot(&bad, 100.0, FoodUnit::G).is_none());
    }

    fn logged(name: &str, date: &str) -> NewLoggedFood {
        NewLoggedFood {
            name: name.into(),
            quantity: 100.0,
            date: date.into(),
            unit: FoodUnit::G,
            ingredient_id: None,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn date_range_is_inclusive_and_newest_first(pool: PgPool) {
        for date in [
            "2025-01-01",
            "2025-01-02",
            "2025-01-03",
            "2025-01-04",
            "2025-01-05",
        ] {
            create(&pool, &logged("rice", date)).await.unwrap();
        }

        let rows = list_by_date_range(&pool, "2025-01-02", "2025-01-04")
            .await
            .unwrap();
        let dates: Vec<&str> = rows.iter().map(|row| row.date.as_str()).collect();
        assert_eq!(dates, ["2025-01-04", "2025-01-03", "2025-01-02"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn date_range_caps_at_one_hundred_rows(pool: PgPool) {
        for _ in 0..105 {
            create(&pool, &logged("rice", "2025-01-01")).await.unwrap();
        }

        let rows = list_by_date_range(&pool, "2025-01-01", "2025-01-01")
            .await
            .unwrap();
        assert_eq!(rows.len(), 100);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_snapshots_macros_and_lowercases_the_name(pool: PgPool) {
        use crate::ingredients::dto::{IngredientUnit, NewIngredient};

        let ingredient = ingredients_repo::create(
            &pool,
            &NewIngredient {
                name: "oats".into(),
                calories: 389.0,
                fat: 6.9,
                protein: 16.9,
                carbohydrates: 66.3,
                unit: IngredientUnit::G,
                quantity: 100.0,
                ean_id: None,
            },
        )
        .await
        .unwrap();

        let mut new = logged("Oats", "2025-01-01");
        new.quantity = 50.0;
        new.ingredient_id = Some(ingredient.id());

        let food = create(&pool, &new).await.unwrap();
        assert_eq!(food.name, "oats");
        assert!((food.calories.unwrap() - 194.5).abs() < 1e-9);
        assert!((food.protein.unwrap() - 8.45).abs() < 1e-9);
    }
}
