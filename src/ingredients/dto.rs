use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reference unit the ingredient macros are reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientUnit {
    G,
    Ml,
}

impl IngredientUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::Ml => "ml",
        }
    }
}

/// Full ingredient fields as accepted by the REST create route and the
/// `addIngredient` tool. Macros are per `quantity` units (canonically 100).
#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub calories: f64,
    pub fat: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub unit: IngredientUnit,
    pub quantity: f64,
    #[serde(default)]
    pub ean_id: Option<String>,
}

impl NewIngredient {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must be non-empty".into());
        }
        if self.quantity <= 0.0 {
            return Err("quantity must be positive".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedIngredientResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_serde_roundtrip() {
        assert_eq!(serde_json::to_string(&IngredientUnit::G).unwrap(), r#""g""#);
        assert_eq!(
            serde_json::from_str::<IngredientUnit>(r#""ml""#).unwrap(),
            IngredientUnit::Ml
        );
        assert!(serde_json::from_str::<IngredientUnit>(r#""kg""#).is_err());
    }

    #[test]
    fn rejects_blank_name_and_zero_quantity() {
        let base = NewIngredient {
            name: "Oats".into(),
            calories: 389.0,
            fat: 6.9,
            protein: 16.9,
            carbohydrates: 66.3,
            unit: IngredientUnit::G,
            quantity: 100.0,
            ean_id: None,
        };
        assert!(base.validate().is_ok());

        let mut blank = base.clone();
        blank.name = "   ".into();
        assert!(blank.validate().is_err());

        let mut zero = base;
        zero.quantity = 0.0;
        assert!(zero.validate().is_err());
    }
}
