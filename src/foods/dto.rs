use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unit of one consumption event. Mass units plus millilitres for drinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodUnit {
    G,
    Lb,
    Oz,
    Ml,
}

impl FoodUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::G => "g",
            Self::Lb => "lb",
            Self::Oz => "oz",
            Self::Ml => "ml",
        }
    }

    /// Quantity in grams, when this is a mass unit.
    pub fn to_grams(self, quantity: f64) -> Option<f64> {
        match self {
            Self::G => Some(quantity),
            Self::Lb => Some(quantity * 453.592),
            Self::Oz => Some(quantity * 28.3495),
            Self::Ml => None,
        }
    }
}

/// A food consumption event to record. `date` is caller-supplied (the model
/// learns the current date from the time tools, never from the server).
#[derive(Debug, Clone, Deserialize)]
pub struct NewLoggedFood {
    pub name: String,
    pub quantity: f64,
    pub date: String,
    pub unit: FoodUnit,
    #[serde(default)]
    pub ingredient_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}
