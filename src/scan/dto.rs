use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub id: Option<String>,
}

/// Ingredient-shaped candidate produced from a barcode, per 100 g. The
/// caller confirms it explicitly before it is persisted as an ingredient;
/// the scan flow itself never writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(rename = "productName")]
    pub product_name: String,
    pub calories: f64,
    pub fat: f64,
    pub protein: f64,
    pub carbohydrates: f64,
}
