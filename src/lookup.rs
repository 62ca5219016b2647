use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("food database returned status {0}")]
    Status(u16),
    #[error("food database request failed: {0}")]
    Request(String),
}

#[async_trait]
pub trait FoodLookup: Send + Sync {
    /// Fetch the raw product record for an EAN/product id.
    async fn product(&self, id: &str) -> Result<Value, LookupError>;
}

/// OpenFoodFacts client.
#[derive(Debug)]
pub struct OpenFoodFactsClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl FoodLookup for OpenFoodFactsClient {
    #[instrument(skip(self))]
    async fn product(&self, id: &str) -> Result<Value, LookupError> {
        let url = format!(
            "{}/api/v0/product/{}.json",
            self.base_url.trim_end_matches('/'),
            id
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))
    }
}
