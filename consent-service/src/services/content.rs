use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;

use super::error::ServiceError;

/// Source of the content feed served to clients.
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    async fn feed(&self) -> Result<Value, ServiceError>;
}

/// A feed fixed at startup, either bundled or read from a JSON file.
pub struct StaticContentCatalog {
    feed: Value,
}

impl StaticContentCatalog {
    pub fn new(feed: Value) -> Self {
        Self { feed }
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await.map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!(
                "failed to read content feed {}: {}",
                path.display(),
                e
            ))
        })?;
        let feed = serde_json::from_slice(&raw).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!(
                "content feed {} is not valid JSON: {}",
                path.display(),
                e
            ))
        })?;
        tracing::info!(path = %path.display(), "Loaded content feed");
        Ok(Self { feed })
    }

    pub fn sample() -> Self {
        Self::new(sample_feed())
    }
}

#[async_trait]
impl ContentCatalog for StaticContentCatalog {
    async fn feed(&self) -> Result<Value, ServiceError> {
        Ok(self.feed.clone())
    }
}

pub fn sample_feed() -> Value {
    json!({
        "title": "Matchday",
        "odds": {"home": 1.85, "draw": 3.4, "away": 4.2},
        "bettingTips": ["Back the home side"],
        "depositButton": {"label": "Deposit now"},
        "items": [
            {
                "id": "preview-1",
                "type": "article",
                "headline": "Derby preview",
                "isGambling": false,
                "items": [
                    {"id": "stat-1", "type": "stat", "label": "Head to head", "odds": 2.1}
                ]
            },
            {
                "id": "promo-1",
                "type": "promotion",
                "headline": "Boosted odds for tonight",
                "isGambling": true
            },
            {
                "id": "predict-1",
                "type": "prediction",
                "headline": "Pick the winner",
                "isGambling": false,
                "recommendedWagers": [10, 25]
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_feed_contains_gambling_fields() {
        let feed = StaticContentCatalog::sample().feed().await.unwrap();
        assert!(feed.get("odds").is_some());
        assert_eq!(feed["items"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_feed_file_is_an_error() {
        let result = StaticContentCatalog::from_file("/nonexistent/feed.json").await;
        assert!(result.is_err());
    }
}
