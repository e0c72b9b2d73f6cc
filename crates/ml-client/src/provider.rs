use analysis_core::{AnalysisError, Classification, SentimentClassifier, SentimentLabel};
use async_trait::async_trait;

use crate::{MLConfig, SentimentClient};

/// FinBERT classifier backed by the HTTP inference service.
pub struct FinBertClassifier {
    client: SentimentClient,
}

impl FinBertClassifier {
    pub fn new(config: &MLConfig) -> Self {
        Self {
            client: SentimentClient::new(config.sentiment_url.clone(), config.timeout),
        }
    }
}

#[async_trait]
impl SentimentClassifier for FinBertClassifier {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>, AnalysisError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .predict(texts)
            .await
            .map_err(|e| AnalysisError::ModelError(e.to_string()))?;

        tracing::debug!(
            "FinBERT scored {} texts in {:.0}ms",
            response.predictions.len(),
            response.processing_time_ms
        );

        Ok(response
            .predictions
            .iter()
            .map(|p| Classification {
                label: SentimentLabel::parse(&p.label),
                confidence: p.confidence.clamp(0.0, 1.0),
            })
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "finbert"
    }

    async fn is_available(&self) -> bool {
        match self.client.health().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::debug!("FinBERT health check failed: {}", e);
                false
            }
        }
    }
}
