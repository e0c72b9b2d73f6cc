use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{MLError, MLResult};

/// One FinBERT prediction. Class probabilities are optional in the service reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentPrediction {
    pub label: String,
    pub confidence: f64,
    #[serde(default)]
    pub positive: Option<f64>,
    #[serde(default)]
    pub negative: Option<f64>,
    #[serde(default)]
    pub neutral: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub predictions: Vec<SentimentPrediction>,
    #[serde(default)]
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
struct SentimentRequest<'a> {
    texts: &'a [String],
    model: &'a str,
}

const MODEL_NAME: &str = "ProsusAI/finbert";

#[derive(Clone)]
pub struct SentimentClient {
    client: reqwest::Client,
    base_url: String,
}

impl SentimentClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Predict sentiment for a batch of texts
    pub async fn predict(&self, texts: &[String]) -> MLResult<SentimentResponse> {
        let request = SentimentRequest {
            texts,
            model: MODEL_NAME,
        };

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                return Err(MLError::ModelNotLoaded);
            }
            return Err(MLError::ServiceUnavailable(format!("Status: {}", status)));
        }

        let result = response.json::<SentimentResponse>().await?;

        if result.predictions.len() != texts.len() {
            return Err(MLError::InvalidResponse(format!(
                "expected {} predictions, got {}",
                texts.len(),
                result.predictions.len()
            )));
        }

        Ok(result)
    }

    /// Check service health
    pub async fn health(&self) -> MLResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_without_probabilities() {
        let json = r#"{"predictions":[{"label":"positive","confidence":0.93}]}"#;
        let parsed: SentimentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.predictions[0].label, "positive");
        assert!(parsed.predictions[0].positive.is_none());
        assert_eq!(parsed.processing_time_ms, 0.0);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SentimentClient::new("http://localhost:8001/".to_string(), Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8001");
    }

    #[tokio::test]
    async fn test_unreachable_service_errors() {
        let client = SentimentClient::new("http://127.0.0.1:9".to_string(), Duration::from_secs(2));
        let result = client.predict(&["Stocks rally".to_string()]).await;
        assert!(matches!(result, Err(MLError::RequestFailed(_))));
    }
}
