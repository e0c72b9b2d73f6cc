pub mod error;
pub mod provider;
pub mod sentiment;

pub use error::{MLError, MLResult};
pub use provider::FinBertClassifier;
pub use sentiment::SentimentClient;

use std::time::Duration;

/// Configuration for the FinBERT inference service
#[derive(Debug, Clone)]
pub struct MLConfig {
    pub sentiment_url: String,
    pub timeout: Duration,
}

impl Default for MLConfig {
    fn default() -> Self {
        Self {
            sentiment_url: std::env::var("ML_SENTIMENT_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            timeout: Duration::from_secs(10),
        }
    }
}
