use analysis_orchestrator::OrchestratorConfig;
use ml_client::MLConfig;
use std::time::Duration;

/// Server settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub news_api_key: Option<String>,
    pub ml_sentiment_url: String,
    pub ml_timeout: Duration,
    /// Yahoo Finance requests per minute
    pub market_rate_limit: usize,
    pub market_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: "sqlite:sentilytics.db".to_string(),
            news_api_key: None,
            ml_sentiment_url: "http://localhost:8001".to_string(),
            ml_timeout: Duration::from_secs(10),
            market_rate_limit: 120,
            market_timeout: Duration::from_secs(15),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parsed = |key: &str| -> Option<u64> {
            let raw = var(key)?;
            match raw.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid {}={}", key, raw);
                    None
                }
            }
        };

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(defaults.port),
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            news_api_key: var("NEWS_API_KEY"),
            ml_sentiment_url: var("ML_SENTIMENT_URL").unwrap_or(defaults.ml_sentiment_url),
            ml_timeout: parsed("ML_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.ml_timeout),
            market_rate_limit: parsed("MARKET_DATA_RATE_LIMIT")
                .map(|v| v as usize)
                .filter(|&v| v > 0)
                .unwrap_or(defaults.market_rate_limit),
            market_timeout: parsed("MARKET_DATA_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.market_timeout),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            news_api_key: self.news_api_key.clone(),
            market_rate_limit: self.market_rate_limit,
            market_timeout: self.market_timeout,
            ml: MLConfig {
                sentiment_url: self.ml_sentiment_url.clone(),
                timeout: self.ml_timeout,
            },
            ..OrchestratorConfig::default()
        }
    }
}
