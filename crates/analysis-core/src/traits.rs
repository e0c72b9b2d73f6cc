use async_trait::async_trait;
use crate::{AnalysisError, Classification, IndexHistory, IndexInfo, IndexQuote, NewsArticle};

/// Source of index prices (Yahoo Finance in production)
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_history(
        &self,
        index: &IndexInfo,
        period: &str,
        interval: &str,
    ) -> Result<IndexHistory, AnalysisError>;

    async fn fetch_quote(&self, index: &IndexInfo) -> Result<IndexQuote, AnalysisError>;
}

/// Source of news articles. Implementations degrade to mock data instead of failing.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_news(&self, query: &str, page_size: u32) -> Vec<NewsArticle>;
}

/// Sentiment model that labels a batch of texts, one classification per input.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, texts: &[String]) -> Result<Vec<Classification>, AnalysisError>;

    fn backend_name(&self) -> &'static str;

    /// Whether the backend can currently take requests. Local models are always available.
    async fn is_available(&self) -> bool {
        true
    }
}
