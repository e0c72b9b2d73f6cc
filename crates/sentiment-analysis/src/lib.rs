use analysis_core::stats::{mean, round_to};
use analysis_core::{market_terms, Classification, IndexInfo, NewsArticle, SentimentClassifier, SentimentLabel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod lexicon;
pub use lexicon::LexiconClassifier;
use lexicon::LEXICON_BACKEND;

/// Only the first two search queries per index are sent to the news provider.
pub const MAX_INDEX_QUERIES: usize = 2;

/// Sentiment of a single headline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewsSentiment {
    pub headline: String,
    pub source: Option<String>,
    pub published_at: Option<String>,
    pub url: Option<String>,
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    /// +confidence, -confidence or 0 depending on the label
    pub score: f64,
}

impl NewsSentiment {
    pub fn new(article: &NewsArticle, classification: Classification) -> Self {
        Self {
            headline: article.title.clone(),
            source: article.source.clone(),
            published_at: article.published_at.clone(),
            url: article.url.clone(),
            sentiment: classification.label,
            confidence: round_to(classification.confidence, 4),
            score: round_to(classification.score(), 4),
        }
    }
}

/// Averaged sentiment over a set of headlines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SentimentAggregate {
    pub score: f64,
    pub label: SentimentLabel,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    /// Backend that labeled the articles
    pub backend: String,
    pub articles: Vec<NewsSentiment>,
}

impl Default for SentimentAggregate {
    fn default() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            positive_count: 0,
            negative_count: 0,
            neutral_count: 0,
            backend: LEXICON_BACKEND.to_string(),
            articles: Vec::new(),
        }
    }
}

impl SentimentAggregate {
    /// Mean of the article scores. An empty set is the neutral default.
    pub fn from_articles(articles: Vec<NewsSentiment>, backend: &str) -> Self {
        if articles.is_empty() {
            return Self {
                backend: backend.to_string(),
                ..Self::default()
            };
        }

        let scores: Vec<f64> = articles.iter().map(|a| a.score).collect();
        let score = mean(&scores);
        let count = |label: SentimentLabel| articles.iter().filter(|a| a.sentiment == label).count();

        Self {
            score: round_to(score, 4),
            label: SentimentLabel::from_score(score),
            positive_count: count(SentimentLabel::Positive),
            negative_count: count(SentimentLabel::Negative),
            neutral_count: count(SentimentLabel::Neutral),
            backend: backend.to_string(),
            articles,
        }
    }

    pub fn total_articles(&self) -> usize {
        self.articles.len()
    }
}

/// News search queries for an index: its display name followed by up to two
/// market terms, capped at [`MAX_INDEX_QUERIES`].
pub fn index_queries(info: &IndexInfo) -> Vec<String> {
    std::iter::once(info.name.clone())
        .chain(market_terms(&info.id).iter().take(2).map(|t| t.to_string()))
        .take(MAX_INDEX_QUERIES)
        .collect()
}

/// Scores headlines with the primary model, falling back to the word list
/// when the model errors.
pub struct SentimentAnalysisEngine {
    classifier: Option<Arc<dyn SentimentClassifier>>,
    fallback: LexiconClassifier,
}

impl SentimentAnalysisEngine {
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
            fallback: LexiconClassifier::new(),
        }
    }

    /// Engine backed by the FinBERT inference service.
    pub fn with_finbert(config: &ml_client::MLConfig) -> Self {
        Self::new(Arc::new(ml_client::FinBertClassifier::new(config)))
    }

    /// Engine that only uses the word list.
    pub fn lexicon_only() -> Self {
        Self {
            classifier: None,
            fallback: LexiconClassifier::new(),
        }
    }

    /// Configured primary backend, regardless of whether it is reachable.
    pub fn backend_name(&self) -> &'static str {
        self.classifier
            .as_ref()
            .map(|c| c.backend_name())
            .unwrap_or_else(|| self.fallback.backend_name())
    }

    /// Backend that would score the next batch: the primary model when it
    /// answers its health check, the word list otherwise.
    pub async fn active_backend(&self) -> &'static str {
        if let Some(classifier) = &self.classifier {
            if classifier.is_available().await {
                return classifier.backend_name();
            }
        }
        self.fallback.backend_name()
    }

    /// Classify texts in one batch, returning the labels and the backend that
    /// produced them. Never fails.
    pub async fn classify(&self, texts: &[String]) -> (Vec<Classification>, &'static str) {
        if texts.is_empty() {
            return (Vec::new(), self.backend_name());
        }

        if let Some(classifier) = &self.classifier {
            match classifier.classify(texts).await {
                Ok(results) if results.len() == texts.len() => return (results, classifier.backend_name()),
                Ok(results) => {
                    tracing::warn!(
                        "{} returned {} results for {} texts, using word list",
                        classifier.backend_name(),
                        results.len(),
                        texts.len()
                    );
                }
                Err(e) => {
                    tracing::debug!("{} unavailable, falling back to word list: {}", classifier.backend_name(), e);
                }
            }
        }

        let results: Vec<Classification> = texts.iter().map(|t| self.fallback.classify_text(t)).collect();
        (results, self.fallback.backend_name())
    }

    /// Score each article headline and aggregate the results.
    pub async fn analyze_articles(&self, articles: &[NewsArticle]) -> SentimentAggregate {
        let articles: Vec<&NewsArticle> = articles.iter().filter(|a| !a.title.trim().is_empty()).collect();
        let titles: Vec<String> = articles.iter().map(|a| a.title.clone()).collect();
        let (classifications, backend) = self.classify(&titles).await;

        let results = articles
            .iter()
            .zip(classifications)
            .map(|(article, c)| NewsSentiment::new(article, c))
            .collect();

        SentimentAggregate::from_articles(results, backend)
    }
}
