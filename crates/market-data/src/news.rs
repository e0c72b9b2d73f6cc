use analysis_core::{AnalysisError, NewsArticle, NewsSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://newsapi.org";

const CACHE_TTL_SECS: i64 = 300; // 5 minutes

const PLACEHOLDER_KEY: &str = "your_newsapi_key_here";

const MOCK_WORDS: &[&str] = &[
    "rally", "surge", "gains", "optimism", "growth", "decline", "fall", "concerns",
];

const MOCK_SOURCES: &[&str] = &[
    "Reuters", "Bloomberg", "CNBC", "Financial Times", "WSJ", "MarketWatch", "Yahoo Finance",
    "Economic Times",
];

struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// NewsAPI client. Falls back to generated headlines when no key is
/// configured or the API call fails.
pub struct NewsApiClient {
    api_key: Option<String>,
    client: Client,
    base_url: String,
    news_cache: DashMap<String, CacheEntry<Vec<NewsArticle>>>,
}

impl NewsApiClient {
    pub fn new(api_key: Option<String>, timeout: std::time::Duration) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_KEY);

        if api_key.is_none() {
            tracing::warn!("NEWS_API_KEY not configured, news sentiment will use mock headlines");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            client,
            base_url: BASE_URL.to_string(),
            news_cache: DashMap::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cached articles for `key` if still inside the TTL. Expired entries are dropped.
    fn cached(&self, key: &str) -> Option<Vec<NewsArticle>> {
        let now = Utc::now();
        let fresh = |entry: &CacheEntry<Vec<NewsArticle>>| (now - entry.cached_at).num_seconds() < CACHE_TTL_SECS;

        if let Some(entry) = self.news_cache.get(key) {
            if fresh(entry.value()) {
                return Some(entry.data.clone());
            }
        }

        self.news_cache.remove_if(key, |_, entry| !fresh(entry));
        None
    }

    fn store(&self, key: String, articles: Vec<NewsArticle>) {
        let now = Utc::now();
        self.news_cache
            .retain(|_, entry| (now - entry.cached_at).num_seconds() < CACHE_TTL_SECS);
        self.news_cache.insert(key, CacheEntry {
            data: articles,
            cached_at: now,
        });
    }

    async fn get_everything(&self, api_key: &str, query: &str, page_size: u32) -> Result<Vec<NewsArticle>, AnalysisError> {
        let url = format!("{}/v2/everything", self.base_url);
        let page_size = page_size.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("sortBy", "publishedAt"),
                ("apiKey", api_key),
            ])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!("NewsAPI HTTP {}", response.status())));
        }

        let body: NewsApiResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(body
            .articles
            .into_iter()
            .filter_map(|a| {
                let title = a.title.filter(|t| !t.trim().is_empty())?;
                Some(NewsArticle {
                    title,
                    source: a.source.and_then(|s| s.name),
                    published_at: a.published_at,
                    url: a.url,
                    description: a.description,
                })
            })
            .collect())
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch_news(&self, query: &str, page_size: u32) -> Vec<NewsArticle> {
        let cache_key = format!("{}:{}", query, page_size);
        if let Some(articles) = self.cached(&cache_key) {
            return articles;
        }

        let Some(api_key) = self.api_key.as_deref() else {
            return mock_news(query);
        };

        match self.get_everything(api_key, query, page_size).await {
            Ok(articles) => {
                tracing::debug!("NewsAPI returned {} articles for '{}'", articles.len(), query);
                self.store(cache_key, articles.clone());
                articles
            }
            Err(e) => {
                tracing::warn!("Error fetching news for '{}': {}, using mock headlines", query, e);
                mock_news(query)
            }
        }
    }
}

/// Deterministic headlines for running without a NewsAPI key.
pub fn mock_news(query: &str) -> Vec<NewsArticle> {
    let base_time = Utc::now();

    MOCK_WORDS
        .iter()
        .enumerate()
        .map(|(i, word)| NewsArticle {
            title: format!("{} markets show {} amid global economic shifts", query, word),
            source: Some(MOCK_SOURCES[i % MOCK_SOURCES.len()].to_string()),
            published_at: Some((base_time - Duration::hours(i as i64 * 2)).to_rfc3339()),
            url: Some(format!("https://example.com/news/{}", i)),
            description: Some(format!("Analysis of {} performance showing {} patterns...", query, word)),
        })
        .collect()
}

// Response structures
#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_news_shape() {
        let articles = mock_news("S&P 500");
        assert_eq!(articles.len(), 8);
        assert_eq!(articles[0].title, "S&P 500 markets show rally amid global economic shifts");
        assert_eq!(articles[0].source.as_deref(), Some("Reuters"));
        assert_eq!(articles[7].source.as_deref(), Some("Economic Times"));
        assert_eq!(articles[3].url.as_deref(), Some("https://example.com/news/3"));
    }

    #[test]
    fn test_placeholder_key_is_ignored() {
        let client = NewsApiClient::new(Some(PLACEHOLDER_KEY.to_string()), std::time::Duration::from_secs(1));
        assert!(client.api_key.is_none());
        let client = NewsApiClient::new(Some("  ".to_string()), std::time::Duration::from_secs(1));
        assert!(client.api_key.is_none());
        let client = NewsApiClient::new(Some(" abc123 ".to_string()), std::time::Duration::from_secs(1));
        assert_eq!(client.api_key.as_deref(), Some("abc123"));
    }

    fn cached_article(title: &str) -> Vec<NewsArticle> {
        vec![NewsArticle {
            title: title.to_string(),
            source: Some("Reuters".to_string()),
            published_at: None,
            url: None,
            description: None,
        }]
    }

    #[tokio::test]
    async fn test_fresh_cache_entry_is_served() {
        let client = NewsApiClient::new(None, std::time::Duration::from_secs(1));
        client.news_cache.insert("DAX:10".to_string(), CacheEntry {
            data: cached_article("DAX closes higher"),
            cached_at: Utc::now() - Duration::seconds(CACHE_TTL_SECS - 10),
        });

        let articles = client.fetch_news("DAX", 10).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "DAX closes higher");
    }

    #[tokio::test]
    async fn test_expired_cache_entry_is_removed() {
        let client = NewsApiClient::new(None, std::time::Duration::from_secs(1));
        client.news_cache.insert("DAX:10".to_string(), CacheEntry {
            data: cached_article("DAX closes higher"),
            cached_at: Utc::now() - Duration::seconds(CACHE_TTL_SECS + 1),
        });

        let articles = client.fetch_news("DAX", 10).await;
        assert_eq!(articles.len(), 8);
        assert!(client.news_cache.get("DAX:10").is_none());
    }

    #[test]
    fn test_store_sweeps_expired_entries() {
        let client = NewsApiClient::new(None, std::time::Duration::from_secs(1));
        client.news_cache.insert("old query:10".to_string(), CacheEntry {
            data: cached_article("stale"),
            cached_at: Utc::now() - Duration::seconds(CACHE_TTL_SECS * 2),
        });

        client.store("FTSE 100:10".to_string(), cached_article("FTSE edges up"));
        assert_eq!(client.news_cache.len(), 1);
        assert!(client.news_cache.contains_key("FTSE 100:10"));
    }

    #[tokio::test]
    async fn test_fetch_without_key_returns_mock() {
        let client = NewsApiClient::new(None, std::time::Duration::from_secs(1));
        let articles = client.fetch_news("NIFTY 50", 10).await;
        assert_eq!(articles.len(), 8);
        assert!(articles.iter().all(|a| a.title.starts_with("NIFTY 50 markets show")));
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_mock() {
        // Nothing listens on port 9 locally, so the request fails fast
        let client = NewsApiClient::new(Some("key".to_string()), std::time::Duration::from_secs(2))
            .with_base_url("http://127.0.0.1:9");
        let articles = client.fetch_news("DAX", 10).await;
        assert_eq!(articles.len(), 8);
        assert!(client.news_cache.is_empty());
    }

    #[test]
    fn test_parse_newsapi_payload() {
        let json = r#"{"status":"ok","totalResults":2,"articles":[
            {"source":{"id":null,"name":"Reuters"},"title":"Stocks rally","description":"d","url":"https://x/1","publishedAt":"2024-05-01T10:00:00Z"},
            {"source":{"id":null,"name":"CNBC"},"title":null,"description":null,"url":null,"publishedAt":null}
        ]}"#;
        let parsed: NewsApiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.articles.len(), 2);
        assert_eq!(parsed.articles[0].published_at.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert!(parsed.articles[1].title.is_none());
    }
}
