use analysis_core::stats::{mean, round_to};
use analysis_core::{
    all_indices, find_index, is_valid_interval, is_valid_period, AnalysisError, Direction,
    IndexHistory, IndexInfo, IndexQuote, IndexSummary, MarketDataSource, NewsSource,
};
use chrono::Utc;
use futures_util::future::join_all;
use market_data::{NewsApiClient, YahooClient};
use sentiment_analysis::{index_queries, SentimentAggregate, SentimentAnalysisEngine};
use std::sync::Arc;
use std::time::Duration;
use technical_analysis::{calculate_technical_indicators, latest_sma, TechnicalIndicators};

pub mod blend;
pub mod prediction;


pub use blend::{Blend, ForecastPoint, MAX_HORIZON_DAYS, MIN_HORIZON_DAYS};
pub use prediction::{PredictionFactors, PredictionResult, SentimentFactors, SymbolSentiment, TechnicalFactors};

/// Window of daily closes the forecast is computed from.
const PREDICTION_PERIOD: &str = "3mo";
const SUMMARY_PERIOD: &str = "1y";
const DAILY: &str = "1d";
/// Articles requested per news query.
const NEWS_PAGE_SIZE: u32 = 10;
/// Roughly three months of trading days, for average volume.
const AVG_VOLUME_WINDOW: usize = 63;

/// Settings for the live provider stack
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub news_api_key: Option<String>,
    pub market_rate_limit: usize,
    pub market_timeout: Duration,
    pub news_timeout: Duration,
    pub ml: ml_client::MLConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            news_api_key: None,
            market_rate_limit: 120,
            market_timeout: Duration::from_secs(15),
            news_timeout: Duration::from_secs(10),
            ml: ml_client::MLConfig::default(),
        }
    }
}

pub struct AnalysisOrchestrator {
    market: Arc<dyn MarketDataSource>,
    news: Arc<dyn NewsSource>,
    sentiment_engine: SentimentAnalysisEngine,
}

impl AnalysisOrchestrator {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        news: Arc<dyn NewsSource>,
        sentiment_engine: SentimentAnalysisEngine,
    ) -> Self {
        Self {
            market,
            news,
            sentiment_engine,
        }
    }

    /// Yahoo Finance prices, NewsAPI headlines and FinBERT scoring.
    pub fn live(config: &OrchestratorConfig) -> Self {
        let market = YahooClient::new(config.market_rate_limit, config.market_timeout);
        let news = NewsApiClient::new(config.news_api_key.clone(), config.news_timeout);
        Self::new(
            Arc::new(market),
            Arc::new(news),
            SentimentAnalysisEngine::with_finbert(&config.ml),
        )
    }

    /// Configured sentiment backend.
    pub fn sentiment_backend(&self) -> &'static str {
        self.sentiment_engine.backend_name()
    }

    /// Sentiment backend that is scoring right now, after a health check.
    pub async fn active_sentiment_backend(&self) -> &'static str {
        self.sentiment_engine.active_backend().await
    }

    fn resolve(index_id: &str) -> Result<IndexInfo, AnalysisError> {
        find_index(index_id).ok_or_else(|| AnalysisError::UnknownIndex(index_id.to_string()))
    }

    /// Price history for a catalog index. Period and interval must be supported values.
    pub async fn index_history(
        &self,
        index_id: &str,
        period: &str,
        interval: &str,
    ) -> Result<IndexHistory, AnalysisError> {
        let info = Self::resolve(index_id)?;
        if !is_valid_period(period) {
            return Err(AnalysisError::InvalidData(format!("Invalid period '{}'", period)));
        }
        if !is_valid_interval(interval) {
            return Err(AnalysisError::InvalidData(format!("Invalid interval '{}'", interval)));
        }
        self.market.fetch_history(&info, period, interval).await
    }

    /// Quotes for every catalog index, fetched concurrently. Failed fetches
    /// come back with empty prices.
    pub async fn fetch_all_quotes(&self) -> Vec<IndexQuote> {
        let indices = all_indices();
        let futs = indices.iter().map(|info| async move {
            match self.market.fetch_quote(info).await {
                Ok(quote) => quote,
                Err(e) => {
                    tracing::warn!("Quote fetch failed for {}: {}", info.id, e);
                    IndexQuote::unavailable(info)
                }
            }
        });
        join_all(futs).await
    }

    /// Summary statistics over a year of daily prices plus a technical outlook.
    pub async fn index_summary(&self, index_id: &str) -> Result<IndexSummary, AnalysisError> {
        let info = Self::resolve(index_id)?;
        let history = match self.market.fetch_history(&info, SUMMARY_PERIOD, DAILY).await {
            Ok(history) => Some(history),
            Err(e) => {
                tracing::warn!("Summary data unavailable for {}: {}", info.id, e);
                None
            }
        };
        Ok(build_summary(&info, history.as_ref()))
    }

    /// Headline sentiment for a free-text symbol, limited to `limit` articles.
    pub async fn symbol_sentiment(&self, symbol: &str, limit: usize) -> SymbolSentiment {
        let page_size = (limit as u32).max(NEWS_PAGE_SIZE);
        let mut articles = self.news.fetch_news(symbol, page_size).await;
        articles.truncate(limit);
        let aggregate = self.sentiment_engine.analyze_articles(&articles).await;
        SymbolSentiment::new(symbol, aggregate)
    }

    /// Aggregate news sentiment for an index. Unknown ids give the neutral default.
    pub async fn index_sentiment(&self, index_id: &str) -> SentimentAggregate {
        let Some(info) = find_index(index_id) else {
            return SentimentAggregate::default();
        };

        let queries = index_queries(&info);
        let batches = join_all(queries.iter().map(|q| self.news.fetch_news(q, NEWS_PAGE_SIZE))).await;
        let articles: Vec<_> = batches.into_iter().flatten().collect();

        tracing::debug!("Scoring {} articles for {} ({} queries)", articles.len(), info.id, queries.len());
        self.sentiment_engine.analyze_articles(&articles).await
    }

    /// Blend technicals from three months of daily closes with news sentiment.
    ///
    /// A market-data failure does not fail the prediction: default technicals
    /// are used and `data_available` is false.
    pub async fn generate_prediction(&self, index_id: &str, days: u32) -> Result<PredictionResult, AnalysisError> {
        let info = Self::resolve(index_id)?;
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&days) {
            return Err(AnalysisError::InvalidData(format!(
                "days must be between {} and {}",
                MIN_HORIZON_DAYS, MAX_HORIZON_DAYS
            )));
        }

        let (history_result, sentiment) = tokio::join!(
            self.market.fetch_history(&info, PREDICTION_PERIOD, DAILY),
            self.index_sentiment(&info.id),
        );

        let history = match history_result {
            Ok(history) => Some(history),
            Err(e) => {
                tracing::warn!("Market data unavailable for {}, predicting from defaults: {}", info.id, e);
                None
            }
        };

        let technicals = history
            .as_ref()
            .map(|h| calculate_technical_indicators(&h.closes()))
            .unwrap_or_default();
        let current_price = history.as_ref().and_then(|h| h.current_price);

        let blend = blend::blend(&technicals, sentiment.score, current_price, days, Utc::now().date_naive());

        tracing::info!(
            "Prediction for {} over {}d: {} ({:+.2}%, confidence {:.2})",
            info.id,
            days,
            blend.direction,
            blend.predicted_change_percent,
            blend.confidence
        );

        let historical_data = history
            .map(|h| {
                let skip = h.data.len().saturating_sub(prediction::HISTORY_TAIL);
                h.data.into_iter().skip(skip).collect()
            })
            .unwrap_or_default();

        Ok(PredictionResult {
            index_id: info.id.clone(),
            name: info.name.clone(),
            current_price,
            prediction_days: days,
            overall_sentiment: sentiment.label,
            sentiment_score: sentiment.score,
            predicted_direction: blend.direction,
            predicted_change_percent: blend.predicted_change_percent,
            confidence: blend.confidence,
            data_available: current_price.is_some(),
            historical_data,
            factors: PredictionFactors::new(&technicals, &sentiment, &blend),
            predictions: blend.path,
            generated_at: Utc::now(),
        })
    }
}

/// Technical outlook with neutral sentiment.
pub fn technical_outlook(technicals: &TechnicalIndicators) -> Direction {
    Direction::from_signal(blend::combined_signal(technicals.signal(), 0.0), blend::DIRECTION_THRESHOLD)
}

fn build_summary(info: &IndexInfo, history: Option<&IndexHistory>) -> IndexSummary {
    let mut summary = IndexSummary {
        id: info.id.clone(),
        name: info.name.clone(),
        symbol: info.symbol.clone(),
        country: info.country.clone(),
        current_price: None,
        previous_close: None,
        open: None,
        day_high: None,
        day_low: None,
        volume: None,
        avg_volume: None,
        fifty_two_week_high: None,
        fifty_two_week_low: None,
        fifty_day_avg: None,
        two_hundred_day_avg: None,
        outlook: Direction::Neutral,
    };

    let Some(history) = history else {
        return summary;
    };
    let Some(last) = history.data.last() else {
        return summary;
    };

    let closes = history.closes();
    let recent_volumes: Vec<f64> = history
        .data
        .iter()
        .rev()
        .take(AVG_VOLUME_WINDOW)
        .map(|d| d.volume as f64)
        .collect();

    summary.current_price = history.current_price;
    summary.previous_close = history.previous_close;
    summary.open = Some(last.open);
    summary.day_high = Some(last.high);
    summary.day_low = Some(last.low);
    summary.volume = Some(last.volume);
    summary.avg_volume = Some(mean(&recent_volumes).round() as u64);
    summary.fifty_two_week_high = history.data.iter().map(|d| d.high).reduce(f64::max);
    summary.fifty_two_week_low = history.data.iter().map(|d| d.low).reduce(f64::min);
    summary.fifty_day_avg = latest_sma(&closes, 50).map(|v| round_to(v, 2));
    summary.two_hundred_day_avg = latest_sma(&closes, 200).map(|v| round_to(v, 2));
    summary.outlook = technical_outlook(&calculate_technical_indicators(&closes));
    summary
}
