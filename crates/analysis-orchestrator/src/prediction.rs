use analysis_core::stats::round_to;
use analysis_core::{Direction, IndexDataPoint, SentimentLabel};
use chrono::{DateTime, Utc};
use sentiment_analysis::SentimentAggregate;
use serde::{Deserialize, Serialize};
use technical_analysis::TechnicalIndicators;

use crate::blend::{Blend, ForecastPoint};

/// Points of recent history echoed back with a prediction.
pub const HISTORY_TAIL: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TechnicalFactors {
    pub trend: f64,
    pub momentum: f64,
    pub rsi: f64,
    /// Annualized volatility in percent
    pub volatility: f64,
    pub sma_5: Option<f64>,
    pub sma_20: Option<f64>,
    pub signal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SentimentFactors {
    pub score: f64,
    pub label: SentimentLabel,
    pub positive_articles: usize,
    pub negative_articles: usize,
    pub neutral_articles: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PredictionFactors {
    pub technical: TechnicalFactors,
    pub sentiment: SentimentFactors,
    pub combined_signal: f64,
}

/// Directional forecast for one index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PredictionResult {
    pub index_id: String,
    pub name: String,
    pub current_price: Option<f64>,
    pub prediction_days: u32,
    pub overall_sentiment: SentimentLabel,
    pub sentiment_score: f64,
    pub predicted_direction: Direction,
    pub predicted_change_percent: f64,
    pub confidence: f64,
    /// False when market data could not be fetched and defaults were used
    pub data_available: bool,
    pub historical_data: Vec<IndexDataPoint>,
    pub predictions: Vec<ForecastPoint>,
    pub factors: PredictionFactors,
    pub generated_at: DateTime<Utc>,
}

impl PredictionFactors {
    pub(crate) fn new(technicals: &TechnicalIndicators, sentiment: &SentimentAggregate, blend: &Blend) -> Self {
        Self {
            technical: TechnicalFactors {
                trend: round_to(technicals.trend, 4),
                momentum: round_to(technicals.momentum, 4),
                rsi: round_to(technicals.rsi, 2),
                volatility: round_to(blend.volatility * 100.0, 2),
                sma_5: technicals.sma_5.map(|v| round_to(v, 2)),
                sma_20: technicals.sma_20.map(|v| round_to(v, 2)),
                signal: round_to(blend.technical_signal, 4),
            },
            sentiment: SentimentFactors {
                score: sentiment.score,
                label: sentiment.label,
                positive_articles: sentiment.positive_count,
                negative_articles: sentiment.negative_count,
                neutral_articles: sentiment.neutral_count,
            },
            combined_signal: round_to(blend.combined_signal, 4),
        }
    }
}

/// Articles scored for a free-text symbol or query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SymbolSentiment {
    pub symbol: String,
    pub total_articles: usize,
    pub overall_sentiment: SentimentLabel,
    pub average_score: f64,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub backend: String,
    pub results: Vec<sentiment_analysis::NewsSentiment>,
}

impl SymbolSentiment {
    pub(crate) fn new(symbol: &str, aggregate: SentimentAggregate) -> Self {
        Self {
            symbol: symbol.to_string(),
            total_articles: aggregate.total_articles(),
            overall_sentiment: aggregate.label,
            average_score: aggregate.score,
            positive_count: aggregate.positive_count,
            negative_count: aggregate.negative_count,
            neutral_count: aggregate.neutral_count,
            backend: aggregate.backend,
            results: aggregate.articles,
        }
    }
}
