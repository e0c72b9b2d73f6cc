use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// One stored sentiment analysis, as shown in a trend
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SentimentTrendPoint {
    pub date: String,
    pub sentiment: String,
    pub score: f64,
    pub article_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SentimentTrend {
    pub index_id: String,
    pub days: i64,
    pub total_analyses: usize,
    pub average_score: f64,
    pub current_sentiment: Option<String>,
    pub data: Vec<SentimentTrendPoint>,
}

/// A single forecast day to be logged
#[derive(Debug, Clone)]
pub struct PredictionLogEntry {
    pub index_id: String,
    pub prediction_date: String,
    pub target_date: String,
    pub prediction_days: i64,
    pub current_price: Option<f64>,
    pub predicted_price: f64,
    pub predicted_direction: String,
    pub predicted_change_percent: f64,
    pub confidence: f64,
    pub technical_factors: Option<String>,
    pub sentiment_factors: Option<String>,
    pub combined_signal: f64,
}

/// Logged prediction with its outcome, when evaluated
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PredictionRecord {
    pub prediction_date: String,
    pub target_date: String,
    pub predicted_price: Option<f64>,
    pub actual_price: Option<f64>,
    pub predicted_direction: String,
    pub actual_direction: Option<String>,
    pub confidence: Option<f64>,
    pub was_correct: Option<bool>,
    pub accuracy_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AccuracyStats {
    pub total_predictions: i64,
    pub correct_predictions: i64,
    /// Percent of evaluated predictions whose direction was right
    pub direction_accuracy: Option<f64>,
    /// Mean accuracy score in percent
    pub price_accuracy: Option<f64>,
    pub last_evaluated: Option<String>,
}

impl AccuracyStats {
    pub fn empty() -> Self {
        Self {
            total_predictions: 0,
            correct_predictions: 0,
            direction_accuracy: None,
            price_accuracy: None,
            last_evaluated: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OverallStats {
    pub total_predictions: i64,
    pub correct_predictions: i64,
    pub direction_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OverallAccuracy {
    pub overall: OverallStats,
    /// Only indices with at least one evaluated prediction
    pub by_index: BTreeMap<String, AccuracyStats>,
}

/// Result of checking one prediction against the realized close
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub actual_change_percent: f64,
    pub actual_direction: String,
    pub was_correct: bool,
    pub accuracy_score: Option<f64>,
}
