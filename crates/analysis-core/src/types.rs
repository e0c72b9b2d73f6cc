use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Basic index information from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IndexInfo {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub country: String,
}

/// Real-time quote for an index. Prices are absent when the fetch failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IndexQuote {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub country: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<u64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl IndexQuote {
    /// Quote with every market field empty, used when the provider fails.
    pub fn unavailable(info: &IndexInfo) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
            symbol: info.symbol.clone(),
            country: info.country.clone(),
            price: None,
            change: None,
            change_percent: None,
            previous_close: None,
            volume: None,
            day_high: None,
            day_low: None,
            fifty_two_week_high: None,
            fifty_two_week_low: None,
            timestamp: Utc::now(),
        }
    }
}

/// Historical price point
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IndexDataPoint {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub change_percent: Option<f64>,
}

/// Historical data for an index over a period/interval
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IndexHistory {
    pub index_id: String,
    pub name: String,
    pub symbol: String,
    pub country: String,
    pub period: String,
    pub interval: String,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub data: Vec<IndexDataPoint>,
}

impl IndexHistory {
    pub fn closes(&self) -> Vec<f64> {
        self.data.iter().map(|d| d.close).collect()
    }
}

/// Detailed summary for an index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IndexSummary {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub country: String,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub avg_volume: Option<u64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub fifty_day_avg: Option<f64>,
    pub two_hundred_day_avg: Option<f64>,
    /// Technical outlook blended with neutral sentiment
    pub outlook: Direction,
}

/// News article as returned by the news provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewsArticle {
    pub title: String,
    pub source: Option<String>,
    pub published_at: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// Financial sentiment class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Parse a model label ("Positive", "NEGATIVE", ...). Unknown labels are neutral.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }

    /// Label for an aggregate score in [-1, 1] using a +/-0.1 dead zone.
    pub fn from_score(score: f64) -> Self {
        if score > 0.1 {
            SentimentLabel::Positive
        } else if score < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// Output of a sentiment classifier for one text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: SentimentLabel,
    /// Model confidence in the label, 0.0 to 1.0
    pub confidence: f64,
}

impl Classification {
    /// Signed score: +confidence for positive, -confidence for negative, 0 for neutral.
    pub fn score(&self) -> f64 {
        match self.label {
            SentimentLabel::Positive => self.confidence,
            SentimentLabel::Negative => -self.confidence,
            SentimentLabel::Neutral => 0.0,
        }
    }
}

/// Predicted market direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// Map a signed signal to a direction; |signal| <= threshold is neutral.
    pub fn from_signal(signal: f64, threshold: f64) -> Self {
        if signal > threshold {
            Direction::Bullish
        } else if signal < -threshold {
            Direction::Bearish
        } else {
            Direction::Neutral
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bullish" => Some(Direction::Bullish),
            "bearish" => Some(Direction::Bearish),
            "neutral" => Some(Direction::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
            Direction::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse() {
        assert_eq!(SentimentLabel::parse("Positive"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::parse("NEGATIVE"), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::parse("mixed"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_from_score_dead_zone() {
        assert_eq!(SentimentLabel::from_score(0.11), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.2), SentimentLabel::Negative);
    }

    #[test]
    fn test_classification_score() {
        let pos = Classification { label: SentimentLabel::Positive, confidence: 0.9 };
        let neg = Classification { label: SentimentLabel::Negative, confidence: 0.8 };
        let neu = Classification { label: SentimentLabel::Neutral, confidence: 0.7 };
        assert_eq!(pos.score(), 0.9);
        assert_eq!(neg.score(), -0.8);
        assert_eq!(neu.score(), 0.0);
    }

    #[test]
    fn test_direction_from_signal() {
        assert_eq!(Direction::from_signal(0.3, 0.1), Direction::Bullish);
        assert_eq!(Direction::from_signal(-0.3, 0.1), Direction::Bearish);
        assert_eq!(Direction::from_signal(0.05, 0.1), Direction::Neutral);
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Bullish).unwrap();
        assert_eq!(json, "\"bullish\"");
        assert_eq!(Direction::parse("BEARISH"), Some(Direction::Bearish));
    }
}
