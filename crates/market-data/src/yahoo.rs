use analysis_core::stats::{pct_change, round_to};
use analysis_core::{
    is_intraday, AnalysisError, IndexDataPoint, IndexHistory, IndexInfo, IndexQuote,
    MarketDataSource,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::rate_limit::RateLimiter;

const BASE_URL: &str = "https://query1.finance.yahoo.com";

// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl YahooClient {
    pub fn new(requests_per_minute: usize, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: BASE_URL.to_string(),
            rate_limiter: RateLimiter::per_minute(requests_per_minute),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request.try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self.client.execute(req_clone).await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 2u64.pow(attempt + 1);
            tracing::warn!("Yahoo 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(AnalysisError::ApiError("Rate limited by Yahoo Finance after 3 retries".to_string()))
    }

    async fn get_chart(&self, symbol: &str, range: &str, interval: &str) -> Result<ChartResult, AnalysisError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let response = self.send_request(
            self.client.get(&url).query(&[("range", range), ("interval", interval)])
        ).await?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        chart.into_result(symbol)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch_history(
        &self,
        index: &IndexInfo,
        period: &str,
        interval: &str,
    ) -> Result<IndexHistory, AnalysisError> {
        let chart = self.get_chart(&index.symbol, period, interval).await?;
        let history = build_history(index, period, interval, &chart);
        if history.data.is_empty() {
            return Err(AnalysisError::DataUnavailable(format!(
                "No price data for {} ({}/{})",
                index.id, period, interval
            )));
        }
        tracing::debug!("Fetched {} points for {} ({}/{})", history.data.len(), index.id, period, interval);
        Ok(history)
    }

    async fn fetch_quote(&self, index: &IndexInfo) -> Result<IndexQuote, AnalysisError> {
        let chart = self.get_chart(&index.symbol, "5d", "1d").await?;
        let history = build_history(index, "5d", "1d", &chart);
        if history.current_price.is_none() {
            return Err(AnalysisError::DataUnavailable(format!("No quote for {}", index.id)));
        }
        Ok(build_quote(index, &history, &chart.meta))
    }
}

/// Convert a chart payload into a history with per-point change percentages.
pub(crate) fn build_history(index: &IndexInfo, period: &str, interval: &str, chart: &ChartResult) -> IndexHistory {
    let offset = chart
        .meta
        .gmtoffset
        .and_then(|secs| FixedOffset::east_opt(secs as i32))
        .unwrap_or_else(|| Utc.fix());
    let date_format = if is_intraday(interval) { "%Y-%m-%d %H:%M:%S" } else { "%Y-%m-%d" };

    let quote = chart.indicators.quote.first();
    let mut data: Vec<IndexDataPoint> = Vec::with_capacity(chart.timestamp.len());

    if let Some(q) = quote {
        for (i, &ts) in chart.timestamp.iter().enumerate() {
            let (Some(open), Some(high), Some(low), Some(close)) = (
                value_at(&q.open, i),
                value_at(&q.high, i),
                value_at(&q.low, i),
                value_at(&q.close, i),
            ) else {
                continue;
            };
            let Some(time) = DateTime::<Utc>::from_timestamp(ts, 0) else {
                continue;
            };

            let prev_close = data.last().map(|p| p.close).unwrap_or(open);
            let volume = value_at(&q.volume, i).unwrap_or(0.0).max(0.0) as u64;

            data.push(IndexDataPoint {
                date: time.with_timezone(&offset).format(date_format).to_string(),
                open: round_to(open, 2),
                high: round_to(high, 2),
                low: round_to(low, 2),
                close: round_to(close, 2),
                volume,
                change_percent: Some(round_to(pct_change(prev_close, close), 2)),
            });
        }
    }

    let last_close = data.last().map(|p| p.close);
    let current_price = chart.meta.regular_market_price.or(last_close);
    let previous_close = chart
        .meta
        .previous_close
        .or_else(|| (data.len() > 1).then(|| data[data.len() - 2].close))
        .or(chart.meta.chart_previous_close)
        .or(current_price);

    let (change, change_percent) = match (current_price, previous_close) {
        (Some(cur), Some(prev)) => (Some(round_to(cur - prev, 2)), Some(round_to(pct_change(prev, cur), 2))),
        _ => (None, None),
    };

    IndexHistory {
        index_id: index.id.clone(),
        name: index.name.clone(),
        symbol: index.symbol.clone(),
        country: index.country.clone(),
        period: period.to_string(),
        interval: interval.to_string(),
        current_price: current_price.map(|p| round_to(p, 2)),
        previous_close: previous_close.map(|p| round_to(p, 2)),
        change,
        change_percent,
        data,
    }
}

pub(crate) fn build_quote(index: &IndexInfo, history: &IndexHistory, meta: &ChartMeta) -> IndexQuote {
    let last = history.data.last();
    IndexQuote {
        id: index.id.clone(),
        name: index.name.clone(),
        symbol: index.symbol.clone(),
        country: index.country.clone(),
        price: history.current_price,
        change: history.change,
        change_percent: history.change_percent,
        previous_close: history.previous_close,
        volume: meta.regular_market_volume.map(|v| v.max(0.0) as u64).or(last.map(|p| p.volume)),
        day_high: meta.regular_market_day_high.or(last.map(|p| p.high)),
        day_low: meta.regular_market_day_low.or(last.map(|p| p.low)),
        fifty_two_week_high: meta.fifty_two_week_high,
        fifty_two_week_low: meta.fifty_two_week_low,
        timestamp: meta
            .regular_market_time
            .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now),
    }
}

fn value_at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten().filter(|v| v.is_finite())
}

// Response structures
#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: ChartBody,
}

impl ChartResponse {
    fn into_result(self, symbol: &str) -> Result<ChartResult, AnalysisError> {
        if let Some(err) = self.chart.error {
            return Err(AnalysisError::ApiError(format!("{}: {}", err.code, err.description)));
        }
        self.chart
            .result
            .and_then(|mut results| (!results.is_empty()).then(|| results.swap_remove(0)))
            .ok_or_else(|| AnalysisError::DataUnavailable(format!("Empty chart for {}", symbol)))
    }
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<f64>,
    regular_market_time: Option<i64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    #[serde(rename = "gmtoffset")]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
