use analysis_orchestrator::SymbolSentiment;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{query_params, ApiResponse, AppError, AppState};

const MAX_ARTICLES: usize = 50;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SentimentQuery {
    /// Number of articles to analyze (1-50, default 10)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

pub fn sentiment_routes() -> Router<AppState> {
    Router::new().route("/api/sentiment/:symbol", get(get_symbol_sentiment))
}

#[utoipa::path(
    get,
    path = "/api/sentiment/{symbol}",
    params(
        ("symbol" = String, Path, description = "Ticker, index name or free-text query"),
        SentimentQuery
    ),
    responses(
        (status = 200, description = "Per-headline sentiment with aggregate counts"),
        (status = 400, description = "limit out of range")
    ),
    tag = "Sentiment"
)]
pub async fn get_symbol_sentiment(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<SentimentQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SymbolSentiment>>, AppError> {
    let params = query_params(query)?;
    if !(1..=MAX_ARTICLES).contains(&params.limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_ARTICLES
        )));
    }

    let result = state.orchestrator.symbol_sentiment(&symbol, params.limit).await;
    tracing::debug!(
        "Sentiment for '{}': {} over {} articles",
        symbol,
        result.overall_sentiment.as_str(),
        result.total_articles
    );
    Ok(Json(ApiResponse::success(result)))
}
