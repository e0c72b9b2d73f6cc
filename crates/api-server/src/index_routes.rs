//! Index catalog, quotes, price history and summary endpoints.

use analysis_core::{all_indices, IndexHistory, IndexInfo, IndexQuote, IndexSummary, INTERVALS, TIME_PERIODS};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{analysis_err, query_params, ApiResponse, AppError, AppState};

#[derive(Serialize, utoipa::ToSchema)]
pub struct IndexList {
    pub total: usize,
    pub indices: Vec<IndexInfo>,
    pub by_country: BTreeMap<String, Vec<IndexInfo>>,
    pub available_periods: Vec<String>,
    pub available_intervals: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuoteList {
    pub total: usize,
    pub quotes: Vec<IndexQuote>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct HistoryQuery {
    /// Time period: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, max
    #[serde(default = "default_period")]
    pub period: String,
    /// Data interval: 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo
    #[serde(default = "default_interval")]
    pub interval: String,
}

fn default_period() -> String {
    "1mo".to_string()
}

fn default_interval() -> String {
    "1d".to_string()
}

pub fn index_routes() -> Router<AppState> {
    Router::new()
        .route("/api/indices", get(list_indices))
        .route("/api/indices/quotes", get(get_quotes))
        .route("/api/indices/:index_id", get(get_index_data))
        .route("/api/indices/:index_id/summary", get(get_index_summary))
}

#[utoipa::path(
    get,
    path = "/api/indices",
    responses((status = 200, description = "Supported indices grouped by country")),
    tag = "Indices"
)]
pub async fn list_indices() -> Json<ApiResponse<IndexList>> {
    let indices = all_indices();

    let mut by_country: BTreeMap<String, Vec<IndexInfo>> = BTreeMap::new();
    for info in &indices {
        by_country.entry(info.country.clone()).or_default().push(info.clone());
    }

    Json(ApiResponse::success(IndexList {
        total: indices.len(),
        indices,
        by_country,
        available_periods: TIME_PERIODS.iter().map(|p| p.to_string()).collect(),
        available_intervals: INTERVALS.iter().map(|i| i.to_string()).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/indices/quotes",
    responses((status = 200, description = "Quotes for every index; failed fetches carry null prices")),
    tag = "Indices"
)]
pub async fn get_quotes(State(state): State<AppState>) -> Json<ApiResponse<QuoteList>> {
    let quotes = state.orchestrator.fetch_all_quotes().await;
    Json(ApiResponse::success(QuoteList {
        total: quotes.len(),
        quotes,
    }))
}

#[utoipa::path(
    get,
    path = "/api/indices/{index_id}",
    params(
        ("index_id" = String, Path, description = "Index id, e.g. SP500"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Historical prices"),
        (status = 400, description = "Unsupported period or interval"),
        (status = 404, description = "Unknown index or no data")
    ),
    tag = "Indices"
)]
pub async fn get_index_data(
    State(state): State<AppState>,
    Path(index_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<IndexHistory>>, AppError> {
    let params = query_params(query)?;
    if !TIME_PERIODS.contains(&params.period.as_str()) {
        return Err(AppError::bad_request(format!(
            "Invalid period. Choose from: {}",
            TIME_PERIODS.join(", ")
        )));
    }
    if !INTERVALS.contains(&params.interval.as_str()) {
        return Err(AppError::bad_request(format!(
            "Invalid interval. Choose from: {}",
            INTERVALS.join(", ")
        )));
    }

    let history = state
        .orchestrator
        .index_history(&index_id, &params.period, &params.interval)
        .await
        .map_err(analysis_err)?;

    if history.data.is_empty() {
        return Err(AppError::not_found(format!(
            "Index '{}' not found or data unavailable",
            index_id
        )));
    }

    Ok(Json(ApiResponse::success(history)))
}

#[utoipa::path(
    get,
    path = "/api/indices/{index_id}/summary",
    params(("index_id" = String, Path, description = "Index id, e.g. SP500")),
    responses(
        (status = 200, description = "Summary statistics and technical outlook"),
        (status = 404, description = "Unknown index")
    ),
    tag = "Indices"
)]
pub async fn get_index_summary(
    State(state): State<AppState>,
    Path(index_id): Path<String>,
) -> Result<Json<ApiResponse<IndexSummary>>, AppError> {
    let summary = state
        .orchestrator
        .index_summary(&index_id)
        .await
        .map_err(analysis_err)?;
    Ok(Json(ApiResponse::success(summary)))
}
