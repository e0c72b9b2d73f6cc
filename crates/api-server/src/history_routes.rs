use analysis_core::{all_indices, find_index, AnalysisError};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use history_store::{AccuracyStats, OverallAccuracy, PredictionRecord, SentimentTrend};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{analysis_err, query_params, ApiResponse, AppError, AppState};

/// Window of daily closes used to score past predictions.
const EVALUATION_PERIOD: &str = "1mo";

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SentimentHistoryQuery {
    /// Number of days to look back (1-90, default 7)
    #[serde(default = "default_sentiment_days")]
    pub days: i64,
}

fn default_sentiment_days() -> i64 {
    7
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct PredictionHistoryQuery {
    /// Number of days to look back (1-180, default 30)
    #[serde(default = "default_prediction_days")]
    pub days: i64,
}

fn default_prediction_days() -> i64 {
    30
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PredictionHistoryResponse {
    pub index_id: String,
    pub days: i64,
    pub accuracy_stats: AccuracyStats,
    pub predictions: Vec<PredictionRecord>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EvaluationResponse {
    pub index_id: String,
    pub evaluated: usize,
    pub accuracy_stats: AccuracyStats,
}

pub fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/api/history/sentiment/:index_id", get(get_sentiment_history))
        .route("/api/history/predictions/:index_id", get(get_prediction_history))
        .route("/api/history/predictions/:index_id/evaluate", post(evaluate_predictions))
        .route("/api/history/accuracy", get(get_accuracy))
}

fn check_days(days: i64, max: i64) -> Result<(), AppError> {
    if (1..=max).contains(&days) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!("days must be between 1 and {}", max)))
    }
}

fn known_index(index_id: &str) -> Result<String, AppError> {
    find_index(index_id)
        .map(|info| info.id)
        .ok_or_else(|| analysis_err(AnalysisError::UnknownIndex(index_id.to_string())))
}

#[utoipa::path(
    get,
    path = "/api/history/sentiment/{index_id}",
    params(
        ("index_id" = String, Path, description = "Index id, e.g. SP500"),
        SentimentHistoryQuery
    ),
    responses(
        (status = 200, description = "Stored sentiment analyses, oldest first"),
        (status = 503, description = "History storage unavailable")
    ),
    tag = "History"
)]
pub async fn get_sentiment_history(
    State(state): State<AppState>,
    Path(index_id): Path<String>,
    query: Result<Query<SentimentHistoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SentimentTrend>>, AppError> {
    let params = query_params(query)?;
    check_days(params.days, 90)?;
    let index_id = known_index(&index_id)?;
    let db = state.history_db()?;

    let trend = db.sentiment_trend(&index_id, params.days).await?;
    Ok(Json(ApiResponse::success(trend)))
}

#[utoipa::path(
    get,
    path = "/api/history/predictions/{index_id}",
    params(
        ("index_id" = String, Path, description = "Index id, e.g. SP500"),
        PredictionHistoryQuery
    ),
    responses(
        (status = 200, description = "Logged predictions with outcomes and accuracy"),
        (status = 503, description = "History storage unavailable")
    ),
    tag = "History"
)]
pub async fn get_prediction_history(
    State(state): State<AppState>,
    Path(index_id): Path<String>,
    query: Result<Query<PredictionHistoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PredictionHistoryResponse>>, AppError> {
    let params = query_params(query)?;
    check_days(params.days, 180)?;
    let index_id = known_index(&index_id)?;
    let db = state.history_db()?;

    let predictions = db.prediction_history(&index_id, params.days).await?;
    let accuracy_stats = db.prediction_accuracy(&index_id).await?;

    Ok(Json(ApiResponse::success(PredictionHistoryResponse {
        index_id,
        days: params.days,
        accuracy_stats,
        predictions,
    })))
}

#[utoipa::path(
    post,
    path = "/api/history/predictions/{index_id}/evaluate",
    params(("index_id" = String, Path, description = "Index id, e.g. SP500")),
    responses(
        (status = 200, description = "Pending predictions scored against actual closes"),
        (status = 404, description = "Unknown index or no recent prices"),
        (status = 503, description = "History storage unavailable")
    ),
    tag = "History"
)]
pub async fn evaluate_predictions(
    State(state): State<AppState>,
    Path(index_id): Path<String>,
) -> Result<Json<ApiResponse<EvaluationResponse>>, AppError> {
    let index_id = known_index(&index_id)?;
    let db = state.history_db()?;

    let history = state
        .orchestrator
        .index_history(&index_id, EVALUATION_PERIOD, "1d")
        .await
        .map_err(|e| {
            tracing::warn!("No prices to evaluate {} against: {}", index_id, e);
            AppError::not_found(format!("Unable to fetch data for {}", index_id))
        })?;

    if history.data.is_empty() {
        return Err(AppError::not_found(format!("Unable to fetch data for {}", index_id)));
    }

    let actual_prices: HashMap<String, f64> = history
        .data
        .iter()
        .map(|point| (point.date.clone(), point.close))
        .collect();

    let evaluated = db.evaluate_past_predictions(&index_id, &actual_prices).await?;
    let accuracy_stats = db.prediction_accuracy(&index_id).await?;

    Ok(Json(ApiResponse::success(EvaluationResponse {
        index_id,
        evaluated,
        accuracy_stats,
    })))
}

#[utoipa::path(
    get,
    path = "/api/history/accuracy",
    responses(
        (status = 200, description = "Overall and per-index prediction accuracy"),
        (status = 503, description = "History storage unavailable")
    ),
    tag = "History"
)]
pub async fn get_accuracy(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OverallAccuracy>>, AppError> {
    let db = state.history_db()?;
    let ids: Vec<String> = all_indices().into_iter().map(|info| info.id).collect();
    let accuracy = db.overall_accuracy(&ids).await?;
    Ok(Json(ApiResponse::success(accuracy)))
}
