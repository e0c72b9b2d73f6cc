//! Prediction endpoints. Predictions and index sentiment are written to the
//! history store when it is available; storage failures only log a warning.

use analysis_core::{find_index, AnalysisError, SentimentLabel};
use analysis_orchestrator::{PredictionResult, MAX_HORIZON_DAYS, MIN_HORIZON_DAYS};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use sentiment_analysis::{NewsSentiment, SentimentAggregate};
use serde::{Deserialize, Serialize};

use crate::{analysis_err, query_params, ApiResponse, AppError, AppState};

#[derive(Deserialize, utoipa::IntoParams)]
pub struct PredictionQuery {
    /// Number of days to predict (1-30, default 7)
    #[serde(default = "default_days")]
    pub days: u32,
    /// Save the prediction to history (default true)
    #[serde(default = "default_save")]
    pub save_to_history: bool,
}

fn default_days() -> u32 {
    7
}

fn default_save() -> bool {
    true
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct IndexSentimentResponse {
    pub index_id: String,
    pub overall_sentiment: SentimentLabel,
    pub sentiment_score: f64,
    pub total_articles: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub articles: Vec<NewsSentiment>,
    /// Set when no articles were found
    pub message: Option<String>,
}

pub fn prediction_routes() -> Router<AppState> {
    Router::new()
        .route("/api/predict/:index_id", get(get_prediction))
        .route("/api/predict/:index_id/sentiment", get(get_index_sentiment))
}

#[utoipa::path(
    get,
    path = "/api/predict/{index_id}",
    params(
        ("index_id" = String, Path, description = "Index id, e.g. SP500"),
        PredictionQuery
    ),
    responses(
        (status = 200, description = "Prediction blending technical indicators and news sentiment"),
        (status = 400, description = "days out of range"),
        (status = 404, description = "Unknown index")
    ),
    tag = "Predictions"
)]
pub async fn get_prediction(
    State(state): State<AppState>,
    Path(index_id): Path<String>,
    query: Result<Query<PredictionQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PredictionResult>>, AppError> {
    let params = query_params(query)?;
    if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&params.days) {
        return Err(AppError::bad_request(format!(
            "days must be between {} and {}",
            MIN_HORIZON_DAYS, MAX_HORIZON_DAYS
        )));
    }

    let prediction = state
        .orchestrator
        .generate_prediction(&index_id, params.days)
        .await
        .map_err(analysis_err)?;

    if params.save_to_history {
        record_prediction(&state, &prediction).await;
    }

    Ok(Json(ApiResponse::success(prediction)))
}

async fn record_prediction(state: &AppState, prediction: &PredictionResult) {
    let Some(db) = state.history.as_ref() else {
        return;
    };

    if let Err(e) = db.log_prediction(prediction).await {
        tracing::warn!("Failed to log prediction for {}: {:#}", prediction.index_id, e);
        return;
    }

    let sentiment = &prediction.factors.sentiment;
    let aggregate = SentimentAggregate {
        score: sentiment.score,
        label: sentiment.label,
        positive_count: sentiment.positive_articles,
        negative_count: sentiment.negative_articles,
        neutral_count: sentiment.neutral_articles,
        ..SentimentAggregate::default()
    };
    if let Err(e) = db.save_sentiment(&prediction.index_id, &prediction.name, &aggregate).await {
        tracing::warn!("Failed to save sentiment for {}: {:#}", prediction.index_id, e);
    }
}

#[utoipa::path(
    get,
    path = "/api/predict/{index_id}/sentiment",
    params(("index_id" = String, Path, description = "Index id, e.g. SP500")),
    responses(
        (status = 200, description = "Scored news articles for the index"),
        (status = 404, description = "Unknown index")
    ),
    tag = "Predictions"
)]
pub async fn get_index_sentiment(
    State(state): State<AppState>,
    Path(index_id): Path<String>,
) -> Result<Json<ApiResponse<IndexSentimentResponse>>, AppError> {
    let info = find_index(&index_id)
        .ok_or_else(|| analysis_err(AnalysisError::UnknownIndex(index_id.clone())))?;

    let sentiment = state.orchestrator.index_sentiment(&info.id).await;

    let message = if sentiment.articles.is_empty() {
        Some("No recent news articles found for sentiment analysis".to_string())
    } else {
        if let Some(db) = state.history.as_ref() {
            if let Err(e) = db.save_sentiment(&info.id, &info.name, &sentiment).await {
                tracing::warn!("Failed to save sentiment history for {}: {:#}", info.id, e);
            }
        }
        None
    };

    Ok(Json(ApiResponse::success(IndexSentimentResponse {
        index_id: info.id,
        overall_sentiment: sentiment.label,
        sentiment_score: sentiment.score,
        total_articles: sentiment.total_articles(),
        positive_count: sentiment.positive_count,
        negative_count: sentiment.negative_count,
        neutral_count: sentiment.neutral_count,
        articles: sentiment.articles,
        message,
    })))
}
