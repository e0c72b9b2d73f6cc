use analysis_core::AnalysisError;
use analysis_orchestrator::AnalysisOrchestrator;
use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use history_store::HistoryDb;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
mod dashboard;
mod history_routes;
mod index_routes;
mod prediction_routes;
mod request_id;
mod security_headers;
mod sentiment_routes;


pub use config::Settings;

pub const APP_NAME: &str = "Sentilytics";
pub const APP_DESCRIPTION: &str = "Market Index Analytics with News Sentiment Prediction";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    /// None when the database could not be opened at startup
    pub history: Option<HistoryDb>,
}

impl AppState {
    pub fn new(orchestrator: AnalysisOrchestrator, history: Option<HistoryDb>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            history,
        }
    }

    /// History database, or 503 when storage is unavailable.
    pub(crate) fn history_db(&self) -> Result<&HistoryDb, AppError> {
        self.history.as_ref().ok_or_else(|| {
            AppError::with_status(
                StatusCode::SERVICE_UNAVAILABLE,
                anyhow::anyhow!("History storage is not available"),
            )
        })
    }
}

/// Envelope for every JSON response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error rendered as an `ApiResponse` with the given status.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl std::fmt::Display) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!("{}", message))
    }

    pub fn not_found(message: impl std::fmt::Display) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, anyhow::anyhow!("{}", message))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Unwrap query parameters, rendering a parse failure as a 400 envelope.
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed ({}): {:#}", self.status, self.error);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.status, self.error);
        }
        let body = ApiResponse::<()>::error(self.error.to_string());
        (self.status, Json(body)).into_response()
    }
}

/// Map analysis failures onto HTTP statuses.
pub(crate) fn analysis_err(e: AnalysisError) -> AppError {
    let status = match &e {
        AnalysisError::UnknownIndex(_) | AnalysisError::DataUnavailable(_) => StatusCode::NOT_FOUND,
        AnalysisError::InvalidData(_) => StatusCode::BAD_REQUEST,
        AnalysisError::ApiError(_) | AnalysisError::ModelError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    AppError::with_status(status, e.into())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub app: String,
    pub version: String,
    pub sentiment_backend: String,
    pub history_enabled: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EndpointInfo {
    pub method: String,
    pub path: String,
    pub description: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
    pub history_tracking: bool,
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/indices", "Supported indices grouped by country"),
    ("GET", "/api/indices/quotes", "Real-time quotes for every index"),
    ("GET", "/api/indices/{index_id}", "Historical prices for an index"),
    ("GET", "/api/indices/{index_id}/summary", "Summary statistics and technical outlook"),
    ("GET", "/api/sentiment/{symbol}", "News headline sentiment for a symbol or query"),
    ("GET", "/api/predict/{index_id}", "Price prediction from technicals and news sentiment"),
    ("GET", "/api/predict/{index_id}/sentiment", "News sentiment for an index"),
    ("GET", "/api/history/sentiment/{index_id}", "Sentiment trend over time"),
    ("GET", "/api/history/predictions/{index_id}", "Logged predictions and their outcomes"),
    ("POST", "/api/history/predictions/{index_id}/evaluate", "Score past predictions against actual closes"),
    ("GET", "/api/history/accuracy", "Prediction accuracy across indices"),
];

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health")),
    tag = "System"
)]
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::success(HealthStatus {
        status: "healthy".to_string(),
        app: APP_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sentiment_backend: state.orchestrator.active_sentiment_backend().await.to_string(),
        history_enabled: state.history.is_some(),
    }))
}

#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "API name, version and endpoint catalogue")),
    tag = "System"
)]
pub async fn api_info(State(state): State<AppState>) -> Json<ApiResponse<ApiInfo>> {
    let endpoints = ENDPOINTS
        .iter()
        .map(|(method, path, description)| EndpointInfo {
            method: method.to_string(),
            path: path.to_string(),
            description: description.to_string(),
        })
        .collect();

    Json(ApiResponse::success(ApiInfo {
        name: APP_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: APP_DESCRIPTION.to_string(),
        endpoints,
        history_tracking: state.history.is_some(),
    }))
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Sentilytics API", description = "Market Index Analytics with News Sentiment Prediction"),
    paths(
        health,
        api_info,
        index_routes::list_indices,
        index_routes::get_quotes,
        index_routes::get_index_data,
        index_routes::get_index_summary,
        sentiment_routes::get_symbol_sentiment,
        prediction_routes::get_prediction,
        prediction_routes::get_index_sentiment,
        history_routes::get_sentiment_history,
        history_routes::get_prediction_history,
        history_routes::evaluate_predictions,
        history_routes::get_accuracy,
    ),
    components(schemas(
        HealthStatus,
        ApiInfo,
        EndpointInfo,
        analysis_core::IndexInfo,
        analysis_core::IndexQuote,
        analysis_core::IndexHistory,
        analysis_core::IndexDataPoint,
        analysis_core::IndexSummary,
        analysis_core::Direction,
        analysis_core::SentimentLabel,
        analysis_orchestrator::PredictionResult,
        analysis_orchestrator::PredictionFactors,
        analysis_orchestrator::TechnicalFactors,
        analysis_orchestrator::SentimentFactors,
        analysis_orchestrator::ForecastPoint,
        analysis_orchestrator::SymbolSentiment,
        sentiment_analysis::NewsSentiment,
        sentiment_analysis::SentimentAggregate,
        history_store::SentimentTrend,
        history_store::SentimentTrendPoint,
        history_store::PredictionRecord,
        history_store::AccuracyStats,
        history_store::OverallAccuracy,
        history_store::OverallStats,
        index_routes::IndexList,
        index_routes::QuoteList,
        prediction_routes::IndexSentimentResponse,
        history_routes::PredictionHistoryResponse,
        history_routes::EvaluationResponse,
    )),
    tags(
        (name = "System", description = "Health and API metadata"),
        (name = "Indices", description = "Index catalog, quotes and price history"),
        (name = "Sentiment", description = "News headline sentiment"),
        (name = "Predictions", description = "Technical and sentiment blended forecasts"),
        (name = "History", description = "Sentiment history and prediction accuracy"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/", get(dashboard::index_page))
        .route("/health", get(health))
        .route("/api", get(api_info))
        .merge(index_routes::index_routes())
        .merge(sentiment_routes::sentiment_routes())
        .merge(prediction_routes::prediction_routes())
        .merge(history_routes::history_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(trace)
        .layer(cors)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = Settings::from_env();
    tracing::info!("Starting {} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let history = match HistoryDb::new(&settings.database_url).await {
        Ok(db) => Some(db),
        Err(e) => {
            tracing::warn!("History database unavailable, tracking disabled: {:#}", e);
            None
        }
    };

    let orchestrator = AnalysisOrchestrator::live(&settings.orchestrator_config());
    tracing::info!("Sentiment backend: {}", orchestrator.sentiment_backend());

    let app = create_router(AppState::new(orchestrator, history));

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{} (docs at /docs)", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
