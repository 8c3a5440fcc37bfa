//! HTTP surface: JSON handlers over the `Strategist` flows

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use planner::{
    ChatAnswer, ChatRequest, ExecutionPlanRequest, ExecutionPlanResponse, MarketAnalysis,
    MarketAnalysisRequest, PipelineError, StrategyResult, Strategist,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub strategist: Arc<Strategist>,
}

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api_health))
        .route("/market-analysis", post(api_market_analysis))
        .route("/execution-plan", post(api_execution_plan))
        .route("/strategy", post(api_strategy))
        .route("/chat", post(api_chat))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Converts every pipeline failure into `{ error, details? }`.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PipelineError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            PipelineError::InvalidInput(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            PipelineError::SchemaViolation(violations) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Invalid response format from model",
                    "details": violations,
                }),
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": other.to_string(),
                    "details": { "stage": other.stage() },
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/health
async fn api_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "expansion-planner",
        "version": APP_VERSION,
    }))
}

/// POST /api/market-analysis: `{ market }` → analysis
async fn api_market_analysis(
    State(state): State<AppState>,
    payload: Result<Json<MarketAnalysisRequest>, JsonRejection>,
) -> Result<Json<MarketAnalysis>, ApiError> {
    let Json(request) = payload?;
    let analysis = state.strategist.market_analysis(request).await?;
    Ok(Json(analysis))
}

/// POST /api/execution-plan: `{ market, scenario }` → `{ executionPlan }`
async fn api_execution_plan(
    State(state): State<AppState>,
    payload: Result<Json<ExecutionPlanRequest>, JsonRejection>,
) -> Result<Json<ExecutionPlanResponse>, ApiError> {
    let Json(request) = payload?;
    let execution_plan = state.strategist.execution_plan(request).await?;
    Ok(Json(ExecutionPlanResponse { execution_plan }))
}

/// POST /api/strategy: `{ market, scenario }` → `{ analysis, executionPlan, scenario }`
async fn api_strategy(
    State(state): State<AppState>,
    payload: Result<Json<ExecutionPlanRequest>, JsonRejection>,
) -> Result<Json<StrategyResult>, ApiError> {
    let Json(request) = payload?;
    let strategy = state.strategist.full_strategy(request).await?;
    info!(scenario = %strategy.scenario, "Strategy generated");
    Ok(Json(strategy))
}

/// POST /api/chat: `{ question, marketContext?, strategyContext?, history? }` → `{ answer }`
async fn api_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatAnswer>, ApiError> {
    let Json(request) = payload?;
    let answer = state.strategist.chat(request).await?;
    Ok(Json(answer))
}
