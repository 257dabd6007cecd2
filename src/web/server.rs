use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::markets::{self, MarketRequest, TradeParams, TradeReceipt};
use crate::metrics;
use crate::risk::engine::{CrisisResponse, PredictionResponse, RiskEngine};
use crate::risk::types::ScoreInput;
use crate::web::error::ApiError;
use crate::{alerts::DisruptionAlert, analytics, oracle};

/// HTTP API server - micro-risk market endpoints
pub struct WebServer {
    engine: Arc<RiskEngine>,
    config: Arc<Config>,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<RiskEngine>,
}

#[derive(Deserialize)]
struct AlertQuery {
    limit: Option<usize>,
}

impl WebServer {
    pub fn new(engine: Arc<RiskEngine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let app = router(self.engine.clone(), self.config.web.cors);

        let addr = format!("{}:{}", self.config.listen.address, self.config.listen.port);
        info!("🌐 snapstake API listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

pub fn router(engine: Arc<RiskEngine>, cors: bool) -> Router {
    let state = AppState { engine };

    let app = Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/disruption-alerts", get(disruption_alerts))
        .route("/markets", post(create_market))
        .route("/markets/active", get(active_markets))
        .route("/markets/:market_id/trade", post(trade))
        .route("/oracle/data-feeds", get(oracle_feeds))
        .route("/analytics/platform", get(platform_analytics))
        .route("/health", get(health))
        .route("/stats", get(api_stats))
        .route("/metrics", get(api_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Service banner
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Snap_Stake API - Micro-Risk Markets Platform",
        "version": env!("CARGO_PKG_VERSION"),
        "features": ["AI predictions", "x402 micropayments", "real-time markets"],
    }))
}

/// Paid prediction - 402 unless the x402 header checks out
async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ScoreInput>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let payment = state.engine.payment.header_name();
    let header_value = headers.get(payment).and_then(|v| v.to_str().ok());

    state
        .engine
        .predict(header_value, &input, &mut rand::thread_rng())
        .map(Json)
        .map_err(|_| ApiError::PaymentRequired(payment.to_string()))
}

async fn disruption_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertQuery>,
) -> Json<Vec<DisruptionAlert>> {
    Json(state.engine.disruption_alerts(params.limit, &mut rand::thread_rng()))
}

async fn active_markets(State(state): State<AppState>) -> Json<Vec<markets::ActiveMarket>> {
    let now = state.engine.clock().now();
    Json(markets::active_markets(now, &mut rand::thread_rng()))
}

async fn trade(
    State(state): State<AppState>,
    Path(market_id): Path<String>,
    Query(params): Query<TradeParams>,
) -> Json<TradeReceipt> {
    let clock = state.engine.clock();
    let receipt = markets::execute_trade(
        &market_id,
        params,
        clock.now(),
        clock.unix_timestamp(),
        &mut rand::thread_rng(),
    );
    state.engine.metrics.trades_total.fetch_add(1, Ordering::Relaxed);
    info!("Trade {} on {} ({})", receipt.trade_id, receipt.market_id, receipt.amount);
    Json(receipt)
}

/// Paid crisis intake - scores the disruption and lists a market above threshold
async fn create_market(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<MarketRequest>,
) -> Result<Json<CrisisResponse>, ApiError> {
    let payment = state.engine.payment.header_name();
    let header_value = headers.get(payment).and_then(|v| v.to_str().ok());
    state.engine.payment.check(header_value).map_err(|e| {
        debug!("Crisis payment rejected: {}", e);
        ApiError::PaymentRequired(payment.to_string())
    })?;

    state
        .engine
        .crisis_market(&request, &mut rand::thread_rng())
        .map(Json)
        .map_err(|e| {
            warn!("Market draft rejected: {}", e);
            ApiError::from(e)
        })
}

async fn oracle_feeds(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(oracle::data_feeds(state.engine.clock().now()))
}

async fn platform_analytics() -> Json<serde_json::Value> {
    Json(analytics::platform_analytics(&mut rand::thread_rng()))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.health())
}

async fn api_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.get_stats())
}

/// Prometheus metrics
async fn api_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics::render_metrics(&state.engine),
    )
}
