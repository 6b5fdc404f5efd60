//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, error, warn};

use super::rate_limit::RateLimiter;
use crate::arbitrage::{ArbitrageEngine, ArbitrageReport, ArbitrageRequest, RequestDefaults};
use crate::error::ArbitrageError;

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Evaluates arbitrage requests.
    pub engine: Arc<ArbitrageEngine>,
    /// Values used for omitted query parameters.
    pub defaults: RequestDefaults,
    /// Per-caller limiter for `/api` routes.
    pub limiter: RateLimiter,
    /// Prometheus renderer, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(engine: ArbitrageEngine, defaults: RequestDefaults, limiter: RateLimiter) -> Self {
        Self {
            engine: Arc::new(engine),
            defaults,
            limiter,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Query parameters for the arbitrage endpoint. Parsed by hand so a bad
/// value becomes a 400 with a readable message.
#[derive(Debug, Default, Deserialize)]
pub struct ArbitrageQuery {
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub forex_fee: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "Active".
    pub status: &'static str,
    pub message: &'static str,
    /// RFC 3339 server time.
    pub timestamp: String,
}

/// Error body: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error returned by API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Status code this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ArbitrageError> for ApiError {
    fn from(err: ArbitrageError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// `GET /api/v1/arbitrage/:coin`.
pub async fn arbitrage(
    State(state): State<AppState>,
    Path(coin): Path<String>,
    Query(query): Query<ArbitrageQuery>,
) -> Result<Json<ArbitrageReport>, ApiError> {
    debug!(coin = %coin, ?query, "Arbitrage request");

    let request = ArbitrageRequest::from_params(
        &coin,
        query.amount.as_deref(),
        query.currency.as_deref(),
        query.forex_fee.as_deref(),
        &state.defaults,
    )
    .inspect_err(|e| warn!(error = %e, "Rejected arbitrage request"))?;

    match state.engine.evaluate(request).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            error!(error = %e, "Arbitrage evaluation failed");
            Err(e.into())
        }
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    debug!("Health check");
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(HealthResponse {
        status: "Active",
        message: "Server is awake and ready for arbitrage!",
        timestamp,
    })
}

/// Prometheus text exposition, or 404 when no recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        let err: ApiError = ArbitrageError::InvalidInput("amount must be positive".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn calculation_errors_map_to_500() {
        let err: ApiError = ArbitrageError::InsufficientMarketData {
            available: 0,
            required: 2,
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = ArbitrageError::Overflow("roi").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
