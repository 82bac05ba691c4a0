//! JSON feed for the dashboard.
//!
//! Thin axum adapter over [`Telemetry`]:
//! - `GET /json/notes` - every note, sorted by key
//! - `GET /json/metrics` - every metric definition, sorted
//! - `GET /json/metrics/{name}?start=&stop=&op=` - the newest windows of one metric
//! - `GET /json/page` - page title, image and reading labels

use crate::core::{Config, Op, PageConfig, PulseError, Result};
use crate::telemetry::Telemetry;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Mount point used by [`nest_at`] when embedding into a larger app
pub const DEFAULT_PATH: &str = "/pulse";

/// API server state.
#[derive(Clone)]
struct ApiState {
    telemetry: Telemetry,
    page: Arc<PageConfig>,
    step_ms: i64,
}

/// Error response.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

/// Page setup response.
#[derive(Debug, Serialize)]
struct PageResponse<'a> {
    title: &'a str,
    image: &'a str,
    readings: Vec<String>,
}

/// Query parameters for a metric window request.
#[derive(Debug, Deserialize)]
struct RangeQuery {
    /// Range start (unix milliseconds)
    start: Option<String>,
    /// Range stop (unix milliseconds)
    stop: Option<String>,
    /// Projection, defaults to `count`
    op: Option<String>,
}

/// Error wrapper turning [`PulseError`] into an HTTP response
struct ApiError(PulseError);

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.category() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "dashboard request failed");
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the feed router.
///
/// `step` is the width of one window, used to turn a `start`/`stop` range
/// into a number of windows.
pub fn router(telemetry: Telemetry, page: PageConfig, step: std::time::Duration) -> Router {
    let state = ApiState {
        telemetry,
        page: Arc::new(page),
        step_ms: i64::try_from(step.as_millis()).unwrap_or(i64::MAX).max(1),
    };

    Router::new()
        .route("/json/notes", get(notes_handler))
        .route("/json/metrics", get(definitions_handler))
        .route("/json/metrics/:name", get(metric_handler))
        .route("/json/page", get(page_handler))
        .with_state(state)
}

/// Mount `router` under `prefix`, e.g. [`DEFAULT_PATH`]
pub fn nest_at(prefix: &str, router: Router) -> Router {
    Router::new().nest(prefix, router)
}

/// Serve the feed until `shutdown` resolves.
pub async fn serve<F>(telemetry: Telemetry, config: &Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut app = router(telemetry, config.page.clone(), config.store.tick_period);

    if config.server.enable_cors {
        app = app.layer(ServiceBuilder::new().layer(CorsLayer::permissive()));
    }
    app = app.layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.server.bind_address, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Serving dashboard feed on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// GET /json/notes
async fn notes_handler(State(state): State<ApiState>) -> std::result::Result<Response, ApiError> {
    let notes = state.telemetry.query_notes().await?;
    Ok(Json(&*notes).into_response())
}

/// GET /json/metrics
async fn definitions_handler(
    State(state): State<ApiState>,
) -> std::result::Result<Response, ApiError> {
    let definitions = state.telemetry.list_definitions().await?;
    Ok(Json(&*definitions).into_response())
}

/// GET /json/metrics/:name
async fn metric_handler(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(range): Query<RangeQuery>,
) -> std::result::Result<Response, ApiError> {
    let start = parse_millis(range.start.as_deref())?;
    let stop = parse_millis(range.stop.as_deref())?;
    let op = match range.op.as_deref() {
        Some(op) => op.parse::<Op>()?,
        None => Op::Count,
    };

    let windows = stop.saturating_sub(start) / state.step_ms;

    let values = state
        .telemetry
        .query_series(name.as_str(), op)
        .await?
        .ok_or_else(|| PulseError::not_found(name.as_str()))?;

    let count = usize::try_from(windows)
        .ok()
        .filter(|&count| count <= values.len())
        .ok_or_else(|| {
            PulseError::invalid_range(format!(
                "{} windows requested, {} available",
                windows,
                values.len()
            ))
        })?;

    Ok(Json(&values[values.len() - count..]).into_response())
}

/// GET /json/page
async fn page_handler(State(state): State<ApiState>) -> std::result::Result<Response, ApiError> {
    let definitions = state.telemetry.list_definitions().await?;
    let page = PageResponse {
        title: &state.page.title,
        image: &state.page.image,
        readings: definitions.iter().map(|d| d.display_name.clone()).collect(),
    };
    Ok(Json(page).into_response())
}

fn parse_millis(raw: Option<&str>) -> Result<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| PulseError::invalid_range("Invalid start or stop"))
}
