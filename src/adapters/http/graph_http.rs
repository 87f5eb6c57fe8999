//! Graph data HTTP server.
//!
//! Serves range queries, point inserts, full-series listings, cache
//! clearing, and inserted points as they happen (SSE on `/data/stream`,
//! WebSocket text frames on `/ws`).
//!
//! Live update connections never end on their own, so shutting the server
//! down first signals them through a `watch` channel and only then waits
//! for open connections to drain.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Category, Config, DataPoint, DateRange, PointEvent};
use crate::domain::ports::GraphRepository;
use crate::services::{LiveUpdate, PointService, RangeQueryService};

/// Configuration for the graph HTTP server.
#[derive(Debug, Clone)]
pub struct GraphHttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
    /// Upper bound on handling one request; exceeding it yields 504.
    pub request_timeout: Duration,
    /// Keep-alive interval for SSE streams.
    pub heartbeat_interval: Duration,
    /// Longest accepted range, bounds included.
    pub max_range_days: u32,
}

impl Default for GraphHttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
            request_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(30),
            max_range_days: 366,
        }
    }
}

impl From<&Config> for GraphHttpConfig {
    fn from(config: &Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            enable_cors: config.server.enable_cors,
            request_timeout: config.server.request_timeout(),
            heartbeat_interval: config.server.heartbeat_interval(),
            max_range_days: config.query.max_range_days,
        }
    }
}

/// Query parameters of `GET /data/range`.
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    #[serde(rename = "type")]
    pub graph_type: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Query parameters of `POST /data/add-data`.
///
/// Kept as strings so that bad values get a specific error message.
#[derive(Debug, Deserialize)]
pub struct AddDataParams {
    pub x: Option<String>,
    pub y: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub graph_type: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

/// Shared state for the graph HTTP server.
pub struct AppState<R: GraphRepository> {
    range_query: RangeQueryService<R>,
    points: PointService<R>,
    config: GraphHttpConfig,
    /// Flips to `true` once shutdown starts; live update streams end on it.
    shutdown: watch::Sender<bool>,
}

/// Graph HTTP Server.
pub struct GraphHttpServer<R: GraphRepository + 'static> {
    state: Arc<AppState<R>>,
}

impl<R: GraphRepository + 'static> GraphHttpServer<R> {
    pub fn new(range_query: RangeQueryService<R>, points: PointService<R>, config: GraphHttpConfig) -> Self {
        Self {
            state: Arc::new(AppState {
                range_query,
                points,
                config,
                shutdown: watch::Sender::new(false),
            }),
        }
    }

    /// Build the router with all endpoints.
    pub fn build_router(&self) -> Router {
        let app = Router::new()
            .route("/data/range", get(range_query::<R>))
            .route("/data/add-data", post(add_data::<R>))
            .route("/data/stream", get(stream_points::<R>))
            .route("/ws", get(live_updates_socket::<R>))
            .route("/data/{graph}", get(list_points::<R>))
            .route("/cache/clear-cache", post(clear_cache::<R>))
            .route("/health", get(health_check))
            .with_state(self.state.clone());

        if self.state.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.state.config.host, self.state.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Graph HTTP server listening on {}", addr);

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// Open SSE and WebSocket clients are told to stop before the server
    /// waits for in-flight requests.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let state = self.state.clone();
        let signal = async move {
            shutdown.await;
            state.shutdown.send_replace(true);
            tracing::info!(
                live_clients = state.points.live_updates().subscriber_count(),
                "shutting down, closing live update streams"
            );
        };

        axum::serve(listener, router).with_graceful_shutdown(signal).await?;
        Ok(())
    }
}

/// Map a domain error onto a status code and error body.
pub fn error_response(err: &DomainError) -> ApiError {
    let (status, code) = match err {
        DomainError::InvalidCategory(_) => (StatusCode::BAD_REQUEST, "INVALID_CATEGORY"),
        DomainError::InvalidDateRange(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE_RANGE"),
        DomainError::MalformedDate(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
        DomainError::DuplicatePoint { .. } => (StatusCode::BAD_REQUEST, "DUPLICATE_POINT"),
        DomainError::BackingStoreUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BACKING_STORE_ERROR"),
        DomainError::DeadlineExceeded(_) => (StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED"),
        DomainError::CacheUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "CACHE_UNAVAILABLE"),
        DomainError::MalformedCachedValue { .. } | DomainError::SerializationError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };

    if status.is_server_error() {
        tracing::error!(error = %err, code, "request failed");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
}

fn bad_request(code: &str, error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

fn required<'a>(value: Option<&'a str>, name: &str) -> ApiResult<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(bad_request("MISSING_PARAMETER", format!("Missing required parameter: {name}"))),
    }
}

fn parse_coordinate(value: Option<&str>, name: &str) -> ApiResult<i64> {
    let raw = required(value, name)?;
    raw.parse()
        .map_err(|_| bad_request("INVALID_PARAMETER", format!("Invalid {name} value: {raw}")))
}

/// Run `op` under the request deadline. Dropping the future on expiry
/// cancels every lookup still in flight.
async fn within_deadline<T>(deadline: Duration, op: impl Future<Output = DomainResult<T>>) -> DomainResult<T> {
    tokio::time::timeout(deadline, op)
        .await
        .unwrap_or(Err(DomainError::DeadlineExceeded(deadline)))
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn range_query<R: GraphRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<RangeParams>,
) -> ApiResult<Json<Vec<DataPoint>>> {
    let graph_type = required(params.graph_type.as_deref(), "type")?;
    let start = required(params.start.as_deref(), "start")?;
    let end = required(params.end.as_deref(), "end")?;

    let category = Category::parse(graph_type).map_err(|e| error_response(&e))?;
    let range = DateRange::parse(start, end, state.config.max_range_days).map_err(|e| error_response(&e))?;

    within_deadline(state.config.request_timeout, state.range_query.query(category, &range))
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

async fn add_data<R: GraphRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<AddDataParams>,
) -> ApiResult<(StatusCode, Json<PointEvent>)> {
    let x = parse_coordinate(params.x.as_deref(), "x")?;
    let y = parse_coordinate(params.y.as_deref(), "y")?;
    let timestamp = required(params.timestamp.as_deref(), "timestamp")?;
    let graph_type = required(params.graph_type.as_deref(), "type")?;

    let category = Category::parse(graph_type).map_err(|e| error_response(&e))?;

    within_deadline(
        state.config.request_timeout,
        state.points.add_point(category, timestamp, x, y),
    )
    .await
    .map(|event| (StatusCode::CREATED, Json(event)))
    .map_err(|e| error_response(&e))
}

async fn list_points<R: GraphRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(graph): Path<String>,
) -> ApiResult<Json<Vec<DataPoint>>> {
    let category = Category::parse(&graph).map_err(|e| error_response(&e))?;

    within_deadline(state.config.request_timeout, state.points.list_points(category))
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

async fn clear_cache<R: GraphRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> ApiResult<Json<MessageResponse>> {
    within_deadline(state.config.request_timeout, state.points.clear_cache())
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(MessageResponse {
        message: "Cache cleared successfully".to_string(),
    }))
}

/// SSE stream of inserted points.
async fn stream_points<R: GraphRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.points.live_updates().subscribe();
    let heartbeat = state.config.heartbeat_interval;

    Sse::new(live_update_stream(receiver, state.shutdown.subscribe()))
        .keep_alive(KeepAlive::new().interval(heartbeat))
}

/// Turn a broadcast receiver into SSE events. A lagging client gets a
/// `warning` event with the number of skipped points. The stream ends when
/// the bus closes or `stop` turns `true`.
fn live_update_stream(
    receiver: broadcast::Receiver<LiveUpdate>,
    stop: watch::Receiver<bool>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold((receiver, stop), |(mut rx, mut stop)| async move {
        let stopped = *stop.borrow_and_update();
        if stopped {
            return None;
        }

        let received = tokio::select! {
            _ = stop.changed() => return None,
            received = rx.recv() => received,
        };

        match received {
            Ok(update) => {
                let event = Event::default()
                    .event("point")
                    .id(update.sequence.to_string())
                    .data(serde_json::to_string(&update.event).unwrap_or_default());
                Some((Ok(event), (rx, stop)))
            }
            Err(broadcast::error::RecvError::Closed) => None,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                let warning = Event::default()
                    .event("warning")
                    .data(format!("{{\"type\":\"lagged\",\"missed_points\":{n}}}"));
                Some((Ok(warning), (rx, stop)))
            }
        }
    })
}

/// WebSocket feed of inserted points, one JSON text frame per point.
async fn live_updates_socket<R: GraphRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    ws: WebSocketUpgrade,
) -> Response {
    let receiver = state.points.live_updates().subscribe();
    let stop = state.shutdown.subscribe();

    ws.on_upgrade(move |socket| forward_live_updates(socket, receiver, stop))
}

async fn forward_live_updates(
    mut socket: WebSocket,
    mut rx: broadcast::Receiver<LiveUpdate>,
    mut stop: watch::Receiver<bool>,
) {
    let stopped = *stop.borrow_and_update();
    if !stopped {
        loop {
            tokio::select! {
                _ = stop.changed() => break,
                received = rx.recv() => match received {
                    Ok(update) => {
                        let Ok(text) = serde_json::to_string(&update.event) else {
                            continue;
                        };
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(missed_points = n, "websocket client lagging, points skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                incoming = socket.recv() => match incoming {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => return,
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    let _ = socket.send(Message::Close(None)).await;
}
