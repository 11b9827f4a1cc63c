/// HTTP endpoint for querying the climate dataset
///
/// Provides a small read-only REST API over the measurement and station
/// tables. Every handler runs exactly one store query, which opens and
/// closes its own database session.
///
/// Endpoints:
/// - GET / - Welcome page listing the routes
/// - GET /api/v1.0/precipitation - Precipitation by date over the lookback window
/// - GET /api/v1.0/stations - All station identifiers
/// - GET /api/v1.0/tobs - Temperature observations of the most active station
/// - GET /api/v1.0/temp/{start} - [min, avg, max] temperature from start onwards
/// - GET /api/v1.0/temp/{start}/{end} - [min, avg, max] temperature within start..=end
/// - GET /health - Service health check

use crate::config::ServiceConfig;
use crate::dates::{canonical_date, lookback_start};
use crate::model::{DateRange, PrecipitationSeries};
use crate::store::{ClimateStore, StoreError};
use chrono::{Local, NaiveDate};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use threadpool::ThreadPool;
use tiny_http::Method;

const WELCOME_HTML: &str = "Hawaii Climate Analysis API! - Date format (YYYY-MM-DD)<br/>\
Routes:<br/>\
/api/v1.0/precipitation<br/>\
/api/v1.0/stations<br/>\
/api/v1.0/tobs<br/>\
/api/v1.0/temp/start<br/>\
/api/v1.0/temp/start/end";

const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/",
    "/health",
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/temp/{start}",
    "/api/v1.0/temp/{start}/{end}",
];

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Health,
    Precipitation,
    Stations,
    Tobs,
    /// Raw, still unvalidated date segments.
    TemperatureStats { start: String, end: Option<String> },
    NotFound,
}

impl Route {
    /// Maps a request URL to a route. The query string is ignored and path
    /// segments are percent-decoded. Paths must match exactly: a trailing or
    /// doubled slash leaves an empty segment, which no route accepts.
    pub fn parse(url: &str) -> Route {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let Some(path) = path.strip_prefix('/') else {
            return Route::NotFound;
        };
        if path.is_empty() {
            return Route::Welcome;
        }

        let segments: Vec<String> = path.split('/').map(decode_segment).collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segments.as_slice() {
            ["health"] => Route::Health,
            ["api", "v1.0", "precipitation"] => Route::Precipitation,
            ["api", "v1.0", "stations"] => Route::Stations,
            ["api", "v1.0", "tobs"] => Route::Tobs,
            ["api", "v1.0", "temp", start] if !start.is_empty() => Route::TemperatureStats {
                start: start.to_string(),
                end: None,
            },
            ["api", "v1.0", "temp", start, end]
                if !start.is_empty() && !end.is_empty() =>
            {
                Route::TemperatureStats {
                    start: start.to_string(),
                    end: Some(end.to_string()),
                }
            }
            _ => Route::NotFound,
        }
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

/// Shared, read-only state handed to every request.
pub struct ApiContext {
    store: Box<dyn ClimateStore>,
    most_active_station: String,
    lookback_days: i64,
}

impl ApiContext {
    pub fn new(store: Box<dyn ClimateStore>, config: &ServiceConfig) -> Self {
        Self {
            store,
            most_active_station: config.most_active_station.clone(),
            lookback_days: config.lookback_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Html(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    fn json(status: u16, value: serde_json::Value) -> Self {
        Self { status, body: ResponseBody::Json(value) }
    }

    fn html(body: &str) -> Self {
        Self { status: 200, body: ResponseBody::Html(body.to_string()) }
    }
}

/// Routes one request. `today` anchors the lookback window.
pub fn handle_request(ctx: &ApiContext, method: &Method, url: &str, today: NaiveDate) -> ApiResponse {
    if *method != Method::Get {
        return ApiResponse::json(
            405,
            json!({ "error": "Method not allowed", "allowed": ["GET"] }),
        );
    }

    match Route::parse(url) {
        Route::Welcome => handle_welcome(ctx),
        Route::Health => handle_health(),
        Route::Precipitation => handle_precipitation(ctx, today),
        Route::Stations => handle_stations(ctx),
        Route::Tobs => handle_tobs(ctx, today),
        Route::TemperatureStats { start, end } => {
            handle_temperature_stats(ctx, &start, end.as_deref())
        }
        Route::NotFound => ApiResponse::json(
            404,
            json!({ "error": "Not found", "available_endpoints": AVAILABLE_ENDPOINTS }),
        ),
    }
}

/// Handle / endpoint
fn handle_welcome(ctx: &ApiContext) -> ApiResponse {
    match ctx.store.table_names() {
        Ok(tables) => debug!("Known tables: {:?}", tables),
        Err(e) => warn!("Could not list tables: {}", e),
    }
    ApiResponse::html(WELCOME_HTML)
}

/// Handle /health endpoint
fn handle_health() -> ApiResponse {
    ApiResponse::json(
        200,
        json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }),
    )
}

/// Handle /api/v1.0/precipitation endpoint
fn handle_precipitation(ctx: &ApiContext, today: NaiveDate) -> ApiResponse {
    let since = lookback_start(today, ctx.lookback_days);
    match ctx.store.precipitation_since(&since) {
        Ok(readings) => {
            let series: PrecipitationSeries = readings.into_iter().collect();
            json_ok(&series)
        }
        Err(e) => store_failure("precipitation", e),
    }
}

/// Handle /api/v1.0/stations endpoint
fn handle_stations(ctx: &ApiContext) -> ApiResponse {
    match ctx.store.station_ids() {
        Ok(ids) => json_ok(&ids),
        Err(e) => store_failure("stations", e),
    }
}

/// Handle /api/v1.0/tobs endpoint
fn handle_tobs(ctx: &ApiContext, today: NaiveDate) -> ApiResponse {
    let since = lookback_start(today, ctx.lookback_days);
    match ctx.store.tobs_for_station_since(&ctx.most_active_station, &since) {
        Ok(temps) => json_ok(&temps),
        Err(e) => store_failure("tobs", e),
    }
}

/// Handle /api/v1.0/temp/{start}[/{end}] endpoint
fn handle_temperature_stats(ctx: &ApiContext, start: &str, end: Option<&str>) -> ApiResponse {
    let range = match validate_range(start, end) {
        Ok(range) => range,
        Err(response) => return response,
    };

    match ctx.store.temperature_stats(&range) {
        Ok(stats) => json_ok(&stats),
        Err(e) => store_failure("temperature stats", e),
    }
}

fn validate_range(start: &str, end: Option<&str>) -> Result<DateRange, ApiResponse> {
    let bad_date = |raw: &str, e: crate::dates::InvalidDate| {
        ApiResponse::json(400, json!({ "error": e.to_string(), "value": raw }))
    };

    let start_date = canonical_date(start).map_err(|e| bad_date(start, e))?;
    let end_date = match end {
        Some(raw) => Some(canonical_date(raw).map_err(|e| bad_date(raw, e))?),
        None => None,
    };

    Ok(DateRange { start: start_date, end: end_date })
}

fn json_ok<T: Serialize>(data: &T) -> ApiResponse {
    match serde_json::to_value(data) {
        Ok(value) => ApiResponse::json(200, value),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            internal_error()
        }
    }
}

fn store_failure(query: &str, e: StoreError) -> ApiResponse {
    error!("{} query failed: {}", query, e);
    internal_error()
}

fn internal_error() -> ApiResponse {
    ApiResponse::json(500, json!({ "error": "internal server error" }))
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("Failed to start HTTP server on {0}: {1}")]
    Bind(String, String),
}

/// Accept loop on the calling thread; requests are served by a worker pool.
pub struct EndpointServer {
    server: tiny_http::Server,
    context: Arc<ApiContext>,
    workers: ThreadPool,
}

impl EndpointServer {
    pub fn bind(address: &str, context: ApiContext, worker_threads: usize) -> Result<Self, EndpointError> {
        let server = tiny_http::Server::http(address)
            .map_err(|e| EndpointError::Bind(address.to_string(), e.to_string()))?;

        Ok(Self {
            server,
            context: Arc::new(context),
            workers: ThreadPool::with_name("climate-api-worker".to_string(), worker_threads.max(1)),
        })
    }

    /// Bound socket address; resolves port 0 to the port actually assigned.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serves requests until the listener shuts down.
    pub fn run(self) {
        for request in self.server.incoming_requests() {
            let context = Arc::clone(&self.context);
            self.workers.execute(move || serve_request(&context, request));
        }
        self.workers.join();
    }
}

fn serve_request(ctx: &ApiContext, request: tiny_http::Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let today = Local::now().date_naive();

    let response = handle_request(ctx, &method, &url, today);
    info!("{} {} -> {}", method, url, response.status);

    if let Err(e) = request.respond(into_http_response(response)) {
        warn!("Failed to send response: {}", e);
    }
}

/// Create HTTP response with JSON or HTML body
fn into_http_response(response: ApiResponse) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let (bytes, content_type) = match response.body {
        ResponseBody::Json(value) => (value.to_string().into_bytes(), "application/json"),
        ResponseBody::Html(body) => (body.into_bytes(), "text/html; charset=utf-8"),
    };

    let http_response = tiny_http::Response::from_data(bytes)
        .with_status_code(tiny_http::StatusCode::from(response.status));

    match tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        Ok(header) => http_response.with_header(header),
        Err(()) => http_response,
    }
}

/// Start HTTP endpoint server using the configured address and worker pool
pub fn start_endpoint_server(config: &ServiceConfig, store: Box<dyn ClimateStore>) -> Result<(), EndpointError> {
    let address = config.listen_address();
    let server = EndpointServer::bind(&address, ApiContext::new(store, config), config.worker_threads)?;

    info!("HTTP endpoint listening on http://{}", address);
    for endpoint in AVAILABLE_ENDPOINTS {
        info!("   GET {}", endpoint);
    }

    server.run();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
