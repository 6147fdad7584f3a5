/// HTTP endpoint for the alert dashboard
///
/// Provides a small JSON API over the daemon state so a front end (or curl)
/// can read the national picture and drill into a single city.
///
/// Endpoints:
/// - GET /health - Service health check
/// - GET /cities - City registry, grouped
/// - GET /city/{name} - Four-day detail for one city
/// - GET /city - Detail for the default city
/// - GET /alerts/national - Latest published national report
/// - POST /refresh - Trigger a national refresh

use crate::daemon::Daemon;
use serde::Serialize;
use tiny_http::Method;

const SERVICE_NAME: &str = "dzmeteo_service";

const AVAILABLE_ENDPOINTS: [&str; 6] = [
    "GET /health",
    "GET /cities",
    "GET /city",
    "GET /city/{name}",
    "GET /alerts/national",
    "POST /refresh",
];

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Status code and JSON body, independent of the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    fn json<T: Serialize>(status: u16, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(body) => Self::new(status, body),
            Err(e) => Self::new(
                500,
                serde_json::json!({ "error": format!("Failed to serialize response: {}", e) }),
            ),
        }
    }
}

/// Maps a request to a response. Query strings are ignored.
pub fn route(daemon: &Daemon, method: &Method, url: &str) -> ApiResponse {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (Method::Get, "/health") => handle_health(daemon),
        (Method::Get, "/cities") => ApiResponse::json(200, daemon.registry()),
        (Method::Get, "/alerts/national") => handle_national(daemon),
        (Method::Post, "/refresh") => handle_refresh(daemon),
        (Method::Get, "/city") => handle_city(daemon, ""),
        (Method::Get, p) if p.starts_with("/city/") => {
            handle_city(daemon, p.trim_start_matches("/city/"))
        }
        _ => ApiResponse::new(
            404,
            serde_json::json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS
            }),
        ),
    }
}

/// Handle /health endpoint
fn handle_health(daemon: &Daemon) -> ApiResponse {
    ApiResponse::new(
        200,
        serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "thresholds": daemon.classifier().thresholds()
        }),
    )
}

/// Handle /city/{name} endpoint; an empty name means the default city.
fn handle_city(daemon: &Daemon, raw_name: &str) -> ApiResponse {
    let name = urlencoding::decode(raw_name)
        .map(|n| n.into_owned())
        .unwrap_or_else(|_| raw_name.to_string());

    let found = if name.trim().is_empty() {
        daemon.registry().default_city()
    } else {
        daemon.registry().find(&name)
    };
    let Some(city) = found else {
        return ApiResponse::new(
            404,
            serde_json::json!({
                "error": format!("City {} not found in registry", name),
                "city": name
            }),
        );
    };

    match daemon.city_detail(city) {
        Ok(detail) => ApiResponse::json(200, &detail),
        Err(failure) => ApiResponse::new(
            502,
            serde_json::json!({
                "error": failure.message,
                "city": failure.city
            }),
        ),
    }
}

/// Handle /alerts/national endpoint
fn handle_national(daemon: &Daemon) -> ApiResponse {
    let Some(latest) = daemon.latest_report() else {
        return ApiResponse::new(
            503,
            serde_json::json!({ "error": "No national report published yet" }),
        );
    };

    let report = &latest.value;
    let buckets = report.partition();
    ApiResponse::new(
        200,
        serde_json::json!({
            "generation": latest.generation,
            "generated_at": report.generated_at,
            "national_level": buckets.national_level(),
            "counts": {
                "red": buckets.red.len(),
                "orange": buckets.orange.len(),
                "ok": buckets.ok.len(),
                "failed": report.failures.len()
            },
            "red": buckets.red,
            "orange": buckets.orange,
            "ok": buckets.ok,
            "failures": report.failures
        }),
    )
}

/// Handle POST /refresh endpoint
fn handle_refresh(daemon: &Daemon) -> ApiResponse {
    let ticket = daemon.trigger_refresh();
    ApiResponse::new(202, serde_json::json!({ "generation": ticket.generation() }))
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on the specified port (blocks).
pub fn start_endpoint_server(port: u16, daemon: Daemon) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    tracing::info!(port, "HTTP endpoint listening");
    serve(&server, &daemon);
    Ok(())
}

/// Answers requests from `server` until it shuts down.
pub fn serve(server: &tiny_http::Server, daemon: &Daemon) {
    for request in server.incoming_requests() {
        let api = route(daemon, request.method(), request.url());
        tracing::debug!(method = %request.method(), url = request.url(), status = api.status, "request");

        if let Err(e) = request.respond(create_response(api.status, api.body)) {
            tracing::warn!(error = %e, "failed to send response");
        }
    }
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: serde_json::Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string());

    let response = tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(status_code));
    match tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
