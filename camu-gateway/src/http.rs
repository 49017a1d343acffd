/**
 * GATEWAY HTTP API - same-origin relay in front of the college API
 *
 * ROUTES:
 * - GET  /health                     liveness, always "ok"
 * - GET  /system/health              counters + upstream in use
 * - GET  /api/proxy?endpoint=<path>  relay without body
 * - POST /api/proxy?endpoint=<path>  relay with JSON body
 *
 * The caller's `x-session-cookie` header becomes the upstream `Cookie`;
 * upstream `Set-Cookie` values come back joined in `x-session-cookie`.
 * Missing endpoint => 400, any upstream trouble => generic 500.
 */

use crate::error::GatewayError;
use crate::health::{GatewayHealth, HealthTracker};
use crate::proxy::{RelayCall, RelayMethod, UpstreamRelay, SESSION_HEADER};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<UpstreamRelay>,
    pub health: HealthTracker,
}

impl AppState {
    pub fn new(relay: UpstreamRelay) -> Self {
        Self {
            relay: Arc::new(relay),
            health: HealthTracker::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProxyParams {
    endpoint: Option<String>,
}

impl ProxyParams {
    fn endpoint(self) -> Option<String> {
        self.endpoint.filter(|e| !e.is_empty())
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/api/proxy", get(proxy_get).post(proxy_post))
        .with_state(app_state)
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<GatewayHealth> {
    Json(app.health.get_health(&app.relay.upstream().base_url))
}

// GET /api/proxy?endpoint=...
async fn proxy_get(
    State(app): State<AppState>,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let Some(endpoint) = params.endpoint() else {
        app.health.record_rejected();
        return Err(GatewayError::MissingEndpoint);
    };

    let call = RelayCall {
        method: RelayMethod::Get,
        endpoint,
        body: None,
        session_cookie: session_cookie(&headers),
    };
    forward(&app, call).await
}

// POST /api/proxy?endpoint=...
async fn proxy_post(
    State(app): State<AppState>,
    Query(params): Query<ProxyParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let Some(endpoint) = params.endpoint() else {
        app.health.record_rejected();
        return Err(GatewayError::MissingEndpoint);
    };

    let Ok(body) = serde_json::from_slice::<Value>(&body) else {
        app.health.record_rejected();
        return Err(GatewayError::MalformedBody);
    };

    let call = RelayCall {
        method: RelayMethod::Post,
        endpoint,
        body: Some(body),
        session_cookie: session_cookie(&headers),
    };
    forward(&app, call).await
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn forward(app: &AppState, call: RelayCall) -> Result<Response, GatewayError> {
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        method = ?call.method,
        endpoint = %call.endpoint,
        cookie = call.session_cookie.is_some(),
        "proxying to {}",
        app.relay.upstream_url(&call.endpoint)
    );

    let relayed = match app.relay.relay(&call).await {
        Ok(relayed) => relayed,
        Err(e) => {
            error!(%request_id, endpoint = %call.endpoint, "upstream call failed: {e}");
            app.health.record_upstream_failure(&e.to_string());
            return Err(e.into());
        }
    };
    app.health.record_relayed();

    let joined = relayed.joined_cookies();
    let mut response = Json(relayed.body).into_response();
    if let Some(joined) = joined {
        match HeaderValue::from_str(&joined) {
            Ok(value) => {
                info!(%request_id, count = relayed.cookies.len(), "relaying session cookies");
                response.headers_mut().insert(SESSION_HEADER, value);
            }
            Err(_) => warn!(%request_id, "upstream cookies are not a valid header value, dropped"),
        }
    }
    Ok(response)
}
