/*!
Recording stub of the upstream college API

Stands in for the third-party host during tests. Every request is recorded
(method, path, headers, JSON body) and answered with a scripted reply, so
tests can assert both what the gateway forwarded and how it relayed the
answer back.
*/

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A request as seen by the stubbed upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Scripted answer for a path.
#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub set_cookies: Vec<String>,
}

impl StubReply {
    /// 200 with the given JSON body.
    pub fn json(body: Value) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            set_cookies: Vec::new(),
        }
    }

    /// Reply whose body is not JSON (e.g. an HTML error page).
    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            set_cookies: Vec::new(),
        }
    }

    /// Adds one `Set-Cookie` header; call repeatedly for several cookies.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.set_cookies.push(cookie.into());
        self
    }
}

#[derive(Debug, Clone)]
enum PathMatch {
    Exact(String),
    Prefix(String),
}

impl PathMatch {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatch::Exact(p) => p == path,
            PathMatch::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

#[derive(Clone, Default)]
struct StubState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    routes: Arc<Mutex<Vec<(PathMatch, StubReply)>>>,
}

/// In-process fake of the upstream host, bound to `127.0.0.1:0`.
pub struct UpstreamStub {
    addr: SocketAddr,
    state: StubState,
    handle: JoinHandle<()>,
}

impl UpstreamStub {
    /// Starts the stub; unscripted paths answer 404.
    pub async fn start() -> Result<Self> {
        let state = StubState::default();
        let app = Router::new().fallback(record).with_state(state.clone());
        let (addr, handle) = crate::test_utils::serve(app).await?;
        log::info!("[stub] upstream listening on {addr}");
        Ok(Self { addr, state, handle })
    }

    /// Base URL to configure as the gateway's upstream.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Scripts the reply for an exact path. Later scripts win.
    pub fn reply(&self, path: &str, reply: StubReply) -> &Self {
        self.state
            .routes
            .lock()
            .push((PathMatch::Exact(path.to_string()), reply));
        self
    }

    /// Scripts the reply for every path starting with `prefix`.
    pub fn reply_prefix(&self, prefix: &str, reply: StubReply) -> &Self {
        self.state
            .routes
            .lock()
            .push((PathMatch::Prefix(prefix.to_string()), reply));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Requests whose path starts with `prefix`.
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    /// Forgets recorded requests, keeps the scripted replies.
    pub fn clear_requests(&self) {
        self.state.requests.lock().clear();
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body: serde_json::from_slice(&body).ok(),
    };
    log::debug!("[stub] {} {}", recorded.method, recorded.path);
    state.requests.lock().push(recorded);

    let scripted = state
        .routes
        .lock()
        .iter()
        .rev()
        .find(|(m, _)| m.matches(&path))
        .map(|(_, reply)| reply.clone());

    let Some(reply) = scripted else {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"error":"not stubbed"}"#,
        )
            .into_response();
    };

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response();
    for cookie in &reply.set_cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
