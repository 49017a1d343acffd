/**
 * UPSTREAM RELAY - forwards one proxy call to the college API
 *
 * Builds `{base_url}{endpoint}`, attaches the caller's session as the
 * upstream `Cookie`, adds the login-only headers on the login path, and
 * collects every `Set-Cookie` the upstream hands back so the HTTP layer can
 * expose them through `x-session-cookie`.
 */

use crate::config::UpstreamConf;
use crate::error::RelayError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use serde_json::Value;
use tracing::{debug, warn};

/// Header carrying the session cookie between caller and gateway, both ways.
pub const SESSION_HEADER: &str = "x-session-cookie";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMethod {
    Get,
    Post,
}

/// One call to forward.
#[derive(Debug, Clone)]
pub struct RelayCall {
    pub method: RelayMethod,
    /// Upstream path, ex: "/api/Timetable/get"
    pub endpoint: String,
    /// Only sent for POST.
    pub body: Option<Value>,
    pub session_cookie: Option<String>,
}

/// Successful upstream answer.
#[derive(Debug, Clone)]
pub struct Relayed {
    pub status: u16,
    pub body: Value,
    /// Raw `Set-Cookie` values, in upstream order.
    pub cookies: Vec<String>,
}

impl Relayed {
    /// Cookies joined with "; ", or `None` when upstream set none.
    pub fn joined_cookies(&self) -> Option<String> {
        if self.cookies.is_empty() {
            None
        } else {
            Some(self.cookies.join("; "))
        }
    }
}

#[derive(Clone)]
pub struct UpstreamRelay {
    client: reqwest::Client,
    upstream: UpstreamConf,
}

impl UpstreamRelay {
    pub fn new(upstream: UpstreamConf) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstream,
        }
    }

    pub fn upstream(&self) -> &UpstreamConf {
        &self.upstream
    }

    pub fn upstream_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.upstream.base_url, endpoint)
    }

    /// Headers sent upstream for this call.
    pub fn headers_for(&self, call: &RelayCall) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if call.method == RelayMethod::Post && call.endpoint == self.upstream.login_path {
            if let Ok(v) = HeaderValue::from_str(&self.upstream.app_version) {
                headers.insert("appversion", v);
            }
            if let Ok(v) = HeaderValue::from_str(&self.upstream.client_tz_offset) {
                headers.insert("clienttzofst", v);
            }
        }

        if let Some(cookie) = call.session_cookie.as_deref().filter(|c| !c.is_empty()) {
            match HeaderValue::from_str(cookie) {
                Ok(v) => {
                    headers.insert(COOKIE, v);
                }
                Err(_) => warn!("session cookie is not a valid header value, dropped"),
            }
        }
        headers
    }

    pub async fn relay(&self, call: &RelayCall) -> Result<Relayed, RelayError> {
        let url = self.upstream_url(&call.endpoint);
        let headers = self.headers_for(call);

        let request = match call.method {
            RelayMethod::Get => self.client.get(&url).headers(headers),
            RelayMethod::Post => {
                let body = call.body.clone().unwrap_or(Value::Null);
                self.client
                    .post(&url)
                    .headers(headers)
                    .body(serde_json::to_vec(&body)?)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status { status: status.as_u16() });
        }

        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        debug!(endpoint = %call.endpoint, cookies = cookies.len(), "upstream answered {status}");

        Ok(Relayed {
            status: status.as_u16(),
            body,
            cookies,
        })
    }
}
