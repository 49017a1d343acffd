//! Transport to the same-origin gateway
//!
//! The domain client never talks to the college API directly: every call
//! goes through `GET|POST {gateway}/api/proxy?endpoint=<path>`. The session
//! cookie travels in the `x-session-cookie` header both ways; that header is
//! an adapter detail and stays in this module.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tracing::debug;

const PROXY_PATH: &str = "/api/proxy";
const SESSION_HEADER: &str = "x-session-cookie";

/// Opaque session cookie text. Never parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: Method,
    /// Upstream path, ex: "/api/Timetable/get"
    pub endpoint: String,
    pub body: Option<Value>,
    pub session: Option<SessionToken>,
}

impl GatewayRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            body: None,
            session: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            body: Some(body),
            session: None,
        }
    }

    pub fn with_session(mut self, session: Option<&SessionToken>) -> Self {
        self.session = session.cloned();
        self
    }
}

#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub status: u16,
    /// Cookies relayed by the gateway, joined.
    pub session: Option<SessionToken>,
    pub body: Value,
}

impl GatewayReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("gateway unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("gateway returned a non-JSON body: {0}")]
    Body(#[from] serde_json::Error),
}

#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn send(&self, request: GatewayRequest) -> Result<GatewayReply, TransportError>;
}

/// reqwest-backed transport pointed at a running gateway.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn proxy_url(&self) -> String {
        format!("{}{}", self.base_url, PROXY_PATH)
    }
}

#[async_trait]
impl GatewayTransport for HttpGateway {
    async fn send(&self, request: GatewayRequest) -> Result<GatewayReply, TransportError> {
        let url = self.proxy_url();
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self
                .client
                .post(&url)
                .json(request.body.as_ref().unwrap_or(&Value::Null)),
        };
        builder = builder.query(&[("endpoint", request.endpoint.as_str())]);
        if let Some(session) = &request.session {
            builder = builder.header(SESSION_HEADER, session.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        let session = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(SessionToken::new);

        let bytes = response.bytes().await?;
        let body = match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => return Err(e.into()),
        };
        debug!(endpoint = %request.endpoint, "gateway answered {status}");

        Ok(GatewayReply {
            status: status.as_u16(),
            session,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proxy_url_ignores_trailing_slash() {
        assert_eq!(
            HttpGateway::new("http://127.0.0.1:3000/").proxy_url(),
            "http://127.0.0.1:3000/api/proxy"
        );
    }

    #[test]
    fn test_session_token_debug_hides_value() {
        let token = SessionToken::new("connect.sid=secret");
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(token.as_str(), "connect.sid=secret");
    }

    #[test]
    fn test_request_builders() {
        let token = SessionToken::new("a=b");
        let post = GatewayRequest::post("/api/x", json!({"k": 1})).with_session(Some(&token));
        assert_eq!(post.method, Method::Post);
        assert_eq!(post.session, Some(token));

        let get = GatewayRequest::get("/api/y").with_session(None);
        assert_eq!(get.method, Method::Get);
        assert!(get.body.is_none());
        assert!(get.session.is_none());
    }
}
