//! Scripted in-memory transport for unit tests.

use crate::gateway::{GatewayReply, GatewayRequest, GatewayTransport, SessionToken, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

enum Matcher {
    Exact(String),
    Prefix(String),
}

impl Matcher {
    fn matches(&self, endpoint: &str) -> bool {
        match self {
            Matcher::Exact(path) => endpoint == path,
            Matcher::Prefix(prefix) => endpoint.starts_with(prefix.as_str()),
        }
    }
}

#[derive(Clone)]
enum Outcome {
    Reply {
        status: u16,
        body: Value,
        session: Option<String>,
    },
    /// Gateway answered something that is not JSON.
    Garbage,
}

/// Answers by endpoint, records every request. Later scripts win; anything
/// unscripted gets a 404.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<Vec<(Matcher, Outcome)>>,
    requests: Mutex<Vec<GatewayRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, matcher: Matcher, outcome: Outcome) {
        self.scripts.lock().push((matcher, outcome));
    }

    pub fn reply(&self, endpoint: &str, body: Value) {
        self.script(
            Matcher::Exact(endpoint.into()),
            Outcome::Reply {
                status: 200,
                body,
                session: None,
            },
        );
    }

    pub fn reply_prefix(&self, prefix: &str, body: Value) {
        self.script(
            Matcher::Prefix(prefix.into()),
            Outcome::Reply {
                status: 200,
                body,
                session: None,
            },
        );
    }

    pub fn reply_with_session(&self, endpoint: &str, body: Value, cookie: &str) {
        self.script(
            Matcher::Exact(endpoint.into()),
            Outcome::Reply {
                status: 200,
                body,
                session: Some(cookie.into()),
            },
        );
    }

    /// The gateway's own failure body with the given status.
    pub fn reply_status(&self, endpoint: &str, status: u16) {
        self.script(
            Matcher::Exact(endpoint.into()),
            Outcome::Reply {
                status,
                body: json!({ "error": "Failed to fetch data" }),
                session: None,
            },
        );
    }

    pub fn reply_garbage(&self, endpoint: &str) {
        self.script(Matcher::Exact(endpoint.into()), Outcome::Garbage);
    }

    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<GatewayRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.endpoint.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GatewayTransport for ScriptedGateway {
    async fn send(&self, request: GatewayRequest) -> Result<GatewayReply, TransportError> {
        // lets concurrently polled callers observe an in-flight request
        tokio::task::yield_now().await;
        let outcome = self
            .scripts
            .lock()
            .iter()
            .rev()
            .find(|(matcher, _)| matcher.matches(&request.endpoint))
            .map(|(_, outcome)| outcome.clone());
        self.requests.lock().push(request);

        match outcome {
            Some(Outcome::Reply { status, body, session }) => Ok(GatewayReply {
                status,
                session: session.map(SessionToken::new),
                body,
            }),
            Some(Outcome::Garbage) => match serde_json::from_str::<Value>("<html>") {
                Ok(body) => Ok(GatewayReply {
                    status: 200,
                    session: None,
                    body,
                }),
                Err(e) => Err(TransportError::Body(e)),
            },
            None => Ok(GatewayReply {
                status: 404,
                session: None,
                body: json!({ "error": "not scripted" }),
            }),
        }
    }
}
