use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Failures while talking to the upstream host. Never shown to callers.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("upstream unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream answered {status}")]
    Status { status: u16 },

    #[error("upstream body is not JSON: {0}")]
    Body(#[from] serde_json::Error),
}

/// Errors returned by the `/api/proxy` handlers.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Endpoint parameter is required")]
    MissingEndpoint,

    #[error("Malformed JSON body")]
    MalformedBody,

    /// Upstream detail stays server side.
    #[error("Failed to fetch data")]
    Upstream(#[from] RelayError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingEndpoint | GatewayError::MalformedBody => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
