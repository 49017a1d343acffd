//! camu gateway - same-origin relay between the portal and the college API.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod proxy;

pub use config::{load_config, GatewayConfig, UpstreamConf};
pub use error::{GatewayError, RelayError};
pub use http::{build_router, AppState};
pub use proxy::{RelayCall, RelayMethod, Relayed, UpstreamRelay, SESSION_HEADER};
