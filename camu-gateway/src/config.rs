use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

pub const DEFAULT_UPSTREAM: &str = "https://www.mycamu.co.in";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// Socket address the relay binds, ex: "0.0.0.0:3000"
    pub listen: String,
    pub upstream: UpstreamConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConf {
    /// Scheme + host of the college API, no trailing slash
    pub base_url: String,
    /// Endpoint that receives the extra login headers
    pub login_path: String,
    /// Sent as `appversion` on the login call
    pub app_version: String,
    /// Sent as `clienttzofst` on the login call (minutes east of UTC)
    pub client_tz_offset: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".into(),
            upstream: UpstreamConf::default(),
        }
    }
}

impl Default for UpstreamConf {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM.into(),
            login_path: "/login/validate".into(),
            app_version: "v1".into(),
            client_tz_offset: "330".into(),
        }
    }
}

impl GatewayConfig {
    /// Config pointing at another upstream, everything else default.
    pub fn with_upstream(base_url: impl Into<String>) -> Self {
        let mut cfg = Self::default();
        cfg.upstream.base_url = base_url.into();
        cfg
    }

    fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var("CAMU_UPSTREAM_URL") {
            if !url.trim().is_empty() {
                self.upstream.base_url = url.trim().to_string();
            }
        }
        self.upstream.base_url = self.upstream.base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Parses YAML text; empty text means defaults.
pub fn parse_config(txt: &str) -> Result<GatewayConfig, serde_yaml::Error> {
    if txt.trim().is_empty() {
        return Ok(GatewayConfig::default());
    }
    serde_yaml::from_str(txt)
}

pub async fn load_config() -> GatewayConfig {
    let path = std::env::var("CAMU_GATEWAY_CONFIG").unwrap_or_else(|_| "gateway.yaml".into());
    let cfg = if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        parse_config(&txt).unwrap_or_else(|e| {
            warn!("invalid config {path}: {e}, using defaults");
            GatewayConfig::default()
        })
    } else {
        info!("no {path}, using default config");
        GatewayConfig::default()
    };
    cfg.apply_env()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.listen, "0.0.0.0:3000");
        assert_eq!(cfg.upstream.base_url, DEFAULT_UPSTREAM);
        assert_eq!(cfg.upstream.login_path, "/login/validate");
        assert_eq!(cfg.upstream.app_version, "v1");
        assert_eq!(cfg.upstream.client_tz_offset, "330");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = parse_config("upstream:\n  base_url: http://localhost:9999\n").unwrap();
        assert_eq!(cfg.upstream.base_url, "http://localhost:9999");
        assert_eq!(cfg.upstream.app_version, "v1");
        assert_eq!(cfg.listen, "0.0.0.0:3000");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let cfg = parse_config("   \n").unwrap();
        assert_eq!(cfg.upstream.login_path, "/login/validate");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(parse_config("listen: [unterminated").is_err());
    }
}
