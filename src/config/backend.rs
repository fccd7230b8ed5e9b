use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Backend endpoint and HTTP client tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// API root; every call path is joined onto it.
    /// TOML: `backend.base_url`. Default: `http://127.0.0.1:8000/api/v1/`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Optional HTTP proxy for the reqwest client.
    /// TOML: `backend.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Allow HTTP/2 multiplexing; disabled forces HTTP/1 with `Connection: close`.
    /// TOML: `backend.enable_multiplexing`. Default: `false`.
    #[serde(default)]
    pub enable_multiplexing: bool,

    /// TOML: `backend.connect_timeout_secs`. Default: `5`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request deadline for ordinary calls.
    /// TOML: `backend.request_timeout_secs`. Default: `30`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Deadline for `auth/refresh`; waiters are released with an error when it passes.
    /// TOML: `backend.refresh_timeout_secs`. Default: `15`.
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,

    /// TOML: `backend.user_agent`. Default: `schedule-client/<version>`.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            proxy: None,
            enable_multiplexing: false,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl BackendConfig {
    /// Config aimed at `base_url` with every other field at its default.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Default::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }
}

fn default_base_url() -> Url {
    Url::parse("http://127.0.0.1:8000/api/v1/").expect("default base url is valid")
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_refresh_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    concat!("schedule-client/", env!("CARGO_PKG_VERSION")).to_string()
}
