//! Client configuration
//!
//! Environment variables (all optional):
//!
//! | Variable | Default |
//! |---|---|
//! | `HALWAI_BACKEND_URL` / `NEXT_PUBLIC_BACKEND_URL` | `http://localhost:8000` |
//! | `HALWAI_SOCKET_URL` / `NEXT_PUBLIC_SOCKET_URL` | `http://localhost:8000` |
//! | `HALWAI_SOCKET_PATH` | `/mrh-backend/socket.io` |
//! | `HALWAI_CONNECT_TIMEOUT_MS` | `20000` |
//! | `HALWAI_RECONNECT_DELAY_MS` | `1000` |
//! | `HALWAI_MAX_RECONNECT_ATTEMPTS` | `0` (unlimited) |
//! | `HALWAI_REQUEST_TIMEOUT_SECS` | unset (no timeout) |
//! | `HALWAI_STATE_DIR` | `./.halwai` |

use std::path::PathBuf;
use std::time::Duration;

use crate::realtime::RealtimeConfig;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_SOCKET_PATH: &str = "/mrh-backend/socket.io";
pub const DEFAULT_STATE_DIR: &str = "./.halwai";

/// Client configuration for the admin backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL (e.g., "http://localhost:8000")
    pub backend_url: String,

    /// Request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,

    /// Realtime connection settings
    pub realtime: RealtimeConfig,

    /// Directory holding local state (active branch)
    pub state_dir: PathBuf,
}

impl ClientConfig {
    /// Create a configuration with REST and realtime on the same origin
    pub fn new(backend_url: impl Into<String>) -> Self {
        let backend_url = backend_url.into();
        Self {
            realtime: RealtimeConfig::new(backend_url.clone()),
            backend_url,
            request_timeout: None,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let backend_url = env_string(&["HALWAI_BACKEND_URL", "NEXT_PUBLIC_BACKEND_URL"])
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let socket_url = env_string(&["HALWAI_SOCKET_URL", "NEXT_PUBLIC_SOCKET_URL"])
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let mut realtime = RealtimeConfig::new(socket_url);
        if let Some(path) = env_string(&["HALWAI_SOCKET_PATH"]) {
            realtime = realtime.with_path(path);
        }
        if let Some(ms) = env_parse::<u64>("HALWAI_CONNECT_TIMEOUT_MS") {
            realtime = realtime.with_connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = env_parse::<u64>("HALWAI_RECONNECT_DELAY_MS") {
            realtime = realtime.with_reconnect_delay(Duration::from_millis(ms));
        }
        if let Some(attempts) = env_parse::<u32>("HALWAI_MAX_RECONNECT_ATTEMPTS") {
            realtime = realtime.with_max_reconnect_attempts(attempts);
        }

        Self {
            backend_url,
            request_timeout: env_parse::<u64>("HALWAI_REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs),
            realtime,
            state_dir: env_string(&["HALWAI_STATE_DIR"])
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
        }
    }

    /// Set the REST base URL
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Set the realtime server URL
    pub fn with_socket_url(mut self, url: impl Into<String>) -> Self {
        self.realtime.url = url.into();
        self
    }

    /// Replace the realtime settings
    pub fn with_realtime(mut self, realtime: RealtimeConfig) -> Self {
        self.realtime = realtime;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the local state directory
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> crate::ClientResult<crate::HttpClient> {
        crate::HttpClient::new(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

/// First non-empty value among `keys`
fn env_string(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
