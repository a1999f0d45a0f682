// halwai-client/src/realtime/mod.rs
// 实时模块 - Socket.IO 客户端配置、连接状态和错误类型

pub mod client;
pub mod protocol;
pub mod registry;
pub mod transport;

pub use client::RealtimeClient;
pub use protocol::{EnginePacket, OpenPayload, ProtocolError, SocketPacket};
pub use registry::{Registry, Subscriber, Subscription};
pub use transport::{
    Connector, MemoryAcceptor, MemoryConnector, MemoryPeer, Transport, WsConnector,
};

use shared::ErrorCode;
use std::time::Duration;
use thiserror::Error;

use crate::config::{DEFAULT_SERVER_URL, DEFAULT_SOCKET_PATH};

/// 实时连接配置
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// 服务器地址 (http/https/ws/wss)
    pub url: String,
    /// Socket.IO 路径
    pub path: String,
    /// 命名空间
    pub namespace: String,
    /// 是否启用自动重连
    pub reconnection: bool,
    /// 重连延迟 (固定, 不做指数退避)
    pub reconnect_delay: Duration,
    /// 最大重连尝试次数 (0 表示无限重试)
    pub max_reconnect_attempts: u32,
    /// 单次连接 (含握手) 超时
    pub connect_timeout: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

impl RealtimeConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: DEFAULT_SOCKET_PATH.to_string(),
            namespace: "/".to_string(),
            reconnection: true,
            reconnect_delay: Duration::from_millis(1000),
            max_reconnect_attempts: 0,
            connect_timeout: Duration::from_millis(20_000),
        }
    }

    /// 设置 Socket.IO 路径
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// 设置命名空间
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// 设置自动重连
    pub fn with_reconnection(mut self, enabled: bool) -> Self {
        self.reconnection = enabled;
        self
    }

    /// 设置重连延迟
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// 设置最大重连尝试次数 (0 表示无限重试)
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// 设置连接超时
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Engine.IO v4 WebSocket endpoint
    ///
    /// `http://host:8000` + `/mrh-backend/socket.io` becomes
    /// `ws://host:8000/mrh-backend/socket.io/?EIO=4&transport=websocket`.
    pub fn endpoint(&self) -> String {
        let base = self
            .url
            .trim_end_matches('/')
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        let path = self.path.trim_matches('/');
        format!("{base}/{path}/?EIO=4&transport=websocket")
    }

    /// Whether another attempt is allowed after `failures` consecutive failures
    pub fn allows_retry(&self, failures: u32) -> bool {
        self.reconnection
            && (self.max_reconnect_attempts == 0 || failures < self.max_reconnect_attempts)
    }
}

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// 实时连接错误
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Namespace connect rejected: {0}")]
    Rejected(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Connection closed")]
    Closed,
}

impl RealtimeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Protocol(_) | Self::Handshake(_) => ErrorCode::ProtocolError,
            Self::Closed => ErrorCode::ConnectionLost,
            Self::Connection(_) | Self::Timeout(_) | Self::Rejected(_) => ErrorCode::NetworkError,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RealtimeError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::Closed,
            other => Self::Connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RealtimeConfig::default();
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(20));
        assert_eq!(config.max_reconnect_attempts, 0);
        assert!(config.reconnection);
        assert_eq!(config.namespace, "/");
    }

    #[test]
    fn test_endpoint() {
        let config = RealtimeConfig::new("http://localhost:8000/");
        assert_eq!(
            config.endpoint(),
            "ws://localhost:8000/mrh-backend/socket.io/?EIO=4&transport=websocket"
        );

        let config = RealtimeConfig::new("https://api.mrhalwai.in").with_path("/socket.io/");
        assert_eq!(
            config.endpoint(),
            "wss://api.mrhalwai.in/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_allows_retry() {
        let unlimited = RealtimeConfig::default();
        assert!(unlimited.allows_retry(10_000));

        let limited = RealtimeConfig::default().with_max_reconnect_attempts(3);
        assert!(limited.allows_retry(2));
        assert!(!limited.allows_retry(3));

        let off = RealtimeConfig::default().with_reconnection(false);
        assert!(!off.allows_retry(0));
    }
}
