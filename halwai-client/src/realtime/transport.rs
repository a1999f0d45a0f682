use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::RealtimeError;
use super::protocol::{EnginePacket, OpenPayload, SocketPacket};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport abstraction for Engine.IO text frames
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Next text frame; `Ok(None)` once the peer has closed
    async fn read_frame(&self) -> Result<Option<String>, RealtimeError>;
    async fn write_frame(&self, frame: &str) -> Result<(), RealtimeError>;
    async fn close(&self) -> Result<(), RealtimeError>;
}

/// Opens transports to a realtime endpoint
#[async_trait]
pub trait Connector: Send + Sync + std::fmt::Debug {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, RealtimeError>;
}

// ============================================================================
// WebSocket
// ============================================================================

/// WebSocket Transport Implementation
#[derive(Debug, Clone)]
pub struct WsTransport {
    reader: Arc<Mutex<SplitStream<WsStream>>>,
    writer: Arc<Mutex<SplitSink<WsStream, Message>>>,
}

impl WsTransport {
    pub async fn connect(url: &str) -> Result<Self, RealtimeError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (writer, reader) = stream.split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn read_frame(&self) -> Result<Option<String>, RealtimeError> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "WebSocket closed by server");
                    return Ok(None);
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::warn!(len = data.len(), "Ignoring binary WebSocket frame");
                }
                // ping/pong 由 tungstenite 自动处理
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(None),
            }
        }
    }

    async fn write_frame(&self, frame: &str) -> Result<(), RealtimeError> {
        let mut writer = self.writer.lock().await;
        writer.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), RealtimeError> {
        let mut writer = self.writer.lock().await;
        writer.close().await?;
        Ok(())
    }
}

/// Connects over tokio-tungstenite (ws:// or wss://)
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, RealtimeError> {
        Ok(Box::new(WsTransport::connect(url).await?))
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Client half of an in-memory connection
#[derive(Debug)]
pub struct MemoryTransport {
    /// Frames FROM the server
    rx: Mutex<mpsc::UnboundedReceiver<String>>,
    /// Frames TO the server
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_frame(&self) -> Result<Option<String>, RealtimeError> {
        let mut rx = self.rx.lock().await;
        Ok(rx.recv().await)
    }

    async fn write_frame(&self, frame: &str) -> Result<(), RealtimeError> {
        self.tx
            .send(frame.to_string())
            .map_err(|_| RealtimeError::Closed)
    }

    async fn close(&self) -> Result<(), RealtimeError> {
        self.rx.lock().await.close();
        Ok(())
    }
}

/// Server half of an in-memory connection
///
/// Dropping the peer closes the connection from the client's point of view.
#[derive(Debug)]
pub struct MemoryPeer {
    /// The URL the client asked for
    pub url: String,
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    pub const DEFAULT_PING_INTERVAL_MS: u64 = 25_000;
    pub const DEFAULT_PING_TIMEOUT_MS: u64 = 20_000;

    /// Send a raw Engine.IO frame
    pub fn send_raw(&self, frame: impl Into<String>) -> bool {
        self.tx.send(frame.into()).is_ok()
    }

    /// Next frame sent by the client; `None` once the client is gone
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Complete the Engine.IO / Socket.IO handshake with default ping settings
    pub async fn accept_handshake(&mut self, sid: &str) -> bool {
        self.accept_handshake_with(
            sid,
            Self::DEFAULT_PING_INTERVAL_MS,
            Self::DEFAULT_PING_TIMEOUT_MS,
        )
        .await
    }

    pub async fn accept_handshake_with(
        &mut self,
        sid: &str,
        ping_interval: u64,
        ping_timeout: u64,
    ) -> bool {
        let open = EnginePacket::Open(OpenPayload {
            sid: sid.to_string(),
            upgrades: Vec::new(),
            ping_interval,
            ping_timeout,
            max_payload: Some(1_000_000),
        });
        if !self.send_raw(open.encode()) {
            return false;
        }

        match self.recv().await {
            Some(frame) if frame.starts_with("40") => {}
            _ => return false,
        }

        let ack = SocketPacket::Connect {
            nsp: "/".to_string(),
            data: Some(serde_json::json!({ "sid": format!("{sid}-socket") })),
        };
        self.send_raw(ack.to_frame())
    }

    /// Emit an event on the default namespace
    pub fn emit(&self, event: &str, payload: serde_json::Value) -> bool {
        let packet = SocketPacket::Event {
            nsp: "/".to_string(),
            id: None,
            name: event.to_string(),
            args: vec![payload],
        };
        self.send_raw(packet.to_frame())
    }

    pub fn ping(&self) -> bool {
        self.send_raw(EnginePacket::Ping(String::new()).encode())
    }
}

/// Connector handing every connection's server half to a [`MemoryAcceptor`]
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
}

/// Receives the server half of each connection made through a [`MemoryConnector`]
#[derive(Debug)]
pub struct MemoryAcceptor {
    peers: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryAcceptor {
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.peers.recv().await
    }
}

impl MemoryConnector {
    pub fn new() -> (Self, MemoryAcceptor) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { peers: tx }, MemoryAcceptor { peers: rx })
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, RealtimeError> {
        let (to_client, client_rx) = mpsc::unbounded_channel();
        let (to_server, server_rx) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            url: url.to_string(),
            tx: to_client,
            rx: server_rx,
        };
        self.peers
            .send(peer)
            .map_err(|_| RealtimeError::Connection("connection refused".into()))?;

        Ok(Box::new(MemoryTransport {
            rx: Mutex::new(client_rx),
            tx: to_server,
        }))
    }
}
