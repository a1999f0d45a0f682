//! Socket.IO 实时客户端
//!
//! 由组合根 (`AdminSession`) 显式创建和持有, 不存在全局单例。
//!
//! ```text
//! connect()
//!   └── run loop (tokio task)
//!         ├── Connecting: open packet → "40" → "40{sid}"
//!         ├── Connected:  dispatch Connect, 读帧 / ping 看门狗 / 分发事件
//!         ├── 断开:       dispatch Disconnect{reason}
//!         └── 固定延迟后重连 (max_reconnect_attempts = 0 表示无限)
//! ```

use parking_lot::Mutex;
use serde_json::Value;
use shared::message::RealtimeEvent;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::protocol::{EnginePacket, OpenPayload, SocketPacket, connect_error_message};
use super::transport::{Connector, Transport, WsConnector};
use super::{ConnectionState, RealtimeConfig, RealtimeError, Registry, Subscriber};

/// Disconnect reasons, as reported by socket.io clients
pub const REASON_CLIENT_DISCONNECT: &str = "io client disconnect";
pub const REASON_SERVER_DISCONNECT: &str = "io server disconnect";
pub const REASON_TRANSPORT_CLOSE: &str = "transport close";
pub const REASON_TRANSPORT_ERROR: &str = "transport error";
pub const REASON_PING_TIMEOUT: &str = "ping timeout";

/// Realtime client owning one Socket.IO connection
#[derive(Debug)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: RealtimeConfig,
    connector: Arc<dyn Connector>,
    registry: Registry,
    state_tx: watch::Sender<ConnectionState>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

/// An established Socket.IO session
struct Session {
    transport: Box<dyn Transport>,
    open: OpenPayload,
    sid: Option<String>,
}

enum Flow {
    Continue,
    Pinged,
    Close(String),
}

impl RealtimeClient {
    /// Create a client connecting over WebSocket
    pub fn new(config: RealtimeConfig) -> Self {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Create a client using a custom connector (e.g. in-memory for tests)
    pub fn with_connector(config: RealtimeConfig, connector: Arc<dyn Connector>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                registry: Registry::new(),
                state_tx,
                task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// New logical subscriber on this connection
    pub fn subscriber(&self) -> Subscriber {
        self.inner.registry.subscriber()
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Whether the background connection task is alive
    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    /// Start the connection task (no-op while one is running)
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        let mut task = self.inner.task.lock();
        if let Some((_, handle)) = task.as_ref()
            && !handle.is_finished()
        {
            tracing::debug!("Realtime client already running");
            return;
        }

        let shutdown = CancellationToken::new();
        let inner = self.inner.clone();
        let token = shutdown.clone();
        let handle = tokio::spawn(async move { inner.run(token).await });
        *task = Some((shutdown, handle));
    }

    /// Stop the connection task and wait for it to finish
    pub async fn disconnect(&self) {
        let task = self.inner.task.lock().take();
        if let Some((shutdown, handle)) = task {
            shutdown.cancel();
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Realtime task ended abnormally");
            }
        }
        self.inner.set_state(ConnectionState::Disconnected);
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        // 任务持有 Inner 的 Arc, 必须显式取消
        if let Some((shutdown, _)) = self.inner.task.lock().take() {
            shutdown.cancel();
        }
    }
}

impl Inner {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(?previous, current = ?state, "Realtime state changed");
        }
    }

    async fn run(&self, shutdown: CancellationToken) {
        let url = self.config.endpoint();
        let mut failures: u32 = 0;
        tracing::info!(url = %url, "Realtime client starting");

        loop {
            self.set_state(ConnectionState::Connecting);

            let attempt = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = tokio::time::timeout(
                    self.config.connect_timeout,
                    self.open_session(&url),
                ) => result,
            };

            match attempt {
                Ok(Ok(session)) => {
                    failures = 0;
                    self.set_state(ConnectionState::Connected);
                    tracing::info!(
                        sid = session.sid.as_deref().unwrap_or(&session.open.sid),
                        "Realtime connected"
                    );
                    self.registry.dispatch(&RealtimeEvent::Connect);

                    let reason = self.run_session(&session, &shutdown).await;
                    tracing::info!(reason = %reason, "Realtime disconnected");
                    self.set_state(ConnectionState::Connecting);
                    self.registry.dispatch(&RealtimeEvent::Disconnect { reason });

                    if shutdown.is_cancelled() {
                        break;
                    }
                }
                Ok(Err(e)) => {
                    failures += 1;
                    tracing::warn!(
                        attempt = failures,
                        code = e.code().code(),
                        error = %e,
                        "Realtime connect failed"
                    );
                }
                Err(_) => {
                    failures += 1;
                    let e = RealtimeError::Timeout(self.config.connect_timeout);
                    tracing::warn!(attempt = failures, error = %e, "Realtime connect failed");
                }
            }

            if !self.config.allows_retry(failures) {
                tracing::warn!(failures, "Realtime reconnection given up");
                break;
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Realtime client stopped");
    }

    /// Engine.IO open + Socket.IO namespace connect
    async fn open_session(&self, url: &str) -> Result<Session, RealtimeError> {
        let transport = self.connector.connect(url).await?;

        let frame = transport
            .read_frame()
            .await?
            .ok_or_else(|| RealtimeError::Handshake("closed before open packet".into()))?;
        let open = match EnginePacket::decode(&frame)? {
            EnginePacket::Open(open) => open,
            other => {
                return Err(RealtimeError::Handshake(format!(
                    "expected open packet, got {other:?}"
                )));
            }
        };

        let nsp = self.config.namespace.clone();
        let connect = SocketPacket::Connect {
            nsp: nsp.clone(),
            data: None,
        };
        transport.write_frame(&connect.to_frame()).await?;

        loop {
            let frame = transport.read_frame().await?.ok_or_else(|| {
                RealtimeError::Handshake("closed during namespace connect".into())
            })?;

            match EnginePacket::decode(&frame)? {
                EnginePacket::Ping(data) => {
                    transport.write_frame(&EnginePacket::Pong(data).encode()).await?;
                }
                EnginePacket::Message(payload) => match SocketPacket::decode(&payload)? {
                    SocketPacket::Connect { nsp: acked, data } if acked == nsp => {
                        let sid = data
                            .as_ref()
                            .and_then(|d| d.get("sid"))
                            .and_then(Value::as_str)
                            .map(str::to_string);
                        return Ok(Session {
                            transport,
                            open,
                            sid,
                        });
                    }
                    SocketPacket::ConnectError { data, .. } => {
                        return Err(RealtimeError::Rejected(connect_error_message(&data)));
                    }
                    other => tracing::debug!(packet = ?other, "Ignoring packet before connect ack"),
                },
                EnginePacket::Close => return Err(RealtimeError::Closed),
                _ => {}
            }
        }
    }

    /// Read frames until the session ends; returns the disconnect reason
    async fn run_session(&self, session: &Session, shutdown: &CancellationToken) -> String {
        let transport = session.transport.as_ref();
        let window = session.open.ping_window();
        let ping_deadline = tokio::time::sleep(window);
        tokio::pin!(ping_deadline);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    let leave = SocketPacket::Disconnect { nsp: self.config.namespace.clone() };
                    let _ = transport.write_frame(&leave.to_frame()).await;
                    let _ = transport.write_frame(&EnginePacket::Close.encode()).await;
                    let _ = transport.close().await;
                    return REASON_CLIENT_DISCONNECT.to_string();
                }
                _ = &mut ping_deadline => {
                    tracing::warn!(window = ?window, "No ping from server");
                    let _ = transport.close().await;
                    return REASON_PING_TIMEOUT.to_string();
                }
                frame = transport.read_frame() => match frame {
                    Ok(Some(frame)) => match self.handle_frame(transport, &frame).await {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Pinged) => ping_deadline.as_mut().reset(Instant::now() + window),
                        Ok(Flow::Close(reason)) => return reason,
                        Err(RealtimeError::Protocol(e)) => {
                            tracing::warn!(error = %e, frame = %frame, "Dropping malformed frame");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Realtime write failed");
                            return REASON_TRANSPORT_ERROR.to_string();
                        }
                    },
                    Ok(None) => return REASON_TRANSPORT_CLOSE.to_string(),
                    Err(e) => {
                        tracing::warn!(error = %e, "Realtime read failed");
                        return REASON_TRANSPORT_ERROR.to_string();
                    }
                },
            }
        }
    }

    async fn handle_frame(
        &self,
        transport: &dyn Transport,
        frame: &str,
    ) -> Result<Flow, RealtimeError> {
        let payload = match EnginePacket::decode(frame)? {
            EnginePacket::Ping(data) => {
                transport.write_frame(&EnginePacket::Pong(data).encode()).await?;
                return Ok(Flow::Pinged);
            }
            EnginePacket::Close => return Ok(Flow::Close(REASON_TRANSPORT_CLOSE.to_string())),
            EnginePacket::Message(payload) => payload,
            EnginePacket::Open(_)
            | EnginePacket::Pong(_)
            | EnginePacket::Upgrade
            | EnginePacket::Noop => {
                return Ok(Flow::Continue);
            }
        };

        let packet = SocketPacket::decode(&payload)?;
        if packet.nsp() != self.config.namespace {
            tracing::debug!(nsp = packet.nsp(), "Ignoring packet for other namespace");
            return Ok(Flow::Continue);
        }

        match packet {
            SocketPacket::Event { nsp, id, name, args } => {
                self.dispatch_wire(&name, &args);
                if let Some(id) = id {
                    let ack = SocketPacket::Ack {
                        nsp,
                        id,
                        args: Vec::new(),
                    };
                    transport.write_frame(&ack.to_frame()).await?;
                }
                Ok(Flow::Continue)
            }
            SocketPacket::Disconnect { .. } => {
                Ok(Flow::Close(REASON_SERVER_DISCONNECT.to_string()))
            }
            SocketPacket::ConnectError { data, .. } => {
                tracing::warn!(
                    message = %connect_error_message(&data),
                    "Server rejected namespace"
                );
                Ok(Flow::Close(REASON_SERVER_DISCONNECT.to_string()))
            }
            SocketPacket::Connect { .. } | SocketPacket::Ack { .. } => Ok(Flow::Continue),
        }
    }

    fn dispatch_wire(&self, name: &str, args: &[Value]) {
        match RealtimeEvent::from_wire(name, args) {
            Ok(Some(event)) => {
                let handlers = self.registry.dispatch(&event);
                tracing::debug!(event = %name, handlers, "Realtime event dispatched");
            }
            Ok(None) => tracing::debug!(event = %name, "Ignoring unknown event"),
            Err(e) => {
                tracing::warn!(code = e.code().code(), error = %e, "Dropping malformed event");
            }
        }
    }
}
