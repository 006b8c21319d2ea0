//! WebSocket client for the OpenClaw gateway.
//!
//! ```text
//!   OpenClawClient ──mpsc──► connection task ──► gateway socket
//!         ▲                        │
//!         │                        ▼
//!    GatewayCache ◄──────── inbound frames ──► broadcast subscribers
//! ```
//!
//! The gateway protocol has no request ids, so queries send a request, wait a
//! short window and answer from the cache that inbound frames keep current.

use crate::adapters::protocol::{ClientMessage, GatewayCache, GatewayEvent};
use crate::domain::model::{timestamp, GatewayStatus, Session, Subagent, SubagentRequest};
use crate::domain::ports::AgentGateway;
use crate::utils::error::{MissionControlError, Result};
use async_trait::async_trait;
use chrono::Local;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub const DEFAULT_GATEWAY_URL: &str = "ws://127.0.0.1:18789";

type GatewaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct WsGatewayConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// How long queries wait for the gateway to answer before reading the cache.
    pub response_wait: Duration,
    pub reconnect: bool,
    pub reconnect_delay: Duration,
}

impl Default for WsGatewayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_GATEWAY_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            response_wait: Duration::from_millis(500),
            reconnect: true,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// State shared between the client handle and its connection task.
struct Shared {
    connected: AtomicBool,
    cache: RwLock<GatewayCache>,
    events: broadcast::Sender<Value>,
}

impl Shared {
    fn handle_frame(&self, text: &str) {
        let frame: Value = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Invalid frame from gateway: {}", e);
                return;
            }
        };

        let event = GatewayEvent::from_value(&frame);
        if let Ok(mut cache) = self.cache.write() {
            cache.apply(event);
        }
        let kind = frame.get("type").and_then(|t| t.as_str()).unwrap_or("unknown");
        tracing::debug!("Gateway frame: {}", kind);

        // Nobody listening is fine
        let _ = self.events.send(frame);
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

pub struct OpenClawClient {
    config: WsGatewayConfig,
    shared: Arc<Shared>,
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    stop: Mutex<Option<watch::Sender<bool>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl OpenClawClient {
    pub fn new(config: WsGatewayConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            config,
            shared: Arc::new(Shared {
                connected: AtomicBool::new(false),
                cache: RwLock::new(GatewayCache::default()),
                events,
            }),
            outbound: Mutex::new(None),
            stop: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Every frame the gateway sends, in arrival order.
    pub fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.shared.events.subscribe()
    }

    /// Asks the gateway for recent logs; they arrive as frames to subscribers.
    pub fn request_logs(&self, limit: usize) -> Result<()> {
        self.send(ClientMessage::GetLogs { limit })
    }

    fn send(&self, message: ClientMessage) -> Result<()> {
        if !self.is_connected() {
            return Err(MissionControlError::GatewayUnavailable {
                message: "not connected".to_string(),
            });
        }

        let outbound = self.outbound.lock().ok().and_then(|guard| guard.clone());
        let sent = outbound
            .map(|tx| tx.send(Message::text(message.to_json())).is_ok())
            .unwrap_or(false);

        if !sent {
            tracing::error!("Failed to send message to gateway: connection task has stopped");
            self.shared.set_connected(false);
            return Err(MissionControlError::GatewayUnavailable {
                message: "connection closed".to_string(),
            });
        }
        Ok(())
    }

    async fn query(&self, message: ClientMessage) -> Result<()> {
        self.send(message)?;
        tokio::time::sleep(self.config.response_wait).await;
        Ok(())
    }

    fn has_live_task(&self) -> bool {
        self.task
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    fn cache_snapshot(&self) -> GatewayCache {
        self.shared
            .cache
            .read()
            .map(|cache| cache.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AgentGateway for OpenClawClient {
    fn kind(&self) -> &'static str {
        "websocket"
    }

    fn endpoint(&self) -> String {
        self.config.url.clone()
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<bool> {
        if self.is_connected() {
            return Ok(true);
        }
        // A live task is between reconnect attempts and owns the socket
        if self.has_live_task() {
            tracing::info!("Reconnect to {} already in progress", self.config.url);
            return Ok(false);
        }

        tracing::info!("Connecting to OpenClaw at {}...", self.config.url);
        let socket = open_socket(&self.config).await.map_err(|e| {
            tracing::error!("❌ Failed to connect to OpenClaw: {}", e);
            e
        })?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        self.shared.set_connected(true);
        let handle = tokio::spawn(run_connection(
            socket,
            outbound_rx,
            stop_rx,
            Arc::clone(&self.shared),
            self.config.clone(),
        ));

        if let Ok(mut guard) = self.outbound.lock() {
            *guard = Some(outbound_tx);
        }
        if let Ok(mut guard) = self.stop.lock() {
            *guard = Some(stop_tx);
        }
        if let Ok(mut guard) = self.task.lock() {
            *guard = Some(handle);
        }

        tracing::info!("✅ Connected to OpenClaw");
        self.send(ClientMessage::identify())?;
        Ok(true)
    }

    async fn disconnect(&self) {
        if let Some(stop) = self.stop.lock().ok().and_then(|mut guard| guard.take()) {
            let _ = stop.send(true);
        }
        let handle = self.task.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            if tokio::time::timeout(Duration::from_secs(2), handle).await.is_err() {
                tracing::warn!("Gateway connection task did not stop in time");
            }
        }
        if let Ok(mut guard) = self.outbound.lock() {
            *guard = None;
        }
        self.shared.set_connected(false);
        tracing::info!("Disconnected from OpenClaw");
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        self.query(ClientMessage::GetSessions).await?;
        Ok(self
            .cache_snapshot()
            .sessions
            .iter()
            .map(|(id, raw)| Session::from_gateway(raw, id))
            .collect())
    }

    async fn session(&self, session_id: &str) -> Result<Option<Session>> {
        self.query(ClientMessage::GetSession {
            session_id: session_id.to_string(),
        })
        .await?;
        Ok(self
            .cache_snapshot()
            .sessions
            .get(session_id)
            .map(|raw| Session::from_gateway(raw, session_id)))
    }

    async fn subagents(&self) -> Result<Vec<Subagent>> {
        self.query(ClientMessage::GetSubagents).await?;
        Ok(self
            .cache_snapshot()
            .subagents
            .values()
            .map(Subagent::from_gateway)
            .collect())
    }

    async fn create_subagent(&self, request: &SubagentRequest) -> Result<Subagent> {
        let known = self.subagent_count();
        let subagent_id = format!("subagent-{}-{}", Local::now().format("%Y%m%d-%H%M%S"), known);

        self.send(ClientMessage::SpawnSubagent {
            subagent_id: subagent_id.clone(),
            task: request.task.clone(),
            label: request
                .label
                .clone()
                .unwrap_or_else(|| format!("Subagent-{}", known + 1)),
            model: request
                .model
                .clone()
                .unwrap_or_else(|| "default".to_string()),
        })?;

        Ok(Subagent {
            id: subagent_id,
            status: "spawning".to_string(),
            task: request.task.clone(),
            label: request.label.clone(),
            created_at: timestamp(),
            model: request.model.clone(),
        })
    }

    async fn stop_subagent(&self, subagent_id: &str) -> Result<bool> {
        self.send(ClientMessage::StopSubagent {
            subagent_id: subagent_id.to_string(),
        })?;
        if let Ok(mut cache) = self.shared.cache.write() {
            cache.subagents.remove(subagent_id);
        }
        Ok(true)
    }

    fn session_count(&self) -> usize {
        self.shared.cache.read().map(|c| c.sessions.len()).unwrap_or(0)
    }

    fn subagent_count(&self) -> usize {
        self.shared.cache.read().map(|c| c.subagents.len()).unwrap_or(0)
    }

    async fn status(&self) -> GatewayStatus {
        if self.query(ClientMessage::GetStatus).await.is_err() {
            tracing::debug!("Gateway status requested while disconnected");
        }
        GatewayStatus {
            connected: self.is_connected(),
            gateway_url: self.config.url.clone(),
            active_sessions: self.session_count(),
            active_subagents: self.subagent_count(),
            timestamp: timestamp(),
        }
    }
}

async fn open_socket(config: &WsGatewayConfig) -> Result<GatewaySocket> {
    match tokio::time::timeout(config.connect_timeout, connect_async(config.url.as_str())).await {
        Ok(Ok((socket, _response))) => Ok(socket),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(MissionControlError::Timeout {
            operation: format!("connect to {}", config.url),
            seconds: config.connect_timeout.as_secs(),
        }),
    }
}

/// Pumps one socket at a time until stopped; reconnects when the peer goes away.
async fn run_connection(
    mut socket: GatewaySocket,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    mut stop: watch::Receiver<bool>,
    shared: Arc<Shared>,
    config: WsGatewayConfig,
) {
    let mut reidentify = false;

    loop {
        let (mut sink, mut source) = socket.split();

        if reidentify {
            if let Err(e) = sink.send(Message::text(ClientMessage::identify().to_json())).await {
                tracing::error!("Failed to identify after reconnect: {}", e);
            }
        }

        loop {
            tokio::select! {
                _ = stop.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    let _ = sink.close().await;
                    shared.set_connected(false);
                    return;
                }
                Some(message) = outbound.recv() => {
                    if let Err(e) = sink.send(message).await {
                        tracing::error!("Error sending message to gateway: {}", e);
                        break;
                    }
                }
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => shared.handle_frame(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::warn!("Gateway WebSocket connection closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("Error receiving from gateway: {}", e);
                        break;
                    }
                },
            }
        }

        shared.set_connected(false);
        if !config.reconnect {
            return;
        }

        socket = loop {
            tokio::select! {
                _ = stop.changed() => return,
                _ = tokio::time::sleep(config.reconnect_delay) => {}
            }
            match open_socket(&config).await {
                Ok(socket) => break socket,
                Err(e) => tracing::warn!(
                    "Reconnect to {} failed: {}; retrying in {:?}",
                    config.url,
                    e,
                    config.reconnect_delay
                ),
            }
        };

        tracing::info!("✅ Reconnected to OpenClaw");
        shared.set_connected(true);
        reidentify = true;
    }
}
