//! Gateway listener.
//!
//! One persistent websocket to the Discord gateway, authenticated as the
//! first configured account. The read loop only filters and hands off:
//! a qualifying drop announcement is passed to the [`DropSink`] and the
//! loop returns to the socket immediately. Connection failures are
//! terminal; readiness is force-set so dependent loops never deadlock.

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use {
    futures::{SinkExt, StreamExt},
    serde_json::{Value, json},
    tokio::{net::TcpStream, sync::Mutex, task::JoinHandle},
    tokio_tungstenite::{
        MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsMessage,
    },
    tracing::{debug, error, info, warn},
};

use {
    dropfarm_common::{Readiness, now_ms},
    dropfarm_panels::{DropEvent, DropSink, PanelService},
};

use crate::error::{Context as _, Error, Result};

const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=9&encoding=json";

const OP_DISPATCH: u64 = 0;
const OP_HEARTBEAT: u64 = 1;
const OP_IDENTIFY: u64 = 2;
const OP_HELLO: u64 = 10;
const OP_HEARTBEAT_ACK: u64 = 11;

/// Close code sent when the identify token is invalid.
const CLOSE_AUTH_FAILED: u16 = 4004;

type WsSink = futures::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<TcpStream>>,
    WsMessage,
>;

pub struct DropListener {
    token: String,
    broadcaster_id: u64,
    drop_pattern: String,
    panels: Arc<PanelService>,
    sink: Arc<dyn DropSink>,
    readiness: Readiness,
    gateway_url: String,
    last_seq: Arc<AtomicI64>,
}

impl DropListener {
    pub fn new(
        token: impl Into<String>,
        broadcaster_id: u64,
        drop_pattern: impl Into<String>,
        panels: Arc<PanelService>,
        sink: Arc<dyn DropSink>,
        readiness: Readiness,
    ) -> Self {
        Self {
            token: token.into(),
            broadcaster_id,
            drop_pattern: drop_pattern.into(),
            panels,
            sink,
            readiness,
            gateway_url: DEFAULT_GATEWAY_URL.into(),
            last_seq: Arc::new(AtomicI64::new(-1)),
        }
    }

    /// Run the listener to completion. Any exit is terminal for drop
    /// detection; readiness is set on every path so waiters proceed.
    pub async fn run(self: Arc<Self>) {
        let result = self.listen().await;
        self.readiness.set();
        match result {
            Ok(()) => warn!("gateway connection closed; drop detection stopped"),
            Err(Error::AuthRejected) => {
                error!("gateway rejected the listener token; check the first TOKENS entry");
            },
            Err(e) => error!(error = %e, "gateway listener terminated"),
        }
    }

    async fn listen(&self) -> Result<()> {
        let (ws, _) = connect_async(&self.gateway_url)
            .await
            .map_err(|e| Error::connection("gateway connect", e))?;
        info!("gateway socket connected");

        let (write, mut read) = ws.split();
        let write = Arc::new(Mutex::new(write));
        let mut heartbeat: Option<JoinHandle<()>> = None;

        let result = loop {
            let Some(frame) = read.next().await else {
                break Ok(());
            };
            match frame {
                Ok(WsMessage::Text(text)) => {
                    let payload: Value = match serde_json::from_str(&text) {
                        Ok(v) => v,
                        Err(e) => {
                            warn!(error = %e, "discarding malformed gateway frame");
                            continue;
                        },
                    };
                    if let Some(seq) = payload.get("s").and_then(Value::as_i64) {
                        self.last_seq.store(seq, Ordering::SeqCst);
                    }
                    match payload.get("op").and_then(Value::as_u64) {
                        Some(OP_HELLO) => {
                            let interval_ms = payload["d"]["heartbeat_interval"]
                                .as_u64()
                                .unwrap_or(41_250);
                            heartbeat = Some(self.spawn_heartbeat(Arc::clone(&write), interval_ms));
                            if let Err(e) = self.send_identify(&write).await {
                                break Err(e);
                            }
                        },
                        Some(OP_DISPATCH) => self.handle_dispatch(&payload).await,
                        Some(OP_HEARTBEAT_ACK) => debug!("heartbeat acknowledged"),
                        _ => {},
                    }
                },
                Ok(WsMessage::Close(frame)) => {
                    if frame
                        .as_ref()
                        .is_some_and(|f| u16::from(f.code) == CLOSE_AUTH_FAILED)
                    {
                        break Err(Error::AuthRejected);
                    }
                    warn!(?frame, "gateway sent close");
                    break Ok(());
                },
                Ok(_) => {},
                Err(e) => break Err(Error::connection("gateway read", e)),
            }
        };

        if let Some(handle) = heartbeat {
            handle.abort();
        }
        result
    }

    async fn send_identify(&self, write: &Arc<Mutex<WsSink>>) -> Result<()> {
        let payload = json!({
            "op": OP_IDENTIFY,
            "d": {
                "token": self.token,
                "properties": {
                    "$os": "linux",
                    "$browser": "dropfarm",
                    "$device": "dropfarm",
                },
            },
        });
        write
            .lock()
            .await
            .send(WsMessage::Text(payload.to_string().into()))
            .await
            .context("send identify")?;
        debug!("identify sent");
        Ok(())
    }

    fn spawn_heartbeat(&self, write: Arc<Mutex<WsSink>>, interval_ms: u64) -> JoinHandle<()> {
        let last_seq = Arc::clone(&self.last_seq);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1_000)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let seq = last_seq.load(Ordering::SeqCst);
                let d = if seq < 0 { Value::Null } else { json!(seq) };
                let frame = json!({ "op": OP_HEARTBEAT, "d": d }).to_string();
                if write
                    .lock()
                    .await
                    .send(WsMessage::Text(frame.into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        })
    }

    /// Handle one `op 0` dispatch frame.
    async fn handle_dispatch(&self, payload: &Value) {
        match payload.get("t").and_then(Value::as_str) {
            Some("READY") => {
                let user = &payload["d"]["user"];
                info!(
                    user = user["username"].as_str().unwrap_or("?"),
                    id = user["id"].as_str().unwrap_or("?"),
                    "gateway identity ready"
                );
                self.readiness.set();
            },
            Some("MESSAGE_CREATE") => {
                let Some(event) = self.parse_drop(&payload["d"]) else {
                    return;
                };
                let Some(panel) = self.panels.get_by_channel(&event.channel_id).await else {
                    debug!(channel = %event.channel_id, "drop in an unmanaged channel; ignored");
                    return;
                };
                info!(
                    channel = %event.channel_id,
                    message = %event.message_id,
                    panel = %panel.name,
                    "drop detected"
                );
                // The sink spawns its own work; this await does not block
                // on reaction completion.
                self.sink.handle_drop(panel, event).await;
            },
            _ => {},
        }
    }

    /// A qualifying drop: authored by the broadcaster and matching the
    /// announcement pattern. Everything else is discarded.
    fn parse_drop(&self, d: &Value) -> Option<DropEvent> {
        let author_id: u64 = d["author"]["id"].as_str()?.parse().ok()?;
        if author_id != self.broadcaster_id {
            return None;
        }
        let content = d["content"].as_str().unwrap_or_default();
        if !content.contains(&self.drop_pattern) {
            return None;
        }
        Some(DropEvent {
            channel_id: d["channel_id"].as_str()?.to_string(),
            message_id: d["id"].as_str()?.to_string(),
            author_id,
            content: content.to_string(),
            observed_at_ms: now_ms(),
        })
    }
}
