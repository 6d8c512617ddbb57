// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Realtime change feed client
//!
//! The hosted backend publishes row changes over a Phoenix-channel websocket.
//! Each subscription opens its own socket, joins `realtime:<channel>` with a
//! `postgres_changes` config, keeps the socket alive with heartbeats and turns
//! every `postgres_changes` frame into a [`ChangeNotification`].

use super::{ChangeKind, ChangeNotification, ChannelSpec};
use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

const PROTOCOL_VERSION: &str = "1.0.0";
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Wire format
// =============================================================================

/// One Phoenix frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixMessage {
    pub fn join(channel: &ChannelSpec, schema: &str, reference: u64) -> Self {
        let mut change = json!({
            "event": "*",
            "schema": schema,
            "table": channel.table,
        });
        if let Some(filter) = &channel.filter {
            change["filter"] = Value::String(filter.to_realtime());
        }

        Self {
            topic: topic_for(channel),
            event: "phx_join".to_string(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [change],
                }
            }),
            reference: Some(reference.to_string()),
        }
    }

    pub fn leave(channel: &ChannelSpec, reference: u64) -> Self {
        Self {
            topic: topic_for(channel),
            event: "phx_leave".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }
}

pub fn topic_for(channel: &ChannelSpec) -> String {
    format!("realtime:{}", channel.name)
}

#[derive(Debug, Deserialize)]
struct ChangePayload {
    data: ChangeData,
}

#[derive(Debug, Deserialize)]
struct ChangeData {
    table: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
    #[serde(default)]
    commit_timestamp: Option<DateTime<Utc>>,
}

/// Decode a `postgres_changes` payload
pub fn parse_change(payload: &Value) -> Option<ChangeNotification> {
    let parsed: ChangePayload = serde_json::from_value(payload.clone()).ok()?;
    let kind = ChangeKind::parse(&parsed.data.kind)?;
    Some(ChangeNotification {
        table: parsed.data.table,
        kind,
        record: parsed.data.record.filter(|r| !r.is_null()),
        old_record: parsed.data.old_record.filter(|r| !r.is_null()),
        commit_timestamp: parsed.data.commit_timestamp.unwrap_or_else(Utc::now),
    })
}

/// Websocket endpoint for a project base URL
pub fn socket_url(base_url: &str, api_key: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!(
        "{}/realtime/v1/websocket?apikey={}&vsn={}",
        ws_base,
        urlencoding::encode(api_key),
        PROTOCOL_VERSION
    )
}

// =============================================================================
// Connection
// =============================================================================

/// Running connection for one subscription
pub struct RealtimeHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RealtimeHandle {
    /// Leave the channel and close the socket
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if tokio::time::timeout(CLOSE_TIMEOUT, &mut self.task)
            .await
            .is_err()
        {
            log::warn!("Realtime connection did not close in time, aborting");
            self.task.abort();
        }
    }
}

/// Outcome of the join if `message` is the server's reply to it
fn join_reply(message: &PhoenixMessage, reference: &str) -> Option<Result<()>> {
    if message.event != "phx_reply" || message.reference.as_deref() != Some(reference) {
        return None;
    }
    match message.payload.get("status").and_then(Value::as_str) {
        Some("ok") => Some(Ok(())),
        status => Some(Err(SyncError::Subscription(format!(
            "join rejected ({}): {}",
            status.unwrap_or("no status"),
            message.payload.get("response").unwrap_or(&Value::Null)
        )))),
    }
}

/// Read frames until the join with `reference` is acknowledged or refused
async fn await_join<S>(stream: &mut S, reference: &str) -> Result<()>
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    let wait = async {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let Ok(message) = serde_json::from_str::<PhoenixMessage>(&text) else {
                        continue;
                    };
                    if let Some(outcome) = join_reply(&message, reference) {
                        return outcome;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => return Err(SyncError::Subscription(format!("join failed: {}", e))),
            }
        }
        Err(SyncError::Subscription(
            "socket closed before the join was acknowledged".to_string(),
        ))
    };

    tokio::time::timeout(JOIN_TIMEOUT, wait)
        .await
        .map_err(|_| {
            SyncError::Subscription(format!(
                "no reply to join within {}s",
                JOIN_TIMEOUT.as_secs()
            ))
        })?
}

/// Connect, join the channel, and start forwarding notifications.
///
/// Returns only once the server has accepted the join.
pub async fn open(
    socket_url: &str,
    schema: &str,
    channel: &ChannelSpec,
    heartbeat: Duration,
) -> Result<(RealtimeHandle, mpsc::UnboundedReceiver<ChangeNotification>)> {
    let (socket, _) = connect_async(socket_url)
        .await
        .map_err(|e| SyncError::Subscription(format!("connect failed: {}", e)))?;
    let (mut sink, mut stream) = socket.split();

    let mut reference: u64 = 1;
    let join = serde_json::to_string(&PhoenixMessage::join(channel, schema, reference))
        .map_err(|e| SyncError::Subscription(e.to_string()))?;
    sink.send(Message::Text(join))
        .await
        .map_err(|e| SyncError::Subscription(format!("join failed: {}", e)))?;
    if let Err(e) = await_join(&mut stream, &reference.to_string()).await {
        let _ = sink.close().await;
        return Err(e);
    }
    log::debug!("Joined {}", topic_for(channel));

    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let channel = channel.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    reference += 1;
                    if let Ok(leave) = serde_json::to_string(&PhoenixMessage::leave(&channel, reference)) {
                        let _ = sink.send(Message::Text(leave)).await;
                    }
                    let _ = sink.close().await;
                    log::debug!("Left {}", topic_for(&channel));
                    break;
                }
                _ = ticker.tick() => {
                    reference += 1;
                    let Ok(beat) = serde_json::to_string(&PhoenixMessage::heartbeat(reference)) else {
                        continue;
                    };
                    if let Err(e) = sink.send(Message::Text(beat)).await {
                        log::warn!("Heartbeat on {} failed: {}", topic_for(&channel), e);
                        break;
                    }
                }
                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if !handle_frame(&channel, &text, &tx) {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            log::info!("Realtime socket for {} closed", topic_for(&channel));
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            log::warn!("Realtime socket for {} failed: {}", topic_for(&channel), e);
                            break;
                        }
                    }
                }
            }
        }
    });

    Ok((
        RealtimeHandle {
            shutdown: Some(shutdown_tx),
            task,
        },
        rx,
    ))
}

/// Returns false once nobody is listening any more
fn handle_frame(
    channel: &ChannelSpec,
    text: &str,
    tx: &mpsc::UnboundedSender<ChangeNotification>,
) -> bool {
    let message: PhoenixMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            log::debug!("Ignoring undecodable realtime frame: {}", e);
            return true;
        }
    };

    match message.event.as_str() {
        "postgres_changes" => {
            if let Some(change) = parse_change(&message.payload) {
                return tx.send(change).is_ok();
            }
            log::debug!("Ignoring malformed change on {}", message.topic);
        }
        "phx_reply" => {
            let status = message.payload.get("status").and_then(Value::as_str);
            if status == Some("error") {
                log::error!(
                    "Channel {} replied with an error: {}",
                    topic_for(channel),
                    message.payload
                );
            }
        }
        "phx_error" | "phx_close" => {
            log::warn!("Channel {} reported {}", message.topic, message.event);
        }
        "system" => {
            log::debug!("System message on {}: {}", message.topic, message.payload);
        }
        _ => {}
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Filter;
    use std::future::Future;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::WebSocketStream;

    type ServerSocket = WebSocketStream<TcpStream>;

    /// Accept one websocket client and hand it to `script`; returns the URL
    async fn serve_once<F, Fut>(script: F) -> String
    where
        F: FnOnce(ServerSocket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let socket = tokio_tungstenite::accept_async(tcp).await.unwrap();
            script(socket).await;
        });
        format!("ws://{}/realtime/v1/websocket?vsn=1.0.0", addr)
    }

    /// Read the join frame and answer it with `status`
    async fn answer_join(socket: &mut ServerSocket, status: &str) -> PhoenixMessage {
        while let Some(Ok(frame)) = socket.next().await {
            if let Message::Text(text) = frame {
                let join: PhoenixMessage = serde_json::from_str(&text).unwrap();
                assert_eq!(join.event, "phx_join");
                let reply = PhoenixMessage {
                    topic: join.topic.clone(),
                    event: "phx_reply".to_string(),
                    payload: json!({"status": status, "response": {}}),
                    reference: join.reference.clone(),
                };
                socket
                    .send(Message::Text(serde_json::to_string(&reply).unwrap()))
                    .await
                    .unwrap();
                return join;
            }
        }
        panic!("client never sent a join");
    }

    fn change_frame(topic: &str) -> Message {
        let frame = json!({
            "topic": topic,
            "event": "postgres_changes",
            "payload": {"data": {
                "table": "header_menu_links",
                "type": "INSERT",
                "record": {"id": "7", "title": "Programme"}
            }},
            "ref": null
        });
        Message::Text(frame.to_string())
    }

    fn menu_channel() -> ChannelSpec {
        ChannelSpec::table("header_menu_changes", "header_menu_links")
    }

    const BEAT: Duration = Duration::from_secs(30);

    #[test]
    fn test_socket_url() {
        assert_eq!(
            socket_url("https://abc.supabase.co/", "key"),
            "wss://abc.supabase.co/realtime/v1/websocket?apikey=key&vsn=1.0.0"
        );
        assert!(socket_url("http://localhost:54321", "k").starts_with("ws://localhost:54321/"));
    }

    #[test]
    fn test_join_frame() {
        let channel = ChannelSpec::table("page-content-home", "page_content")
            .with_filter(Filter::eq("page_id", "home"));
        let join = PhoenixMessage::join(&channel, "public", 1);
        let encoded = serde_json::to_value(&join).unwrap();

        assert_eq!(encoded["topic"], "realtime:page-content-home");
        assert_eq!(encoded["event"], "phx_join");
        assert_eq!(encoded["ref"], "1");
        let change = &encoded["payload"]["config"]["postgres_changes"][0];
        assert_eq!(change["event"], "*");
        assert_eq!(change["table"], "page_content");
        assert_eq!(change["filter"], "page_id=eq.home");
    }

    #[test]
    fn test_join_without_filter_omits_it() {
        let channel = ChannelSpec::table("header_menu_changes", "header_menu_links");
        let join = PhoenixMessage::join(&channel, "public", 1);
        let change = &join.payload["config"]["postgres_changes"][0];
        assert!(change.get("filter").is_none());
    }

    #[test]
    fn test_parse_change() {
        let payload = json!({
            "ids": [1],
            "data": {
                "schema": "public",
                "table": "header_menu_links",
                "commit_timestamp": "2024-04-01T10:00:00.000Z",
                "type": "UPDATE",
                "record": {"id": "1", "is_active": false},
                "old_record": {"id": "1"},
                "errors": null
            }
        });
        let change = parse_change(&payload).unwrap();
        assert_eq!(change.kind, ChangeKind::Update);
        assert_eq!(change.table, "header_menu_links");
        assert_eq!(change.record.unwrap()["is_active"], false);
    }

    #[test]
    fn test_parse_change_rejects_unknown_type() {
        let payload = json!({"data": {"table": "t", "type": "TRUNCATE"}});
        assert!(parse_change(&payload).is_none());
    }

    #[test]
    fn test_handle_frame_forwards_changes() {
        let channel = ChannelSpec::table("c", "t");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let frame = json!({
            "topic": "realtime:c",
            "event": "postgres_changes",
            "payload": {"data": {"table": "t", "type": "DELETE", "old_record": {"id": "9"}}},
            "ref": null
        })
        .to_string();

        assert!(handle_frame(&channel, &frame, &tx));
        let change = rx.try_recv().unwrap();
        assert_eq!(change.kind, ChangeKind::Delete);
        assert!(change.record.is_none());

        drop(rx);
        assert!(!handle_frame(&channel, &frame, &tx));
    }

    #[test]
    fn test_join_reply_matches_reference() {
        let reply = |status: &str, reference: &str| PhoenixMessage {
            topic: "realtime:c".to_string(),
            event: "phx_reply".to_string(),
            payload: json!({"status": status}),
            reference: Some(reference.to_string()),
        };

        assert!(join_reply(&reply("ok", "2"), "1").is_none());
        assert!(matches!(join_reply(&reply("ok", "1"), "1"), Some(Ok(()))));
        assert!(matches!(
            join_reply(&reply("error", "1"), "1"),
            Some(Err(SyncError::Subscription(_)))
        ));
    }

    #[tokio::test]
    async fn test_open_forwards_changes_after_join() {
        let url = serve_once(|mut socket| async move {
            let join = answer_join(&mut socket, "ok").await;
            socket.send(change_frame(&join.topic)).await.unwrap();
            while let Some(Ok(_)) = socket.next().await {}
        })
        .await;

        let (handle, mut rx) = open(&url, "public", &menu_channel(), BEAT).await.unwrap();
        let change = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.kind, ChangeKind::Insert);
        assert_eq!(change.record.unwrap()["title"], "Programme");
        handle.close().await;
    }

    #[tokio::test]
    async fn test_open_fails_when_join_is_rejected() {
        let url = serve_once(|mut socket| async move {
            answer_join(&mut socket, "error").await;
            while let Some(Ok(_)) = socket.next().await {}
        })
        .await;

        let result = open(&url, "public", &menu_channel(), BEAT).await;
        assert!(matches!(result, Err(SyncError::Subscription(_))));
    }

    #[tokio::test]
    async fn test_open_fails_when_socket_closes_before_reply() {
        let url = serve_once(|mut socket| async move {
            let _ = socket.next().await;
            let _ = socket.close(None).await;
        })
        .await;

        let result = open(&url, "public", &menu_channel(), BEAT).await;
        assert!(matches!(result, Err(SyncError::Subscription(_))));
    }

    #[tokio::test]
    async fn test_feed_ends_when_server_closes() {
        let url = serve_once(|mut socket| async move {
            answer_join(&mut socket, "ok").await;
            let _ = socket.close(None).await;
            while let Some(Ok(_)) = socket.next().await {}
        })
        .await;

        let (handle, mut rx) = open(&url, "public", &menu_channel(), BEAT).await.unwrap();
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert!(next.is_none());
        handle.close().await;
    }
}
