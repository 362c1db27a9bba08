//! Realtime channel over the Phoenix websocket protocol.
//!
//! One socket per subscription. The socket task joins `realtime:<channel>`
//! with a `postgres_changes` INSERT binding, heartbeats on the `phoenix`
//! topic, forwards statuses and inserted rows, and reconnects with backoff
//! until its [`RealtimeSubscription`] is dropped. Every join carries the
//! client's current access token; a token change on a joined channel is
//! pushed as an `access_token` frame.

use std::fmt::Display;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use super::SupabaseClient;
use crate::backend::{
    BackendResult, ChannelStatus, InsertFilter, RealtimeMessage, RealtimeReceiver,
    RealtimeSubscription,
};
use crate::error::BackendError;
use crate::model::Task;

/// Protocol version sent in the socket URL.
const PROTOCOL_VSN: &str = "1.0.0";

/// How long to wait for the join reply before reporting `TIMED_OUT`.
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

const BASE_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// A Phoenix channel frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

/// What an inbound frame means for the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Inbound {
    Status(ChannelStatus),
    Insert(Task),
    Ignore,
}

/// Builds `ws(s)://<host>/realtime/v1/websocket?apikey=..&vsn=..`.
pub(crate) fn websocket_url(base: &str, anon_key: &str) -> BackendResult<String> {
    let mut url = url::Url::parse(base)
        .map_err(|e| BackendError::Realtime(format!("invalid backend url {base}: {e}")))?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(BackendError::Realtime(format!(
                "unsupported url scheme {other}"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|()| BackendError::Realtime(format!("cannot use scheme {scheme}")))?;
    url.set_path("/realtime/v1/websocket");
    url.query_pairs_mut()
        .clear()
        .append_pair("apikey", anon_key)
        .append_pair("vsn", PROTOCOL_VSN);
    Ok(url.to_string())
}

pub(crate) fn join_message(
    topic: &str,
    schema: &str,
    table: &str,
    filter: &InsertFilter,
    access_token: &str,
    reference: String,
) -> PhoenixMessage {
    let mut binding = json!({
        "event": "INSERT",
        "schema": schema,
        "table": table,
    });
    if let Some(owner) = &filter.owner {
        binding["filter"] = Value::String(format!("email=eq.{owner}"));
    }

    PhoenixMessage {
        topic: topic.to_string(),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": [binding],
            },
            "access_token": access_token,
        }),
        reference: Some(reference),
    }
}

pub(crate) fn heartbeat_message(reference: String) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference),
    }
}

pub(crate) fn access_token_message(
    topic: &str,
    access_token: &str,
    reference: String,
) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_string(),
        event: "access_token".to_string(),
        payload: json!({ "access_token": access_token }),
        reference: Some(reference),
    }
}

pub(crate) fn leave_message(topic: &str, reference: String) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_string(),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference),
    }
}

/// Interprets a frame received on the socket.
pub(crate) fn interpret(msg: &PhoenixMessage, topic: &str, join_ref: &str) -> Inbound {
    if msg.topic != topic {
        return Inbound::Ignore;
    }

    match msg.event.as_str() {
        "phx_reply" if msg.reference.as_deref() == Some(join_ref) => {
            match msg.payload.get("status").and_then(Value::as_str) {
                Some("ok") => Inbound::Status(ChannelStatus::Subscribed),
                _ => Inbound::Status(ChannelStatus::ChannelError(reply_reason(&msg.payload))),
            }
        }
        "phx_error" => Inbound::Status(ChannelStatus::ChannelError(String::new())),
        "phx_close" => Inbound::Status(ChannelStatus::Closed),
        "system" if msg.payload.get("status").and_then(Value::as_str) == Some("error") => {
            Inbound::Status(ChannelStatus::ChannelError(
                msg.payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ))
        }
        "postgres_changes" => interpret_change(&msg.payload),
        _ => Inbound::Ignore,
    }
}

fn reply_reason(payload: &Value) -> String {
    payload
        .pointer("/response/reason")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn interpret_change(payload: &Value) -> Inbound {
    let Some(data) = payload.get("data") else {
        return Inbound::Ignore;
    };
    if data.get("type").and_then(Value::as_str) != Some("INSERT") {
        return Inbound::Ignore;
    }
    let Some(record) = data.get("record") else {
        return Inbound::Ignore;
    };
    match serde_json::from_value::<Task>(record.clone()) {
        Ok(task) => Inbound::Insert(task),
        Err(e) => {
            tracing::debug!("Ignoring undecodable realtime record: {e}");
            Inbound::Ignore
        }
    }
}

/// Everything the socket task needs, detached from the client.
struct ChannelSpec {
    url: String,
    topic: String,
    schema: String,
    table: String,
    filter: InsertFilter,
    heartbeat: Duration,
}

enum SessionEnd {
    Cancelled,
    Lost(String),
}

impl SupabaseClient {
    pub(super) fn open_insert_channel(
        &self,
        filter: InsertFilter,
    ) -> BackendResult<(RealtimeSubscription, RealtimeReceiver)> {
        let channel = ChannelSpec {
            url: websocket_url(&self.url, &self.anon_key)?,
            topic: format!("realtime:{}", self.realtime.channel),
            schema: self.realtime.schema.clone(),
            table: self.table.clone(),
            filter,
            heartbeat: self.realtime.heartbeat(),
        };

        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = RealtimeSubscription::new(channel.topic.clone(), cancel.clone());

        tokio::spawn(run_channel(channel, self.token.subscribe(), cancel, tx));

        Ok((subscription, rx))
    }
}

async fn run_channel(
    channel: ChannelSpec,
    mut token: watch::Receiver<String>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<RealtimeMessage>,
) {
    let mut attempt: u32 = 0;
    loop {
        match run_session(&channel, &mut token, &cancel, &tx).await {
            SessionEnd::Cancelled => {
                let _ = tx.send(RealtimeMessage::Status(ChannelStatus::Closed));
                return;
            }
            SessionEnd::Lost(reason) => {
                tracing::warn!(topic = %channel.topic, "Realtime connection lost: {reason}");
                attempt = attempt.saturating_add(1);
                let delay = BASE_RECONNECT_DELAY
                    .saturating_mul(2u32.saturating_pow(attempt.min(5)))
                    .min(MAX_RECONNECT_DELAY);

                tokio::select! {
                    () = cancel.cancelled() => {
                        let _ = tx.send(RealtimeMessage::Status(ChannelStatus::Closed));
                        return;
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

/// Runs one websocket connection until cancelled or lost.
async fn run_session(
    channel: &ChannelSpec,
    token: &mut watch::Receiver<String>,
    cancel: &CancellationToken,
    tx: &mpsc::UnboundedSender<RealtimeMessage>,
) -> SessionEnd {
    let connected = tokio::select! {
        () = cancel.cancelled() => return SessionEnd::Cancelled,
        result = connect_async(channel.url.as_str()) => result,
    };
    let (ws_stream, _) = match connected {
        Ok(conn) => conn,
        Err(e) => {
            let reason = format!("connect: {e}");
            let _ = tx.send(RealtimeMessage::Status(ChannelStatus::ChannelError(
                reason.clone(),
            )));
            return SessionEnd::Lost(reason);
        }
    };
    let (mut write, mut read) = ws_stream.split();

    let mut next_ref: u64 = 1;
    let mut take_ref = || {
        let r = next_ref.to_string();
        next_ref += 1;
        r
    };

    let join_ref = take_ref();
    let mut sent_token = token.borrow_and_update().clone();
    let join = join_message(
        &channel.topic,
        &channel.schema,
        &channel.table,
        &channel.filter,
        &sent_token,
        join_ref.clone(),
    );
    if let Err(e) = send_frame(&mut write, &join).await {
        return SessionEnd::Lost(e);
    }

    let mut joined = false;
    // False once every client handle is gone.
    let mut token_open = true;
    let join_deadline = tokio::time::sleep(JOIN_TIMEOUT);
    tokio::pin!(join_deadline);

    let mut heartbeat = tokio::time::interval(channel.heartbeat);
    // Skip the first immediate tick.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let leave = leave_message(&channel.topic, take_ref());
                let _ = send_frame(&mut write, &leave).await;
                let _ = write.close().await;
                return SessionEnd::Cancelled;
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let frame: PhoenixMessage = match serde_json::from_str(&text) {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::debug!("Ignoring unparseable realtime frame: {e}");
                                continue;
                            }
                        };
                        match interpret(&frame, &channel.topic, &join_ref) {
                            Inbound::Status(status) => {
                                if status == ChannelStatus::Subscribed {
                                    joined = true;
                                }
                                let lost = matches!(
                                    status,
                                    ChannelStatus::ChannelError(_) | ChannelStatus::Closed
                                );
                                let _ = tx.send(RealtimeMessage::Status(status.clone()));
                                if lost {
                                    return SessionEnd::Lost(status.to_string());
                                }
                            }
                            Inbound::Insert(task) => {
                                let _ = tx.send(RealtimeMessage::Insert(task));
                            }
                            Inbound::Ignore => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return SessionEnd::Lost("connection closed by server".into());
                    }
                    Some(Err(e)) => return SessionEnd::Lost(format!("read error: {e}")),
                    // Binary, Ping/Pong frames handled by tungstenite.
                    _ => {}
                }
            }
            changed = token.changed(), if joined && token_open => {
                if changed.is_err() {
                    token_open = false;
                    continue;
                }
                let current = token.borrow_and_update().clone();
                if current == sent_token {
                    continue;
                }
                let push = access_token_message(&channel.topic, &current, take_ref());
                if let Err(e) = send_frame(&mut write, &push).await {
                    return SessionEnd::Lost(e);
                }
                tracing::debug!(topic = %channel.topic, "Pushed refreshed access token");
                sent_token = current;
            }
            _ = heartbeat.tick() => {
                if let Err(e) = send_frame(&mut write, &heartbeat_message(take_ref())).await {
                    return SessionEnd::Lost(e);
                }
            }
            () = &mut join_deadline, if !joined => {
                let _ = tx.send(RealtimeMessage::Status(ChannelStatus::TimedOut));
                return SessionEnd::Lost("join timed out".into());
            }
        }
    }
}

async fn send_frame<S>(write: &mut S, frame: &PhoenixMessage) -> Result<(), String>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let json = serde_json::to_string(frame).map_err(|e| format!("encode: {e}"))?;
    write
        .send(Message::Text(json))
        .await
        .map_err(|e| format!("send error: {e}"))
}
