//! Real-time channel.
//!
//! A single WebSocket connection per client, addressed by user id. Incoming
//! `{ event, data, timestamp }` messages are dispatched to the handlers
//! registered for `event`. A dropped connection is re-established with
//! exponential backoff until the attempt budget runs out.

use crate::config::ClientConfig;
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

/// One message on the channel, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    pub event: String,
    #[serde(default)]
    pub data: JsonValue,
    /// Epoch milliseconds on the wire. Absent or unreadable values are
    /// `None` and never stop a message from being dispatched.
    #[serde(default, with = "crate::timestamp::lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// When to retry after the connection drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` once
    /// the budget is spent.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base_delay.saturating_mul(1 << (attempt - 1).min(31)))
    }
}

/// Handle returned by [`RealtimeClient::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: u64,
}

type Handler = Arc<dyn Fn(&JsonValue) + Send + Sync>;

enum ConnectionState {
    Idle,
    Connecting,
    Open(mpsc::UnboundedSender<WsMessage>),
}

struct Inner {
    config: ClientConfig,
    policy: ReconnectPolicy,
    handlers: Mutex<HashMap<String, Vec<(Subscription, Handler)>>>,
    state: Mutex<ConnectionState>,
    task: Mutex<Option<JoinHandle<()>>>,
    attempts: AtomicU32,
    next_subscription: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Event-dispatching WebSocket client. Cheap to clone.
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("connected", &self.is_connected())
            .field("attempts", &self.inner.attempts.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl RealtimeClient {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_policy(config, ReconnectPolicy::default())
    }

    #[must_use]
    pub fn with_policy(config: ClientConfig, policy: ReconnectPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                policy,
                handlers: Mutex::new(HashMap::new()),
                state: Mutex::new(ConnectionState::Idle),
                task: Mutex::new(None),
                attempts: AtomicU32::new(0),
                next_subscription: AtomicU64::new(1),
            }),
        }
    }

    /// Opens the channel for `user_id`.
    ///
    /// Does nothing while a connection is open or being established. Must be
    /// called from within a tokio runtime.
    pub fn connect(&self, user_id: &str) {
        {
            let mut state = lock(&self.inner.state);
            if !matches!(*state, ConnectionState::Idle) {
                debug!(user_id, "real-time channel already active");
                return;
            }
            *state = ConnectionState::Connecting;
        }

        let url = self.inner.config.realtime_url(user_id);
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move { inner.run(url).await });
        *lock(&self.inner.task) = Some(handle);
    }

    /// Closes the channel, drops every handler and resets the retry budget.
    pub fn disconnect(&self) {
        if let Some(handle) = lock(&self.inner.task).take() {
            handle.abort();
        }
        *lock(&self.inner.state) = ConnectionState::Idle;
        lock(&self.inner.handlers).clear();
        self.inner.attempts.store(0, Ordering::SeqCst);
        info!("real-time channel disconnected");
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(*lock(&self.inner.state), ConnectionState::Open(_))
    }

    /// Registers `handler` for messages whose event is `event`.
    pub fn on(
        &self,
        event: impl Into<String>,
        handler: impl Fn(&JsonValue) + Send + Sync + 'static,
    ) -> Subscription {
        let subscription = Subscription {
            id: self.inner.next_subscription.fetch_add(1, Ordering::Relaxed),
        };
        lock(&self.inner.handlers)
            .entry(event.into())
            .or_default()
            .push((subscription, Arc::new(handler)));
        subscription
    }

    /// Removes one handler. Unknown subscriptions are ignored.
    pub fn off(&self, event: &str, subscription: Subscription) {
        let mut handlers = lock(&self.inner.handlers);
        if let Some(list) = handlers.get_mut(event) {
            list.retain(|(s, _)| *s != subscription);
            if list.is_empty() {
                handlers.remove(event);
            }
        }
    }

    /// Sends a message if the channel is open. Returns whether it was queued.
    pub fn send(&self, event: impl Into<String>, data: JsonValue) -> bool {
        let message = RealtimeMessage {
            event: event.into(),
            data,
            timestamp: Some(Utc::now()),
        };
        let state = lock(&self.inner.state);
        let ConnectionState::Open(outbound) = &*state else {
            warn!(event = %message.event, "real-time channel not open; dropping message");
            return false;
        };
        match serde_json::to_string(&message) {
            Ok(text) => outbound.send(WsMessage::Text(text.into())).is_ok(),
            Err(e) => {
                error!(event = %message.event, error = %e, "failed to encode message");
                false
            }
        }
    }
}

impl Inner {
    async fn run(self: Arc<Self>, url: String) {
        loop {
            info!(%url, "connecting real-time channel");
            match tokio_tungstenite::connect_async(&url).await {
                Ok((stream, _)) => {
                    self.attempts.store(0, Ordering::SeqCst);
                    let (tx, rx) = mpsc::unbounded_channel();
                    *lock(&self.state) = ConnectionState::Open(tx);
                    info!("real-time channel open");

                    self.pump(stream, rx).await;

                    *lock(&self.state) = ConnectionState::Connecting;
                    info!("real-time channel closed");
                }
                Err(e) => warn!(error = %e, "real-time connection failed"),
            }

            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let Some(delay) = self.policy.delay(attempt) else {
                error!(attempts = attempt - 1, "giving up on real-time channel");
                *lock(&self.state) = ConnectionState::Idle;
                return;
            };
            debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
            tokio::time::sleep(delay).await;
        }
    }

    async fn pump<S>(&self, stream: S, mut outbound: mpsc::UnboundedReceiver<WsMessage>)
    where
        S: futures::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
            + futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut write, mut read) = stream.split();
        loop {
            tokio::select! {
                queued = outbound.recv() => {
                    let Some(message) = queued else { break };
                    if let Err(e) = write.send(message).await {
                        warn!(error = %e, "real-time send failed");
                        break;
                    }
                }
                incoming = read.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => self.dispatch(text.as_str()),
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "real-time channel error");
                        break;
                    }
                },
            }
        }
    }

    fn dispatch(&self, text: &str) {
        let message: RealtimeMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "ignoring malformed real-time message");
                return;
            }
        };

        let handlers: Vec<Handler> = lock(&self.handlers)
            .get(&message.event)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        debug!(event = %message.event, handlers = handlers.len(), "dispatching real-time message");

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&message.data))).is_err() {
                error!(event = %message.event, "real-time handler panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;

    #[test]
    fn backoff_doubles_then_gives_up() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<_> = (1..=6).map(|a| policy.delay(a)).collect();
        assert_eq!(
            delays,
            vec![
                Some(Duration::from_secs(1)),
                Some(Duration::from_secs(2)),
                Some(Duration::from_secs(4)),
                Some(Duration::from_secs(8)),
                Some(Duration::from_secs(16)),
                None,
            ]
        );
    }

    #[test]
    fn dispatch_routes_by_event_and_survives_panics() {
        let client = RealtimeClient::new(ClientConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        client.on("run.updated", |_| panic!("handler bug"));
        let sink = seen.clone();
        client.on("run.updated", move |data| {
            sink.lock().unwrap().push(data["status"].as_str().unwrap_or("").to_string());
        });
        let other = seen.clone();
        let subscription = client.on("task.updated", move |_| {
            other.lock().unwrap().push("task".to_string());
        });
        client.off("task.updated", subscription);

        let frame = json!({ "event": "run.updated", "data": { "status": "COMPLETED" }, "timestamp": "2024-05-01T12:00:00Z" });
        client.inner.dispatch(&frame.to_string());
        let frame = json!({ "event": "task.updated", "data": {}, "timestamp": "2024-05-01T12:00:00Z" });
        client.inner.dispatch(&frame.to_string());
        client.inner.dispatch("not json");

        assert_eq!(*seen.lock().unwrap(), vec!["COMPLETED".to_string()]);
    }

    #[test]
    fn dispatch_accepts_millis_and_missing_timestamps() {
        let client = RealtimeClient::new(ClientConfig::default());
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        client.on("run.updated", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let frame = json!({ "event": "run.updated", "data": { "id": "r1" }, "timestamp": 1_714_560_000_000_i64 });
        client.inner.dispatch(&frame.to_string());
        let frame = json!({ "event": "run.updated", "data": { "id": "r1" } });
        client.inner.dispatch(&frame.to_string());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn message_timestamp_is_epoch_millis() {
        let message: RealtimeMessage =
            serde_json::from_value(json!({ "event": "ping", "timestamp": 1_714_560_000_000_i64 }))
                .expect("deserialize");
        assert_eq!(message.timestamp.map(|at| at.timestamp_millis()), Some(1_714_560_000_000));
        assert_eq!(message.data, JsonValue::Null);

        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["timestamp"], 1_714_560_000_000_i64);
    }

    #[test]
    fn send_requires_open_channel() {
        let client = RealtimeClient::new(ClientConfig::default());
        assert!(!client.send("ping", JsonValue::Null));
    }

    #[tokio::test]
    async fn exchanges_messages_with_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("handshake");
            let push = json!({ "event": "run.updated", "data": { "id": "r1" }, "timestamp": Utc::now() });
            ws.send(WsMessage::Text(push.to_string().into())).await.expect("push");

            while let Some(Ok(msg)) = ws.next().await {
                if let WsMessage::Text(text) = msg {
                    return serde_json::from_str::<RealtimeMessage>(text.as_str()).expect("message");
                }
            }
            panic!("client never sent a message");
        });

        let config = ClientConfig {
            ws_base_url: format!("ws://{addr}"),
            ..ClientConfig::default()
        };
        let client = RealtimeClient::new(config);
        let (tx, mut rx) = mpsc::unbounded_channel();
        client.on("run.updated", move |data| {
            let _ = tx.send(data.clone());
        });
        client.connect("u-1");
        client.connect("u-1");

        let pushed = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timely push")
            .expect("push");
        assert_eq!(pushed["id"], "r1");
        assert!(client.is_connected());

        assert!(client.send("subscribe", json!({ "runId": "r1" })));
        let received = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("timely reply")
            .expect("server task");
        assert_eq!(received.event, "subscribe");
        assert_eq!(received.data["runId"], "r1");

        client.disconnect();
        assert!(!client.is_connected());
    }
}
