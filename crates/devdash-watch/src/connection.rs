//! WebSocket connection management.
//!
//! [`ConnectionManager`] owns one logical connection to the dashboard's
//! WebSocket endpoint. A background task keeps the socket open, reconnecting
//! with exponential backoff; the manager tracks which contexts are failing and
//! replays every registered subscription, in registration order, each time the
//! socket (re)opens.

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use url::Url;

use crate::alert::{self, Alert, AlertSink};
use crate::error::{Result, WatchError};
use crate::protocol::{Channel, SubscribeParams, SubscriptionRequest};

/// Context name used when none is configured.
pub const DEFAULT_CONTEXT: &str = "websocket";

/// Close code for a normal closure.
const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the peer sent no status.
const CLOSE_NO_STATUS: u16 = 1005;

/// Connection status for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected, and not trying to be.
    Disconnected,
    /// First connection attempt in progress.
    Connecting,
    /// Connected and ready.
    Connected,
    /// Connection failed or dropped, will retry.
    Reconnecting { attempt: u32 },
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting..."),
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting ({})", attempt),
        }
    }
}

/// How the peer closed the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseInfo {
    pub fn new(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    fn from_frame(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self::new(Some(u16::from(frame.code)), frame.reason.as_str()),
            None => Self::new(None, ""),
        }
    }

    /// Whether the code is one that carries no information (normal closure
    /// or no status at all).
    pub fn is_sentinel(&self) -> bool {
        matches!(self.code, None | Some(CLOSE_NORMAL) | Some(CLOSE_NO_STATUS))
    }

    /// User-facing warning for this close, if it deserves one.
    pub fn warning(&self) -> Option<Alert> {
        let reason = self.reason.trim();
        if self.is_sentinel() || reason.is_empty() {
            return None;
        }
        Some(Alert::new(
            format!("websocket-close-{}", self.code.unwrap_or_default()),
            format!("Connection to the workspace server closed: {}", reason),
        ))
    }
}

/// Called with the context name whenever a context starts failing.
pub type FailureListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Settings for a [`ConnectionManager`].
#[derive(Clone)]
pub struct ConnectionOptions {
    /// Name of the connection context reported to failure listeners.
    pub context: String,
    /// Bearer token sent with the upgrade request.
    pub auth_token: Option<String>,
    /// Backoff before the first retry; doubled on every further attempt.
    pub initial_backoff: Duration,
    /// Upper bound on the backoff.
    pub max_backoff: Duration,
    /// Receiver of user-visible warnings.
    pub alerts: Option<AlertSink>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT.to_string(),
            auth_token: None,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            alerts: None,
        }
    }
}

impl std::fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("context", &self.context)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("initial_backoff", &self.initial_backoff)
            .field("max_backoff", &self.max_backoff)
            .finish_non_exhaustive()
    }
}

fn backoff(options: &ConnectionOptions, attempt: u32) -> Duration {
    options
        .initial_backoff
        .saturating_mul(2u32.saturating_pow(attempt.min(10)))
        .min(options.max_backoff)
}

struct Registration {
    channel: Channel,
    params: SubscribeParams,
}

#[derive(Default)]
struct State {
    open: bool,
    failing: Vec<String>,
    subscriptions: Vec<Registration>,
    listeners: Vec<FailureListener>,
}

struct Inner {
    url: Url,
    options: ConnectionOptions,
    state: Mutex<State>,
    outbound_tx: Mutex<mpsc::UnboundedSender<SubscriptionRequest>>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<SubscriptionRequest>>>,
    inbound_tx: mpsc::UnboundedSender<String>,
    status_tx: watch::Sender<ConnectionStatus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

/// One logical WebSocket connection plus its subscription registry.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager for `url`. Text frames received on the socket are
    /// forwarded, in order, to `inbound`.
    ///
    /// Nothing is opened until [`connect`](Self::connect) is called.
    pub fn new(
        url: Url,
        options: ConnectionOptions,
        inbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            inner: Arc::new(Inner {
                url,
                options,
                state: Mutex::new(State::default()),
                outbound_tx: Mutex::new(outbound_tx),
                outbound_rx: Mutex::new(Some(outbound_rx)),
                inbound_tx: inbound,
                status_tx,
                task: Mutex::new(None),
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn context(&self) -> &str {
        &self.inner.options.context
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status_tx.borrow()
    }

    /// Watch status changes.
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Open the connection if it is not already being maintained.
    ///
    /// Resolves once the first connection attempt has settled, successfully
    /// or not. Failures are not returned: they reach failure listeners and the
    /// background task keeps retrying.
    pub async fn connect(&self) {
        let mut status = self.inner.status_tx.subscribe();
        {
            let mut task = self.inner.task.lock();
            if task.is_none() {
                let Some(outbound_rx) = self.inner.outbound_rx.lock().take() else {
                    return;
                };
                self.inner
                    .status_tx
                    .send_replace(ConnectionStatus::Connecting);
                *task = Some(tokio::spawn(connection_loop(
                    Arc::downgrade(&self.inner),
                    outbound_rx,
                )));
            }
        }
        let _ = status
            .wait_for(|s| !matches!(s, ConnectionStatus::Connecting))
            .await;
    }

    /// Stop maintaining the connection. Registered subscriptions are kept
    /// and replayed by a later [`connect`](Self::connect).
    pub fn shutdown(&self) {
        let mut task = self.inner.task.lock();
        if let Some(task) = task.take() {
            task.abort();
            // The aborted loop owned the receiver; requests queued from now on
            // go to a fresh channel for the next loop.
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            *self.inner.outbound_tx.lock() = outbound_tx;
            *self.inner.outbound_rx.lock() = Some(outbound_rx);
        }
        self.inner.state.lock().open = false;
        self.inner
            .status_tx
            .send_replace(ConnectionStatus::Disconnected);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a channel subscription and send it if the socket is open.
    ///
    /// A channel is registered at most once: subscribing again replaces its
    /// params but keeps its position in the replay order, and is only resent
    /// when the params actually changed.
    pub fn subscribe(&self, channel: Channel, params: SubscribeParams) {
        let send = {
            let mut state = self.inner.state.lock();
            let changed = match state.subscriptions.iter_mut().find(|r| r.channel == channel) {
                Some(existing) if existing.params == params => false,
                Some(existing) => {
                    existing.params = params.clone();
                    true
                }
                None => {
                    state.subscriptions.push(Registration {
                        channel,
                        params: params.clone(),
                    });
                    true
                }
            };
            changed && state.open
        };
        if send {
            self.send(SubscriptionRequest::subscribe(channel, params));
        }
    }

    /// Remove a channel subscription, telling the server if the socket is open.
    pub fn unsubscribe(&self, channel: Channel) {
        let removed = {
            let mut state = self.inner.state.lock();
            let pos = state.subscriptions.iter().position(|r| r.channel == channel);
            let removed = pos.map(|pos| state.subscriptions.remove(pos));
            removed.filter(|_| state.open)
        };
        if let Some(registration) = removed {
            self.send(SubscriptionRequest::unsubscribe(
                registration.channel,
                registration.params,
            ));
        }
    }

    /// Channels currently registered, in replay order.
    pub fn subscriptions(&self) -> Vec<(Channel, SubscribeParams)> {
        self.inner
            .state
            .lock()
            .subscriptions
            .iter()
            .map(|r| (r.channel, r.params.clone()))
            .collect()
    }

    /// Remember the latest resource version seen on the stream so a replay
    /// resumes from there instead of from the original cursor.
    pub fn update_resource_version(&self, resource_version: &str) {
        let mut state = self.inner.state.lock();
        for registration in &mut state.subscriptions {
            registration.params.resource_version = Some(resource_version.to_string());
        }
    }

    fn send(&self, request: SubscriptionRequest) {
        tracing::debug!(
            request = ?request.request,
            channel = %request.channel,
            namespace = %request.params.namespace,
            "queueing subscription request"
        );
        if self.inner.outbound_tx.lock().send(request).is_err() {
            tracing::debug!("connection task gone, request dropped");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport callbacks
    // ─────────────────────────────────────────────────────────────────────────

    /// The transport (re)established `context`: mark it healthy and replay
    /// every registered subscription in registration order.
    pub fn on_open(&self, context: &str) {
        let replay: Vec<SubscriptionRequest> = {
            let mut state = self.inner.state.lock();
            state.open = true;
            state.failing.retain(|c| c != context);
            state
                .subscriptions
                .iter()
                .map(|r| SubscriptionRequest::subscribe(r.channel, r.params.clone()))
                .collect()
        };
        tracing::info!(context, subscriptions = replay.len(), "connection open");
        for request in replay {
            self.send(request);
        }
    }

    /// The transport reports `context` as failing.
    pub fn on_failing(&self, context: &str) {
        let listeners = {
            let mut state = self.inner.state.lock();
            state.open = false;
            if !state.failing.iter().any(|c| c == context) {
                state.failing.push(context.to_string());
            }
            state.listeners.clone()
        };
        tracing::warn!(context, "connection failing");
        for listener in listeners {
            listener(context);
        }
    }

    /// The transport was closed by the peer.
    pub fn on_close(&self, info: &CloseInfo) {
        self.inner.state.lock().open = false;
        match info.warning() {
            Some(warning) => alert::raise(self.inner.options.alerts.as_ref(), warning),
            None => tracing::info!(code = ?info.code, reason = %info.reason, "connection closed"),
        }
    }

    /// Snapshot of the contexts currently failing.
    pub fn failing_contexts(&self) -> Vec<String> {
        self.inner.state.lock().failing.clone()
    }

    /// Register a listener for failing contexts.
    pub fn add_failure_listener(&self, listener: impl Fn(&str) + Send + Sync + 'static) {
        self.inner.state.lock().listeners.push(Arc::new(listener));
    }

    /// Remove every failure listener and forget the failing contexts.
    ///
    /// The connection itself stays open.
    pub fn remove_failure_listeners(&self) {
        let mut state = self.inner.state.lock();
        state.listeners.clear();
        state.failing.clear();
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.inner.status_tx.send_replace(status);
    }

    fn connect_request(&self) -> Result<Request> {
        let mut request = self.inner.url.as_str().into_client_request()?;
        if let Some(token) = &self.inner.options.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| WatchError::InvalidToken)?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(request)
    }

    #[cfg(test)]
    fn drain_outbound(&self) -> Vec<SubscriptionRequest> {
        let mut guard = self.inner.outbound_rx.lock();
        let mut drained = Vec::new();
        if let Some(rx) = guard.as_mut() {
            while let Ok(request) = rx.try_recv() {
                drained.push(request);
            }
        }
        drained
    }
}

/// Why a live connection ended.
enum Disconnect {
    /// The manager or the inbound consumer went away.
    Shutdown,
    /// Peer sent a close frame.
    Closed(CloseInfo),
    /// Transport error.
    Failed(String),
}

fn upgrade(inner: &Weak<Inner>) -> Option<ConnectionManager> {
    inner.upgrade().map(|inner| ConnectionManager { inner })
}

/// Connection loop that handles reconnection with exponential backoff.
///
/// Holds only a weak reference to the manager between steps so dropping the
/// last manager ends the loop.
async fn connection_loop(
    inner: Weak<Inner>,
    mut outbound_rx: mpsc::UnboundedReceiver<SubscriptionRequest>,
) {
    let mut attempt = 0u32;

    loop {
        let Some(manager) = upgrade(&inner) else {
            return;
        };
        let context = manager.context().to_string();
        let options = manager.inner.options.clone();
        let inbound_tx = manager.inner.inbound_tx.clone();

        manager.set_status(if attempt == 0 {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Reconnecting { attempt }
        });

        let request = match manager.connect_request() {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(url = %manager.url(), "cannot build connect request: {}", e);
                manager.on_failing(&context);
                manager.set_status(ConnectionStatus::Disconnected);
                return;
            }
        };
        tracing::info!(url = %manager.url(), "connecting");
        drop(manager);

        match connect_async(request).await {
            Ok((ws_stream, _)) => {
                attempt = 0;
                let Some(manager) = upgrade(&inner) else {
                    return;
                };
                // Anything queued while disconnected is superseded by the replay.
                while outbound_rx.try_recv().is_ok() {}
                manager.on_open(&context);
                manager.set_status(ConnectionStatus::Connected);
                drop(manager);

                let outcome = handle_connection(ws_stream, &mut outbound_rx, &inbound_tx).await;

                let Some(manager) = upgrade(&inner) else {
                    return;
                };
                match outcome {
                    Disconnect::Shutdown => {
                        manager.inner.state.lock().open = false;
                        manager.set_status(ConnectionStatus::Disconnected);
                        return;
                    }
                    Disconnect::Closed(info) => manager.on_close(&info),
                    Disconnect::Failed(reason) => {
                        tracing::warn!("connection lost: {}", reason);
                        manager.on_failing(&context);
                    }
                }
            }
            Err(e) => {
                tracing::warn!("connection failed: {}", e);
                let Some(manager) = upgrade(&inner) else {
                    return;
                };
                manager.on_failing(&context);
            }
        }

        attempt += 1;
        if let Some(manager) = upgrade(&inner) {
            manager.set_status(ConnectionStatus::Reconnecting { attempt });
        }
        let delay = backoff(&options, attempt);
        tracing::debug!("reconnecting in {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

/// Pump one open socket until it ends.
async fn handle_connection(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    outbound_rx: &mut mpsc::UnboundedReceiver<SubscriptionRequest>,
    inbound_tx: &mpsc::UnboundedSender<String>,
) -> Disconnect {
    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    loop {
        tokio::select! {
            request = outbound_rx.recv() => {
                let Some(request) = request else {
                    let _ = ws_sink.close().await;
                    return Disconnect::Shutdown;
                };
                let json = match serde_json::to_string(&request) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("failed to serialize request: {}", e);
                        continue;
                    }
                };
                if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                    tracing::error!("failed to send request: {}", e);
                    return Disconnect::Failed(e.to_string());
                }
            }

            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if inbound_tx.send(text.as_str().to_owned()).is_err() {
                            return Disconnect::Shutdown;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                    Some(Ok(Message::Binary(_))) => {
                        tracing::warn!("unexpected binary frame");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return Disconnect::Closed(CloseInfo::from_frame(frame));
                    }
                    Some(Err(e)) => return Disconnect::Failed(e.to_string()),
                    None => return Disconnect::Failed("stream ended".to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConnectionManager {
        let (tx, _rx) = mpsc::unbounded_channel();
        ConnectionManager::new(
            Url::parse("ws://127.0.0.1:1/dashboard/api/websocket").unwrap(),
            ConnectionOptions::default(),
            tx,
        )
    }

    fn params(ns: &str, rv: Option<&str>) -> SubscribeParams {
        SubscribeParams::new(ns, rv.map(str::to_string))
    }

    fn channels(requests: &[SubscriptionRequest]) -> Vec<Channel> {
        requests.iter().map(|r| r.channel).collect()
    }

    #[test]
    fn test_subscribe_while_closed_only_registers() {
        let conn = manager();
        conn.subscribe(Channel::Modified, params("ns1", None));

        assert!(conn.drain_outbound().is_empty());
        assert_eq!(conn.subscriptions().len(), 1);
    }

    #[test]
    fn test_reopen_replays_in_registration_order() {
        let conn = manager();
        conn.subscribe(Channel::Deleted, params("ns1", Some("7")));
        conn.subscribe(Channel::Modified, params("ns1", Some("7")));
        conn.subscribe(Channel::Added, params("ns1", Some("7")));

        conn.on_open(DEFAULT_CONTEXT);
        let first = conn.drain_outbound();
        assert_eq!(
            channels(&first),
            vec![Channel::Deleted, Channel::Modified, Channel::Added]
        );

        conn.on_failing(DEFAULT_CONTEXT);
        assert_eq!(conn.failing_contexts(), vec![DEFAULT_CONTEXT.to_string()]);

        conn.on_open(DEFAULT_CONTEXT);
        let replay = conn.drain_outbound();
        assert_eq!(replay, first);
        assert!(conn.failing_contexts().is_empty());
    }

    #[test]
    fn test_resubscribe_is_idempotent() {
        let conn = manager();
        conn.on_open(DEFAULT_CONTEXT);

        conn.subscribe(Channel::Modified, params("ns1", None));
        conn.subscribe(Channel::Modified, params("ns1", None));
        assert_eq!(conn.drain_outbound().len(), 1);

        conn.subscribe(Channel::Modified, params("ns2", None));
        let sent = conn.drain_outbound();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].params.namespace, "ns2");
        assert_eq!(conn.subscriptions().len(), 1);
    }

    #[test]
    fn test_resubscribe_keeps_position() {
        let conn = manager();
        conn.subscribe(Channel::Modified, params("ns1", None));
        conn.subscribe(Channel::Added, params("ns1", None));
        conn.subscribe(Channel::Modified, params("ns1", Some("9")));

        let order: Vec<_> = conn.subscriptions().into_iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![Channel::Modified, Channel::Added]);
    }

    #[test]
    fn test_unsubscribe() {
        let conn = manager();
        conn.subscribe(Channel::Modified, params("ns1", None));
        conn.subscribe(Channel::Added, params("ns1", None));
        conn.on_open(DEFAULT_CONTEXT);
        conn.drain_outbound();

        conn.unsubscribe(Channel::Modified);
        let sent = conn.drain_outbound();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], SubscriptionRequest::unsubscribe(Channel::Modified, params("ns1", None)));

        conn.unsubscribe(Channel::Modified);
        assert!(conn.drain_outbound().is_empty());

        conn.on_open(DEFAULT_CONTEXT);
        assert_eq!(channels(&conn.drain_outbound()), vec![Channel::Added]);
    }

    #[test]
    fn test_replay_uses_latest_resource_version() {
        let conn = manager();
        conn.subscribe(Channel::Modified, params("ns1", Some("1")));
        conn.subscribe(Channel::Added, params("ns1", Some("1")));
        conn.update_resource_version("55");

        conn.on_open(DEFAULT_CONTEXT);
        let replay = conn.drain_outbound();
        assert!(
            replay
                .iter()
                .all(|r| r.params.resource_version.as_deref() == Some("55"))
        );
    }

    #[test]
    fn test_failure_listeners() {
        let conn = manager();
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        conn.add_failure_listener(move |ctx| sink.lock().push(ctx.to_string()));

        conn.on_failing("a");
        conn.on_failing("b");
        conn.on_failing("a");
        assert_eq!(*seen.lock(), vec!["a", "b", "a"]);
        assert_eq!(conn.failing_contexts(), vec!["a", "b"]);

        let snapshot = conn.failing_contexts();
        conn.remove_failure_listeners();
        assert_eq!(snapshot.len(), 2);
        assert!(conn.failing_contexts().is_empty());

        conn.on_failing("c");
        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn test_close_warning_rules() {
        assert!(CloseInfo::new(Some(1000), "bye").warning().is_none());
        assert!(CloseInfo::new(Some(1005), "").warning().is_none());
        assert!(CloseInfo::new(None, "").warning().is_none());
        assert!(CloseInfo::new(Some(1006), "  ").warning().is_none());

        let warning = CloseInfo::new(Some(1011), "token expired").warning().unwrap();
        assert_eq!(warning.key, "websocket-close-1011");
        assert!(warning.title.contains("token expired"));
    }

    #[test]
    fn test_on_close_raises_alert() {
        let alerts = Arc::new(Mutex::new(Vec::<Alert>::new()));
        let sink = alerts.clone();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = ConnectionManager::new(
            Url::parse("ws://127.0.0.1:1/").unwrap(),
            ConnectionOptions {
                alerts: Some(Arc::new(move |a| sink.lock().push(a))),
                ..Default::default()
            },
            tx,
        );

        conn.on_close(&CloseInfo::new(Some(1000), "normal"));
        conn.on_close(&CloseInfo::new(Some(4001), "namespace deleted"));
        assert_eq!(alerts.lock().len(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let options = ConnectionOptions::default();
        assert_eq!(backoff(&options, 1), Duration::from_millis(200));
        assert_eq!(backoff(&options, 3), Duration::from_millis(800));
        assert_eq!(backoff(&options, 50), Duration::from_secs(30));
    }

    #[test]
    fn test_connect_request_carries_token() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = ConnectionManager::new(
            Url::parse("wss://che.example.com/dashboard/api/websocket").unwrap(),
            ConnectionOptions {
                auth_token: Some("tok".to_string()),
                ..Default::default()
            },
            tx,
        );
        let request = conn.connect_request().unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok");
        assert_eq!(request.uri().path(), "/dashboard/api/websocket");
    }

    #[test]
    fn test_connection_status_display() {
        assert_eq!(ConnectionStatus::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
        assert_eq!(
            ConnectionStatus::Reconnecting { attempt: 3 }.to_string(),
            "reconnecting (3)"
        );
    }

    #[tokio::test]
    async fn test_connect_again_after_shutdown() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<String>();
        let server = tokio::spawn(async move {
            for _ in 0..2 {
                let (stream, _) = listener.accept().await.unwrap();
                let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                let frames_tx = frames_tx.clone();
                tokio::spawn(async move {
                    while let Some(Ok(message)) = ws.next().await {
                        if let Message::Text(text) = message {
                            let _ = frames_tx.send(text.as_str().to_owned());
                        }
                    }
                });
            }
        });

        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = ConnectionManager::new(
            Url::parse(&format!("ws://{addr}/dashboard/api/websocket")).unwrap(),
            ConnectionOptions::default(),
            tx,
        );
        conn.connect().await;
        assert_eq!(conn.status(), ConnectionStatus::Connected);

        conn.shutdown();
        assert_eq!(conn.status(), ConnectionStatus::Disconnected);
        conn.subscribe(Channel::Modified, params("ns1", None));

        conn.connect().await;
        assert_eq!(conn.status(), ConnectionStatus::Connected);

        let replayed = tokio::time::timeout(Duration::from_secs(5), frames_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let request: SubscriptionRequest = serde_json::from_str(&replayed).unwrap();
        assert_eq!(request, SubscriptionRequest::subscribe(Channel::Modified, params("ns1", None)));

        conn.shutdown();
        server.await.unwrap();
    }
}
