//! Subscriber facade over the connection, dispatcher and reconciler.

use std::sync::Arc;

use async_trait::async_trait;
use devdash_client::{DevdashClient, Phase, Workspace};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::alert::AlertSink;
use crate::connection::{ConnectionManager, ConnectionOptions};
use crate::dispatcher::ChannelDispatcher;
use crate::error::{Result, WatchError};
use crate::protocol::{Channel, SubscribeParams};
use crate::reconciler::{StatusReconciler, StatusUpdate};

/// Path of the WebSocket endpoint relative to the server root.
const WEBSOCKET_PATH: &str = "dashboard/api/websocket";

/// Derive the WebSocket endpoint from a dashboard server URL.
///
/// `http` becomes `ws` and `https` becomes `wss`; `ws`/`wss` URLs are used
/// as the server root unchanged.
pub fn websocket_url(server: &Url) -> Result<Url> {
    let scheme = match server.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(WatchError::UnsupportedScheme(other.to_string())),
    };

    let mut base = server.clone();
    base.set_scheme(scheme)
        .map_err(|_| WatchError::UnsupportedScheme(server.scheme().to_string()))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(WEBSOCKET_PATH)?)
}

/// What a subscriber provides to the watcher.
///
/// Only the resource version is asked for asynchronously, during
/// [`WorkspaceWatcher::subscribe`]. The update methods run on the dispatch
/// task, one event at a time, and should return quickly.
#[async_trait]
pub trait SubscriberCallbacks: Send + Sync {
    /// Cursor the subscription should resume from, if any.
    async fn resource_version(&self) -> Option<String>;

    fn update_status(&self, update: StatusUpdate);

    fn update_deleted(&self, workspace_ids: Vec<String>);

    fn update_added(&self, workspaces: Vec<Workspace>);
}

/// The namespace being watched and where its events go.
#[derive(Clone)]
pub struct Subscriber {
    pub namespace: String,
    pub callbacks: Arc<dyn SubscriberCallbacks>,
}

impl Subscriber {
    pub fn new(namespace: impl Into<String>, callbacks: Arc<dyn SubscriberCallbacks>) -> Self {
        Self {
            namespace: namespace.into(),
            callbacks,
        }
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Shared {
    subscriber: Mutex<Option<Subscriber>>,
    reconciler: Mutex<StatusReconciler>,
}

impl Shared {
    fn subscriber(&self) -> Option<Subscriber> {
        self.subscriber.lock().clone()
    }

    /// The active subscriber, if `workspace` belongs to its namespace.
    ///
    /// Events from another namespace arrive after a subscriber switch, while
    /// the server still streams the old subscription.
    fn watching(&self, workspace: &Workspace) -> Option<Subscriber> {
        let subscriber = self.subscriber()?;
        if subscriber.namespace != workspace.namespace() {
            tracing::debug!(
                namespace = %workspace.namespace(),
                watching = %subscriber.namespace,
                workspace = %workspace.id(),
                "ignoring event from another namespace"
            );
            return None;
        }
        Some(subscriber)
    }
}

/// Watches the workspaces of one subscriber's namespace.
///
/// Owns a [`ConnectionManager`] and a dispatch task that feeds every inbound
/// frame through a [`ChannelDispatcher`]. Dropping the watcher stops both.
pub struct WorkspaceWatcher {
    connection: ConnectionManager,
    shared: Arc<Shared>,
    dispatch_task: JoinHandle<()>,
}

impl WorkspaceWatcher {
    /// Create a watcher for the WebSocket endpoint at `url`.
    ///
    /// Must be called inside a Tokio runtime. Nothing is opened until
    /// [`subscribe`](Self::subscribe).
    pub fn new(url: Url, options: ConnectionOptions) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let alerts = options.alerts.clone();
        let connection = ConnectionManager::new(url, options, inbound_tx);
        let shared = Arc::new(Shared::default());

        let dispatcher = build_dispatcher(connection.clone(), shared.clone(), alerts);
        let dispatch_task = tokio::spawn(dispatch_loop(dispatcher, inbound_rx));

        Self {
            connection,
            shared,
            dispatch_task,
        }
    }

    /// Create a watcher for the same server and credentials as `client`.
    pub fn from_client(client: &DevdashClient, alerts: Option<AlertSink>) -> Result<Self> {
        let url = websocket_url(client.base_url())?;
        let options = ConnectionOptions {
            auth_token: client.auth_token().map(str::to_string),
            alerts,
            ..Default::default()
        };
        Ok(Self::new(url, options))
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Make `subscriber` the active one, replacing any previous subscriber.
    pub fn set_subscriber(&self, subscriber: Subscriber) {
        tracing::debug!(namespace = %subscriber.namespace, "subscriber set");
        *self.shared.subscriber.lock() = Some(subscriber);
    }

    pub fn subscriber(&self) -> Option<Subscriber> {
        self.shared.subscriber()
    }

    /// Connect and register every channel for the active subscriber.
    ///
    /// Fails with [`WatchError::NoSubscriber`] before touching the network
    /// when no subscriber is set. Transport failures are not returned: the
    /// registrations are kept and sent once the connection opens.
    pub async fn subscribe(&self) -> Result<()> {
        let subscriber = self.shared.subscriber().ok_or(WatchError::NoSubscriber)?;

        self.connection.connect().await;
        let resource_version = subscriber.callbacks.resource_version().await;

        tracing::info!(
            namespace = %subscriber.namespace,
            resource_version = ?resource_version,
            "subscribing to workspace events"
        );
        let params = SubscribeParams::new(subscriber.namespace.as_str(), resource_version);
        for channel in Channel::ALL {
            self.connection.subscribe(channel, params.clone());
        }
        Ok(())
    }

    /// Unregister every channel. The connection stays open.
    pub fn unsubscribe(&self) {
        for channel in Channel::ALL {
            self.connection.unsubscribe(channel);
        }
    }

    /// Forget the last forwarded message of a workspace.
    pub fn forget_message(&self, workspace_id: &str) -> bool {
        self.shared.reconciler.lock().forget_message(workspace_id)
    }

    /// Last status observed for a workspace.
    pub fn last_status(&self, namespace: &str, workspace_id: &str) -> Option<Phase> {
        self.shared
            .reconciler
            .lock()
            .last_status(namespace, workspace_id)
    }
}

impl Drop for WorkspaceWatcher {
    fn drop(&mut self) {
        self.dispatch_task.abort();
        self.connection.shutdown();
    }
}

fn build_dispatcher(
    connection: ConnectionManager,
    shared: Arc<Shared>,
    alerts: Option<AlertSink>,
) -> ChannelDispatcher {
    let mut dispatcher = match alerts {
        Some(sink) => ChannelDispatcher::new().with_alert_sink(sink),
        None => ChannelDispatcher::new(),
    };

    let (conn, state) = (connection.clone(), shared.clone());
    dispatcher.on_modified(move |workspace| {
        let Some(subscriber) = state.watching(&workspace) else {
            return;
        };
        track_resource_version(&conn, &workspace);
        let update = state
            .reconciler
            .lock()
            .reconcile(workspace.namespace(), &workspace);
        subscriber.callbacks.update_status(update);
    });

    let (conn, state) = (connection, shared.clone());
    dispatcher.on_added(move |workspace| {
        let Some(subscriber) = state.watching(&workspace) else {
            return;
        };
        track_resource_version(&conn, &workspace);
        subscriber.callbacks.update_added(vec![workspace]);
    });

    dispatcher.on_deleted(move |workspace_id| {
        if let Some(subscriber) = shared.subscriber() {
            subscriber.callbacks.update_deleted(vec![workspace_id]);
        }
    });

    dispatcher
}

fn track_resource_version(connection: &ConnectionManager, workspace: &Workspace) {
    if let Some(version) = workspace.resource_version() {
        connection.update_resource_version(version);
    }
}

async fn dispatch_loop(
    mut dispatcher: ChannelDispatcher,
    mut inbound_rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(frame) = inbound_rx.recv().await {
        let outcome = dispatcher.dispatch(&frame);
        tracing::trace!(?outcome, "frame dispatched");
    }
    tracing::debug!("inbound stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    #[async_trait]
    impl SubscriberCallbacks for Silent {
        async fn resource_version(&self) -> Option<String> {
            None
        }
        fn update_status(&self, _update: StatusUpdate) {}
        fn update_deleted(&self, _workspace_ids: Vec<String>) {}
        fn update_added(&self, _workspaces: Vec<Workspace>) {}
    }

    #[derive(Default)]
    struct Counting {
        statuses: Mutex<Vec<StatusUpdate>>,
        added: Mutex<Vec<Workspace>>,
    }

    #[async_trait]
    impl SubscriberCallbacks for Counting {
        async fn resource_version(&self) -> Option<String> {
            None
        }
        fn update_status(&self, update: StatusUpdate) {
            self.statuses.lock().push(update);
        }
        fn update_deleted(&self, _workspace_ids: Vec<String>) {}
        fn update_added(&self, workspaces: Vec<Workspace>) {
            self.added.lock().extend(workspaces);
        }
    }

    fn frame(channel: &str, namespace: &str, uid: &str, resource_version: &str) -> String {
        serde_json::json!({
            "channel": channel,
            "message": {
                "apiVersion": "workspace.devfile.io/v1alpha2",
                "kind": "DevWorkspace",
                "metadata": {
                    "name": format!("ws-{uid}"),
                    "namespace": namespace,
                    "uid": uid,
                    "resourceVersion": resource_version
                },
                "spec": { "started": true },
                "status": { "phase": "RUNNING" }
            }
        })
        .to_string()
    }

    fn unreachable_watcher() -> WorkspaceWatcher {
        WorkspaceWatcher::new(
            Url::parse("ws://127.0.0.1:1/dashboard/api/websocket").unwrap(),
            ConnectionOptions::default(),
        )
    }

    #[test]
    fn test_websocket_url() {
        let url = |s: &str| websocket_url(&Url::parse(s).unwrap()).unwrap().to_string();

        assert_eq!(
            url("http://localhost:8080"),
            "ws://localhost:8080/dashboard/api/websocket"
        );
        assert_eq!(
            url("https://che.example.com/"),
            "wss://che.example.com/dashboard/api/websocket"
        );
        assert_eq!(
            url("https://example.com/che"),
            "wss://example.com/che/dashboard/api/websocket"
        );
    }

    #[test]
    fn test_websocket_url_rejects_other_schemes() {
        let err = websocket_url(&Url::parse("ftp://example.com").unwrap()).unwrap_err();
        assert!(matches!(err, WatchError::UnsupportedScheme(s) if s == "ftp"));
    }

    #[tokio::test]
    async fn test_subscribe_without_subscriber() {
        let watcher = unreachable_watcher();
        let err = watcher.subscribe().await.unwrap_err();
        assert!(matches!(err, WatchError::NoSubscriber));
        assert!(watcher.connection().subscriptions().is_empty());
    }

    #[tokio::test]
    async fn test_set_subscriber_replaces_previous() {
        let watcher = unreachable_watcher();
        watcher.set_subscriber(Subscriber::new("ns1", Arc::new(Silent)));
        watcher.set_subscriber(Subscriber::new("ns2", Arc::new(Silent)));
        assert_eq!(watcher.subscriber().unwrap().namespace, "ns2");
    }

    #[tokio::test]
    async fn test_subscribe_registers_channels_while_unreachable() {
        let watcher = unreachable_watcher();
        watcher.set_subscriber(Subscriber::new("ns1", Arc::new(Silent)));

        watcher.subscribe().await.unwrap();

        let channels: Vec<_> = watcher
            .connection()
            .subscriptions()
            .into_iter()
            .map(|(channel, params)| {
                assert_eq!(params.namespace, "ns1");
                channel
            })
            .collect();
        assert_eq!(channels, Channel::ALL.to_vec());
        assert_eq!(watcher.connection().failing_contexts().len(), 1);
    }

    #[test]
    fn test_events_from_previous_namespace_are_ignored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = ConnectionManager::new(
            Url::parse("ws://127.0.0.1:1/dashboard/api/websocket").unwrap(),
            ConnectionOptions::default(),
            tx,
        );
        let shared = Arc::new(Shared::default());
        let mut dispatcher = build_dispatcher(connection.clone(), shared.clone(), None);

        let previous = Arc::new(Counting::default());
        let current = Arc::new(Counting::default());
        *shared.subscriber.lock() = Some(Subscriber::new("ns1", previous.clone()));
        *shared.subscriber.lock() = Some(Subscriber::new("ns2", current.clone()));
        connection.subscribe(Channel::Modified, SubscribeParams::new("ns2", None));

        dispatcher.dispatch(&frame("modified", "ns1", "w1", "7"));
        dispatcher.dispatch(&frame("added", "ns1", "w2", "8"));

        assert!(previous.statuses.lock().is_empty());
        assert!(current.statuses.lock().is_empty());
        assert!(current.added.lock().is_empty());
        assert_eq!(shared.reconciler.lock().last_status("ns2", "w1"), None);
        assert_eq!(shared.reconciler.lock().last_status("ns1", "w1"), None);
        assert_eq!(connection.subscriptions()[0].1.resource_version, None);

        dispatcher.dispatch(&frame("modified", "ns2", "w3", "9"));

        assert_eq!(current.statuses.lock().len(), 1);
        assert_eq!(
            shared.reconciler.lock().last_status("ns2", "w3"),
            Some(Phase::Running)
        );
        assert_eq!(
            connection.subscriptions()[0].1.resource_version.as_deref(),
            Some("9")
        );
    }
}
