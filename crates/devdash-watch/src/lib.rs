//! Workspace status subscriptions over the dashboard WebSocket.
//!
//! The pieces, in the order an inbound frame travels through them:
//!
//! - [`ConnectionManager`] keeps one WebSocket open (reconnecting with
//!   backoff), tracks which connection contexts are failing and replays the
//!   registered channel subscriptions whenever the socket reopens.
//! - [`ChannelDispatcher`] decodes each frame into a [`ChannelEvent`] and
//!   routes it to the handler registered for its channel. Anything that does
//!   not decode is dropped with a warning.
//! - [`StatusReconciler`] diffs `modified` workspaces against the last status
//!   seen per namespace and workspace id, producing [`StatusUpdate`]s.
//! - [`WorkspaceWatcher`] wires the three together for a single active
//!   [`Subscriber`], and [`DevWorkspaceClient`] pairs it with the REST client.

pub mod alert;
pub mod connection;
pub mod devworkspace;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod reconciler;
pub mod watcher;

pub use alert::{Alert, AlertSink};
pub use connection::{
    CloseInfo, ConnectionManager, ConnectionOptions, ConnectionStatus, FailureListener,
};
pub use devworkspace::DevWorkspaceClient;
pub use dispatcher::{ChannelDispatcher, ChannelEvent, DispatchOutcome, MalformedEvent};
pub use error::{Result, WatchError};
pub use protocol::{Channel, RequestKind, SubscribeParams, SubscriptionRequest};
pub use reconciler::{StatusReconciler, StatusStore, StatusUpdate};
pub use watcher::{Subscriber, SubscriberCallbacks, WorkspaceWatcher, websocket_url};
