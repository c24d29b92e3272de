//! Decoding and routing of inbound frames.
//!
//! Every frame is decoded into one [`ChannelEvent`] variant or rejected as a
//! [`MalformedEvent`]; there is no partially valid state. Rejected frames
//! raise one alert keyed by the channel name and are dropped.

use devdash_client::{DEVWORKSPACE_KIND, Workspace};
use serde_json::Value;

use crate::alert::{self, Alert, AlertSink};
use crate::protocol::{Channel, InboundEnvelope};

/// Alert key for frames that are not a valid envelope at all.
const ENVELOPE_KEY: &str = "envelope";

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Modified(Workspace),
    Added(Workspace),
    /// Id of the deleted workspace.
    Deleted(String),
}

/// A frame that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed event on '{channel}': {reason}")]
pub struct MalformedEvent {
    /// Channel name as received, or `"envelope"` when there was none.
    pub channel: String,
    pub reason: String,
}

impl MalformedEvent {
    fn new(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}

impl ChannelEvent {
    pub fn channel(&self) -> Channel {
        match self {
            ChannelEvent::Modified(_) => Channel::Modified,
            ChannelEvent::Added(_) => Channel::Added,
            ChannelEvent::Deleted(_) => Channel::Deleted,
        }
    }

    /// Decode a raw text frame.
    pub fn decode(raw: &str) -> Result<Self, MalformedEvent> {
        let envelope: InboundEnvelope = serde_json::from_str(raw)
            .map_err(|e| MalformedEvent::new(ENVELOPE_KEY, e.to_string()))?;

        let channel = Channel::from_name(&envelope.channel).ok_or_else(|| {
            MalformedEvent::new(envelope.channel.as_str(), "unknown channel")
        })?;

        match channel {
            Channel::Modified => decode_workspace(channel, envelope.message).map(Self::Modified),
            Channel::Added => decode_workspace(channel, envelope.message).map(Self::Added),
            Channel::Deleted => match envelope.message {
                Value::String(id) if id.is_empty() => Err(MalformedEvent::new(
                    channel.as_str(),
                    "workspace id is empty",
                )),
                Value::String(id) => Ok(Self::Deleted(id)),
                other => Err(MalformedEvent::new(
                    channel.as_str(),
                    format!("expected a workspace id, got {}", json_type(&other)),
                )),
            },
        }
    }
}

fn decode_workspace(channel: Channel, value: Value) -> Result<Workspace, MalformedEvent> {
    let workspace: Workspace = serde_json::from_value(value)
        .map_err(|e| MalformedEvent::new(channel.as_str(), e.to_string()))?;

    if workspace.kind != DEVWORKSPACE_KIND {
        return Err(MalformedEvent::new(
            channel.as_str(),
            format!("expected kind {}, got {}", DEVWORKSPACE_KIND, workspace.kind),
        ));
    }
    if workspace.id().is_empty() {
        return Err(MalformedEvent::new(channel.as_str(), "workspace has no uid"));
    }
    Ok(workspace)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// What happened to a dispatched frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Decoded and handed to the channel's handler.
    Delivered(Channel),
    /// Decoded, but nothing is registered for the channel.
    Unhandled(Channel),
    /// Dropped; one alert was raised.
    Rejected(MalformedEvent),
}

type Handler<T> = Box<dyn FnMut(T) + Send>;

fn deliver<T>(handler: &mut Option<Handler<T>>, value: T) -> bool {
    match handler {
        Some(handler) => {
            handler(value);
            true
        }
        None => false,
    }
}

/// Routes decoded events to one handler per channel.
///
/// Registering a handler for a channel replaces the previous one.
#[derive(Default)]
pub struct ChannelDispatcher {
    modified: Option<Handler<Workspace>>,
    added: Option<Handler<Workspace>>,
    deleted: Option<Handler<String>>,
    alerts: Option<AlertSink>,
}

impl ChannelDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send rejection alerts to `sink` in addition to the log.
    pub fn with_alert_sink(mut self, sink: AlertSink) -> Self {
        self.alerts = Some(sink);
        self
    }

    pub fn on_modified(&mut self, handler: impl FnMut(Workspace) + Send + 'static) {
        self.modified = Some(Box::new(handler));
    }

    pub fn on_added(&mut self, handler: impl FnMut(Workspace) + Send + 'static) {
        self.added = Some(Box::new(handler));
    }

    pub fn on_deleted(&mut self, handler: impl FnMut(String) + Send + 'static) {
        self.deleted = Some(Box::new(handler));
    }

    /// Decode one frame and run its handler to completion.
    ///
    /// Never fails: malformed input is absorbed here.
    pub fn dispatch(&mut self, raw: &str) -> DispatchOutcome {
        let event = match ChannelEvent::decode(raw) {
            Ok(event) => event,
            Err(malformed) => {
                tracing::debug!(frame = raw, "rejected inbound frame");
                alert::raise(
                    self.alerts.as_ref(),
                    Alert::new(
                        malformed.channel.clone(),
                        format!("Ignoring malformed event: {}", malformed),
                    ),
                );
                return DispatchOutcome::Rejected(malformed);
            }
        };

        let channel = event.channel();
        let delivered = match event {
            ChannelEvent::Modified(ws) => deliver(&mut self.modified, ws),
            ChannelEvent::Added(ws) => deliver(&mut self.added, ws),
            ChannelEvent::Deleted(id) => deliver(&mut self.deleted, id),
        };

        if delivered {
            DispatchOutcome::Delivered(channel)
        } else {
            tracing::debug!(%channel, "no handler registered");
            DispatchOutcome::Unhandled(channel)
        }
    }
}
