//! WebSocket protocol types spoken with the dashboard backend.
//!
//! Outbound, the client only ever sends subscription requests:
//!
//! ```json
//! {"request":"SUBSCRIBE","channel":"modified","params":{"namespace":"ns1","resourceVersion":"42"}}
//! ```
//!
//! Inbound frames are envelopes `{"channel": <name>, "message": <payload>}`
//! whose payload shape depends on the channel; see [`crate::dispatcher`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named stream of one event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Modified,
    Added,
    Deleted,
}

impl Channel {
    /// All channels in the order a subscriber registers them.
    pub const ALL: [Channel; 3] = [Channel::Modified, Channel::Added, Channel::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Modified => "modified",
            Channel::Added => "added",
            Channel::Deleted => "deleted",
        }
    }

    /// Look up a channel by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    Subscribe,
    Unsubscribe,
}

/// Parameters of a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeParams {
    pub namespace: String,
    /// Cursor to resume the watch from; omitted to start from "now".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

impl SubscribeParams {
    pub fn new(namespace: impl Into<String>, resource_version: Option<String>) -> Self {
        Self {
            namespace: namespace.into(),
            resource_version,
        }
    }
}

/// Outbound request frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub request: RequestKind,
    pub channel: Channel,
    pub params: SubscribeParams,
}

impl SubscriptionRequest {
    pub fn subscribe(channel: Channel, params: SubscribeParams) -> Self {
        Self {
            request: RequestKind::Subscribe,
            channel,
            params,
        }
    }

    pub fn unsubscribe(channel: Channel, params: SubscribeParams) -> Self {
        Self {
            request: RequestKind::Unsubscribe,
            channel,
            params,
        }
    }
}

/// Inbound frame before its payload is decoded.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InboundEnvelope {
    pub channel: String,
    #[serde(default)]
    pub message: serde_json::Value,
}
