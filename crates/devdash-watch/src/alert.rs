//! User-visible warnings.

use std::sync::Arc;

/// A warning meant for the user rather than the log.
///
/// `key` identifies the condition (a channel name, a close reason) so a UI can
/// collapse repeats of the same alert into one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub key: String,
    pub title: String,
}

impl Alert {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
        }
    }
}

/// Receiver of alerts.
pub type AlertSink = Arc<dyn Fn(Alert) + Send + Sync>;

/// Log the alert and hand it to the sink, if there is one.
pub(crate) fn raise(sink: Option<&AlertSink>, alert: Alert) {
    tracing::warn!(key = %alert.key, "{}", alert.title);
    if let Some(sink) = sink {
        sink(alert);
    }
}
