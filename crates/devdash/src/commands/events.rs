//! Subscriber that turns watcher callbacks into a stream of events.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use console::Style;
use devdash_client::{DevdashClient, Phase, Workspace};
use devdash_watch::{Alert, AlertSink, StatusUpdate, Subscriber, SubscriberCallbacks};
use serde::Serialize;
use tokio::sync::mpsc;

/// One event delivered to the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum WatchEvent {
    Status(StatusUpdate),
    Added { workspaces: Vec<Workspace> },
    Deleted { ids: Vec<String> },
}

/// Forwards every callback into an unbounded channel.
///
/// The resume cursor is the resource version of the namespace's workspace
/// list at subscription time.
pub struct ChannelSubscriber {
    client: DevdashClient,
    namespace: String,
    events: mpsc::UnboundedSender<WatchEvent>,
}

impl ChannelSubscriber {
    pub fn subscriber(
        client: DevdashClient,
        namespace: &str,
    ) -> (Subscriber, mpsc::UnboundedReceiver<WatchEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let callbacks = Arc::new(Self {
            client,
            namespace: namespace.to_string(),
            events,
        });
        (Subscriber::new(namespace, callbacks), rx)
    }

    fn forward(&self, event: WatchEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("event receiver gone");
        }
    }
}

#[async_trait]
impl SubscriberCallbacks for ChannelSubscriber {
    async fn resource_version(&self) -> Option<String> {
        match self.client.workspaces().list(&self.namespace).await {
            Ok(list) => list.metadata.resource_version,
            Err(e) => {
                tracing::warn!("cannot read resource version, watching from now: {}", e);
                None
            }
        }
    }

    fn update_status(&self, update: StatusUpdate) {
        self.forward(WatchEvent::Status(update));
    }

    fn update_deleted(&self, workspace_ids: Vec<String>) {
        self.forward(WatchEvent::Deleted { ids: workspace_ids });
    }

    fn update_added(&self, workspaces: Vec<Workspace>) {
        self.forward(WatchEvent::Added { workspaces });
    }
}

/// Alert sink printing warnings to stderr.
pub fn stderr_alerts() -> AlertSink {
    Arc::new(|alert: Alert| {
        eprintln!("{} {}", Style::new().yellow().apply_to("⚠"), alert.title);
    })
}

/// Wait until `workspace_id` reports `target`, printing progress messages.
///
/// A `FAILED` status ends the wait with the workspace's error.
pub async fn wait_for_phase(
    events: &mut mpsc::UnboundedReceiver<WatchEvent>,
    workspace_id: &str,
    target: Phase,
    timeout: Duration,
) -> Result<()> {
    let dim = Style::new().dim();
    let wait = async {
        while let Some(event) = events.recv().await {
            let WatchEvent::Status(update) = event else {
                continue;
            };
            if update.workspace_id != workspace_id {
                continue;
            }
            if let Some(message) = &update.message {
                println!("  {} {}", dim.apply_to("·"), message);
            }
            if update.status == target {
                return Ok(());
            }
            if update.status == Phase::Failed {
                bail!(
                    "{}",
                    update
                        .error
                        .unwrap_or_else(|| devdash_client::error::UNKNOWN_FAILURE.to_string())
                );
            }
        }
        bail!("event stream ended")
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(result) => result,
        Err(_) => bail!("timed out after {:?} waiting for {}", timeout, target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: &str, status: Phase, message: Option<&str>) -> WatchEvent {
        WatchEvent::Status(StatusUpdate {
            workspace_id: id.to_string(),
            status,
            prev_status: Some(status),
            message: message.map(str::to_string),
            error: (status == Phase::Failed).then(|| message.unwrap_or("boom").to_string()),
        })
    }

    #[tokio::test]
    async fn test_wait_ignores_other_workspaces() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(update("other", Phase::Running, None)).unwrap();
        tx.send(WatchEvent::Deleted { ids: vec!["x".into()] }).unwrap();
        tx.send(update("w1", Phase::Starting, Some("pulling"))).unwrap();
        tx.send(update("w1", Phase::Running, None)).unwrap();

        wait_for_phase(&mut rx, "w1", Phase::Running, Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_surfaces_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(update("w1", Phase::Failed, Some("CrashLoopBackOff"))).unwrap();

        let err = wait_for_phase(&mut rx, "w1", Phase::Running, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "CrashLoopBackOff");
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let (_tx, mut rx) = mpsc::unbounded_channel();
        let err = wait_for_phase(&mut rx, "w1", Phase::Stopped, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(WatchEvent::Deleted {
            ids: vec!["w1".into()],
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "event": "deleted", "ids": ["w1"] }));
    }
}
