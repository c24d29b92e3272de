//! REST client and watcher bundled together.

use devdash_client::{DevdashClient, Phase, Workspace};

use crate::alert::AlertSink;
use crate::error::Result;
use crate::watcher::WorkspaceWatcher;

/// Workspace operations plus a live subscription on the same server.
///
/// State changes go through the REST API; their effect arrives back through
/// the watcher's subscriber.
pub struct DevWorkspaceClient {
    api: DevdashClient,
    watcher: WorkspaceWatcher,
}

impl DevWorkspaceClient {
    /// Must be called inside a Tokio runtime.
    pub fn new(api: DevdashClient) -> Result<Self> {
        Self::with_alerts(api, None)
    }

    pub fn with_alerts(api: DevdashClient, alerts: Option<AlertSink>) -> Result<Self> {
        let watcher = WorkspaceWatcher::from_client(&api, alerts)?;
        Ok(Self { api, watcher })
    }

    pub fn api(&self) -> &DevdashClient {
        &self.api
    }

    pub fn watcher(&self) -> &WorkspaceWatcher {
        &self.watcher
    }

    /// Resource version of the namespace's workspace list.
    pub async fn resource_version(&self, namespace: &str) -> Result<Option<String>> {
        let list = self.api.workspaces().list(namespace).await?;
        Ok(list.metadata.resource_version)
    }

    pub async fn start(&self, namespace: &str, name: &str) -> Result<Workspace> {
        Ok(self.api.workspaces().start(namespace, name).await?)
    }

    /// Stop a workspace and forget its last forwarded message, so the
    /// messages of its next start are all reported.
    pub async fn stop(&self, namespace: &str, name: &str) -> Result<Workspace> {
        let workspace = self.api.workspaces().stop(namespace, name).await?;
        if self.watcher.forget_message(workspace.id()) {
            tracing::debug!(workspace = name, "cleared last status message");
        }
        Ok(workspace)
    }

    pub async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        Ok(self.api.workspaces().delete(namespace, name).await?)
    }

    /// Current phase, or [`devdash_client::Error::WorkspaceFailed`] for a
    /// failed workspace.
    pub async fn status(&self, namespace: &str, name: &str) -> Result<Phase> {
        Ok(self.api.workspaces().status(namespace, name).await?)
    }
}
