//! Workspaces API.

use crate::client::DevdashClient;
use crate::error::{Error, Result, UNKNOWN_FAILURE};
use crate::types::{CreateWorkspaceRequest, PatchOperation, Phase, Workspace, WorkspaceList};

/// Workspaces API client.
pub struct WorkspacesApi {
    client: DevdashClient,
}

fn collection(namespace: &str) -> String {
    format!("namespace/{}/devworkspaces", namespace)
}

fn item(namespace: &str, name: &str) -> String {
    format!("namespace/{}/devworkspaces/{}", namespace, name)
}

impl WorkspacesApi {
    pub(crate) fn new(client: DevdashClient) -> Self {
        Self { client }
    }

    /// List all workspaces in a namespace.
    ///
    /// The list's `metadata.resourceVersion` is the cursor a subscription
    /// should resume from.
    pub async fn list(&self, namespace: &str) -> Result<WorkspaceList> {
        self.client.get(&collection(namespace)).await
    }

    /// Get a workspace by name.
    pub async fn get(&self, namespace: &str, name: &str) -> Result<Workspace> {
        self.client.get(&item(namespace, name)).await
    }

    /// Create a workspace.
    pub async fn create(&self, namespace: &str, workspace: Workspace) -> Result<Workspace> {
        let request = CreateWorkspaceRequest {
            devworkspace: workspace,
        };
        self.client.post(&collection(namespace), &request).await
    }

    /// Apply JSON patch operations to a workspace.
    pub async fn patch(
        &self,
        namespace: &str,
        name: &str,
        operations: &[PatchOperation],
    ) -> Result<Workspace> {
        self.client.patch(&item(namespace, name), operations).await
    }

    /// Set `spec.started` on an already fetched workspace.
    pub async fn set_started(&self, workspace: &Workspace, started: bool) -> Result<Workspace> {
        let op = PatchOperation::set_started(workspace, started);
        tracing::info!(
            namespace = workspace.namespace(),
            name = workspace.name(),
            started,
            "changing workspace state"
        );
        self.patch(workspace.namespace(), workspace.name(), &[op])
            .await
    }

    /// Start a workspace.
    pub async fn start(&self, namespace: &str, name: &str) -> Result<Workspace> {
        let workspace = self.get(namespace, name).await?;
        self.set_started(&workspace, true).await
    }

    /// Stop a workspace.
    pub async fn stop(&self, namespace: &str, name: &str) -> Result<Workspace> {
        let workspace = self.get(namespace, name).await?;
        self.set_started(&workspace, false).await
    }

    /// Delete a workspace.
    pub async fn delete(&self, namespace: &str, name: &str) -> Result<()> {
        self.client.delete(&item(namespace, name)).await
    }

    /// Fetch the current phase of a workspace.
    ///
    /// A workspace reporting `FAILED` is turned into
    /// [`Error::WorkspaceFailed`] carrying its message.
    pub async fn status(&self, namespace: &str, name: &str) -> Result<Phase> {
        let workspace = self.get(namespace, name).await?;
        check_failed(&workspace)?;
        Ok(workspace.phase())
    }
}

/// Convert an explicit failure status into an error.
pub(crate) fn check_failed(workspace: &Workspace) -> Result<()> {
    if workspace.phase() == Phase::Failed {
        return Err(Error::WorkspaceFailed {
            name: workspace.name().to_string(),
            message: workspace
                .message()
                .unwrap_or(UNKNOWN_FAILURE)
                .to_string(),
        });
    }
    Ok(())
}
