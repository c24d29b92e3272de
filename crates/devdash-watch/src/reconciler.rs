//! Status diffing for `modified` events.

use std::collections::HashMap;

use devdash_client::error::UNKNOWN_FAILURE;
use devdash_client::{Phase, Workspace};
use serde::Serialize;

/// One observed status transition of one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub workspace_id: String,
    pub status: Phase,
    /// Status of the previous update for this id; equal to `status` on the
    /// first observation.
    pub prev_status: Option<Phase>,
    /// Set only when the workspace message differs from the last one
    /// forwarded for this id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set when the workspace reports `FAILED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Last status update per namespace and workspace id.
#[derive(Debug, Default)]
pub struct StatusStore {
    namespaces: HashMap<String, HashMap<String, StatusUpdate>>,
}

impl StatusStore {
    pub fn get(&self, namespace: &str, workspace_id: &str) -> Option<&StatusUpdate> {
        self.namespaces.get(namespace)?.get(workspace_id)
    }

    /// Store `update` as the latest for its workspace, returning the entry it
    /// replaced.
    pub fn replace(&mut self, namespace: &str, update: StatusUpdate) -> Option<StatusUpdate> {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(update.workspace_id.clone(), update)
    }

    /// Number of workspaces tracked across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Computes [`StatusUpdate`]s from successive workspace snapshots.
#[derive(Debug, Default)]
pub struct StatusReconciler {
    store: StatusStore,
    last_messages: HashMap<String, String>,
}

impl StatusReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `workspace` against the cached state for `namespace` and record
    /// it as the new state.
    pub fn reconcile(&mut self, namespace: &str, workspace: &Workspace) -> StatusUpdate {
        let workspace_id = workspace.id();
        let status = workspace.phase();
        let prev_status = self
            .store
            .get(namespace, workspace_id)
            .map(|previous| previous.status)
            .unwrap_or(status);

        let message = workspace.message().and_then(|message| {
            if self.last_messages.get(workspace_id).map(String::as_str) == Some(message) {
                None
            } else {
                self.last_messages
                    .insert(workspace_id.to_string(), message.to_string());
                Some(message.to_string())
            }
        });

        let error = (status == Phase::Failed)
            .then(|| workspace.message().unwrap_or(UNKNOWN_FAILURE).to_string());

        let update = StatusUpdate {
            workspace_id: workspace_id.to_string(),
            status,
            prev_status: Some(prev_status),
            message,
            error,
        };

        if prev_status != status {
            tracing::debug!(
                namespace,
                workspace = workspace.name(),
                from = %prev_status,
                to = %status,
                "workspace status changed"
            );
        }

        self.store.replace(namespace, update.clone());
        update
    }

    /// Drop the remembered message for a workspace so the next one is
    /// forwarded even if identical. Returns whether anything was remembered.
    pub fn forget_message(&mut self, workspace_id: &str) -> bool {
        self.last_messages.remove(workspace_id).is_some()
    }

    /// Last status seen for a workspace.
    pub fn last_status(&self, namespace: &str, workspace_id: &str) -> Option<Phase> {
        self.store.get(namespace, workspace_id).map(|u| u.status)
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }
}
