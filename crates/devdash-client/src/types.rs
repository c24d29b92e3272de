//! Request and response types for the workspace dashboard API.
//!
//! Workspaces are DevWorkspace custom resources; only the fields the client
//! reads or writes are modelled; the devfile template is kept opaque.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// `kind` of every workspace object.
pub const DEVWORKSPACE_KIND: &str = "DevWorkspace";

/// `apiVersion` used when building new workspace objects.
pub const DEVWORKSPACE_API_VERSION: &str = "workspace.devfile.io/v1alpha2";

// ─────────────────────────────────────────────────────────────────────────────
// Phase
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle phase reported by the orchestration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failing,
    Failed,
    Terminating,
}

impl Phase {
    /// Wire name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Starting => "STARTING",
            Phase::Running => "RUNNING",
            Phase::Stopping => "STOPPING",
            Phase::Stopped => "STOPPED",
            Phase::Failing => "FAILING",
            Phase::Failed => "FAILED",
            Phase::Terminating => "TERMINATING",
        }
    }

    /// Whether the workspace is settled in this phase (no transition pending).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Running | Phase::Stopped | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspace
// ─────────────────────────────────────────────────────────────────────────────

/// A DevWorkspace object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: WorkspaceSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkspaceStatus>,
}

/// Object metadata (subset of the Kubernetes `ObjectMeta`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    /// Server-assigned unique id; empty on objects not yet created.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Desired state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<bool>,
    /// Devfile-derived template, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<serde_json::Value>,
}

/// Observed state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devworkspace_id: Option<String>,
}

impl Workspace {
    /// Build a new, not-yet-created workspace object.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: DEVWORKSPACE_API_VERSION.to_string(),
            kind: DEVWORKSPACE_KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..Default::default()
            },
            spec: WorkspaceSpec::default(),
            status: None,
        }
    }

    /// Set `spec.started`.
    pub fn with_started(mut self, started: bool) -> Self {
        self.spec.started = Some(started);
        self
    }

    /// Set the devfile template.
    pub fn with_template(mut self, template: serde_json::Value) -> Self {
        self.spec.template = Some(template);
        self
    }

    /// Unique id of the workspace (`metadata.uid`).
    pub fn id(&self) -> &str {
        &self.metadata.uid
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn resource_version(&self) -> Option<&str> {
        self.metadata.resource_version.as_deref()
    }

    /// Whether `spec.started` is set to true.
    pub fn is_started(&self) -> bool {
        self.spec.started.unwrap_or(false)
    }

    /// Effective phase.
    ///
    /// A workspace the operator has not reported on yet is `Starting` when it
    /// was asked to start and `Stopped` otherwise.
    pub fn phase(&self) -> Phase {
        match self.status.as_ref().and_then(|s| s.phase) {
            Some(phase) => phase,
            None if self.is_started() => Phase::Starting,
            None => Phase::Stopped,
        }
    }

    /// Status message, if any non-empty one is reported.
    pub fn message(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.message.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// IDE URL once running.
    pub fn main_url(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.main_url.as_deref())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests / responses
// ─────────────────────────────────────────────────────────────────────────────

/// Response for listing workspaces in a namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceList {
    #[serde(default)]
    pub items: Vec<Workspace>,
    #[serde(default)]
    pub metadata: ListMeta,
}

/// List metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    /// Cursor to start a watch from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// Request to create a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub devworkspace: Workspace,
}

/// JSON patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

/// A single RFC 6902 operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }

    /// Operation setting `spec.started`, as `add` when the field is absent.
    pub fn set_started(workspace: &Workspace, started: bool) -> Self {
        let value = serde_json::Value::Bool(started);
        if workspace.spec.started.is_some() {
            Self::replace("/spec/started", value)
        } else {
            Self::add("/spec/started", value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "apiVersion": "workspace.devfile.io/v1alpha2",
            "kind": "DevWorkspace",
            "metadata": {
                "name": "demo",
                "namespace": "alice-che",
                "uid": "uid-1",
                "resourceVersion": "42",
                "annotations": { "che.eclipse.org/devfile-source": "url" }
            },
            "spec": { "started": true, "template": { "components": [] } },
            "status": {
                "phase": "RUNNING",
                "mainUrl": "https://ide.example.com/demo",
                "devworkspaceId": "workspace1234"
            }
        })
    }

    #[test]
    fn test_workspace_deserialization() {
        let ws: Workspace = serde_json::from_value(sample()).unwrap();
        assert_eq!(ws.id(), "uid-1");
        assert_eq!(ws.name(), "demo");
        assert_eq!(ws.namespace(), "alice-che");
        assert_eq!(ws.resource_version(), Some("42"));
        assert_eq!(ws.phase(), Phase::Running);
        assert_eq!(ws.main_url(), Some("https://ide.example.com/demo"));
        assert!(ws.message().is_none());
    }

    #[test]
    fn test_phase_fallback_without_status() {
        let ws = Workspace::new("ns", "a").with_started(true);
        assert_eq!(ws.phase(), Phase::Starting);

        let ws = Workspace::new("ns", "b");
        assert_eq!(ws.phase(), Phase::Stopped);
    }

    #[test]
    fn test_empty_message_is_none() {
        let mut ws = Workspace::new("ns", "a");
        ws.status = Some(WorkspaceStatus {
            message: Some(String::new()),
            ..Default::default()
        });
        assert!(ws.message().is_none());
    }

    #[test]
    fn test_unknown_phase_rejected() {
        let mut value = sample();
        value["status"]["phase"] = json!("EXPLODED");
        assert!(serde_json::from_value::<Workspace>(value).is_err());
    }

    #[test]
    fn test_new_workspace_serialization_skips_server_fields() {
        let ws = Workspace::new("alice-che", "demo").with_started(false);
        let value = serde_json::to_value(&ws).unwrap();
        assert_eq!(value["kind"], "DevWorkspace");
        assert!(value["metadata"].get("uid").is_none());
        assert!(value["metadata"].get("resourceVersion").is_none());
        assert!(value.get("status").is_none());
        assert_eq!(value["spec"]["started"], false);
    }

    #[test]
    fn test_set_started_patch() {
        let ws = Workspace::new("ns", "a");
        let op = PatchOperation::set_started(&ws, true);
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "add", "path": "/spec/started", "value": true})
        );

        let ws = ws.with_started(true);
        let op = PatchOperation::set_started(&ws, false);
        assert_eq!(op.op, PatchOp::Replace);
        assert_eq!(op.value, Some(json!(false)));
    }

    #[test]
    fn test_remove_patch_omits_value() {
        let op = PatchOperation::remove("/metadata/annotations/foo");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "remove", "path": "/metadata/annotations/foo"})
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Terminating.to_string(), "TERMINATING");
        assert_eq!(
            serde_json::to_value(Phase::Stopping).unwrap(),
            json!("STOPPING")
        );
        assert!(Phase::Failed.is_terminal());
        assert!(!Phase::Starting.is_terminal());
    }

    #[test]
    fn test_list_without_metadata() {
        let list: WorkspaceList = serde_json::from_value(json!({ "items": [sample()] })).unwrap();
        assert_eq!(list.items.len(), 1);
        assert!(list.metadata.resource_version.is_none());
    }
}
