//! Client configuration for connecting to a workspace dashboard.
//!
//! ```yaml
//! api-version: v1
//! kind: ClientConfig
//!
//! current-context: dev
//!
//! contexts:
//!   - name: local
//!     server: http://localhost:8080
//!     namespace: admin-che
//!   - name: dev
//!     server: https://che.dev.example.com
//!     namespace: alice-che
//!     auth:
//!       type: bearer
//!       token-file: ~/.config/devdash/dev.token
//!
//! defaults:
//!   namespace: default
//!   timeout: 30
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Client Config
// ─────────────────────────────────────────────────────────────────────────────

/// API version for the client config file format.
pub const API_VERSION: &str = "v1";

/// Kind identifier for client config files.
pub const KIND: &str = "ClientConfig";

/// Root client configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientConfig {
    /// API version (always "v1" currently).
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Config kind (always "ClientConfig").
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Name of the current/default context.
    #[serde(default)]
    pub current_context: Option<String>,

    /// Named connection contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,

    /// Default settings applied to all contexts.
    #[serde(default)]
    pub defaults: ClientDefaults,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

impl ClientConfig {
    /// Create an empty client config.
    pub fn new() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            ..Default::default()
        }
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Get the current context, if set and valid.
    pub fn current(&self) -> Option<&Context> {
        self.current_context
            .as_ref()
            .and_then(|name| self.get_context(name))
    }

    /// Get a context by name.
    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    fn get_context_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Add or update a context.
    pub fn set_context(&mut self, context: Context) {
        if let Some(existing) = self.get_context_mut(&context.name) {
            *existing = context;
        } else {
            self.contexts.push(context);
        }
    }

    /// Remove a context by name, clearing `current-context` if it pointed there.
    pub fn remove_context(&mut self, name: &str) -> Option<Context> {
        let pos = self.contexts.iter().position(|c| c.name == name)?;
        if self.current_context.as_deref() == Some(name) {
            self.current_context = None;
        }
        Some(self.contexts.remove(pos))
    }

    /// Set the current context by name.
    ///
    /// Returns an error if the context doesn't exist.
    pub fn use_context(&mut self, name: &str) -> Result<()> {
        if self.get_context(name).is_some() {
            self.current_context = Some(name.to_string());
            Ok(())
        } else {
            Err(ConfigError::ContextNotFound(name.to_string()))
        }
    }

    /// List all context names.
    pub fn context_names(&self) -> Vec<&str> {
        self.contexts.iter().map(|c| c.name.as_str()).collect()
    }

    /// Resolve the effective connection settings.
    ///
    /// `overrides.context` selects a context by name (an unknown name is an
    /// error); otherwise the current context is used, if any. Explicit
    /// override values always win over the context, and the context wins over
    /// `defaults`.
    pub fn resolve(&self, overrides: &Overrides) -> Result<ResolvedConnection> {
        let context = match overrides.context.as_deref() {
            Some(name) => Some(
                self.get_context(name)
                    .ok_or_else(|| ConfigError::ContextNotFound(name.to_string()))?,
            ),
            None => self.current(),
        };

        let server = overrides
            .server
            .clone()
            .or_else(|| context.map(|c| c.server.clone()))
            .ok_or(ConfigError::NoServer)?;

        let namespace = overrides
            .namespace
            .clone()
            .or_else(|| context.and_then(|c| c.namespace.clone()))
            .unwrap_or_else(|| self.defaults.namespace.clone());

        let token = match &overrides.token {
            Some(token) => Some(token.clone()),
            None => match context.and_then(|c| c.auth.as_ref()) {
                Some(auth) => auth.resolve()?,
                None => None,
            },
        };

        let timeout = context
            .and_then(|c| c.timeout)
            .unwrap_or(self.defaults.timeout);

        Ok(ResolvedConnection {
            context: context.map(|c| c.name.clone()),
            server,
            namespace,
            token,
            timeout: Duration::from_secs(timeout),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// A named connection context (server + namespace + auth bundle).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Context {
    /// Unique name for this context.
    pub name: String,

    /// Dashboard server URL (e.g. "https://che.example.com").
    pub server: String,

    /// Namespace holding the user's workspaces.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: Option<AuthConfig>,

    /// Request timeout override (seconds).
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Context {
    /// Create a new context with just a name and server URL.
    pub fn new(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            namespace: None,
            auth: None,
            timeout: None,
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the auth configuration.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication configuration for a context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthConfig {
    /// No authentication.
    None,

    /// Bearer token authentication.
    #[serde(rename_all = "kebab-case")]
    Bearer {
        /// Path to file containing the bearer token.
        token_file: Option<PathBuf>,
        /// Environment variable containing the token.
        token_env: Option<String>,
    },
}

impl AuthConfig {
    /// Bearer auth reading the token from a file.
    pub fn bearer_file(path: impl Into<PathBuf>) -> Self {
        Self::Bearer {
            token_file: Some(path.into()),
            token_env: None,
        }
    }

    /// Bearer auth reading the token from an environment variable.
    pub fn bearer_env(var: impl Into<String>) -> Self {
        Self::Bearer {
            token_file: None,
            token_env: Some(var.into()),
        }
    }

    /// Resolve the actual credential value.
    ///
    /// The file wins over the environment variable when both are set and the
    /// file exists.
    pub fn resolve(&self) -> Result<Option<String>> {
        match self {
            AuthConfig::None => Ok(None),
            AuthConfig::Bearer {
                token_file,
                token_env,
            } => {
                if let Some(path) = token_file {
                    let expanded = expand_path(path);
                    if expanded.exists() {
                        let token = std::fs::read_to_string(&expanded)
                            .map_err(|e| ConfigError::ReadFile {
                                path: expanded.display().to_string(),
                                source: e,
                            })?
                            .trim()
                            .to_string();
                        return Ok(Some(token));
                    }
                }
                if let Some(var) = token_env
                    && let Ok(token) = std::env::var(var)
                {
                    return Ok(Some(token));
                }
                Ok(None)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults / resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Default settings applied to all contexts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientDefaults {
    /// Namespace used when neither the flag nor the context names one.
    pub namespace: String,

    /// Default request timeout in seconds.
    pub timeout: u64,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            timeout: 30,
        }
    }
}

/// Values supplied outside the config file (CLI flags, environment).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub context: Option<String>,
    pub server: Option<String>,
    pub namespace: Option<String>,
    pub token: Option<String>,
}

/// Fully resolved connection settings.
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    /// Name of the context the settings came from, if any.
    pub context: Option<String>,
    pub server: String,
    pub namespace: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// Expand ~ to home directory in paths.
fn expand_path(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str()
        && let Some(rest) = s.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
