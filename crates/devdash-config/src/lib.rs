//! Client configuration for the devdash workspace tools.
//!
//! Implements a kubeconfig-style YAML file with named contexts. Each context
//! bundles a dashboard server URL, the namespace whose workspaces are
//! managed, and how to authenticate against it.
//!
//! Resolution order for every field is: explicit override (CLI flag or
//! environment), then the selected context, then the file's `defaults`.

pub mod client;
pub mod discovery;
pub mod error;

pub use client::{
    AuthConfig, ClientConfig, ClientDefaults, Context, Overrides, ResolvedConnection,
};
pub use discovery::{
    client_config_path, config_dir, load_client_config, load_client_config_from,
    save_client_config, save_client_config_to,
};
pub use error::{ConfigError, Result};
