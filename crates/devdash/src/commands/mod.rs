//! CLI command handlers.

pub mod config;
pub mod delete;
pub mod events;
pub mod get;
pub mod list;
pub mod start;
pub mod status;
pub mod stop;
pub mod watch;

use anyhow::{Context as _, Result};
use console::Style;
use devdash_client::{DevdashClient, Phase};
use devdash_config::{ConfigError, Overrides, ResolvedConnection};
use serde::Serialize;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Flag and environment overrides applied on top of the config file.
    pub overrides: Overrides,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Resolve server, namespace and token from the config file and overrides.
    pub fn connection(&self) -> Result<ResolvedConnection> {
        let config = devdash_config::load_client_config().context("loading client config")?;
        match config.resolve(&self.overrides) {
            Ok(resolved) => {
                tracing::debug!(
                    context = ?resolved.context,
                    server = %resolved.server,
                    namespace = %resolved.namespace,
                    "resolved connection"
                );
                Ok(resolved)
            }
            Err(ConfigError::NoServer) => Err(anyhow::anyhow!(
                "No server configured. Pass --server, set DEVDASH_SERVER, or run \
                 'devdash config set-context <name> --server <url>'"
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Build an API client for the resolved connection.
    pub fn client(&self) -> Result<(DevdashClient, ResolvedConnection)> {
        let connection = self.connection()?;
        let client = DevdashClient::builder()
            .base_url(connection.server.as_str())
            .maybe_auth_token(connection.token.clone())
            .timeout(connection.timeout)
            .build()
            .with_context(|| format!("invalid server URL '{}'", connection.server))?;
        Ok((client, connection))
    }
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Colour used to render a phase.
pub fn phase_style(phase: Phase) -> Style {
    match phase {
        Phase::Running => Style::new().green(),
        Phase::Starting | Phase::Stopping => Style::new().yellow(),
        Phase::Failing | Phase::Failed => Style::new().red(),
        Phase::Terminating => Style::new().magenta(),
        Phase::Stopped => Style::new().dim(),
    }
}
