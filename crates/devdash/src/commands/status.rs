//! Status command - server health, or the phase of one workspace.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use devdash_client::{Error as ApiError, Phase};
use serde::Serialize;

use super::{Context, phase_style, print_json};

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Workspace name; shows server status when omitted
    pub name: Option<String>,
}

/// Server status for JSON output.
#[derive(Debug, Serialize)]
struct ServerStatusOutput {
    healthy: bool,
    server: String,
    namespace: String,
    context: Option<String>,
}

/// Workspace status for JSON output.
#[derive(Debug, Serialize)]
struct WorkspaceStatusOutput {
    name: String,
    phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    match args.name {
        Some(name) => workspace_status(&name, ctx).await,
        None => server_status(ctx).await,
    }
}

async fn workspace_status(name: &str, ctx: &Context) -> Result<()> {
    let (client, connection) = ctx.client()?;

    let (phase, error) = match client.workspaces().status(&connection.namespace, name).await {
        Ok(phase) => (phase, None),
        Err(ApiError::WorkspaceFailed { message, .. }) => (Phase::Failed, Some(message)),
        Err(e) => return Err(e.into()),
    };

    if ctx.json_output {
        print_json(&WorkspaceStatusOutput {
            name: name.to_string(),
            phase,
            error: error.clone(),
        })?;
    } else {
        println!("{} {}", name, phase_style(phase).apply_to(phase));
        if let Some(error) = &error {
            println!("  {} {}", Style::new().red().apply_to("Error:"), error);
        }
    }

    match error {
        Some(error) => Err(anyhow::anyhow!("workspace {} failed: {}", name, error)),
        None => Ok(()),
    }
}

async fn server_status(ctx: &Context) -> Result<()> {
    let (client, connection) = ctx.client()?;
    let health = client.health().check().await;

    if ctx.json_output {
        return print_json(&ServerStatusOutput {
            healthy: health.is_ok(),
            server: connection.server,
            namespace: connection.namespace,
            context: connection.context,
        });
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style("Workspace Server Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    match &health {
        Ok(()) => println!(
            "  {} {}",
            dim.apply_to("Status:   "),
            Style::new().green().apply_to("● healthy")
        ),
        Err(_) => println!(
            "  {} {}",
            dim.apply_to("Status:   "),
            Style::new().red().apply_to("● unreachable")
        ),
    }
    println!("  {} {}", dim.apply_to("Server:   "), connection.server);
    println!("  {} {}", dim.apply_to("Namespace:"), connection.namespace);
    if let Some(context) = &connection.context {
        println!("  {} {}", dim.apply_to("Context:  "), context);
    }
    if let (true, Err(e)) = (ctx.verbose, &health) {
        println!();
        println!("  {} {}", dim.apply_to("Error:"), e);
    }
    println!();

    Ok(())
}
