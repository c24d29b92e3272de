//! Stop command - stop a workspace.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use console::Style;
use devdash_client::Phase;
use devdash_watch::DevWorkspaceClient;

use super::events::{self, ChannelSubscriber};
use super::{Context, print_json};

/// Arguments for the stop command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Workspace name
    pub name: String,

    /// Wait until the workspace has stopped
    #[arg(short, long)]
    pub wait: bool,

    /// Seconds to wait before giving up
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,
}

/// Run the stop command.
pub async fn run(args: StopArgs, ctx: &Context) -> Result<()> {
    let (client, connection) = ctx.client()?;
    let namespace = connection.namespace.as_str();

    let devworkspaces =
        DevWorkspaceClient::with_alerts(client.clone(), Some(events::stderr_alerts()))?;
    let mut updates = None;
    if args.wait {
        let (subscriber, rx) = ChannelSubscriber::subscriber(client, namespace);
        devworkspaces.watcher().set_subscriber(subscriber);
        devworkspaces.watcher().subscribe().await?;
        updates = Some(rx);
    }

    let ws = devworkspaces.stop(namespace, &args.name).await?;

    if let Some(mut updates) = updates
        && ws.phase() != Phase::Stopped
    {
        if !ctx.json_output {
            println!("Stopping workspace {}...", ws.name());
        }
        events::wait_for_phase(
            &mut updates,
            ws.id(),
            Phase::Stopped,
            Duration::from_secs(args.timeout),
        )
        .await?;
    }

    if ctx.json_output {
        return print_json(&ws);
    }
    let verb = if args.wait { "Stopped" } else { "Stopping" };
    println!(
        "{} {} workspace {}",
        Style::new().green().apply_to("✓"),
        verb,
        ws.name()
    );
    Ok(())
}
