//! Start command - start a workspace, optionally waiting until it runs.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use console::Style;
use devdash_client::Phase;
use devdash_watch::DevWorkspaceClient;

use super::events::{self, ChannelSubscriber};
use super::{Context, print_json};

/// Arguments for the start command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Workspace name
    pub name: String,

    /// Wait until the workspace is running
    #[arg(short, long)]
    pub wait: bool,

    /// Seconds to wait before giving up
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let (client, connection) = ctx.client()?;
    let namespace = connection.namespace.as_str();
    let green = Style::new().green();

    if !args.wait {
        let ws = client.workspaces().start(namespace, &args.name).await?;
        if ctx.json_output {
            return print_json(&ws);
        }
        println!("{} Starting workspace {}", green.apply_to("✓"), ws.name());
        return Ok(());
    }

    // Subscribe before changing state so no transition is missed.
    let devworkspaces =
        DevWorkspaceClient::with_alerts(client.clone(), Some(events::stderr_alerts()))?;
    let (subscriber, mut updates) = ChannelSubscriber::subscriber(client, namespace);
    devworkspaces.watcher().set_subscriber(subscriber);
    devworkspaces.watcher().subscribe().await?;

    let ws = devworkspaces.start(namespace, &args.name).await?;
    if !ctx.json_output {
        println!("Starting workspace {}...", ws.name());
    }

    if ws.phase() != Phase::Running {
        events::wait_for_phase(
            &mut updates,
            ws.id(),
            Phase::Running,
            Duration::from_secs(args.timeout),
        )
        .await?;
    }

    let ws = devworkspaces.api().workspaces().get(namespace, &args.name).await?;
    if ctx.json_output {
        return print_json(&ws);
    }
    println!("{} Workspace {} is running", green.apply_to("✓"), ws.name());
    if let Some(url) = ws.main_url() {
        println!("  {}", url);
    }
    Ok(())
}
