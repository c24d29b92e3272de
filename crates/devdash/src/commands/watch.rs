//! Watch command - stream workspace events until interrupted.

use anyhow::Result;
use clap::Args;
use console::Style;
use devdash_watch::{ConnectionStatus, WorkspaceWatcher};

use super::events::{self, ChannelSubscriber, WatchEvent};
use super::{Context, phase_style};

/// Arguments for the watch command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Only show events for this workspace id
    #[arg(long)]
    pub id: Option<String>,
}

/// Run the watch command.
pub async fn run(args: WatchArgs, ctx: &Context) -> Result<()> {
    let (client, connection) = ctx.client()?;
    let watcher = WorkspaceWatcher::from_client(&client, Some(events::stderr_alerts()))?;

    let (subscriber, mut updates) = ChannelSubscriber::subscriber(client, &connection.namespace);
    watcher.set_subscriber(subscriber);
    watcher.subscribe().await?;

    let dim = Style::new().dim();
    let mut status = watcher.connection().status_watch();
    if !ctx.json_output {
        eprintln!(
            "{} {} ({})",
            dim.apply_to("Watching namespace"),
            connection.namespace,
            *status.borrow_and_update()
        );
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                if !ctx.json_output {
                    let style = match current {
                        ConnectionStatus::Connected => Style::new().green(),
                        _ => Style::new().yellow(),
                    };
                    eprintln!("{} {}", dim.apply_to("connection"), style.apply_to(current));
                }
            }

            event = updates.recv() => {
                let Some(event) = event else { break };
                if !matches_filter(&event, args.id.as_deref()) {
                    continue;
                }
                if ctx.json_output {
                    println!("{}", serde_json::to_string(&event)?);
                } else {
                    print_event(&event);
                }
            }
        }
    }

    watcher.unsubscribe();
    let failing = watcher.connection().failing_contexts();
    if !failing.is_empty() && !ctx.json_output {
        eprintln!(
            "{} {}",
            Style::new().yellow().apply_to("Connection still failing:"),
            failing.join(", ")
        );
    }
    Ok(())
}

fn matches_filter(event: &WatchEvent, id: Option<&str>) -> bool {
    let Some(id) = id else {
        return true;
    };
    match event {
        WatchEvent::Status(update) => update.workspace_id == id,
        WatchEvent::Added { workspaces } => workspaces.iter().any(|ws| ws.id() == id),
        WatchEvent::Deleted { ids } => ids.iter().any(|d| d == id),
    }
}

fn print_event(event: &WatchEvent) {
    let dim = Style::new().dim();
    match event {
        WatchEvent::Status(update) => {
            let transition = match update.prev_status {
                Some(prev) if prev != update.status => format!(
                    "{} → {}",
                    phase_style(prev).apply_to(prev),
                    phase_style(update.status).apply_to(update.status)
                ),
                _ => phase_style(update.status).apply_to(update.status).to_string(),
            };
            println!("{} {}", update.workspace_id, transition);
            if let Some(message) = &update.message {
                println!("  {} {}", dim.apply_to("·"), message);
            }
            if let Some(error) = &update.error {
                println!("  {} {}", Style::new().red().apply_to("error:"), error);
            }
        }
        WatchEvent::Added { workspaces } => {
            for ws in workspaces {
                println!(
                    "{} {} {}",
                    Style::new().green().apply_to("+"),
                    ws.name(),
                    dim.apply_to(ws.id())
                );
            }
        }
        WatchEvent::Deleted { ids } => {
            for id in ids {
                println!("{} {}", Style::new().red().apply_to("-"), id);
            }
        }
    }
}
