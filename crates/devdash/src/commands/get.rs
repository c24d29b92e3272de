//! Get command - details of one workspace.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::{Context, phase_style, print_json};

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Workspace name
    pub name: String,
}

/// Run the get command.
pub async fn run(args: GetArgs, ctx: &Context) -> Result<()> {
    let (client, connection) = ctx.client()?;
    let ws = client
        .workspaces()
        .get(&connection.namespace, &args.name)
        .await?;

    if ctx.json_output {
        return print_json(&ws);
    }

    let dim = Style::new().dim();
    let phase = ws.phase();

    println!();
    println!("{}", style(ws.name()).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!("  {} {}", dim.apply_to("Namespace:"), ws.namespace());
    println!("  {} {}", dim.apply_to("Id:       "), ws.id());
    println!(
        "  {} {}",
        dim.apply_to("Phase:    "),
        phase_style(phase).apply_to(phase)
    );
    println!("  {} {}", dim.apply_to("Started:  "), ws.is_started());
    if let Some(url) = ws.main_url() {
        println!("  {} {}", dim.apply_to("URL:      "), url);
    }
    if let Some(message) = ws.message() {
        println!("  {} {}", dim.apply_to("Message:  "), message);
    }
    if let Some(created) = &ws.metadata.creation_timestamp {
        println!("  {} {}", dim.apply_to("Created:  "), created);
    }
    if ctx.verbose && !ws.metadata.labels.is_empty() {
        println!("  {}", dim.apply_to("Labels:"));
        for (key, value) in &ws.metadata.labels {
            println!("    {}={}", key, value);
        }
    }
    println!();

    Ok(())
}
