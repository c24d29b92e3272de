//! List command - workspaces in the namespace.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use devdash_client::Phase;

use super::{Context, phase_style, print_json};

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show running workspaces
    #[arg(long)]
    pub running: bool,
}

/// Run the list command.
pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let (client, connection) = ctx.client()?;
    let list = client.workspaces().list(&connection.namespace).await?;

    let items: Vec<_> = list
        .items
        .iter()
        .filter(|ws| !args.running || ws.phase() == Phase::Running)
        .collect();

    if ctx.json_output {
        return print_json(&items);
    }

    let dim = Style::new().dim();
    if items.is_empty() {
        println!(
            "No workspaces in namespace {}",
            style(&connection.namespace).bold()
        );
        return Ok(());
    }

    println!(
        "{}",
        dim.apply_to(format!("{:<30} {:<12} {}", "NAME", "PHASE", "URL"))
    );
    for ws in items {
        let phase = ws.phase();
        println!(
            "{:<30} {} {}",
            ws.name(),
            phase_style(phase).apply_to(format!("{:<12}", phase)),
            ws.main_url().unwrap_or("-")
        );
    }

    if ctx.verbose {
        println!();
        println!(
            "{} {}",
            dim.apply_to("Resource version:"),
            list.metadata.resource_version.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
