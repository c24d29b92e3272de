//! Delete command.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde_json::json;

use super::{Context, print_json};

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Workspace name
    pub name: String,

    /// Succeed even if the workspace does not exist
    #[arg(long)]
    pub ignore_not_found: bool,
}

/// Run the delete command.
pub async fn run(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let (client, connection) = ctx.client()?;

    let deleted = match client
        .workspaces()
        .delete(&connection.namespace, &args.name)
        .await
    {
        Ok(()) => true,
        Err(e) if e.is_not_found() && args.ignore_not_found => false,
        Err(e) => return Err(e.into()),
    };

    if ctx.json_output {
        return print_json(&json!({ "name": args.name, "deleted": deleted }));
    }

    if deleted {
        println!(
            "{} Deleted workspace {}",
            Style::new().green().apply_to("✓"),
            args.name
        );
    } else {
        println!("Workspace {} not found", args.name);
    }
    Ok(())
}
