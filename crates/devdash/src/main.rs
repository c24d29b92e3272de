//! devdash - command line client for cloud development workspaces
//!
//! Main entry point for the devdash CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, delete, get, list, start, status, stop, watch};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// devdash - manage and watch cloud development workspaces
#[derive(Parser)]
#[command(name = "devdash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Dashboard server URL (overrides the context)
    #[arg(long, global = true, env = "DEVDASH_SERVER")]
    pub server: Option<String>,

    /// Namespace holding the workspaces (overrides the context)
    #[arg(short, long, global = true, env = "DEVDASH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Config context to use instead of the current one
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Bearer token (overrides the context's auth)
    #[arg(long, global = true, env = "DEVDASH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List workspaces in the namespace
    List(list::ListArgs),

    /// Show one workspace
    Get(get::GetArgs),

    /// Start a workspace
    Start(start::StartArgs),

    /// Stop a workspace
    Stop(stop::StopArgs),

    /// Delete a workspace
    Delete(delete::DeleteArgs),

    /// Show server health, or the phase of one workspace
    Status(status::StatusArgs),

    /// Stream workspace events until interrupted
    Watch(watch::WatchArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "devdash=debug,devdash_client=debug,devdash_watch=debug,devdash_config=debug,info"
    } else {
        "devdash=info,devdash_client=warn,devdash_watch=warn,warn"
    };

    let log_dir = devdash_config::config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "devdash.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "devdash=trace,devdash_client=trace,devdash_watch=trace,devdash_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        overrides: devdash_config::Overrides {
            context: cli.context,
            server: cli.server,
            namespace: cli.namespace,
            token: cli.token,
        },
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::List(args) => list::run(args, &ctx).await,
        Commands::Get(args) => get::run(args, &ctx).await,
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Stop(args) => stop::run(args, &ctx).await,
        Commands::Delete(args) => delete::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Watch(args) => watch::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
