//! Config command - client context management.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use devdash_config::{AuthConfig, ClientConfig, Context as ClientContext};

use super::{Context, print_json};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the config file and the resolved connection
    Show,

    /// Switch to a different context
    UseContext {
        /// Context name to switch to
        name: String,
    },

    /// Create or update a context
    SetContext {
        /// Context name
        name: String,

        /// Server URL (e.g., https://che.example.com)
        #[arg(long)]
        server: Option<String>,

        /// Namespace holding your workspaces
        #[arg(long)]
        namespace: Option<String>,

        /// File containing a bearer token
        #[arg(long, conflicts_with = "token_env")]
        token_file: Option<PathBuf>,

        /// Environment variable containing a bearer token
        #[arg(long)]
        token_env: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::UseContext { name } => cmd_use_context(&name),
        ConfigCommand::SetContext {
            name,
            server,
            namespace,
            token_file,
            token_env,
            timeout,
        } => {
            let auth = match (token_file, token_env) {
                (Some(path), _) => Some(AuthConfig::bearer_file(path)),
                (None, Some(var)) => Some(AuthConfig::bearer_env(var)),
                (None, None) => None,
            };
            cmd_set_context(&name, server, namespace, auth, timeout)
        }
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let config = devdash_config::load_client_config()?;

    if ctx.json_output {
        return print_json(&config);
    }

    match devdash_config::client_config_path() {
        Some(path) if path.exists() => println!("# {}\n", path.display()),
        Some(path) => println!("# {} (not created yet)\n", path.display()),
        None => println!("# no config directory\n"),
    }

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!();
        println!("Create one with:");
        println!("  devdash config set-context local --server=http://localhost:8080 --namespace=admin-che");
    } else {
        let current = config.current_context.as_deref();
        println!("CURRENT   NAME            NAMESPACE       SERVER");
        for c in &config.contexts {
            let marker = if current == Some(c.name.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                "{}         {:<15} {:<15} {}",
                marker,
                c.name,
                c.namespace.as_deref().unwrap_or("-"),
                c.server
            );
        }
    }

    match config.resolve(&ctx.overrides) {
        Ok(resolved) => {
            println!();
            println!("Resolved:");
            println!("  server:    {}", resolved.server);
            println!("  namespace: {}", resolved.namespace);
            println!(
                "  token:     {}",
                if resolved.token.is_some() { "set" } else { "none" }
            );
            println!("  timeout:   {}s", resolved.timeout.as_secs());
        }
        Err(e) if ctx.verbose => {
            println!();
            println!("Cannot resolve a connection: {}", e);
        }
        Err(_) => {}
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        println!("{}", config.to_yaml()?);
    }

    Ok(())
}

fn cmd_use_context(name: &str) -> Result<()> {
    let mut config = devdash_config::load_client_config()?;

    config.use_context(name)?;
    devdash_config::save_client_config(&config)?;

    println!("Switched to context \"{}\".", name);

    Ok(())
}

fn cmd_set_context(
    name: &str,
    server: Option<String>,
    namespace: Option<String>,
    auth: Option<AuthConfig>,
    timeout: Option<u64>,
) -> Result<()> {
    let mut config = devdash_config::load_client_config()?;
    let is_new = apply_context(&mut config, name, server, namespace, auth, timeout)?;
    devdash_config::save_client_config(&config)?;

    if is_new {
        println!("Context \"{}\" created.", name);
    } else {
        println!("Context \"{}\" modified.", name);
    }
    if config.current_context.as_deref() == Some(name) {
        println!("Context \"{}\" is the current context.", name);
    }

    Ok(())
}

/// Create or update `name` in `config`. Returns whether it was created.
///
/// The first context ever created becomes the current one.
fn apply_context(
    config: &mut ClientConfig,
    name: &str,
    server: Option<String>,
    namespace: Option<String>,
    auth: Option<AuthConfig>,
    timeout: Option<u64>,
) -> Result<bool> {
    let is_new = config.get_context(name).is_none();

    let context = match config.get_context(name).cloned() {
        Some(mut existing) => {
            if let Some(server) = server {
                existing.server = server;
            }
            if namespace.is_some() {
                existing.namespace = namespace;
            }
            if auth.is_some() {
                existing.auth = auth;
            }
            if timeout.is_some() {
                existing.timeout = timeout;
            }
            existing
        }
        None => {
            let Some(server) = server else {
                bail!("--server is required when creating a new context");
            };
            let mut context = ClientContext::new(name, server);
            context.namespace = namespace;
            context.auth = auth;
            context.timeout = timeout;
            context
        }
    };

    config.set_context(context);
    if config.current_context.is_none() {
        config.current_context = Some(name.to_string());
    }
    Ok(is_new)
}
