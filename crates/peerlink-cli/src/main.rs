//! PeerLink CLI: run the registry, join as a peer, and manage accounts.

mod cli;
mod cmd;
pub mod table;
mod ui;

use crate::cli::*;
use clap::Parser;

fn init_tracing_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing_stderr();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            ui::error(&format!("Failed to start async runtime: {e}"));
            std::process::exit(1);
        }
    };

    let config = cli.config;
    rt.block_on(async move {
        match cli.command {
            Commands::Registry { listen, db } => {
                cmd::registry::cmd_registry(config, listen, db).await
            }
            Commands::Peer {
                username,
                host,
                port,
            } => cmd::peer::cmd_peer(config, username, host, port).await,
            Commands::List => cmd::peer::cmd_list(config).await,
            Commands::Send { from, to, text } => {
                cmd::peer::cmd_send(config, &from, &to, &text.join(" ")).await
            }
            Commands::Unregister { username } => {
                cmd::peer::cmd_unregister(config, &username).await
            }
            Commands::Account(sub) => match sub {
                AccountCommands::List => cmd::account::cmd_account_list(config),
                AccountCommands::Create {
                    username,
                    host,
                    port,
                } => cmd::account::cmd_account_create(config, &username, &host, port),
            },
        }
    });
}
